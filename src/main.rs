use anyhow::Context;
use std::{
    env, fs,
    io::{self, IsTerminal},
    path::Path,
};
use tracing::{error, info, warn};

use jminus::{
    assemble::assemble_class,
    config::Config,
    parse, Codegen, CompileError, GenOptions,
};

const USAGE: &str = "Usage: jminus <input> [--ast] [--emit-only]";

struct Args {
    input: String,
    dump_ast: bool,
    emit_only: bool,
}

fn parse_args() -> Option<Args> {
    let mut input = None;
    let mut dump_ast = false;
    let mut emit_only = false;
    for arg in env::args().skip(1) {
        match arg.as_str() {
            "--ast" => dump_ast = true,
            "--emit-only" => emit_only = true,
            flag if flag.starts_with("--") => return None,
            _ if input.is_some() => return None,
            _ => input = Some(arg),
        }
    }
    Some(Args { input: input?, dump_ast, emit_only })
}

/// `examples/loop.j-=2` compiles to class `loop`.
fn class_name_of(input: &Path) -> String {
    let base = input.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
    base.split('.').next().unwrap_or_default().to_string()
}

fn main() -> anyhow::Result<()> {
    let Some(args) = parse_args() else {
        eprintln!("{USAGE}");
        std::process::exit(1);
    };

    let cfg = Config::from_env();
    tracing_subscriber::fmt()
        .with_target(false)
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .with_max_level(cfg.log_level.value)
        .init();
    for w in &cfg.warnings {
        warn!("{w}");
    }

    let input = Path::new(&args.input);
    let src = fs::read_to_string(input).with_context(|| format!("reading {:?}", input))?;
    let class = class_name_of(input);

    let program = parse(&src, cfg.lex_policy.value).inspect_err(report)?;
    if args.dump_ast {
        print!("{}", program.dump());
    }
    let jasmin = Codegen::new(GenOptions::default())
        .generate(&program, &class)
        .inspect_err(report)?;

    // only reached once the whole program compiled, so no partial file is left behind
    let asm_dir = &cfg.asm_dir.value;
    fs::create_dir_all(asm_dir).with_context(|| format!("creating {:?}", asm_dir))?;
    let out_j = asm_dir.join(format!("{class}.j"));
    fs::write(&out_j, &jasmin).with_context(|| format!("writing {:?}", out_j))?;
    info!(path = %out_j.display(), "wrote jasmin");
    println!("Wrote {}", out_j.display());

    if !args.emit_only {
        assemble_class(&out_j, &cfg.jasmin_jar.value, &cfg.out_dir.value)?;
        println!("Wrote {}", cfg.out_dir.value.join(format!("{class}.class")).display());
    }
    Ok(())
}

fn report(err: &CompileError) {
    error!(category = err.category(), error = %err, "compilation failed");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn class_name_stops_at_first_dot() {
        assert_eq!(class_name_of(Path::new("examples/loop.j-=2")), "loop");
        assert_eq!(class_name_of(Path::new("Main")), "Main");
        assert_eq!(class_name_of(Path::new("dir/a.b.c")), "a");
    }
}
