use std::{
    fs,
    path::{Path, PathBuf},
    process::{Command, Output},
};

use anyhow::Result;

struct Scratch {
    dir: PathBuf,
}

impl Scratch {
    fn new(name: &str) -> Result<Self> {
        let dir = std::env::temp_dir().join(format!("jminus-cli-{}-{name}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn source(&self, file: &str, text: &str) -> Result<PathBuf> {
        let path = self.dir.join(file);
        fs::write(&path, text)?;
        Ok(path)
    }

    fn asm_dir(&self) -> PathBuf {
        self.dir.join("j")
    }

    fn run(&self, args: &[&str]) -> Result<Output> {
        Ok(Command::new(env!("CARGO_BIN_EXE_jminus"))
            .args(args)
            .env("JMINUS_ASM_DIR", self.asm_dir())
            .env("JMINUS_LOG", "error")
            .env_remove("JMINUS_LEX_POLICY")
            .output()?)
    }
}

impl Drop for Scratch {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.dir);
    }
}

fn arg(path: &Path) -> &str {
    path.to_str().expect("utf-8 temp path")
}

#[test]
fn emits_jasmin_named_after_input() -> Result<()> {
    let scratch = Scratch::new("emit")?;
    let input = scratch.source("loop.j-=2", "let x = 0;\nwhile (x < 3) { print x; let x = x + 1; }\n")?;

    let out = scratch.run(&[arg(&input), "--emit-only"])?;
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));

    let written = fs::read_to_string(scratch.asm_dir().join("loop.j"))?;
    assert!(written.starts_with(".class public loop\n"));
    assert!(written.contains("Loop_test_1:"));
    Ok(())
}

#[test]
fn ast_flag_prints_tree() -> Result<()> {
    let scratch = Scratch::new("ast")?;
    let input = scratch.source("show.j-=2", "print 1 + 2;")?;

    let out = scratch.run(&[arg(&input), "--ast", "--emit-only"])?;
    assert!(out.status.success());
    let stdout = String::from_utf8(out.stdout)?;
    assert!(stdout.starts_with("AST\n└── Program\n    └── Print\n        └── Bin\n"));
    assert!(stdout.contains("op=PLUS"));
    Ok(())
}

#[test]
fn syntax_error_exits_nonzero_without_output_file() -> Result<()> {
    let scratch = Scratch::new("bad")?;
    let input = scratch.source("bad.j-=2", "let x = ;")?;

    let out = scratch.run(&[arg(&input), "--emit-only"])?;
    assert!(!out.status.success());
    let stderr = String::from_utf8(out.stderr)?;
    assert!(stderr.contains("expected a value-producing token"), "{stderr}");
    // stderr is a pipe here, so log lines carry no colour codes
    assert!(!stderr.contains('\x1b'), "{stderr:?}");
    assert!(!scratch.asm_dir().join("bad.j").exists());
    Ok(())
}

#[test]
fn missing_jasmin_jar_is_reported_after_emitting() -> Result<()> {
    let scratch = Scratch::new("nojar")?;
    let input = scratch.source("ok.j-=2", "print 1;")?;

    let out = Command::new(env!("CARGO_BIN_EXE_jminus"))
        .arg(arg(&input))
        .env("JMINUS_ASM_DIR", scratch.asm_dir())
        .env("JMINUS_OUT_DIR", scratch.dir.join("out"))
        .env("JMINUS_JASMIN_JAR", scratch.dir.join("no-such.jar"))
        .env("JMINUS_LOG", "error")
        .output()?;
    assert!(!out.status.success());
    let stderr = String::from_utf8(out.stderr)?;
    assert!(stderr.contains("Jasmin jar not found at"), "{stderr}");
    assert!(scratch.asm_dir().join("ok.j").is_file());
    Ok(())
}

#[test]
fn usage_errors_exit_with_one() -> Result<()> {
    let scratch = Scratch::new("usage")?;
    let cases: [&[&str]; 3] = [&[], &["a", "b"], &["a", "--verbose"]];
    for args in cases {
        let out = scratch.run(args)?;
        assert_eq!(out.status.code(), Some(1));
        assert!(String::from_utf8(out.stderr)?.contains("Usage: jminus"));
    }
    Ok(())
}

#[test]
fn missing_input_file_fails() -> Result<()> {
    let scratch = Scratch::new("missing")?;
    let out = scratch.run(&[arg(&scratch.dir.join("nope.j-=2")), "--emit-only"])?;
    assert!(!out.status.success());
    Ok(())
}
