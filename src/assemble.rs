use std::{
    path::{Path, PathBuf},
    process::Command,
};

use anyhow::{bail, Context, Result};
use tracing::info;

/// Run Jasmin on a `.j` file, writing `<out_dir>/<Class>.class`.
///
/// Equivalent to `java -jar <jasmin_jar> -d <out_dir> <asm>`; `java` must be on `PATH`.
pub fn assemble_class(asm: &Path, jasmin_jar: &Path, out_dir: &Path) -> Result<()> {
    if !jasmin_jar.is_file() {
        bail!(
            "Jasmin jar not found at {} (set JMINUS_JASMIN_JAR)",
            jasmin_jar.display()
        );
    }
    let java = which::which("java").context("`java` not found on PATH; it is needed to run Jasmin")?;
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("creating output directory {}", out_dir.display()))?;

    let status = Command::new(&java)
        .args(jasmin_args(asm, jasmin_jar, out_dir))
        .status()
        .with_context(|| format!("launching {}", java.display()))?;
    if !status.success() {
        bail!("jasmin failed on {} ({status})", asm.display());
    }

    info!(asm = %asm.display(), out_dir = %out_dir.display(), "assembled class");
    Ok(())
}

fn jasmin_args(asm: &Path, jasmin_jar: &Path, out_dir: &Path) -> Vec<PathBuf> {
    vec![
        PathBuf::from("-jar"),
        jasmin_jar.to_path_buf(),
        PathBuf::from("-d"),
        out_dir.to_path_buf(),
        asm.to_path_buf(),
    ]
}
