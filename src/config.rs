use std::{env, fmt, path::PathBuf};

use tracing::Level;

use crate::lexer::LexPolicy;

const JASMIN_JAR_ENV: &str = "JMINUS_JASMIN_JAR";
const ASM_DIR_ENV: &str = "JMINUS_ASM_DIR";
const OUT_DIR_ENV: &str = "JMINUS_OUT_DIR";
const LEX_POLICY_ENV: &str = "JMINUS_LEX_POLICY";
const LOG_ENV: &str = "JMINUS_LOG";

const DEFAULT_JASMIN_JAR: &str = "jasmin.jar";
const DEFAULT_ASM_DIR: &str = "j";
const DEFAULT_OUT_DIR: &str = "out";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Env,
    Default,
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Env => write!(f, "environment"),
            Source::Default => write!(f, "default"),
        }
    }
}

/// A resolved setting plus where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Setting<T> {
    pub value: T,
    pub source: Source,
}

/// Driver settings.
///
/// Each field is read from its `JMINUS_*` variable; unset or blank variables fall
/// back to the default. Values that do not parse also fall back, and the
/// complaint is kept in `warnings` so the caller can log it once logging is up.
#[derive(Debug, Clone)]
pub struct Config {
    pub jasmin_jar: Setting<PathBuf>,
    pub asm_dir: Setting<PathBuf>,
    pub out_dir: Setting<PathBuf>,
    pub lex_policy: Setting<LexPolicy>,
    pub log_level: Setting<Level>,
    pub warnings: Vec<String>,
}

impl Config {
    pub fn from_env() -> Self {
        let mut warnings = Vec::new();
        let lex_policy = parsed(LEX_POLICY_ENV, LexPolicy::default(), &mut warnings);
        let log_level = parsed(LOG_ENV, Level::INFO, &mut warnings);
        Self {
            jasmin_jar: path(JASMIN_JAR_ENV, DEFAULT_JASMIN_JAR),
            asm_dir: path(ASM_DIR_ENV, DEFAULT_ASM_DIR),
            out_dir: path(OUT_DIR_ENV, DEFAULT_OUT_DIR),
            lex_policy,
            log_level,
            warnings,
        }
    }
}

fn explicit(key: &str) -> Option<String> {
    env::var(key).ok().and_then(|raw| {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_owned())
        }
    })
}

fn path(key: &str, default: &str) -> Setting<PathBuf> {
    match explicit(key) {
        Some(v) => Setting { value: PathBuf::from(v), source: Source::Env },
        None => Setting { value: PathBuf::from(default), source: Source::Default },
    }
}

fn parsed<T>(key: &str, default: T, warnings: &mut Vec<String>) -> Setting<T>
where
    T: std::str::FromStr,
    T::Err: fmt::Display,
{
    let Some(raw) = explicit(key) else {
        return Setting { value: default, source: Source::Default };
    };
    match raw.parse::<T>() {
        Ok(value) => Setting { value, source: Source::Env },
        Err(e) => {
            warnings.push(format!("ignoring {key}={raw}: {e}"));
            Setting { value: default, source: Source::Default }
        }
    }
}
