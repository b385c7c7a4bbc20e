use thiserror::Error;

pub type Result<T> = std::result::Result<T, CompileError>;

/// Everything that can stop a compilation. The first error aborts; nothing is recovered.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CompileError {
    #[error("{line}:{column}: unrecognised character {ch:?}")]
    Lex { ch: char, line: usize, column: usize },
    #[error("{line}:{column}: expected {expected}, found {found} `{text}`")]
    Syntax {
        expected: String,
        found: String,
        text: String,
        line: usize,
        column: usize,
    },
    #[error("{line}:{column}: integer literal `{text}` does not fit in a 32-bit int")]
    IntegerRange { text: String, line: usize, column: usize },
    #[error("code generation error: {0}")]
    Codegen(String),
}

impl CompileError {
    /// Short classification string used for logging.
    pub fn category(&self) -> &'static str {
        match self {
            CompileError::Lex { .. } => "lex",
            CompileError::Syntax { .. } | CompileError::IntegerRange { .. } => "syntax",
            CompileError::Codegen(_) => "codegen",
        }
    }
}
