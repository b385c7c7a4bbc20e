//! Compiler for a small imperative language targeting Jasmin (JVM assembly).
//!
//! Stages run strictly in order:
//! - `lexer` turns source text into tokens using an ordered regex rule table.
//! - `parser` builds the `ast` by recursive descent.
//! - `codegen` walks the tree once and emits `asm` instructions as Jasmin text.
//!
//! `assemble` and `config` back the `jminus` binary.

pub mod assemble;
pub mod asm;
pub mod ast;
pub mod codegen;
pub mod config;
pub mod error;
pub mod lexer;
pub mod parser;

pub use codegen::{Codegen, GenOptions};
pub use error::{CompileError, Result};
pub use lexer::{tokenize, LexPolicy, Token, TokenKind};
pub use parser::Parser;

/// Parse source text into a program tree.
pub fn parse(src: &str, policy: LexPolicy) -> Result<ast::Program> {
    Parser::parse(src, policy)
}

/// Compile source text into the Jasmin text of class `class_name`.
pub fn compile_to_jasmin(src: &str, class_name: &str, policy: LexPolicy) -> Result<String> {
    let program = parse(src, policy)?;
    Codegen::new(GenOptions::default()).generate(&program, class_name)
}
