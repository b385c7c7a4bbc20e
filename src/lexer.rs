//! Regex-driven scanner: an ordered rule table tried at every position, first match wins.

use std::{fmt, str::FromStr, sync::OnceLock};

use regex::Regex;
use tracing::{debug, warn};

use crate::error::{CompileError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Int,
    Ident,
    // keywords
    Let,
    Print,
    While,
    If,
    Else,
    // comparison operators
    Le,
    Ge,
    EqEq,
    Ne,
    Lt,
    Gt,
    // punctuation
    Assign,
    Semi,
    LParen,
    RParen,
    LBrace,
    RBrace,
    // arithmetic
    Plus,
    Minus,
    Star,
    Slash,
    Eof,
}

impl TokenKind {
    /// Upper-case name used in diagnostics and the AST dump.
    pub fn name(self) -> &'static str {
        use TokenKind::*;
        match self {
            Int => "INT",
            Ident => "ID",
            Let => "LET",
            Print => "PRINT",
            While => "WHILE",
            If => "IF",
            Else => "ELSE",
            Le => "LE",
            Ge => "GE",
            EqEq => "EQEQ",
            Ne => "NE",
            Lt => "LT",
            Gt => "GT",
            Assign => "EQ",
            Semi => "SEMIC",
            LParen => "LP",
            RParen => "RP",
            LBrace => "LBR",
            RBrace => "RBR",
            Plus => "PLUS",
            Minus => "MINUS",
            Star => "MUL",
            Slash => "DIV",
            Eof => "EOF",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub line: usize,
    pub column: usize,
}

/// What to do with input that no rule matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LexPolicy {
    /// Report the first unrecognised character as an error.
    #[default]
    Strict,
    /// Skip unrecognised characters one at a time, logging each.
    Lenient,
}

impl FromStr for LexPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "strict" => Ok(LexPolicy::Strict),
            "lenient" => Ok(LexPolicy::Lenient),
            other => Err(format!("unknown lex policy `{other}`")),
        }
    }
}

// Order matters: two-character operators must be tried before their one-character
// prefixes. `None` marks whitespace, which is matched and dropped.
const RULES: &[(Option<TokenKind>, &str)] = &[
    (Some(TokenKind::Int), r"[0-9]+"),
    (Some(TokenKind::Ident), r"[A-Za-z_]\w*"),
    (Some(TokenKind::Le), r"<="),
    (Some(TokenKind::Ge), r">="),
    (Some(TokenKind::EqEq), r"=="),
    (Some(TokenKind::Ne), r"!="),
    (Some(TokenKind::Lt), r"<"),
    (Some(TokenKind::Gt), r">"),
    (Some(TokenKind::Assign), r"="),
    (Some(TokenKind::Semi), r";"),
    (Some(TokenKind::LParen), r"\("),
    (Some(TokenKind::RParen), r"\)"),
    (Some(TokenKind::LBrace), r"\{"),
    (Some(TokenKind::RBrace), r"\}"),
    (Some(TokenKind::Plus), r"\+"),
    (Some(TokenKind::Minus), r"-"),
    (Some(TokenKind::Star), r"\*"),
    (Some(TokenKind::Slash), r"/"),
    (None, r"[ \t\r\n]+"),
];

const KEYWORDS: &[(&str, TokenKind)] = &[
    ("let", TokenKind::Let),
    ("print", TokenKind::Print),
    ("while", TokenKind::While),
    ("if", TokenKind::If),
    ("else", TokenKind::Else),
];

fn compiled_rules() -> &'static [(Option<TokenKind>, Regex)] {
    static COMPILED: OnceLock<Vec<(Option<TokenKind>, Regex)>> = OnceLock::new();
    COMPILED.get_or_init(|| {
        RULES
            .iter()
            .map(|(kind, pat)| (*kind, Regex::new(&format!("^(?:{pat})")).unwrap()))
            .collect()
    })
}

fn keyword(text: &str) -> Option<TokenKind> {
    KEYWORDS.iter().find(|(kw, _)| *kw == text).map(|(_, kind)| *kind)
}

/// Scanner state over one source string.
pub struct Lexer<'a> {
    src: &'a str,
    pos: usize,
    line: usize,
    column: usize,
    policy: LexPolicy,
}

impl<'a> Lexer<'a> {
    pub fn new(src: &'a str, policy: LexPolicy) -> Self {
        Self { src, pos: 0, line: 1, column: 1, policy }
    }

    /// Scan the whole input. The result always ends with an `Eof` token.
    pub fn tokenize(mut self) -> Result<Vec<Token>> {
        let src = self.src;
        let mut out = Vec::new();
        while self.pos < src.len() {
            let rest = &src[self.pos..];
            let hit = compiled_rules()
                .iter()
                .find_map(|(kind, re)| re.find(rest).map(|m| (*kind, m.as_str())));

            match hit {
                Some((kind, text)) => {
                    let (line, column) = (self.line, self.column);
                    self.advance(text);
                    if let Some(kind) = kind {
                        let kind = match kind {
                            TokenKind::Ident => keyword(text).unwrap_or(kind),
                            k => k,
                        };
                        out.push(Token { kind, text: text.to_string(), line, column });
                    }
                }
                None => {
                    // `pos` is always on a char boundary and below len, so there is a char here.
                    let Some(ch) = rest.chars().next() else { break };
                    if self.policy == LexPolicy::Strict {
                        return Err(CompileError::Lex { ch, line: self.line, column: self.column });
                    }
                    warn!(?ch, line = self.line, column = self.column, "skipping unrecognised character");
                    let mut buf = [0u8; 4];
                    self.advance(ch.encode_utf8(&mut buf));
                }
            }
        }

        out.push(Token {
            kind: TokenKind::Eof,
            text: String::new(),
            line: self.line,
            column: self.column,
        });
        debug!(tokens = out.len(), "tokenized source");
        Ok(out)
    }

    fn advance(&mut self, text: &str) {
        for c in text.chars() {
            if c == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
        self.pos += text.len();
    }
}

/// Tokenize with the given policy for unrecognised input.
pub fn tokenize(src: &str, policy: LexPolicy) -> Result<Vec<Token>> {
    Lexer::new(src, policy).tokenize()
}
