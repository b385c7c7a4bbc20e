//! Recursive-descent parser with one token of lookahead.
//!
//! Grammar:
//!   program    := stmt* EOF
//!   stmt       := let | print | while | if
//!   let        := 'let' ID '=' expr ';'
//!   print      := 'print' expr ';'
//!   while      := 'while' '(' expr ')' block
//!   if         := 'if' '(' expr ')' block ('else' 'if' '(' expr ')' block)* ('else' block)?
//!   block      := '{' stmt* '}'
//!   expr       := equality
//!   equality   := relational (('==' | '!=') relational)*
//!   relational := additive (('<' | '>' | '<=' | '>=') additive)*
//!   additive   := term (('+' | '-') term)*
//!   term       := factor (('*' | '/') factor)*
//!   factor     := INT | ID | '(' expr ')'
//!
//! Every binary level folds left, so comparisons chain like ordinary values:
//! `a < b == c` is `(a < b) == c`.

use tracing::debug;

use crate::{
    ast::{BinOp, Branch, CmpOp, Expr, Program, Stmt},
    error::{CompileError, Result},
    lexer::{tokenize, LexPolicy, Token, TokenKind},
};

/// Deepest allowed nesting of parenthesised expressions and blocks.
pub const MAX_NESTING: usize = 256;
/// Most binary operators allowed in one top-level expression.
pub const MAX_OPERATORS: usize = 1024;

pub struct Parser {
    toks: Vec<Token>,
    i: usize,
    depth: usize,
    ops: usize,
}

impl Parser {
    /// Parse a complete program from raw source text.
    pub fn parse(src: &str, policy: LexPolicy) -> Result<Program> {
        let toks = tokenize(src, policy)?;
        let program = Parser::new(toks).program()?;
        debug!(statements = program.stmts.len(), "parsed program");
        Ok(program)
    }

    /// Wrap a token stream; an `Eof` is appended if the stream lacks one.
    pub fn new(mut toks: Vec<Token>) -> Self {
        if toks.last().map(|t| t.kind) != Some(TokenKind::Eof) {
            let (line, column) = toks.last().map_or((1, 1), |t| (t.line, t.column));
            toks.push(Token { kind: TokenKind::Eof, text: String::new(), line, column });
        }
        Self { toks, i: 0, depth: 0, ops: 0 }
    }

    fn cur(&self) -> &Token {
        // never step past the trailing EOF
        &self.toks[self.i.min(self.toks.len() - 1)]
    }

    fn at(&self, kind: TokenKind) -> bool {
        self.cur().kind == kind
    }

    fn bump(&mut self) -> Token {
        let tok = self.cur().clone();
        if self.i < self.toks.len() - 1 {
            self.i += 1;
        }
        tok
    }

    fn error(&self, expected: impl Into<String>) -> CompileError {
        let tok = self.cur();
        CompileError::Syntax {
            expected: expected.into(),
            found: tok.kind.to_string(),
            text: tok.text.clone(),
            line: tok.line,
            column: tok.column,
        }
    }

    fn eat(&mut self, kind: TokenKind) -> Result<Token> {
        if !self.at(kind) {
            return Err(self.error(kind.name()));
        }
        Ok(self.bump())
    }

    fn enter(&mut self) -> Result<()> {
        if self.depth >= MAX_NESTING {
            return Err(self.error(format!("at most {MAX_NESTING} levels of nesting")));
        }
        self.depth += 1;
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    // Every fold adds one level to the tree, so this bounds tree depth along with `depth`.
    fn fold(&mut self) -> Result<()> {
        if self.ops >= MAX_OPERATORS {
            return Err(self.error(format!("at most {MAX_OPERATORS} operators in one expression")));
        }
        self.ops += 1;
        Ok(())
    }

    fn top_expr(&mut self) -> Result<Expr> {
        self.ops = 0;
        self.expr()
    }

    pub fn program(&mut self) -> Result<Program> {
        let mut stmts = Vec::new();
        while !self.at(TokenKind::Eof) {
            stmts.push(self.stmt()?);
        }
        Ok(Program { stmts })
    }

    fn block(&mut self) -> Result<Vec<Stmt>> {
        self.eat(TokenKind::LBrace)?;
        self.enter()?;
        let mut body = Vec::new();
        while !self.at(TokenKind::RBrace) {
            // an unterminated block would otherwise report a bad statement at EOF
            if self.at(TokenKind::Eof) {
                return Err(self.error(TokenKind::RBrace.name()));
            }
            body.push(self.stmt()?);
        }
        self.leave();
        self.eat(TokenKind::RBrace)?;
        Ok(body)
    }

    fn paren_cond(&mut self) -> Result<Expr> {
        self.eat(TokenKind::LParen)?;
        let cond = self.top_expr()?;
        self.eat(TokenKind::RParen)?;
        Ok(cond)
    }

    fn stmt(&mut self) -> Result<Stmt> {
        match self.cur().kind {
            TokenKind::Let => {
                self.bump();
                let name = self.eat(TokenKind::Ident)?.text;
                self.eat(TokenKind::Assign)?;
                let expr = self.top_expr()?;
                self.eat(TokenKind::Semi)?;
                Ok(Stmt::Let { name, expr })
            }
            TokenKind::Print => {
                self.bump();
                let expr = self.top_expr()?;
                self.eat(TokenKind::Semi)?;
                Ok(Stmt::Print { expr })
            }
            TokenKind::While => {
                self.bump();
                let cond = self.paren_cond()?;
                let body = self.block()?;
                Ok(Stmt::While { cond, body })
            }
            TokenKind::If => self.if_chain(),
            _ => Err(self.error("a statement")),
        }
    }

    fn if_chain(&mut self) -> Result<Stmt> {
        self.eat(TokenKind::If)?;
        let cond = self.paren_cond()?;
        let body = self.block()?;
        let mut branches = vec![Branch { cond, body }];
        let mut else_body = None;

        while self.at(TokenKind::Else) {
            self.bump();
            if self.at(TokenKind::If) {
                self.bump();
                let cond = self.paren_cond()?;
                let body = self.block()?;
                branches.push(Branch { cond, body });
            } else {
                else_body = Some(self.block()?);
                break;
            }
        }

        Ok(Stmt::IfChain { branches, else_body })
    }

    pub fn expr(&mut self) -> Result<Expr> {
        self.enter()?;
        let e = self.equality()?;
        self.leave();
        Ok(e)
    }

    fn equality(&mut self) -> Result<Expr> {
        let mut node = self.relational()?;
        while matches!(self.cur().kind, TokenKind::EqEq | TokenKind::Ne) {
            self.fold()?;
            let op = CmpOp::try_from(self.bump().kind)?;
            let rhs = self.relational()?;
            node = Expr::cmp(op, node, rhs);
        }
        Ok(node)
    }

    fn relational(&mut self) -> Result<Expr> {
        let mut node = self.additive()?;
        while matches!(self.cur().kind, TokenKind::Lt | TokenKind::Gt | TokenKind::Le | TokenKind::Ge) {
            self.fold()?;
            let op = CmpOp::try_from(self.bump().kind)?;
            let rhs = self.additive()?;
            node = Expr::cmp(op, node, rhs);
        }
        Ok(node)
    }

    fn additive(&mut self) -> Result<Expr> {
        let mut node = self.term()?;
        while matches!(self.cur().kind, TokenKind::Plus | TokenKind::Minus) {
            self.fold()?;
            let op = BinOp::try_from(self.bump().kind)?;
            let rhs = self.term()?;
            node = Expr::bin(op, node, rhs);
        }
        Ok(node)
    }

    fn term(&mut self) -> Result<Expr> {
        let mut node = self.factor()?;
        while matches!(self.cur().kind, TokenKind::Star | TokenKind::Slash) {
            self.fold()?;
            let op = BinOp::try_from(self.bump().kind)?;
            let rhs = self.factor()?;
            node = Expr::bin(op, node, rhs);
        }
        Ok(node)
    }

    fn factor(&mut self) -> Result<Expr> {
        match self.cur().kind {
            TokenKind::Int => {
                let tok = self.bump();
                let v = tok.text.parse::<i32>().map_err(|_| CompileError::IntegerRange {
                    text: tok.text.clone(),
                    line: tok.line,
                    column: tok.column,
                })?;
                Ok(Expr::Int(v))
            }
            TokenKind::Ident => Ok(Expr::Var(self.bump().text)),
            TokenKind::LParen => {
                self.bump();
                let e = self.expr()?;
                self.eat(TokenKind::RParen)?;
                Ok(e)
            }
            _ => Err(self.error("a value-producing token")),
        }
    }
}
