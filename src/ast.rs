//! Abstract syntax tree nodes for the language, plus the `--ast` tree dump.
use std::fmt::{self, Write as _};

use crate::{error::CompileError, lexer::TokenKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
}

impl TryFrom<TokenKind> for BinOp {
    type Error = CompileError;

    fn try_from(kind: TokenKind) -> Result<Self, Self::Error> {
        Ok(match kind {
            TokenKind::Plus => BinOp::Add,
            TokenKind::Minus => BinOp::Sub,
            TokenKind::Star => BinOp::Mul,
            TokenKind::Slash => BinOp::Div,
            other => return Err(CompileError::Codegen(format!("unknown binop {other}"))),
        })
    }
}

impl TryFrom<TokenKind> for CmpOp {
    type Error = CompileError;

    fn try_from(kind: TokenKind) -> Result<Self, Self::Error> {
        Ok(match kind {
            TokenKind::Lt => CmpOp::Lt,
            TokenKind::Le => CmpOp::Le,
            TokenKind::Gt => CmpOp::Gt,
            TokenKind::Ge => CmpOp::Ge,
            TokenKind::EqEq => CmpOp::Eq,
            TokenKind::Ne => CmpOp::Ne,
            other => return Err(CompileError::Codegen(format!("unknown comparison {other}"))),
        })
    }
}

impl BinOp {
    fn token(self) -> TokenKind {
        match self {
            BinOp::Add => TokenKind::Plus,
            BinOp::Sub => TokenKind::Minus,
            BinOp::Mul => TokenKind::Star,
            BinOp::Div => TokenKind::Slash,
        }
    }
}

impl CmpOp {
    fn token(self) -> TokenKind {
        match self {
            CmpOp::Lt => TokenKind::Lt,
            CmpOp::Le => TokenKind::Le,
            CmpOp::Gt => TokenKind::Gt,
            CmpOp::Ge => TokenKind::Ge,
            CmpOp::Eq => TokenKind::EqEq,
            CmpOp::Ne => TokenKind::Ne,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    // integer literal (JVM int)
    Int(i32),
    // variable reference
    Var(String),
    // arithmetic, evaluated left then right
    Bin(BinOp, Box<Expr>, Box<Expr>),
    // comparison producing 0 or 1
    Cmp(CmpOp, Box<Expr>, Box<Expr>),
}

impl Expr {
    pub fn bin(op: BinOp, lhs: Expr, rhs: Expr) -> Self {
        Expr::Bin(op, Box::new(lhs), Box::new(rhs))
    }

    pub fn cmp(op: CmpOp, lhs: Expr, rhs: Expr) -> Self {
        Expr::Cmp(op, Box::new(lhs), Box::new(rhs))
    }

    pub fn var(name: &str) -> Self {
        Expr::Var(name.to_string())
    }
}

/// One `if`/`else if` arm.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Branch {
    pub cond: Expr,
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stmt {
    /// `let` binds (or rebinds) a variable; there is no separate declaration.
    Let { name: String, expr: Expr },
    Print { expr: Expr },
    While { cond: Expr, body: Vec<Stmt> },
    /// Branches are tested in order; the first that holds runs, otherwise `else_body`.
    IfChain { branches: Vec<Branch>, else_body: Option<Vec<Stmt>> },
}

/// Top-level container for a parsed program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Program {
    pub stmts: Vec<Stmt>,
}

// =============== tree dump (`--ast`) ==================

struct TreeNode {
    label: String,
    children: Vec<TreeNode>,
}

impl TreeNode {
    fn leaf(label: impl Into<String>) -> Self {
        Self { label: label.into(), children: Vec::new() }
    }

    fn new(label: impl Into<String>, children: Vec<TreeNode>) -> Self {
        Self { label: label.into(), children }
    }
}

fn expr_node(e: &Expr) -> TreeNode {
    match e {
        Expr::Int(v) => TreeNode::new("Int", vec![TreeNode::leaf(v.to_string())]),
        Expr::Var(name) => TreeNode::new("Var", vec![TreeNode::leaf(name.clone())]),
        Expr::Bin(op, a, b) => TreeNode::new(
            "Bin",
            vec![TreeNode::leaf(format!("op={}", op.token())), expr_node(a), expr_node(b)],
        ),
        Expr::Cmp(op, a, b) => TreeNode::new(
            "Cmp",
            vec![TreeNode::leaf(format!("op={}", op.token())), expr_node(a), expr_node(b)],
        ),
    }
}

fn block_node(label: &str, body: &[Stmt]) -> TreeNode {
    TreeNode::new(label, body.iter().map(stmt_node).collect())
}

fn stmt_node(s: &Stmt) -> TreeNode {
    match s {
        Stmt::Let { name, expr } => {
            TreeNode::new("Let", vec![TreeNode::leaf(format!("name={name}")), expr_node(expr)])
        }
        Stmt::Print { expr } => TreeNode::new("Print", vec![expr_node(expr)]),
        Stmt::While { cond, body } => TreeNode::new(
            "While",
            vec![TreeNode::new("cond", vec![expr_node(cond)]), block_node("body", body)],
        ),
        Stmt::IfChain { branches, else_body } => {
            let mut children: Vec<TreeNode> = branches
                .iter()
                .enumerate()
                .map(|(i, br)| {
                    TreeNode::new(
                        format!("branch[{i}]"),
                        vec![TreeNode::new("cond", vec![expr_node(&br.cond)]), block_node("body", &br.body)],
                    )
                })
                .collect();
            if let Some(body) = else_body {
                children.push(block_node("else", body));
            }
            TreeNode::new("IfChain", children)
        }
    }
}

fn render(node: &TreeNode, prefix: &str, connector: &str, out: &mut String) {
    // writing into a String cannot fail
    let _ = writeln!(out, "{prefix}{connector}{}", node.label);
    let child_prefix = match connector {
        "├── " => format!("{prefix}│   "),
        "└── " => format!("{prefix}    "),
        _ => prefix.to_string(),
    };
    let last = node.children.len().saturating_sub(1);
    for (i, child) in node.children.iter().enumerate() {
        let conn = if i == last { "└── " } else { "├── " };
        render(child, &child_prefix, conn, out);
    }
}

impl Program {
    /// Human-readable tree, rooted at `AST`, one node per line.
    pub fn dump(&self) -> String {
        let program = block_node("Program", &self.stmts);
        let root = TreeNode::new("AST", vec![program]);
        let mut out = String::new();
        render(&root, "", "", &mut out);
        out
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.dump())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operators_map_from_their_tokens_only() {
        assert_eq!(BinOp::try_from(TokenKind::Slash), Ok(BinOp::Div));
        assert_eq!(CmpOp::try_from(TokenKind::EqEq), Ok(CmpOp::Eq));
        assert!(matches!(BinOp::try_from(TokenKind::Lt), Err(CompileError::Codegen(_))));
        assert!(matches!(CmpOp::try_from(TokenKind::Plus), Err(CompileError::Codegen(_))));
    }

    #[test]
    fn dump_draws_nested_tree() {
        let program = Program {
            stmts: vec![
                Stmt::Let { name: "x".into(), expr: Expr::bin(BinOp::Add, Expr::var("x"), Expr::Int(1)) },
                Stmt::Print { expr: Expr::var("x") },
            ],
        };
        let expected = "\
AST
└── Program
    ├── Let
    │   ├── name=x
    │   └── Bin
    │       ├── op=PLUS
    │       ├── Var
    │       │   └── x
    │       └── Int
    │           └── 1
    └── Print
        └── Var
            └── x
";
        assert_eq!(program.dump(), expected);
    }

    #[test]
    fn dump_labels_if_chain_parts() {
        let program = Program {
            stmts: vec![Stmt::IfChain {
                branches: vec![Branch { cond: Expr::Int(1), body: vec![] }],
                else_body: Some(vec![Stmt::Print { expr: Expr::Int(3) }]),
            }],
        };
        let dump = program.dump();
        assert!(dump.contains("IfChain"));
        assert!(dump.contains("branch[0]"));
        assert!(dump.contains("cond"));
        assert!(dump.contains("else"));
    }
}
