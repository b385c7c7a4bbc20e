//! Jasmin generation for parsed programs: one forward walk over the AST.

use std::collections::BTreeMap;

use tracing::debug;

use crate::{
    asm::{Instr, Label},
    ast::{Branch, Expr, Program, Stmt},
    error::{CompileError, Result},
};

const OBJECT_INIT: &str = "java/lang/Object/<init>()V";
const SYSTEM_OUT: &str = "java/lang/System/out";
const PRINT_STREAM: &str = "Ljava/io/PrintStream;";
const PRINTLN_INT: &str = "java/io/PrintStream/println(I)V";

/// Deepest statement and expression nesting lowered before giving up.
pub const MAX_DEPTH: usize = 2048;

/// Fixed capacities declared on `main`. They are generous guesses, not computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenOptions {
    pub stack_limit: u16,
    pub locals_limit: u16,
}

impl Default for GenOptions {
    fn default() -> Self {
        Self { stack_limit: 32, locals_limit: 64 }
    }
}

/// Mints `<base><n>` labels from a counter that only ever goes up.
#[derive(Debug, Default)]
pub struct LabelAllocator {
    next: u32,
}

impl LabelAllocator {
    pub fn fresh(&mut self, base: &str) -> Label {
        self.next += 1;
        Label(format!("{base}{}", self.next))
    }

    pub fn minted(&self) -> u32 {
        self.next
    }
}

/// Variable name to local slot. Slot 0 holds `main`'s `String[]` argument.
#[derive(Debug)]
pub struct SlotTable {
    slots: BTreeMap<String, u16>,
    next: u16,
    limit: u16,
}

impl SlotTable {
    pub fn new(limit: u16) -> Self {
        Self { slots: BTreeMap::new(), next: 1, limit }
    }

    /// Slot for `name`, allocated on first sight whether that is a read or a write.
    pub fn slot_of(&mut self, name: &str) -> Result<u16> {
        if let Some(&slot) = self.slots.get(name) {
            return Ok(slot);
        }
        if self.next >= self.limit {
            return Err(CompileError::Codegen(format!(
                "variable `{name}` needs slot {} but main declares only {} locals",
                self.next, self.limit
            )));
        }
        let slot = self.next;
        self.slots.insert(name.to_string(), slot);
        self.next += 1;
        Ok(slot)
    }

    pub fn allocated(&self) -> usize {
        self.slots.len()
    }
}

/// Single-use generator: owns the slot table, label counter and output for one compilation.
pub struct Codegen {
    opts: GenOptions,
    slots: SlotTable,
    labels: LabelAllocator,
    code: Vec<Instr>,
    depth: usize,
}

impl Codegen {
    pub fn new(opts: GenOptions) -> Self {
        Self {
            opts,
            slots: SlotTable::new(opts.locals_limit),
            labels: LabelAllocator::default(),
            code: Vec::new(),
            depth: 0,
        }
    }

    /// Emit a complete class whose `main` runs `program`.
    ///
    /// Consumes the generator so label numbering and slots never leak between
    /// compilations. Nothing is returned unless the whole program lowered cleanly.
    pub fn generate(mut self, program: &Program, class_name: &str) -> Result<String> {
        validate_class_name(class_name)?;

        self.emit_header(class_name);
        for stmt in &program.stmts {
            self.gen_stmt(stmt)?;
        }
        self.emit(Instr::Return);
        self.emit(Instr::Directive(".end method".into()));

        debug!(
            class = class_name,
            slots = self.slots.allocated(),
            labels = self.labels.minted(),
            lines = self.code.len(),
            "generated jasmin"
        );

        let lines: Vec<String> = self.code.iter().map(ToString::to_string).collect();
        Ok(lines.join("\n"))
    }

    fn emit(&mut self, instr: Instr) {
        self.code.push(instr);
    }

    fn emit_header(&mut self, class_name: &str) {
        self.emit(Instr::Directive(format!(".class public {class_name}")));
        self.emit(Instr::Directive(".super java/lang/Object".into()));
        self.emit(Instr::Blank);
        self.emit(Instr::Directive(".method public <init>()V".into()));
        self.emit(Instr::Aload0);
        self.emit(Instr::InvokeSpecial(OBJECT_INIT));
        self.emit(Instr::Return);
        self.emit(Instr::Directive(".end method".into()));
        self.emit(Instr::Blank);
        self.emit(Instr::Directive(".method public static main([Ljava/lang/String;)V".into()));
        self.emit(Instr::LimitStack(self.opts.stack_limit));
        self.emit(Instr::LimitLocals(self.opts.locals_limit));
    }

    fn descend(&mut self) -> Result<()> {
        if self.depth >= MAX_DEPTH {
            return Err(CompileError::Codegen(format!("program nests deeper than {MAX_DEPTH} levels")));
        }
        self.depth += 1;
        Ok(())
    }

    fn gen_block(&mut self, body: &[Stmt]) -> Result<()> {
        body.iter().try_for_each(|s| self.gen_stmt(s))
    }

    fn gen_stmt(&mut self, stmt: &Stmt) -> Result<()> {
        self.descend()?;
        match stmt {
            Stmt::Let { name, expr } => {
                self.gen_expr(expr)?;
                let slot = self.slots.slot_of(name)?;
                self.emit(Instr::Store(slot));
            }
            Stmt::Print { expr } => {
                // receiver goes under the argument
                self.emit(Instr::GetStatic(SYSTEM_OUT, PRINT_STREAM));
                self.gen_expr(expr)?;
                self.emit(Instr::InvokeVirtual(PRINTLN_INT));
            }
            Stmt::While { cond, body } => {
                let test = self.labels.fresh("Loop_test_");
                let end = self.labels.fresh("Loop_end_");

                self.emit(Instr::Mark(test.clone()));
                self.gen_expr(cond)?;
                self.emit(Instr::IfEq(end.clone()));
                self.gen_block(body)?;
                self.emit(Instr::Goto(test));
                self.emit(Instr::Mark(end));
            }
            Stmt::IfChain { branches, else_body } => self.gen_if_chain(branches, else_body.as_deref())?,
        }
        self.depth -= 1;
        Ok(())
    }

    fn gen_if_chain(&mut self, branches: &[Branch], else_body: Option<&[Stmt]>) -> Result<()> {
        if branches.is_empty() {
            return Err(CompileError::Codegen("if chain without a condition branch".into()));
        }
        let end = self.labels.fresh("If_end_");

        for Branch { cond, body } in branches {
            let next = self.labels.fresh("If_next_");
            self.gen_expr(cond)?;
            self.emit(Instr::IfEq(next.clone()));
            self.gen_block(body)?;
            self.emit(Instr::Goto(end.clone()));
            self.emit(Instr::Mark(next));
        }

        if let Some(body) = else_body {
            self.gen_block(body)?;
        }
        self.emit(Instr::Mark(end));
        Ok(())
    }

    /// Post-order: both operands are on the stack before their operator runs.
    fn gen_expr(&mut self, expr: &Expr) -> Result<()> {
        self.descend()?;
        match expr {
            Expr::Int(v) => self.emit(Instr::Push(*v)),
            Expr::Var(name) => {
                let slot = self.slots.slot_of(name)?;
                self.emit(Instr::Load(slot));
            }
            Expr::Bin(op, a, b) => {
                self.gen_expr(a)?;
                self.gen_expr(b)?;
                self.emit(Instr::Arith(*op));
            }
            Expr::Cmp(op, a, b) => {
                self.gen_expr(a)?;
                self.gen_expr(b)?;

                let on_true = self.labels.fresh("Cmp_true_");
                let end = self.labels.fresh("Cmp_end_");

                self.emit(Instr::IfCmp(*op, on_true.clone()));
                self.emit(Instr::Push(0));
                self.emit(Instr::Goto(end.clone()));
                self.emit(Instr::Mark(on_true));
                self.emit(Instr::Push(1));
                self.emit(Instr::Mark(end));
            }
        }
        self.depth -= 1;
        Ok(())
    }
}

/// Jasmin writes the class name verbatim into `.class`; it has to be a Java identifier.
fn validate_class_name(name: &str) -> Result<()> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' || c == '$' => {
            chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
        }
        _ => false,
    };
    if valid {
        Ok(())
    } else {
        Err(CompileError::Codegen(format!("`{name}` is not a valid class name")))
    }
}
