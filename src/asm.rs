//! Jasmin instruction model. `Display` produces the exact line written to the `.j` file.

use std::fmt;

use crate::ast::{BinOp, CmpOp};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Label(pub String);

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instr {
    /// Unindented directive such as `.class public Main`.
    Directive(String),
    Blank,
    LimitStack(u16),
    LimitLocals(u16),
    Mark(Label),
    Push(i32),
    Load(u16),
    Store(u16),
    Arith(BinOp),
    IfCmp(CmpOp, Label),
    IfEq(Label),
    Goto(Label),
    Aload0,
    InvokeSpecial(&'static str),
    GetStatic(&'static str, &'static str),
    InvokeVirtual(&'static str),
    Return,
}

fn cmp_mnemonic(op: CmpOp) -> &'static str {
    match op {
        CmpOp::Lt => "if_icmplt",
        CmpOp::Le => "if_icmple",
        CmpOp::Gt => "if_icmpgt",
        CmpOp::Ge => "if_icmpge",
        CmpOp::Eq => "if_icmpeq",
        CmpOp::Ne => "if_icmpne",
    }
}

fn arith_mnemonic(op: BinOp) -> &'static str {
    match op {
        BinOp::Add => "iadd",
        BinOp::Sub => "isub",
        BinOp::Mul => "imul",
        // truncates toward zero; x / 0 raises ArithmeticException at run time
        BinOp::Div => "idiv",
    }
}

impl fmt::Display for Instr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Instr::*;

        match self {
            Directive(text) => f.write_str(text),
            Blank => Ok(()),
            LimitStack(n) => write!(f, "  .limit stack {n}"),
            LimitLocals(n) => write!(f, "  .limit locals {n}"),
            Mark(label) => write!(f, "{label}:"),
            Push(v) => match *v {
                -1 => f.write_str("  iconst_m1"),
                0..=5 => write!(f, "  iconst_{v}"),
                v if i8::try_from(v).is_ok() => write!(f, "  bipush {v}"),
                v if i16::try_from(v).is_ok() => write!(f, "  sipush {v}"),
                v => write!(f, "  ldc {v}"),
            },
            Load(slot @ 0..=3) => write!(f, "  iload_{slot}"),
            Load(slot) => write!(f, "  iload {slot}"),
            Store(slot @ 0..=3) => write!(f, "  istore_{slot}"),
            Store(slot) => write!(f, "  istore {slot}"),
            Arith(op) => write!(f, "  {}", arith_mnemonic(*op)),
            IfCmp(op, label) => write!(f, "  {} {label}", cmp_mnemonic(*op)),
            IfEq(label) => write!(f, "  ifeq {label}"),
            Goto(label) => write!(f, "  goto {label}"),
            Aload0 => f.write_str("  aload_0"),
            InvokeSpecial(method) => write!(f, "  invokespecial {method}"),
            GetStatic(field, desc) => write!(f, "  getstatic {field} {desc}"),
            InvokeVirtual(method) => write!(f, "  invokevirtual {method}"),
            Return => f.write_str("  return"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_picks_narrowest_encoding() {
        let lines: Vec<String> = [-1, 0, 5, 6, -128, 127, 128, -32768, 32767, 40000, i32::MIN]
            .into_iter()
            .map(|v| Instr::Push(v).to_string())
            .collect();
        assert_eq!(
            lines,
            vec![
                "  iconst_m1",
                "  iconst_0",
                "  iconst_5",
                "  bipush 6",
                "  bipush -128",
                "  bipush 127",
                "  sipush 128",
                "  sipush -32768",
                "  sipush 32767",
                "  ldc 40000",
                "  ldc -2147483648",
            ]
        );
    }

    #[test]
    fn short_forms_for_low_slots() {
        assert_eq!(Instr::Load(3).to_string(), "  iload_3");
        assert_eq!(Instr::Load(4).to_string(), "  iload 4");
        assert_eq!(Instr::Store(1).to_string(), "  istore_1");
        assert_eq!(Instr::Store(12).to_string(), "  istore 12");
    }

    #[test]
    fn jumps_and_marks() {
        let l = Label("Loop_end_2".into());
        assert_eq!(Instr::IfEq(l.clone()).to_string(), "  ifeq Loop_end_2");
        assert_eq!(Instr::Goto(l.clone()).to_string(), "  goto Loop_end_2");
        assert_eq!(Instr::Mark(l.clone()).to_string(), "Loop_end_2:");
        assert_eq!(Instr::IfCmp(CmpOp::Ge, l).to_string(), "  if_icmpge Loop_end_2");
    }
}
