use std::collections::HashMap;

use anyhow::{anyhow, bail, Result};

const STEP_LIMIT: usize = 1_000_000;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Value {
    Int(i32),
    SystemOut,
}

/// Run the `main` method of emitted Jasmin text and collect every printed int.
///
/// Understands exactly the instruction subset the code generator produces.
pub fn run_main(jasmin: &str) -> Result<Vec<i32>> {
    let body: Vec<&str> = jasmin
        .lines()
        .skip_while(|l| !l.starts_with(".method public static main"))
        .skip(1)
        .take_while(|l| *l != ".end method")
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('.'))
        .collect();

    let labels: HashMap<&str, usize> = body
        .iter()
        .copied()
        .enumerate()
        .filter_map(|(i, l)| l.strip_suffix(':').map(|name| (name, i)))
        .collect();

    let mut stack: Vec<Value> = Vec::new();
    let mut locals = [0i32; 256];
    let mut printed = Vec::new();
    let mut pc = 0;

    let pop_int = |stack: &mut Vec<Value>| -> Result<i32> {
        match stack.pop() {
            Some(Value::Int(v)) => Ok(v),
            other => Err(anyhow!("expected int on stack, found {other:?}")),
        }
    };
    let target = |name: &str| -> Result<usize> {
        labels.get(name).copied().ok_or_else(|| anyhow!("unknown label {name}"))
    };

    for _ in 0..STEP_LIMIT {
        let Some(&line) = body.get(pc) else {
            bail!("fell off the end of main without `return`");
        };
        pc += 1;
        if line.ends_with(':') {
            continue;
        }
        let (op, arg) = line.split_once(' ').unwrap_or((line, ""));
        match op {
            "return" => return Ok(printed),
            "iconst_m1" => stack.push(Value::Int(-1)),
            "bipush" | "sipush" | "ldc" => stack.push(Value::Int(arg.parse()?)),
            "iload" => stack.push(Value::Int(locals[arg.parse::<usize>()?])),
            "istore" => locals[arg.parse::<usize>()?] = pop_int(&mut stack)?,
            "iadd" | "isub" | "imul" | "idiv" => {
                let b = pop_int(&mut stack)?;
                let a = pop_int(&mut stack)?;
                let v = match op {
                    "iadd" => a.wrapping_add(b),
                    "isub" => a.wrapping_sub(b),
                    "imul" => a.wrapping_mul(b),
                    _ if b == 0 => bail!("java.lang.ArithmeticException: / by zero"),
                    _ => a.wrapping_div(b),
                };
                stack.push(Value::Int(v));
            }
            "ifeq" => {
                if pop_int(&mut stack)? == 0 {
                    pc = target(arg)?;
                }
            }
            "goto" => pc = target(arg)?,
            "getstatic" => stack.push(Value::SystemOut),
            "invokevirtual" => {
                let v = pop_int(&mut stack)?;
                if stack.pop() != Some(Value::SystemOut) {
                    bail!("println receiver missing");
                }
                printed.push(v);
            }
            cmp if cmp.starts_with("if_icmp") => {
                let b = pop_int(&mut stack)?;
                let a = pop_int(&mut stack)?;
                let taken = match &cmp["if_icmp".len()..] {
                    "lt" => a < b,
                    "le" => a <= b,
                    "gt" => a > b,
                    "ge" => a >= b,
                    "eq" => a == b,
                    "ne" => a != b,
                    other => bail!("unknown comparison {other}"),
                };
                if taken {
                    pc = target(arg)?;
                }
            }
            short => {
                if let Some(n) = short.strip_prefix("iconst_") {
                    stack.push(Value::Int(n.parse()?));
                } else if let Some(n) = short.strip_prefix("iload_") {
                    stack.push(Value::Int(locals[n.parse::<usize>()?]));
                } else if let Some(n) = short.strip_prefix("istore_") {
                    locals[n.parse::<usize>()?] = pop_int(&mut stack)?;
                } else {
                    bail!("unsupported instruction `{line}`");
                }
            }
        }
    }
    bail!("step limit exceeded")
}
