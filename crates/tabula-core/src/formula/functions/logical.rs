//! Logical functions. The branching ones receive unevaluated argument
//! expressions and only evaluate the branch they select.

use crate::error::ErrorKind;
use crate::formula::ast::Expr;
use crate::formula::eval::Evaluator;
use crate::formula::functions::{def, FunctionDef, MANY, NONE, SHORT_CIRCUIT};
use crate::value::{loose_eq, to_bool, CellValue};

pub(super) const DEFS: &[FunctionDef] = &[
    def("AND", 1, MANY, SHORT_CIRCUIT, and),
    def("FALSE", 0, 0, NONE, false_),
    def("IF", 1, 3, SHORT_CIRCUIT, if_),
    def("IFERROR", 2, 2, SHORT_CIRCUIT, iferror),
    def("IFNA", 2, 2, SHORT_CIRCUIT, ifna),
    def("IFS", 2, MANY, SHORT_CIRCUIT, ifs),
    def("NOT", 1, 1, NONE, not),
    def("OR", 1, MANY, SHORT_CIRCUIT, or),
    def("SWITCH", 3, MANY, SHORT_CIRCUIT, switch),
    def("TRUE", 0, 0, NONE, true_),
    def("XOR", 1, MANY, NONE, xor),
];

type R = Result<CellValue, ErrorKind>;

fn true_(_args: &[Expr], _ctx: &mut Evaluator) -> R {
    Ok(CellValue::Bool(true))
}

fn false_(_args: &[Expr], _ctx: &mut Evaluator) -> R {
    Ok(CellValue::Bool(false))
}

fn if_(args: &[Expr], ctx: &mut Evaluator) -> R {
    let condition = ctx.bool(args, 0)?;
    if condition {
        if args.len() > 1 {
            Ok(ctx.arg(args, 1))
        } else {
            Ok(CellValue::Bool(true))
        }
    } else if args.len() > 2 {
        Ok(ctx.arg(args, 2))
    } else {
        Ok(CellValue::Bool(false))
    }
}

fn ifs(args: &[Expr], ctx: &mut Evaluator) -> R {
    if args.len() % 2 != 0 {
        return Err(ErrorKind::Value);
    }
    let mut i = 0;
    while i < args.len() {
        if ctx.bool(args, i)? {
            return Ok(ctx.arg(args, i + 1));
        }
        i += 2;
    }
    Err(ErrorKind::Na)
}

/// SWITCH(value, case1, result1, ..., [default])
fn switch(args: &[Expr], ctx: &mut Evaluator) -> R {
    let subject = ctx.arg(args, 0);
    if let CellValue::Error(e) = subject {
        return Err(e);
    }
    let pairs = &args[1..];
    let has_default = pairs.len() % 2 == 1;
    let pair_count = pairs.len() / 2;
    for i in 0..pair_count {
        let candidate = ctx.arg(pairs, i * 2);
        if loose_eq(&subject, &candidate) {
            return Ok(ctx.arg(pairs, i * 2 + 1));
        }
    }
    if has_default {
        Ok(ctx.arg(pairs, pairs.len() - 1))
    } else {
        Err(ErrorKind::Na)
    }
}

fn iferror(args: &[Expr], ctx: &mut Evaluator) -> R {
    let value = ctx.arg(args, 0);
    if matches!(value, CellValue::Error(_)) {
        Ok(ctx.arg(args, 1))
    } else {
        Ok(value)
    }
}

fn ifna(args: &[Expr], ctx: &mut Evaluator) -> R {
    let value = ctx.arg(args, 0);
    if matches!(value, CellValue::Error(ErrorKind::Na)) {
        Ok(ctx.arg(args, 1))
    } else {
        Ok(value)
    }
}

/// Logical reduction over flattened values; empty cells are skipped, text
/// inside ranges is skipped, but hard text arguments fail.
fn logical_values(ctx: &mut Evaluator, args: &[Expr]) -> Result<Vec<bool>, ErrorKind> {
    let mut out = Vec::new();
    for expr in args {
        match expr {
            Expr::Reference(_) | Expr::Name(_) | Expr::Array(_) => {
                let m = ctx.matrix_of(expr)?;
                for v in &m.values {
                    match v {
                        CellValue::Bool(b) => out.push(*b),
                        CellValue::Number(n) | CellValue::Date(n) => out.push(*n != 0.0),
                        CellValue::Error(e) => return Err(*e),
                        _ => {}
                    }
                }
            }
            _ => {
                let v = ctx.eval(expr);
                if matches!(v, CellValue::Empty) {
                    continue;
                }
                out.push(to_bool(&v)?);
            }
        }
    }
    if out.is_empty() {
        return Err(ErrorKind::Value);
    }
    Ok(out)
}

fn and(args: &[Expr], ctx: &mut Evaluator) -> R {
    Ok(CellValue::Bool(
        logical_values(ctx, args)?.into_iter().all(|b| b),
    ))
}

fn or(args: &[Expr], ctx: &mut Evaluator) -> R {
    Ok(CellValue::Bool(
        logical_values(ctx, args)?.into_iter().any(|b| b),
    ))
}

fn xor(args: &[Expr], ctx: &mut Evaluator) -> R {
    let trues = logical_values(ctx, args)?
        .into_iter()
        .filter(|&b| b)
        .count();
    Ok(CellValue::Bool(trues % 2 == 1))
}

fn not(args: &[Expr], ctx: &mut Evaluator) -> R {
    Ok(CellValue::Bool(!ctx.bool(args, 0)?))
}
