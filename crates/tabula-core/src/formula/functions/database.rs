//! Database functions: `D*(database, field, criteria)`.
//!
//! The database block is a header row plus data rows. `field` names a
//! column by header text (case-insensitive) or by 1-based index. The
//! criteria block is its own header row plus condition rows: conditions in
//! one row AND together, rows OR together.

use crate::error::ErrorKind;
use crate::formula::ast::Expr;
use crate::formula::criteria::Criterion;
use crate::formula::eval::Evaluator;
use crate::formula::functions::{def, FunctionDef, NONE};
use crate::value::{to_number, to_text, CellValue};

pub(super) const DEFS: &[FunctionDef] = &[
    def("DAVERAGE", 3, 3, NONE, daverage),
    def("DCOUNT", 3, 3, NONE, dcount),
    def("DCOUNTA", 3, 3, NONE, dcounta),
    def("DGET", 3, 3, NONE, dget),
    def("DMAX", 3, 3, NONE, dmax),
    def("DMIN", 3, 3, NONE, dmin),
    def("DPRODUCT", 3, 3, NONE, dproduct),
    def("DSTDEVP", 3, 3, NONE, dstdevp),
    def("DSUM", 3, 3, NONE, dsum),
    def("DVARP", 3, 3, NONE, dvarp),
];

type R = Result<CellValue, ErrorKind>;

/// The values of the selected field for every data row matching the
/// criteria block.
fn selected(
    ctx: &mut Evaluator,
    args: &[Expr],
) -> Result<Vec<CellValue>, ErrorKind> {
    let database = ctx.matrix(args, 0)?;
    if database.rows < 2 {
        return Err(ErrorKind::Value);
    }
    let headers: Vec<String> = database
        .row(0)
        .iter()
        .map(|v| to_text(v).to_ascii_lowercase())
        .collect();

    let field_value = ctx.arg(args, 1);
    let field_index = match &field_value {
        CellValue::Error(e) => return Err(*e),
        v if v.is_numeric() => {
            let i = to_number(v)? as usize;
            if i < 1 || i > database.cols {
                return Err(ErrorKind::Value);
            }
            i - 1
        }
        other => {
            let name = to_text(other).to_ascii_lowercase();
            headers
                .iter()
                .position(|h| *h == name)
                .ok_or(ErrorKind::Value)?
        }
    };

    let criteria = ctx.matrix(args, 2)?;
    if criteria.rows < 2 {
        return Err(ErrorKind::Value);
    }
    // Map each criteria column to a database column.
    let mut column_map = Vec::with_capacity(criteria.cols);
    for c in 0..criteria.cols {
        let name = to_text(criteria.get(0, c)).to_ascii_lowercase();
        column_map.push(headers.iter().position(|h| *h == name));
    }

    let mut out = Vec::new();
    for r in 1..database.rows {
        let row = database.row(r);
        let mut any_rule = false;
        for cr in 1..criteria.rows {
            let mut all = true;
            for cc in 0..criteria.cols {
                let condition = criteria.get(cr, cc);
                if matches!(condition, CellValue::Empty) {
                    continue;
                }
                let Some(db_col) = column_map[cc] else {
                    all = false;
                    break;
                };
                if !Criterion::parse(condition).matches(&row[db_col]) {
                    all = false;
                    break;
                }
            }
            if all {
                any_rule = true;
                break;
            }
        }
        if any_rule {
            out.push(row[field_index].clone());
        }
    }
    Ok(out)
}

fn selected_numbers(ctx: &mut Evaluator, args: &[Expr]) -> Result<Vec<f64>, ErrorKind> {
    let mut nums = Vec::new();
    for v in selected(ctx, args)? {
        match v {
            CellValue::Number(n) | CellValue::Date(n) => nums.push(n),
            CellValue::Error(e) => return Err(e),
            _ => {}
        }
    }
    Ok(nums)
}

fn dsum(args: &[Expr], ctx: &mut Evaluator) -> R {
    Ok(CellValue::Number(selected_numbers(ctx, args)?.iter().sum()))
}

fn dproduct(args: &[Expr], ctx: &mut Evaluator) -> R {
    Ok(CellValue::Number(
        selected_numbers(ctx, args)?.iter().product(),
    ))
}

fn daverage(args: &[Expr], ctx: &mut Evaluator) -> R {
    let nums = selected_numbers(ctx, args)?;
    if nums.is_empty() {
        return Err(ErrorKind::Div0);
    }
    Ok(CellValue::Number(
        nums.iter().sum::<f64>() / nums.len() as f64,
    ))
}

fn dcount(args: &[Expr], ctx: &mut Evaluator) -> R {
    Ok(CellValue::Number(selected_numbers(ctx, args)?.len() as f64))
}

fn dcounta(args: &[Expr], ctx: &mut Evaluator) -> R {
    let n = selected(ctx, args)?
        .iter()
        .filter(|v| !matches!(v, CellValue::Empty))
        .count();
    Ok(CellValue::Number(n as f64))
}

fn dmax(args: &[Expr], ctx: &mut Evaluator) -> R {
    let nums = selected_numbers(ctx, args)?;
    if nums.is_empty() {
        return Ok(CellValue::Number(0.0));
    }
    Ok(CellValue::Number(
        nums.iter().copied().fold(f64::NEG_INFINITY, f64::max),
    ))
}

fn dmin(args: &[Expr], ctx: &mut Evaluator) -> R {
    let nums = selected_numbers(ctx, args)?;
    if nums.is_empty() {
        return Ok(CellValue::Number(0.0));
    }
    Ok(CellValue::Number(
        nums.iter().copied().fold(f64::INFINITY, f64::min),
    ))
}

/// DGET wants exactly one matching record.
fn dget(args: &[Expr], ctx: &mut Evaluator) -> R {
    let matches = selected(ctx, args)?;
    match matches.len() {
        0 => Err(ErrorKind::Value),
        1 => Ok(matches.into_iter().next().expect("one match")),
        _ => Err(ErrorKind::Num),
    }
}

fn dstdevp(args: &[Expr], ctx: &mut Evaluator) -> R {
    match dvarp(args, ctx)? {
        CellValue::Number(v) => Ok(CellValue::Number(v.sqrt())),
        other => Ok(other),
    }
}

fn dvarp(args: &[Expr], ctx: &mut Evaluator) -> R {
    let nums = selected_numbers(ctx, args)?;
    if nums.is_empty() {
        return Err(ErrorKind::Div0);
    }
    let n = nums.len() as f64;
    let mean = nums.iter().sum::<f64>() / n;
    let ss: f64 = nums.iter().map(|x| (x - mean) * (x - mean)).sum();
    Ok(CellValue::Number(ss / n))
}
