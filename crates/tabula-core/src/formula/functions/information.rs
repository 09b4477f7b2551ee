//! Information functions: type predicates, `TYPE`/`ERROR.TYPE` codes, and
//! the partial `CELL`/`INFO`/`SHEET`/`SHEETS` surface.

use crate::error::ErrorKind;
use crate::formula::ast::Expr;
use crate::formula::eval::Evaluator;
use crate::formula::functions::{def, FunctionDef, NONE, RANGE_REF};
use crate::reference::column_name;
use crate::value::{to_text, CellValue};

pub(super) const DEFS: &[FunctionDef] = &[
    def("CELL", 1, 2, RANGE_REF, cell),
    def("ERROR.TYPE", 1, 1, NONE, error_type),
    def("INFO", 1, 1, NONE, info),
    def("ISBLANK", 1, 1, NONE, isblank),
    def("ISERR", 1, 1, NONE, iserr),
    def("ISERROR", 1, 1, NONE, iserror),
    def("ISEVEN", 1, 1, NONE, iseven),
    def("ISLOGICAL", 1, 1, NONE, islogical),
    def("ISNA", 1, 1, NONE, isna),
    def("ISNONTEXT", 1, 1, NONE, isnontext),
    def("ISNUMBER", 1, 1, NONE, isnumber),
    def("ISODD", 1, 1, NONE, isodd),
    def("ISREF", 1, 1, RANGE_REF, isref),
    def("ISTEXT", 1, 1, NONE, istext),
    def("N", 1, 1, NONE, n_),
    def("NA", 0, 0, NONE, na),
    def("SHEET", 0, 1, NONE, sheet),
    def("SHEETS", 0, 1, NONE, sheets),
    def("TYPE", 1, 1, NONE, type_),
];

type R = Result<CellValue, ErrorKind>;

fn isblank(args: &[Expr], ctx: &mut Evaluator) -> R {
    Ok(CellValue::Bool(matches!(ctx.arg(args, 0), CellValue::Empty)))
}

fn iserror(args: &[Expr], ctx: &mut Evaluator) -> R {
    Ok(CellValue::Bool(matches!(
        ctx.arg(args, 0),
        CellValue::Error(_)
    )))
}

/// ISERR is every error except #N/A.
fn iserr(args: &[Expr], ctx: &mut Evaluator) -> R {
    Ok(CellValue::Bool(matches!(
        ctx.arg(args, 0),
        CellValue::Error(e) if e != ErrorKind::Na
    )))
}

fn isna(args: &[Expr], ctx: &mut Evaluator) -> R {
    Ok(CellValue::Bool(matches!(
        ctx.arg(args, 0),
        CellValue::Error(ErrorKind::Na)
    )))
}

fn islogical(args: &[Expr], ctx: &mut Evaluator) -> R {
    Ok(CellValue::Bool(matches!(ctx.arg(args, 0), CellValue::Bool(_))))
}

fn isnumber(args: &[Expr], ctx: &mut Evaluator) -> R {
    Ok(CellValue::Bool(ctx.arg(args, 0).is_numeric()))
}

fn istext(args: &[Expr], ctx: &mut Evaluator) -> R {
    Ok(CellValue::Bool(matches!(ctx.arg(args, 0), CellValue::Text(_))))
}

fn isnontext(args: &[Expr], ctx: &mut Evaluator) -> R {
    Ok(CellValue::Bool(!matches!(
        ctx.arg(args, 0),
        CellValue::Text(_)
    )))
}

fn isref(args: &[Expr], ctx: &mut Evaluator) -> R {
    Ok(CellValue::Bool(ctx.reference_of(&args[0]).is_some()))
}

fn iseven(args: &[Expr], ctx: &mut Evaluator) -> R {
    let n = ctx.num(args, 0)?.trunc();
    Ok(CellValue::Bool(n.rem_euclid(2.0) == 0.0))
}

fn isodd(args: &[Expr], ctx: &mut Evaluator) -> R {
    let n = ctx.num(args, 0)?.trunc();
    Ok(CellValue::Bool(n.rem_euclid(2.0) == 1.0))
}

/// N: numbers pass through, dates as serials, TRUE is 1, all else 0.
fn n_(args: &[Expr], ctx: &mut Evaluator) -> R {
    match ctx.arg(args, 0) {
        CellValue::Number(n) | CellValue::Date(n) => Ok(CellValue::Number(n)),
        CellValue::Bool(b) => Ok(CellValue::Number(if b { 1.0 } else { 0.0 })),
        CellValue::Error(e) => Err(e),
        _ => Ok(CellValue::Number(0.0)),
    }
}

fn na(_args: &[Expr], _ctx: &mut Evaluator) -> R {
    Ok(CellValue::Error(ErrorKind::Na))
}

/// TYPE codes: 1 number, 2 text, 4 boolean, 16 error, 64 array.
fn type_(args: &[Expr], ctx: &mut Evaluator) -> R {
    let code = match ctx.arg(args, 0) {
        CellValue::Number(_) | CellValue::Date(_) | CellValue::Empty => 1.0,
        CellValue::Text(_) => 2.0,
        CellValue::Bool(_) => 4.0,
        CellValue::Error(_) => 16.0,
        CellValue::Array(_) => 64.0,
        CellValue::Formula { .. } => 1.0,
    };
    Ok(CellValue::Number(code))
}

fn error_type(args: &[Expr], ctx: &mut Evaluator) -> R {
    match ctx.arg(args, 0) {
        CellValue::Error(e) => match e.type_code() {
            Some(code) => Ok(CellValue::Number(code)),
            None => Err(ErrorKind::Na),
        },
        _ => Err(ErrorKind::Na),
    }
}

/// Partial CELL: address, row, col, contents, and type.
fn cell(args: &[Expr], ctx: &mut Evaluator) -> R {
    let info_type = ctx.text(args, 0)?.to_ascii_lowercase();
    let reference = args
        .get(1)
        .and_then(|e| ctx.reference_of(e))
        .ok_or(ErrorKind::Value)?;
    let start = reference.range.start;
    match info_type.as_str() {
        "address" => {
            let col = column_name(start.col).map_err(|_| ErrorKind::Value)?;
            Ok(CellValue::Text(format!("${col}${}", start.row)))
        }
        "row" => Ok(CellValue::Number(f64::from(start.row))),
        "col" => Ok(CellValue::Number(f64::from(start.col))),
        "contents" => {
            let sheet = reference
                .sheet
                .clone()
                .unwrap_or_else(|| ctx.current_sheet().to_string());
            Ok(ctx.resolve_cell(&sheet, start.col, start.row))
        }
        "type" => {
            let sheet = reference
                .sheet
                .clone()
                .unwrap_or_else(|| ctx.current_sheet().to_string());
            let v = ctx.resolve_cell(&sheet, start.col, start.row);
            let code = match v {
                CellValue::Empty => "b",
                CellValue::Text(_) => "l",
                _ => "v",
            };
            Ok(CellValue::Text(code.to_string()))
        }
        _ => Err(ErrorKind::Value),
    }
}

/// Partial INFO.
fn info(args: &[Expr], ctx: &mut Evaluator) -> R {
    let kind = ctx.text(args, 0)?.to_ascii_lowercase();
    match kind.as_str() {
        "numfile" => Ok(CellValue::Number(f64::from(ctx.sheet_count()))),
        "recalc" => Ok(CellValue::Text("Automatic".to_string())),
        _ => Err(ErrorKind::Value),
    }
}

fn sheet(args: &[Expr], ctx: &mut Evaluator) -> R {
    if args.is_empty() {
        let current = ctx.current_sheet().to_string();
        return ctx
            .sheet_position(&current)
            .map(|p| CellValue::Number(f64::from(p)))
            .ok_or(ErrorKind::Na);
    }
    let v = ctx.arg(args, 0);
    if let CellValue::Error(e) = v {
        return Err(e);
    }
    let name = to_text(&v);
    ctx.sheet_position(&name)
        .map(|p| CellValue::Number(f64::from(p)))
        .ok_or(ErrorKind::Na)
}

fn sheets(_args: &[Expr], ctx: &mut Evaluator) -> R {
    Ok(CellValue::Number(f64::from(ctx.sheet_count())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formula::eval::CellSnapshot;
    use crate::formula::parser::parse_formula;

    fn eval_str(snap: &CellSnapshot, formula: &str) -> CellValue {
        let expr = parse_formula(formula).unwrap();
        Evaluator::new(snap).eval(&expr)
    }

    #[test]
    fn test_type_predicates() {
        let mut snap = CellSnapshot::new("Sheet1");
        snap.set_a1("A1", CellValue::Number(1.0));
        snap.set_a1("A2", CellValue::Text("x".to_string()));
        snap.set_a1("A3", CellValue::Bool(true));
        assert_eq!(eval_str(&snap, "ISNUMBER(A1)"), CellValue::Bool(true));
        assert_eq!(eval_str(&snap, "ISNUMBER(A2)"), CellValue::Bool(false));
        assert_eq!(eval_str(&snap, "ISTEXT(A2)"), CellValue::Bool(true));
        assert_eq!(eval_str(&snap, "ISNONTEXT(A1)"), CellValue::Bool(true));
        assert_eq!(eval_str(&snap, "ISLOGICAL(A3)"), CellValue::Bool(true));
        assert_eq!(eval_str(&snap, "ISBLANK(A9)"), CellValue::Bool(true));
        assert_eq!(eval_str(&snap, "ISBLANK(A1)"), CellValue::Bool(false));
    }

    #[test]
    fn test_error_predicates() {
        let snap = CellSnapshot::new("Sheet1");
        assert_eq!(eval_str(&snap, "ISERROR(1/0)"), CellValue::Bool(true));
        assert_eq!(eval_str(&snap, "ISERROR(1)"), CellValue::Bool(false));
        assert_eq!(eval_str(&snap, "ISNA(#N/A)"), CellValue::Bool(true));
        assert_eq!(eval_str(&snap, "ISNA(#VALUE!)"), CellValue::Bool(false));
        assert_eq!(eval_str(&snap, "ISERR(#VALUE!)"), CellValue::Bool(true));
        assert_eq!(eval_str(&snap, "ISERR(#N/A)"), CellValue::Bool(false));
    }

    #[test]
    fn test_parity() {
        let snap = CellSnapshot::new("Sheet1");
        assert_eq!(eval_str(&snap, "ISEVEN(4)"), CellValue::Bool(true));
        assert_eq!(eval_str(&snap, "ISEVEN(5)"), CellValue::Bool(false));
        assert_eq!(eval_str(&snap, "ISODD(-3)"), CellValue::Bool(true));
        // Truncation happens first.
        assert_eq!(eval_str(&snap, "ISEVEN(2.9)"), CellValue::Bool(true));
    }

    #[test]
    fn test_n_and_na() {
        let snap = CellSnapshot::new("Sheet1");
        assert_eq!(eval_str(&snap, "N(7)"), CellValue::Number(7.0));
        assert_eq!(eval_str(&snap, "N(TRUE)"), CellValue::Number(1.0));
        assert_eq!(eval_str(&snap, "N(\"x\")"), CellValue::Number(0.0));
        assert_eq!(eval_str(&snap, "NA()"), CellValue::Error(ErrorKind::Na));
    }

    #[test]
    fn test_type_codes() {
        let snap = CellSnapshot::new("Sheet1");
        assert_eq!(eval_str(&snap, "TYPE(1)"), CellValue::Number(1.0));
        assert_eq!(eval_str(&snap, "TYPE(\"x\")"), CellValue::Number(2.0));
        assert_eq!(eval_str(&snap, "TYPE(TRUE)"), CellValue::Number(4.0));
        assert_eq!(eval_str(&snap, "TYPE(#N/A)"), CellValue::Number(16.0));
        assert_eq!(eval_str(&snap, "TYPE({1,2})"), CellValue::Number(64.0));
    }

    #[test]
    fn test_error_type_codes() {
        let snap = CellSnapshot::new("Sheet1");
        assert_eq!(eval_str(&snap, "ERROR.TYPE(#NULL!)"), CellValue::Number(1.0));
        assert_eq!(eval_str(&snap, "ERROR.TYPE(#DIV/0!)"), CellValue::Number(2.0));
        assert_eq!(eval_str(&snap, "ERROR.TYPE(#N/A)"), CellValue::Number(7.0));
        assert_eq!(
            eval_str(&snap, "ERROR.TYPE(5)"),
            CellValue::Error(ErrorKind::Na)
        );
    }

    #[test]
    fn test_cell_partial() {
        let mut snap = CellSnapshot::new("Sheet1");
        snap.set_a1("B2", CellValue::Number(9.0));
        assert_eq!(
            eval_str(&snap, "CELL(\"address\",B2)"),
            CellValue::Text("$B$2".to_string())
        );
        assert_eq!(eval_str(&snap, "CELL(\"row\",B2)"), CellValue::Number(2.0));
        assert_eq!(eval_str(&snap, "CELL(\"col\",B2)"), CellValue::Number(2.0));
        assert_eq!(
            eval_str(&snap, "CELL(\"contents\",B2)"),
            CellValue::Number(9.0)
        );
        assert_eq!(
            eval_str(&snap, "CELL(\"type\",B2)"),
            CellValue::Text("v".to_string())
        );
        assert_eq!(
            eval_str(&snap, "CELL(\"type\",Z9)"),
            CellValue::Text("b".to_string())
        );
    }

    #[test]
    fn test_isref() {
        let snap = CellSnapshot::new("Sheet1");
        assert_eq!(eval_str(&snap, "ISREF(A1)"), CellValue::Bool(true));
        assert_eq!(eval_str(&snap, "ISREF(A1:B3)"), CellValue::Bool(true));
        assert_eq!(eval_str(&snap, "ISREF(1+1)"), CellValue::Bool(false));
    }

    #[test]
    fn test_sheet_and_sheets() {
        let mut snap = CellSnapshot::new("Sheet1");
        snap.set("Data", 1, 1, CellValue::Number(1.0));
        assert_eq!(eval_str(&snap, "SHEETS()"), CellValue::Number(2.0));
        assert_eq!(eval_str(&snap, "SHEET()"), CellValue::Number(1.0));
        assert_eq!(eval_str(&snap, "SHEET(\"Data\")"), CellValue::Number(2.0));
        assert_eq!(
            eval_str(&snap, "SHEET(\"Nope\")"),
            CellValue::Error(ErrorKind::Na)
        );
    }

    #[test]
    fn test_info_partial() {
        let snap = CellSnapshot::new("Sheet1");
        assert_eq!(
            eval_str(&snap, "INFO(\"recalc\")"),
            CellValue::Text("Automatic".to_string())
        );
        assert_eq!(eval_str(&snap, "INFO(\"numfile\")"), CellValue::Number(1.0));
        assert_eq!(
            eval_str(&snap, "INFO(\"osversion\")"),
            CellValue::Error(ErrorKind::Value)
        );
    }
}
