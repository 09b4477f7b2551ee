//! Lookup and reference functions.
//!
//! Approximate-match lookups binary-search a sorted key vector for the
//! largest key not above the target; exact-match lookups scan in order and
//! honour `*`/`?` wildcards on text keys.

use std::cmp::Ordering;

use crate::error::ErrorKind;
use crate::formula::ast::{Expr, RefExpr};
use crate::formula::criteria::wildcard_match;
use crate::formula::eval::Evaluator;
use crate::formula::functions::{
    def, FunctionDef, MANY, NONE, RANGE_REF, SHORT_CIRCUIT, VOLATILE,
};
use crate::reference::{column_name, Range};
use crate::value::{compare, to_text, CellValue, Matrix};

pub(super) const DEFS: &[FunctionDef] = &[
    def("ADDRESS", 2, 5, NONE, address),
    def("CHOOSE", 2, MANY, SHORT_CIRCUIT, choose),
    def("COLUMN", 1, 1, RANGE_REF, column),
    def("COLUMNS", 1, 1, RANGE_REF, columns),
    def("HLOOKUP", 3, 4, NONE, hlookup),
    def("INDEX", 2, 3, NONE, index),
    def("INDIRECT", 1, 2, VOLATILE, indirect),
    def("LOOKUP", 2, 3, NONE, lookup_fn),
    def("MATCH", 2, 3, NONE, match_fn),
    def("OFFSET", 3, 5, RANGE_REF, offset),
    def("ROW", 1, 1, RANGE_REF, row),
    def("ROWS", 1, 1, RANGE_REF, rows),
    def("VLOOKUP", 3, 4, NONE, vlookup),
    def("XLOOKUP", 3, 6, NONE, xlookup),
    def("XMATCH", 2, 4, NONE, xmatch),
];

type R = Result<CellValue, ErrorKind>;

/// Equality for lookup keys: case-insensitive text, wildcards when asked.
fn keys_equal(key: &CellValue, target: &CellValue, wildcards: bool) -> bool {
    if wildcards {
        if let CellValue::Text(pattern) = target {
            if pattern.contains('*') || pattern.contains('?') {
                let text = to_text(key).to_ascii_lowercase();
                return wildcard_match(&text, &pattern.to_ascii_lowercase());
            }
        }
    }
    compare(key, target) == Ordering::Equal
}

/// Binary search: index of the largest key not above the target, assuming
/// ascending order.
fn largest_not_above(keys: &[CellValue], target: &CellValue) -> Option<usize> {
    let (mut lo, mut hi) = (0usize, keys.len());
    while lo < hi {
        let mid = (lo + hi) / 2;
        if compare(&keys[mid], target) == Ordering::Greater {
            hi = mid;
        } else {
            lo = mid + 1;
        }
    }
    lo.checked_sub(1)
}

fn vlookup(args: &[Expr], ctx: &mut Evaluator) -> R {
    let target = ctx.arg(args, 0);
    if let CellValue::Error(e) = target {
        return Err(e);
    }
    let table = ctx.matrix(args, 1)?;
    let col_index = ctx.int(args, 2)?;
    let approximate = ctx.bool_or(args, 3, true)?;
    if col_index < 1 || col_index as usize > table.cols {
        return Err(ErrorKind::Ref);
    }

    let keys = table.column(0);
    let row = if approximate {
        largest_not_above(&keys, &target).ok_or(ErrorKind::Na)?
    } else {
        keys.iter()
            .position(|k| keys_equal(k, &target, true))
            .ok_or(ErrorKind::Na)?
    };
    Ok(table.get(row, col_index as usize - 1).clone())
}

fn hlookup(args: &[Expr], ctx: &mut Evaluator) -> R {
    let target = ctx.arg(args, 0);
    if let CellValue::Error(e) = target {
        return Err(e);
    }
    let table = ctx.matrix(args, 1)?;
    let row_index = ctx.int(args, 2)?;
    let approximate = ctx.bool_or(args, 3, true)?;
    if row_index < 1 || row_index as usize > table.rows {
        return Err(ErrorKind::Ref);
    }

    let keys = table.row(0);
    let col = if approximate {
        largest_not_above(&keys, &target).ok_or(ErrorKind::Na)?
    } else {
        keys.iter()
            .position(|k| keys_equal(k, &target, true))
            .ok_or(ErrorKind::Na)?
    };
    Ok(table.get(row_index as usize - 1, col).clone())
}

/// LOOKUP vector form.
fn lookup_fn(args: &[Expr], ctx: &mut Evaluator) -> R {
    let target = ctx.arg(args, 0);
    if let CellValue::Error(e) = target {
        return Err(e);
    }
    let lookup = ctx.matrix(args, 1)?;
    if !lookup.is_vector() {
        return Err(ErrorKind::Na);
    }
    let results = if ctx.has_arg(args, 2) {
        let m = ctx.matrix(args, 2)?;
        if m.values.len() != lookup.values.len() {
            return Err(ErrorKind::Na);
        }
        m
    } else {
        lookup.clone()
    };
    let idx = largest_not_above(&lookup.values, &target).ok_or(ErrorKind::Na)?;
    Ok(results.values[idx].clone())
}

fn match_fn(args: &[Expr], ctx: &mut Evaluator) -> R {
    let target = ctx.arg(args, 0);
    if let CellValue::Error(e) = target {
        return Err(e);
    }
    let array = ctx.matrix(args, 1)?;
    if !array.is_vector() {
        return Err(ErrorKind::Na);
    }
    let match_type = ctx.num_or(args, 2, 1.0)?;
    let items = &array.values;

    let position = if match_type == 0.0 {
        items.iter().position(|v| keys_equal(v, &target, true))
    } else if match_type > 0.0 {
        largest_not_above(items, &target)
    } else {
        // Descending data: smallest value >= target.
        let mut found = None;
        for (i, v) in items.iter().enumerate() {
            if compare(v, &target) == Ordering::Less {
                break;
            }
            found = Some(i);
        }
        found
    };
    position
        .map(|i| CellValue::Number(i as f64 + 1.0))
        .ok_or(ErrorKind::Na)
}

fn xmatch(args: &[Expr], ctx: &mut Evaluator) -> R {
    let target = ctx.arg(args, 0);
    if let CellValue::Error(e) = target {
        return Err(e);
    }
    let array = ctx.matrix(args, 1)?;
    if !array.is_vector() {
        return Err(ErrorKind::Value);
    }
    let match_mode = ctx.num_or(args, 2, 0.0)? as i64;
    let search_mode = ctx.num_or(args, 3, 1.0)? as i64;
    xlookup_position(&array.values, &target, match_mode, search_mode)
        .map(|i| CellValue::Number(i as f64 + 1.0))
        .ok_or(ErrorKind::Na)
}

/// Shared search core for XLOOKUP / XMATCH: four match modes (exact,
/// exact-or-next-smaller, exact-or-next-larger, wildcard) and four search
/// directions (forward, reverse, binary ascending, binary descending).
fn xlookup_position(
    items: &[CellValue],
    target: &CellValue,
    match_mode: i64,
    search_mode: i64,
) -> Option<usize> {
    let exact = |v: &CellValue| keys_equal(v, target, match_mode == 2);

    match search_mode {
        1 | -1 => {
            let indices: Vec<usize> = if search_mode == 1 {
                (0..items.len()).collect()
            } else {
                (0..items.len()).rev().collect()
            };
            for &i in &indices {
                if exact(&items[i]) {
                    return Some(i);
                }
            }
            match match_mode {
                -1 => {
                    // Exact or next smaller.
                    let mut best: Option<usize> = None;
                    for &i in &indices {
                        if compare(&items[i], target) != Ordering::Greater
                            && best.map_or(true, |b| {
                                compare(&items[i], &items[b]) == Ordering::Greater
                            })
                        {
                            best = Some(i);
                        }
                    }
                    best
                }
                1 => {
                    // Exact or next larger.
                    let mut best: Option<usize> = None;
                    for &i in &indices {
                        if compare(&items[i], target) != Ordering::Less
                            && best.map_or(true, |b| {
                                compare(&items[i], &items[b]) == Ordering::Less
                            })
                        {
                            best = Some(i);
                        }
                    }
                    best
                }
                _ => None,
            }
        }
        2 | -2 => {
            // Binary search over sorted data; descending order flips the
            // comparison.
            let cmp = |v: &CellValue| {
                let ord = compare(v, target);
                if search_mode == 2 {
                    ord
                } else {
                    ord.reverse()
                }
            };
            let (mut lo, mut hi) = (0usize, items.len());
            while lo < hi {
                let mid = (lo + hi) / 2;
                if cmp(&items[mid]) == Ordering::Greater {
                    hi = mid;
                } else {
                    lo = mid + 1;
                }
            }
            let candidate = lo.checked_sub(1);
            match (candidate, match_mode) {
                (Some(i), _) if compare(&items[i], target) == Ordering::Equal => Some(i),
                (c, -1) => c,
                (c, 1) => {
                    let next = c.map_or(0, |i| i + 1);
                    if next < items.len() {
                        Some(next)
                    } else {
                        None
                    }
                }
                _ => None,
            }
        }
        _ => None,
    }
}

fn xlookup(args: &[Expr], ctx: &mut Evaluator) -> R {
    let target = ctx.arg(args, 0);
    if let CellValue::Error(e) = target {
        return Err(e);
    }
    let lookup = ctx.matrix(args, 1)?;
    if !lookup.is_vector() {
        return Err(ErrorKind::Value);
    }
    let returns = ctx.matrix(args, 2)?;
    let match_mode = ctx.num_or(args, 4, 0.0)? as i64;
    let search_mode = ctx.num_or(args, 5, 1.0)? as i64;

    let Some(position) = xlookup_position(&lookup.values, &target, match_mode, search_mode)
    else {
        if ctx.has_arg(args, 3) {
            return Ok(ctx.arg(args, 3));
        }
        return Err(ErrorKind::Na);
    };

    // Vertical lookup returns the matching row of the return array;
    // horizontal returns the matching column.
    let vertical = lookup.cols == 1 && lookup.rows > 1;
    if vertical {
        if returns.rows != lookup.rows {
            return Err(ErrorKind::Value);
        }
        let slice = returns.row(position);
        if slice.len() == 1 {
            return Ok(slice.into_iter().next().expect("one element"));
        }
        Ok(CellValue::Array(Matrix::new(1, slice.len(), slice)))
    } else {
        if returns.cols != lookup.values.len() {
            return Err(ErrorKind::Value);
        }
        let slice = returns.column(position);
        if slice.len() == 1 {
            return Ok(slice.into_iter().next().expect("one element"));
        }
        let rows = slice.len();
        Ok(CellValue::Array(Matrix::new(rows, 1, slice)))
    }
}

fn index(args: &[Expr], ctx: &mut Evaluator) -> R {
    let table = ctx.matrix(args, 0)?;
    let row_num = ctx.int(args, 1)?;
    let col_num = if ctx.has_arg(args, 2) {
        ctx.int(args, 2)?
    } else if table.is_vector() && table.cols > 1 {
        // A horizontal vector indexes by column through the second arg.
        0
    } else {
        1
    };

    // Row or column zero selects the whole row/column.
    if row_num == 0 && col_num >= 1 {
        if col_num as usize > table.cols {
            return Err(ErrorKind::Ref);
        }
        let slice = table.column(col_num as usize - 1);
        let rows = slice.len();
        return Ok(CellValue::Array(Matrix::new(rows, 1, slice)));
    }
    if table.is_vector() && !ctx.has_arg(args, 2) {
        // Vector form: the second argument indexes along the vector.
        let i = row_num;
        if i < 1 || i as usize > table.values.len() {
            return Err(ErrorKind::Ref);
        }
        return Ok(table.values[i as usize - 1].clone());
    }
    if row_num < 1
        || row_num as usize > table.rows
        || col_num < 1
        || col_num as usize > table.cols
    {
        return Err(ErrorKind::Ref);
    }
    Ok(table.get(row_num as usize - 1, col_num as usize - 1).clone())
}

fn choose(args: &[Expr], ctx: &mut Evaluator) -> R {
    let index = ctx.int(args, 0)?;
    if index < 1 || index as usize >= args.len() {
        return Err(ErrorKind::Value);
    }
    Ok(ctx.arg(args, index as usize))
}

fn row(args: &[Expr], ctx: &mut Evaluator) -> R {
    let r = ctx
        .reference_of(&args[0])
        .ok_or(ErrorKind::Value)?;
    let range = r.range;
    if range.rows() == 1 {
        return Ok(CellValue::Number(f64::from(range.start.row)));
    }
    let values = (range.start.row..=range.end.row)
        .map(|n| CellValue::Number(f64::from(n)))
        .collect::<Vec<_>>();
    let rows = values.len();
    Ok(CellValue::Array(Matrix::new(rows, 1, values)))
}

fn column(args: &[Expr], ctx: &mut Evaluator) -> R {
    let r = ctx
        .reference_of(&args[0])
        .ok_or(ErrorKind::Value)?;
    let range = r.range;
    if range.cols() == 1 {
        return Ok(CellValue::Number(f64::from(range.start.col)));
    }
    let values = (range.start.col..=range.end.col)
        .map(|n| CellValue::Number(f64::from(n)))
        .collect::<Vec<_>>();
    let cols = values.len();
    Ok(CellValue::Array(Matrix::new(1, cols, values)))
}

fn rows(args: &[Expr], ctx: &mut Evaluator) -> R {
    match ctx.reference_of(&args[0]) {
        Some(r) => Ok(CellValue::Number(f64::from(r.range.rows()))),
        None => {
            let m = ctx.matrix(args, 0)?;
            Ok(CellValue::Number(m.rows as f64))
        }
    }
}

fn columns(args: &[Expr], ctx: &mut Evaluator) -> R {
    match ctx.reference_of(&args[0]) {
        Some(r) => Ok(CellValue::Number(f64::from(r.range.cols()))),
        None => {
            let m = ctx.matrix(args, 0)?;
            Ok(CellValue::Number(m.cols as f64))
        }
    }
}

fn offset(args: &[Expr], ctx: &mut Evaluator) -> R {
    let base = ctx.reference_of(&args[0]).ok_or(ErrorKind::Value)?;
    let drow = ctx.int(args, 1)?;
    let dcol = ctx.int(args, 2)?;
    let height = if ctx.has_arg(args, 3) {
        ctx.int(args, 3)?
    } else {
        i64::from(base.range.rows())
    };
    let width = if ctx.has_arg(args, 4) {
        ctx.int(args, 4)?
    } else {
        i64::from(base.range.cols())
    };
    if height < 1 || width < 1 {
        return Err(ErrorKind::Ref);
    }

    let start = base
        .range
        .start
        .relative()
        .shifted(dcol, drow)
        .map_err(|_| ErrorKind::Ref)?;
    let end = start
        .shifted(width - 1, height - 1)
        .map_err(|_| ErrorKind::Ref)?;
    let shifted = RefExpr {
        sheet: base.sheet.clone(),
        range: Range::new(start, end),
    };

    let sheet = shifted
        .sheet
        .clone()
        .unwrap_or_else(|| ctx.current_sheet().to_string());
    if shifted.is_single() {
        Ok(ctx.resolve_cell(&sheet, shifted.range.start.col, shifted.range.start.row))
    } else {
        Ok(CellValue::Array(ctx.load_range(&sheet, shifted.range)))
    }
}

fn indirect(args: &[Expr], ctx: &mut Evaluator) -> R {
    let text = ctx.text(args, 0)?;
    let a1_style = ctx.bool_or(args, 1, true)?;
    if !a1_style {
        // R1C1 is not part of this dialect.
        return Err(ErrorKind::Ref);
    }
    let (sheet, body) = match text.split_once('!') {
        Some((s, rest)) => {
            let s = s.trim_matches('\'').replace("''", "'");
            (Some(s), rest.to_string())
        }
        None => (None, text),
    };
    let range = Range::parse(&body).map_err(|_| ErrorKind::Ref)?;
    let sheet = sheet.unwrap_or_else(|| ctx.current_sheet().to_string());
    if range.start == range.end {
        Ok(ctx.resolve_cell(&sheet, range.start.col, range.start.row))
    } else {
        Ok(CellValue::Array(ctx.load_range(&sheet, range)))
    }
}

fn address(args: &[Expr], ctx: &mut Evaluator) -> R {
    let row = ctx.int(args, 0)?;
    let col = ctx.int(args, 1)?;
    let abs = ctx.num_or(args, 2, 1.0)? as i64;
    let a1 = ctx.bool_or(args, 3, true)?;
    if !a1 {
        return Err(ErrorKind::Value);
    }
    if row < 1 || col < 1 {
        return Err(ErrorKind::Value);
    }
    let col_name =
        column_name(u32::try_from(col).map_err(|_| ErrorKind::Value)?).map_err(|_| ErrorKind::Value)?;
    let (col_marker, row_marker) = match abs {
        1 => ("$", "$"),
        2 => ("", "$"),
        3 => ("$", ""),
        4 => ("", ""),
        _ => return Err(ErrorKind::Value),
    };
    let cell = format!("{col_marker}{col_name}{row_marker}{row}");
    if ctx.has_arg(args, 4) {
        let sheet = ctx.text(args, 4)?;
        let needs_quotes = sheet
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '!' | '\'' | '[' | ']'));
        let prefix = if needs_quotes {
            format!("'{}'", sheet.replace('\'', "''"))
        } else {
            sheet
        };
        return Ok(CellValue::Text(format!("{prefix}!{cell}")));
    }
    Ok(CellValue::Text(cell))
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

    fn fruit_table() -> CellSnapshot {
        let mut snap = CellSnapshot::new("Sheet1");
        for (i, (name, qty)) in [("Apple", 1.0), ("Apricot", 2.0), ("Banana", 3.0)]
            .iter()
            .enumerate()
        {
            snap.set("Sheet1", 1, i as u32 + 1, CellValue::Text(name.to_string()));
            snap.set("Sheet1", 2, i as u32 + 1, CellValue::Number(*qty));
        }
        snap
    }

    #[test]
    fn test_vlookup_exact_vs_approximate() {
        let mut snap = CellSnapshot::new("Sheet1");
        for (i, (k, v)) in [(10.0, "a"), (20.0, "b"), (30.0, "c")].iter().enumerate() {
            snap.set("Sheet1", 1, i as u32 + 1, CellValue::Number(*k));
            snap.set("Sheet1", 2, i as u32 + 1, CellValue::Text(v.to_string()));
        }
        assert_eq!(
            eval_str(&snap, "VLOOKUP(25,A1:B3,2,FALSE)"),
            CellValue::Error(ErrorKind::Na)
        );
        assert_eq!(
            eval_str(&snap, "VLOOKUP(25,A1:B3,2,TRUE)"),
            CellValue::Text("b".to_string())
        );
        assert_eq!(
            eval_str(&snap, "VLOOKUP(30,A1:B3,2,FALSE)"),
            CellValue::Text("c".to_string())
        );
        // Below the smallest key.
        assert_eq!(
            eval_str(&snap, "VLOOKUP(5,A1:B3,2,TRUE)"),
            CellValue::Error(ErrorKind::Na)
        );
    }

    #[test]
    fn test_vlookup_wildcard_exact() {
        let snap = fruit_table();
        assert_eq!(
            eval_str(&snap, "VLOOKUP(\"Ap*\",A1:B3,2,FALSE)"),
            CellValue::Number(1.0)
        );
        assert_eq!(
            eval_str(&snap, "VLOOKUP(\"ban*\",A1:B3,2,FALSE)"),
            CellValue::Number(3.0)
        );
    }

    #[test]
    fn test_vlookup_col_out_of_range() {
        let snap = fruit_table();
        assert_eq!(
            eval_str(&snap, "VLOOKUP(\"Apple\",A1:B3,5,FALSE)"),
            CellValue::Error(ErrorKind::Ref)
        );
    }

    #[test]
    fn test_hlookup() {
        let snap = CellSnapshot::new("Sheet1");
        assert_eq!(
            eval_str(&snap, "HLOOKUP(20,{10,20,30;\"x\",\"y\",\"z\"},2,FALSE)"),
            CellValue::Text("y".to_string())
        );
        assert_eq!(
            eval_str(&snap, "HLOOKUP(25,{10,20,30;\"x\",\"y\",\"z\"},2,TRUE)"),
            CellValue::Text("y".to_string())
        );
    }

    #[test]
    fn test_lookup_vector() {
        let snap = CellSnapshot::new("Sheet1");
        assert_eq!(
            eval_str(&snap, "LOOKUP(25,{10,20,30},{\"a\",\"b\",\"c\"})"),
            CellValue::Text("b".to_string())
        );
        assert_eq!(
            eval_str(&snap, "LOOKUP(25,{10,20,30})"),
            CellValue::Number(20.0)
        );
    }

    #[test]
    fn test_match_modes() {
        let snap = CellSnapshot::new("Sheet1");
        assert_eq!(eval_str(&snap, "MATCH(20,{10,20,30},0)"), CellValue::Number(2.0));
        assert_eq!(eval_str(&snap, "MATCH(25,{10,20,30},1)"), CellValue::Number(2.0));
        assert_eq!(eval_str(&snap, "MATCH(25,{30,20,10},-1)"), CellValue::Number(2.0));
        assert_eq!(
            eval_str(&snap, "MATCH(\"b?n*\",{\"apple\",\"banana\"},0)"),
            CellValue::Number(2.0)
        );
        assert_eq!(
            eval_str(&snap, "MATCH(99,{1,2},0)"),
            CellValue::Error(ErrorKind::Na)
        );
    }

    #[test]
    fn test_index() {
        let snap = CellSnapshot::new("Sheet1");
        assert_eq!(
            eval_str(&snap, "INDEX({1,2;3,4},2,1)"),
            CellValue::Number(3.0)
        );
        assert_eq!(
            eval_str(&snap, "INDEX({10,20,30},2)"),
            CellValue::Number(20.0)
        );
        assert_eq!(
            eval_str(&snap, "INDEX({1,2;3,4},5,1)"),
            CellValue::Error(ErrorKind::Ref)
        );
    }

    #[test]
    fn test_choose_short_circuits() {
        let snap = CellSnapshot::new("Sheet1");
        assert_eq!(
            eval_str(&snap, "CHOOSE(2,\"a\",\"b\",\"c\")"),
            CellValue::Text("b".to_string())
        );
        // Unchosen error branch is never evaluated.
        assert_eq!(eval_str(&snap, "CHOOSE(1,7,1/0)"), CellValue::Number(7.0));
        assert_eq!(
            eval_str(&snap, "CHOOSE(9,1,2)"),
            CellValue::Error(ErrorKind::Value)
        );
    }

    #[test]
    fn test_row_column_shapes() {
        let snap = CellSnapshot::new("Sheet1");
        assert_eq!(eval_str(&snap, "ROW(B5)"), CellValue::Number(5.0));
        assert_eq!(eval_str(&snap, "COLUMN(B5)"), CellValue::Number(2.0));
        match eval_str(&snap, "ROW(A1:B3)") {
            CellValue::Array(m) => {
                assert_eq!((m.rows, m.cols), (3, 1));
                assert_eq!(m.values[2], CellValue::Number(3.0));
            }
            other => panic!("unexpected {other:?}"),
        }
        match eval_str(&snap, "COLUMN(A1:B3)") {
            CellValue::Array(m) => assert_eq!((m.rows, m.cols), (1, 2)),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(eval_str(&snap, "ROWS(A1:B3)"), CellValue::Number(3.0));
        assert_eq!(eval_str(&snap, "COLUMNS(A1:B3)"), CellValue::Number(2.0));
    }

    #[test]
    fn test_offset() {
        let mut snap = CellSnapshot::new("Sheet1");
        snap.set_a1("C3", CellValue::Number(9.0));
        assert_eq!(eval_str(&snap, "OFFSET(A1,2,2)"), CellValue::Number(9.0));
        assert_eq!(
            eval_str(&snap, "OFFSET(A1,-1,0)"),
            CellValue::Error(ErrorKind::Ref)
        );
        match eval_str(&snap, "OFFSET(A1,0,0,2,3)") {
            CellValue::Array(m) => assert_eq!((m.rows, m.cols), (2, 3)),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_indirect() {
        let mut snap = CellSnapshot::new("Sheet1");
        snap.set_a1("B2", CellValue::Number(42.0));
        snap.set("Data", 1, 1, CellValue::Number(7.0));
        assert_eq!(eval_str(&snap, "INDIRECT(\"B2\")"), CellValue::Number(42.0));
        assert_eq!(
            eval_str(&snap, "INDIRECT(\"Data!A1\")"),
            CellValue::Number(7.0)
        );
        assert_eq!(
            eval_str(&snap, "INDIRECT(\"nonsense\")"),
            CellValue::Error(ErrorKind::Ref)
        );
    }

    #[test]
    fn test_address() {
        let snap = CellSnapshot::new("Sheet1");
        assert_eq!(
            eval_str(&snap, "ADDRESS(2,3)"),
            CellValue::Text("$C$2".to_string())
        );
        assert_eq!(
            eval_str(&snap, "ADDRESS(2,3,4)"),
            CellValue::Text("C2".to_string())
        );
        assert_eq!(
            eval_str(&snap, "ADDRESS(2,3,2)"),
            CellValue::Text("C$2".to_string())
        );
        assert_eq!(
            eval_str(&snap, "ADDRESS(1,1,1,TRUE,\"My Sheet\")"),
            CellValue::Text("'My Sheet'!$A$1".to_string())
        );
    }

    #[test]
    fn test_xlookup_modes() {
        let snap = fruit_table();
        assert_eq!(
            eval_str(&snap, "XLOOKUP(\"Apricot\",A1:A3,B1:B3)"),
            CellValue::Number(2.0)
        );
        assert_eq!(
            eval_str(&snap, "XLOOKUP(\"Cherry\",A1:A3,B1:B3,\"missing\")"),
            CellValue::Text("missing".to_string())
        );
        // Wildcard mode.
        assert_eq!(
            eval_str(&snap, "XLOOKUP(\"Ban*\",A1:A3,B1:B3,,2)"),
            CellValue::Number(3.0)
        );
    }

    #[test]
    fn test_xlookup_next_smaller_larger() {
        let snap = CellSnapshot::new("Sheet1");
        assert_eq!(
            eval_str(&snap, "XLOOKUP(25,{10,20,30},{1,2,3},,-1)"),
            CellValue::Number(2.0)
        );
        assert_eq!(
            eval_str(&snap, "XLOOKUP(25,{10,20,30},{1,2,3},,1)"),
            CellValue::Number(3.0)
        );
        // Binary-ascending search.
        assert_eq!(
            eval_str(&snap, "XLOOKUP(20,{10,20,30},{1,2,3},,0,2)"),
            CellValue::Number(2.0)
        );
        // Binary-descending search.
        assert_eq!(
            eval_str(&snap, "XLOOKUP(20,{30,20,10},{3,2,1},,0,-2)"),
            CellValue::Number(2.0)
        );
        // Reverse linear search takes the last match.
        assert_eq!(
            eval_str(&snap, "XLOOKUP(20,{20,20,30},{1,2,3},,0,-1)"),
            CellValue::Number(2.0)
        );
    }

    #[test]
    fn test_xmatch() {
        let snap = CellSnapshot::new("Sheet1");
        assert_eq!(
            eval_str(&snap, "XMATCH(20,{10,20,30})"),
            CellValue::Number(2.0)
        );
        assert_eq!(
            eval_str(&snap, "XMATCH(25,{10,20,30},-1)"),
            CellValue::Number(2.0)
        );
    }
}
