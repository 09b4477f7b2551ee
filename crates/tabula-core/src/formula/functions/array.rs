//! Dynamic array functions: reshaping, filtering, sorting, and stacking of
//! rectangular blocks.

use std::cmp::Ordering;

use crate::error::ErrorKind;
use crate::formula::ast::Expr;
use crate::formula::eval::Evaluator;
use crate::formula::functions::{def, FunctionDef, MANY, NONE};
use crate::value::{compare, to_bool, CellValue, Matrix};

pub(super) const DEFS: &[FunctionDef] = &[
    def("CHOOSECOLS", 2, MANY, NONE, choosecols),
    def("CHOOSEROWS", 2, MANY, NONE, chooserows),
    def("DROP", 2, 3, NONE, drop),
    def("FILTER", 2, 3, NONE, filter),
    def("HSTACK", 1, MANY, NONE, hstack),
    def("SEQUENCE", 1, 4, NONE, sequence),
    def("SORT", 1, 4, NONE, sort),
    def("SORTBY", 2, MANY, NONE, sortby),
    def("TAKE", 2, 3, NONE, take),
    def("TRANSPOSE", 1, 1, NONE, transpose),
    def("UNIQUE", 1, 3, NONE, unique),
    def("VSTACK", 1, MANY, NONE, vstack),
];

type R = Result<CellValue, ErrorKind>;

fn result_of(m: Matrix) -> R {
    if m.values.is_empty() {
        return Err(ErrorKind::Calc);
    }
    if m.rows == 1 && m.cols == 1 {
        return Ok(m.values.into_iter().next().expect("one element"));
    }
    Ok(CellValue::Array(m))
}

fn transpose(args: &[Expr], ctx: &mut Evaluator) -> R {
    let m = ctx.matrix(args, 0)?;
    let mut values = Vec::with_capacity(m.values.len());
    for c in 0..m.cols {
        for r in 0..m.rows {
            values.push(m.get(r, c).clone());
        }
    }
    result_of(Matrix::new(m.cols, m.rows, values))
}

fn sequence(args: &[Expr], ctx: &mut Evaluator) -> R {
    let rows = ctx.int(args, 0)?;
    let cols = if ctx.has_arg(args, 1) {
        ctx.int(args, 1)?
    } else {
        1
    };
    let start = ctx.num_or(args, 2, 1.0)?;
    let step = ctx.num_or(args, 3, 1.0)?;
    if rows < 1 || cols < 1 {
        return Err(ErrorKind::Value);
    }
    let total = (rows * cols) as usize;
    let mut values = Vec::with_capacity(total);
    for i in 0..total {
        values.push(CellValue::Number(start + step * i as f64));
    }
    result_of(Matrix::new(rows as usize, cols as usize, values))
}

fn filter(args: &[Expr], ctx: &mut Evaluator) -> R {
    let data = ctx.matrix(args, 0)?;
    let include = ctx.matrix(args, 1)?;

    // The mask is a vector matching either the rows or the columns.
    let by_rows = include.cols == 1 && include.rows == data.rows;
    let by_cols = include.rows == 1 && include.cols == data.cols;
    if !by_rows && !by_cols {
        return Err(ErrorKind::Value);
    }

    let mut mask = Vec::with_capacity(include.values.len());
    for v in &include.values {
        match v {
            CellValue::Error(e) => return Err(*e),
            other => mask.push(to_bool(other).unwrap_or(false)),
        }
    }

    let kept: Vec<usize> = mask
        .iter()
        .enumerate()
        .filter(|(_, keep)| **keep)
        .map(|(i, _)| i)
        .collect();
    if kept.is_empty() {
        if ctx.has_arg(args, 2) {
            return Ok(ctx.arg(args, 2));
        }
        return Err(ErrorKind::Calc);
    }

    let mut values = Vec::new();
    let (rows, cols) = if by_rows {
        for &r in &kept {
            values.extend(data.row(r));
        }
        (kept.len(), data.cols)
    } else {
        for r in 0..data.rows {
            for &c in &kept {
                values.push(data.get(r, c).clone());
            }
        }
        (data.rows, kept.len())
    };
    result_of(Matrix::new(rows, cols, values))
}

fn sort_indices(keys: &[CellValue], descending: bool) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..keys.len()).collect();
    indices.sort_by(|&a, &b| {
        let ord = compare(&keys[a], &keys[b]);
        if descending {
            ord.reverse()
        } else {
            ord
        }
    });
    indices
}

fn sort(args: &[Expr], ctx: &mut Evaluator) -> R {
    let data = ctx.matrix(args, 0)?;
    let sort_index = if ctx.has_arg(args, 1) {
        ctx.int(args, 1)?
    } else {
        1
    };
    let descending = ctx.num_or(args, 2, 1.0)? < 0.0;
    let by_col = ctx.bool_or(args, 3, false)?;

    if by_col {
        if sort_index < 1 || sort_index as usize > data.rows {
            return Err(ErrorKind::Value);
        }
        let keys = data.row(sort_index as usize - 1);
        let order = sort_indices(&keys, descending);
        let mut values = Vec::with_capacity(data.values.len());
        for r in 0..data.rows {
            for &c in &order {
                values.push(data.get(r, c).clone());
            }
        }
        return result_of(Matrix::new(data.rows, data.cols, values));
    }

    if sort_index < 1 || sort_index as usize > data.cols {
        return Err(ErrorKind::Value);
    }
    let keys = data.column(sort_index as usize - 1);
    let order = sort_indices(&keys, descending);
    let mut values = Vec::with_capacity(data.values.len());
    for &r in &order {
        values.extend(data.row(r));
    }
    result_of(Matrix::new(data.rows, data.cols, values))
}

/// SORTBY(data, by1, [order1], by2, [order2], ...)
fn sortby(args: &[Expr], ctx: &mut Evaluator) -> R {
    let data = ctx.matrix(args, 0)?;
    let mut keys: Vec<(Vec<CellValue>, bool)> = Vec::new();
    let mut i = 1;
    while i < args.len() {
        let by = ctx.matrix(args, i)?;
        if by.values.len() != data.rows {
            return Err(ErrorKind::Value);
        }
        let descending = if i + 1 < args.len() {
            match args.get(i + 1) {
                Some(Expr::Empty) | None => false,
                _ => ctx.num(args, i + 1)? < 0.0,
            }
        } else {
            false
        };
        keys.push((by.values, descending));
        i += 2;
    }

    let mut indices: Vec<usize> = (0..data.rows).collect();
    indices.sort_by(|&a, &b| {
        for (key, descending) in &keys {
            let ord = compare(&key[a], &key[b]);
            let ord = if *descending { ord.reverse() } else { ord };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    });

    let mut values = Vec::with_capacity(data.values.len());
    for &r in &indices {
        values.extend(data.row(r));
    }
    result_of(Matrix::new(data.rows, data.cols, values))
}

fn unique(args: &[Expr], ctx: &mut Evaluator) -> R {
    let data = ctx.matrix(args, 0)?;
    let by_col = ctx.bool_or(args, 1, false)?;
    let exactly_once = ctx.bool_or(args, 2, false)?;

    let units: Vec<Vec<CellValue>> = if by_col {
        (0..data.cols).map(|c| data.column(c)).collect()
    } else {
        (0..data.rows).map(|r| data.row(r)).collect()
    };

    let equal = |a: &[CellValue], b: &[CellValue]| {
        a.len() == b.len()
            && a.iter()
                .zip(b)
                .all(|(x, y)| compare(x, y) == Ordering::Equal)
    };

    let mut kept: Vec<Vec<CellValue>> = Vec::new();
    for unit in &units {
        let count = units.iter().filter(|u| equal(u, unit)).count();
        let already = kept.iter().any(|u| equal(u, unit));
        if already {
            continue;
        }
        if exactly_once && count > 1 {
            continue;
        }
        kept.push(unit.clone());
    }
    if kept.is_empty() {
        return Err(ErrorKind::Calc);
    }

    if by_col {
        let cols = kept.len();
        let rows = data.rows;
        let mut values = Vec::with_capacity(rows * cols);
        for r in 0..rows {
            for unit in &kept {
                values.push(unit[r].clone());
            }
        }
        result_of(Matrix::new(rows, cols, values))
    } else {
        let rows = kept.len();
        let cols = data.cols;
        let values = kept.into_iter().flatten().collect();
        result_of(Matrix::new(rows, cols, values))
    }
}

fn take(args: &[Expr], ctx: &mut Evaluator) -> R {
    let data = ctx.matrix(args, 0)?;
    let rows = if ctx.has_arg(args, 1) {
        ctx.int(args, 1)?
    } else {
        data.rows as i64
    };
    let cols = if ctx.has_arg(args, 2) {
        ctx.int(args, 2)?
    } else {
        data.cols as i64
    };
    if rows == 0 || cols == 0 {
        return Err(ErrorKind::Calc);
    }

    let row_range = select_edge(data.rows, rows);
    let col_range = select_edge(data.cols, cols);
    let mut values = Vec::new();
    for r in row_range.clone() {
        for c in col_range.clone() {
            values.push(data.get(r, c).clone());
        }
    }
    result_of(Matrix::new(row_range.len(), col_range.len(), values))
}

fn drop(args: &[Expr], ctx: &mut Evaluator) -> R {
    let data = ctx.matrix(args, 0)?;
    let rows = if ctx.has_arg(args, 1) {
        ctx.int(args, 1)?
    } else {
        0
    };
    let cols = if ctx.has_arg(args, 2) {
        ctx.int(args, 2)?
    } else {
        0
    };

    let row_range = drop_edge(data.rows, rows).ok_or(ErrorKind::Calc)?;
    let col_range = drop_edge(data.cols, cols).ok_or(ErrorKind::Calc)?;
    let mut values = Vec::new();
    for r in row_range.clone() {
        for c in col_range.clone() {
            values.push(data.get(r, c).clone());
        }
    }
    result_of(Matrix::new(row_range.len(), col_range.len(), values))
}

/// First or last `n` indices of an axis of length `len` (negative takes
/// from the end).
fn select_edge(len: usize, n: i64) -> std::ops::Range<usize> {
    let take = (n.unsigned_abs() as usize).min(len);
    if n >= 0 {
        0..take
    } else {
        len - take..len
    }
}

/// Remaining indices after dropping `n` from the front (or back when
/// negative); `None` when nothing is left.
fn drop_edge(len: usize, n: i64) -> Option<std::ops::Range<usize>> {
    let dropped = (n.unsigned_abs() as usize).min(len);
    let range = if n >= 0 { dropped..len } else { 0..len - dropped };
    if range.is_empty() {
        None
    } else {
        Some(range)
    }
}

fn vstack(args: &[Expr], ctx: &mut Evaluator) -> R {
    let blocks: Vec<Matrix> = args
        .iter()
        .map(|a| ctx.matrix_of(a))
        .collect::<Result<_, _>>()?;
    let cols = blocks.iter().map(|m| m.cols).max().unwrap_or(0);
    let rows: usize = blocks.iter().map(|m| m.rows).sum();
    let mut values = Vec::with_capacity(rows * cols);
    for block in &blocks {
        for r in 0..block.rows {
            for c in 0..cols {
                if c < block.cols {
                    values.push(block.get(r, c).clone());
                } else {
                    values.push(CellValue::Error(ErrorKind::Na));
                }
            }
        }
    }
    result_of(Matrix::new(rows, cols, values))
}

fn hstack(args: &[Expr], ctx: &mut Evaluator) -> R {
    let blocks: Vec<Matrix> = args
        .iter()
        .map(|a| ctx.matrix_of(a))
        .collect::<Result<_, _>>()?;
    let rows = blocks.iter().map(|m| m.rows).max().unwrap_or(0);
    let cols: usize = blocks.iter().map(|m| m.cols).sum();
    let mut values = Vec::with_capacity(rows * cols);
    for r in 0..rows {
        for block in &blocks {
            for c in 0..block.cols {
                if r < block.rows {
                    values.push(block.get(r, c).clone());
                } else {
                    values.push(CellValue::Error(ErrorKind::Na));
                }
            }
        }
    }
    result_of(Matrix::new(rows, cols, values))
}

fn chooserows(args: &[Expr], ctx: &mut Evaluator) -> R {
    let data = ctx.matrix(args, 0)?;
    let mut values = Vec::new();
    let mut count = 0;
    for i in 1..args.len() {
        let n = ctx.int(args, i)?;
        let idx = axis_index(data.rows, n).ok_or(ErrorKind::Value)?;
        values.extend(data.row(idx));
        count += 1;
    }
    result_of(Matrix::new(count, data.cols, values))
}

fn choosecols(args: &[Expr], ctx: &mut Evaluator) -> R {
    let data = ctx.matrix(args, 0)?;
    let mut picked: Vec<usize> = Vec::new();
    for i in 1..args.len() {
        let n = ctx.int(args, i)?;
        picked.push(axis_index(data.cols, n).ok_or(ErrorKind::Value)?);
    }
    let mut values = Vec::with_capacity(data.rows * picked.len());
    for r in 0..data.rows {
        for &c in &picked {
            values.push(data.get(r, c).clone());
        }
    }
    result_of(Matrix::new(data.rows, picked.len(), values))
}

/// 1-based index with negative-from-the-end addressing.
fn axis_index(len: usize, n: i64) -> Option<usize> {
    if n > 0 && n as usize <= len {
        Some(n as usize - 1)
    } else if n < 0 && n.unsigned_abs() as usize <= len {
        Some(len - n.unsigned_abs() as usize)
    } else {
        None
    }
}
