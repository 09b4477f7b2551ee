//! Built-in function registry.
//!
//! Each function is a data row: name, arity bounds, behaviour flags, and a
//! body. Bodies receive the unevaluated argument expressions and the
//! evaluator, which lets short-circuiting functions skip branches and
//! range-shaped functions see reference shapes instead of value arrays.
//! The stub subset is registered uniformly and returns `#CALC!`; stub
//! formulas round-trip with their original text untouched.

pub mod array;
pub mod database;
pub mod date_time;
pub mod engineering;
pub mod financial;
pub mod information;
pub mod logical;
pub mod lookup;
pub mod math;
pub mod statistical;
pub mod text;

use std::collections::HashMap;
use std::sync::OnceLock;

use crate::error::ErrorKind;
use crate::formula::ast::Expr;
use crate::formula::criteria::Criterion;
use crate::formula::eval::Evaluator;
use crate::value::{CellValue, Matrix};

/// Signature for a built-in function body. An `Err` becomes an error cell
/// value at the dispatch boundary; bodies use `?` freely.
pub type FunctionFn = fn(&[Expr], &mut Evaluator) -> Result<CellValue, ErrorKind>;

/// Behaviour flags carried by a registry row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FnFlags {
    /// Re-evaluates on every pass (`NOW`, `RAND`, ...); sets the context's
    /// volatility flag when dispatched.
    pub volatile: bool,
    /// Receives reference arguments as shapes, not value arrays
    /// (`ROW(A1:B3)` sees 3x2).
    pub takes_range_ref: bool,
    /// Evaluates only the branches it selects (`IF`, `AND`, `IFERROR`...).
    pub short_circuits: bool,
    /// Recognised but unimplemented; returns `#CALC!`.
    pub stub: bool,
}

pub const NONE: FnFlags = FnFlags {
    volatile: false,
    takes_range_ref: false,
    short_circuits: false,
    stub: false,
};

pub const VOLATILE: FnFlags = FnFlags {
    volatile: true,
    takes_range_ref: false,
    short_circuits: false,
    stub: false,
};

pub const RANGE_REF: FnFlags = FnFlags {
    volatile: false,
    takes_range_ref: true,
    short_circuits: false,
    stub: false,
};

pub const SHORT_CIRCUIT: FnFlags = FnFlags {
    volatile: false,
    takes_range_ref: false,
    short_circuits: true,
    stub: false,
};

pub const STUB: FnFlags = FnFlags {
    volatile: false,
    takes_range_ref: false,
    short_circuits: false,
    stub: true,
};

/// Variadic upper bound.
pub const MANY: usize = 255;

/// One registry row.
pub struct FunctionDef {
    pub name: &'static str,
    pub min_args: usize,
    pub max_args: usize,
    pub flags: FnFlags,
    pub body: FunctionFn,
}

/// Compact row constructor used by the category tables.
pub const fn def(
    name: &'static str,
    min_args: usize,
    max_args: usize,
    flags: FnFlags,
    body: FunctionFn,
) -> FunctionDef {
    FunctionDef {
        name,
        min_args,
        max_args,
        flags,
        body,
    }
}

/// The recognised-but-unimplemented set. These return `#CALC!` and their
/// formula text is preserved verbatim on round-trip.
const STUB_NAMES: &[&str] = &[
    "DSTDEV",
    "DVAR",
    "ACOSH",
    "COSH",
    "SINH",
    "TANH",
    "PRODUCT",
    "COMBINA",
    "PERMUTATIONA",
    "DATEVALUE",
    "DAYS360",
    "PRICEMAT",
    "YIELDMAT",
    "ACCRINTM",
    "DURATION",
    "MDURATION",
    "COUPDAYBS",
    "COUPDAYS",
    "COUPDAYSNC",
    "COUPNCD",
    "COUPPCD",
    "COUPNUM",
    "LAMBDA",
    "LET",
    "MAP",
    "REDUCE",
    "SCAN",
    "BYROW",
    "BYCOL",
    "MAKEARRAY",
    "FILTERXML",
    "WEBSERVICE",
    "RTD",
    "CUBEVALUE",
    "CUBEMEMBER",
    "CUBEMEMBERPROPERTY",
    "BAHTTEXT",
    "ISFORMULA",
    "FORMULATEXT",
];

fn fn_stub(_args: &[Expr], _ctx: &mut Evaluator) -> Result<CellValue, ErrorKind> {
    Ok(CellValue::Error(ErrorKind::Calc))
}

static STUB_DEFS: OnceLock<Vec<FunctionDef>> = OnceLock::new();
static REGISTRY: OnceLock<HashMap<&'static str, &'static FunctionDef>> = OnceLock::new();

/// Resolve a function name (already uppercased) to its registry row.
pub fn lookup(name: &str) -> Option<&'static FunctionDef> {
    let registry = REGISTRY.get_or_init(|| {
        let stubs = STUB_DEFS.get_or_init(|| {
            STUB_NAMES
                .iter()
                .map(|&name| def(name, 0, MANY, STUB, fn_stub))
                .collect()
        });
        let tables: [&[FunctionDef]; 12] = [
            math::DEFS,
            statistical::DEFS,
            text::DEFS,
            date_time::DEFS,
            financial::DEFS,
            logical::DEFS,
            lookup::DEFS,
            array::DEFS,
            engineering::DEFS,
            database::DEFS,
            information::DEFS,
            stubs.as_slice(),
        ];
        let mut map = HashMap::new();
        for table in tables {
            for row in table {
                map.insert(row.name, row);
            }
        }
        map
    });
    registry.get(name).copied()
}

// -------------------------------------------------------------------------
// Shared machinery for the criteria aggregates
// -------------------------------------------------------------------------

/// Evaluate `(range, criterion)` pairs starting at `args[start]` into a
/// combined boolean mask. All criteria ranges must share one shape.
pub(crate) fn ifs_mask(
    ctx: &mut Evaluator,
    args: &[Expr],
    start: usize,
) -> Result<(Matrix, Vec<bool>), ErrorKind> {
    if (args.len() - start) % 2 != 0 || args.len() <= start {
        return Err(ErrorKind::Value);
    }
    let first = ctx.matrix(args, start)?;
    let len = first.values.len();
    let mut mask = vec![true; len];

    let mut i = start;
    let mut current = first.clone();
    loop {
        let crit_value = ctx.arg(args, i + 1);
        if let CellValue::Error(e) = crit_value {
            return Err(e);
        }
        let criterion = Criterion::parse(&crit_value);
        if current.rows != first.rows || current.cols != first.cols {
            return Err(ErrorKind::Value);
        }
        for (slot, candidate) in mask.iter_mut().zip(&current.values) {
            if !criterion.matches(candidate) {
                *slot = false;
            }
        }
        i += 2;
        if i >= args.len() {
            break;
        }
        current = ctx.matrix(args, i)?;
    }
    Ok((first, mask))
}

/// Sum the masked numeric entries of `values`; the common core of
/// SUMIF/SUMIFS/AVERAGEIF-style folds.
pub(crate) fn masked_numbers(values: &Matrix, mask: &[bool]) -> Vec<f64> {
    values
        .values
        .iter()
        .zip(mask)
        .filter(|(_, keep)| **keep)
        .filter_map(|(v, _)| match v {
            CellValue::Number(n) | CellValue::Date(n) => Some(*n),
            _ => None,
        })
        .collect()
}
