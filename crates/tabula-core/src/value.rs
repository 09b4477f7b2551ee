//! Cell value representation and the coercion surface.
//!
//! [`CellValue`] is the typed value of a single cell. The evaluator adds two
//! sub-variants: `Array` (a rectangular block produced by range and
//! dynamic-array operations) and `Formula` (the resolver-facing raw form of
//! a formula cell, carrying the source text and the cached result).
//! Coercions implement the spreadsheet rules the evaluator leans on
//! everywhere: failures are [`ErrorKind`] values, never panics.

use std::cmp::Ordering;
use std::fmt;

use crate::error::ErrorKind;

/// Represents the value of a cell.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    /// No value (empty cell).
    Empty,
    /// Boolean value.
    Bool(bool),
    /// Numeric value (integers are stored as f64).
    Number(f64),
    /// Date/time as an Excel serial number; the distinction from `Number`
    /// is the date-formatted style of the originating cell.
    Date(f64),
    /// String value.
    Text(String),
    /// Error value. First-class: errors flow through operators and
    /// functions rather than aborting evaluation.
    Error(ErrorKind),
    /// A rectangular block of values (row-major).
    Array(Matrix),
    /// A formula cell as seen by the resolver: source text plus the cached
    /// result from the file, if any. Never returned by public queries.
    Formula {
        text: String,
        cached: Option<Box<CellValue>>,
    },
}

/// A rectangular, row-major block of cell values.
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    pub rows: usize,
    pub cols: usize,
    pub values: Vec<CellValue>,
}

impl Matrix {
    /// Build from shape and row-major values. The value count must match.
    pub fn new(rows: usize, cols: usize, values: Vec<CellValue>) -> Self {
        debug_assert_eq!(rows * cols, values.len());
        Self { rows, cols, values }
    }

    /// A 1x1 matrix wrapping a scalar.
    pub fn scalar(v: CellValue) -> Self {
        Self {
            rows: 1,
            cols: 1,
            values: vec![v],
        }
    }

    /// Element at `(row, col)`, 0-based.
    pub fn get(&self, row: usize, col: usize) -> &CellValue {
        &self.values[row * self.cols + col]
    }

    /// Column `col` as a vector (0-based).
    pub fn column(&self, col: usize) -> Vec<CellValue> {
        (0..self.rows).map(|r| self.get(r, col).clone()).collect()
    }

    /// Row `row` as a vector (0-based).
    pub fn row(&self, row: usize) -> Vec<CellValue> {
        (0..self.cols).map(|c| self.get(row, c).clone()).collect()
    }

    /// True when the matrix is a single row or single column.
    pub fn is_vector(&self) -> bool {
        self.rows == 1 || self.cols == 1
    }
}

impl Default for CellValue {
    fn default() -> Self {
        Self::Empty
    }
}

impl CellValue {
    /// True for `Number` and `Date` variants.
    pub fn is_numeric(&self) -> bool {
        matches!(self, CellValue::Number(_) | CellValue::Date(_))
    }

    /// The error kind, if this value is an error.
    pub fn as_error(&self) -> Option<ErrorKind> {
        match self {
            CellValue::Error(k) => Some(*k),
            _ => None,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Bool(b) => write!(f, "{}", if *b { "TRUE" } else { "FALSE" }),
            CellValue::Number(n) | CellValue::Date(n) => write!(f, "{}", number_to_text(*n)),
            CellValue::Text(s) => write!(f, "{s}"),
            CellValue::Error(e) => write!(f, "{e}"),
            CellValue::Array(m) => match m.values.first() {
                Some(v) => write!(f, "{v}"),
                None => Ok(()),
            },
            CellValue::Formula { text, cached } => match cached {
                Some(v) => write!(f, "{v}"),
                None => write!(f, "={text}"),
            },
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::Text(s)
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

impl From<i32> for CellValue {
    fn from(n: i32) -> Self {
        CellValue::Number(f64::from(n))
    }
}

impl From<i64> for CellValue {
    fn from(n: i64) -> Self {
        CellValue::Number(n as f64)
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        CellValue::Bool(b)
    }
}

impl From<ErrorKind> for CellValue {
    fn from(k: ErrorKind) -> Self {
        CellValue::Error(k)
    }
}

// -------------------------------------------------------------------------
// Coercions
// -------------------------------------------------------------------------

/// Coerce to a number. `Empty` is 0, booleans widen to 1/0, text is parsed
/// as a decimal (optional sign, point, `e`/`E` exponent, surrounding
/// whitespace trimmed). Errors pass through; anything else is `#VALUE!`.
pub fn to_number(value: &CellValue) -> Result<f64, ErrorKind> {
    match value {
        CellValue::Number(n) | CellValue::Date(n) => Ok(*n),
        CellValue::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
        CellValue::Empty => Ok(0.0),
        CellValue::Text(s) => parse_number_text(s).ok_or(ErrorKind::Value),
        CellValue::Error(e) => Err(*e),
        CellValue::Array(_) => Err(ErrorKind::Value),
        CellValue::Formula { cached, .. } => match cached {
            Some(inner) => to_number(inner),
            None => Ok(0.0),
        },
    }
}

/// Strict decimal parse: sign, digits, optional point, optional exponent.
/// Rejects the `inf`/`NaN` spellings `f64::from_str` would accept.
pub fn parse_number_text(s: &str) -> Option<f64> {
    let t = s.trim();
    if t.is_empty() {
        return None;
    }
    let ok = t
        .bytes()
        .all(|b| b.is_ascii_digit() || matches!(b, b'+' | b'-' | b'.' | b'e' | b'E'));
    if !ok {
        return None;
    }
    t.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Coerce to display text. Numbers use shortest round-trip decimal with
/// trailing zeros trimmed, and are never rendered in scientific notation
/// for magnitudes in `1e-4 ≤ |x| < 1e15`.
pub fn to_text(value: &CellValue) -> String {
    match value {
        CellValue::Text(s) => s.clone(),
        CellValue::Number(n) | CellValue::Date(n) => number_to_text(*n),
        CellValue::Bool(b) => if *b { "TRUE" } else { "FALSE" }.to_string(),
        CellValue::Empty => String::new(),
        CellValue::Error(e) => e.to_string(),
        CellValue::Array(m) => m.values.first().map(to_text).unwrap_or_default(),
        CellValue::Formula { cached, .. } => {
            cached.as_deref().map(to_text).unwrap_or_default()
        }
    }
}

/// Render a number the way `to_text` does.
pub fn number_to_text(n: f64) -> String {
    if n == 0.0 {
        return "0".to_string();
    }
    // Rust's Display for f64 is already the shortest decimal that
    // round-trips, with no exponent form.
    format!("{n}")
}

/// Coerce to a boolean. Numbers: nonzero is true. Text `"TRUE"`/`"FALSE"`
/// case-insensitively; other text is `#VALUE!`. Empty is false.
pub fn to_bool(value: &CellValue) -> Result<bool, ErrorKind> {
    match value {
        CellValue::Bool(b) => Ok(*b),
        CellValue::Number(n) | CellValue::Date(n) => Ok(*n != 0.0),
        CellValue::Empty => Ok(false),
        CellValue::Text(s) => {
            if s.eq_ignore_ascii_case("TRUE") {
                Ok(true)
            } else if s.eq_ignore_ascii_case("FALSE") {
                Ok(false)
            } else {
                Err(ErrorKind::Value)
            }
        }
        CellValue::Error(e) => Err(*e),
        CellValue::Array(_) => Err(ErrorKind::Value),
        CellValue::Formula { cached, .. } => match cached {
            Some(inner) => to_bool(inner),
            None => Ok(false),
        },
    }
}

/// Equality per the spreadsheet rules: text compares case-insensitively,
/// numbers with exact IEEE equality after boolean-to-number widening, and
/// differing primitive kinds are simply unequal (text never equals number).
pub fn loose_eq(a: &CellValue, b: &CellValue) -> bool {
    compare(a, b) == Ordering::Equal
}

/// Ordering for the comparison operators. Numbers, dates, and booleans
/// compare numerically among themselves; text compares with ASCII case
/// folding; across kinds the rank order is empty < number < text < bool.
pub fn compare(a: &CellValue, b: &CellValue) -> Ordering {
    fn rank(v: &CellValue) -> u8 {
        match v {
            CellValue::Empty => 0,
            CellValue::Number(_) | CellValue::Date(_) | CellValue::Bool(_) => 1,
            CellValue::Text(_) => 2,
            CellValue::Error(_) => 3,
            CellValue::Array(_) | CellValue::Formula { .. } => 4,
        }
    }

    // Empty compares equal to the other side's zero value.
    match (a, b) {
        (CellValue::Empty, CellValue::Text(s)) | (CellValue::Text(s), CellValue::Empty) => {
            return if s.is_empty() {
                Ordering::Equal
            } else if matches!(a, CellValue::Empty) {
                Ordering::Less
            } else {
                Ordering::Greater
            };
        }
        _ => {}
    }

    let (ra, rb) = (rank(a), rank(b));
    if ra == 1 && rb == 1 {
        let na = to_number(a).unwrap_or(0.0);
        let nb = to_number(b).unwrap_or(0.0);
        return na.partial_cmp(&nb).unwrap_or(Ordering::Equal);
    }
    if ra != rb {
        // Empty vs numeric: empty counts as zero.
        if ra == 0 && rb == 1 {
            return 0.0
                .partial_cmp(&to_number(b).unwrap_or(0.0))
                .unwrap_or(Ordering::Equal);
        }
        if ra == 1 && rb == 0 {
            return to_number(a)
                .unwrap_or(0.0)
                .partial_cmp(&0.0)
                .unwrap_or(Ordering::Equal);
        }
        return ra.cmp(&rb);
    }
    match (a, b) {
        (CellValue::Text(x), CellValue::Text(y)) => {
            let fx = x.to_ascii_lowercase();
            let fy = y.to_ascii_lowercase();
            fx.cmp(&fy)
        }
        _ => Ordering::Equal,
    }
}
