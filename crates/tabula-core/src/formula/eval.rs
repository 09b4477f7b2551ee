//! Formula evaluation engine.
//!
//! Walks a parsed AST against cell data reached through the
//! [`CellResolver`] callback. Evaluation never fails fast: every failure is
//! an error cell value that flows through operators and functions, with the
//! leftmost error in source order winning. The context carries an injected
//! clock and random source so volatile functions are testable, a recursion
//! depth bound, and the in-progress set that turns cyclic references into
//! `#REF!`.

use std::collections::{HashMap, HashSet};

use crate::error::ErrorKind;
use crate::formula::ast::{BinaryOp, Expr, RefExpr, UnaryOp};
use crate::formula::functions;
use crate::formula::parser::parse_formula;
use crate::reference::Range;
use crate::utils::constants::DEFAULT_EVAL_DEPTH;
use crate::value::{compare, to_bool, to_number, to_text, CellValue, Matrix};

/// Provides cell data for formula evaluation.
///
/// `cell` returns the raw value at 1-based `(col, row)`; formula cells come
/// back as [`CellValue::Formula`] and the evaluator chases them itself.
pub trait CellResolver {
    /// The cell value at the given coordinates on `sheet`.
    fn cell(&self, sheet: &str, col: u32, row: u32) -> CellValue;

    /// The sheet that owns the formula being evaluated.
    fn current_sheet(&self) -> &str;

    /// Resolve a defined name to a reference.
    fn named_range(&self, _name: &str) -> Option<RefExpr> {
        None
    }

    /// Number of sheets in the workbook (for `SHEETS`).
    fn sheet_count(&self) -> u32 {
        1
    }

    /// 1-based position of a sheet by name (for `SHEET`).
    fn sheet_position(&self, _name: &str) -> Option<u32> {
        None
    }
}

/// Wall-clock injected into the context; `NOW`/`TODAY` read it.
pub trait Clock {
    /// Current local time as an Excel serial.
    fn now_serial(&self) -> f64;
}

/// The host system clock.
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_serial(&self) -> f64 {
        use chrono::Timelike;
        let now = chrono::Local::now().naive_local();
        let days = crate::datetime::date_to_serial(now.date()).unwrap_or(0.0);
        let secs = f64::from(now.time().num_seconds_from_midnight());
        days + secs / 86_400.0
    }
}

/// A pinned clock for tests.
pub struct FixedClock(pub f64);

impl Clock for FixedClock {
    fn now_serial(&self) -> f64 {
        self.0
    }
}

/// Random source injected into the context; `RAND`/`RANDBETWEEN`/
/// `RANDARRAY` draw from it.
pub trait RandomSource {
    /// Uniform draw in `[0, 1)`.
    fn next_f64(&mut self) -> f64;
}

/// The default thread-local RNG.
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn next_f64(&mut self) -> f64 {
        rand::Rng::gen(&mut rand::thread_rng())
    }
}

/// A deterministic source for tests: cycles through the given values.
pub struct FixedRandom {
    values: Vec<f64>,
    index: usize,
}

impl FixedRandom {
    pub fn new(values: Vec<f64>) -> Self {
        Self { values, index: 0 }
    }
}

impl RandomSource for FixedRandom {
    fn next_f64(&mut self) -> f64 {
        let v = self.values[self.index % self.values.len()];
        self.index += 1;
        v
    }
}

/// Evaluate a parsed expression with default context settings.
pub fn evaluate(expr: &Expr, resolver: &dyn CellResolver) -> CellValue {
    Evaluator::new(resolver).eval(expr)
}

/// Stateful evaluator for one evaluation pass.
pub struct Evaluator<'a> {
    resolver: &'a dyn CellResolver,
    clock: Box<dyn Clock + 'a>,
    rng: Box<dyn RandomSource + 'a>,
    max_depth: usize,
    depth: usize,
    volatile: bool,
    in_progress: HashSet<(String, u32, u32)>,
    memo: HashMap<(String, u32, u32), CellValue>,
}

impl<'a> Evaluator<'a> {
    /// New evaluator with the system clock, thread RNG, and the default
    /// depth bound.
    pub fn new(resolver: &'a dyn CellResolver) -> Self {
        Self {
            resolver,
            clock: Box::new(SystemClock),
            rng: Box::new(ThreadRandom),
            max_depth: DEFAULT_EVAL_DEPTH,
            depth: 0,
            volatile: false,
            in_progress: HashSet::new(),
            memo: HashMap::new(),
        }
    }

    /// Replace the clock.
    pub fn with_clock(mut self, clock: impl Clock + 'a) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Replace the random source.
    pub fn with_rng(mut self, rng: impl RandomSource + 'a) -> Self {
        self.rng = Box::new(rng);
        self
    }

    /// Override the recursion depth bound.
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// Whether any volatile function ran during this pass.
    pub fn is_volatile(&self) -> bool {
        self.volatile
    }

    /// Record that a volatile function was invoked.
    pub fn mark_volatile(&mut self) {
        self.volatile = true;
    }

    /// Current time from the injected clock.
    pub fn now_serial(&self) -> f64 {
        self.clock.now_serial()
    }

    /// Uniform draw from the injected random source.
    pub fn random(&mut self) -> f64 {
        self.rng.next_f64()
    }

    /// The sheet owning the evaluated formula.
    pub fn current_sheet(&self) -> &str {
        self.resolver.current_sheet()
    }

    /// Sheet count, for `SHEETS`.
    pub fn sheet_count(&self) -> u32 {
        self.resolver.sheet_count()
    }

    /// Sheet position by name, for `SHEET`.
    pub fn sheet_position(&self, name: &str) -> Option<u32> {
        self.resolver.sheet_position(name)
    }

    // ---------------------------------------------------------------------
    // Core walk
    // ---------------------------------------------------------------------

    /// Evaluate one AST node to a value. Errors come back as values.
    pub fn eval(&mut self, expr: &Expr) -> CellValue {
        if self.depth >= self.max_depth {
            return CellValue::Error(ErrorKind::Num);
        }
        self.depth += 1;
        let result = self.eval_inner(expr);
        self.depth -= 1;
        result
    }

    fn eval_inner(&mut self, expr: &Expr) -> CellValue {
        match expr {
            Expr::Number(n) => CellValue::Number(*n),
            Expr::Text(s) => CellValue::Text(s.clone()),
            Expr::Bool(b) => CellValue::Bool(*b),
            Expr::Error(e) => CellValue::Error(*e),
            Expr::Empty => CellValue::Empty,
            Expr::Paren(inner) => self.eval(inner),
            Expr::Reference(r) => self.eval_reference(r),
            Expr::Name(name) => match self.resolver.named_range(name) {
                Some(r) => self.eval_reference(&r),
                None => CellValue::Error(ErrorKind::Name),
            },
            Expr::Array(rows) => self.eval_array(rows),
            Expr::Union(_) => CellValue::Error(ErrorKind::Value),
            Expr::Intersection(a, b) => match intersect(a, b) {
                Some(r) => self.eval_reference(&r),
                None => CellValue::Error(ErrorKind::Null),
            },
            Expr::Binary { op, lhs, rhs } => {
                let left = self.eval(lhs);
                let right = self.eval(rhs);
                broadcast2(&left, &right, |a, b| scalar_binary(*op, a, b))
            }
            Expr::Unary { op, operand } => {
                let value = self.eval(operand);
                broadcast1(&value, |v| scalar_unary(*op, v))
            }
            Expr::Call { name, args } => self.eval_call(name, args),
        }
    }

    fn eval_array(&mut self, rows: &[Vec<Expr>]) -> CellValue {
        let height = rows.len();
        let width = rows.first().map(Vec::len).unwrap_or(0);
        let mut values = Vec::with_capacity(height * width);
        for row in rows {
            for cell in row {
                values.push(self.eval(cell));
            }
        }
        CellValue::Array(Matrix::new(height, width, values))
    }

    fn eval_reference(&mut self, r: &RefExpr) -> CellValue {
        let sheet = r
            .sheet
            .clone()
            .unwrap_or_else(|| self.resolver.current_sheet().to_string());
        if r.is_single() {
            return self.resolve_cell(&sheet, r.range.start.col, r.range.start.row);
        }
        CellValue::Array(self.load_range(&sheet, r.range))
    }

    /// Materialise a rectangular view of a range, resolving formula cells.
    pub fn load_range(&mut self, sheet: &str, range: Range) -> Matrix {
        let rows = range.rows() as usize;
        let cols = range.cols() as usize;
        let mut values = Vec::with_capacity(rows * cols);
        for row in range.start.row..=range.end.row {
            for col in range.start.col..=range.end.col {
                values.push(self.resolve_cell(sheet, col, row));
            }
        }
        Matrix::new(rows, cols, values)
    }

    /// Resolve a single cell, chasing formula cells with cycle detection
    /// and per-pass memoisation. Re-entry on an in-progress cell is a
    /// cyclic reference and yields `#REF!`.
    pub fn resolve_cell(&mut self, sheet: &str, col: u32, row: u32) -> CellValue {
        let key = (sheet.to_string(), col, row);
        if let Some(cached) = self.memo.get(&key) {
            return cached.clone();
        }
        if self.in_progress.contains(&key) {
            return CellValue::Error(ErrorKind::Ref);
        }

        let raw = self.resolver.cell(sheet, col, row);
        let result = match raw {
            CellValue::Formula { ref text, ref cached } => {
                self.in_progress.insert(key.clone());
                let value = match parse_formula(text) {
                    Ok(expr) => {
                        // Evaluate on the referenced cell's own sheet.
                        if sheet == self.resolver.current_sheet() {
                            self.eval(&expr)
                        } else {
                            self.eval_on_sheet(&expr, sheet)
                        }
                    }
                    Err(_) => cached
                        .as_deref()
                        .cloned()
                        .unwrap_or(CellValue::Error(ErrorKind::Name)),
                };
                self.in_progress.remove(&key);
                value
            }
            other => other,
        };
        self.memo.insert(key, result.clone());
        result
    }

    fn eval_on_sheet(&mut self, expr: &Expr, sheet: &str) -> CellValue {
        // Unqualified references inside the chased formula are relative to
        // the sheet that owns it, so rewrite the context via a shim.
        let shim = SheetShim {
            inner: self.resolver,
            sheet: sheet.to_string(),
        };
        let mut nested = Evaluator {
            resolver: &shim,
            clock: Box::new(FixedClock(self.clock.now_serial())),
            rng: Box::new(FixedRandom::new(vec![self.rng.next_f64()])),
            max_depth: self.max_depth,
            depth: self.depth,
            volatile: false,
            in_progress: std::mem::take(&mut self.in_progress),
            memo: std::mem::take(&mut self.memo),
        };
        let value = nested.eval(expr);
        self.in_progress = std::mem::take(&mut nested.in_progress);
        self.memo = std::mem::take(&mut nested.memo);
        if nested.volatile {
            self.volatile = true;
        }
        value
    }

    fn eval_call(&mut self, name: &str, args: &[Expr]) -> CellValue {
        let upper = name.to_ascii_uppercase();
        let lookup_name = upper.strip_prefix("_XLFN.").unwrap_or(&upper);
        let Some(def) = functions::lookup(lookup_name) else {
            return CellValue::Error(ErrorKind::Name);
        };
        if args.len() < def.min_args || args.len() > def.max_args {
            return CellValue::Error(ErrorKind::Value);
        }
        if def.flags.volatile {
            self.volatile = true;
        }
        match (def.body)(args, self) {
            Ok(value) => value,
            Err(kind) => CellValue::Error(kind),
        }
    }

    // ---------------------------------------------------------------------
    // Argument helpers for function bodies
    // ---------------------------------------------------------------------

    /// Evaluate argument `i`, `Empty` when absent.
    pub fn arg(&mut self, args: &[Expr], i: usize) -> CellValue {
        match args.get(i) {
            Some(expr) => self.eval(expr),
            None => CellValue::Empty,
        }
    }

    /// True when argument `i` is present and not an omitted slot.
    pub fn has_arg(&self, args: &[Expr], i: usize) -> bool {
        matches!(args.get(i), Some(e) if !matches!(e, Expr::Empty))
    }

    /// Numeric argument.
    pub fn num(&mut self, args: &[Expr], i: usize) -> Result<f64, ErrorKind> {
        to_number(&self.arg(args, i))
    }

    /// Numeric argument with a default for an absent/omitted slot.
    pub fn num_or(&mut self, args: &[Expr], i: usize, default: f64) -> Result<f64, ErrorKind> {
        if self.has_arg(args, i) {
            self.num(args, i)
        } else {
            Ok(default)
        }
    }

    /// Integer-domain argument: truncated toward zero, `#NUM!` past 2^48.
    pub fn int(&mut self, args: &[Expr], i: usize) -> Result<i64, ErrorKind> {
        let n = self.num(args, i)?.trunc();
        if n.abs() > crate::utils::constants::INTEGER_DOMAIN_LIMIT {
            return Err(ErrorKind::Num);
        }
        Ok(n as i64)
    }

    /// Text argument.
    pub fn text(&mut self, args: &[Expr], i: usize) -> Result<String, ErrorKind> {
        let v = self.arg(args, i);
        if let CellValue::Error(e) = v {
            return Err(e);
        }
        Ok(to_text(&v))
    }

    /// Boolean argument.
    pub fn bool(&mut self, args: &[Expr], i: usize) -> Result<bool, ErrorKind> {
        to_bool(&self.arg(args, i))
    }

    /// Boolean argument with a default for an absent/omitted slot.
    pub fn bool_or(&mut self, args: &[Expr], i: usize, default: bool) -> Result<bool, ErrorKind> {
        if self.has_arg(args, i) {
            self.bool(args, i)
        } else {
            Ok(default)
        }
    }

    /// Argument `i` as a rectangular view: ranges load their cells, array
    /// literals evaluate, scalars become 1x1.
    pub fn matrix(&mut self, args: &[Expr], i: usize) -> Result<Matrix, ErrorKind> {
        let Some(expr) = args.get(i) else {
            return Ok(Matrix::scalar(CellValue::Empty));
        };
        self.matrix_of(expr)
    }

    /// Rectangular view of one expression.
    pub fn matrix_of(&mut self, expr: &Expr) -> Result<Matrix, ErrorKind> {
        match expr {
            Expr::Reference(r) => {
                let sheet = r
                    .sheet
                    .clone()
                    .unwrap_or_else(|| self.resolver.current_sheet().to_string());
                Ok(self.load_range(&sheet, r.range))
            }
            Expr::Paren(inner) => self.matrix_of(inner),
            Expr::Name(name) => match self.resolver.named_range(name) {
                Some(r) => {
                    let sheet = r
                        .sheet
                        .clone()
                        .unwrap_or_else(|| self.resolver.current_sheet().to_string());
                    Ok(self.load_range(&sheet, r.range))
                }
                None => Err(ErrorKind::Name),
            },
            other => match self.eval(other) {
                CellValue::Array(m) => Ok(m),
                CellValue::Error(e) => Err(e),
                scalar => Ok(Matrix::scalar(scalar)),
            },
        }
    }

    /// The shape of a reference argument without loading values; for
    /// `ROW`/`COLUMN`/`ROWS`/`COLUMNS`/`OFFSET`.
    pub fn reference_of(&mut self, expr: &Expr) -> Option<RefExpr> {
        match expr {
            Expr::Reference(r) => Some(r.clone()),
            Expr::Paren(inner) => self.reference_of(inner),
            Expr::Name(name) => self.resolver.named_range(name),
            _ => None,
        }
    }

    /// Flatten arguments into values: references and arrays expand in
    /// row-major order, scalars pass through. Error values stay values.
    pub fn flat_values(&mut self, args: &[Expr]) -> Vec<CellValue> {
        let mut out = Vec::new();
        for expr in args {
            match self.matrix_of(expr) {
                Ok(m) => out.extend(m.values),
                Err(e) => out.push(CellValue::Error(e)),
            }
        }
        out
    }

    /// Gather numbers the way the aggregate functions do: scalar arguments
    /// coerce (and fail on non-numeric text), while inside ranges and
    /// arrays only genuine numbers count and text/logicals/empties are
    /// skipped. Any error value propagates.
    pub fn numbers(&mut self, args: &[Expr]) -> Result<Vec<f64>, ErrorKind> {
        let mut out = Vec::new();
        for expr in args {
            match expr {
                Expr::Reference(_) | Expr::Name(_) | Expr::Array(_) => {
                    let m = self.matrix_of(expr)?;
                    for v in &m.values {
                        match v {
                            CellValue::Number(n) | CellValue::Date(n) => out.push(*n),
                            CellValue::Error(e) => return Err(*e),
                            _ => {}
                        }
                    }
                }
                _ => {
                    let v = self.eval(expr);
                    if matches!(v, CellValue::Empty) {
                        continue;
                    }
                    out.push(to_number(&v)?);
                }
            }
        }
        Ok(out)
    }
}

struct SheetShim<'a> {
    inner: &'a dyn CellResolver,
    sheet: String,
}

impl CellResolver for SheetShim<'_> {
    fn cell(&self, sheet: &str, col: u32, row: u32) -> CellValue {
        self.inner.cell(sheet, col, row)
    }

    fn current_sheet(&self) -> &str {
        &self.sheet
    }

    fn named_range(&self, name: &str) -> Option<RefExpr> {
        self.inner.named_range(name)
    }

    fn sheet_count(&self) -> u32 {
        self.inner.sheet_count()
    }

    fn sheet_position(&self, name: &str) -> Option<u32> {
        self.inner.sheet_position(name)
    }
}

// -------------------------------------------------------------------------
// Operator semantics
// -------------------------------------------------------------------------

/// Intersection of two reference expressions, when both sides are plain
/// references on the same sheet.
fn intersect(a: &Expr, b: &Expr) -> Option<RefExpr> {
    fn as_ref(e: &Expr) -> Option<&RefExpr> {
        match e {
            Expr::Reference(r) => Some(r),
            Expr::Paren(inner) => as_ref(inner),
            _ => None,
        }
    }
    let ra = as_ref(a)?;
    let rb = as_ref(b)?;
    if ra.sheet != rb.sheet {
        return None;
    }
    let start_col = ra.range.start.col.max(rb.range.start.col);
    let end_col = ra.range.end.col.min(rb.range.end.col);
    let start_row = ra.range.start.row.max(rb.range.start.row);
    let end_row = ra.range.end.row.min(rb.range.end.row);
    if start_col > end_col || start_row > end_row {
        return None;
    }
    let start = crate::reference::CellRef::new(start_col, start_row).ok()?;
    let end = crate::reference::CellRef::new(end_col, end_row).ok()?;
    Some(RefExpr {
        sheet: ra.sheet.clone(),
        range: Range::new(start, end),
    })
}

/// Apply a scalar operation over two operands with array broadcasting:
/// scalar-with-array applies element-wise; equal-shape arrays zip; any
/// other shape pairing is `#VALUE!`.
pub fn broadcast2(
    a: &CellValue,
    b: &CellValue,
    f: impl Fn(&CellValue, &CellValue) -> CellValue,
) -> CellValue {
    match (a, b) {
        (CellValue::Array(ma), CellValue::Array(mb)) => {
            if ma.rows != mb.rows || ma.cols != mb.cols {
                return CellValue::Error(ErrorKind::Value);
            }
            let values = ma
                .values
                .iter()
                .zip(&mb.values)
                .map(|(x, y)| f(x, y))
                .collect();
            CellValue::Array(Matrix::new(ma.rows, ma.cols, values))
        }
        (CellValue::Array(m), scalar) => {
            let values = m.values.iter().map(|x| f(x, scalar)).collect();
            CellValue::Array(Matrix::new(m.rows, m.cols, values))
        }
        (scalar, CellValue::Array(m)) => {
            let values = m.values.iter().map(|y| f(scalar, y)).collect();
            CellValue::Array(Matrix::new(m.rows, m.cols, values))
        }
        (x, y) => f(x, y),
    }
}

/// Apply a scalar operation over one operand, mapping arrays element-wise.
pub fn broadcast1(v: &CellValue, f: impl Fn(&CellValue) -> CellValue) -> CellValue {
    match v {
        CellValue::Array(m) => {
            let values = m.values.iter().map(&f).collect();
            CellValue::Array(Matrix::new(m.rows, m.cols, values))
        }
        scalar => f(scalar),
    }
}

fn scalar_binary(op: BinaryOp, lhs: &CellValue, rhs: &CellValue) -> CellValue {
    // Leftmost error in source order wins; never reordered.
    if let CellValue::Error(e) = lhs {
        return CellValue::Error(*e);
    }
    if let CellValue::Error(e) = rhs {
        return CellValue::Error(*e);
    }

    match op {
        BinaryOp::Concat => CellValue::Text(format!("{}{}", to_text(lhs), to_text(rhs))),
        BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Pow => {
            let a = match to_number(lhs) {
                Ok(n) => n,
                Err(e) => return CellValue::Error(e),
            };
            let b = match to_number(rhs) {
                Ok(n) => n,
                Err(e) => return CellValue::Error(e),
            };
            let result = match op {
                BinaryOp::Add => a + b,
                BinaryOp::Sub => a - b,
                BinaryOp::Mul => a * b,
                BinaryOp::Div => {
                    if b == 0.0 {
                        return CellValue::Error(ErrorKind::Div0);
                    }
                    a / b
                }
                BinaryOp::Pow => {
                    if a == 0.0 && b == 0.0 {
                        return CellValue::Number(1.0);
                    }
                    a.powf(b)
                }
                _ => unreachable!(),
            };
            if result.is_nan() || result.is_infinite() {
                CellValue::Error(ErrorKind::Num)
            } else {
                CellValue::Number(result)
            }
        }
        BinaryOp::Eq | BinaryOp::Ne | BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
            let ord = compare(lhs, rhs);
            let result = match op {
                BinaryOp::Eq => ord == std::cmp::Ordering::Equal,
                BinaryOp::Ne => ord != std::cmp::Ordering::Equal,
                BinaryOp::Lt => ord == std::cmp::Ordering::Less,
                BinaryOp::Le => ord != std::cmp::Ordering::Greater,
                BinaryOp::Gt => ord == std::cmp::Ordering::Greater,
                BinaryOp::Ge => ord != std::cmp::Ordering::Less,
                _ => unreachable!(),
            };
            CellValue::Bool(result)
        }
    }
}

fn scalar_unary(op: UnaryOp, v: &CellValue) -> CellValue {
    if let CellValue::Error(e) = v {
        return CellValue::Error(*e);
    }
    let n = match to_number(v) {
        Ok(n) => n,
        Err(e) => return CellValue::Error(e),
    };
    match op {
        UnaryOp::Neg => CellValue::Number(-n),
        UnaryOp::Pos => CellValue::Number(n),
        UnaryOp::Percent => CellValue::Number(n / 100.0),
    }
}

// -------------------------------------------------------------------------
// In-memory resolver
// -------------------------------------------------------------------------

/// In-memory cell store, decoupled from any workbook borrow. The test
/// suites lean on it heavily.
pub struct CellSnapshot {
    cells: HashMap<(String, u32, u32), CellValue>,
    names: HashMap<String, RefExpr>,
    current_sheet: String,
    sheets: Vec<String>,
}

impl CellSnapshot {
    /// New snapshot with the given current-sheet context.
    pub fn new(current_sheet: &str) -> Self {
        Self {
            cells: HashMap::new(),
            names: HashMap::new(),
            current_sheet: current_sheet.to_string(),
            sheets: vec![current_sheet.to_string()],
        }
    }

    /// Insert a cell value.
    pub fn set(&mut self, sheet: &str, col: u32, row: u32, value: CellValue) {
        if !self.sheets.iter().any(|s| s == sheet) {
            self.sheets.push(sheet.to_string());
        }
        self.cells.insert((sheet.to_string(), col, row), value);
    }

    /// Insert a cell by A1 reference on the current sheet.
    pub fn set_a1(&mut self, reference: &str, value: CellValue) {
        let r = crate::reference::CellRef::parse(reference).expect("valid reference");
        let sheet = self.current_sheet.clone();
        self.set(&sheet, r.col, r.row, value);
    }

    /// Define a named range.
    pub fn define_name(&mut self, name: &str, r: RefExpr) {
        self.names.insert(name.to_ascii_uppercase(), r);
    }
}

impl CellResolver for CellSnapshot {
    fn cell(&self, sheet: &str, col: u32, row: u32) -> CellValue {
        self.cells
            .get(&(sheet.to_string(), col, row))
            .cloned()
            .unwrap_or(CellValue::Empty)
    }

    fn current_sheet(&self) -> &str {
        &self.current_sheet
    }

    fn named_range(&self, name: &str) -> Option<RefExpr> {
        self.names.get(&name.to_ascii_uppercase()).cloned()
    }

    fn sheet_count(&self) -> u32 {
        self.sheets.len() as u32
    }

    fn sheet_position(&self, name: &str) -> Option<u32> {
        self.sheets
            .iter()
            .position(|s| s.eq_ignore_ascii_case(name))
            .map(|i| i as u32 + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval_str(snap: &CellSnapshot, formula: &str) -> CellValue {
        let expr = parse_formula(formula).unwrap();
        Evaluator::new(snap).eval(&expr)
    }

    #[test]
    fn test_literals() {
        let snap = CellSnapshot::new("Sheet1");
        assert_eq!(eval_str(&snap, "42"), CellValue::Number(42.0));
        assert_eq!(eval_str(&snap, "\"x\""), CellValue::Text("x".to_string()));
        assert_eq!(eval_str(&snap, "TRUE"), CellValue::Bool(true));
        assert_eq!(eval_str(&snap, "#N/A"), CellValue::Error(ErrorKind::Na));
    }

    #[test]
    fn test_arithmetic() {
        let snap = CellSnapshot::new("Sheet1");
        assert_eq!(eval_str(&snap, "10+5"), CellValue::Number(15.0));
        assert_eq!(eval_str(&snap, "10-3"), CellValue::Number(7.0));
        assert_eq!(eval_str(&snap, "4*3"), CellValue::Number(12.0));
        assert_eq!(eval_str(&snap, "10/4"), CellValue::Number(2.5));
        assert_eq!(eval_str(&snap, "2^10"), CellValue::Number(1024.0));
        assert_eq!(eval_str(&snap, "1+2*3"), CellValue::Number(7.0));
        assert_eq!(eval_str(&snap, "(1+2)*3"), CellValue::Number(9.0));
    }

    #[test]
    fn test_division_by_zero() {
        let snap = CellSnapshot::new("Sheet1");
        assert_eq!(eval_str(&snap, "1/0"), CellValue::Error(ErrorKind::Div0));
    }

    #[test]
    fn test_operator_zero_pow_zero_is_one() {
        let snap = CellSnapshot::new("Sheet1");
        assert_eq!(eval_str(&snap, "0^0"), CellValue::Number(1.0));
    }

    #[test]
    fn test_unary_and_percent() {
        let snap = CellSnapshot::new("Sheet1");
        assert_eq!(eval_str(&snap, "-7"), CellValue::Number(-7.0));
        assert_eq!(eval_str(&snap, "50%"), CellValue::Number(0.5));
        assert_eq!(eval_str(&snap, "-2^2"), CellValue::Number(4.0));
    }

    #[test]
    fn test_concat() {
        let snap = CellSnapshot::new("Sheet1");
        assert_eq!(
            eval_str(&snap, "\"a\"&\"b\"&1"),
            CellValue::Text("ab1".to_string())
        );
    }

    #[test]
    fn test_comparisons() {
        let snap = CellSnapshot::new("Sheet1");
        assert_eq!(eval_str(&snap, "1<2"), CellValue::Bool(true));
        assert_eq!(eval_str(&snap, "2<=2"), CellValue::Bool(true));
        assert_eq!(eval_str(&snap, "\"abc\"=\"ABC\""), CellValue::Bool(true));
        assert_eq!(eval_str(&snap, "\"1\"=1"), CellValue::Bool(false));
        assert_eq!(eval_str(&snap, "1<>2"), CellValue::Bool(true));
    }

    #[test]
    fn test_error_propagation_leftmost() {
        let snap = CellSnapshot::new("Sheet1");
        assert_eq!(
            eval_str(&snap, "#NUM!+#VALUE!"),
            CellValue::Error(ErrorKind::Num)
        );
        assert_eq!(
            eval_str(&snap, "#VALUE!+#NUM!"),
            CellValue::Error(ErrorKind::Value)
        );
        assert_eq!(
            eval_str(&snap, "1/0+5"),
            CellValue::Error(ErrorKind::Div0)
        );
    }

    #[test]
    fn test_cell_and_range_references() {
        let mut snap = CellSnapshot::new("Sheet1");
        snap.set_a1("A1", CellValue::Number(10.0));
        snap.set_a1("A2", CellValue::Number(20.0));
        assert_eq!(eval_str(&snap, "A1+A2"), CellValue::Number(30.0));
        // Empty cell coerces to zero in arithmetic.
        assert_eq!(eval_str(&snap, "A1+Z99"), CellValue::Number(10.0));
    }

    #[test]
    fn test_cross_sheet_reference() {
        let mut snap = CellSnapshot::new("Sheet1");
        snap.set("Data", 1, 1, CellValue::Number(99.0));
        assert_eq!(eval_str(&snap, "Data!A1"), CellValue::Number(99.0));
    }

    #[test]
    fn test_range_in_scalar_context_is_an_array() {
        let mut snap = CellSnapshot::new("Sheet1");
        snap.set_a1("A1", CellValue::Number(1.0));
        snap.set_a1("A2", CellValue::Number(2.0));
        let v = eval_str(&snap, "A1:A2");
        assert!(matches!(v, CellValue::Array(ref m) if m.rows == 2 && m.cols == 1));
        // A bare range fed to a scalar coercion is #VALUE!.
        assert_eq!(
            to_number(&v).unwrap_err(),
            ErrorKind::Value
        );
    }

    #[test]
    fn test_array_broadcast_scalar() {
        let snap = CellSnapshot::new("Sheet1");
        let v = eval_str(&snap, "{1,2,3}*2");
        match v {
            CellValue::Array(m) => {
                assert_eq!(
                    m.values,
                    vec![
                        CellValue::Number(2.0),
                        CellValue::Number(4.0),
                        CellValue::Number(6.0)
                    ]
                );
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_array_zip_equal_shapes() {
        let snap = CellSnapshot::new("Sheet1");
        let v = eval_str(&snap, "{1,2}+{10,20}");
        match v {
            CellValue::Array(m) => {
                assert_eq!(
                    m.values,
                    vec![CellValue::Number(11.0), CellValue::Number(22.0)]
                );
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(
            eval_str(&snap, "{1,2}+{1,2,3}"),
            CellValue::Error(ErrorKind::Value)
        );
    }

    #[test]
    fn test_intersection() {
        let mut snap = CellSnapshot::new("Sheet1");
        snap.set_a1("B2", CellValue::Number(5.0));
        assert_eq!(eval_str(&snap, "A1:B3 B2:C4"), CellValue::Number(5.0));
        assert_eq!(
            eval_str(&snap, "A1:A3 B1:B3"),
            CellValue::Error(ErrorKind::Null)
        );
    }

    #[test]
    fn test_named_range() {
        let mut snap = CellSnapshot::new("Sheet1");
        snap.set_a1("A1", CellValue::Number(7.0));
        snap.define_name(
            "Lucky",
            RefExpr {
                sheet: None,
                range: Range::parse("A1").unwrap(),
            },
        );
        assert_eq!(eval_str(&snap, "Lucky*2"), CellValue::Number(14.0));
        assert_eq!(
            eval_str(&snap, "Missing*2"),
            CellValue::Error(ErrorKind::Name)
        );
    }

    #[test]
    fn test_formula_cell_chasing() {
        let mut snap = CellSnapshot::new("Sheet1");
        snap.set_a1("A1", CellValue::Number(10.0));
        snap.set_a1(
            "B1",
            CellValue::Formula {
                text: "A1*2".to_string(),
                cached: None,
            },
        );
        assert_eq!(eval_str(&snap, "B1+1"), CellValue::Number(21.0));
    }

    #[test]
    fn test_self_cycle_yields_ref_error() {
        let mut snap = CellSnapshot::new("Sheet1");
        snap.set_a1(
            "A1",
            CellValue::Formula {
                text: "A1".to_string(),
                cached: None,
            },
        );
        assert_eq!(eval_str(&snap, "A1"), CellValue::Error(ErrorKind::Ref));
    }

    #[test]
    fn test_mutual_cycle_yields_ref_error() {
        let mut snap = CellSnapshot::new("Sheet1");
        snap.set_a1(
            "A1",
            CellValue::Formula {
                text: "B1".to_string(),
                cached: None,
            },
        );
        snap.set_a1(
            "B1",
            CellValue::Formula {
                text: "A1".to_string(),
                cached: None,
            },
        );
        assert_eq!(eval_str(&snap, "A1"), CellValue::Error(ErrorKind::Ref));
    }

    #[test]
    fn test_depth_exhaustion_is_num_error() {
        let snap = CellSnapshot::new("Sheet1");
        let mut text = String::new();
        for _ in 0..300 {
            text.push('(');
        }
        text.push('1');
        for _ in 0..300 {
            text.push(')');
        }
        assert_eq!(eval_str(&snap, &text), CellValue::Error(ErrorKind::Num));
    }

    #[test]
    fn test_unknown_function_is_name_error() {
        let snap = CellSnapshot::new("Sheet1");
        assert_eq!(
            eval_str(&snap, "NOSUCHFN(1)"),
            CellValue::Error(ErrorKind::Name)
        );
    }

    #[test]
    fn test_xlfn_prefix_stripped() {
        let snap = CellSnapshot::new("Sheet1");
        assert_eq!(eval_str(&snap, "_xlfn.XOR(TRUE)"), CellValue::Bool(true));
    }

    #[test]
    fn test_fixed_clock_and_rng() {
        let snap = CellSnapshot::new("Sheet1");
        let expr = parse_formula("NOW()").unwrap();
        let mut ev = Evaluator::new(&snap).with_clock(FixedClock(45292.5));
        assert_eq!(ev.eval(&expr), CellValue::Number(45292.5));
        assert!(ev.is_volatile());

        let expr = parse_formula("RAND()").unwrap();
        let mut ev = Evaluator::new(&snap).with_rng(FixedRandom::new(vec![0.25]));
        assert_eq!(ev.eval(&expr), CellValue::Number(0.25));
    }
}
