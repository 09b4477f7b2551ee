//! Excel limit constants.
//!
//! These constants mirror the hard limits of the OOXML `.xlsx` format.

/// Maximum number of columns (XFD = 16 384 = 2^14).
pub const MAX_COLUMNS: u32 = 16_384;

/// Maximum number of rows (1 048 576 = 2^20).
pub const MAX_ROWS: u32 = 1_048_576;

/// Maximum length (in characters) of a sheet name Excel will accept.
pub const MAX_SHEET_NAME_LENGTH: usize = 31;

/// Characters that are not allowed in sheet names.
pub const SHEET_NAME_INVALID_CHARS: &[char] = &[':', '\\', '/', '?', '*', '[', ']'];

/// Default evaluation recursion depth bound.
pub const DEFAULT_EVAL_DEPTH: usize = 256;

/// Iteration cap for Newton-Raphson financial solvers.
pub const FINANCIAL_MAX_ITERATIONS: usize = 100;

/// Convergence tolerance for Newton-Raphson financial solvers.
pub const FINANCIAL_TOLERANCE: f64 = 1e-7;

/// Integer-domain functions reject magnitudes past this bound.
pub const INTEGER_DOMAIN_LIMIT: f64 = 281_474_976_710_655.0; // 2^48 - 1
