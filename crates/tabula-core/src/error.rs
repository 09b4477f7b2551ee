//! Error types for the tabula core library.
//!
//! Two orthogonal taxonomies: [`Error`] covers codec and parser failures
//! that abort an operation, while [`ErrorKind`] is the closed set of
//! spreadsheet error values (`#DIV/0!`, `#N/A`, ...) that the evaluator
//! produces as first-class cell values and never throws.

use std::fmt;

use thiserror::Error;

/// The top-level error type for tabula. Codec failures are fail-fast: an
/// invariant-violating mutation fails before any bytes are written.
#[derive(Error, Debug)]
pub enum Error {
    /// The ZIP container is structurally invalid.
    #[error("invalid ZIP archive: {0}")]
    InvalidZip(String),

    /// A part required by the package protocol is absent.
    #[error("missing required part: {0}")]
    MissingRequiredPart(String),

    /// A part exists but its XML does not parse or deserialize.
    #[error("malformed XML in {part}: {detail}")]
    MalformedXml { part: String, detail: String },

    /// The given string is not a valid A1-style cell or range reference,
    /// or a coordinate is out of the sheet bounds.
    #[error("invalid cell reference: {0}")]
    InvalidReference(String),

    /// A relationship id does not resolve within its owner part.
    #[error("invalid relationship {id} in {owner}: {reason}")]
    InvalidRelationship {
        owner: String,
        id: String,
        reason: String,
    },

    /// A sheet with the given name already exists (names compare
    /// case-insensitively).
    #[error("duplicate sheet name: {name}")]
    DuplicateSheetName { name: String },

    /// No sheet with the given name exists in the workbook.
    #[error("sheet '{name}' does not exist")]
    SheetNotFound { name: String },

    /// The sheet name is empty or contains a forbidden character.
    #[error("invalid sheet name: {0}")]
    InvalidSheetName(String),

    /// An underlying I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A formula string failed to parse.
    #[error("formula parse error at {position}: {detail}")]
    FormulaParse { position: usize, detail: String },
}

impl PartialEq for Error {
    fn eq(&self, other: &Self) -> bool {
        self.to_string() == other.to_string()
    }
}

/// A convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// The closed set of spreadsheet error values.
///
/// The declaration order is the propagation-preference order some
/// aggregate functions use; within operators the leftmost error in source
/// order always wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ErrorKind {
    /// `#NULL!` - empty range intersection.
    Null,
    /// `#DIV/0!` - division by zero.
    Div0,
    /// `#VALUE!` - operand of the wrong type.
    Value,
    /// `#REF!` - invalid or cyclic cell reference.
    Ref,
    /// `#NAME?` - unrecognised function or name.
    Name,
    /// `#NUM!` - numeric domain or convergence failure.
    Num,
    /// `#N/A` - value not available to a lookup.
    Na,
    /// `#GETTING_DATA` - asynchronous data still pending.
    GettingData,
    /// `#CALC!` - calculation engine limitation (also the stub result).
    Calc,
    /// `#SPILL!` - recognised on input; never produced by this engine.
    Spill,
}

impl ErrorKind {
    /// Parse the textual error name as it appears in `t="e"` cells and in
    /// formula source.
    pub fn parse(text: &str) -> Option<Self> {
        match text {
            "#NULL!" => Some(Self::Null),
            "#DIV/0!" => Some(Self::Div0),
            "#VALUE!" => Some(Self::Value),
            "#REF!" => Some(Self::Ref),
            "#NAME?" => Some(Self::Name),
            "#NUM!" => Some(Self::Num),
            "#N/A" => Some(Self::Na),
            "#GETTING_DATA" => Some(Self::GettingData),
            "#CALC!" => Some(Self::Calc),
            "#SPILL!" => Some(Self::Spill),
            _ => None,
        }
    }

    /// The textual form written to `t="e"` cells.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Null => "#NULL!",
            Self::Div0 => "#DIV/0!",
            Self::Value => "#VALUE!",
            Self::Ref => "#REF!",
            Self::Name => "#NAME?",
            Self::Num => "#NUM!",
            Self::Na => "#N/A",
            Self::GettingData => "#GETTING_DATA",
            Self::Calc => "#CALC!",
            Self::Spill => "#SPILL!",
        }
    }

    /// The `ERROR.TYPE` code for this error, when one is defined.
    pub fn type_code(self) -> Option<f64> {
        match self {
            Self::Null => Some(1.0),
            Self::Div0 => Some(2.0),
            Self::Value => Some(3.0),
            Self::Ref => Some(4.0),
            Self::Name => Some(5.0),
            Self::Num => Some(6.0),
            Self::Na => Some(7.0),
            Self::GettingData => Some(8.0),
            Self::Spill => Some(9.0),
            Self::Calc => Some(14.0),
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
