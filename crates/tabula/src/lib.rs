//! tabula: SpreadsheetML workbooks for Rust.
//!
//! Open an `.xlsx`, query typed cell values, evaluate formulas, or build a
//! workbook from scratch and save it:
//!
//! ```
//! use tabula::{CellValue, Workbook, WorkbookWriter};
//!
//! let mut writer = WorkbookWriter::new();
//! writer.add_sheet("Data")?;
//! writer.set_value("Data", "A1", CellValue::Text("total".into()))?;
//! writer.set_value("Data", "B1", CellValue::Number(42.0))?;
//! let bytes = writer.save_to_bytes()?;
//!
//! let workbook = Workbook::open(&bytes)?;
//! assert_eq!(workbook.cell_value("Data", "B1")?, CellValue::Number(42.0));
//! assert_eq!(workbook.evaluate("Data", "B1*2")?, CellValue::Number(84.0));
//! # Ok::<(), tabula::Error>(())
//! ```

pub use tabula_core::error::{Error, ErrorKind, Result};
pub use tabula_core::formula::{
    parse_formula, BinaryOp, CellResolver, CellSnapshot, Clock, Evaluator, Expr, FixedClock,
    RandomSource, RefExpr, UnaryOp,
};
pub use tabula_core::reference::{column_index, column_name, CellRef, Range};
pub use tabula_core::value::{CellValue, Matrix};
pub use tabula_core::workbook::{Workbook, WorkbookWriter};

/// Lower-level building blocks for callers that need the part schemas or
/// the package codec directly.
pub mod parts {
    pub use tabula_core::package::{Package, PackageBuilder};
    pub use tabula_xml::content_types;
    pub use tabula_xml::relationships;
    pub use tabula_xml::shared_strings;
    pub use tabula_xml::styles;
    pub use tabula_xml::workbook;
    pub use tabula_xml::worksheet;
}
