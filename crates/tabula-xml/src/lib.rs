//! tabula-xml: typed XML schemas for the SpreadsheetML parts tabula owns.
//!
//! Every part the workbook engine reads or writes behaviourally has a serde
//! struct here, (de)serialized through quick-xml. Parts the engine merely
//! preserves (theme, document properties, drawings) stay as raw bytes in the
//! package layer and have no schema.
//!
//! # Modules
//!
//! - [`namespaces`] - OOXML namespace URI constants
//! - [`content_types`] - `[Content_Types].xml` structures
//! - [`relationships`] - Relationships (`.rels`) structures
//! - [`workbook`] - `xl/workbook.xml` structures
//! - [`worksheet`] - `xl/worksheets/sheet*.xml` structures
//! - [`styles`] - `xl/styles.xml` structures
//! - [`shared_strings`] - `xl/sharedStrings.xml` structures

pub mod content_types;
pub mod namespaces;
pub mod relationships;
pub mod shared_strings;
pub mod styles;
pub mod workbook;
pub mod worksheet;
