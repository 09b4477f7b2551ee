//! Workbook façades.
//!
//! [`Workbook`] is the read view produced by parsing package bytes;
//! mutation replays through [`WorkbookWriter`], which also builds new
//! workbooks from the empty-package template. Both follow the same part
//! protocol: the package root relationships locate the workbook part, the
//! workbook relationships locate sheets, styles, and shared strings.

mod writer;

pub use writer::WorkbookWriter;

use tabula_xml::relationships::rel_types;
use tabula_xml::shared_strings::Sst;
use tabula_xml::styles::StyleSheet;
use tabula_xml::workbook::WorkbookXml;
use tabula_xml::worksheet::WorksheetXml;

use crate::error::{Error, Result};
use crate::formula::ast::RefExpr;
use crate::formula::eval::{CellResolver, Evaluator};
use crate::formula::parser::parse_formula;
use crate::package::{rels_path, Package};
use crate::reference::{CellRef, Range};
use crate::sheet::Sheet;
use crate::sst::SharedStringTable;
use crate::styles::StyleTable;
use crate::value::CellValue;

/// In-memory read view of an `.xlsx` workbook.
pub struct Workbook {
    package: Package,
    workbook_part: String,
    sheets: Vec<Sheet>,
    sst: SharedStringTable,
    styles: StyleTable,
    defined_names: Vec<(String, String)>,
}

impl Workbook {
    /// Open a workbook from `.xlsx` bytes.
    ///
    /// The open protocol: package root relationships locate the
    /// `officeDocument` part; the workbook part lists the sheets; the
    /// workbook relationships resolve each sheet, the styles part, and the
    /// shared strings part; sheets parse into sparse cell maps with
    /// shared-formula groups expanded.
    pub fn open(data: &[u8]) -> Result<Self> {
        let package = Package::from_bytes(data)?;

        let workbook_part = package.office_document_path()?;
        let workbook_xml: WorkbookXml = package.read_xml(&workbook_part)?;

        let sst = match package.rel_target_of_type(&workbook_part, rel_types::SHARED_STRINGS) {
            Some(path) => {
                let xml: Sst = package.read_xml(&path)?;
                SharedStringTable::from_sst(&xml)
            }
            None => SharedStringTable::new(),
        };

        let styles = match package.rel_target_of_type(&workbook_part, rel_types::STYLES) {
            Some(path) => {
                let xml: StyleSheet = package.read_xml(&path)?;
                StyleTable::from_stylesheet(xml)
            }
            None => StyleTable::new(),
        };

        let mut sheets = Vec::with_capacity(workbook_xml.sheets.sheets.len());
        for entry in &workbook_xml.sheets.sheets {
            let path = package.rel_target(&workbook_part, &entry.r_id)?;
            let ws: WorksheetXml = package.read_xml(&path)?;
            sheets.push(Sheet::from_xml(
                &entry.name,
                entry.sheet_id,
                &entry.r_id,
                &ws,
                &sst,
                &path,
            )?);
        }

        let defined_names = workbook_xml
            .defined_names
            .as_ref()
            .map(|names| {
                names
                    .defined_names
                    .iter()
                    .map(|n| (n.name.clone(), n.value.clone()))
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            package,
            workbook_part,
            sheets,
            sst,
            styles,
            defined_names,
        })
    }

    /// Sheet names in workbook order.
    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|s| s.name.as_str()).collect()
    }

    /// Number of sheets.
    pub fn sheet_count(&self) -> usize {
        self.sheets.len()
    }

    /// Look up a sheet by name (case-insensitive, matching the uniqueness
    /// rule).
    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets
            .iter()
            .find(|s| s.name.eq_ignore_ascii_case(name))
    }

    /// The shared string pool.
    pub fn shared_strings(&self) -> &SharedStringTable {
        &self.sst
    }

    /// The styles registry.
    pub fn styles(&self) -> &StyleTable {
        &self.styles
    }

    /// Defined names as `(name, refers_to)` pairs.
    pub fn defined_names(&self) -> &[(String, String)] {
        &self.defined_names
    }

    /// The typed value of a cell. Formula cells read back as their cached
    /// value; evaluation happens only through [`Workbook::evaluate`].
    pub fn cell_value(&self, sheet: &str, reference: &str) -> Result<CellValue> {
        let sheet = self.sheet(sheet).ok_or_else(|| Error::SheetNotFound {
            name: sheet.to_string(),
        })?;
        let r = CellRef::parse(reference)?;
        Ok(match sheet.typed_value(r, &self.styles) {
            CellValue::Formula { cached, .. } => {
                cached.map(|b| *b).unwrap_or(CellValue::Empty)
            }
            other => other,
        })
    }

    /// The formula text of a cell, if it has one.
    pub fn cell_formula(&self, sheet: &str, reference: &str) -> Result<Option<String>> {
        let sheet = self.sheet(sheet).ok_or_else(|| Error::SheetNotFound {
            name: sheet.to_string(),
        })?;
        let r = CellRef::parse(reference)?;
        Ok(sheet.raw_cell(r).and_then(|c| c.formula.clone()))
    }

    /// Parse and evaluate a formula in the context of `sheet`. Parse
    /// failures are caller-facing; evaluation failures come back as error
    /// cell values.
    pub fn evaluate(&self, sheet: &str, formula: &str) -> Result<CellValue> {
        if self.sheet(sheet).is_none() {
            return Err(Error::SheetNotFound {
                name: sheet.to_string(),
            });
        }
        let expr = parse_formula(formula)?;
        let resolver = WorkbookResolver {
            workbook: self,
            current: sheet.to_string(),
        };
        let result = Evaluator::new(&resolver).eval(&expr);
        Ok(result)
    }

    /// Evaluate the formula stored in a cell, falling back to the stored
    /// value for plain cells.
    pub fn evaluate_cell(&self, sheet: &str, reference: &str) -> Result<CellValue> {
        match self.cell_formula(sheet, reference)? {
            Some(formula) => self.evaluate(sheet, &formula),
            None => self.cell_value(sheet, reference),
        }
    }

    /// Start a mutable builder seeded with this workbook's content. Parts
    /// the engine does not interpret (theme, document properties, and any
    /// other payloads) carry over verbatim.
    pub fn to_writer(&self) -> WorkbookWriter {
        let mut writer = WorkbookWriter::from_parts(
            self.sheets.clone(),
            self.sst.clone_pool(),
            self.styles.stylesheet().clone(),
            self.defined_names.clone(),
        );

        let owned = self.owned_parts();
        for path in self.package.part_names() {
            if owned.iter().any(|p| p.as_str() == path) || path.ends_with(".rels") {
                continue;
            }
            if path == "/[Content_Types].xml" {
                continue;
            }
            let bytes = self.package.part(path).expect("listed part").to_vec();
            let content_type = self.package.content_type(path).map(|s| s.to_string());
            writer.preserve_part(path, content_type, bytes);
        }
        writer
    }

    /// Serialize back to `.xlsx` bytes by replaying through the builder.
    pub fn save_to_bytes(&self) -> Result<Vec<u8>> {
        self.to_writer().save_to_bytes()
    }

    /// Parts the engine owns and re-emits itself (everything else is
    /// preserved verbatim).
    fn owned_parts(&self) -> Vec<String> {
        let mut owned = vec![self.workbook_part.clone(), rels_path(&self.workbook_part)];
        for entry_rid in self.sheets.iter().map(|s| s.r_id.clone()) {
            if let Ok(path) = self.package.rel_target(&self.workbook_part, &entry_rid) {
                owned.push(path);
            }
        }
        for rel_type in [rel_types::SHARED_STRINGS, rel_types::STYLES] {
            if let Some(path) = self.package.rel_target_of_type(&self.workbook_part, rel_type) {
                owned.push(path);
            }
        }
        owned
    }
}

/// Resolver bridging the evaluator to workbook cells. Formula cells come
/// back as the `Formula` variant and are chased by the evaluator with its
/// in-progress set.
struct WorkbookResolver<'a> {
    workbook: &'a Workbook,
    current: String,
}

impl CellResolver for WorkbookResolver<'_> {
    fn cell(&self, sheet: &str, col: u32, row: u32) -> CellValue {
        let Some(sheet) = self.workbook.sheet(sheet) else {
            return CellValue::Error(crate::error::ErrorKind::Ref);
        };
        let Ok(r) = CellRef::new(col, row) else {
            return CellValue::Error(crate::error::ErrorKind::Ref);
        };
        sheet.typed_value(r, &self.workbook.styles)
    }

    fn current_sheet(&self) -> &str {
        &self.current
    }

    fn named_range(&self, name: &str) -> Option<RefExpr> {
        let (_, refers_to) = self
            .workbook
            .defined_names
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))?;
        parse_refers_to(refers_to)
    }

    fn sheet_count(&self) -> u32 {
        self.workbook.sheets.len() as u32
    }

    fn sheet_position(&self, name: &str) -> Option<u32> {
        self.workbook
            .sheets
            .iter()
            .position(|s| s.name.eq_ignore_ascii_case(name))
            .map(|i| i as u32 + 1)
    }
}

/// Parse a defined-name target like `Sheet1!$A$1:$A$10`.
fn parse_refers_to(text: &str) -> Option<RefExpr> {
    let (sheet, body) = match text.rsplit_once('!') {
        Some((s, rest)) => {
            let s = s.trim_matches('\'').replace("''", "'");
            (Some(s), rest)
        }
        None => (None, text),
    };
    let range = Range::parse(body).ok()?;
    Some(RefExpr { sheet, range })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn minimal_workbook() -> Vec<u8> {
        let mut writer = WorkbookWriter::new();
        writer.add_sheet("Sheet1").unwrap();
        writer
            .set_value("Sheet1", "A1", CellValue::Text("Hello".to_string()))
            .unwrap();
        writer
            .set_value("Sheet1", "B1", CellValue::Number(42.0))
            .unwrap();
        writer
            .set_value("Sheet1", "C1", CellValue::Bool(true))
            .unwrap();
        writer.save_to_bytes().unwrap()
    }

    #[test]
    fn test_open_and_read_minimal() {
        let bytes = minimal_workbook();
        let wb = Workbook::open(&bytes).unwrap();
        assert_eq!(wb.sheet_count(), 1);
        assert_eq!(wb.sheet_names(), vec!["Sheet1"]);
        assert_eq!(
            wb.cell_value("Sheet1", "A1").unwrap(),
            CellValue::Text("Hello".to_string())
        );
        assert_eq!(
            wb.cell_value("Sheet1", "B1").unwrap(),
            CellValue::Number(42.0)
        );
        assert_eq!(
            wb.cell_value("Sheet1", "C1").unwrap(),
            CellValue::Bool(true)
        );
        assert_eq!(wb.cell_value("Sheet1", "D1").unwrap(), CellValue::Empty);
    }

    #[test]
    fn test_unknown_sheet_and_bad_ref() {
        let bytes = minimal_workbook();
        let wb = Workbook::open(&bytes).unwrap();
        assert!(matches!(
            wb.cell_value("Nope", "A1"),
            Err(Error::SheetNotFound { .. })
        ));
        assert!(matches!(
            wb.cell_value("Sheet1", "1A"),
            Err(Error::InvalidReference(_))
        ));
    }

    #[test]
    fn test_open_rejects_non_xlsx() {
        assert!(matches!(
            Workbook::open(b"not a workbook"),
            Err(Error::InvalidZip(_))
        ));
    }

    #[test]
    fn test_formula_cached_value_and_evaluation() {
        let mut writer = WorkbookWriter::new();
        writer.add_sheet("Sheet1").unwrap();
        writer
            .set_value("Sheet1", "A1", CellValue::Number(2.0))
            .unwrap();
        writer
            .set_value("Sheet1", "A2", CellValue::Number(3.0))
            .unwrap();
        writer
            .set_formula("Sheet1", "A3", "SUM(A1:A2)", Some(CellValue::Number(5.0)))
            .unwrap();
        let bytes = writer.save_to_bytes().unwrap();

        let wb = Workbook::open(&bytes).unwrap();
        // The cached value is what a plain read sees.
        assert_eq!(
            wb.cell_value("Sheet1", "A3").unwrap(),
            CellValue::Number(5.0)
        );
        assert_eq!(
            wb.cell_formula("Sheet1", "A3").unwrap().as_deref(),
            Some("SUM(A1:A2)")
        );
        // Evaluation agrees.
        assert_eq!(
            wb.evaluate_cell("Sheet1", "A3").unwrap(),
            CellValue::Number(5.0)
        );
    }

    #[test]
    fn test_evaluate_parse_error_is_caller_facing() {
        let bytes = minimal_workbook();
        let wb = Workbook::open(&bytes).unwrap();
        assert!(matches!(
            wb.evaluate("Sheet1", "1+"),
            Err(Error::FormulaParse { .. })
        ));
    }

    #[test]
    fn test_evaluate_cross_sheet_and_errors_as_values() {
        let mut writer = WorkbookWriter::new();
        writer.add_sheet("Data").unwrap();
        writer.add_sheet("Calc").unwrap();
        writer
            .set_value("Data", "A1", CellValue::Number(5.0))
            .unwrap();
        let bytes = writer.save_to_bytes().unwrap();
        let wb = Workbook::open(&bytes).unwrap();

        assert_eq!(
            wb.evaluate("Calc", "Data!A1*2").unwrap(),
            CellValue::Number(10.0)
        );
        assert_eq!(
            wb.evaluate("Calc", "1/0+Data!A1").unwrap(),
            CellValue::Error(ErrorKind::Div0)
        );
        assert_eq!(
            wb.evaluate("Calc", "IFERROR(1/0,\"n/a\")").unwrap(),
            CellValue::Text("n/a".to_string())
        );
    }

    #[test]
    fn test_defined_names_resolve() {
        let mut writer = WorkbookWriter::new();
        writer.add_sheet("Sheet1").unwrap();
        writer
            .set_value("Sheet1", "A1", CellValue::Number(3.0))
            .unwrap();
        writer
            .set_value("Sheet1", "A2", CellValue::Number(4.0))
            .unwrap();
        writer.define_name("MyData", "Sheet1!$A$1:$A$2");
        let bytes = writer.save_to_bytes().unwrap();

        let wb = Workbook::open(&bytes).unwrap();
        assert_eq!(
            wb.evaluate("Sheet1", "SUM(MyData)").unwrap(),
            CellValue::Number(7.0)
        );
    }

    #[test]
    fn test_sheet_functions_see_the_workbook() {
        let mut writer = WorkbookWriter::new();
        writer.add_sheet("One").unwrap();
        writer.add_sheet("Two").unwrap();
        let bytes = writer.save_to_bytes().unwrap();
        let wb = Workbook::open(&bytes).unwrap();
        assert_eq!(wb.evaluate("One", "SHEETS()").unwrap(), CellValue::Number(2.0));
        assert_eq!(
            wb.evaluate("One", "SHEET(\"Two\")").unwrap(),
            CellValue::Number(2.0)
        );
    }

    #[test]
    fn test_missing_required_part() {
        // A ZIP with content types but no root relationships.
        let mut builder = crate::package::PackageBuilder::new();
        builder
            .add_raw_part("/xl/workbook.xml", None, b"<workbook/>".to_vec())
            .unwrap();
        let bytes = builder.finish().unwrap();
        assert!(matches!(
            Workbook::open(&bytes),
            Err(Error::MissingRequiredPart(p)) if p.contains("rels")
        ));
    }

    #[test]
    fn test_cycle_detection_yields_ref_error() {
        let mut writer = WorkbookWriter::new();
        writer.add_sheet("Sheet1").unwrap();
        writer.set_formula("Sheet1", "A1", "B1+1", None).unwrap();
        writer.set_formula("Sheet1", "B1", "A1+1", None).unwrap();
        let bytes = writer.save_to_bytes().unwrap();
        let wb = Workbook::open(&bytes).unwrap();
        assert_eq!(
            wb.evaluate_cell("Sheet1", "A1").unwrap(),
            CellValue::Error(ErrorKind::Ref)
        );
    }
}
