//! The mutable workbook builder.
//!
//! Accumulates sheets and typed cell writes in memory and emits the
//! package on save. Part emission order keeps downstream relationship ids
//! fixed before their owners are written: shared strings, styles, theme,
//! worksheets in sheet order, workbook, workbook relationships, package
//! relationships, and the content types table last. Invariant violations
//! (duplicate or empty sheet names, dangling relationship targets) fail
//! before any bytes are produced.

use tabula_xml::content_types::mime_types;
use tabula_xml::relationships::{rel_types, Relationships};
use tabula_xml::styles::StyleSheet;
use tabula_xml::workbook::{DefinedName, DefinedNames, SheetEntry, Sheets, WorkbookXml};

use crate::error::{Error, Result};
use crate::package::PackageBuilder;
use crate::reference::{CellRef, Range};
use crate::sheet::{validate_sheet_name, RawCell, Sheet};
use crate::sst::SharedStringTable;
use crate::styles::StyleTable;
use crate::value::{number_to_text, CellValue};

const THEME_PART: &str = "/xl/theme/theme1.xml";
const CORE_PROPS_PART: &str = "/docProps/core.xml";
const APP_PROPS_PART: &str = "/docProps/app.xml";

/// Mutable workbook builder.
pub struct WorkbookWriter {
    sheets: Vec<Sheet>,
    sst: SharedStringTable,
    styles: StyleTable,
    defined_names: Vec<(String, String)>,
    /// Preserved opaque parts: `(path, content_type, bytes)`.
    extra_parts: Vec<(String, Option<String>, Vec<u8>)>,
}

impl WorkbookWriter {
    /// An empty workbook. Sheets are added by name; saving with none adds
    /// a default `Sheet1`.
    pub fn new() -> Self {
        Self {
            sheets: Vec::new(),
            sst: SharedStringTable::new(),
            styles: StyleTable::new(),
            defined_names: Vec::new(),
            extra_parts: Vec::new(),
        }
    }

    /// Seed a builder from previously parsed content (the replay path).
    pub(crate) fn from_parts(
        sheets: Vec<Sheet>,
        sst: SharedStringTable,
        stylesheet: StyleSheet,
        defined_names: Vec<(String, String)>,
    ) -> Self {
        Self {
            sheets,
            sst,
            styles: StyleTable::from_stylesheet(stylesheet),
            defined_names,
            extra_parts: Vec::new(),
        }
    }

    /// Carry an opaque part through to the output verbatim.
    pub fn preserve_part(&mut self, path: &str, content_type: Option<String>, bytes: Vec<u8>) {
        self.extra_parts
            .push((path.to_string(), content_type, bytes));
    }

    /// Append a sheet. Names are validated and must be unique
    /// case-insensitively.
    pub fn add_sheet(&mut self, name: &str) -> Result<()> {
        validate_sheet_name(name)?;
        if self
            .sheets
            .iter()
            .any(|s| s.name.eq_ignore_ascii_case(name))
        {
            return Err(Error::DuplicateSheetName {
                name: name.to_string(),
            });
        }
        let index = self.sheets.len() as u32 + 1;
        self.sheets
            .push(Sheet::empty(name, index, &format!("rId{index}")));
        Ok(())
    }

    /// Sheet names in order.
    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|s| s.name.as_str()).collect()
    }

    fn sheet_mut(&mut self, name: &str) -> Result<&mut Sheet> {
        self.sheets
            .iter_mut()
            .find(|s| s.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| Error::SheetNotFound {
                name: name.to_string(),
            })
    }

    /// Write a typed value. Text goes through the shared string pool;
    /// `Empty` clears the cell. Writing to an occupied reference
    /// overwrites.
    pub fn set_value(&mut self, sheet: &str, reference: &str, value: CellValue) -> Result<()> {
        let r = CellRef::parse(reference)?;
        // Borrow order: pool updates need &mut self before the sheet.
        let raw = match value {
            CellValue::Empty => {
                self.sheet_mut(sheet)?.remove_cell(r);
                return Ok(());
            }
            CellValue::Number(n) => RawCell {
                value: Some(number_to_text(n)),
                ..RawCell::default()
            },
            CellValue::Date(serial) => {
                let style = self.styles.date_style_index();
                RawCell {
                    value: Some(number_to_text(serial)),
                    style: Some(style),
                    ..RawCell::default()
                }
            }
            CellValue::Bool(b) => RawCell {
                type_tag: Some("b".to_string()),
                value: Some(if b { "1" } else { "0" }.to_string()),
                ..RawCell::default()
            },
            CellValue::Text(text) => RawCell {
                type_tag: Some("s".to_string()),
                value: Some(text),
                ..RawCell::default()
            },
            CellValue::Error(kind) => RawCell {
                type_tag: Some("e".to_string()),
                value: Some(kind.to_string()),
                ..RawCell::default()
            },
            CellValue::Array(_) | CellValue::Formula { .. } => {
                return Err(Error::InvalidReference(format!(
                    "cannot write a composite value to {reference}"
                )));
            }
        };
        self.sheet_mut(sheet)?.set_cell(r, raw);
        Ok(())
    }

    /// Write text as an inline string instead of a pool reference.
    pub fn set_inline_text(&mut self, sheet: &str, reference: &str, text: &str) -> Result<()> {
        let r = CellRef::parse(reference)?;
        self.sheet_mut(sheet)?.set_cell(
            r,
            RawCell {
                type_tag: Some("inlineStr".to_string()),
                value: Some(text.to_string()),
                ..RawCell::default()
            },
        );
        Ok(())
    }

    /// Write a formula cell with an optional caller-supplied cached value.
    /// The writer performs no recalculation.
    pub fn set_formula(
        &mut self,
        sheet: &str,
        reference: &str,
        formula: &str,
        cached: Option<CellValue>,
    ) -> Result<()> {
        let r = CellRef::parse(reference)?;
        let formula = formula.strip_prefix('=').unwrap_or(formula).to_string();
        let (type_tag, value) = match cached {
            None => (None, None),
            Some(CellValue::Number(n)) | Some(CellValue::Date(n)) => {
                (None, Some(number_to_text(n)))
            }
            Some(CellValue::Bool(b)) => (
                Some("b".to_string()),
                Some(if b { "1" } else { "0" }.to_string()),
            ),
            Some(CellValue::Text(t)) => (Some("str".to_string()), Some(t)),
            Some(CellValue::Error(e)) => (Some("e".to_string()), Some(e.to_string())),
            Some(CellValue::Empty) => (None, None),
            Some(CellValue::Array(_)) | Some(CellValue::Formula { .. }) => {
                return Err(Error::InvalidReference(format!(
                    "cannot cache a composite value at {reference}"
                )));
            }
        };
        self.sheet_mut(sheet)?.set_cell(
            r,
            RawCell {
                type_tag,
                value,
                formula: Some(formula),
                ..RawCell::default()
            },
        );
        Ok(())
    }

    /// Apply a number format code to a cell, registering it in the styles
    /// table when needed.
    pub fn set_number_format(
        &mut self,
        sheet: &str,
        reference: &str,
        code: &str,
    ) -> Result<()> {
        let r = CellRef::parse(reference)?;
        let style = self.styles.style_index_for_code(code);
        let sheet = self.sheet_mut(sheet)?;
        let mut cell = sheet.raw_cell(r).cloned().unwrap_or_default();
        cell.style = Some(style);
        sheet.set_cell(r, cell);
        Ok(())
    }

    /// Record a merged range on a sheet.
    pub fn merge_cells(&mut self, sheet: &str, range: &str) -> Result<()> {
        let range = Range::parse(range)?;
        self.sheet_mut(sheet)?.merged.push(range);
        Ok(())
    }

    /// Define a workbook-level name.
    pub fn define_name(&mut self, name: &str, refers_to: &str) {
        self.defined_names
            .push((name.to_string(), refers_to.to_string()));
    }

    /// Serialize to `.xlsx` bytes.
    pub fn save_to_bytes(&self) -> Result<Vec<u8>> {
        // Validate the sheet-name invariants up front, before any emission.
        let mut sheets = self.sheets.clone();
        if sheets.is_empty() {
            sheets.push(Sheet::empty("Sheet1", 1, "rId1"));
        }
        for (i, sheet) in sheets.iter().enumerate() {
            validate_sheet_name(&sheet.name)?;
            if sheets[..i]
                .iter()
                .any(|s| s.name.eq_ignore_ascii_case(&sheet.name))
            {
                return Err(Error::DuplicateSheetName {
                    name: sheet.name.clone(),
                });
            }
        }

        let mut sst = self.sst.clone_pool();
        let mut builder = PackageBuilder::new();
        let mut workbook_rels = Relationships::empty();

        // Worksheet parts serialize first so the pool is complete before
        // the shared-strings part is rendered, but the shared-strings part
        // is *placed* first per the emission order.
        let mut sheet_parts = Vec::with_capacity(sheets.len());
        let mut entries = Vec::with_capacity(sheets.len());
        for (i, sheet) in sheets.iter().enumerate() {
            let path = format!("/xl/worksheets/sheet{}.xml", i + 1);
            let ws = sheet.to_xml(&mut sst);
            sheet_parts.push((path, ws));
        }

        // 1. Shared strings (omitted entirely when the pool is empty).
        let has_sst = !sst.is_empty();
        if has_sst {
            builder.add_xml_part(
                "/xl/sharedStrings.xml",
                Some(mime_types::SHARED_STRINGS),
                &sst.to_sst(),
            )?;
        }

        // 2. Styles.
        builder.add_xml_part("/xl/styles.xml", Some(mime_types::STYLES), self.styles.stylesheet())?;

        // 3. Theme and other preserved parts.
        for (path, content_type, bytes) in &self.extra_parts {
            builder.add_raw_part(path, content_type.as_deref(), bytes.clone())?;
        }

        // 4. Worksheets in sheet-list order.
        for (path, ws) in &sheet_parts {
            builder.add_xml_part(path, Some(mime_types::WORKSHEET), ws)?;
        }

        // 5. Workbook, with sequential relationship ids per owner.
        for (i, sheet) in sheets.iter().enumerate() {
            let r_id = workbook_rels.push_next(
                rel_types::WORKSHEET,
                &format!("worksheets/sheet{}.xml", i + 1),
            );
            entries.push(SheetEntry {
                name: sheet.name.clone(),
                sheet_id: i as u32 + 1,
                r_id,
            });
        }
        workbook_rels.push_next(rel_types::STYLES, "styles.xml");
        if has_sst {
            workbook_rels.push_next(rel_types::SHARED_STRINGS, "sharedStrings.xml");
        }
        if self.extra_parts.iter().any(|(p, _, _)| p == THEME_PART) {
            workbook_rels.push_next(rel_types::THEME, "theme/theme1.xml");
        }

        let workbook_xml = WorkbookXml {
            xmlns: tabula_xml::namespaces::SPREADSHEET_ML.to_string(),
            xmlns_r: tabula_xml::namespaces::RELATIONSHIPS.to_string(),
            sheets: Sheets { sheets: entries },
            defined_names: if self.defined_names.is_empty() {
                None
            } else {
                Some(DefinedNames {
                    defined_names: self
                        .defined_names
                        .iter()
                        .map(|(name, value)| DefinedName {
                            name: name.clone(),
                            local_sheet_id: None,
                            value: value.clone(),
                        })
                        .collect(),
                })
            },
        };
        builder.add_xml_part("/xl/workbook.xml", Some(mime_types::WORKBOOK), &workbook_xml)?;

        // 6. Workbook relationships.
        builder.add_rels("/xl/workbook.xml", workbook_rels);

        // 7. Package relationships.
        let mut package_rels = Relationships::empty();
        package_rels.push_next(rel_types::OFFICE_DOCUMENT, "xl/workbook.xml");
        if self.extra_parts.iter().any(|(p, _, _)| p == CORE_PROPS_PART) {
            package_rels.push_next(rel_types::CORE_PROPERTIES, "docProps/core.xml");
        }
        if self.extra_parts.iter().any(|(p, _, _)| p == APP_PROPS_PART) {
            package_rels.push_next(rel_types::EXTENDED_PROPERTIES, "docProps/app.xml");
        }
        builder.add_rels("/", package_rels);

        // 8. Content types are computed and appended by the builder.
        builder.finish()
    }
}

impl Default for WorkbookWriter {
    fn default() -> Self {
        Self::new()
    }
}
