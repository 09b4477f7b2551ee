//! Parsed worksheet model.
//!
//! A sheet is a sparse map from `(row, col)` to a raw cell: the textual
//! value, the type tag, the style index, and the optional formula with its
//! cached value. Shared formula groups are expanded on read by shifting the
//! group's base text; every cell's cached `<v>` is preserved.

use std::collections::{BTreeMap, HashMap};

use tabula_xml::worksheet::{
    cell_types, Cell, CellFormula, Dimension, MergeCell, MergeCells, Row, SheetData, WorksheetXml,
};

use crate::error::{Error, ErrorKind, Result};
use crate::reference::{column_index, column_name, CellRef, Range};
use crate::sst::SharedStringTable;
use crate::styles::StyleTable;
use crate::utils::constants::{MAX_SHEET_NAME_LENGTH, SHEET_NAME_INVALID_CHARS};
use crate::value::{parse_number_text, CellValue};

/// A cell as stored in the file: text plus tags, no interpretation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawCell {
    /// The `t` attribute (`n`, `s`, `str`, `b`, `e`, `inlineStr`), absent
    /// for plain numbers.
    pub type_tag: Option<String>,
    /// The `<v>` text, or the flattened inline string. For `t="s"` cells
    /// this is the eagerly resolved pool text.
    pub value: Option<String>,
    /// Style index into `cellXfs`.
    pub style: Option<u32>,
    /// Formula source text (without the leading `=`).
    pub formula: Option<String>,
    /// Original shared-string pool index for `t="s"` cells read from a
    /// file; `None` for cells written through the builder.
    pub sst_index: Option<usize>,
}

/// A parsed worksheet.
#[derive(Debug, Clone)]
pub struct Sheet {
    pub name: String,
    pub sheet_id: u32,
    pub r_id: String,
    /// Dimension as declared in the file, if any.
    pub dimension: Option<Range>,
    /// Sparse cells in row-major order.
    cells: BTreeMap<(u32, u32), RawCell>,
    /// Merged ranges, carried for round-trip.
    pub merged: Vec<Range>,
}

impl Sheet {
    /// An empty sheet.
    pub fn empty(name: &str, sheet_id: u32, r_id: &str) -> Self {
        Self {
            name: name.to_string(),
            sheet_id,
            r_id: r_id.to_string(),
            dimension: None,
            cells: BTreeMap::new(),
            merged: Vec::new(),
        }
    }

    /// Parse a worksheet part. `part` names the part for error context.
    pub fn from_xml(
        name: &str,
        sheet_id: u32,
        r_id: &str,
        ws: &WorksheetXml,
        sst: &SharedStringTable,
        part: &str,
    ) -> Result<Self> {
        let mut sheet = Self::empty(name, sheet_id, r_id);

        if let Some(ref dim) = ws.dimension {
            sheet.dimension = Some(Range::parse(&dim.reference)?);
        }
        if let Some(ref mc) = ws.merge_cells {
            for m in &mc.merge_cells {
                sheet.merged.push(Range::parse(&m.reference)?);
            }
        }

        // First pass: collect shared-formula group bases.
        let mut shared: HashMap<u32, (CellRef, String)> = HashMap::new();
        for row in &ws.sheet_data.rows {
            for cell in &row.cells {
                if let Some(ref f) = cell.f {
                    if f.t.as_deref() == Some("shared") {
                        if let (Some(si), Some(text)) = (f.si, f.value.as_ref()) {
                            let base = CellRef::parse(&cell.r)?;
                            shared.insert(si, (base, text.clone()));
                        }
                    }
                }
            }
        }

        for row in &ws.sheet_data.rows {
            for cell in &row.cells {
                let r = CellRef::parse(&cell.r)?;
                let mut raw = RawCell {
                    type_tag: cell.t.clone(),
                    style: cell.s,
                    ..RawCell::default()
                };

                raw.value = match cell.t.as_deref() {
                    Some(t) if t == cell_types::INLINE_STRING => cell
                        .is
                        .as_ref()
                        .and_then(|is| is.t.as_ref())
                        .map(|t| t.value.clone()),
                    Some(t) if t == cell_types::SHARED_STRING => {
                        let text = cell.v.as_deref().unwrap_or("");
                        let idx: usize = text.parse().map_err(|_| Error::MalformedXml {
                            part: part.to_string(),
                            detail: format!("cell {}: shared-string index '{text}'", cell.r),
                        })?;
                        let resolved = sst.get(idx).ok_or_else(|| Error::MalformedXml {
                            part: part.to_string(),
                            detail: format!(
                                "cell {}: shared-string index {idx} out of range",
                                cell.r
                            ),
                        })?;
                        raw.sst_index = Some(idx);
                        Some(resolved.to_string())
                    }
                    _ => cell.v.clone(),
                };

                if let Some(ref f) = cell.f {
                    raw.formula = match (f.t.as_deref(), f.value.as_ref(), f.si) {
                        (Some("shared"), None, Some(si)) => {
                            // Follower cell: shift the group base text.
                            match shared.get(&si) {
                                Some((base, text)) => {
                                    let dcol = i64::from(r.col) - i64::from(base.col);
                                    let drow = i64::from(r.row) - i64::from(base.row);
                                    Some(
                                        shift_formula_text(text, dcol, drow)
                                            .unwrap_or_else(|_| ErrorKind::Ref.to_string()),
                                    )
                                }
                                None => None,
                            }
                        }
                        (_, Some(text), _) => Some(text.clone()),
                        _ => None,
                    };
                }

                sheet.cells.insert((r.row, r.col), raw);
            }
        }

        Ok(sheet)
    }

    /// Raw cell at a reference.
    pub fn raw_cell(&self, r: CellRef) -> Option<&RawCell> {
        self.cells.get(&(r.row, r.col))
    }

    /// Insert or overwrite a cell.
    pub fn set_cell(&mut self, r: CellRef, cell: RawCell) {
        self.cells.insert((r.row, r.col), cell);
    }

    /// Remove a cell, returning it.
    pub fn remove_cell(&mut self, r: CellRef) -> Option<RawCell> {
        self.cells.remove(&(r.row, r.col))
    }

    /// Row-major iteration over `(row, col, cell)`.
    pub fn iter_cells(&self) -> impl Iterator<Item = (u32, u32, &RawCell)> {
        self.cells.iter().map(|(&(row, col), c)| (row, col, c))
    }

    /// Number of populated cells.
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Bounding rectangle of the written cells, `None` when empty.
    pub fn computed_dimension(&self) -> Option<Range> {
        let mut iter = self.cells.keys();
        let &(r0, c0) = iter.next()?;
        let (mut min_r, mut max_r, mut min_c, mut max_c) = (r0, r0, c0, c0);
        for &(r, c) in iter {
            min_r = min_r.min(r);
            max_r = max_r.max(r);
            min_c = min_c.min(c);
            max_c = max_c.max(c);
        }
        let start = CellRef::new(min_c, min_r).ok()?;
        let end = CellRef::new(max_c, max_r).ok()?;
        Some(Range::new(start, end))
    }

    /// Decode a cell to its typed value. Formula cells decode to the
    /// `Formula` variant carrying the cached value typed per the tag.
    pub fn typed_value(&self, r: CellRef, styles: &StyleTable) -> CellValue {
        match self.raw_cell(r) {
            Some(raw) => decode_cell(raw, styles),
            None => CellValue::Empty,
        }
    }

    /// Serialize back to a worksheet part, emitting cells in strict
    /// `(row, column)` order with row spans and the computed dimension.
    pub fn to_xml(&self, sst: &mut SharedStringTable) -> WorksheetXml {
        let mut rows: Vec<Row> = Vec::new();
        let mut current: Option<(u32, Vec<Cell>, u32, u32)> = None;

        for (&(row, col), raw) in &self.cells {
            if current.as_ref().map(|&(r, ..)| r) != Some(row) {
                if let Some((r, cells, min_c, max_c)) = current.take() {
                    rows.push(make_row(r, cells, min_c, max_c));
                }
                current = Some((row, Vec::new(), col, col));
            }
            let (_, cells, min_c, max_c) = current.as_mut().expect("row group in progress");
            *min_c = (*min_c).min(col);
            *max_c = (*max_c).max(col);

            let reference = column_name(col)
                .map(|name| format!("{name}{row}"))
                .unwrap_or_default();

            let v = match raw.type_tag.as_deref() {
                Some(t) if t == cell_types::SHARED_STRING => {
                    let idx = match raw.sst_index {
                        Some(i) => i,
                        None => sst.add(raw.value.as_deref().unwrap_or("")),
                    };
                    Some(idx.to_string())
                }
                Some(t) if t == cell_types::INLINE_STRING => None,
                _ => raw.value.clone(),
            };

            let is = if raw.type_tag.as_deref() == Some(cell_types::INLINE_STRING) {
                raw.value.as_deref().map(|text| {
                    tabula_xml::worksheet::InlineString {
                        t: Some(tabula_xml::worksheet::InlineText {
                            xml_space: needs_preserve(text).then(|| "preserve".to_string()),
                            value: text.to_string(),
                        }),
                    }
                })
            } else {
                None
            };

            cells.push(Cell {
                r: reference,
                s: raw.style,
                t: raw.type_tag.clone(),
                f: raw.formula.as_ref().map(|text| CellFormula {
                    t: None,
                    reference: None,
                    si: None,
                    value: Some(text.clone()),
                }),
                v,
                is,
            });
        }
        if let Some((r, cells, min_c, max_c)) = current.take() {
            rows.push(make_row(r, cells, min_c, max_c));
        }

        let dimension = self
            .computed_dimension()
            .map(|d| d.to_string())
            .unwrap_or_else(|| "A1".to_string());

        WorksheetXml {
            dimension: Some(Dimension {
                reference: dimension,
            }),
            sheet_data: SheetData { rows },
            merge_cells: if self.merged.is_empty() {
                None
            } else {
                Some(MergeCells {
                    count: Some(self.merged.len() as u32),
                    merge_cells: self
                        .merged
                        .iter()
                        .map(|m| MergeCell {
                            reference: m.to_string(),
                        })
                        .collect(),
                })
            },
            ..WorksheetXml::default()
        }
    }
}

fn make_row(r: u32, cells: Vec<Cell>, min_c: u32, max_c: u32) -> Row {
    Row {
        r,
        spans: Some(format!("{min_c}:{max_c}")),
        s: None,
        cells,
    }
}

fn needs_preserve(text: &str) -> bool {
    text.starts_with(' ') || text.ends_with(' ') || text.contains("  ") || text.contains('\n')
}

/// Decode a raw cell to its typed value.
pub fn decode_cell(raw: &RawCell, styles: &StyleTable) -> CellValue {
    let plain = decode_plain(raw, styles);
    match raw.formula {
        Some(ref text) => CellValue::Formula {
            text: text.clone(),
            cached: match plain {
                CellValue::Empty => None,
                v => Some(Box::new(v)),
            },
        },
        None => plain,
    }
}

fn decode_plain(raw: &RawCell, styles: &StyleTable) -> CellValue {
    let Some(ref text) = raw.value else {
        return CellValue::Empty;
    };
    match raw.type_tag.as_deref() {
        None | Some(cell_types::NUMBER) => match parse_number_text(text) {
            Some(n) => {
                if raw.style.is_some_and(|s| styles.is_date_style(s)) {
                    CellValue::Date(n)
                } else {
                    CellValue::Number(n)
                }
            }
            None => CellValue::Error(ErrorKind::Value),
        },
        Some(cell_types::BOOLEAN) => match text.as_str() {
            "1" => CellValue::Bool(true),
            "0" => CellValue::Bool(false),
            _ => CellValue::Error(ErrorKind::Value),
        },
        Some(cell_types::ERROR) => match ErrorKind::parse(text) {
            Some(kind) => CellValue::Error(kind),
            None => CellValue::Error(ErrorKind::Value),
        },
        Some(cell_types::SHARED_STRING)
        | Some(cell_types::FORMULA_STRING)
        | Some(cell_types::INLINE_STRING) => CellValue::Text(text.clone()),
        Some(_) => CellValue::Error(ErrorKind::Value),
    }
}

/// Validate a sheet name: non-empty, within Excel's length limit, and free
/// of the forbidden characters.
pub fn validate_sheet_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::InvalidSheetName("empty name".to_string()));
    }
    if name.chars().count() > MAX_SHEET_NAME_LENGTH {
        return Err(Error::InvalidSheetName(name.to_string()));
    }
    if name.chars().any(|c| SHEET_NAME_INVALID_CHARS.contains(&c)) {
        return Err(Error::InvalidSheetName(name.to_string()));
    }
    Ok(())
}

/// Shift every relative A1-style reference in formula text by
/// `(dcol, drow)`, preserving `$` markers and sheet prefixes. Used for
/// shared-formula expansion.
pub fn shift_formula_text(text: &str, dcol: i64, drow: i64) -> Result<String> {
    if !text.is_ascii() {
        return Ok(text.to_string());
    }
    let bytes = text.as_bytes();
    let mut out = String::with_capacity(text.len());
    let mut i = 0usize;
    let mut in_string = false;

    while i < bytes.len() {
        if bytes[i] == b'"' {
            in_string = !in_string;
            out.push('"');
            i += 1;
            continue;
        }
        if !in_string {
            if let Some((reference, end)) = scan_ref(text, i) {
                let shifted = reference.shifted(dcol, drow)?;
                out.push_str(&shifted.to_string());
                i = end;
                continue;
            }
        }
        out.push(bytes[i] as char);
        i += 1;
    }
    Ok(out)
}

fn is_boundary(b: u8) -> bool {
    !(b.is_ascii_alphanumeric() || b == b'_' || b == b'.')
}

/// Try to scan a cell reference at byte offset `start`; returns the parsed
/// reference and the end offset.
fn scan_ref(s: &str, start: usize) -> Option<(CellRef, usize)> {
    let bytes = s.as_bytes();
    let len = bytes.len();
    if start > 0 && !is_boundary(bytes[start - 1]) && bytes[start - 1] != b'$' {
        return None;
    }

    let mut i = start;
    let abs_col = bytes.get(i) == Some(&b'$');
    if abs_col {
        i += 1;
    }
    let col_start = i;
    while i < len && bytes[i].is_ascii_alphabetic() {
        i += 1;
    }
    let col_len = i - col_start;
    if !(1..=3).contains(&col_len) {
        return None;
    }
    let abs_row = bytes.get(i) == Some(&b'$');
    if abs_row {
        i += 1;
    }
    let row_start = i;
    while i < len && bytes[i].is_ascii_digit() {
        i += 1;
    }
    if row_start == i {
        return None;
    }
    // A trailing `!` means this was a sheet name, not a reference.
    if bytes.get(i) == Some(&b'!') {
        return None;
    }
    if i < len && !is_boundary(bytes[i]) {
        return None;
    }

    let col = column_index(&s[col_start..col_start + col_len]).ok()?;
    let row: u32 = s[row_start..i].parse().ok()?;
    if row == 0 {
        return None;
    }
    Some((
        CellRef {
            col,
            row,
            abs_col,
            abs_row,
        },
        i,
    ))
}
