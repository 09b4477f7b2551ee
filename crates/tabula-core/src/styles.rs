//! Runtime styles registry.
//!
//! Owns the behavioural slice of `xl/styles.xml`: the numFmtId mapping and
//! the `cellXfs` table, classified for date-likeness. Everything else in
//! the stylesheet is carried untouched and re-serialized verbatim at the
//! record level; new records are appended, never rewritten.

use tabula_xml::styles::{CellXfs, NumFmt, NumFmts, StyleSheet, Xf};

use crate::numfmt::{is_date_format_code, is_date_format_id};

/// First numFmtId available for user-defined formats.
const FIRST_CUSTOM_NUMFMT_ID: u32 = 164;

/// Runtime view over the workbook stylesheet.
pub struct StyleTable {
    sheet: StyleSheet,
    /// Per-cellXfs-index date classification, computed once on load.
    date_xf: Vec<bool>,
}

impl StyleTable {
    /// Wrap a parsed stylesheet, classifying every `cellXfs` entry.
    pub fn from_stylesheet(sheet: StyleSheet) -> Self {
        let date_xf = classify(&sheet);
        Self { sheet, date_xf }
    }

    /// The minimal stylesheet used by new workbooks.
    pub fn new() -> Self {
        Self::from_stylesheet(StyleSheet::minimal())
    }

    /// Borrow the stylesheet for serialization.
    pub fn stylesheet(&self) -> &StyleSheet {
        &self.sheet
    }

    /// Whether the cell style at `xf_index` renders numbers as dates.
    pub fn is_date_style(&self, xf_index: u32) -> bool {
        self.date_xf
            .get(xf_index as usize)
            .copied()
            .unwrap_or(false)
    }

    /// The effective number-format code for a style index, if any custom or
    /// built-in code applies.
    pub fn format_code(&self, xf_index: u32) -> Option<String> {
        let xfs = self.sheet.cell_xfs.as_ref()?;
        let id = xfs.xfs.get(xf_index as usize)?.num_fmt_id?;
        self.code_for_id(id)
    }

    fn code_for_id(&self, id: u32) -> Option<String> {
        if let Some(ref fmts) = self.sheet.num_fmts {
            if let Some(f) = fmts.num_fmts.iter().find(|f| f.num_fmt_id == id) {
                return Some(f.format_code.clone());
            }
        }
        crate::numfmt::builtin_format_code(id).map(|s| s.to_string())
    }

    /// Index of a cellXfs entry carrying the built-in date format (id 14),
    /// appending one if the table has none. Used by the builder for date
    /// cells.
    pub fn date_style_index(&mut self) -> u32 {
        self.style_index_for_numfmt(14)
    }

    /// Index of a cellXfs entry for an arbitrary format code, registering
    /// the code under a custom id (>= 164) when it is not a built-in.
    pub fn style_index_for_code(&mut self, code: &str) -> u32 {
        let builtin = (0..=49).find(|&id| {
            crate::numfmt::builtin_format_code(id).is_some_and(|c| c == code)
        });
        let id = match builtin {
            Some(id) => id,
            None => self.register_custom_code(code),
        };
        self.style_index_for_numfmt(id)
    }

    fn register_custom_code(&mut self, code: &str) -> u32 {
        let fmts = self.sheet.num_fmts.get_or_insert_with(|| NumFmts {
            count: Some(0),
            num_fmts: vec![],
        });
        if let Some(existing) = fmts.num_fmts.iter().find(|f| f.format_code == code) {
            return existing.num_fmt_id;
        }
        let id = fmts
            .num_fmts
            .iter()
            .map(|f| f.num_fmt_id + 1)
            .max()
            .unwrap_or(FIRST_CUSTOM_NUMFMT_ID)
            .max(FIRST_CUSTOM_NUMFMT_ID);
        fmts.num_fmts.push(NumFmt {
            num_fmt_id: id,
            format_code: code.to_string(),
        });
        fmts.count = Some(fmts.num_fmts.len() as u32);
        id
    }

    fn style_index_for_numfmt(&mut self, num_fmt_id: u32) -> u32 {
        let xfs = self.sheet.cell_xfs.get_or_insert_with(|| CellXfs {
            count: Some(0),
            xfs: vec![],
        });
        if let Some(idx) = xfs
            .xfs
            .iter()
            .position(|xf| xf.num_fmt_id == Some(num_fmt_id))
        {
            return idx as u32;
        }
        xfs.xfs.push(Xf {
            num_fmt_id: Some(num_fmt_id),
            font_id: Some(0),
            fill_id: Some(0),
            border_id: Some(0),
            xf_id: Some(0),
            apply_number_format: Some(true),
            ..Xf::default()
        });
        xfs.count = Some(xfs.xfs.len() as u32);
        let idx = (xfs.xfs.len() - 1) as u32;
        self.date_xf = classify(&self.sheet);
        idx
    }
}

impl Default for StyleTable {
    fn default() -> Self {
        Self::new()
    }
}

fn classify(sheet: &StyleSheet) -> Vec<bool> {
    let Some(ref xfs) = sheet.cell_xfs else {
        return vec![];
    };
    xfs.xfs
        .iter()
        .map(|xf| {
            let Some(id) = xf.num_fmt_id else {
                return false;
            };
            if let Some(ref fmts) = sheet.num_fmts {
                if let Some(f) = fmts.num_fmts.iter().find(|f| f.num_fmt_id == id) {
                    return is_date_format_code(&f.format_code);
                }
            }
            is_date_format_id(id)
        })
        .collect()
}
