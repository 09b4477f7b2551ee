//! Workbook XML schema structures.
//!
//! Represents `xl/workbook.xml`: the ordered sheet list with display names,
//! sheet ids, and relationship ids pointing at the worksheet parts.

use serde::{Deserialize, Serialize};

use crate::namespaces;

/// Workbook root element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename = "workbook")]
pub struct WorkbookXml {
    #[serde(rename = "@xmlns")]
    pub xmlns: String,

    #[serde(rename = "@xmlns:r")]
    pub xmlns_r: String,

    #[serde(rename = "sheets")]
    pub sheets: Sheets,

    #[serde(rename = "definedNames", skip_serializing_if = "Option::is_none")]
    pub defined_names: Option<DefinedNames>,
}

/// Sheets container.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sheets {
    #[serde(rename = "sheet", default)]
    pub sheets: Vec<SheetEntry>,
}

/// A single `<sheet>` entry in the workbook sheet list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SheetEntry {
    #[serde(rename = "@name")]
    pub name: String,

    #[serde(rename = "@sheetId")]
    pub sheet_id: u32,

    #[serde(rename = "@r:id", alias = "@id")]
    pub r_id: String,
}

/// Defined names container.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefinedNames {
    #[serde(rename = "definedName", default)]
    pub defined_names: Vec<DefinedName>,
}

/// A single defined name mapping a label to a reference expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefinedName {
    #[serde(rename = "@name")]
    pub name: String,

    #[serde(rename = "@localSheetId", skip_serializing_if = "Option::is_none")]
    pub local_sheet_id: Option<u32>,

    #[serde(rename = "$value", default)]
    pub value: String,
}

impl Default for WorkbookXml {
    fn default() -> Self {
        Self {
            xmlns: namespaces::SPREADSHEET_ML.to_string(),
            xmlns_r: namespaces::RELATIONSHIPS.to_string(),
            sheets: Sheets { sheets: vec![] },
            defined_names: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_workbook_default() {
        let wb = WorkbookXml::default();
        assert_eq!(wb.xmlns, namespaces::SPREADSHEET_ML);
        assert_eq!(wb.xmlns_r, namespaces::RELATIONSHIPS);
        assert!(wb.sheets.sheets.is_empty());
        assert!(wb.defined_names.is_none());
    }

    #[test]
    fn test_workbook_roundtrip() {
        let wb = WorkbookXml {
            sheets: Sheets {
                sheets: vec![
                    SheetEntry {
                        name: "Sheet1".to_string(),
                        sheet_id: 1,
                        r_id: "rId1".to_string(),
                    },
                    SheetEntry {
                        name: "Data".to_string(),
                        sheet_id: 2,
                        r_id: "rId2".to_string(),
                    },
                ],
            },
            ..WorkbookXml::default()
        };
        let xml = quick_xml::se::to_string(&wb).unwrap();
        let parsed: WorkbookXml = quick_xml::de::from_str(&xml).unwrap();
        assert_eq!(parsed.sheets.sheets.len(), 2);
        assert_eq!(parsed.sheets.sheets[0].name, "Sheet1");
        assert_eq!(parsed.sheets.sheets[1].r_id, "rId2");
    }

    #[test]
    fn test_parse_real_excel_workbook() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
  <sheets>
    <sheet name="Sheet1" sheetId="1" r:id="rId1"/>
    <sheet name="Summary" sheetId="3" r:id="rId2"/>
  </sheets>
</workbook>"#;

        let parsed: WorkbookXml = quick_xml::de::from_str(xml).unwrap();
        assert_eq!(parsed.sheets.sheets.len(), 2);
        assert_eq!(parsed.sheets.sheets[0].sheet_id, 1);
        assert_eq!(parsed.sheets.sheets[1].name, "Summary");
        assert_eq!(parsed.sheets.sheets[1].sheet_id, 3);
    }

    #[test]
    fn test_defined_names_roundtrip() {
        let wb = WorkbookXml {
            defined_names: Some(DefinedNames {
                defined_names: vec![DefinedName {
                    name: "Prices".to_string(),
                    local_sheet_id: None,
                    value: "Sheet1!$A$1:$A$10".to_string(),
                }],
            }),
            ..WorkbookXml::default()
        };
        let xml = quick_xml::se::to_string(&wb).unwrap();
        let parsed: WorkbookXml = quick_xml::de::from_str(&xml).unwrap();
        let names = parsed.defined_names.unwrap();
        assert_eq!(names.defined_names.len(), 1);
        assert_eq!(names.defined_names[0].name, "Prices");
        assert_eq!(names.defined_names[0].value, "Sheet1!$A$1:$A$10");
    }
}
