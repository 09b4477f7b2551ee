//! Shared Strings XML schema structures.
//!
//! Represents `xl/sharedStrings.xml`. Items are either plain `<t>` text or a
//! sequence of rich-text runs; run properties are kept structurally so that
//! untouched items round-trip.

use serde::{Deserialize, Serialize};

use crate::namespaces;

/// Shared String Table root element (`xl/sharedStrings.xml`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename = "sst")]
pub struct Sst {
    #[serde(rename = "@xmlns")]
    pub xmlns: String,

    /// Total reference count of shared strings in the workbook.
    #[serde(rename = "@count", skip_serializing_if = "Option::is_none")]
    pub count: Option<u32>,

    /// Number of unique string entries.
    #[serde(rename = "@uniqueCount", skip_serializing_if = "Option::is_none")]
    pub unique_count: Option<u32>,

    /// Shared string items.
    #[serde(rename = "si", default)]
    pub items: Vec<Si>,
}

/// Shared String Item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Si {
    /// Plain text content.
    #[serde(rename = "t", skip_serializing_if = "Option::is_none")]
    pub t: Option<T>,

    /// Rich text runs (formatted text).
    #[serde(rename = "r", default)]
    pub r: Vec<R>,
}

impl Si {
    /// Build a plain-text item, setting `xml:space="preserve"` when the text
    /// carries whitespace the XML parser would otherwise normalise away.
    pub fn plain(text: &str) -> Self {
        Self {
            t: Some(T::preserving(text)),
            r: vec![],
        }
    }

    /// Flatten the item to its text content. Rich-text items concatenate
    /// all run texts.
    pub fn text(&self) -> String {
        if let Some(ref t) = self.t {
            t.value.clone()
        } else {
            self.r.iter().map(|r| r.t.value.as_str()).collect()
        }
    }
}

/// Text element with optional space preservation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct T {
    #[serde(
        rename = "@xml:space",
        alias = "@space",
        skip_serializing_if = "Option::is_none"
    )]
    pub xml_space: Option<String>,

    #[serde(rename = "$value", default)]
    pub value: String,
}

impl T {
    /// Wrap `text`, flagging `xml:space="preserve"` for leading, trailing,
    /// doubled, or non-space whitespace.
    pub fn preserving(text: &str) -> Self {
        let needs_preserve = text.starts_with(' ')
            || text.ends_with(' ')
            || text.contains("  ")
            || text.contains('\n')
            || text.contains('\t');
        Self {
            xml_space: needs_preserve.then(|| "preserve".to_string()),
            value: text.to_string(),
        }
    }
}

/// Rich text run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct R {
    /// Run properties (formatting), preserved structurally.
    #[serde(rename = "rPr", skip_serializing_if = "Option::is_none")]
    pub r_pr: Option<RPr>,

    /// Text content.
    #[serde(rename = "t")]
    pub t: T,
}

/// Run properties. Only the fields needed for round-trip are modeled; the
/// engine never interprets them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct RPr {
    #[serde(rename = "b", skip_serializing_if = "Option::is_none")]
    pub b: Option<BoolVal>,

    #[serde(rename = "i", skip_serializing_if = "Option::is_none")]
    pub i: Option<BoolVal>,

    #[serde(rename = "sz", skip_serializing_if = "Option::is_none")]
    pub sz: Option<FontSize>,

    #[serde(rename = "color", skip_serializing_if = "Option::is_none")]
    pub color: Option<Color>,

    #[serde(rename = "rFont", skip_serializing_if = "Option::is_none")]
    pub r_font: Option<FontName>,

    #[serde(rename = "family", skip_serializing_if = "Option::is_none")]
    pub family: Option<FontFamily>,

    #[serde(rename = "scheme", skip_serializing_if = "Option::is_none")]
    pub scheme: Option<FontScheme>,
}

/// Boolean value wrapper.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoolVal {
    #[serde(rename = "@val", skip_serializing_if = "Option::is_none")]
    pub val: Option<bool>,
}

/// Font size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FontSize {
    #[serde(rename = "@val")]
    pub val: f64,
}

/// Color.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Color {
    #[serde(rename = "@rgb", skip_serializing_if = "Option::is_none")]
    pub rgb: Option<String>,

    #[serde(rename = "@theme", skip_serializing_if = "Option::is_none")]
    pub theme: Option<u32>,

    #[serde(rename = "@tint", skip_serializing_if = "Option::is_none")]
    pub tint: Option<f64>,
}

/// Font name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FontName {
    #[serde(rename = "@val")]
    pub val: String,
}

/// Font family.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FontFamily {
    #[serde(rename = "@val")]
    pub val: u32,
}

/// Font scheme.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FontScheme {
    #[serde(rename = "@val")]
    pub val: String,
}

impl Default for Sst {
    fn default() -> Self {
        Self {
            xmlns: namespaces::SPREADSHEET_ML.to_string(),
            count: Some(0),
            unique_count: Some(0),
            items: vec![],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sst_default() {
        let sst = Sst::default();
        assert_eq!(sst.xmlns, namespaces::SPREADSHEET_ML);
        assert_eq!(sst.count, Some(0));
        assert_eq!(sst.unique_count, Some(0));
        assert!(sst.items.is_empty());
    }

    #[test]
    fn test_plain_item_text() {
        let si = Si::plain("Hello");
        assert_eq!(si.text(), "Hello");
        assert!(si.t.as_ref().unwrap().xml_space.is_none());
    }

    #[test]
    fn test_whitespace_text_flags_preserve() {
        assert_eq!(
            T::preserving(" padded ").xml_space,
            Some("preserve".to_string())
        );
        assert_eq!(
            T::preserving("two  spaces").xml_space,
            Some("preserve".to_string())
        );
        assert!(T::preserving("plain").xml_space.is_none());
    }

    #[test]
    fn test_sst_roundtrip() {
        let sst = Sst {
            xmlns: namespaces::SPREADSHEET_ML.to_string(),
            count: Some(3),
            unique_count: Some(2),
            items: vec![Si::plain("Hello"), Si::plain("World")],
        };
        let xml = quick_xml::se::to_string(&sst).unwrap();
        let parsed: Sst = quick_xml::de::from_str(&xml).unwrap();
        assert_eq!(parsed.count, Some(3));
        assert_eq!(parsed.unique_count, Some(2));
        assert_eq!(parsed.items.len(), 2);
        assert_eq!(parsed.items[0].text(), "Hello");
    }

    #[test]
    fn test_rich_text_concatenates_runs() {
        let si = Si {
            t: None,
            r: vec![
                R {
                    r_pr: Some(RPr {
                        b: Some(BoolVal { val: None }),
                        ..RPr::default()
                    }),
                    t: T::preserving("Bold"),
                },
                R {
                    r_pr: None,
                    t: T {
                        xml_space: Some("preserve".to_string()),
                        value: " text".to_string(),
                    },
                },
            ],
        };
        assert_eq!(si.text(), "Bold text");
    }

    #[test]
    fn test_parse_real_excel_shared_strings() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" count="4" uniqueCount="3">
  <si><t>Name</t></si>
  <si><t>Value</t></si>
  <si><r><rPr><b/><sz val="11"/><rFont val="Calibri"/></rPr><t>Bold</t></r></si>
</sst>"#;

        let parsed: Sst = quick_xml::de::from_str(xml).unwrap();
        assert_eq!(parsed.count, Some(4));
        assert_eq!(parsed.unique_count, Some(3));
        assert_eq!(parsed.items.len(), 3);
        assert_eq!(parsed.items[0].text(), "Name");
        assert_eq!(parsed.items[2].text(), "Bold");
        assert!(parsed.items[2].r[0].r_pr.is_some());
    }

    #[test]
    fn test_preserve_attribute_serialized() {
        let t = T::preserving("  leading  ");
        let xml = quick_xml::se::to_string(&t).unwrap();
        assert!(xml.contains("xml:space=\"preserve\""));
    }
}
