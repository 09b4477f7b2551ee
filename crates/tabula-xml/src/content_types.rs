//! `[Content_Types].xml` schema structures.
//!
//! The content-type table maps every part in the package to a MIME type,
//! either by file extension (`Default`) or by full part path (`Override`).

use serde::{Deserialize, Serialize};

use crate::namespaces;

/// `[Content_Types].xml` root element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename = "Types")]
pub struct ContentTypes {
    #[serde(rename = "@xmlns")]
    pub xmlns: String,

    #[serde(rename = "Default", default)]
    pub defaults: Vec<ContentTypeDefault>,

    #[serde(rename = "Override", default)]
    pub overrides: Vec<ContentTypeOverride>,
}

/// Extension-based default content type mapping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentTypeDefault {
    #[serde(rename = "@Extension")]
    pub extension: String,

    #[serde(rename = "@ContentType")]
    pub content_type: String,
}

/// Path-specific content type override.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentTypeOverride {
    #[serde(rename = "@PartName")]
    pub part_name: String,

    #[serde(rename = "@ContentType")]
    pub content_type: String,
}

impl ContentTypes {
    /// Look up the content type of a part by its leading-slash path,
    /// checking overrides first and falling back to the extension defaults.
    pub fn content_type_of(&self, part_name: &str) -> Option<&str> {
        if let Some(ovr) = self.overrides.iter().find(|o| o.part_name == part_name) {
            return Some(&ovr.content_type);
        }
        let ext = part_name.rsplit('.').next()?;
        self.defaults
            .iter()
            .find(|d| d.extension.eq_ignore_ascii_case(ext))
            .map(|d| d.content_type.as_str())
    }
}

impl Default for ContentTypes {
    fn default() -> Self {
        Self {
            xmlns: namespaces::CONTENT_TYPES.to_string(),
            defaults: vec![
                ContentTypeDefault {
                    extension: "rels".to_string(),
                    content_type: mime_types::RELS.to_string(),
                },
                ContentTypeDefault {
                    extension: "xml".to_string(),
                    content_type: mime_types::XML.to_string(),
                },
            ],
            overrides: vec![],
        }
    }
}

/// Standard content type MIME string constants.
pub mod mime_types {
    // Default extensions
    pub const RELS: &str = "application/vnd.openxmlformats-package.relationships+xml";
    pub const XML: &str = "application/xml";

    // Workbook and worksheets
    pub const WORKBOOK: &str =
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml";
    pub const WORKSHEET: &str =
        "application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml";

    // Shared elements
    pub const SHARED_STRINGS: &str =
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sharedStrings+xml";
    pub const STYLES: &str =
        "application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml";
    pub const THEME: &str = "application/vnd.openxmlformats-officedocument.theme+xml";

    // Document properties
    pub const CORE_PROPERTIES: &str = "application/vnd.openxmlformats-package.core-properties+xml";
    pub const EXTENDED_PROPERTIES: &str =
        "application/vnd.openxmlformats-officedocument.extended-properties+xml";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_types_default() {
        let ct = ContentTypes::default();
        assert_eq!(ct.xmlns, namespaces::CONTENT_TYPES);
        assert_eq!(ct.defaults.len(), 2);
        assert_eq!(ct.defaults[0].extension, "rels");
        assert_eq!(ct.defaults[1].extension, "xml");
        assert!(ct.overrides.is_empty());
    }

    #[test]
    fn test_content_types_roundtrip() {
        let mut ct = ContentTypes::default();
        ct.overrides.push(ContentTypeOverride {
            part_name: "/xl/workbook.xml".to_string(),
            content_type: mime_types::WORKBOOK.to_string(),
        });
        let xml = quick_xml::se::to_string(&ct).unwrap();
        let parsed: ContentTypes = quick_xml::de::from_str(&xml).unwrap();
        assert_eq!(ct, parsed);
    }

    #[test]
    fn test_content_type_lookup_override_wins() {
        let mut ct = ContentTypes::default();
        ct.overrides.push(ContentTypeOverride {
            part_name: "/xl/workbook.xml".to_string(),
            content_type: mime_types::WORKBOOK.to_string(),
        });
        assert_eq!(
            ct.content_type_of("/xl/workbook.xml"),
            Some(mime_types::WORKBOOK)
        );
        // Falls back to the xml default for undeclared xml parts.
        assert_eq!(ct.content_type_of("/xl/other.xml"), Some(mime_types::XML));
        assert_eq!(ct.content_type_of("/xl/blob.bin"), None);
    }

    #[test]
    fn test_parse_real_excel_content_types() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
  <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
  <Default Extension="xml" ContentType="application/xml"/>
  <Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>
  <Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>
  <Override PartName="/xl/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml"/>
  <Override PartName="/xl/sharedStrings.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sharedStrings+xml"/>
</Types>"#;

        let parsed: ContentTypes = quick_xml::de::from_str(xml).unwrap();
        assert_eq!(parsed.defaults.len(), 2);
        assert_eq!(parsed.overrides.len(), 4);
        assert_eq!(parsed.overrides[0].part_name, "/xl/workbook.xml");
        assert_eq!(
            parsed.content_type_of("/xl/sharedStrings.xml"),
            Some(mime_types::SHARED_STRINGS)
        );
    }
}
