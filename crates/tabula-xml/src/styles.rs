//! Styles XML schema structures.
//!
//! Represents `xl/styles.xml`. The engine interprets only `numFmts` and
//! `cellXfs` (for date detection); fonts, fills, and borders are parsed
//! structurally so unmodified records re-serialize unchanged.

use serde::{Deserialize, Serialize};

use crate::namespaces;
use crate::shared_strings::{BoolVal, Color, FontFamily, FontName, FontScheme, FontSize};

/// Stylesheet root element (`xl/styles.xml`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename = "styleSheet")]
pub struct StyleSheet {
    #[serde(rename = "@xmlns")]
    pub xmlns: String,

    #[serde(rename = "numFmts", skip_serializing_if = "Option::is_none")]
    pub num_fmts: Option<NumFmts>,

    #[serde(rename = "fonts", skip_serializing_if = "Option::is_none")]
    pub fonts: Option<Fonts>,

    #[serde(rename = "fills", skip_serializing_if = "Option::is_none")]
    pub fills: Option<Fills>,

    #[serde(rename = "borders", skip_serializing_if = "Option::is_none")]
    pub borders: Option<Borders>,

    #[serde(rename = "cellStyleXfs", skip_serializing_if = "Option::is_none")]
    pub cell_style_xfs: Option<CellStyleXfs>,

    #[serde(rename = "cellXfs", skip_serializing_if = "Option::is_none")]
    pub cell_xfs: Option<CellXfs>,

    #[serde(rename = "cellStyles", skip_serializing_if = "Option::is_none")]
    pub cell_styles: Option<CellStyles>,
}

/// Number formats container.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumFmts {
    #[serde(rename = "@count", skip_serializing_if = "Option::is_none")]
    pub count: Option<u32>,

    #[serde(rename = "numFmt", default)]
    pub num_fmts: Vec<NumFmt>,
}

/// Individual number format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumFmt {
    #[serde(rename = "@numFmtId")]
    pub num_fmt_id: u32,

    #[serde(rename = "@formatCode")]
    pub format_code: String,
}

/// Fonts container.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fonts {
    #[serde(rename = "@count", skip_serializing_if = "Option::is_none")]
    pub count: Option<u32>,

    #[serde(rename = "font", default)]
    pub fonts: Vec<Font>,
}

/// Individual font definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Font {
    #[serde(rename = "b", skip_serializing_if = "Option::is_none")]
    pub b: Option<BoolVal>,

    #[serde(rename = "i", skip_serializing_if = "Option::is_none")]
    pub i: Option<BoolVal>,

    #[serde(rename = "sz", skip_serializing_if = "Option::is_none")]
    pub sz: Option<FontSize>,

    #[serde(rename = "color", skip_serializing_if = "Option::is_none")]
    pub color: Option<Color>,

    #[serde(rename = "name", skip_serializing_if = "Option::is_none")]
    pub name: Option<FontName>,

    #[serde(rename = "family", skip_serializing_if = "Option::is_none")]
    pub family: Option<FontFamily>,

    #[serde(rename = "scheme", skip_serializing_if = "Option::is_none")]
    pub scheme: Option<FontScheme>,
}

/// Fills container.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fills {
    #[serde(rename = "@count", skip_serializing_if = "Option::is_none")]
    pub count: Option<u32>,

    #[serde(rename = "fill", default)]
    pub fills: Vec<Fill>,
}

/// Individual fill definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Fill {
    #[serde(rename = "patternFill", skip_serializing_if = "Option::is_none")]
    pub pattern_fill: Option<PatternFill>,
}

/// Pattern fill definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternFill {
    #[serde(rename = "@patternType", skip_serializing_if = "Option::is_none")]
    pub pattern_type: Option<String>,

    #[serde(rename = "fgColor", skip_serializing_if = "Option::is_none")]
    pub fg_color: Option<Color>,

    #[serde(rename = "bgColor", skip_serializing_if = "Option::is_none")]
    pub bg_color: Option<Color>,
}

/// Borders container.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Borders {
    #[serde(rename = "@count", skip_serializing_if = "Option::is_none")]
    pub count: Option<u32>,

    #[serde(rename = "border", default)]
    pub borders: Vec<Border>,
}

/// Individual border definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Border {
    #[serde(rename = "left", skip_serializing_if = "Option::is_none")]
    pub left: Option<BorderSide>,

    #[serde(rename = "right", skip_serializing_if = "Option::is_none")]
    pub right: Option<BorderSide>,

    #[serde(rename = "top", skip_serializing_if = "Option::is_none")]
    pub top: Option<BorderSide>,

    #[serde(rename = "bottom", skip_serializing_if = "Option::is_none")]
    pub bottom: Option<BorderSide>,

    #[serde(rename = "diagonal", skip_serializing_if = "Option::is_none")]
    pub diagonal: Option<BorderSide>,
}

/// Border side definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BorderSide {
    #[serde(rename = "@style", skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,

    #[serde(rename = "color", skip_serializing_if = "Option::is_none")]
    pub color: Option<Color>,
}

/// Cell style XFs container (base style formats).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellStyleXfs {
    #[serde(rename = "@count", skip_serializing_if = "Option::is_none")]
    pub count: Option<u32>,

    #[serde(rename = "xf", default)]
    pub xfs: Vec<Xf>,
}

/// Cell XFs container (applied cell formats).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellXfs {
    #[serde(rename = "@count", skip_serializing_if = "Option::is_none")]
    pub count: Option<u32>,

    #[serde(rename = "xf", default)]
    pub xfs: Vec<Xf>,
}

/// Cell format entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Xf {
    #[serde(rename = "@numFmtId", skip_serializing_if = "Option::is_none")]
    pub num_fmt_id: Option<u32>,

    #[serde(rename = "@fontId", skip_serializing_if = "Option::is_none")]
    pub font_id: Option<u32>,

    #[serde(rename = "@fillId", skip_serializing_if = "Option::is_none")]
    pub fill_id: Option<u32>,

    #[serde(rename = "@borderId", skip_serializing_if = "Option::is_none")]
    pub border_id: Option<u32>,

    #[serde(rename = "@xfId", skip_serializing_if = "Option::is_none")]
    pub xf_id: Option<u32>,

    #[serde(rename = "@applyNumberFormat", skip_serializing_if = "Option::is_none")]
    pub apply_number_format: Option<bool>,

    #[serde(rename = "@applyFont", skip_serializing_if = "Option::is_none")]
    pub apply_font: Option<bool>,
}

/// Cell styles container.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellStyles {
    #[serde(rename = "@count", skip_serializing_if = "Option::is_none")]
    pub count: Option<u32>,

    #[serde(rename = "cellStyle", default)]
    pub cell_styles: Vec<CellStyle>,
}

/// Named cell style entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellStyle {
    #[serde(rename = "@name")]
    pub name: String,

    #[serde(rename = "@xfId")]
    pub xf_id: u32,

    #[serde(rename = "@builtinId", skip_serializing_if = "Option::is_none")]
    pub builtin_id: Option<u32>,
}

impl StyleSheet {
    /// The minimal stylesheet new workbooks start from: one default font,
    /// the two mandatory fills, one border, and the General cell format.
    pub fn minimal() -> Self {
        Self {
            xmlns: namespaces::SPREADSHEET_ML.to_string(),
            num_fmts: None,
            fonts: Some(Fonts {
                count: Some(1),
                fonts: vec![Font {
                    sz: Some(FontSize { val: 11.0 }),
                    name: Some(FontName {
                        val: "Calibri".to_string(),
                    }),
                    ..Font::default()
                }],
            }),
            fills: Some(Fills {
                count: Some(2),
                fills: vec![
                    Fill {
                        pattern_fill: Some(PatternFill {
                            pattern_type: Some("none".to_string()),
                            fg_color: None,
                            bg_color: None,
                        }),
                    },
                    Fill {
                        pattern_fill: Some(PatternFill {
                            pattern_type: Some("gray125".to_string()),
                            fg_color: None,
                            bg_color: None,
                        }),
                    },
                ],
            }),
            borders: Some(Borders {
                count: Some(1),
                borders: vec![Border::default()],
            }),
            cell_style_xfs: Some(CellStyleXfs {
                count: Some(1),
                xfs: vec![Xf {
                    num_fmt_id: Some(0),
                    font_id: Some(0),
                    fill_id: Some(0),
                    border_id: Some(0),
                    ..Xf::default()
                }],
            }),
            cell_xfs: Some(CellXfs {
                count: Some(1),
                xfs: vec![Xf {
                    num_fmt_id: Some(0),
                    font_id: Some(0),
                    fill_id: Some(0),
                    border_id: Some(0),
                    xf_id: Some(0),
                    ..Xf::default()
                }],
            }),
            cell_styles: Some(CellStyles {
                count: Some(1),
                cell_styles: vec![CellStyle {
                    name: "Normal".to_string(),
                    xf_id: 0,
                    builtin_id: Some(0),
                }],
            }),
        }
    }
}

impl Default for StyleSheet {
    fn default() -> Self {
        Self::minimal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_stylesheet_shape() {
        let ss = StyleSheet::minimal();
        assert_eq!(ss.xmlns, namespaces::SPREADSHEET_ML);
        assert!(ss.num_fmts.is_none());
        assert_eq!(ss.fonts.as_ref().unwrap().fonts.len(), 1);
        assert_eq!(ss.fills.as_ref().unwrap().fills.len(), 2);
        assert_eq!(ss.cell_xfs.as_ref().unwrap().xfs.len(), 1);
        assert_eq!(
            ss.cell_xfs.as_ref().unwrap().xfs[0].num_fmt_id,
            Some(0)
        );
    }

    #[test]
    fn test_stylesheet_roundtrip() {
        let mut ss = StyleSheet::minimal();
        ss.num_fmts = Some(NumFmts {
            count: Some(1),
            num_fmts: vec![NumFmt {
                num_fmt_id: 164,
                format_code: "yyyy-mm-dd".to_string(),
            }],
        });
        let xml = quick_xml::se::to_string(&ss).unwrap();
        let parsed: StyleSheet = quick_xml::de::from_str(&xml).unwrap();
        assert_eq!(ss, parsed);
    }

    #[test]
    fn test_parse_real_excel_styles() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
  <numFmts count="1">
    <numFmt numFmtId="164" formatCode="yyyy\-mm\-dd"/>
  </numFmts>
  <fonts count="1"><font><sz val="11"/><name val="Calibri"/></font></fonts>
  <fills count="2"><fill><patternFill patternType="none"/></fill><fill><patternFill patternType="gray125"/></fill></fills>
  <borders count="1"><border><left/><right/><top/><bottom/><diagonal/></border></borders>
  <cellXfs count="2">
    <xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/>
    <xf numFmtId="14" fontId="0" fillId="0" borderId="0" xfId="0" applyNumberFormat="1"/>
  </cellXfs>
</styleSheet>"#;

        let parsed: StyleSheet = quick_xml::de::from_str(xml).unwrap();
        let num_fmts = parsed.num_fmts.unwrap();
        assert_eq!(num_fmts.num_fmts[0].num_fmt_id, 164);
        let xfs = &parsed.cell_xfs.unwrap().xfs;
        assert_eq!(xfs.len(), 2);
        assert_eq!(xfs[1].num_fmt_id, Some(14));
        assert_eq!(xfs[1].apply_number_format, Some(true));
    }
}
