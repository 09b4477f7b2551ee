//! OPC package assembly.
//!
//! The read side maps normalized part paths (leading `/`, case preserved)
//! to bytes, with the content-type table and the per-owner relationship
//! files parsed alongside. The write side is an ordered builder that
//! computes `[Content_Types].xml` from the declared parts and checks the
//! package invariants before any bytes are written.

use std::collections::{BTreeMap, HashMap};
use std::io::{Cursor, Read, Write};

use serde::Serialize;
use tabula_xml::content_types::{
    mime_types, ContentTypeDefault, ContentTypeOverride, ContentTypes,
};
use tabula_xml::relationships::{rel_types, Relationships};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::error::{Error, Result};

/// XML declaration prepended to every XML part in the package.
pub const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;

/// A read-only view of an opened package.
#[derive(Debug)]
pub struct Package {
    parts: BTreeMap<String, Vec<u8>>,
    content_types: ContentTypes,
    rels: HashMap<String, Relationships>,
}

impl Package {
    /// Read a package from `.xlsx` bytes. Every part is pulled into an
    /// owned buffer; relationship files are parsed eagerly.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let mut archive = ZipArchive::new(Cursor::new(data))
            .map_err(|e| Error::InvalidZip(e.to_string()))?;

        let mut parts: BTreeMap<String, Vec<u8>> = BTreeMap::new();
        for i in 0..archive.len() {
            let mut entry = archive
                .by_index(i)
                .map_err(|e| Error::InvalidZip(e.to_string()))?;
            if entry.is_dir() {
                continue;
            }
            let path = normalize_path(entry.name());
            let mut bytes = Vec::with_capacity(entry.size() as usize);
            entry
                .read_to_end(&mut bytes)
                .map_err(|e| Error::InvalidZip(e.to_string()))?;
            parts.insert(path, bytes);
        }

        let ct_bytes = parts
            .get("/[Content_Types].xml")
            .ok_or_else(|| Error::MissingRequiredPart("/[Content_Types].xml".to_string()))?;
        let content_types: ContentTypes = parse_xml("/[Content_Types].xml", ct_bytes)?;

        let mut rels: HashMap<String, Relationships> = HashMap::new();
        for (path, bytes) in &parts {
            if !path.ends_with(".rels") {
                continue;
            }
            let parsed: Relationships = parse_xml(path, bytes)?;
            rels.insert(rels_owner(path), parsed);
        }

        Ok(Self {
            parts,
            content_types,
            rels,
        })
    }

    /// Bytes of a part by normalized path.
    pub fn part(&self, path: &str) -> Option<&[u8]> {
        self.parts.get(path).map(|v| v.as_slice())
    }

    /// All part paths.
    pub fn part_names(&self) -> impl Iterator<Item = &str> {
        self.parts.keys().map(|s| s.as_str())
    }

    /// The effective content type of a part.
    pub fn content_type(&self, path: &str) -> Option<&str> {
        self.content_types.content_type_of(path)
    }

    /// Relationships owned by a part (`"/"` for the package root).
    pub fn rels(&self, owner: &str) -> Option<&Relationships> {
        self.rels.get(owner)
    }

    /// Deserialize an XML part, failing with `MissingRequiredPart` when the
    /// part is absent.
    pub fn read_xml<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T> {
        let bytes = self
            .part(path)
            .ok_or_else(|| Error::MissingRequiredPart(path.to_string()))?;
        parse_xml(path, bytes)
    }

    /// Resolve the package-root `officeDocument` relationship to the
    /// workbook part path.
    pub fn office_document_path(&self) -> Result<String> {
        let root = self
            .rels("/")
            .ok_or_else(|| Error::MissingRequiredPart("/_rels/.rels".to_string()))?;
        let rel = root
            .first_of_type(rel_types::OFFICE_DOCUMENT)
            .ok_or_else(|| Error::MissingRequiredPart("/xl/workbook.xml".to_string()))?;
        Ok(resolve_target("/", &rel.target))
    }

    /// Resolve a relationship id on `owner` to an absolute part path,
    /// verifying the target part exists.
    pub fn rel_target(&self, owner: &str, id: &str) -> Result<String> {
        let rels = self.rels(owner).ok_or_else(|| Error::InvalidRelationship {
            owner: owner.to_string(),
            id: id.to_string(),
            reason: "owner has no relationships part".to_string(),
        })?;
        let rel = rels.by_id(id).ok_or_else(|| Error::InvalidRelationship {
            owner: owner.to_string(),
            id: id.to_string(),
            reason: "no such id".to_string(),
        })?;
        let path = resolve_target(owner, &rel.target);
        if !self.parts.contains_key(&path) {
            return Err(Error::InvalidRelationship {
                owner: owner.to_string(),
                id: id.to_string(),
                reason: format!("target '{path}' does not exist"),
            });
        }
        Ok(path)
    }

    /// Find the first relationship of `rel_type` on `owner`, resolved to an
    /// absolute path.
    pub fn rel_target_of_type(&self, owner: &str, rel_type: &str) -> Option<String> {
        let rel = self.rels(owner)?.first_of_type(rel_type)?;
        Some(resolve_target(owner, &rel.target))
    }
}

/// Normalize a ZIP entry name to a leading-`/` part path, case preserved.
pub fn normalize_path(name: &str) -> String {
    let trimmed = name.trim_start_matches('/');
    format!("/{trimmed}")
}

/// The relationships part that describes `owner` (`"/"` for the root).
pub fn rels_path(owner: &str) -> String {
    if owner == "/" {
        return "/_rels/.rels".to_string();
    }
    match owner.rfind('/') {
        Some(pos) => format!("{}/_rels/{}.rels", &owner[..pos], &owner[pos + 1..]),
        None => format!("/_rels/{owner}.rels"),
    }
}

/// The owner part of a relationships file path.
pub fn rels_owner(rels_file: &str) -> String {
    if rels_file == "/_rels/.rels" {
        return "/".to_string();
    }
    let Some(pos) = rels_file.rfind("/_rels/") else {
        return "/".to_string();
    };
    let dir = &rels_file[..pos];
    let file = rels_file[pos + "/_rels/".len()..].trim_end_matches(".rels");
    format!("{dir}/{file}")
}

/// Resolve a relationship target against its owner's directory, collapsing
/// `.` and `..` segments. Targets are stored verbatim in the file; this is
/// the absolute form.
pub fn resolve_target(owner: &str, target: &str) -> String {
    if let Some(abs) = target.strip_prefix('/') {
        return format!("/{abs}");
    }
    let dir = match owner.rfind('/') {
        Some(0) | None => "",
        Some(pos) => &owner[1..pos],
    };
    let mut segments: Vec<&str> = dir.split('/').filter(|s| !s.is_empty()).collect();
    for seg in target.split('/') {
        match seg {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }
    format!("/{}", segments.join("/"))
}

fn parse_xml<T: serde::de::DeserializeOwned>(part: &str, bytes: &[u8]) -> Result<T> {
    let text = std::str::from_utf8(bytes).map_err(|e| Error::MalformedXml {
        part: part.to_string(),
        detail: e.to_string(),
    })?;
    quick_xml::de::from_str(text).map_err(|e| Error::MalformedXml {
        part: part.to_string(),
        detail: e.to_string(),
    })
}

/// Serialize a value to an XML part body with the standard declaration.
pub fn serialize_xml<T: Serialize>(value: &T) -> Result<String> {
    let body = quick_xml::se::to_string(value).map_err(|e| Error::MalformedXml {
        part: String::new(),
        detail: e.to_string(),
    })?;
    Ok(format!("{XML_DECLARATION}\n{body}"))
}

/// Ordered package writer. Parts are emitted in insertion order with the
/// content-type table computed and appended last.
pub struct PackageBuilder {
    parts: Vec<(String, Vec<u8>)>,
    overrides: Vec<ContentTypeOverride>,
    defaults: Vec<ContentTypeDefault>,
    rels: Vec<(String, Relationships)>,
}

impl PackageBuilder {
    /// Start a builder with the mandatory `rels` and `xml` defaults.
    pub fn new() -> Self {
        Self {
            parts: Vec::new(),
            overrides: Vec::new(),
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
            rels: Vec::new(),
        }
    }

    /// Add a typed XML part. `content_type` of `None` leaves the part on
    /// the `xml` extension default.
    pub fn add_xml_part<T: Serialize>(
        &mut self,
        path: &str,
        content_type: Option<&str>,
        value: &T,
    ) -> Result<()> {
        let xml = serialize_xml(value).map_err(|e| match e {
            Error::MalformedXml { detail, .. } => Error::MalformedXml {
                part: path.to_string(),
                detail,
            },
            other => other,
        })?;
        self.add_raw_part(path, content_type, xml.into_bytes())
    }

    /// Add a raw part (preserved theme, document properties, and other
    /// opaque payloads).
    pub fn add_raw_part(
        &mut self,
        path: &str,
        content_type: Option<&str>,
        bytes: Vec<u8>,
    ) -> Result<()> {
        let path = normalize_path(path);
        if self.parts.iter().any(|(p, _)| *p == path) {
            return Err(Error::InvalidZip(format!("duplicate part {path}")));
        }
        if let Some(ct) = content_type {
            let by_default = self
                .defaults
                .iter()
                .find(|d| path.rsplit('.').next().is_some_and(|e| e.eq_ignore_ascii_case(&d.extension)))
                .map(|d| d.content_type.as_str());
            if by_default != Some(ct) {
                self.overrides.push(ContentTypeOverride {
                    part_name: path.clone(),
                    content_type: ct.to_string(),
                });
            }
        }
        self.parts.push((path, bytes));
        Ok(())
    }

    /// Add a relationships file for `owner`. Serialized at `finish` time so
    /// target checks see the full part set.
    pub fn add_rels(&mut self, owner: &str, rels: Relationships) {
        self.rels.push((owner.to_string(), rels));
    }

    /// Validate the package invariants and produce the ZIP bytes.
    ///
    /// Checks performed before anything is written: every relationship
    /// target resolves to a declared part (external targets excepted), and
    /// every content-type override names a real part.
    pub fn finish(mut self) -> Result<Vec<u8>> {
        for (owner, rels) in &self.rels {
            let mut seen = std::collections::HashSet::new();
            for rel in &rels.relationships {
                if !seen.insert(rel.id.clone()) {
                    return Err(Error::InvalidRelationship {
                        owner: owner.clone(),
                        id: rel.id.clone(),
                        reason: "duplicate id".to_string(),
                    });
                }
                if rel.target_mode.as_deref() == Some("External") {
                    continue;
                }
                let target = resolve_target(owner, &rel.target);
                if !self.parts.iter().any(|(p, _)| *p == target) {
                    return Err(Error::InvalidRelationship {
                        owner: owner.clone(),
                        id: rel.id.clone(),
                        reason: format!("target '{target}' does not exist"),
                    });
                }
            }
        }
        for ovr in &self.overrides {
            if !self.parts.iter().any(|(p, _)| *p == ovr.part_name) {
                return Err(Error::MissingRequiredPart(ovr.part_name.clone()));
            }
        }

        // Relationship files become parts now that validation has passed.
        let rels = std::mem::take(&mut self.rels);
        for (owner, r) in rels {
            let path = rels_path(&owner);
            let xml = serialize_xml(&r)?;
            self.parts.push((path, xml.into_bytes()));
        }

        let content_types = ContentTypes {
            xmlns: tabula_xml::namespaces::CONTENT_TYPES.to_string(),
            defaults: self.defaults.clone(),
            overrides: self.overrides.clone(),
        };

        let mut buf = Vec::new();
        {
            let mut writer = ZipWriter::new(Cursor::new(&mut buf));
            let options =
                SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
            for (path, bytes) in &self.parts {
                writer
                    .start_file(path.trim_start_matches('/'), options)
                    .map_err(|e| Error::InvalidZip(e.to_string()))?;
                writer.write_all(bytes)?;
            }
            let ct_xml = serialize_xml(&content_types)?;
            writer
                .start_file("[Content_Types].xml", options)
                .map_err(|e| Error::InvalidZip(e.to_string()))?;
            writer.write_all(ct_xml.as_bytes())?;
            writer.finish().map_err(|e| Error::InvalidZip(e.to_string()))?;
        }
        Ok(buf)
    }
}

impl Default for PackageBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tabula_xml::relationships::Relationship;

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path("xl/workbook.xml"), "/xl/workbook.xml");
        assert_eq!(normalize_path("/xl/workbook.xml"), "/xl/workbook.xml");
    }

    #[test]
    fn test_rels_path_round_trip() {
        assert_eq!(rels_path("/"), "/_rels/.rels");
        assert_eq!(rels_path("/xl/workbook.xml"), "/xl/_rels/workbook.xml.rels");
        assert_eq!(
            rels_path("/xl/worksheets/sheet2.xml"),
            "/xl/worksheets/_rels/sheet2.xml.rels"
        );

        assert_eq!(rels_owner("/_rels/.rels"), "/");
        assert_eq!(rels_owner("/xl/_rels/workbook.xml.rels"), "/xl/workbook.xml");
    }

    #[test]
    fn test_resolve_target() {
        assert_eq!(resolve_target("/", "xl/workbook.xml"), "/xl/workbook.xml");
        assert_eq!(
            resolve_target("/xl/workbook.xml", "worksheets/sheet1.xml"),
            "/xl/worksheets/sheet1.xml"
        );
        assert_eq!(
            resolve_target("/xl/workbook.xml", "sharedStrings.xml"),
            "/xl/sharedStrings.xml"
        );
        assert_eq!(
            resolve_target("/xl/worksheets/sheet1.xml", "../theme/theme1.xml"),
            "/xl/theme/theme1.xml"
        );
        assert_eq!(
            resolve_target("/xl/workbook.xml", "/docProps/core.xml"),
            "/docProps/core.xml"
        );
    }

    fn minimal_package_bytes() -> Vec<u8> {
        let mut builder = PackageBuilder::new();
        let mut root = Relationships::empty();
        root.push_next(rel_types::OFFICE_DOCUMENT, "xl/workbook.xml");
        builder
            .add_raw_part(
                "/xl/workbook.xml",
                Some(mime_types::WORKBOOK),
                br#"<?xml version="1.0"?><workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets/></workbook>"#.to_vec(),
            )
            .unwrap();
        builder.add_rels("/", root);
        builder.finish().unwrap()
    }

    #[test]
    fn test_builder_roundtrip_through_reader() {
        let bytes = minimal_package_bytes();
        let pkg = Package::from_bytes(&bytes).unwrap();
        assert!(pkg.part("/xl/workbook.xml").is_some());
        assert_eq!(
            pkg.content_type("/xl/workbook.xml"),
            Some(mime_types::WORKBOOK)
        );
        assert_eq!(pkg.office_document_path().unwrap(), "/xl/workbook.xml");
        // Every entry except the content-types part is declared.
        for name in pkg.part_names() {
            if name == "/[Content_Types].xml" {
                continue;
            }
            assert!(pkg.content_type(name).is_some(), "undeclared part {name}");
        }
    }

    #[test]
    fn test_missing_content_types_rejected() {
        let mut buf = Vec::new();
        {
            let mut writer = ZipWriter::new(Cursor::new(&mut buf));
            let options = SimpleFileOptions::default();
            writer.start_file("hello.txt", options).unwrap();
            writer.write_all(b"hi").unwrap();
            writer.finish().unwrap();
        }
        let err = Package::from_bytes(&buf).unwrap_err();
        assert!(matches!(err, Error::MissingRequiredPart(p) if p == "/[Content_Types].xml"));
    }

    #[test]
    fn test_not_a_zip_rejected() {
        assert!(matches!(
            Package::from_bytes(b"definitely not a zip"),
            Err(Error::InvalidZip(_))
        ));
    }

    #[test]
    fn test_missing_office_document_rel() {
        let mut builder = PackageBuilder::new();
        builder
            .add_raw_part("/xl/data.xml", None, b"<data/>".to_vec())
            .unwrap();
        builder.add_rels("/", Relationships::empty());
        let bytes = builder.finish().unwrap();
        let pkg = Package::from_bytes(&bytes).unwrap();
        assert!(matches!(
            pkg.office_document_path(),
            Err(Error::MissingRequiredPart(_))
        ));
    }

    #[test]
    fn test_builder_rejects_dangling_rel_target() {
        let mut builder = PackageBuilder::new();
        let mut root = Relationships::empty();
        root.push_next(rel_types::OFFICE_DOCUMENT, "xl/workbook.xml");
        builder.add_rels("/", root);
        let err = builder.finish().unwrap_err();
        assert!(matches!(err, Error::InvalidRelationship { .. }));
    }

    #[test]
    fn test_builder_rejects_duplicate_rel_ids() {
        let mut builder = PackageBuilder::new();
        builder
            .add_raw_part("/a.xml", None, b"<a/>".to_vec())
            .unwrap();
        let rels = Relationships {
            xmlns: tabula_xml::namespaces::PACKAGE_RELATIONSHIPS.to_string(),
            relationships: vec![
                Relationship {
                    id: "rId1".to_string(),
                    rel_type: "t".to_string(),
                    target: "a.xml".to_string(),
                    target_mode: None,
                },
                Relationship {
                    id: "rId1".to_string(),
                    rel_type: "t".to_string(),
                    target: "a.xml".to_string(),
                    target_mode: None,
                },
            ],
        };
        builder.add_rels("/", rels);
        assert!(matches!(
            builder.finish(),
            Err(Error::InvalidRelationship { .. })
        ));
    }

    #[test]
    fn test_builder_rejects_duplicate_parts() {
        let mut builder = PackageBuilder::new();
        builder.add_raw_part("/a.xml", None, b"<a/>".to_vec()).unwrap();
        assert!(builder
            .add_raw_part("/a.xml", None, b"<a/>".to_vec())
            .is_err());
    }

    #[test]
    fn test_external_targets_skip_existence_check() {
        let mut builder = PackageBuilder::new();
        builder.add_raw_part("/a.xml", None, b"<a/>".to_vec()).unwrap();
        let rels = Relationships {
            xmlns: tabula_xml::namespaces::PACKAGE_RELATIONSHIPS.to_string(),
            relationships: vec![Relationship {
                id: "rId1".to_string(),
                rel_type: "t".to_string(),
                target: "https://example.com/x".to_string(),
                target_mode: Some("External".to_string()),
            }],
        };
        builder.add_rels("/", rels);
        assert!(builder.finish().is_ok());
    }
}
