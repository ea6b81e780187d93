use std::collections::BTreeMap;
use std::fs;
use std::io::{Cursor, Read, Seek, Write};
use std::path::Path;

use roxmltree::Document;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::error::{Error, Result};
use crate::xlsx::path::{rels_for_part, resolve_target};

pub(crate) const REL_NS: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

const CONTENT_TYPES_PART: &str = "[Content_Types].xml";
const WORKBOOK_PART: &str = "xl/workbook.xml";

/// An XLSX file held as raw OPC parts.
///
/// Only the parts we touch are rewritten; everything else in the template
/// (styles, themes, existing drawings, printer settings) is written back as-is.
#[derive(Debug, Clone, Default)]
pub struct XlsxPackage {
    parts: BTreeMap<String, Vec<u8>>,
}

/// One `<Relationship>` from a `.rels` part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    pub id: String,
    pub rel_type: String,
    pub target: String,
    pub external: bool,
}

impl XlsxPackage {
    /// Load a workbook from disk. The file is fully read and closed before returning.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        log::debug!("Loading workbook {}", path.display());
        let bytes = fs::read(path)?;
        Self::from_bytes(&bytes)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Self::from_reader(Cursor::new(bytes))
    }

    fn from_reader<R: Read + Seek>(reader: R) -> Result<Self> {
        let mut zip = ZipArchive::new(reader)?;
        let mut parts = BTreeMap::new();
        for i in 0..zip.len() {
            let mut file = zip.by_index(i)?;
            if !file.is_file() {
                continue;
            }
            let name = file.name().to_string();
            let mut buf = Vec::with_capacity(file.size() as usize);
            file.read_to_end(&mut buf)?;
            parts.insert(name, buf);
        }

        if !parts.contains_key(CONTENT_TYPES_PART) || !parts.contains_key(WORKBOOK_PART) {
            return Err(Error::InvalidTemplate(
                "missing [Content_Types].xml or xl/workbook.xml".to_string(),
            ));
        }
        Ok(Self { parts })
    }

    pub fn part(&self, name: &str) -> Option<&[u8]> {
        let name = name.strip_prefix('/').unwrap_or(name);
        self.parts.get(name).map(Vec::as_slice)
    }

    pub fn has_part(&self, name: &str) -> bool {
        self.part(name).is_some()
    }

    pub fn set_part(&mut self, name: impl Into<String>, bytes: Vec<u8>) {
        self.parts.insert(name.into(), bytes);
    }

    pub fn remove_part(&mut self, name: &str) -> Option<Vec<u8>> {
        self.parts.remove(name)
    }

    pub(crate) fn part_str(&self, name: &str) -> Result<&str> {
        let bytes = self
            .part(name)
            .ok_or_else(|| Error::InvalidTemplate(format!("missing part {name}")))?;
        std::str::from_utf8(bytes)
            .map_err(|e| Error::InvalidTemplate(format!("{name} is not UTF-8: {e}")))
    }

    /// Relationships declared for `source_part`; empty when it has no `.rels`.
    pub fn relationships(&self, source_part: &str) -> Result<Vec<Relationship>> {
        let rels_part = rels_for_part(source_part);
        if !self.has_part(&rels_part) {
            return Ok(Vec::new());
        }
        let doc = Document::parse(self.part_str(&rels_part)?)?;
        Ok(doc
            .descendants()
            .filter(|n| n.has_tag_name("Relationship"))
            .filter_map(|n| {
                Some(Relationship {
                    id: n.attribute("Id")?.to_string(),
                    rel_type: n.attribute("Type").unwrap_or_default().to_string(),
                    target: n.attribute("Target")?.to_string(),
                    external: n
                        .attribute("TargetMode")
                        .is_some_and(|m| m.eq_ignore_ascii_case("External")),
                })
            })
            .collect())
    }

    /// Append a relationship to `source_part`'s `.rels`, creating it if needed.
    /// Returns the new relationship id.
    pub fn add_relationship(&mut self, source_part: &str, rel_type: &str, target: &str) -> Result<String> {
        let existing = self.relationships(source_part)?;
        let next = existing
            .iter()
            .filter_map(|r| r.id.strip_prefix("rId")?.parse::<u32>().ok())
            .max()
            .unwrap_or(0)
            + 1;
        let id = format!("rId{next}");
        let element = format!(
            r#"<Relationship Id="{id}" Type="{}" Target="{}"/>"#,
            escape_attr(rel_type),
            escape_attr(target)
        );

        let rels_part = rels_for_part(source_part);
        let xml = if self.has_part(&rels_part) {
            insert_before_close(self.part_str(&rels_part)?, "Relationships", &element)?
        } else {
            format!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">{element}</Relationships>"#
            )
        };
        self.set_part(rels_part, xml.into_bytes());
        Ok(id)
    }

    /// Make sure `[Content_Types].xml` has a `<Default>` for `extension`.
    pub fn ensure_content_type_default(&mut self, extension: &str, content_type: &str) -> Result<()> {
        let updated = {
            let xml = self.part_str(CONTENT_TYPES_PART)?;
            let doc = Document::parse(xml)?;
            let present = doc.descendants().any(|n| {
                n.has_tag_name("Default")
                    && n.attribute("Extension")
                        .is_some_and(|e| e.eq_ignore_ascii_case(extension))
            });
            if present {
                return Ok(());
            }
            let element =
                format!(r#"<Default Extension="{extension}" ContentType="{content_type}"/>"#);
            insert_before_close(xml, "Types", &element)?
        };
        self.set_part(CONTENT_TYPES_PART, updated.into_bytes());
        Ok(())
    }

    /// Register a content type `<Override>` for `part_name`.
    pub fn ensure_content_type_override(&mut self, part_name: &str, content_type: &str) -> Result<()> {
        let part_name = format!("/{}", part_name.trim_start_matches('/'));
        let updated = {
            let xml = self.part_str(CONTENT_TYPES_PART)?;
            let doc = Document::parse(xml)?;
            let present = doc.descendants().any(|n| {
                n.has_tag_name("Override") && n.attribute("PartName") == Some(part_name.as_str())
            });
            if present {
                return Ok(());
            }
            let element =
                format!(r#"<Override PartName="{part_name}" ContentType="{content_type}"/>"#);
            insert_before_close(xml, "Types", &element)?
        };
        self.set_part(CONTENT_TYPES_PART, updated.into_bytes());
        Ok(())
    }

    /// Worksheet part of the sheet Excel opens on (`workbookView/@activeTab`,
    /// first sheet by default).
    pub fn active_worksheet_part(&self) -> Result<String> {
        let doc = Document::parse(self.part_str(WORKBOOK_PART)?)?;
        let active_tab = doc
            .descendants()
            .find(|n| n.has_tag_name("workbookView"))
            .and_then(|n| n.attribute("activeTab"))
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(0);

        let sheets: Vec<_> = doc.descendants().filter(|n| n.has_tag_name("sheet")).collect();
        let sheet = sheets
            .get(active_tab)
            .or_else(|| sheets.first())
            .ok_or_else(|| Error::InvalidTemplate("workbook has no sheets".to_string()))?;
        let rel_id = sheet
            .attribute((REL_NS, "id"))
            .ok_or_else(|| Error::InvalidTemplate("sheet without r:id".to_string()))?;

        let rel = self
            .relationships(WORKBOOK_PART)?
            .into_iter()
            .find(|r| r.id == rel_id)
            .ok_or_else(|| Error::InvalidTemplate(format!("no workbook relationship {rel_id}")))?;
        let part = resolve_target(WORKBOOK_PART, &rel.target);
        log::debug!(
            "Active sheet '{}' -> {}",
            sheet.attribute("name").unwrap_or_default(),
            part
        );
        Ok(part)
    }

    /// First unused `prefix{N}{suffix}` part name, N starting at 1.
    pub fn next_part_name(&self, prefix: &str, suffix: &str) -> String {
        (1u32..)
            .map(|n| format!("{prefix}{n}{suffix}"))
            .find(|name| !self.has_part(name))
            .unwrap_or_else(|| format!("{prefix}{suffix}"))
    }

    pub fn write_to<W: Write + Seek>(&self, w: W) -> Result<()> {
        let mut zip = ZipWriter::new(w);
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        // Content types first, as Excel writes it.
        if let Some(bytes) = self.parts.get(CONTENT_TYPES_PART) {
            zip.start_file(CONTENT_TYPES_PART, options)?;
            zip.write_all(bytes)?;
        }
        for (name, bytes) in &self.parts {
            if name == CONTENT_TYPES_PART {
                continue;
            }
            zip.start_file(name.as_str(), options)?;
            zip.write_all(bytes)?;
        }
        zip.finish()?;
        Ok(())
    }

    pub fn write_to_bytes(&self) -> Result<Vec<u8>> {
        let mut cursor = Cursor::new(Vec::new());
        self.write_to(&mut cursor)?;
        Ok(cursor.into_inner())
    }

    /// Persist to `path`. Safe when `path` is the file this package was read from.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let bytes = self.write_to_bytes()?;
        fs::write(path, bytes)?;
        log::debug!("Wrote workbook {}", path.display());
        Ok(())
    }
}

/// Insert `element` right before the closing tag of the root element `root`.
pub(crate) fn insert_before_close(xml: &str, root: &str, element: &str) -> Result<String> {
    let close_pos = find_close_tag(xml, root)
        .ok_or_else(|| Error::InvalidTemplate(format!("no closing </{root}> tag")))?;
    let mut out = String::with_capacity(xml.len() + element.len());
    out.push_str(&xml[..close_pos]);
    out.push_str(element);
    out.push_str(&xml[close_pos..]);
    Ok(out)
}

// Finds `</root>` or `</prefix:root>`, searching from the end.
pub(crate) fn find_close_tag(xml: &str, local_name: &str) -> Option<usize> {
    let mut search_end = xml.len();
    while let Some(pos) = xml[..search_end].rfind("</") {
        let rest = &xml[pos + 2..];
        let name_end = rest.find('>')?;
        let name = rest[..name_end].trim();
        let local = name.rsplit(':').next().unwrap_or(name);
        if local == local_name {
            return Some(pos);
        }
        search_end = pos;
    }
    None
}

pub(crate) fn escape_attr(value: &str) -> String {
    quick_xml::escape::escape(value).into_owned()
}
