//! Picture insertion into a worksheet's DrawingML part.

use roxmltree::Document;

use crate::error::{Error, Result};
use crate::xlsx::cell::CellRef;
use crate::xlsx::package::{REL_NS, XlsxPackage, escape_attr, find_close_tag, insert_before_close};
use crate::xlsx::path::{relative_target, resolve_target};

const XDR_NS: &str = "http://schemas.openxmlformats.org/drawingml/2006/spreadsheetDrawing";
const A_NS: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
const DRAWING_REL: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/drawing";
const IMAGE_REL: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image";
const DRAWING_CONTENT_TYPE: &str = "application/vnd.openxmlformats-officedocument.drawing+xml";

/// EMUs per pixel at 96 DPI.
pub const EMU_PER_PIXEL: f64 = 9525.0;

// Worksheet children that must come after <drawing> (CT_Worksheet order).
const AFTER_DRAWING: &[&str] = &[
    "legacyDrawing",
    "legacyDrawingHF",
    "drawingHF",
    "picture",
    "oleObjects",
    "controls",
    "webPublishItems",
    "tableParts",
    "extLst",
];

/// An encoded image plus its on-sheet size.
#[derive(Debug, Clone)]
pub struct Picture {
    pub bytes: Vec<u8>,
    /// Lowercase file extension without the dot, e.g. `png`.
    pub extension: String,
    pub width_emu: u64,
    pub height_emu: u64,
}

impl Picture {
    /// Size a picture from pixel dimensions.
    pub fn from_pixels(bytes: Vec<u8>, extension: &str, width_px: f64, height_px: f64) -> Self {
        Self {
            bytes,
            extension: extension.to_ascii_lowercase(),
            width_emu: (width_px * EMU_PER_PIXEL).round() as u64,
            height_emu: (height_px * EMU_PER_PIXEL).round() as u64,
        }
    }
}

pub fn content_type_for_extension(ext: &str) -> Option<&'static str> {
    match ext {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "bmp" => Some("image/bmp"),
        _ => None,
    }
}

/// Place `picture` on `sheet_part` with its top-left corner at `anchor`.
///
/// Appends to the sheet's existing drawing when there is one, otherwise creates
/// a new drawing part and links it from the worksheet.
pub fn add_picture(
    pkg: &mut XlsxPackage,
    sheet_part: &str,
    picture: Picture,
    anchor: CellRef,
) -> Result<()> {
    let Picture {
        bytes,
        extension,
        width_emu,
        height_emu,
    } = picture;
    let content_type = content_type_for_extension(&extension).ok_or_else(|| {
        Error::InvalidTemplate(format!("unsupported picture type .{extension}"))
    })?;

    let media_part = pkg.next_part_name("xl/media/image", &format!(".{extension}"));
    pkg.set_part(media_part.clone(), bytes);
    pkg.ensure_content_type_default(&extension, content_type)?;

    let drawing_part = match existing_drawing_part(pkg, sheet_part)? {
        Some(part) => part,
        None => create_drawing_part(pkg, sheet_part)?,
    };

    let embed_id = pkg.add_relationship(
        &drawing_part,
        IMAGE_REL,
        &relative_target(&drawing_part, &media_part),
    )?;

    let updated = {
        let xml = pkg.part_str(&drawing_part)?;
        let object_id = next_object_id(xml)?;
        let anchor_xml = build_anchor_xml(anchor, object_id, &embed_id, (width_emu, height_emu));
        insert_before_close(xml, "wsDr", &anchor_xml)?
    };
    pkg.set_part(drawing_part.clone(), updated.into_bytes());

    log::debug!(
        "Anchored {} at {} in {}",
        media_part,
        anchor.to_a1(),
        drawing_part
    );
    Ok(())
}

fn existing_drawing_part(pkg: &XlsxPackage, sheet_part: &str) -> Result<Option<String>> {
    let rel_id = {
        let doc = Document::parse(pkg.part_str(sheet_part)?)?;
        let found = doc
            .root_element()
            .children()
            .find(|n| n.has_tag_name("drawing"))
            .and_then(|n| n.attribute((REL_NS, "id")))
            .map(str::to_string);
        found
    };
    let Some(rel_id) = rel_id else {
        return Ok(None);
    };

    let rel = pkg
        .relationships(sheet_part)?
        .into_iter()
        .find(|r| r.id == rel_id && !r.external)
        .ok_or_else(|| Error::InvalidTemplate(format!("dangling drawing relationship {rel_id}")))?;
    let part = resolve_target(sheet_part, &rel.target);
    if !pkg.has_part(&part) {
        return Err(Error::InvalidTemplate(format!("missing drawing part {part}")));
    }
    Ok(Some(part))
}

fn create_drawing_part(pkg: &mut XlsxPackage, sheet_part: &str) -> Result<String> {
    let drawing_part = pkg.next_part_name("xl/drawings/drawing", ".xml");
    let xml = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<xdr:wsDr xmlns:xdr="{XDR_NS}" xmlns:a="{A_NS}"></xdr:wsDr>"#
    );
    pkg.set_part(drawing_part.clone(), xml.into_bytes());
    pkg.ensure_content_type_override(&drawing_part, DRAWING_CONTENT_TYPE)?;

    let rel_id = pkg.add_relationship(
        sheet_part,
        DRAWING_REL,
        &relative_target(sheet_part, &drawing_part),
    )?;

    let updated = {
        let sheet_xml = pkg.part_str(sheet_part)?;
        let doc = Document::parse(sheet_xml)?;
        let root = doc.root_element();
        let tag = match root.tag_name().namespace().and_then(|ns| root.lookup_prefix(ns)) {
            Some(prefix) if !prefix.is_empty() => format!("{prefix}:drawing"),
            _ => "drawing".to_string(),
        };
        let element = format!(r#"<{tag} xmlns:r="{REL_NS}" r:id="{}"/>"#, escape_attr(&rel_id));

        let insert_at = root
            .children()
            .filter(|n| n.is_element())
            .find(|n| AFTER_DRAWING.contains(&n.tag_name().name()))
            .map(|n| n.range().start)
            .or_else(|| find_close_tag(sheet_xml, root.tag_name().name()))
            .ok_or_else(|| Error::InvalidTemplate(format!("cannot place drawing in {sheet_part}")))?;

        let mut out = String::with_capacity(sheet_xml.len() + element.len());
        out.push_str(&sheet_xml[..insert_at]);
        out.push_str(&element);
        out.push_str(&sheet_xml[insert_at..]);
        out
    };
    pkg.set_part(sheet_part, updated.into_bytes());

    log::debug!("Created {} for {}", drawing_part, sheet_part);
    Ok(drawing_part)
}

fn next_object_id(drawing_xml: &str) -> Result<u32> {
    let doc = Document::parse(drawing_xml)?;
    let max = doc
        .descendants()
        .filter(|n| n.has_tag_name("cNvPr"))
        .filter_map(|n| n.attribute("id")?.parse::<u32>().ok())
        .max()
        .unwrap_or(1);
    Ok(max + 1)
}

fn build_anchor_xml(anchor: CellRef, object_id: u32, embed_id: &str, size_emu: (u64, u64)) -> String {
    let (cx, cy) = size_emu;
    let mut out = String::new();
    out.push_str(&format!(
        r#"<xdr:oneCellAnchor xmlns:xdr="{XDR_NS}" xmlns:a="{A_NS}" xmlns:r="{REL_NS}">"#
    ));
    out.push_str(&format!(
        "<xdr:from><xdr:col>{}</xdr:col><xdr:colOff>0</xdr:colOff><xdr:row>{}</xdr:row><xdr:rowOff>0</xdr:rowOff></xdr:from>",
        anchor.col, anchor.row
    ));
    out.push_str(&format!(r#"<xdr:ext cx="{cx}" cy="{cy}"/>"#));
    out.push_str(&format!(
        r#"<xdr:pic><xdr:nvPicPr><xdr:cNvPr id="{object_id}" name="Picture {object_id}"/><xdr:cNvPicPr><a:picLocks noChangeAspect="1"/></xdr:cNvPicPr></xdr:nvPicPr><xdr:blipFill><a:blip r:embed="{embed_id}"/><a:stretch><a:fillRect/></a:stretch></xdr:blipFill><xdr:spPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="{cx}" cy="{cy}"/></a:xfrm><a:prstGeom prst="rect"><a:avLst/></a:prstGeom></xdr:spPr></xdr:pic>"#
    ));
    out.push_str("<xdr:clientData/></xdr:oneCellAnchor>");
    out
}
