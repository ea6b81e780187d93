//! Shared fixtures: a tiny DHD-like template workbook and component images.

#![allow(dead_code)]

use std::io::{Cursor, Read, Write};
use std::path::Path;

use image::{Rgba, RgbaImage};
use zip::write::SimpleFileOptions;
use zip::{ZipArchive, ZipWriter};

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/><Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/><Override PartName="/xl/worksheets/sheet2.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/><Override PartName="/xl/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml"/></Types>"#;

const ROOT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/></Relationships>"#;

const WORKBOOK: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><bookViews><workbookView/></bookViews><sheets><sheet name="DHD" sheetId="1" r:id="rId1"/><sheet name="Notes" sheetId="2" r:id="rId2"/></sheets></workbook>"#;

const WORKBOOK_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/><Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet2.xml"/><Relationship Id="rId3" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/></Relationships>"#;

const STYLES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><fonts count="1"><font/></fonts><fills count="1"><fill/></fills><borders count="1"><border/></borders><cellXfs count="2"><xf/><xf fontId="0"/></cellXfs></styleSheet>"#;

/// The schematic sheet: header labels in row 5, a styled well-name cell, and
/// pre-formatted empty cells in the first component row.
pub const SHEET1: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><dimension ref="A1:H6"/><sheetData><row r="2"><c r="C2" t="inlineStr"><is><t>Well:</t></is></c><c r="D2" s="1"/></row><row r="5"><c r="E5" s="1"/><c r="F5" s="1"/><c r="G5" s="1"/><c r="H5" s="1"/></row><row r="6"><c r="C6" s="1"/><c r="D6" s="1"/></row></sheetData><pageMargins left="0.7" right="0.7" top="0.75" bottom="0.75" header="0.3" footer="0.3"/></worksheet>"#;

const SHEET2: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData/></worksheet>"#;

fn write_parts(parts: &[(&str, &str)]) -> Vec<u8> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();
    for (name, body) in parts {
        zip.start_file(*name, options).unwrap();
        zip.write_all(body.as_bytes()).unwrap();
    }
    zip.finish().unwrap().into_inner()
}

pub fn template_parts() -> Vec<(&'static str, &'static str)> {
    vec![
        ("[Content_Types].xml", CONTENT_TYPES),
        ("_rels/.rels", ROOT_RELS),
        ("xl/workbook.xml", WORKBOOK),
        ("xl/_rels/workbook.xml.rels", WORKBOOK_RELS),
        ("xl/styles.xml", STYLES),
        ("xl/worksheets/sheet1.xml", SHEET1),
        ("xl/worksheets/sheet2.xml", SHEET2),
    ]
}

/// Write the fixture template to `path`.
pub fn write_template(path: &Path) {
    std::fs::write(path, write_parts(&template_parts())).unwrap();
}

/// Same template, but the schematic sheet already carries a logo drawing.
pub fn write_template_with_logo(path: &Path) {
    const SHEET_WITH_DRAWING: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheetData/><pageMargins left="0.7" right="0.7" top="0.75" bottom="0.75" header="0.3" footer="0.3"/><drawing r:id="rId1"/></worksheet>"#;
    const SHEET_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/drawing" Target="../drawings/drawing1.xml"/></Relationships>"#;
    const DRAWING: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<xdr:wsDr xmlns:xdr="http://schemas.openxmlformats.org/drawingml/2006/spreadsheetDrawing" xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main"><xdr:oneCellAnchor><xdr:from><xdr:col>7</xdr:col><xdr:colOff>0</xdr:colOff><xdr:row>0</xdr:row><xdr:rowOff>0</xdr:rowOff></xdr:from><xdr:ext cx="10" cy="10"/><xdr:pic><xdr:nvPicPr><xdr:cNvPr id="2" name="Logo"/><xdr:cNvPicPr/></xdr:nvPicPr><xdr:blipFill><a:blip xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" r:embed="rId1"/></xdr:blipFill><xdr:spPr/></xdr:pic><xdr:clientData/></xdr:oneCellAnchor></xdr:wsDr>"#;
    const DRAWING_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/image" Target="../media/image1.png"/></Relationships>"#;

    let mut parts: Vec<(&str, &str)> = template_parts()
        .into_iter()
        .filter(|(name, _)| *name != "xl/worksheets/sheet1.xml")
        .collect();
    parts.push(("xl/worksheets/sheet1.xml", SHEET_WITH_DRAWING));
    parts.push(("xl/worksheets/_rels/sheet1.xml.rels", SHEET_RELS));
    parts.push(("xl/drawings/drawing1.xml", DRAWING));
    parts.push(("xl/drawings/_rels/drawing1.xml.rels", DRAWING_RELS));
    parts.push(("xl/media/image1.png", "placeholder"));
    std::fs::write(path, write_parts(&parts)).unwrap();
}

/// Read one part of a written workbook as text.
pub fn read_part(path: &Path, name: &str) -> Option<String> {
    let bytes = std::fs::read(path).unwrap();
    let mut zip = ZipArchive::new(Cursor::new(bytes)).unwrap();
    let mut file = zip.by_name(name).ok()?;
    let mut out = String::new();
    file.read_to_string(&mut out).unwrap();
    Some(out)
}

pub fn part_names(path: &Path) -> Vec<String> {
    let bytes = std::fs::read(path).unwrap();
    let zip = ZipArchive::new(Cursor::new(bytes)).unwrap();
    zip.file_names().map(str::to_string).collect()
}

pub fn solid(width: u32, height: u32, shade: u8) -> RgbaImage {
    RgbaImage::from_pixel(width, height, Rgba([shade, shade, shade, 255]))
}

/// Write `name.png` images of the given sizes into `dir`.
pub fn write_component_images(dir: &Path, images: &[(&str, u32, u32)]) {
    for (i, (name, w, h)) in images.iter().enumerate() {
        solid(*w, *h, 40 + i as u8 * 40)
            .save(dir.join(format!("{name}.png")))
            .unwrap();
    }
}

pub const REPORT_JSON: &str = r#"{
    "well_name": "Acracia # 1",
    "length_unit": "m",
    "depth_unit": "m",
    "inner_diameter_unit": "in",
    "end_of_tailpipe_depth": 2450.5,
    "components": [
        {"item_id": 1, "name": "TUBING HANGER", "length": 0.3, "depth": 12.0,
         "inner_diameter": 2.441, "outer_diameter": 2.875, "mapped_name": "Tubing Hanger"},
        {"item_id": 2, "name": "PUP JOINT", "length": 1.8, "depth": 13.8,
         "inner_diameter": 2.441, "outer_diameter": 2.875, "mapped_name": null},
        {"item_id": 3, "name": "PACKER 7\"", "length": 2.1, "depth": 15.9,
         "inner_diameter": "2 3/8", "outer_diameter": 5.875, "mapped_name": "Packer"},
        {"item_id": 4, "name": "WIRELINE ENTRY GUIDE", "length": 0.2, "depth": 16.1,
         "inner_diameter": null, "outer_diameter": null, "mapped_name": "Mule Shoe"}
    ]
}"#;
