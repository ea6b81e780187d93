//! Streaming cell patches for worksheet XML.
//!
//! The worksheet part is copied event by event; only the targeted `<c>` elements
//! are replaced, and rows that do not exist yet are inserted in order. Existing
//! cell styles (`s`) are kept so the template's formatting survives.

use std::collections::BTreeMap;

use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use crate::error::{Error, Result};
use crate::xlsx::cell::{CellPatch, CellRef};

/// Pending cell edits for one worksheet, ordered row-major.
#[derive(Debug, Clone, Default)]
pub struct SheetPatches {
    cells: BTreeMap<(u32, u32), CellPatch>,
}

impl SheetPatches {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the edit for `cell`; the last write to a cell wins.
    pub fn set(&mut self, cell: CellRef, patch: CellPatch) {
        self.cells.insert((cell.row, cell.col), patch);
    }

    pub fn get(&self, cell: CellRef) -> Option<&CellPatch> {
        self.cells.get(&(cell.row, cell.col))
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    // Keyed by 1-based row number, as in the XML.
    fn by_row(&self) -> BTreeMap<u32, Vec<(u32, &CellPatch)>> {
        let mut out: BTreeMap<u32, Vec<(u32, &CellPatch)>> = BTreeMap::new();
        for (&(row, col), patch) in &self.cells {
            out.entry(row + 1).or_default().push((col, patch));
        }
        out
    }
}

/// Result of patching one worksheet part.
#[derive(Debug)]
pub struct PatchedSheet {
    pub xml: Vec<u8>,
    /// An overwritten cell held a formula, so `calcChain.xml` is stale.
    pub replaced_formula: bool,
}

type RowPatches<'a> = BTreeMap<u32, Vec<(u32, &'a CellPatch)>>;

pub fn patch_worksheet_xml(original: &[u8], patches: &SheetPatches) -> Result<PatchedSheet> {
    let rows = patches.by_row();
    let mut reader = Reader::from_reader(original);
    reader.config_mut().trim_text(false);
    let mut writer = Writer::new(Vec::with_capacity(original.len() + patches.len() * 64));

    let mut buf = Vec::new();
    let mut saw_sheet_data = false;
    let mut replaced_formula = false;
    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) if e.local_name().as_ref() == b"sheetData" => {
                saw_sheet_data = true;
                writer.write_event(Event::Start(e.into_owned()))?;
                replaced_formula |= patch_sheet_data(&mut reader, &mut writer, &rows)?;
            }
            Event::Empty(e) if e.local_name().as_ref() == b"sheetData" => {
                saw_sheet_data = true;
                if rows.is_empty() {
                    writer.write_event(Event::Empty(e.into_owned()))?;
                } else {
                    writer.write_event(Event::Start(e.into_owned()))?;
                    for (&row, cells) in &rows {
                        write_new_row(&mut writer, row, cells)?;
                    }
                    writer.write_event(Event::End(BytesEnd::new("sheetData")))?;
                }
            }
            Event::End(e) if e.local_name().as_ref() == b"worksheet" => {
                if !saw_sheet_data && !rows.is_empty() {
                    writer.write_event(Event::Start(BytesStart::new("sheetData")))?;
                    for (&row, cells) in &rows {
                        write_new_row(&mut writer, row, cells)?;
                    }
                    writer.write_event(Event::End(BytesEnd::new("sheetData")))?;
                }
                writer.write_event(Event::End(e.into_owned()))?;
            }
            Event::Eof => break,
            ev => writer.write_event(ev.into_owned())?,
        }
        buf.clear();
    }

    Ok(PatchedSheet {
        xml: writer.into_inner(),
        replaced_formula,
    })
}

fn patch_sheet_data(
    reader: &mut Reader<&[u8]>,
    writer: &mut Writer<Vec<u8>>,
    rows: &RowPatches<'_>,
) -> Result<bool> {
    let mut pending = rows.iter().peekable();
    let mut last_row = 0u32;
    let mut replaced_formula = false;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) if e.local_name().as_ref() == b"row" => {
                let (start, row_num) = with_row_number(e.into_owned(), last_row)?;
                last_row = row_num;
                while let Some((&row, cells)) = pending.next_if(|(r, _)| **r < row_num) {
                    write_new_row(writer, row, cells)?;
                }
                writer.write_event(Event::Start(start))?;
                if let Some((_, cells)) = pending.next_if(|(r, _)| **r == row_num) {
                    replaced_formula |= patch_row(reader, writer, row_num, cells)?;
                }
            }
            Event::Empty(e) if e.local_name().as_ref() == b"row" => {
                let (start, row_num) = with_row_number(e.into_owned(), last_row)?;
                last_row = row_num;
                while let Some((&row, cells)) = pending.next_if(|(r, _)| **r < row_num) {
                    write_new_row(writer, row, cells)?;
                }
                if let Some((_, cells)) = pending.next_if(|(r, _)| **r == row_num) {
                    writer.write_event(Event::Start(start))?;
                    for (col, patch) in cells {
                        write_cell(writer, row_num, *col, patch, None)?;
                    }
                    writer.write_event(Event::End(BytesEnd::new("row")))?;
                } else {
                    writer.write_event(Event::Empty(start))?;
                }
            }
            Event::End(e) if e.local_name().as_ref() == b"sheetData" => {
                for (&row, cells) in pending.by_ref() {
                    write_new_row(writer, row, cells)?;
                }
                writer.write_event(Event::End(e.into_owned()))?;
                break;
            }
            Event::Eof => {
                return Err(Error::InvalidTemplate(
                    "worksheet ended inside <sheetData>".to_string(),
                ));
            }
            ev => writer.write_event(ev.into_owned())?,
        }
        buf.clear();
    }

    Ok(replaced_formula)
}

// Called after the row's start tag has been written; writes through `</row>`.
fn patch_row(
    reader: &mut Reader<&[u8]>,
    writer: &mut Writer<Vec<u8>>,
    row_num: u32,
    cells: &[(u32, &CellPatch)],
) -> Result<bool> {
    let mut idx = 0usize;
    let mut last_col: Option<u32> = None;
    let mut replaced_formula = false;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) if e.local_name().as_ref() == b"c" => {
                let start = e.into_owned();
                let col = cell_column(&start)?.unwrap_or_else(|| last_col.map_or(0, |c| c + 1));
                last_col = Some(col);
                while idx < cells.len() && cells[idx].0 < col {
                    write_cell(writer, row_num, cells[idx].0, cells[idx].1, None)?;
                    idx += 1;
                }
                if idx < cells.len() && cells[idx].0 == col {
                    let style = attribute(&start, b"s")?;
                    replaced_formula |= skip_cell_body(reader)?;
                    write_cell(writer, row_num, col, cells[idx].1, style.as_deref())?;
                    idx += 1;
                } else {
                    writer.write_event(Event::Start(start))?;
                }
            }
            Event::Empty(e) if e.local_name().as_ref() == b"c" => {
                let start = e.into_owned();
                let col = cell_column(&start)?.unwrap_or_else(|| last_col.map_or(0, |c| c + 1));
                last_col = Some(col);
                while idx < cells.len() && cells[idx].0 < col {
                    write_cell(writer, row_num, cells[idx].0, cells[idx].1, None)?;
                    idx += 1;
                }
                if idx < cells.len() && cells[idx].0 == col {
                    let style = attribute(&start, b"s")?;
                    write_cell(writer, row_num, col, cells[idx].1, style.as_deref())?;
                    idx += 1;
                } else {
                    writer.write_event(Event::Empty(start))?;
                }
            }
            Event::End(e) if e.local_name().as_ref() == b"row" => {
                for (col, patch) in &cells[idx..] {
                    write_cell(writer, row_num, *col, patch, None)?;
                }
                writer.write_event(Event::End(e.into_owned()))?;
                break;
            }
            Event::Eof => {
                return Err(Error::InvalidTemplate(format!(
                    "worksheet ended inside row {row_num}"
                )));
            }
            ev => writer.write_event(ev.into_owned())?,
        }
        buf.clear();
    }

    Ok(replaced_formula)
}

// Consumes a cell's children up to `</c>`; reports whether it had a formula.
fn skip_cell_body(reader: &mut Reader<&[u8]>) -> Result<bool> {
    let mut buf = Vec::new();
    let mut depth = 1usize;
    let mut had_formula = false;
    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => {
                if depth == 1 && e.local_name().as_ref() == b"f" {
                    had_formula = true;
                }
                depth += 1;
            }
            Event::Empty(e) => {
                if depth == 1 && e.local_name().as_ref() == b"f" {
                    had_formula = true;
                }
            }
            Event::End(_) => {
                depth -= 1;
                if depth == 0 {
                    break;
                }
            }
            Event::Eof => {
                return Err(Error::InvalidTemplate("worksheet ended inside a cell".to_string()));
            }
            _ => {}
        }
        buf.clear();
    }
    Ok(had_formula)
}

fn write_new_row(writer: &mut Writer<Vec<u8>>, row_num: u32, cells: &[(u32, &CellPatch)]) -> Result<()> {
    let mut start = BytesStart::new("row");
    start.push_attribute(("r", row_num.to_string().as_str()));
    writer.write_event(Event::Start(start))?;
    for (col, patch) in cells {
        write_cell(writer, row_num, *col, patch, None)?;
    }
    writer.write_event(Event::End(BytesEnd::new("row")))?;
    Ok(())
}

fn write_cell(
    writer: &mut Writer<Vec<u8>>,
    row_num: u32,
    col: u32,
    patch: &CellPatch,
    style: Option<&str>,
) -> Result<()> {
    let a1 = CellRef::new(row_num - 1, col).to_a1();
    let mut start = BytesStart::new("c");
    start.push_attribute(("r", a1.as_str()));
    if let Some(style) = style {
        start.push_attribute(("s", style));
    }

    match patch {
        CellPatch::Clear => {
            writer.write_event(Event::Empty(start))?;
        }
        CellPatch::Number(n) => {
            writer.write_event(Event::Start(start))?;
            writer.write_event(Event::Start(BytesStart::new("v")))?;
            writer.write_event(Event::Text(BytesText::new(&n.to_string())))?;
            writer.write_event(Event::End(BytesEnd::new("v")))?;
            writer.write_event(Event::End(BytesEnd::new("c")))?;
        }
        CellPatch::Text(text) => {
            start.push_attribute(("t", "inlineStr"));
            writer.write_event(Event::Start(start))?;
            writer.write_event(Event::Start(BytesStart::new("is")))?;
            let mut t = BytesStart::new("t");
            if text.trim() != text {
                t.push_attribute(("xml:space", "preserve"));
            }
            writer.write_event(Event::Start(t))?;
            writer.write_event(Event::Text(BytesText::new(text)))?;
            writer.write_event(Event::End(BytesEnd::new("t")))?;
            writer.write_event(Event::End(BytesEnd::new("is")))?;
            writer.write_event(Event::End(BytesEnd::new("c")))?;
        }
    }
    Ok(())
}

fn attribute(start: &BytesStart<'_>, name: &[u8]) -> Result<Option<String>> {
    match start.try_get_attribute(name)? {
        Some(attr) => Ok(Some(attr.unescape_value()?.into_owned())),
        None => Ok(None),
    }
}

fn cell_column(start: &BytesStart<'_>) -> Result<Option<u32>> {
    match attribute(start, b"r")? {
        Some(r) => Ok(Some(r.parse::<CellRef>()?.col)),
        None => Ok(None),
    }
}

// Rows without `r` get an explicit one so inserted rows cannot shift them.
fn with_row_number(mut start: BytesStart<'static>, last_row: u32) -> Result<(BytesStart<'static>, u32)> {
    match attribute(&start, b"r")? {
        Some(r) => {
            let row = r
                .trim()
                .parse::<u32>()
                .map_err(|_| Error::InvalidTemplate(format!("bad row number '{r}'")))?;
            Ok((start, row))
        }
        None => {
            let row = last_row + 1;
            start.push_attribute(("r", row.to_string().as_str()));
            Ok((start, row))
        }
    }
}
