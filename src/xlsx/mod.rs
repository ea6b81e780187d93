//! Minimal, part-preserving XLSX editing.
//!
//! A template workbook is loaded as raw OPC parts, the active worksheet's XML is
//! patched in a streaming pass, pictures are added through DrawingML, and the
//! package is zipped back up. Parts we never touch are written back byte for byte.

mod cell;
mod drawing;
mod package;
mod patch;
mod path;

pub use cell::{CellPatch, CellRef};
pub use drawing::{EMU_PER_PIXEL, Picture, add_picture, content_type_for_extension};
pub use package::{Relationship, XlsxPackage};
pub use patch::{PatchedSheet, SheetPatches, patch_worksheet_xml};

use crate::error::Result;

const CALC_CHAIN_PART: &str = "xl/calcChain.xml";

impl XlsxPackage {
    /// Apply cell edits to the active worksheet.
    pub fn apply_to_active_sheet(&mut self, patches: &SheetPatches) -> Result<()> {
        if patches.is_empty() {
            return Ok(());
        }
        let sheet_part = self.active_worksheet_part()?;
        let original = self.part_str(&sheet_part)?.as_bytes();
        let patched = patch_worksheet_xml(original, patches)?;
        self.set_part(sheet_part.clone(), patched.xml);

        if patched.replaced_formula && self.remove_part(CALC_CHAIN_PART).is_some() {
            // Excel rebuilds the chain on open.
            log::debug!("Dropped {} after overwriting formula cells", CALC_CHAIN_PART);
        }
        log::debug!("Patched {} cells in {}", patches.len(), sheet_part);
        Ok(())
    }
}
