//! Fill the DHD workbook template with report data.

use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::report::{UnitPolicy, WellReport};
use crate::slug::slugify;
use crate::xlsx::{CellPatch, CellRef, SheetPatches, XlsxPackage};

pub const END_OF_TAILPIPE_LABEL: &str = "END OF TAILPIPE";

/// Fixed cell coordinates of the template's semantic fields.
#[derive(Debug, Clone)]
pub struct TemplateLayout {
    pub well_name: CellRef,
    pub length_unit: CellRef,
    pub depth_unit: CellRef,
    pub inner_diameter_unit: CellRef,
    pub outer_diameter_unit: CellRef,
    /// Zero-based row of the first component.
    pub first_component_row: u32,
    /// Zero-based columns for item id, name, length, depth, ID, OD.
    pub component_columns: [u32; 6],
    pub tailpipe_label_column: u32,
    pub tailpipe_depth_column: u32,
    /// Blank rows left between the last component and the tailpipe row.
    pub tailpipe_row_offset: u32,
}

impl Default for TemplateLayout {
    fn default() -> Self {
        Self {
            well_name: CellRef::new(1, 3),           // D2
            length_unit: CellRef::new(4, 4),         // E5
            depth_unit: CellRef::new(4, 5),          // F5
            inner_diameter_unit: CellRef::new(4, 6), // G5
            outer_diameter_unit: CellRef::new(4, 7), // H5
            first_component_row: 5,                  // row 6
            component_columns: [2, 3, 4, 5, 6, 7],   // C..H
            tailpipe_label_column: 3,                // D
            tailpipe_depth_column: 5,                // F
            tailpipe_row_offset: 0,
        }
    }
}

impl TemplateLayout {
    /// Row of the end-of-tailpipe entry, right after the last component unless
    /// `tailpipe_row_offset` asks for blank rows in between.
    pub fn tailpipe_row(&self, component_count: usize) -> u32 {
        self.first_component_row + component_count as u32 + self.tailpipe_row_offset
    }
}

#[derive(Debug, Clone, Default)]
pub struct FillOptions {
    pub layout: TemplateLayout,
    pub unit_policy: UnitPolicy,
}

/// `DHD_<slug>.xlsx` inside `output_dir`.
pub fn output_path_for(well_name: &str, output_dir: impl AsRef<Path>) -> PathBuf {
    output_dir
        .as_ref()
        .join(format!("DHD_{}.xlsx", slugify(well_name)))
}

/// Every cell write the report produces, in one place.
pub fn build_patches(report: &WellReport, options: &FillOptions) -> Result<SheetPatches> {
    let layout = &options.layout;
    let units = report.units(options.unit_policy)?;
    let mut patches = SheetPatches::new();

    patches.set(layout.well_name, CellPatch::text(&report.well_name));
    patches.set(layout.length_unit, CellPatch::text(units.length));
    patches.set(layout.depth_unit, CellPatch::text(units.depth));
    patches.set(layout.inner_diameter_unit, CellPatch::text(units.inner_diameter));
    patches.set(layout.outer_diameter_unit, CellPatch::text(units.outer_diameter));

    for (i, comp) in report.components.iter().enumerate() {
        let row = layout.first_component_row + i as u32;
        let [id_col, name_col, len_col, depth_col, id_diam_col, od_col] = layout.component_columns;
        patches.set(CellRef::new(row, id_col), CellPatch::from(comp.item_id.as_ref()));
        patches.set(
            CellRef::new(row, name_col),
            comp.name.as_deref().map_or(CellPatch::Clear, CellPatch::text),
        );
        patches.set(CellRef::new(row, len_col), CellPatch::from(comp.length.as_ref()));
        patches.set(CellRef::new(row, depth_col), CellPatch::from(comp.depth.as_ref()));
        patches.set(
            CellRef::new(row, id_diam_col),
            CellPatch::from(comp.inner_diameter.as_ref()),
        );
        patches.set(CellRef::new(row, od_col), CellPatch::from(comp.outer_diameter.as_ref()));
    }

    let tail_row = layout.tailpipe_row(report.components.len());
    patches.set(
        CellRef::new(tail_row, layout.tailpipe_label_column),
        CellPatch::text(END_OF_TAILPIPE_LABEL),
    );
    patches.set(
        CellRef::new(tail_row, layout.tailpipe_depth_column),
        CellPatch::from(report.end_of_tailpipe_depth.as_ref()),
    );

    Ok(patches)
}

/// Fill `template` with `report` and save it as `DHD_<slug>.xlsx` in `output_dir`.
///
/// Returns the path of the written workbook.
pub fn fill_template(
    report: &WellReport,
    template: impl AsRef<Path>,
    output_dir: impl AsRef<Path>,
    options: &FillOptions,
) -> Result<PathBuf> {
    let output_path = output_path_for(&report.well_name, output_dir);
    let patches = build_patches(report, options)?;

    let mut pkg = XlsxPackage::open(template)?;
    pkg.apply_to_active_sheet(&patches)?;
    pkg.save(&output_path)?;

    log::info!(
        "Filled {} component rows into {}",
        report.components.len(),
        output_path.display()
    );
    Ok(output_path)
}
