//! End-to-end conversion of one extracted report into a DHD workbook.

use std::path::{Path, PathBuf};

use crate::catalog::ImageCatalog;
use crate::embed::{EmbedOptions, embed_image};
use crate::error::Result;
use crate::filler::{FillOptions, fill_template};
use crate::mapper::{component_map, stack_order};
use crate::report::WellReport;
use crate::stack::{StackOptions, compose_stack, save_stack};

/// Everything a conversion run needs, supplied by the caller.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Workbook template to fill.
    pub template_path: PathBuf,
    /// Flat directory of per-component images.
    pub image_dir: PathBuf,
    /// Where the filled workbook is written.
    pub output_dir: PathBuf,
    /// Where the composed stack PNG is written.
    pub stack_image_path: PathBuf,
    /// Keep component rows without an item id in the stack order.
    pub keep_none: bool,
    /// Check every catalog file decodes before composing.
    pub validate_catalog: bool,
    pub stack: StackOptions,
    pub fill: FillOptions,
    pub embed: EmbedOptions,
}

impl PipelineConfig {
    pub fn new(
        template_path: impl Into<PathBuf>,
        image_dir: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        let output_dir = output_dir.into();
        Self {
            template_path: template_path.into(),
            image_dir: image_dir.into(),
            stack_image_path: output_dir.join("stack.png"),
            output_dir,
            keep_none: true,
            validate_catalog: false,
            stack: StackOptions::default(),
            fill: FillOptions::default(),
            embed: EmbedOptions::default(),
        }
    }

    pub fn with_stack_image_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.stack_image_path = path.into();
        self
    }

    pub fn with_keep_none(mut self, keep_none: bool) -> Self {
        self.keep_none = keep_none;
        self
    }

    pub fn with_validate_catalog(mut self, validate: bool) -> Self {
        self.validate_catalog = validate;
        self
    }

    pub fn with_stack_options(mut self, stack: StackOptions) -> Self {
        self.stack = stack;
        self
    }

    pub fn with_fill_options(mut self, fill: FillOptions) -> Self {
        self.fill = fill;
        self
    }

    pub fn with_embed_options(mut self, embed: EmbedOptions) -> Self {
        self.embed = embed;
        self
    }
}

/// Output files of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionOutput {
    pub workbook_path: PathBuf,
    pub stack_image_path: PathBuf,
}

/// Read the report JSON at `report_path` and run [`convert_report`].
pub fn convert_report_file(
    report_path: impl AsRef<Path>,
    config: &PipelineConfig,
) -> Result<ConversionOutput> {
    let report = WellReport::from_path(report_path)?;
    convert_report(&report, config)
}

/// Fill the template, compose the stack and embed it. Stops at the first failure.
pub fn convert_report(report: &WellReport, config: &PipelineConfig) -> Result<ConversionOutput> {
    // 1. Fill the workbook template
    let workbook_path = fill_template(
        report,
        &config.template_path,
        &config.output_dir,
        &config.fill,
    )?;

    // 2. Stack order from the mapped component names
    let order = stack_order(&component_map(&report.components, config.keep_none));

    // 3. Compose the stack image
    let catalog = ImageCatalog::from_dir(&config.image_dir)?;
    log::debug!("Catalog entries: {:?}", catalog.names().collect::<Vec<_>>());
    if config.validate_catalog {
        catalog.validate()?;
    }
    let canvas = compose_stack(&order, &catalog, &config.stack)?;
    save_stack(&canvas, &config.stack_image_path)?;

    // 4. Embed it into the filled workbook, in place
    embed_image(
        &workbook_path,
        &workbook_path,
        &config.stack_image_path,
        &config.embed,
    )?;

    log::info!("Converted '{}'", report.well_name);
    Ok(ConversionOutput {
        workbook_path,
        stack_image_path: config.stack_image_path.clone(),
    })
}
