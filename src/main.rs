use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use dhd_builder::embed::EmbedOptions;
use dhd_builder::filler::{FillOptions, TemplateLayout};
use dhd_builder::stack::DEFAULT_GAP_PIXELS;
use dhd_builder::xlsx::CellRef;
use dhd_builder::{Alignment, PipelineConfig, StackOptions, UnitPolicy, convert_report_file};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum AlignArg {
    Left,
    Center,
    Right,
}

impl From<AlignArg> for Alignment {
    fn from(arg: AlignArg) -> Self {
        match arg {
            AlignArg::Left => Alignment::Left,
            AlignArg::Center => Alignment::Center,
            AlignArg::Right => Alignment::Right,
        }
    }
}

/// Drilling report JSON to DHD Excel schematic
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Extracted report JSON (one page of the OCR output)
    #[arg(short, long)]
    input: PathBuf,

    /// DHD workbook template
    #[arg(short, long)]
    template: PathBuf,

    /// Directory of component images, one file per canonical component name
    #[arg(short = 'd', long)]
    images: PathBuf,

    /// Directory for the filled workbook
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,

    /// Stack image output path [default: <output-dir>/stack.png]
    #[arg(short, long)]
    stack_image: Option<PathBuf>,

    /// Spacer height in pixels
    #[arg(short, long, default_value_t = DEFAULT_GAP_PIXELS)]
    gap_pixels: u32,

    /// Horizontal alignment of stacked images
    #[arg(long, value_enum, default_value = "center")]
    align: AlignArg,

    /// Fail when a component has no image instead of skipping it
    #[arg(long, default_value_t = false)]
    strict: bool,

    /// Leave components without an item id out of the stack
    #[arg(long, default_value_t = false)]
    drop_unnumbered: bool,

    /// Fail when a unit field is missing instead of writing an empty cell
    #[arg(long, default_value_t = false)]
    require_units: bool,

    /// Check that every catalog file is a readable image before stacking
    #[arg(long, default_value_t = false)]
    validate_images: bool,

    /// Blank rows between the last component and END OF TAILPIPE
    #[arg(long, default_value_t = 0)]
    tailpipe_offset: u32,

    /// Cell the stack picture is anchored at
    #[arg(long, default_value = "A6")]
    anchor: CellRef,

    /// Scale applied to the stack picture in the sheet
    #[arg(long, default_value_t = 1.0 / 3.0, value_parser = parse_scale)]
    scale: f64,
}

fn parse_scale(s: &str) -> Result<f64, String> {
    let scale: f64 = s.parse().map_err(|e| format!("{e}"))?;
    if scale.is_finite() && scale > 0.0 {
        Ok(scale)
    } else {
        Err(format!("scale must be a positive number, got {s}"))
    }
}

impl Args {
    fn to_config(&self) -> PipelineConfig {
        let stack = StackOptions::default()
            .with_gap_pixels(self.gap_pixels)
            .with_skip_missing(!self.strict)
            .with_alignment(self.align.into());
        let fill = FillOptions {
            layout: TemplateLayout {
                tailpipe_row_offset: self.tailpipe_offset,
                ..Default::default()
            },
            unit_policy: if self.require_units {
                UnitPolicy::Require
            } else {
                UnitPolicy::DefaultEmpty
            },
        };
        let embed = EmbedOptions {
            anchor: self.anchor,
            scale: self.scale,
        };

        let mut config = PipelineConfig::new(&self.template, &self.images, &self.output_dir)
            .with_keep_none(!self.drop_unnumbered)
            .with_validate_catalog(self.validate_images)
            .with_stack_options(stack)
            .with_fill_options(fill)
            .with_embed_options(embed);
        if let Some(path) = &self.stack_image {
            config = config.with_stack_image_path(path);
        }
        config
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();

    println!("DHD Report to Excel Builder");
    println!("===========================");
    println!("Report JSON:     {}", args.input.display());
    println!("Template:        {}", args.template.display());
    println!("Images:          {}", args.images.display());
    println!("Output dir:      {}", args.output_dir.display());
    println!("Missing images:  {}", if args.strict { "Fail" } else { "Skip" });
    println!();

    let config = args.to_config();
    let output = convert_report_file(&args.input, &config).inspect_err(|e| {
        log::error!("Conversion failed: {}", e);
    })?;

    println!("✓ Created: {}", output.workbook_path.display());
    println!("✓ Created: {}", output.stack_image_path.display());

    Ok(())
}
