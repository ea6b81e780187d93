//! Vertical stacking of component images into one tool-string picture.
//!
//! Composition runs in two passes: the first resolves every entry and measures
//! the canvas, the second allocates the canvas once and paints top to bottom.

use std::path::Path;

use image::{ImageFormat, Rgba, RgbaImage, imageops};

use crate::catalog::ImageCatalog;
use crate::error::{Error, Result};

/// Spacer height used when the caller does not pick one.
pub const DEFAULT_GAP_PIXELS: u32 = 8;

// Fully transparent white, so flattening onto a white sheet shows nothing.
const BACKGROUND: Rgba<u8> = Rgba([255, 255, 255, 0]);

/// One slot in the top-to-bottom assembly order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StackEntry {
    /// Canonical component name, looked up in the catalog.
    Component(String),
    /// Empty vertical gap.
    Spacer,
}

impl StackEntry {
    pub fn component(name: impl Into<String>) -> Self {
        StackEntry::Component(name.into())
    }
}

/// Horizontal placement of narrower images on the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Alignment {
    Left,
    #[default]
    Center,
    Right,
}

impl Alignment {
    fn offset(self, canvas_width: u32, image_width: u32) -> u32 {
        match self {
            Alignment::Left => 0,
            Alignment::Center => (canvas_width - image_width) / 2,
            Alignment::Right => canvas_width - image_width,
        }
    }
}

/// Stack compositor settings.
#[derive(Debug, Clone)]
pub struct StackOptions {
    /// Height of each spacer in pixels.
    pub gap_pixels: u32,
    /// Skip names missing from the catalog instead of failing.
    pub skip_missing: bool,
    pub alignment: Alignment,
}

impl Default for StackOptions {
    fn default() -> Self {
        Self {
            gap_pixels: DEFAULT_GAP_PIXELS,
            skip_missing: true,
            alignment: Alignment::Center,
        }
    }
}

impl StackOptions {
    pub fn with_gap_pixels(mut self, gap_pixels: u32) -> Self {
        self.gap_pixels = gap_pixels;
        self
    }

    pub fn with_skip_missing(mut self, skip_missing: bool) -> Self {
        self.skip_missing = skip_missing;
        self
    }

    pub fn with_alignment(mut self, alignment: Alignment) -> Self {
        self.alignment = alignment;
        self
    }
}

enum Unit {
    Gap(u32),
    Image(RgbaImage),
}

/// Compose the images named in `order` into a single RGBA canvas.
///
/// The canvas is as wide as the widest image (at least 1 pixel) and as tall as
/// all images plus all spacers.
pub fn compose_stack(
    order: &[StackEntry],
    catalog: &ImageCatalog,
    options: &StackOptions,
) -> Result<RgbaImage> {
    let mut units = Vec::with_capacity(order.len());
    let mut max_width = 1u32;
    let mut total_height = 0u32;

    // Pass 1: resolve and measure
    for entry in order {
        match entry {
            StackEntry::Spacer => {
                units.push(Unit::Gap(options.gap_pixels));
                total_height = grow(total_height, options.gap_pixels)?;
            }
            StackEntry::Component(name) => {
                let Some(source) = catalog.get(name) else {
                    if options.skip_missing {
                        log::warn!("No image for component '{}', skipping", name);
                        continue;
                    }
                    return Err(Error::UnresolvedComponent(name.clone()));
                };
                let img = source.load_rgba()?;
                max_width = max_width.max(img.width());
                total_height = grow(total_height, img.height())?;
                units.push(Unit::Image(img));
            }
        }
    }

    log::debug!(
        "Stack canvas {}x{} from {} units",
        max_width,
        total_height,
        units.len()
    );

    let bytes = u64::from(max_width) * u64::from(total_height) * 4;
    if usize::try_from(bytes).is_err() {
        return Err(Error::StackTooLarge);
    }

    // Pass 2: paint
    let mut canvas = RgbaImage::from_pixel(max_width, total_height, BACKGROUND);
    let mut y = 0u32;
    for unit in &units {
        match unit {
            Unit::Gap(height) => y += height,
            Unit::Image(img) => {
                let x = options.alignment.offset(max_width, img.width());
                imageops::overlay(&mut canvas, img, i64::from(x), i64::from(y));
                y += img.height();
            }
        }
    }

    Ok(canvas)
}

fn grow(height: u32, by: u32) -> Result<u32> {
    height.checked_add(by).ok_or(Error::StackTooLarge)
}

/// Write a composed stack as PNG.
pub fn save_stack(canvas: &RgbaImage, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    if canvas.height() == 0 {
        return Err(Error::EmptyStack);
    }
    canvas.save_with_format(path, ImageFormat::Png)?;
    log::info!(
        "Saved {}x{} stack to {}",
        canvas.width(),
        canvas.height(),
        path.display()
    );
    Ok(())
}
