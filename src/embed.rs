//! Put the composed stack picture onto the filled workbook.

use std::fs;
use std::io::Cursor;
use std::path::Path;

use image::ImageFormat;

use crate::error::{Error, Result};
use crate::xlsx::{CellRef, Picture, XlsxPackage, add_picture, content_type_for_extension};

#[derive(Debug, Clone)]
pub struct EmbedOptions {
    /// Top-left cell of the picture.
    pub anchor: CellRef,
    /// Factor applied to the image's native pixel size.
    pub scale: f64,
}

impl Default for EmbedOptions {
    fn default() -> Self {
        Self {
            anchor: CellRef::new(5, 0), // A6
            scale: 1.0 / 3.0,
        }
    }
}

/// Load `image_path` as an embeddable picture scaled by `scale`.
///
/// Formats Excel cannot show natively are re-encoded as PNG. `scale` must be a
/// positive finite number.
pub fn load_picture(image_path: impl AsRef<Path>, scale: f64) -> Result<Picture> {
    if !scale.is_finite() || scale <= 0.0 {
        return Err(Error::InvalidScale(scale));
    }
    let image_path = image_path.as_ref();
    let (width, height) = image::image_dimensions(image_path)?;
    let extension = image_path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    let (bytes, extension) = if content_type_for_extension(&extension).is_some() {
        (fs::read(image_path)?, extension)
    } else {
        log::debug!("Re-encoding {} as PNG", image_path.display());
        let mut buf = Cursor::new(Vec::new());
        image::open(image_path)?.write_to(&mut buf, ImageFormat::Png)?;
        (buf.into_inner(), "png".to_string())
    };

    Ok(Picture::from_pixels(
        bytes,
        &extension,
        f64::from(width) * scale,
        f64::from(height) * scale,
    ))
}

/// Anchor `image_path` on the active sheet of `workbook_in` and save to `workbook_out`.
///
/// `workbook_out` may be the same file as `workbook_in`.
pub fn embed_image(
    workbook_in: impl AsRef<Path>,
    workbook_out: impl AsRef<Path>,
    image_path: impl AsRef<Path>,
    options: &EmbedOptions,
) -> Result<()> {
    let workbook_out = workbook_out.as_ref();
    let mut pkg = XlsxPackage::open(workbook_in)?;
    let picture = load_picture(image_path, options.scale)?;
    let sheet_part = pkg.active_worksheet_part()?;

    add_picture(&mut pkg, &sheet_part, picture, options.anchor)?;
    pkg.save(workbook_out)?;

    log::info!(
        "Embedded picture at {} in {}",
        options.anchor,
        workbook_out.display()
    );
    Ok(())
}
