//! Component image catalog.
//!
//! Maps canonical component names to the image drawn for them. The catalog is
//! built once (usually from a flat directory of PNGs named after the component)
//! and handed to the stack compositor, which only ever reads from it.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use image::RgbaImage;

use crate::error::{Error, Result};

/// Where a component's picture comes from.
#[derive(Debug, Clone)]
pub enum ImageSource {
    /// Decoded lazily when the stack is composed.
    Path(PathBuf),
    /// Already decoded.
    Decoded(RgbaImage),
}

impl ImageSource {
    /// Decode (or copy) the image into RGBA8.
    pub fn load_rgba(&self) -> Result<RgbaImage> {
        match self {
            ImageSource::Path(path) => Ok(image::open(path)?.to_rgba8()),
            ImageSource::Decoded(img) => Ok(img.clone()),
        }
    }
}

/// Name -> image registry for stack compositing.
#[derive(Debug, Clone, Default)]
pub struct ImageCatalog {
    entries: BTreeMap<String, ImageSource>,
}

impl ImageCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register every file directly inside `dir` under its file stem.
    ///
    /// Subdirectories are skipped and no file type filtering happens; the
    /// directory is expected to hold only component images.
    pub fn from_dir(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            return Err(Error::MissingDirectory(dir.to_path_buf()));
        }

        let mut catalog = Self::new();
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let path = entry.path();
            if !entry.file_type()?.is_file() {
                log::debug!("Skipping non-file catalog entry {}", path.display());
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                log::warn!("Skipping catalog file with non UTF-8 name: {}", path.display());
                continue;
            };
            catalog.insert(stem.to_string(), ImageSource::Path(path.clone()));
        }

        log::info!("Catalog has {} components from {}", catalog.len(), dir.display());
        Ok(catalog)
    }

    /// Add or replace an entry.
    pub fn insert(&mut self, name: impl Into<String>, source: ImageSource) {
        self.entries.insert(name.into(), source);
    }

    pub fn get(&self, name: &str) -> Option<&ImageSource> {
        self.entries.get(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Check that every path-backed entry is a readable image.
    ///
    /// Only the image header is read, so this is cheap enough to run before
    /// every conversion.
    pub fn validate(&self) -> Result<()> {
        for (name, source) in &self.entries {
            if let ImageSource::Path(path) = source {
                let (w, h) = image::image_dimensions(path)?;
                log::debug!("Catalog entry '{}' is {}x{}", name, w, h);
            }
        }
        Ok(())
    }
}
