//! Extracted drilling report data.
//!
//! The extraction step (OCR + LLM) is external; it hands us one JSON document per
//! report page. This module deserializes that document and enforces which fields
//! are required before anything is written to disk.

use std::fmt;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Deserializer};

use crate::error::{Error, Result};

/// A cell-ready scalar pulled out of the report.
///
/// Extraction usually yields numbers, but measurements like `3 1/2` or item ids
/// like `1A` come through as text, so both are accepted.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(f64),
    Text(String),
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Number(n) => write!(f, "{}", n),
            FieldValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<f64> for FieldValue {
    fn from(n: f64) -> Self {
        FieldValue::Number(n)
    }
}

/// One row of the component table.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct ComponentRecord {
    #[serde(default)]
    pub item_id: Option<FieldValue>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub length: Option<FieldValue>,
    #[serde(default)]
    pub depth: Option<FieldValue>,
    #[serde(default)]
    pub inner_diameter: Option<FieldValue>,
    #[serde(default)]
    pub outer_diameter: Option<FieldValue>,
    /// Canonical catalog name; absent means "draw a spacer here".
    #[serde(default)]
    pub mapped_name: Option<String>,
}

/// What to do when a unit field is missing from the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnitPolicy {
    /// Write an empty string.
    #[default]
    DefaultEmpty,
    /// Fail with [`Error::MissingField`].
    Require,
}

/// The four unit labels shown in the table header.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Units {
    pub length: String,
    pub depth: String,
    pub inner_diameter: String,
    pub outer_diameter: String,
}

/// Validated report ready for filling.
#[derive(Debug, Clone, PartialEq)]
pub struct WellReport {
    pub well_name: String,
    pub length_unit: Option<String>,
    pub depth_unit: Option<String>,
    pub inner_diameter_unit: Option<String>,
    pub outer_diameter_unit: Option<String>,
    /// The key must exist; a `null` value leaves the cell empty.
    pub end_of_tailpipe_depth: Option<FieldValue>,
    pub components: Vec<ComponentRecord>,
}

#[derive(Debug, Deserialize)]
struct RawReport {
    #[serde(default)]
    well_name: Option<String>,
    #[serde(default)]
    length_unit: Option<String>,
    #[serde(default)]
    depth_unit: Option<String>,
    #[serde(default)]
    inner_diameter_unit: Option<String>,
    #[serde(default)]
    outer_diameter_unit: Option<String>,
    #[serde(default, deserialize_with = "present")]
    end_of_tailpipe_depth: Option<Option<FieldValue>>,
    #[serde(default)]
    components: Option<Vec<ComponentRecord>>,
}

// Distinguishes an explicit `null` (Some(None)) from a missing key (None).
fn present<'de, D, T>(deserializer: D) -> std::result::Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl TryFrom<RawReport> for WellReport {
    type Error = Error;

    fn try_from(raw: RawReport) -> Result<Self> {
        let well_name = raw.well_name.ok_or(Error::MissingField("well_name"))?;
        let components = raw.components.ok_or(Error::MissingField("components"))?;
        let end_of_tailpipe_depth = raw
            .end_of_tailpipe_depth
            .ok_or(Error::MissingField("end_of_tailpipe_depth"))?;

        Ok(WellReport {
            well_name,
            length_unit: raw.length_unit,
            depth_unit: raw.depth_unit,
            inner_diameter_unit: raw.inner_diameter_unit,
            outer_diameter_unit: raw.outer_diameter_unit,
            end_of_tailpipe_depth,
            components,
        })
    }
}

impl WellReport {
    /// Parse and validate a report from JSON text.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let raw: RawReport = serde_json::from_str(json)?;
        WellReport::try_from(raw)
    }

    /// Read and validate a report JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        log::debug!("Reading report {}", path.display());
        let text = fs::read_to_string(path)?;
        let report = Self::from_json_str(&text)?;
        log::info!(
            "Report for '{}' with {} components",
            report.well_name,
            report.components.len()
        );
        Ok(report)
    }

    /// Resolve the unit labels under the given policy.
    pub fn units(&self, policy: UnitPolicy) -> Result<Units> {
        let pick = |value: &Option<String>, field: &'static str| match (value, policy) {
            (Some(v), _) => Ok(v.clone()),
            (None, UnitPolicy::DefaultEmpty) => Ok(String::new()),
            (None, UnitPolicy::Require) => Err(Error::MissingField(field)),
        };

        Ok(Units {
            length: pick(&self.length_unit, "length_unit")?,
            depth: pick(&self.depth_unit, "depth_unit")?,
            inner_diameter: pick(&self.inner_diameter_unit, "inner_diameter_unit")?,
            outer_diameter: pick(&self.outer_diameter_unit, "outer_diameter_unit")?,
        })
    }
}
