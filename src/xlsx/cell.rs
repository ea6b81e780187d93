use std::fmt;
use std::str::FromStr;

use crate::error::Error;
use crate::report::FieldValue;

/// Zero-based cell coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CellRef {
    pub row: u32,
    pub col: u32,
}

impl CellRef {
    pub const fn new(row: u32, col: u32) -> Self {
        Self { row, col }
    }

    /// Build from the 1-based row/column numbers spreadsheet users see.
    pub fn from_one_based(row: u32, col: u32) -> Self {
        Self::new(row.saturating_sub(1), col.saturating_sub(1))
    }

    pub fn to_a1(&self) -> String {
        format!("{}{}", col_to_name(self.col), self.row + 1)
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_a1())
    }
}

impl FromStr for CellRef {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        let invalid = || Error::InvalidCellRef(s.to_string());
        let s_trim = s.trim();
        let split = s_trim
            .find(|c: char| c.is_ascii_digit())
            .ok_or_else(invalid)?;
        let (letters, digits) = s_trim.split_at(split);
        let letters = letters.trim_start_matches('$').trim_end_matches('$');
        if letters.is_empty() || !letters.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(invalid());
        }
        if letters.len() > 3 {
            return Err(invalid());
        }

        let mut col = 0u32;
        for c in letters.chars() {
            col = col * 26 + (c.to_ascii_uppercase() as u32 - 'A' as u32 + 1);
        }
        let row: u32 = digits.parse().map_err(|_| invalid())?;
        if row == 0 {
            return Err(invalid());
        }
        Ok(CellRef::from_one_based(row, col))
    }
}

fn col_to_name(col: u32) -> String {
    let mut n = col + 1;
    let mut name = Vec::new();
    while n > 0 {
        let rem = ((n - 1) % 26) as u8;
        name.push(b'A' + rem);
        n = (n - 1) / 26;
    }
    name.reverse();
    String::from_utf8(name).unwrap_or_default()
}

/// A single cell edit.
#[derive(Debug, Clone, PartialEq)]
pub enum CellPatch {
    /// Remove the value but keep the cell's formatting.
    Clear,
    Text(String),
    Number(f64),
}

impl CellPatch {
    pub fn text(s: impl Into<String>) -> Self {
        CellPatch::Text(s.into())
    }
}

impl From<&FieldValue> for CellPatch {
    fn from(value: &FieldValue) -> Self {
        match value {
            FieldValue::Number(n) if n.is_finite() => CellPatch::Number(*n),
            FieldValue::Number(n) => CellPatch::Text(n.to_string()),
            FieldValue::Text(s) => CellPatch::Text(s.clone()),
        }
    }
}

impl From<Option<&FieldValue>> for CellPatch {
    fn from(value: Option<&FieldValue>) -> Self {
        value.map_or(CellPatch::Clear, CellPatch::from)
    }
}
