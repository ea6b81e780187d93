//! File-name-safe slugs for well names.

use lazy_static::lazy_static;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

lazy_static! {
    static ref DISALLOWED: Regex = Regex::new(r"[^\w\s-]").unwrap();
    static ref SEPARATORS: Regex = Regex::new(r"[-\s]+").unwrap();
}

/// Slugify a well name, e.g. `"Acracia # 1"` -> `"acracia_1"`.
///
/// Decomposes to NFKD and drops non-ASCII (stripping diacritics), removes
/// anything that is not a word character, whitespace or hyphen, lowercases, and
/// collapses runs of whitespace/hyphens into a single underscore.
pub fn slugify(text: &str) -> String {
    let ascii: String = text.nfkd().filter(char::is_ascii).collect();
    let cleaned = DISALLOWED.replace_all(&ascii, "");
    let lowered = cleaned.trim().to_lowercase();
    SEPARATORS.replace_all(&lowered, "_").into_owned()
}
