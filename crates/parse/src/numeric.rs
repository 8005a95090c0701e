//! Numeric cell normalization.
//!
//! Source pages format numbers for humans: thousands separators,
//! placeholder dashes for missing data, stray whitespace. Volume is the
//! most failure-prone field and gets its own cleaner so unparseable rows
//! can be rejected gracefully instead of failing the document.

use rust_decimal::Decimal;
use std::str::FromStr;

/// Placeholder cell values meaning "no data".
const PLACEHOLDERS: [&str; 3] = ["-", "N/A", ""];

fn strip_formatting(cell: &str) -> Option<String> {
    let cleaned: String = cell.trim().replace(',', "");
    if PLACEHOLDERS.contains(&cleaned.as_str()) {
        return None;
    }
    Some(cleaned)
}

/// Parses a price cell, stripping thousands separators.
///
/// Returns `None` for placeholder or unparseable values; the caller drops
/// the row.
#[must_use]
pub fn clean_price(cell: &str) -> Option<Decimal> {
    let cleaned = strip_formatting(cell)?;
    Decimal::from_str(&cleaned).ok()
}

/// Parses a volume cell, stripping thousands separators.
///
/// Rejects negatives: a negative share count is a source artifact, not
/// data.
#[must_use]
pub fn clean_volume(cell: &str) -> Option<i64> {
    let cleaned = strip_formatting(cell)?;
    let volume = i64::from_str(&cleaned).ok()?;
    if volume < 0 {
        return None;
    }
    Some(volume)
}
