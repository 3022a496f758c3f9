//! Typed coercion of scraped string cells
//!
//! Scraped tables hand us every cell as text. Two flavours live here:
//!
//! - *lenient* helpers turn anything they can't parse into `None`. Season stats,
//!   schedule rows and play-by-play point deltas use these.
//! - *strict* helpers still map an empty cell to `None`, but report a
//!   [`CoerceError`] for non-empty junk. Box-score lines use these, since a
//!   blank-but-present advanced metric never legitimately shows up mid-game.

use thiserror::Error;

/// A non-empty cell that could not be read as the requested type
#[derive(Debug, Clone, PartialEq, Error)]
#[error("cannot read {value:?} as {target}")]
pub struct CoerceError {
    pub value: String,
    pub target: &'static str,
}

/// Get a cell by index, treating a missing cell as empty
pub fn cell(row: &[String], index: usize) -> &str {
    row.get(index).map(String::as_str).unwrap_or("")
}

/// Parse an integer, `None` on empty or malformed input
pub fn lenient_int(raw: &str) -> Option<i32> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse().ok()
}

/// Parse a real, `None` on empty or malformed input
pub fn lenient_real(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parse an integer; empty is `None`, junk is an error
pub fn strict_int(raw: &str) -> Result<Option<i32>, CoerceError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    trimmed.parse().map(Some).map_err(|_| CoerceError {
        value: raw.to_string(),
        target: "integer",
    })
}

/// Parse a real; empty is `None`, junk is an error
pub fn strict_real(raw: &str) -> Result<Option<f64>, CoerceError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    match trimmed.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(Some(v)),
        _ => Err(CoerceError {
            value: raw.to_string(),
            target: "real",
        }),
    }
}

/// Point delta such as `+2` or `+0`: drop the leading sign character, then
/// read the rest leniently
pub fn signed_delta(raw: &str) -> Option<i32> {
    let mut chars = raw.chars();
    chars.next()?;
    lenient_int(chars.as_str())
}

/// Attendance figures come with thousands separators (`18,997`)
pub fn attendance(raw: &str) -> Option<i32> {
    lenient_int(&raw.replace(',', ""))
}

/// True when the cell holds a non-negative whole number (season-stat rank column)
pub fn is_rank(raw: &str) -> bool {
    let trimmed = raw.trim();
    !trimmed.is_empty() && trimmed.chars().all(|c| c.is_ascii_digit())
}
