//! Encoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Dates are stored as ISO 8601 calendar dates (`YYYY-MM-DD`). Paths are
//! stored as they were given, lossily converted to UTF-8.

use std::path::Path;

use chrono::NaiveDate;

// ─── NaiveDate ───────────────────────────────────────────────────────────────

pub fn encode_date(date: NaiveDate) -> String { date.format("%Y-%m-%d").to_string() }

#[cfg(test)]
pub fn decode_date(s: &str) -> chrono::ParseResult<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d")
}

// ─── Path ────────────────────────────────────────────────────────────────────

pub fn encode_path(path: &Path) -> String { path.to_string_lossy().into_owned() }
