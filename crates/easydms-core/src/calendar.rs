//! Gregorian calendar helpers.

use std::path::Path;

use chrono::{Datelike, Local, NaiveDate};

use crate::{Error, Result};

/// Number of days in `month` of `year`.
///
/// # Panics
///
/// Panics if `month` is outside `1..=12`.
pub fn days_in_month(year: i32, month: u32) -> u32 {
  assert!((1..=12).contains(&month), "month out of range: {month}");
  let (next_year, next_month) =
    if month == 12 { (year + 1, 1) } else { (year, month + 1) };
  NaiveDate::from_ymd_opt(next_year, next_month, 1)
    .and_then(|first| first.pred_opt())
    .map(|last| last.day())
    .unwrap_or(31)
}

/// Parse an ISO-8601 calendar date (`YYYY-MM-DD`).
///
/// Impossible dates such as `2015-02-30` are rejected rather than rolled over.
pub fn parse_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
    .map_err(|_| Error::InvalidDate(s.to_owned()))
}

/// Best guess for the date a document was issued.
///
/// There is no content inspection yet, so this is always today's local date.
pub fn guess_document_date(_path: &Path) -> NaiveDate { Local::now().date_naive() }
