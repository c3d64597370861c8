//! Document: a scanned file and the day it was issued.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{Result, calendar::parse_date};

/// A document on its way into the store.
///
/// The date is a [`NaiveDate`], so a `Document` can never carry an impossible
/// calendar day. Records are insert-only; nothing updates or deletes them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
  pub path: PathBuf,
  pub date: NaiveDate,
}

impl Document {
  pub fn new(path: impl Into<PathBuf>, date: NaiveDate) -> Self {
    Self { path: path.into(), date }
  }

  /// Build a document from a textual `YYYY-MM-DD` date.
  pub fn parse(path: impl AsRef<Path>, date: &str) -> Result<Self> {
    Ok(Self::new(path.as_ref(), parse_date(date)?))
  }
}
