//! Error type for `easydms-store-sqlite`.

use std::collections::BTreeSet;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  /// An existing table has columns that differ from the expected layout in
  /// a way that cannot be fixed by adding columns.
  #[error("table {table} does not match the expected structure (columns: {columns:?})")]
  StructureMismatch {
    table:   String,
    columns: BTreeSet<String>,
  },

  /// The name is already a primary tag or an alias of one.
  #[error("tag name already in use: {0}")]
  DuplicateAlias(String),

  /// One alias resolves to several primary tags.
  #[error("alias {alias:?} is bound to several tags: {primaries:?}")]
  ContentCorruption {
    alias:     String,
    primaries: Vec<String>,
  },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
