//! Error types for `easydms-core`.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// A date string that does not name a real calendar day.
  #[error("invalid date: {0:?}")]
  InvalidDate(String),

  #[error("label must not be empty")]
  EmptyLabel,

  /// A label that cannot be used as a single directory name.
  #[error("label is not a valid directory name: {0:?}")]
  InvalidLabel(String),

  #[error("io error on {path}: {source}")]
  Io {
    path:   PathBuf,
    #[source]
    source: std::io::Error,
  },
}

impl Error {
  pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
    Self::Io { path: path.into(), source }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
