//! Filing policy: where an accepted document lands on disk.
//!
//! Documents are filed as
//! `root/{year:04}/{label}/{year:04}-{month:02}-{day:02}_{seq:03}.pdf`. The
//! sequence number is found by probing the directory each time and is never
//! persisted. Probing starts at 1 and takes the first free number, so a gap
//! left by a removed file is filled before higher numbers are used.

use std::{
  collections::BTreeSet,
  fs,
  path::{Path, PathBuf},
};

use chrono::{Datelike, NaiveDate};

use crate::{Error, Result};

/// Computes destinations under a filing root and moves documents there.
#[derive(Debug, Clone)]
pub struct FilingPolicy {
  root: PathBuf,
}

impl FilingPolicy {
  pub fn new(root: impl Into<PathBuf>) -> Self { Self { root: root.into() } }

  /// The first free destination for a document dated `date` under `label`.
  ///
  /// Nothing is created; an existing file is never returned.
  pub fn destination(&self, date: NaiveDate, label: &str) -> Result<PathBuf> {
    let dir = self.label_dir(date, label)?;
    let mut seq = 1u32;
    loop {
      let candidate = dir.join(file_name(date, seq));
      if !candidate.exists() {
        return Ok(candidate);
      }
      seq += 1;
    }
  }

  /// Move a document into the tree.
  ///
  /// `processed` is an intermediate copy (e.g. the OCR output) that replaces
  /// the original when present. Both the processed copy and the original
  /// `source` are removed once the destination has been written.
  pub fn file(
    &self,
    source: &Path,
    processed: Option<&Path>,
    date: NaiveDate,
    label: &str,
  ) -> Result<PathBuf> {
    let destination = self.destination(date, label)?;
    if let Some(parent) = destination.parent() {
      fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }

    let content = processed.unwrap_or(source);
    fs::copy(content, &destination).map_err(|e| Error::io(content, e))?;

    if let Some(processed) = processed
      && processed != source
    {
      fs::remove_file(processed).map_err(|e| Error::io(processed, e))?;
    }
    fs::remove_file(source).map_err(|e| Error::io(source, e))?;

    tracing::info!(
      source = %source.display(),
      destination = %destination.display(),
      "filed document"
    );
    Ok(destination)
  }

  /// Every label that already has a directory under some year.
  ///
  /// A missing root yields an empty set.
  pub fn labels(&self) -> Result<BTreeSet<String>> {
    let mut labels = BTreeSet::new();
    if !self.root.is_dir() {
      return Ok(labels);
    }

    for year in read_dirs(&self.root)? {
      for label in read_dirs(&year)? {
        if let Some(name) = label.file_name().and_then(|n| n.to_str()) {
          labels.insert(name.to_owned());
        }
      }
    }
    Ok(labels)
  }

  fn label_dir(&self, date: NaiveDate, label: &str) -> Result<PathBuf> {
    validate_label(label)?;
    Ok(self.root.join(format!("{:04}", date.year())).join(label))
  }
}

fn file_name(date: NaiveDate, seq: u32) -> String {
  format!(
    "{:04}-{:02}-{:02}_{seq:03}.pdf",
    date.year(),
    date.month(),
    date.day()
  )
}

/// A label becomes exactly one directory name.
pub fn validate_label(label: &str) -> Result<()> {
  if label.trim().is_empty() {
    return Err(Error::EmptyLabel);
  }
  if label == "." || label == ".." || label.contains(['/', '\\']) {
    return Err(Error::InvalidLabel(label.to_owned()));
  }
  Ok(())
}

fn read_dirs(dir: &Path) -> Result<Vec<PathBuf>> {
  let entries = fs::read_dir(dir).map_err(|e| Error::io(dir, e))?;
  let mut dirs = Vec::new();
  for entry in entries {
    let path = entry.map_err(|e| Error::io(dir, e))?.path();
    if path.is_dir() {
      dirs.push(path);
    }
  }
  Ok(dirs)
}
