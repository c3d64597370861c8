//! SQL schema for the easydms SQLite store.
//!
//! Tables are described as data rather than DDL so an existing database can
//! be compared column by column against what the code expects. A table that
//! is only missing columns is extended; any other difference is refused.

use std::collections::{BTreeMap, BTreeSet};

/// Connection-level settings applied when a store is opened.
pub const PRAGMAS: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;
";

/// One column of a table definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
  pub name:       &'static str,
  pub sql_type:   &'static str,
  /// `table(column)` this column refers to, if any.
  pub references: Option<&'static str>,
}

impl Column {
  pub const fn new(name: &'static str, sql_type: &'static str) -> Self {
    Self { name, sql_type, references: None }
  }

  pub const fn references(self, target: &'static str) -> Self {
    Self { references: Some(target), ..self }
  }

  /// Column definition as used in `CREATE TABLE` and `ADD COLUMN`.
  pub fn definition(&self) -> String {
    match self.references {
      Some(target) => format!("\"{}\" {} REFERENCES {target}", self.name, self.sql_type),
      None => format!("\"{}\" {}", self.name, self.sql_type),
    }
  }
}

/// A table with a single-column primary key.
#[derive(Debug, Clone, Copy)]
pub struct Table {
  pub name:    &'static str,
  pub primary: Column,
  pub columns: &'static [Column],
}

/// Outcome of comparing an existing table against its definition.
#[derive(Debug, PartialEq, Eq)]
pub enum ColumnDiff {
  Unchanged,
  /// Only these expected columns are absent.
  Missing(Vec<Column>),
  /// Names of the columns that were renamed, retyped or removed.
  Conflict(BTreeSet<String>),
}

impl Table {
  pub fn create_sql(&self) -> String {
    let mut sql = format!(
      "CREATE TABLE IF NOT EXISTS \"{}\" ({} PRIMARY KEY",
      self.name,
      self.primary.definition()
    );
    for column in self.columns {
      sql.push_str(", ");
      sql.push_str(&column.definition());
    }
    sql.push(')');
    sql
  }

  fn all_columns(&self) -> impl Iterator<Item = &Column> {
    std::iter::once(&self.primary).chain(self.columns)
  }

  /// Compare `existing` `(name, declared type)` pairs, as reported by
  /// `PRAGMA table_info`, against this definition.
  pub fn diff(&self, existing: &[(String, String)]) -> ColumnDiff {
    let existing: BTreeMap<&str, String> = existing
      .iter()
      .map(|(name, ty)| (name.as_str(), ty.to_ascii_uppercase()))
      .collect();

    let mut missing = Vec::new();
    let mut conflicts = BTreeSet::new();

    for column in self.all_columns() {
      match existing.get(column.name) {
        None => missing.push(*column),
        Some(ty) if *ty == column.sql_type.to_ascii_uppercase() => {}
        Some(_) => {
          conflicts.insert(column.name.to_owned());
        }
      }
    }

    for name in existing.keys() {
      if !self.all_columns().any(|c| c.name == *name) {
        conflicts.insert((*name).to_owned());
      }
    }

    if !conflicts.is_empty() {
      // A renamed column shows up both as removed and as missing.
      conflicts.extend(missing.iter().map(|c| c.name.to_owned()));
      ColumnDiff::Conflict(conflicts)
    } else if !missing.is_empty() {
      ColumnDiff::Missing(missing)
    } else {
      ColumnDiff::Unchanged
    }
  }
}

// ─── easydms tables ──────────────────────────────────────────────────────────

pub const DOCUMENT: Table = Table {
  name:    "document",
  primary: Column::new("id", "INTEGER"),
  columns: &[Column::new("path", "TEXT"), Column::new("date", "TEXT")],
};

pub const TAG: Table = Table {
  name:    "tag",
  primary: Column::new("name", "TEXT"),
  columns: &[],
};

pub const TAG_ALTERNATIVE: Table = Table {
  name:    "tagalternative",
  primary: Column::new("name", "TEXT"),
  columns: &[Column::new("tag", "TEXT").references("tag(name)")],
};

/// Every table the store needs, in creation order.
pub const TABLES: &[Table] = &[DOCUMENT, TAG, TAG_ALTERNATIVE];
