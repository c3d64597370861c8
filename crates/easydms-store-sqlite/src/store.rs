//! [`SqliteStore`]: the SQLite implementation of [`DocumentStore`].

use std::{collections::BTreeSet, path::Path};

use easydms_core::{document::Document, store::DocumentStore, tag::Tag};

use crate::{
  encode::{encode_date, encode_path},
  schema::{Column, ColumnDiff, PRAGMAS, TABLES, Table},
  Error, Result,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// An easydms library backed by a single SQLite file.
///
/// The connection stays open for the lifetime of the store. Every statement
/// commits on its own; no multi-statement transactions are used.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a library at `path`.
  ///
  /// The schema is not touched; call
  /// [`create_schema`](DocumentStore::create_schema) before use.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.apply_pragmas().await?;
    Ok(store)
  }

  /// Open an in-memory library, mostly for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.apply_pragmas().await?;
    Ok(store)
  }

  async fn apply_pragmas(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(PRAGMAS)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Create `table` if it does not exist and check its layout.
  ///
  /// Columns the definition has but the table lacks are added. Renamed,
  /// retyped or removed columns fail with [`Error::StructureMismatch`].
  pub async fn create_table(&self, table: &Table) -> Result<()> {
    let name = table.name;
    let create = table.create_sql();

    let existing: Vec<(String, String)> = self
      .conn
      .call(move |conn| {
        conn.execute_batch(&create)?;
        let mut stmt = conn.prepare(&format!("PRAGMA table_info(\"{name}\")"))?;
        let rows = stmt
          .query_map([], |row| Ok((row.get(1)?, row.get(2)?)))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    match table.diff(&existing) {
      ColumnDiff::Unchanged => Ok(()),
      ColumnDiff::Missing(columns) => self.add_columns(name, columns).await,
      ColumnDiff::Conflict(columns) => Err(Error::StructureMismatch {
        table: name.to_owned(),
        columns,
      }),
    }
  }

  async fn add_columns(&self, table: &'static str, columns: Vec<Column>) -> Result<()> {
    let statements: Vec<String> = columns
      .iter()
      .map(|c| {
        tracing::info!(table, column = c.name, "adding missing column");
        format!("ALTER TABLE \"{table}\" ADD COLUMN {}", c.definition())
      })
      .collect();

    self
      .conn
      .call(move |conn| {
        for statement in &statements {
          conn.execute(statement, [])?;
        }
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Insert `name` into `tag`.
  async fn insert_primary(&self, name: &str) -> Result<()> {
    let name = name.to_owned();
    self
      .conn
      .call(move |conn| {
        conn.execute("INSERT INTO tag (name) VALUES (?1)", rusqlite::params![name])?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Bind `alias` to the primary tag `primary`.
  async fn insert_alternative(&self, alias: &str, primary: &str) -> Result<()> {
    let alias = alias.to_owned();
    let primary = primary.to_owned();
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO tagalternative (name, tag) VALUES (?1, ?2)",
          rusqlite::params![alias, primary],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

#[cfg(test)]
impl SqliteStore {
  /// Run raw SQL, bypassing every check.
  pub(crate) async fn execute_raw(&self, sql: &'static str) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        conn.execute_batch(sql)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// All `(id, path, date)` rows of the `document` table.
  pub(crate) async fn documents(&self) -> Result<Vec<(i64, String, String)>> {
    let rows = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare("SELECT id, path, date FROM document ORDER BY id")?;
        let rows = stmt
          .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(rows)
  }

  /// Names of all tables in the database.
  pub(crate) async fn table_names(&self) -> Result<BTreeSet<String>> {
    let names = self
      .conn
      .call(|conn| {
        let mut stmt =
          conn.prepare("SELECT name FROM sqlite_master WHERE type = 'table'")?;
        let names = stmt
          .query_map([], |row| row.get(0))?
          .collect::<rusqlite::Result<BTreeSet<String>>>()?;
        Ok(names)
      })
      .await?;
    Ok(names)
  }
}

// ─── DocumentStore impl ──────────────────────────────────────────────────────

impl DocumentStore for SqliteStore {
  type Error = Error;

  // ── Schema ────────────────────────────────────────────────────────────────

  async fn create_schema(&self) -> Result<()> {
    for table in TABLES {
      self.create_table(table).await?;
    }
    Ok(())
  }

  // ── Documents ─────────────────────────────────────────────────────────────

  async fn insert_document(&self, document: &Document) -> Result<i64> {
    let path = encode_path(&document.path);
    let date = encode_date(document.date);

    let id = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO document (path, date) VALUES (?1, ?2)",
          rusqlite::params![path, date],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;

    Ok(id)
  }

  // ── Tags ──────────────────────────────────────────────────────────────────

  async fn primary_tag(&self, name: &str) -> Result<Option<String>> {
    let alias = name.to_owned();

    // Every alias paired with its primary, plus every primary paired with
    // itself.
    let mut primaries: Vec<String> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT DISTINCT primary_name FROM (
             SELECT t.name AS primary_name, ta.name AS alias
             FROM tagalternative ta
             JOIN tag t ON ta.tag = t.name
             UNION ALL
             SELECT name AS primary_name, name AS alias FROM tag
           )
           WHERE alias = ?1
           ORDER BY primary_name",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![alias], |row| row.get(0))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    match primaries.len() {
      0 => Ok(None),
      1 => Ok(primaries.pop()),
      _ => Err(Error::ContentCorruption { alias: name.to_owned(), primaries }),
    }
  }

  async fn tag_alternatives(&self, primary: &str) -> Result<BTreeSet<String>> {
    let primary = primary.to_owned();
    let alternatives = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare("SELECT name FROM tagalternative WHERE tag = ?1")?;
        let rows = stmt
          .query_map(rusqlite::params![primary], |row| row.get(0))?
          .collect::<rusqlite::Result<BTreeSet<String>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(alternatives)
  }

  async fn insert_tag(&self, name: &str, alternatives: &[String]) -> Result<Tag> {
    match self.primary_tag(name).await? {
      None => self.insert_primary(name).await?,
      Some(primary) if primary == name => {}
      // `name` is already somebody else's alias.
      Some(_) => return Err(Error::DuplicateAlias(name.to_owned())),
    }

    for alias in alternatives {
      if self.primary_tag(alias).await?.is_some() {
        return Err(Error::DuplicateAlias(alias.clone()));
      }
      self.insert_alternative(alias, name).await?;
    }

    Ok(Tag {
      primary:      name.to_owned(),
      alternatives: self.tag_alternatives(name).await?,
    })
  }
}
