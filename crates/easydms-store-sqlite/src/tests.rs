//! Integration tests for `SqliteStore` against an in-memory database.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use easydms_core::{document::Document, store::DocumentStore};
use tempfile::TempDir;

use crate::{
  Error, SqliteStore,
  encode::decode_date,
  schema::{Column, Table},
};

async fn store() -> SqliteStore {
  let s = SqliteStore::open_in_memory()
    .await
    .expect("in-memory store");
  s.create_schema().await.expect("schema");
  s
}

fn aliases(names: &[&str]) -> Vec<String> {
  names.iter().map(|n| (*n).to_owned()).collect()
}

fn set(names: &[&str]) -> BTreeSet<String> {
  names.iter().map(|n| (*n).to_owned()).collect()
}

// ─── Schema ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn create_schema_is_idempotent() {
  let s = SqliteStore::open_in_memory().await.unwrap();
  s.create_schema().await.unwrap();
  let first = s.table_names().await.unwrap();
  s.create_schema().await.unwrap();
  let second = s.table_names().await.unwrap();

  assert_eq!(first, second);
  assert_eq!(first, set(&["document", "tag", "tagalternative"]));
}

#[tokio::test]
async fn create_schema_on_file_database() {
  let dir = TempDir::new().unwrap();
  let path = dir.path().join("library.db");

  let s = SqliteStore::open(&path).await.unwrap();
  s.create_schema().await.unwrap();
  drop(s);

  // Reopening an existing library finds the same layout.
  let s = SqliteStore::open(&path).await.unwrap();
  s.create_schema().await.unwrap();
  assert!(path.exists());
}

const FIELDS: &[Column] = &[
  Column::new("col1", "INTEGER"),
  Column::new("col2", "TEXT"),
  Column::new("col3", "TEXT"),
];

const EXTENDED_FIELDS: &[Column] = &[
  Column::new("col1", "INTEGER"),
  Column::new("col2", "TEXT"),
  Column::new("col3", "TEXT"),
  Column::new("newCol", "INTEGER"),
];

const CHANGED_FIELDS: &[Column] = &[
  Column::new("col1", "INTEGER"),
  Column::new("col2", "TEXT"),
  Column::new("col4", "INTEGER"),
];

fn table(columns: &'static [Column]) -> Table {
  Table { name: "tablename", primary: Column::new("id", "INTEGER"), columns }
}

#[tokio::test]
async fn create_table_twice_is_noop() {
  let s = store().await;
  s.create_table(&table(FIELDS)).await.unwrap();
  s.create_table(&table(FIELDS)).await.unwrap();
}

#[tokio::test]
async fn create_table_extends_with_new_columns() {
  let s = store().await;
  s.create_table(&table(FIELDS)).await.unwrap();
  s.execute_raw("INSERT INTO tablename (col1, col2, col3) VALUES (1, 'a', 'b')")
    .await
    .unwrap();

  s.create_table(&table(EXTENDED_FIELDS)).await.unwrap();
  // The extended layout is now the current one.
  s.create_table(&table(EXTENDED_FIELDS)).await.unwrap();
  s.execute_raw("UPDATE tablename SET newCol = 7 WHERE id = 1")
    .await
    .unwrap();
}

#[tokio::test]
async fn create_table_rejects_changed_columns() {
  let s = store().await;
  s.create_table(&table(FIELDS)).await.unwrap();

  let err = s.create_table(&table(CHANGED_FIELDS)).await.unwrap_err();
  match err {
    Error::StructureMismatch { table, columns } => {
      assert_eq!(table, "tablename");
      assert_eq!(columns, set(&["col3", "col4"]));
    }
    other => panic!("expected StructureMismatch, got {other:?}"),
  }
}

#[tokio::test]
async fn create_schema_rejects_foreign_document_table() {
  let dir = TempDir::new().unwrap();
  let path = dir.path().join("library.db");
  {
    let conn = rusqlite::Connection::open(&path).unwrap();
    conn
      .execute_batch(
        "CREATE TABLE document (id INTEGER PRIMARY KEY, path TEXT, date INTEGER)",
      )
      .unwrap();
  }

  let s = SqliteStore::open(&path).await.unwrap();
  let err = s.create_schema().await.unwrap_err();
  assert!(
    matches!(&err, Error::StructureMismatch { table, columns }
      if table == "document" && *columns == set(&["date"])),
    "{err:?}"
  );
}

// ─── Documents ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn insert_document_stores_iso_date() {
  let s = store().await;
  let date = NaiveDate::from_ymd_opt(2015, 12, 30).unwrap();

  let id = s
    .insert_document(&Document::new("/scans/simplepdf.pdf", date))
    .await
    .unwrap();

  let rows = s.documents().await.unwrap();
  assert_eq!(rows.len(), 1);
  let (row_id, path, stored) = &rows[0];
  assert_eq!(*row_id, id);
  assert_eq!(path, "/scans/simplepdf.pdf");
  assert_eq!(stored, "2015-12-30");
  assert_eq!(decode_date(stored).unwrap(), date);
}

#[tokio::test]
async fn insert_document_assigns_increasing_ids() {
  let s = store().await;
  let date = NaiveDate::from_ymd_opt(2016, 2, 29).unwrap();

  let a = s.insert_document(&Document::new("a.pdf", date)).await.unwrap();
  let b = s.insert_document(&Document::new("a.pdf", date)).await.unwrap();
  assert!(b > a);
  assert_eq!(s.documents().await.unwrap().len(), 2);
}

#[tokio::test]
async fn invalid_date_never_reaches_the_table() {
  let s = store().await;

  let result = Document::parse("simplepdf.pdf", "Test");
  assert!(matches!(result, Err(easydms_core::Error::InvalidDate(_))));
  assert!(s.documents().await.unwrap().is_empty());
}

// ─── Tags ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn unknown_tag_resolves_to_none() {
  let s = store().await;
  assert_eq!(s.primary_tag("nothing").await.unwrap(), None);
}

#[tokio::test]
async fn insert_tag_and_resolve_aliases() {
  let s = store().await;

  let tag = s
    .insert_tag("acme", &aliases(&["ACME Corp", "Acme Inc"]))
    .await
    .unwrap();
  assert_eq!(tag.primary, "acme");
  assert_eq!(tag.alternatives, set(&["ACME Corp", "Acme Inc"]));

  assert_eq!(s.primary_tag("Acme Inc").await.unwrap().as_deref(), Some("acme"));
  assert_eq!(s.primary_tag("ACME Corp").await.unwrap().as_deref(), Some("acme"));
  assert_eq!(s.primary_tag("acme").await.unwrap().as_deref(), Some("acme"));
  assert_eq!(
    s.tag_alternatives("acme").await.unwrap(),
    set(&["ACME Corp", "Acme Inc"])
  );
}

#[tokio::test]
async fn insert_tag_without_aliases() {
  let s = store().await;
  let tag = s.insert_tag("bank", &[]).await.unwrap();
  assert_eq!(tag.primary, "bank");
  assert!(tag.alternatives.is_empty());
  assert!(s.tag_alternatives("bank").await.unwrap().is_empty());
}

#[tokio::test]
async fn insert_tag_adds_aliases_to_existing_primary() {
  let s = store().await;
  s.insert_tag("acme", &aliases(&["ACME Corp"])).await.unwrap();

  let tag = s.insert_tag("acme", &aliases(&["Acme Inc"])).await.unwrap();
  assert_eq!(tag.alternatives, set(&["ACME Corp", "Acme Inc"]));
}

#[tokio::test]
async fn alias_equal_to_existing_primary_is_rejected() {
  let s = store().await;
  s.insert_tag("bank", &[]).await.unwrap();

  let err = s
    .insert_tag("acme", &aliases(&["Acme Inc", "bank", "ACME Corp"]))
    .await
    .unwrap_err();
  assert!(matches!(&err, Error::DuplicateAlias(a) if a == "bank"), "{err:?}");

  // Fail-fast: the alias before the conflict stays, the one after is never
  // inserted.
  assert_eq!(s.tag_alternatives("acme").await.unwrap(), set(&["Acme Inc"]));
  assert_eq!(s.primary_tag("ACME Corp").await.unwrap(), None);
}

#[tokio::test]
async fn alias_equal_to_existing_alias_is_rejected() {
  let s = store().await;
  s.insert_tag("acme", &aliases(&["Acme Inc"])).await.unwrap();

  let err = s
    .insert_tag("initech", &aliases(&["Acme Inc"]))
    .await
    .unwrap_err();
  assert!(matches!(&err, Error::DuplicateAlias(a) if a == "Acme Inc"));
  assert_eq!(s.primary_tag("Acme Inc").await.unwrap().as_deref(), Some("acme"));
  assert!(s.tag_alternatives("initech").await.unwrap().is_empty());
}

#[tokio::test]
async fn alias_equal_to_own_primary_is_rejected() {
  let s = store().await;
  let err = s.insert_tag("acme", &aliases(&["acme"])).await.unwrap_err();
  assert!(matches!(err, Error::DuplicateAlias(_)));
}

#[tokio::test]
async fn repeated_alias_in_one_call_is_rejected() {
  let s = store().await;
  let err = s
    .insert_tag("acme", &aliases(&["Acme Inc", "Acme Inc"]))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::DuplicateAlias(_)));
  assert_eq!(s.tag_alternatives("acme").await.unwrap(), set(&["Acme Inc"]));
}

#[tokio::test]
async fn primary_name_taken_by_alias_is_rejected() {
  let s = store().await;
  s.insert_tag("acme", &aliases(&["Acme Inc"])).await.unwrap();

  let err = s.insert_tag("Acme Inc", &[]).await.unwrap_err();
  assert!(matches!(&err, Error::DuplicateAlias(a) if a == "Acme Inc"));
}

#[tokio::test]
async fn alias_bound_to_two_primaries_is_corruption() {
  let s = store().await;
  s.insert_tag("acme", &[]).await.unwrap();
  s.insert_tag("initech", &[]).await.unwrap();
  // Bypass the insert checks: `acme` is now also an alias of `initech`.
  s.execute_raw("INSERT INTO tagalternative (name, tag) VALUES ('acme', 'initech')")
    .await
    .unwrap();

  let err = s.primary_tag("acme").await.unwrap_err();
  match err {
    Error::ContentCorruption { alias, primaries } => {
      assert_eq!(alias, "acme");
      assert_eq!(primaries, vec!["acme".to_owned(), "initech".to_owned()]);
    }
    other => panic!("expected ContentCorruption, got {other:?}"),
  }
  // Unrelated names still resolve.
  assert_eq!(s.primary_tag("initech").await.unwrap().as_deref(), Some("initech"));
}
