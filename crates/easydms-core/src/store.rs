//! The `DocumentStore` trait.
//!
//! The trait is implemented by storage backends (e.g. `easydms-store-sqlite`).
//! The command-line front end depends on this abstraction, not on any
//! concrete backend.

use std::{collections::BTreeSet, future::Future};

use crate::{document::Document, tag::Tag};

/// Abstraction over an easydms bookkeeping backend.
///
/// Document records are append-only. Tags can be added and aliased but never
/// renamed or removed.
pub trait DocumentStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Schema ────────────────────────────────────────────────────────────

  /// Make sure every table exists with the expected columns.
  ///
  /// Calling this repeatedly is a no-op. Tables missing some columns are
  /// extended; any other difference is an error.
  fn create_schema(&self) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Documents ─────────────────────────────────────────────────────────

  /// Append a document record and return its assigned id.
  fn insert_document<'a>(
    &'a self,
    document: &'a Document,
  ) -> impl Future<Output = Result<i64, Self::Error>> + Send + 'a;

  // ── Tags ──────────────────────────────────────────────────────────────

  /// Resolve a tag name or alias to its primary name.
  ///
  /// Returns `None` for unknown names. An alias bound to more than one
  /// primary is reported as an error rather than resolved arbitrarily.
  fn primary_tag<'a>(
    &'a self,
    name: &'a str,
  ) -> impl Future<Output = Result<Option<String>, Self::Error>> + Send + 'a;

  /// All aliases bound to `primary`, excluding `primary` itself.
  fn tag_alternatives<'a>(
    &'a self,
    primary: &'a str,
  ) -> impl Future<Output = Result<BTreeSet<String>, Self::Error>> + Send + 'a;

  /// Register `name` as a primary tag (if it is not one already) and bind
  /// each of `alternatives` to it.
  ///
  /// Aliases are checked one by one against every known name. The first
  /// alias that is already taken aborts the call; aliases bound before it
  /// are kept.
  fn insert_tag<'a>(
    &'a self,
    name: &'a str,
    alternatives: &'a [String],
  ) -> impl Future<Output = Result<Tag, Self::Error>> + Send + 'a;
}
