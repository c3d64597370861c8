//! Tags: canonical names and the aliases that resolve to them.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// A primary tag together with every alias bound to it.
///
/// The primary name is implicitly its own alias and is not repeated in
/// `alternatives`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
  pub primary:      String,
  pub alternatives: BTreeSet<String>,
}

impl Tag {
  pub fn new(primary: impl Into<String>) -> Self {
    Self { primary: primary.into(), alternatives: BTreeSet::new() }
  }
}
