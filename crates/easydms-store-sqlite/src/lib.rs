//! SQLite backend for the easydms document library.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated
//! connection thread without blocking the async runtime.

mod encode;
mod store;

pub mod error;
pub mod schema;

pub use error::{Error, Result};
pub use store::SqliteStore;

#[cfg(test)]
mod tests;
