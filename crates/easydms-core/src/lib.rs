//! Core types and services for the easydms document filer.
//!
//! This crate is deliberately free of database dependencies. It holds the
//! domain types, the interactive prompts, the filing policy and the
//! [`DocumentStore`](store::DocumentStore) trait that storage backends
//! implement.

pub mod calendar;
pub mod document;
pub mod error;
pub mod filing;
pub mod prompt;
pub mod store;
pub mod tag;

pub use error::{Error, Result};
