//! Strata Storage Layer
//!
//! SQLite-based persistence for the tab hierarchy. One `save` boundary is
//! one transaction; in-memory state stays authoritative if a write fails.

mod database;
mod error;
mod migrations;

pub use database::Database;
pub use error::StorageError;

pub type Result<T> = std::result::Result<T, StorageError>;
