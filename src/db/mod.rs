//! Database module: models and schema for persistent storage.
//!
//! Layout:
//! - `models.rs`: Rust structs mirroring DB rows and conversions
//! - `schema.rs`: SQL DDL for initializing the database (SQLite-first)
//! - `sqlite.rs`: the `Storage` handle shared through the router state

pub mod models;
pub mod schema;
pub mod sqlite;

pub use models::{Account, GenerationRecord, LedgerEntry, LedgerReason, Portrait, PortraitSource};
pub use schema::SQLITE_INIT;
pub use sqlite::{SqlitePool, Storage};
