//! Database module: models, schema and migrations for persistent storage.
//!
//! Layout:
//! - `models.rs`: Rust structs mirroring DB rows
//! - `schema.rs`: SQL DDL for the fixed tables (SQLite-first)
//! - `migrate.rs`: versioned startup migrations, including category tables
//! - `sqlite.rs`: pool setup and queries over the fixed tables

pub mod migrate;
pub mod models;
pub mod schema;
pub mod sqlite;

pub use models::{DbCategory, DbSection, DbUser};
pub use schema::SQLITE_INIT;
pub use sqlite::{GalleryStorage, SqlitePool, connect};
