//! SQL DDL for the fixed tables.
//! Category listing tables are created per registry entry by the migrations.

/// Bookkeeping for [`crate::db::migrate`]; always created first.
pub const MIGRATIONS_INIT: &str = r#"
CREATE TABLE IF NOT EXISTS schema_migrations (
    version INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    applied_at TEXT NOT NULL -- RFC3339
)
"#;

/// SQLite schema with:
/// - `users.username` UNIQUE, password stored as a PHC string
/// - `sections` / `categories` reference data, ids fixed by the registry
pub const SQLITE_INIT: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    username TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,
    created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
);

CREATE TABLE IF NOT EXISTS sections (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    description TEXT NULL
);

CREATE TABLE IF NOT EXISTS categories (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    description TEXT NULL,
    section_id INTEGER NOT NULL REFERENCES sections(id)
);

CREATE INDEX IF NOT EXISTS idx_categories_section_id ON categories(section_id);
"#;
