//! Versioned schema migrations, applied once at startup before serving.

use crate::catalog;
use crate::db::schema::{MIGRATIONS_INIT, SQLITE_INIT};
use crate::db::sqlite::SqlitePool;
use crate::error::GalleryError;
use crate::listing::{Ident, create_listing_table, ensure_columns};
use chrono::Utc;
use sqlx::SqliteConnection;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy)]
pub struct Migration {
    pub version: i64,
    pub name: &'static str,
}

pub const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "base tables",
    },
    Migration {
        version: 2,
        name: "seed sections and categories",
    },
    Migration {
        version: 3,
        name: "category listing tables",
    },
];

/// Apply every pending migration, each in its own transaction.
/// Returns the versions applied by this call.
pub async fn run(pool: &SqlitePool) -> Result<Vec<i64>, GalleryError> {
    sqlx::query(MIGRATIONS_INIT).execute(pool).await?;

    let current: (Option<i64>,) = sqlx::query_as("SELECT MAX(version) FROM schema_migrations")
        .fetch_one(pool)
        .await?;
    let current = current.0.unwrap_or(0);

    let mut applied = Vec::new();
    for migration in MIGRATIONS.iter().filter(|m| m.version > current) {
        let mut tx = pool.begin().await?;
        apply(migration.version, &mut *tx).await?;
        sqlx::query("INSERT INTO schema_migrations (version, name, applied_at) VALUES (?, ?, ?)")
            .bind(migration.version)
            .bind(migration.name)
            .bind(Utc::now().to_rfc3339())
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        info!(version = migration.version, name = migration.name, "migration applied");
        applied.push(migration.version);
    }
    if applied.is_empty() {
        debug!(version = current, "schema up to date");
    }
    Ok(applied)
}

async fn apply(version: i64, conn: &mut SqliteConnection) -> Result<(), GalleryError> {
    match version {
        1 => execute_script(conn, SQLITE_INIT).await,
        2 => seed_reference_data(conn).await,
        3 => create_category_tables(conn).await,
        other => Err(GalleryError::Config(format!("unknown migration version {other}"))),
    }
}

// sqlx::query runs a single statement, so split the bundled DDL.
async fn execute_script(conn: &mut SqliteConnection, script: &str) -> Result<(), GalleryError> {
    for stmt in script.split(';') {
        let s = stmt.trim();
        if s.is_empty() {
            continue;
        }
        sqlx::query(s).execute(&mut *conn).await?;
    }
    Ok(())
}

async fn seed_reference_data(conn: &mut SqliteConnection) -> Result<(), GalleryError> {
    for section in catalog::sections() {
        sqlx::query("INSERT OR IGNORE INTO sections (id, name, description) VALUES (?, ?, ?)")
            .bind(section.id)
            .bind(section.name)
            .bind(section.description)
            .execute(&mut *conn)
            .await?;
    }
    for category in catalog::categories() {
        sqlx::query(
            "INSERT OR IGNORE INTO categories (id, name, description, section_id) VALUES (?, ?, ?, ?)",
        )
        .bind(category.id)
        .bind(category.name)
        .bind(category.description)
        .bind(category.section_id)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

async fn create_category_tables(conn: &mut SqliteConnection) -> Result<(), GalleryError> {
    for category in catalog::categories() {
        let table = Ident::parse(category.table)?;
        create_listing_table(conn, &table).await?;
        let columns = category
            .known_attributes()
            .into_iter()
            .map(Ident::parse_attribute)
            .collect::<Result<Vec<_>, _>>()?;
        ensure_columns(conn, &table, &columns).await?;
    }
    Ok(())
}
