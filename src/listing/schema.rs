//! Column-level schema evolution for category tables.
//!
//! Everything here runs on a caller-provided connection so migrations can
//! use it inside their transaction and the schema actor on a pooled one.

use crate::error::GalleryError;
use crate::listing::ident::Ident;
use sqlx::SqliteConnection;
use std::collections::HashSet;
use tracing::{debug, info};

pub const IMAGE_URL_COLUMN: &str = "image_url";

/// Create an empty listing table if it does not exist yet.
pub async fn create_listing_table(
    conn: &mut SqliteConnection,
    table: &Ident,
) -> Result<(), GalleryError> {
    let ddl = format!(
        "CREATE TABLE IF NOT EXISTS {table} (\
            id INTEGER PRIMARY KEY AUTOINCREMENT, \
            {IMAGE_URL_COLUMN} TEXT NULL\
        )"
    );
    sqlx::query(&ddl).execute(&mut *conn).await?;
    Ok(())
}

/// Column names of `table` in declaration order, lower-cased.
/// Empty when the table does not exist.
pub async fn table_columns(
    conn: &mut SqliteConnection,
    table: &Ident,
) -> Result<Vec<String>, GalleryError> {
    let rows: Vec<(String,)> =
        sqlx::query_as("SELECT name FROM pragma_table_info(?) ORDER BY cid")
            .bind(table.as_str())
            .fetch_all(&mut *conn)
            .await?;
    Ok(rows
        .into_iter()
        .map(|(name,)| name.to_ascii_lowercase())
        .collect())
}

/// Add every missing column of `columns` to `table` as nullable TEXT.
///
/// Returns the columns this call actually added. A "duplicate column" error
/// means someone else added it between our check and our ALTER, which is
/// the outcome we wanted. Columns added before a failure stay in place.
pub async fn ensure_columns(
    conn: &mut SqliteConnection,
    table: &Ident,
    columns: &[Ident],
) -> Result<Vec<Ident>, GalleryError> {
    let existing = table_columns(conn, table).await?;
    if existing.is_empty() {
        return Err(GalleryError::TableNotFound(table.as_str().to_string()));
    }
    let mut existing: HashSet<String> = existing.into_iter().collect();

    let mut added = Vec::new();
    for column in columns {
        if existing.contains(column.as_str()) {
            continue;
        }
        let ddl = format!("ALTER TABLE {table} ADD COLUMN {column} TEXT NULL");
        match sqlx::query(&ddl)
            .execute(&mut *conn)
            .await
            .map_err(GalleryError::from)
        {
            Ok(_) => {
                info!(table = %table.as_str(), column = %column.as_str(), "added listing column");
                added.push(column.clone());
            }
            Err(e) if e.is_duplicate_column() => {
                debug!(table = %table.as_str(), column = %column.as_str(), "column appeared concurrently");
            }
            Err(e) => return Err(e),
        }
        existing.insert(column.as_str().to_string());
    }
    Ok(added)
}
