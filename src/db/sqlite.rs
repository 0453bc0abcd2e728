use crate::config::DatabaseConfig;
use crate::db::models::{DbCategory, DbSection, DbUser};
use crate::error::GalleryError;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::str::FromStr;

pub type SqlitePool = Pool<Sqlite>;

/// Open the pool described by `cfg`, creating the database file if needed.
pub async fn connect(cfg: &DatabaseConfig) -> Result<SqlitePool, GalleryError> {
    let connect_opts = SqliteConnectOptions::from_str(cfg.url.as_str())?
        .create_if_missing(true)
        .foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(cfg.max_connections.max(1))
        .connect_with(connect_opts)
        .await?;
    Ok(pool)
}

/// Queries over the fixed tables (users, sections, categories).
#[derive(Clone)]
pub struct GalleryStorage {
    pool: SqlitePool,
}

impl GalleryStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn find_user(&self, username: &str) -> Result<Option<DbUser>, GalleryError> {
        let user = sqlx::query_as::<_, DbUser>(
            "SELECT id, username, password_hash, created_at FROM users WHERE username = ?",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    /// Insert a user and return its id. Fails with a UNIQUE violation when
    /// the username is taken.
    pub async fn insert_user(
        &self,
        username: &str,
        password_hash: &str,
    ) -> Result<i64, GalleryError> {
        let result = sqlx::query("INSERT INTO users (username, password_hash) VALUES (?, ?)")
            .bind(username)
            .bind(password_hash)
            .execute(&self.pool)
            .await?;
        Ok(result.last_insert_rowid())
    }

    pub async fn count_users(&self) -> Result<i64, GalleryError> {
        let rec: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(rec.0)
    }

    pub async fn list_sections(&self) -> Result<Vec<DbSection>, GalleryError> {
        let rows =
            sqlx::query_as::<_, DbSection>("SELECT id, name, description FROM sections ORDER BY id")
                .fetch_all(&self.pool)
                .await?;
        Ok(rows)
    }

    pub async fn list_categories(&self) -> Result<Vec<DbCategory>, GalleryError> {
        let rows = sqlx::query_as::<_, DbCategory>(
            "SELECT id, name, description, section_id FROM categories ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn categories_in_section(
        &self,
        section_id: i64,
    ) -> Result<Vec<DbCategory>, GalleryError> {
        let rows = sqlx::query_as::<_, DbCategory>(
            "SELECT id, name, description, section_id FROM categories WHERE section_id = ? ORDER BY id",
        )
        .bind(section_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// User-visible table names, for the status probe.
    pub async fn list_tables(&self) -> Result<Vec<String>, GalleryError> {
        let rows: Vec<(String,)> = sqlx::query_as(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(|(name,)| name).collect())
    }
}
