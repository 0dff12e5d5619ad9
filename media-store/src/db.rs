//! # Database Connection Pool Module
//!
//! Provides SQLite connection pooling with the configuration the catalog
//! needs.
//!
//! ## Features
//!
//! - **WAL Mode**: enabled for better concurrency (multiple readers, one writer)
//! - **Connection Pooling**: configurable min/max connections with timeouts
//! - **Foreign Keys**: enforced for referential integrity
//! - **Schema Bootstrap**: tables and indexes created on initialization
//!
//! ## Testing
//!
//! For tests, use an in-memory database:
//!
//! ```rust,ignore
//! let pool = create_test_pool().await?;
//! ```

use crate::{Result, StoreError};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Pool, Sqlite, SqlitePool};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

/// Database configuration for the SQLite connection pool
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Database URL (`sqlite:catalog.db` or `sqlite::memory:`)
    pub database_url: String,

    /// Minimum number of connections in the pool
    pub min_connections: u32,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Maximum time to wait for a connection from the pool
    pub acquire_timeout: Duration,

    /// Maximum idle time for a connection before being closed
    pub idle_timeout: Option<Duration>,
}

impl DatabaseConfig {
    /// Create a configuration pointing at a database file.
    pub fn new(database_path: impl Into<PathBuf>) -> Self {
        let path = database_path.into();
        Self {
            database_url: format!("sqlite:{}", path.display()),
            min_connections: 1,
            max_connections: 5,
            acquire_timeout: Duration::from_secs(30),
            idle_timeout: Some(Duration::from_secs(600)),
        }
    }

    /// Create a configuration for an in-memory database.
    ///
    /// Pinned to a single connection: every SQLite `:memory:` connection is
    /// its own database, so a larger pool would split state across databases.
    pub fn in_memory() -> Self {
        Self {
            database_url: "sqlite::memory:".to_string(),
            min_connections: 1,
            max_connections: 1,
            acquire_timeout: Duration::from_secs(30),
            idle_timeout: None,
        }
    }

    /// Set the maximum number of connections
    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    /// Set the connection acquire timeout
    pub fn acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = timeout;
        self
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self::in_memory()
    }
}

/// Create a configured SQLite connection pool and bootstrap the schema.
///
/// # Errors
///
/// Returns an error if the database file cannot be accessed, pool creation
/// fails, or schema creation fails.
pub async fn create_pool(config: DatabaseConfig) -> Result<Pool<Sqlite>> {
    info!(database_url = %config.database_url, "Creating database pool");

    let options = SqliteConnectOptions::from_str(&config.database_url)
        .map_err(StoreError::Database)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal)
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .min_connections(config.min_connections)
        .max_connections(config.max_connections)
        .acquire_timeout(config.acquire_timeout)
        .idle_timeout(config.idle_timeout)
        .connect_with(options)
        .await?;

    init_schema(&pool).await?;

    // Health check
    sqlx::query("SELECT 1").execute(&pool).await?;
    debug!("Database pool ready");

    Ok(pool)
}

/// Create an in-memory pool for tests.
pub async fn create_test_pool() -> Result<Pool<Sqlite>> {
    create_pool(DatabaseConfig::in_memory()).await
}

/// Create all catalog tables and indexes if they do not exist.
async fn init_schema(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS media_assets (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            filename TEXT NOT NULL DEFAULT '',
            original_filename TEXT NOT NULL,
            file_path TEXT NOT NULL DEFAULT '',
            thumbnail_path TEXT,
            file_size INTEGER NOT NULL DEFAULT 0,
            width INTEGER,
            height INTEGER,
            media_type TEXT NOT NULL,
            date_taken TEXT,
            date_added TEXT NOT NULL,
            provider_id TEXT NOT NULL,
            provider_file_id TEXT NOT NULL,
            UNIQUE (provider_id, provider_file_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_media_assets_provider
        ON media_assets (provider_id)
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS albums (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS album_media (
            album_id INTEGER NOT NULL REFERENCES albums (id),
            media_id INTEGER NOT NULL REFERENCES media_assets (id),
            PRIMARY KEY (album_id, media_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS tags (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS tag_media (
            tag_id INTEGER NOT NULL REFERENCES tags (id),
            media_id INTEGER NOT NULL REFERENCES media_assets (id),
            PRIMARY KEY (tag_id, media_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS provider_configs (
            id TEXT PRIMARY KEY,
            provider_type TEXT NOT NULL,
            display_name TEXT NOT NULL,
            enabled INTEGER NOT NULL DEFAULT 1,
            config TEXT NOT NULL DEFAULT '{}',
            last_sync_at TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS picker_sessions (
            provider_id TEXT PRIMARY KEY REFERENCES provider_configs (id),
            session_id TEXT NOT NULL,
            picker_uri TEXT NOT NULL,
            media_items_set INTEGER NOT NULL DEFAULT 0,
            expires_at TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS guest_links (
            id TEXT PRIMARY KEY,
            expires_at TEXT,
            max_uploads INTEGER,
            current_uploads INTEGER NOT NULL DEFAULT 0,
            target_album_id INTEGER REFERENCES albums (id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_test_pool() {
        let pool = create_test_pool().await.unwrap();

        // Schema should be in place
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM media_assets")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count.0, 0);
    }

    #[tokio::test]
    async fn test_dedup_key_unique_constraint() {
        let pool = create_test_pool().await.unwrap();

        let insert = r#"
            INSERT INTO media_assets
                (original_filename, media_type, date_added, provider_id, provider_file_id)
            VALUES ('a.jpg', 'photo', '2024-01-01T00:00:00Z', 'local', 'f1')
        "#;

        sqlx::query(insert).execute(&pool).await.unwrap();
        let second = sqlx::query(insert).execute(&pool).await;

        let err = second.unwrap_err();
        match err {
            sqlx::Error::Database(db) => assert!(db.is_unique_violation()),
            other => panic!("expected unique violation, got {:?}", other),
        }
    }

    #[test]
    fn test_in_memory_config_single_connection() {
        let config = DatabaseConfig::in_memory();
        assert_eq!(config.max_connections, 1);
    }
}
