//! Album repository

use crate::error::Result;
use crate::models::Album;
use async_trait::async_trait;
use sqlx::{query_as, SqlitePool};

/// Album repository interface
#[async_trait]
pub trait AlbumRepository: Send + Sync {
    /// Create a new album and return its id.
    async fn create(&self, name: &str) -> Result<i64>;

    /// Look up an album by id.
    async fn get(&self, id: i64) -> Result<Option<Album>>;

    /// Whether an album contains a given media asset.
    async fn contains(&self, album_id: i64, media_id: i64) -> Result<bool>;
}

/// SQLite implementation of AlbumRepository
pub struct SqliteAlbumRepository {
    pool: SqlitePool,
}

impl SqliteAlbumRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AlbumRepository for SqliteAlbumRepository {
    async fn create(&self, name: &str) -> Result<i64> {
        let result = sqlx::query("INSERT INTO albums (name) VALUES (?)")
            .bind(name)
            .execute(&self.pool)
            .await?;

        Ok(result.last_insert_rowid())
    }

    async fn get(&self, id: i64) -> Result<Option<Album>> {
        let album = query_as::<_, Album>("SELECT * FROM albums WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(album)
    }

    async fn contains(&self, album_id: i64, media_id: i64) -> Result<bool> {
        let count: (i64,) = query_as(
            "SELECT COUNT(*) FROM album_media WHERE album_id = ? AND media_id = ?",
        )
        .bind(album_id)
        .bind(media_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count.0 > 0)
    }
}
