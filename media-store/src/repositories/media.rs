//! Media asset repository trait and implementation

use crate::error::{Result, StoreError};
use crate::models::{MediaAsset, MediaType};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{query_as, SqlitePool};
use tracing::debug;

/// Input for placeholder creation (step 1 of the import pipeline).
#[derive(Debug, Clone)]
pub struct NewPlaceholder {
    pub provider_id: String,
    pub provider_file_id: String,
    pub original_filename: String,
    pub media_type: MediaType,
    pub date_taken: Option<DateTime<Utc>>,
}

/// Result of a placeholder insert against the dedup constraint.
#[derive(Debug, Clone)]
pub enum PlaceholderOutcome {
    /// A new placeholder row was created; compensation may delete it.
    Created { id: i64 },
    /// An unfinalized placeholder for the same dedup key already existed
    /// (e.g. from an interrupted import); it is reused and must never be
    /// deleted as compensation.
    Reused { id: i64 },
    /// A finalized record for the same dedup key already exists; the import
    /// short-circuits without touching it.
    Finalized(MediaAsset),
}

/// Fields written during finalization (step 5 of the import pipeline).
#[derive(Debug, Clone)]
pub struct AssetFinalization {
    pub filename: String,
    pub file_path: String,
    pub thumbnail_path: Option<String>,
    pub file_size: i64,
    pub width: Option<i64>,
    pub height: Option<i64>,
    pub date_taken: Option<DateTime<Utc>>,
}

/// Media asset repository interface for data access operations
#[async_trait]
pub trait MediaRepository: Send + Sync {
    /// Insert a placeholder row to reserve a stable id before any file I/O.
    ///
    /// The unique constraint on `(provider_id, provider_file_id)` is the
    /// authoritative dedup signal: a conflict resolves to the existing row
    /// instead of creating a second one.
    async fn insert_placeholder(&self, placeholder: &NewPlaceholder) -> Result<PlaceholderOutcome>;

    /// Commit the final file paths and dimensions onto a placeholder.
    async fn finalize(&self, id: i64, finalization: &AssetFinalization) -> Result<()>;

    /// Delete a placeholder row.
    ///
    /// Guarded so a finalized record can never be removed through this path;
    /// returns `Ok(false)` when no placeholder with this id exists.
    async fn delete_placeholder(&self, id: i64) -> Result<bool>;

    /// Find a finalized asset by id. Placeholders are never returned.
    async fn find_by_id(&self, id: i64) -> Result<Option<MediaAsset>>;

    /// Find a finalized asset by its dedup key. Placeholders are never
    /// returned.
    async fn find_by_provider_file(
        &self,
        provider_id: &str,
        provider_file_id: &str,
    ) -> Result<Option<MediaAsset>>;

    /// Fetch a row by id including placeholders. Internal maintenance use
    /// (bulk delete, compensation checks), not a read API.
    async fn fetch_any(&self, id: i64) -> Result<Option<MediaAsset>>;

    /// All provider file ids known to the catalog for one provider,
    /// placeholders included so an in-flight import is not re-scheduled.
    async fn list_provider_file_ids(&self, provider_id: &str) -> Result<Vec<String>>;

    /// Attach an asset to an album; attaching twice is a no-op.
    async fn attach_to_album(&self, media_id: i64, album_id: i64) -> Result<()>;

    /// Remove an asset's album membership; absent membership is a no-op.
    async fn detach_from_album(&self, media_id: i64, album_id: i64) -> Result<()>;

    /// Count finalized assets.
    async fn count(&self) -> Result<i64>;
}

/// SQLite implementation of MediaRepository
pub struct SqliteMediaRepository {
    pool: SqlitePool,
}

impl SqliteMediaRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn fetch_by_dedup_key(
        &self,
        provider_id: &str,
        provider_file_id: &str,
    ) -> Result<Option<MediaAsset>> {
        let asset = query_as::<_, MediaAsset>(
            "SELECT * FROM media_assets WHERE provider_id = ? AND provider_file_id = ?",
        )
        .bind(provider_id)
        .bind(provider_file_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(asset)
    }
}

#[async_trait]
impl MediaRepository for SqliteMediaRepository {
    async fn insert_placeholder(&self, placeholder: &NewPlaceholder) -> Result<PlaceholderOutcome> {
        if placeholder.provider_file_id.is_empty() {
            return Err(StoreError::InvalidInput {
                field: "provider_file_id".to_string(),
                message: "must not be empty".to_string(),
            });
        }

        let result = sqlx::query(
            r#"
            INSERT INTO media_assets
                (filename, original_filename, file_path, file_size, media_type,
                 date_taken, date_added, provider_id, provider_file_id)
            VALUES ('', ?, '', 0, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&placeholder.original_filename)
        .bind(placeholder.media_type)
        .bind(placeholder.date_taken)
        .bind(Utc::now())
        .bind(&placeholder.provider_id)
        .bind(&placeholder.provider_file_id)
        .execute(&self.pool)
        .await;

        match result {
            Ok(res) => {
                let id = res.last_insert_rowid();
                debug!(id, provider_file_id = %placeholder.provider_file_id, "Created placeholder");
                Ok(PlaceholderOutcome::Created { id })
            }
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                // The conflict is the dedup signal: resolve to the surviving row.
                let existing = self
                    .fetch_by_dedup_key(&placeholder.provider_id, &placeholder.provider_file_id)
                    .await?
                    .ok_or_else(|| StoreError::NotFound {
                        entity_type: "MediaAsset".to_string(),
                        id: placeholder.provider_file_id.clone(),
                    })?;

                if existing.is_placeholder() {
                    Ok(PlaceholderOutcome::Reused { id: existing.id })
                } else {
                    Ok(PlaceholderOutcome::Finalized(existing))
                }
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn finalize(&self, id: i64, finalization: &AssetFinalization) -> Result<()> {
        if finalization.file_path.is_empty() {
            return Err(StoreError::InvalidInput {
                field: "file_path".to_string(),
                message: "finalization requires a non-empty file path".to_string(),
            });
        }

        let result = sqlx::query(
            r#"
            UPDATE media_assets SET
                filename = ?, file_path = ?, thumbnail_path = ?,
                file_size = ?, width = ?, height = ?, date_taken = ?
            WHERE id = ?
            "#,
        )
        .bind(&finalization.filename)
        .bind(&finalization.file_path)
        .bind(&finalization.thumbnail_path)
        .bind(finalization.file_size)
        .bind(finalization.width)
        .bind(finalization.height)
        .bind(finalization.date_taken)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound {
                entity_type: "MediaAsset".to_string(),
                id: id.to_string(),
            });
        }

        Ok(())
    }

    async fn delete_placeholder(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM media_assets WHERE id = ? AND file_path = ''")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<MediaAsset>> {
        let asset = query_as::<_, MediaAsset>(
            "SELECT * FROM media_assets WHERE id = ? AND file_path != ''",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(asset)
    }

    async fn find_by_provider_file(
        &self,
        provider_id: &str,
        provider_file_id: &str,
    ) -> Result<Option<MediaAsset>> {
        Ok(self
            .fetch_by_dedup_key(provider_id, provider_file_id)
            .await?
            .filter(|asset| !asset.is_placeholder()))
    }

    async fn fetch_any(&self, id: i64) -> Result<Option<MediaAsset>> {
        let asset = query_as::<_, MediaAsset>("SELECT * FROM media_assets WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(asset)
    }

    async fn list_provider_file_ids(&self, provider_id: &str) -> Result<Vec<String>> {
        let rows: Vec<(String,)> =
            query_as("SELECT provider_file_id FROM media_assets WHERE provider_id = ?")
                .bind(provider_id)
                .fetch_all(&self.pool)
                .await?;

        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    async fn attach_to_album(&self, media_id: i64, album_id: i64) -> Result<()> {
        sqlx::query("INSERT OR IGNORE INTO album_media (album_id, media_id) VALUES (?, ?)")
            .bind(album_id)
            .bind(media_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn detach_from_album(&self, media_id: i64, album_id: i64) -> Result<()> {
        sqlx::query("DELETE FROM album_media WHERE album_id = ? AND media_id = ?")
            .bind(album_id)
            .bind(media_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn count(&self) -> Result<i64> {
        let total: (i64,) = query_as("SELECT COUNT(*) FROM media_assets WHERE file_path != ''")
            .fetch_one(&self.pool)
            .await?;

        Ok(total.0)
    }
}
