//! # Bulk Operation Coordinator
//!
//! Runs multi-item deletes and imports with per-item isolation.
//!
//! Deletes carry a circuit breaker: after [`DELETE_FAILURE_LIMIT`] item
//! failures the run stops, records a synthetic failure entry describing the
//! stop, and leaves the remaining items untouched. A systemic problem (full
//! disk, wedged mount) should not grind through an entire selection.
//!
//! Each delete is atomic: catalog rows are removed in a transaction that only
//! commits after the library file and thumbnail are gone. A failed file or
//! thumbnail delete rolls the rows back, so the asset stays fully intact and
//! the delete can be retried.
//!
//! Imports have no breaker: items fail independently and the run always
//! covers the whole selection.

use crate::error::{IngestError, Result};
use crate::library::MediaLibrary;
use crate::pipeline::{ImportOptions, ImportOutcome, MediaImportPipeline};
use media_store::{MediaRepository, StoreError};
use media_traits::{FileInfo, StorageProvider};
use sqlx::SqlitePool;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Consecutive-or-not failure count at which a bulk delete stops.
pub const DELETE_FAILURE_LIMIT: usize = 3;

/// One failed item in a bulk run.
#[derive(Debug, Clone)]
pub struct BulkFailure {
    /// The item that failed (asset id or file name), or `"bulk-delete"` for
    /// the synthetic stop entry
    pub item: String,
    pub message: String,
}

/// Aggregate result of a bulk run.
#[derive(Debug, Default)]
pub struct BulkOutcome {
    pub succeeded: usize,
    pub failed: usize,
    /// Imports that resolved to an already-imported asset
    pub duplicates: usize,
    pub failures: Vec<BulkFailure>,
    /// Whether the delete breaker tripped before the selection was exhausted
    pub stopped_early: bool,
}

impl BulkOutcome {
    fn record_failure(&mut self, item: impl Into<String>, message: impl Into<String>) {
        self.failed += 1;
        self.failures.push(BulkFailure {
            item: item.into(),
            message: message.into(),
        });
    }
}

/// Coordinates bulk deletes and imports over the catalog and library.
pub struct BulkOperationCoordinator {
    pool: SqlitePool,
    media: Arc<dyn MediaRepository>,
    library: Arc<MediaLibrary>,
}

impl BulkOperationCoordinator {
    pub fn new(pool: SqlitePool, media: Arc<dyn MediaRepository>, library: Arc<MediaLibrary>) -> Self {
        Self {
            pool,
            media,
            library,
        }
    }

    /// Delete a selection of assets, stopping after [`DELETE_FAILURE_LIMIT`]
    /// failures.
    #[instrument(skip(self, ids), fields(count = ids.len()))]
    pub async fn delete_assets(&self, ids: &[i64]) -> BulkOutcome {
        let mut outcome = BulkOutcome::default();

        for &id in ids {
            if outcome.failed >= DELETE_FAILURE_LIMIT {
                warn!(
                    failed = outcome.failed,
                    remaining = ids.len() - outcome.succeeded - outcome.failed,
                    "Stopping bulk delete"
                );
                outcome.failures.push(BulkFailure {
                    item: "bulk-delete".to_string(),
                    message: format!("stopped after {} failures", DELETE_FAILURE_LIMIT),
                });
                outcome.stopped_early = true;
                break;
            }

            match self.delete_one(id).await {
                Ok(()) => outcome.succeeded += 1,
                Err(e) => {
                    warn!(id, "Delete failed: {}", e);
                    outcome.record_failure(id.to_string(), e.to_string());
                }
            }
        }

        info!(
            succeeded = outcome.succeeded,
            failed = outcome.failed,
            stopped_early = outcome.stopped_early,
            "Bulk delete finished"
        );
        outcome
    }

    /// Delete one asset: rows and files together or not at all.
    async fn delete_one(&self, id: i64) -> Result<()> {
        let asset = self
            .media
            .fetch_any(id)
            .await?
            .ok_or_else(|| IngestError::validation(format!("media asset {} not found", id)))?;

        let mut tx = self.pool.begin().await.map_err(StoreError::from)?;
        sqlx::query("DELETE FROM album_media WHERE media_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(StoreError::from)?;
        sqlx::query("DELETE FROM tag_media WHERE media_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(StoreError::from)?;
        sqlx::query("DELETE FROM media_assets WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(StoreError::from)?;

        // Remove the files before committing; a failure on either drops the
        // transaction and the rows roll back untouched. An already-absent
        // file is fine (`delete` returns Ok(false)), only a real I/O error
        // fails the item.
        if !asset.file_path.is_empty() {
            self.library.delete(&asset.file_path).await?;

            if let Some(thumbnail) = &asset.thumbnail_path {
                self.library.delete(thumbnail).await?;
            }
        }

        tx.commit().await.map_err(StoreError::from)?;
        Ok(())
    }

    /// Import a selection of provider files. Items fail independently; the
    /// whole selection is always attempted.
    #[instrument(skip_all, fields(provider_id = provider.provider_id(), count = files.len()))]
    pub async fn import_batch(
        &self,
        provider: &dyn StorageProvider,
        files: &[FileInfo],
        pipeline: &MediaImportPipeline,
        options: &ImportOptions,
    ) -> BulkOutcome {
        let mut outcome = BulkOutcome::default();

        for file in files {
            match pipeline.import_remote(provider, file, options).await {
                Ok(ImportOutcome::Imported(_)) => outcome.succeeded += 1,
                Ok(ImportOutcome::Duplicate(_)) => {
                    outcome.succeeded += 1;
                    outcome.duplicates += 1;
                }
                Err(e) => {
                    warn!(file = %file.name, "Import failed: {}", e);
                    outcome.record_failure(file.name.clone(), e.to_string());
                }
            }
        }

        info!(
            succeeded = outcome.succeeded,
            failed = outcome.failed,
            duplicates = outcome.duplicates,
            "Batch import finished"
        );
        outcome
    }
}
