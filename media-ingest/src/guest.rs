//! # Guest Upload Gate
//!
//! Guest links let someone without an account contribute uploads, bounded by
//! an optional expiry and an optional upload budget. The gate validates a
//! link before any upload content is read or processed: an expired or
//! exhausted link is rejected without touching a single byte.
//!
//! Only completed imports consume budget. Duplicates and failures do not, so
//! a guest retrying a flaky connection is not silently drained to zero.

use crate::error::{IngestError, Result};
use crate::pipeline::{ImportOptions, ImportOutcome, MediaImportPipeline};
use bytes::Bytes;
use chrono::Utc;
use media_store::{GuestLink, GuestLinkRepository};
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Validates guest links and accounts for consumed uploads.
pub struct GuestQuotaGate {
    links: Arc<dyn GuestLinkRepository>,
}

impl GuestQuotaGate {
    pub fn new(links: Arc<dyn GuestLinkRepository>) -> Self {
        Self { links }
    }

    /// Validate a link for use right now.
    ///
    /// Fails with `Validation` for unknown or expired links and with
    /// `QuotaExceeded` for exhausted ones.
    pub async fn check(&self, link_id: &str) -> Result<GuestLink> {
        let link = self
            .links
            .get(link_id)
            .await?
            .ok_or_else(|| IngestError::validation(format!("unknown guest link {}", link_id)))?;

        if link.is_expired(Utc::now()) {
            return Err(IngestError::validation(format!(
                "guest link {} has expired",
                link_id
            )));
        }
        if link.is_exhausted() {
            return Err(IngestError::QuotaExceeded {
                link_id: link_id.to_string(),
            });
        }

        Ok(link)
    }

    /// Record `count` consumed uploads. A zero count is a no-op.
    pub async fn consume(&self, link_id: &str, count: i64) -> Result<()> {
        if count == 0 {
            return Ok(());
        }
        self.links.increment_uploads(link_id, count).await?;
        Ok(())
    }
}

/// One file in a guest upload batch.
#[derive(Debug)]
pub struct GuestUpload {
    pub filename: String,
    pub mime_type: Option<String>,
    pub data: Bytes,
}

/// Per-file result of a guest upload batch.
#[derive(Debug)]
pub enum GuestUploadResult {
    Imported(i64),
    Duplicate(i64),
    Failed { filename: String, message: String },
}

/// Accepts guest uploads through a quota-gated link.
pub struct GuestUploadService {
    gate: GuestQuotaGate,
    pipeline: Arc<MediaImportPipeline>,
}

impl GuestUploadService {
    pub fn new(links: Arc<dyn GuestLinkRepository>, pipeline: Arc<MediaImportPipeline>) -> Self {
        Self {
            gate: GuestQuotaGate::new(links),
            pipeline,
        }
    }

    /// Import a batch of uploads through a guest link.
    ///
    /// The link is validated before any content is processed, including that
    /// its remaining budget covers the whole batch. Files then import
    /// independently; only completed imports consume budget.
    #[instrument(skip(self, uploads), fields(link_id = %link_id, count = uploads.len()))]
    pub async fn upload(
        &self,
        link_id: &str,
        uploads: Vec<GuestUpload>,
    ) -> Result<Vec<GuestUploadResult>> {
        let link = self.gate.check(link_id).await?;

        if let Some(max) = link.max_uploads {
            if link.current_uploads + uploads.len() as i64 > max {
                return Err(IngestError::QuotaExceeded {
                    link_id: link_id.to_string(),
                });
            }
        }

        let options = ImportOptions {
            target_album_id: link.target_album_id,
        };

        let mut results = Vec::with_capacity(uploads.len());
        let mut imported = 0i64;
        for upload in uploads {
            match self
                .pipeline
                .import_upload(
                    &upload.filename,
                    upload.mime_type.as_deref(),
                    upload.data,
                    &options,
                )
                .await
            {
                Ok(ImportOutcome::Imported(asset)) => {
                    imported += 1;
                    results.push(GuestUploadResult::Imported(asset.id));
                }
                Ok(ImportOutcome::Duplicate(asset)) => {
                    results.push(GuestUploadResult::Duplicate(asset.id));
                }
                Err(e) => {
                    warn!(filename = %upload.filename, "Guest upload failed: {}", e);
                    results.push(GuestUploadResult::Failed {
                        filename: upload.filename,
                        message: e.to_string(),
                    });
                }
            }
        }

        self.gate.consume(link_id, imported).await?;
        info!(imported, total = results.len(), "Guest upload batch finished");
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ImportConfig;
    use crate::library::MediaLibrary;
    use chrono::Duration;
    use image::{DynamicImage, ImageFormat, RgbImage};
    use media_store::{
        create_test_pool, AlbumRepository, MediaRepository, SqliteAlbumRepository,
        SqliteGuestLinkRepository, SqliteMediaRepository,
    };
    use std::io::Cursor;

    struct Fixture {
        links: Arc<SqliteGuestLinkRepository>,
        media: Arc<SqliteMediaRepository>,
        albums: SqliteAlbumRepository,
        service: GuestUploadService,
    }

    async fn fixture() -> Fixture {
        let pool = create_test_pool().await.unwrap();
        let links = Arc::new(SqliteGuestLinkRepository::new(pool.clone()));
        let media = Arc::new(SqliteMediaRepository::new(pool.clone()));
        let albums = SqliteAlbumRepository::new(pool.clone());
        let library = Arc::new(MediaLibrary::new(
            std::env::temp_dir().join(format!("photoflow-guest-{}", uuid::Uuid::new_v4())),
        ));
        let pipeline = Arc::new(MediaImportPipeline::new(
            media.clone(),
            library,
            ImportConfig::default(),
        ));
        let service = GuestUploadService::new(links.clone(), pipeline);
        Fixture {
            links,
            media,
            albums,
            service,
        }
    }

    fn link(id: &str, max_uploads: Option<i64>) -> GuestLink {
        GuestLink {
            id: id.to_string(),
            expires_at: None,
            max_uploads,
            current_uploads: 0,
            target_album_id: None,
        }
    }

    fn upload(name: &str, seed: u8) -> GuestUpload {
        let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(32, 32, image::Rgb([seed, 0, 0])));
        let mut buf = Cursor::new(Vec::new());
        image.write_to(&mut buf, ImageFormat::Png).unwrap();
        GuestUpload {
            filename: name.to_string(),
            mime_type: Some("image/png".to_string()),
            data: Bytes::from(buf.into_inner()),
        }
    }

    #[tokio::test]
    async fn test_upload_consumes_budget_and_targets_album() {
        let fx = fixture().await;
        let album_id = fx.albums.create("Guests").await.unwrap();

        let mut l = link("g1", Some(5));
        l.target_album_id = Some(album_id);
        fx.links.create(&l).await.unwrap();

        let results = fx
            .service
            .upload("g1", vec![upload("a.png", 1), upload("b.png", 2)])
            .await
            .unwrap();

        assert_eq!(results.len(), 2);
        let stored = fx.links.get("g1").await.unwrap().unwrap();
        assert_eq!(stored.current_uploads, 2);

        for result in &results {
            match result {
                GuestUploadResult::Imported(id) => {
                    assert!(fx.albums.contains(album_id, *id).await.unwrap());
                }
                other => panic!("expected Imported, got {:?}", other),
            }
        }
    }

    #[tokio::test]
    async fn test_exhausted_link_rejected_before_any_processing() {
        let fx = fixture().await;
        let mut l = link("g1", Some(1));
        l.current_uploads = 1;
        fx.links.create(&l).await.unwrap();

        let err = fx
            .service
            .upload("g1", vec![upload("a.png", 1)])
            .await
            .unwrap_err();

        assert!(matches!(err, IngestError::QuotaExceeded { .. }));
        // Nothing reached the catalog
        assert_eq!(fx.media.list_provider_file_ids("upload").await.unwrap().len(), 0);
    }

    #[tokio::test]
    async fn test_batch_larger_than_remaining_budget_rejected() {
        let fx = fixture().await;
        fx.links.create(&link("g1", Some(1))).await.unwrap();

        let err = fx
            .service
            .upload("g1", vec![upload("a.png", 1), upload("b.png", 2)])
            .await
            .unwrap_err();

        assert!(matches!(err, IngestError::QuotaExceeded { .. }));
        assert_eq!(fx.links.get("g1").await.unwrap().unwrap().current_uploads, 0);
    }

    #[tokio::test]
    async fn test_expired_link_rejected() {
        let fx = fixture().await;
        let mut l = link("g1", None);
        l.expires_at = Some(Utc::now() - Duration::minutes(5));
        fx.links.create(&l).await.unwrap();

        let err = fx
            .service
            .upload("g1", vec![upload("a.png", 1)])
            .await
            .unwrap_err();
        assert!(matches!(err, IngestError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_duplicates_do_not_consume_budget() {
        let fx = fixture().await;
        fx.links.create(&link("g1", Some(10))).await.unwrap();

        fx.service
            .upload("g1", vec![upload("a.png", 7)])
            .await
            .unwrap();
        let results = fx
            .service
            .upload("g1", vec![upload("again.png", 7)])
            .await
            .unwrap();

        assert!(matches!(results[0], GuestUploadResult::Duplicate(_)));
        assert_eq!(fx.links.get("g1").await.unwrap().unwrap().current_uploads, 1);
    }

    #[tokio::test]
    async fn test_unknown_link_rejected() {
        let fx = fixture().await;
        let err = fx
            .service
            .upload("ghost", vec![upload("a.png", 1)])
            .await
            .unwrap_err();
        assert!(matches!(err, IngestError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_failed_item_does_not_consume_budget() {
        let fx = fixture().await;
        fx.links.create(&link("g1", Some(5))).await.unwrap();

        let results = fx
            .service
            .upload(
                "g1",
                vec![GuestUpload {
                    filename: "broken.png".to_string(),
                    mime_type: Some("image/png".to_string()),
                    data: Bytes::from_static(b"not an image"),
                }],
            )
            .await
            .unwrap();

        assert!(matches!(results[0], GuestUploadResult::Failed { .. }));
        assert_eq!(fx.links.get("g1").await.unwrap().unwrap().current_uploads, 0);
    }
}
