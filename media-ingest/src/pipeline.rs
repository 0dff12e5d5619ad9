//! # Media Import Pipeline
//!
//! Imports one media file into the library as a five step saga:
//!
//! 1. Reserve a catalog placeholder (also the dedup gate)
//! 2. Normalize the content (photos: orientation + size bound)
//! 3. Write the original into the library
//! 4. Render a thumbnail (best-effort, photos only)
//! 5. Finalize the catalog row
//!
//! Failures after step 1 unwind the recorded compensation steps so no
//! partial import survives. A requested album attach is recorded before
//! finalization and unwinds with everything else. The one exception is the
//! thumbnail: a failed thumbnail is logged and the import continues
//! without it.
//!
//! ## Deduplication
//!
//! The unique constraint on `(provider_id, provider_file_id)` is the
//! authoritative dedup signal. A conflicting insert resolves to the existing
//! row: a finalized row short-circuits the import as a duplicate, a stale
//! placeholder from an interrupted import is adopted and never deleted by
//! this attempt's compensation.

use crate::config::{classify, file_extension, ImportConfig};
use crate::error::{IngestError, Result};
use crate::imaging;
use crate::library::MediaLibrary;
use crate::saga::{Compensation, CompensationStack};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use media_store::{
    AssetFinalization, MediaAsset, MediaRepository, MediaType, NewPlaceholder, PlaceholderOutcome,
};
use media_traits::{FileInfo, StorageProvider};
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Provider id recorded for direct uploads.
pub const UPLOAD_PROVIDER_ID: &str = "upload";

/// Per-import options.
#[derive(Debug, Clone, Default)]
pub struct ImportOptions {
    /// Album the imported asset is attached to after finalization
    pub target_album_id: Option<i64>,
}

/// Result of one import.
#[derive(Debug)]
pub enum ImportOutcome {
    /// The file was imported and finalized
    Imported(MediaAsset),
    /// A finalized record for the same source already existed
    Duplicate(MediaAsset),
}

impl ImportOutcome {
    pub fn asset(&self) -> &MediaAsset {
        match self {
            ImportOutcome::Imported(asset) | ImportOutcome::Duplicate(asset) => asset,
        }
    }

    pub fn is_duplicate(&self) -> bool {
        matches!(self, ImportOutcome::Duplicate(_))
    }
}

/// Identity and metadata of the file being imported.
struct ImportSource<'a> {
    provider_id: &'a str,
    provider_file_id: &'a str,
    original_filename: &'a str,
    mime_type: Option<&'a str>,
    media_type: MediaType,
    taken_at: Option<DateTime<Utc>>,
}

/// Imports media files into the catalog and library.
pub struct MediaImportPipeline {
    media: Arc<dyn MediaRepository>,
    library: Arc<MediaLibrary>,
    config: ImportConfig,
}

impl MediaImportPipeline {
    pub fn new(
        media: Arc<dyn MediaRepository>,
        library: Arc<MediaLibrary>,
        config: ImportConfig,
    ) -> Self {
        Self {
            media,
            library,
            config,
        }
    }

    /// Import one file from a storage provider.
    #[instrument(skip(self, provider, file), fields(provider_id = provider.provider_id(), file_id = %file.id))]
    pub async fn import_remote(
        &self,
        provider: &dyn StorageProvider,
        file: &FileInfo,
        options: &ImportOptions,
    ) -> Result<ImportOutcome> {
        let media_type = classify(file.mime_type.as_deref(), &file.name).ok_or_else(|| {
            IngestError::validation(format!("{} is not a photo or video", file.name))
        })?;

        let data = provider.download_file(&file.id).await?;

        self.import_bytes(
            ImportSource {
                provider_id: provider.provider_id(),
                provider_file_id: &file.id,
                original_filename: &file.name,
                mime_type: file.mime_type.as_deref(),
                media_type,
                taken_at: file.taken_at,
            },
            data,
            options,
        )
        .await
    }

    /// Import directly uploaded bytes.
    ///
    /// The dedup key is derived from the content, so uploading the same
    /// bytes twice yields a duplicate outcome instead of a second copy.
    #[instrument(skip(self, data), fields(filename = %filename, bytes = data.len()))]
    pub async fn import_upload(
        &self,
        filename: &str,
        mime_type: Option<&str>,
        data: Bytes,
        options: &ImportOptions,
    ) -> Result<ImportOutcome> {
        if data.len() as u64 > self.config.max_upload_bytes {
            return Err(IngestError::validation(format!(
                "upload of {} bytes exceeds the {} byte limit",
                data.len(),
                self.config.max_upload_bytes
            )));
        }

        let media_type = classify(mime_type, filename).ok_or_else(|| {
            IngestError::validation(format!("{} is not a photo or video", filename))
        })?;

        let provider_file_id = format!("upload-{:016x}", content_hash(&data));

        self.import_bytes(
            ImportSource {
                provider_id: UPLOAD_PROVIDER_ID,
                provider_file_id: &provider_file_id,
                original_filename: filename,
                mime_type,
                media_type,
                taken_at: None,
            },
            data,
            options,
        )
        .await
    }

    async fn import_bytes(
        &self,
        source: ImportSource<'_>,
        data: Bytes,
        options: &ImportOptions,
    ) -> Result<ImportOutcome> {
        // Step 1: reserve the catalog row
        let outcome = self
            .media
            .insert_placeholder(&NewPlaceholder {
                provider_id: source.provider_id.to_string(),
                provider_file_id: source.provider_file_id.to_string(),
                original_filename: source.original_filename.to_string(),
                media_type: source.media_type,
                date_taken: source.taken_at,
            })
            .await?;

        let mut stack = CompensationStack::new();
        let id = match outcome {
            PlaceholderOutcome::Finalized(asset) => {
                debug!(id = asset.id, "Source already imported, skipping");
                if let Some(album_id) = options.target_album_id {
                    self.media.attach_to_album(asset.id, album_id).await?;
                }
                return Ok(ImportOutcome::Duplicate(asset));
            }
            PlaceholderOutcome::Created { id } => {
                stack.push(Compensation::DeletePlaceholder(id));
                id
            }
            // A stale placeholder belongs to an earlier interrupted import;
            // adopt it but never delete it on this attempt's failure.
            PlaceholderOutcome::Reused { id } => id,
        };

        let asset = match self
            .store_content(id, &source, &data, options, &mut stack)
            .await
        {
            Ok(asset) => asset,
            Err(e) => {
                warn!(id, "Import failed, unwinding: {}", e);
                stack.unwind(self.media.as_ref()).await;
                return Err(e);
            }
        };

        info!(id, path = %asset.file_path, "Imported media file");
        Ok(ImportOutcome::Imported(asset))
    }

    /// Steps 2-5. Every durable side effect is pushed onto the stack,
    /// including the target-album attach, so a failure anywhere in here
    /// (the attach itself included) unwinds completely.
    async fn store_content(
        &self,
        id: i64,
        source: &ImportSource<'_>,
        data: &Bytes,
        options: &ImportOptions,
        stack: &mut CompensationStack,
    ) -> Result<MediaAsset> {
        let bucket = source.taken_at.unwrap_or_else(Utc::now);

        // Step 2: normalize content
        let (bytes, width, height, extension) = match source.media_type {
            MediaType::Photo => {
                let processed = imaging::prepare_photo(data, self.config.max_dimension)?;
                (
                    processed.bytes,
                    Some(processed.width as i64),
                    Some(processed.height as i64),
                    processed.extension.to_string(),
                )
            }
            // Videos are stored byte-for-byte as received
            MediaType::Video => (
                data.to_vec(),
                None,
                None,
                file_extension(
                    source.original_filename,
                    source.mime_type,
                    source.media_type,
                ),
            ),
        };

        // Step 3: write the original
        let rel_path = self.library.media_rel_path(id, bucket, &extension);
        self.library.write(&rel_path, &bytes).await?;
        stack.push(Compensation::RemoveFile(self.library.absolute(&rel_path)));

        // Step 4: thumbnail, best-effort
        let thumbnail_path = match source.media_type {
            MediaType::Photo => self.write_thumbnail(id, bucket, &bytes, stack).await,
            MediaType::Video => {
                debug!(id, "Skipping thumbnail for video");
                None
            }
        };

        // Target-album attach happens before finalization: the membership
        // row can still be compensated away while the catalog row is a
        // placeholder, and attaching to a deleted album fails the import
        // while the stack is still live.
        if let Some(album_id) = options.target_album_id {
            self.media.attach_to_album(id, album_id).await?;
            stack.push(Compensation::DetachFromAlbum {
                media_id: id,
                album_id,
            });
        }

        // Step 5: finalize the catalog row
        self.media
            .finalize(
                id,
                &AssetFinalization {
                    filename: format!("{}{}", id, extension),
                    file_path: rel_path,
                    thumbnail_path,
                    file_size: bytes.len() as i64,
                    width,
                    height,
                    date_taken: source.taken_at,
                },
            )
            .await?;

        self.media.find_by_id(id).await?.ok_or_else(|| {
            IngestError::validation(format!("finalized asset {} missing from catalog", id))
        })
    }

    async fn write_thumbnail(
        &self,
        id: i64,
        bucket: DateTime<Utc>,
        bytes: &[u8],
        stack: &mut CompensationStack,
    ) -> Option<String> {
        let thumbnail =
            match imaging::make_thumbnail(bytes, self.config.thumbnail_size, self.config.thumbnail_quality)
            {
                Ok(thumbnail) => thumbnail,
                Err(e) => {
                    warn!(id, "Thumbnail generation failed: {}", e);
                    return None;
                }
            };

        let rel_path = self.library.thumbnail_rel_path(id, bucket);
        match self.library.write(&rel_path, &thumbnail).await {
            Ok(()) => {
                stack.push(Compensation::RemoveFile(self.library.absolute(&rel_path)));
                Some(rel_path)
            }
            Err(e) => {
                warn!(id, "Thumbnail write failed: {}", e);
                None
            }
        }
    }
}

fn content_hash(data: &[u8]) -> u64 {
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    data.hash(&mut hasher);
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_hash_is_stable() {
        assert_eq!(content_hash(b"abc"), content_hash(b"abc"));
        assert_ne!(content_hash(b"abc"), content_hash(b"abd"));
    }

    #[test]
    fn test_outcome_accessors() {
        // Exercised through the integration tests; only shape checks here
        let options = ImportOptions::default();
        assert!(options.target_album_id.is_none());
    }
}
