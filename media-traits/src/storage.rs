//! Storage backend capability interface
//!
//! Every backend (local filesystem, cloud picker, future additions) implements
//! `StorageProvider`; the import pipeline, bulk coordinator, and sync
//! orchestrator only ever talk to this trait.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};

use crate::error::Result;

/// Metadata for one file as reported by a storage backend.
#[derive(Debug, Clone)]
pub struct FileInfo {
    /// Backend-side identity; together with the provider id this forms the
    /// catalog deduplication key.
    pub id: String,
    /// Original file name, including extension when the backend knows it.
    pub name: String,
    /// MIME type, when the backend reports one.
    pub mime_type: Option<String>,
    /// Size in bytes, when known up front.
    pub size: Option<u64>,
    /// Capture time (best available), used for path derivation on import.
    pub taken_at: Option<DateTime<Utc>>,
    /// Last modification time on the backend.
    pub modified_at: Option<DateTime<Utc>>,
    pub is_folder: bool,
}

/// Capability interface every storage backend must implement.
///
/// All operations except `test_connection` may fail with a
/// [`ProviderError`](crate::ProviderError). Construction (the `initialize`
/// step: id, display name, configuration blob) is performed by the provider
/// factory before an instance is handed out.
///
/// # Example
///
/// ```ignore
/// use media_traits::StorageProvider;
///
/// async fn count_files(provider: &dyn StorageProvider) -> media_traits::Result<usize> {
///     let files = provider.list_files(None).await?;
///     Ok(files.iter().filter(|f| !f.is_folder).count())
/// }
/// ```
#[async_trait]
pub trait StorageProvider: Send + Sync {
    /// Stable identifier of this configured provider instance.
    fn provider_id(&self) -> &str;

    /// Human-readable display name.
    fn display_name(&self) -> &str;

    /// Whether this backend accepts uploads.
    fn supports_upload(&self) -> bool;

    /// Whether this backend can be watched for changes.
    fn supports_watch(&self) -> bool;

    /// List files, optionally below a backend-specific folder.
    async fn list_files(&self, folder_id: Option<&str>) -> Result<Vec<FileInfo>>;

    /// Download a file's full content into memory.
    async fn download_file(&self, file_id: &str) -> Result<Bytes>;

    /// Open a file for streaming reads.
    ///
    /// More efficient than `download_file` for large files.
    async fn open_file_stream(
        &self,
        file_id: &str,
    ) -> Result<Box<dyn tokio::io::AsyncRead + Send + Unpin>>;

    /// Delete a file.
    ///
    /// Returns `Ok(true)` if a file was removed and `Ok(false)` if it was
    /// already absent; re-running a delete against cleaned-up state is
    /// expected and is not an error.
    async fn delete_file(&self, file_id: &str) -> Result<bool>;

    /// Probe connectivity.
    ///
    /// Never errors: connectivity failure is reported as `false`.
    async fn test_connection(&self) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_info_construction() {
        let info = FileInfo {
            id: "abc".to_string(),
            name: "IMG_0001.jpg".to_string(),
            mime_type: Some("image/jpeg".to_string()),
            size: Some(2048),
            taken_at: None,
            modified_at: None,
            is_folder: false,
        };

        assert_eq!(info.id, "abc");
        assert!(!info.is_folder);
        assert_eq!(info.size, Some(2048));
    }
}
