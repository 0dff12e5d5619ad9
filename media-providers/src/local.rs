//! Local filesystem storage provider

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use media_traits::{FileInfo, ProviderError, Result, StorageProvider};
use std::path::{Component, Path, PathBuf};
use tracing::{debug, instrument};

/// Storage provider backed by a directory on the local filesystem.
///
/// File ids are paths relative to the provider root. Ids that are absolute
/// or escape the root with `..` are rejected.
pub struct LocalProvider {
    provider_id: String,
    display_name: String,
    root: PathBuf,
}

impl LocalProvider {
    pub fn new(
        provider_id: impl Into<String>,
        display_name: impl Into<String>,
        root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            provider_id: provider_id.into(),
            display_name: display_name.into(),
            root: root.into(),
        }
    }

    /// Resolve a file id against the root, rejecting escapes.
    fn resolve(&self, file_id: &str) -> Result<PathBuf> {
        let relative = Path::new(file_id);
        let escapes = relative.is_absolute()
            || relative
                .components()
                .any(|c| matches!(c, Component::ParentDir | Component::Prefix(_)));
        if escapes {
            return Err(ProviderError::Internal(format!(
                "path {:?} escapes provider root",
                file_id
            )));
        }
        Ok(self.root.join(relative))
    }

    fn guess_mime(path: &Path) -> Option<String> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        let mime = match ext.as_str() {
            "jpg" | "jpeg" => "image/jpeg",
            "png" => "image/png",
            "gif" => "image/gif",
            "webp" => "image/webp",
            "heic" => "image/heic",
            "mp4" => "video/mp4",
            "mov" => "video/quicktime",
            "avi" => "video/x-msvideo",
            "mkv" => "video/x-matroska",
            "webm" => "video/webm",
            _ => return None,
        };
        Some(mime.to_string())
    }
}

#[async_trait]
impl StorageProvider for LocalProvider {
    fn provider_id(&self) -> &str {
        &self.provider_id
    }

    fn display_name(&self) -> &str {
        &self.display_name
    }

    fn supports_upload(&self) -> bool {
        true
    }

    fn supports_watch(&self) -> bool {
        false
    }

    #[instrument(skip(self))]
    async fn list_files(&self, folder: Option<&str>) -> Result<Vec<FileInfo>> {
        let dir = match folder {
            Some(folder) => self.resolve(folder)?,
            None => self.root.clone(),
        };

        let mut entries = tokio::fs::read_dir(&dir).await?;
        let mut files = Vec::new();

        while let Some(entry) = entries.next_entry().await? {
            let metadata = entry.metadata().await?;
            let path = entry.path();
            let relative = path
                .strip_prefix(&self.root)
                .unwrap_or(&path)
                .to_string_lossy()
                .to_string();
            let name = entry.file_name().to_string_lossy().to_string();

            let modified_at = metadata
                .modified()
                .ok()
                .map(DateTime::<Utc>::from);

            files.push(FileInfo {
                id: relative,
                name,
                mime_type: Self::guess_mime(&path),
                size: metadata.is_file().then(|| metadata.len()),
                taken_at: None,
                modified_at,
                is_folder: metadata.is_dir(),
            });
        }

        debug!(count = files.len(), "Listed local files");
        Ok(files)
    }

    #[instrument(skip(self), fields(file_id = %file_id))]
    async fn download_file(&self, file_id: &str) -> Result<Bytes> {
        let path = self.resolve(file_id)?;
        match tokio::fs::read(&path).await {
            Ok(data) => Ok(Bytes::from(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(ProviderError::FileNotFound {
                    file_id: file_id.to_string(),
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn open_file_stream(
        &self,
        file_id: &str,
    ) -> Result<Box<dyn tokio::io::AsyncRead + Send + Unpin>> {
        let path = self.resolve(file_id)?;
        match tokio::fs::File::open(&path).await {
            Ok(file) => Ok(Box::new(file)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(ProviderError::FileNotFound {
                    file_id: file_id.to_string(),
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    #[instrument(skip(self), fields(file_id = %file_id))]
    async fn delete_file(&self, file_id: &str) -> Result<bool> {
        let path = self.resolve(file_id)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn test_connection(&self) -> bool {
        tokio::fs::metadata(&self.root)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false)
    }
}
