//! Picker-backed storage provider
//!
//! Implements the `StorageProvider` trait on top of a committed picker
//! session. Listing reads the user's selection; downloads fetch the
//! full-resolution bytes through the item's base URL.

use async_trait::async_trait;
use bytes::Bytes;
use media_auth::TokenManager;
use media_traits::{FileInfo, HttpRequest, HttpResponse, ProviderError, StorageProvider};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};

use crate::session::PickerSessionService;
use crate::types::MediaFile;

/// Maximum download attempts before giving up
const MAX_RETRIES: u32 = 3;

/// Picker storage provider.
///
/// # Features
///
/// - Lists the media items of the committed picker session
/// - Full-resolution downloads through item base URLs
/// - Exponential backoff for rate limiting
/// - OAuth 2.0 authentication via the token manager
///
/// Base URLs are only handed out at listing time, so the connector keeps the
/// last listing in memory and refreshes it once when a download misses.
pub struct PickerConnector {
    provider_id: String,
    display_name: String,
    sessions: Arc<PickerSessionService>,
    tokens: Arc<TokenManager>,
    http: Arc<dyn media_traits::HttpClient>,
    /// Media files by item id, from the most recent listing
    listing: RwLock<HashMap<String, MediaFile>>,
}

impl PickerConnector {
    pub fn new(
        provider_id: impl Into<String>,
        display_name: impl Into<String>,
        sessions: Arc<PickerSessionService>,
        tokens: Arc<TokenManager>,
        http: Arc<dyn media_traits::HttpClient>,
    ) -> Self {
        Self {
            provider_id: provider_id.into(),
            display_name: display_name.into(),
            sessions,
            tokens,
            http,
            listing: RwLock::new(HashMap::new()),
        }
    }

    /// Look up a media file from the cached listing, refreshing once on miss.
    async fn media_file(&self, file_id: &str) -> media_traits::Result<MediaFile> {
        if let Some(file) = self.listing.read().await.get(file_id).cloned() {
            return Ok(file);
        }

        debug!("File not in cached listing, refreshing");
        self.list_files(None).await?;

        self.listing
            .read()
            .await
            .get(file_id)
            .cloned()
            .ok_or_else(|| ProviderError::FileNotFound {
                file_id: file_id.to_string(),
            })
    }

    /// Download a preview bounded to `width` x `height`, for thumbnails and
    /// browse views that should not pull full-resolution bytes.
    #[instrument(skip(self), fields(file_id = %file_id))]
    pub async fn download_preview(
        &self,
        file_id: &str,
        width: u32,
        height: u32,
    ) -> media_traits::Result<Bytes> {
        let media_file = self.media_file(file_id).await?;
        let token = self
            .tokens
            .ensure_valid_token(&self.provider_id)
            .await
            .map_err(|e| ProviderError::Auth(e.to_string()))?;

        let response = self
            .execute_with_retry(media_file.bounded_download_url(width, height), &token)
            .await?;

        debug!(bytes = response.body.len(), "Downloaded preview");
        Ok(response.body)
    }

    /// Execute a download request with retry on rate limits and server errors.
    async fn execute_with_retry(&self, url: String, token: &str) -> media_traits::Result<HttpResponse> {
        let mut attempt = 0;

        loop {
            let request = HttpRequest::get(url.clone())
                .with_bearer(token)
                .with_timeout(std::time::Duration::from_secs(60));

            match self.http.execute(request).await {
                Ok(response) if response.is_success() => return Ok(response),
                Ok(response) if response.status == 429 || response.status >= 500 => {
                    attempt += 1;
                    if attempt >= MAX_RETRIES {
                        warn!(status = response.status, "Download failed after {} attempts", MAX_RETRIES);
                        return Err(ProviderError::Api {
                            status: response.status,
                            message: format!("request failed after {} retries", MAX_RETRIES),
                        });
                    }
                    let backoff_ms = 100u64 * 2u64.pow(attempt);
                    warn!(
                        status = response.status,
                        "Download failed (attempt {}/{}), retrying in {}ms",
                        attempt,
                        MAX_RETRIES,
                        backoff_ms
                    );
                    tokio::time::sleep(std::time::Duration::from_millis(backoff_ms)).await;
                }
                Ok(response) => {
                    return Err(ProviderError::Api {
                        status: response.status,
                        message: response.body_text(),
                    });
                }
                Err(e) => {
                    attempt += 1;
                    if attempt >= MAX_RETRIES {
                        return Err(e);
                    }
                    let backoff_ms = 100u64 * 2u64.pow(attempt);
                    warn!("Download failed (attempt {}/{}): {}, retrying in {}ms", attempt, MAX_RETRIES, e, backoff_ms);
                    tokio::time::sleep(std::time::Duration::from_millis(backoff_ms)).await;
                }
            }
        }
    }
}

#[async_trait]
impl StorageProvider for PickerConnector {
    fn provider_id(&self) -> &str {
        &self.provider_id
    }

    fn display_name(&self) -> &str {
        &self.display_name
    }

    fn supports_upload(&self) -> bool {
        false
    }

    fn supports_watch(&self) -> bool {
        false
    }

    #[instrument(skip(self))]
    async fn list_files(&self, _folder: Option<&str>) -> media_traits::Result<Vec<FileInfo>> {
        let items = self.sessions.list_selected(&self.provider_id).await?;

        let mut listing = self.listing.write().await;
        listing.clear();

        let files = items
            .into_iter()
            .filter_map(|item| {
                let media_file = item.media_file?;
                let info = FileInfo {
                    id: item.id.clone(),
                    name: media_file
                        .filename
                        .clone()
                        .unwrap_or_else(|| item.id.clone()),
                    mime_type: media_file.mime_type.clone(),
                    size: None,
                    taken_at: item.create_time,
                    modified_at: None,
                    is_folder: false,
                };
                listing.insert(item.id, media_file);
                Some(info)
            })
            .collect::<Vec<_>>();

        info!(count = files.len(), "Listed picked files");
        Ok(files)
    }

    #[instrument(skip(self), fields(file_id = %file_id))]
    async fn download_file(&self, file_id: &str) -> media_traits::Result<Bytes> {
        let media_file = self.media_file(file_id).await?;
        let token = self
            .tokens
            .ensure_valid_token(&self.provider_id)
            .await
            .map_err(|e| ProviderError::Auth(e.to_string()))?;

        let response = self
            .execute_with_retry(media_file.download_url(), &token)
            .await?;

        info!(bytes = response.body.len(), "Downloaded picked file");
        Ok(response.body)
    }

    async fn open_file_stream(
        &self,
        file_id: &str,
    ) -> media_traits::Result<Box<dyn tokio::io::AsyncRead + Send + Unpin>> {
        let data = self.download_file(file_id).await?;
        Ok(Box::new(std::io::Cursor::new(data)))
    }

    async fn delete_file(&self, _file_id: &str) -> media_traits::Result<bool> {
        Err(ProviderError::Unsupported {
            provider_id: self.provider_id.clone(),
            operation: "delete_file".to_string(),
        })
    }

    async fn test_connection(&self) -> bool {
        self.tokens.ensure_valid_token(&self.provider_id).await.is_ok()
    }
}
