//! Catalog models
//!
//! Data types for media assets, provider configurations, picker sessions,
//! guest links, and albums. The serialized shapes use camelCase field names
//! so they match the wire format of the surrounding HTTP layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of media held by a catalog record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Photo,
    Video,
}

impl MediaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Photo => "photo",
            MediaType::Video => "video",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "photo" | "image" => Some(MediaType::Photo),
            "video" => Some(MediaType::Video),
            _ => None,
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A catalog record for one imported photo or video.
///
/// A row with an empty `file_path` is an uncommitted placeholder created by
/// step 1 of the import pipeline; the read APIs never return placeholders.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct MediaAsset {
    /// Stable numeric id, assigned at placeholder creation time.
    pub id: i64,
    pub filename: String,
    pub original_filename: String,
    /// Relative, canonical library path; empty iff placeholder.
    pub file_path: String,
    pub thumbnail_path: Option<String>,
    pub file_size: i64,
    pub width: Option<i64>,
    pub height: Option<i64>,
    pub media_type: MediaType,
    pub date_taken: Option<DateTime<Utc>>,
    pub date_added: DateTime<Utc>,
    pub provider_id: String,
    /// Source-side identity; `(provider_id, provider_file_id)` is the
    /// deduplication key.
    pub provider_file_id: String,
}

impl MediaAsset {
    /// Whether this row is an uncommitted placeholder.
    pub fn is_placeholder(&self) -> bool {
        self.file_path.is_empty()
    }
}

/// Kind of configured storage backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ProviderType {
    Local,
    CloudPicker,
}

impl ProviderType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderType::Local => "local",
            ProviderType::CloudPicker => "cloud_picker",
        }
    }

    /// Whether this backend lives outside the local filesystem and is
    /// therefore a candidate for polling sync.
    pub fn is_remote(&self) -> bool {
        !matches!(self, ProviderType::Local)
    }
}

impl fmt::Display for ProviderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Persisted configuration for one storage backend.
///
/// `config` is an opaque JSON blob: for cloud providers it holds the OAuth
/// credential set, and only the token manager is permitted to rewrite it.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProviderConfig {
    pub id: String,
    pub provider_type: ProviderType,
    pub display_name: String,
    pub enabled: bool,
    pub config: String,
    pub last_sync_at: Option<DateTime<Utc>>,
}

/// Persisted state of one remote picker session.
///
/// The multi-round-trip picker protocol is resumable across independent
/// requests because all of its state lives in this row, not in memory.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PickerSession {
    pub provider_id: String,
    /// Remote session identity.
    pub session_id: String,
    /// URI the end user opens to pick items.
    pub picker_uri: String,
    /// Whether the user has finished selecting items.
    pub media_items_set: bool,
    pub expires_at: Option<DateTime<Utc>>,
}

/// A time-limited, optionally count-limited guest upload link.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct GuestLink {
    pub id: String,
    pub expires_at: Option<DateTime<Utc>>,
    pub max_uploads: Option<i64>,
    pub current_uploads: i64,
    pub target_album_id: Option<i64>,
}

impl GuestLink {
    /// Mint a fresh link with a random id and no uploads consumed.
    pub fn new(
        expires_at: Option<DateTime<Utc>>,
        max_uploads: Option<i64>,
        target_album_id: Option<i64>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            expires_at,
            max_uploads,
            current_uploads: 0,
            target_album_id,
        }
    }

    /// Whether the link is past its expiry.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| now >= at)
    }

    /// Whether the upload budget is used up.
    ///
    /// Unbounded links never exhaust.
    pub fn is_exhausted(&self) -> bool {
        self.max_uploads
            .is_some_and(|max| self.current_uploads >= max)
    }
}

/// A named album grouping media assets.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Album {
    pub id: i64,
    pub name: String,
}
