//! Picker API wire types
//!
//! Serde shapes for the remote picker session protocol. Field names follow
//! the API's camelCase convention.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Body of a session-create request.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub picking_config: Option<PickingConfig>,
}

/// Selection constraints for a new picker session.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PickingConfig {
    /// Upper bound on how many items the user may pick; int64 fields go
    /// over the wire as strings.
    pub max_item_count: String,
}

/// A picker session as returned by the sessions endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PickingSession {
    pub id: String,
    /// URI the user opens to pick items
    pub picker_uri: String,
    /// True once the user has finished selecting
    #[serde(default)]
    pub media_items_set: bool,
    pub expire_time: Option<DateTime<Utc>>,
}

/// One page of picked media items.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaItemsResponse {
    #[serde(default)]
    pub media_items: Vec<PickedMediaItem>,
    pub next_page_token: Option<String>,
}

/// A media item the user selected in the picker.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PickedMediaItem {
    pub id: String,
    pub create_time: Option<DateTime<Utc>>,
    pub media_file: Option<MediaFile>,
}

/// The downloadable file behind a picked media item.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaFile {
    /// Base URL; download variants are selected with a URL suffix
    pub base_url: String,
    pub mime_type: Option<String>,
    pub filename: Option<String>,
    pub media_file_metadata: Option<MediaFileMetadata>,
}

/// Dimensions reported by the picker for a media file.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaFileMetadata {
    pub width: Option<i64>,
    pub height: Option<i64>,
}

impl MediaFile {
    /// Full-resolution download URL.
    pub fn download_url(&self) -> String {
        format!("{}=d", self.base_url)
    }

    /// Download URL bounded to the given dimensions, preserving aspect ratio.
    pub fn bounded_download_url(&self, width: u32, height: u32) -> String {
        format!("{}=w{}-h{}", self.base_url, width, height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_session_request_encodes_item_bound() {
        let body = serde_json::to_string(&CreateSessionRequest {
            picking_config: Some(PickingConfig {
                max_item_count: "25".to_string(),
            }),
        })
        .unwrap();
        assert_eq!(body, r#"{"pickingConfig":{"maxItemCount":"25"}}"#);

        let unbounded = serde_json::to_string(&CreateSessionRequest::default()).unwrap();
        assert_eq!(unbounded, "{}");
    }

    #[test]
    fn test_session_parses_camel_case() {
        let session: PickingSession = serde_json::from_str(
            r#"{
                "id": "s1",
                "pickerUri": "https://picker.example/s1",
                "mediaItemsSet": true,
                "expireTime": "2026-01-01T00:00:00Z"
            }"#,
        )
        .unwrap();

        assert_eq!(session.id, "s1");
        assert!(session.media_items_set);
        assert!(session.expire_time.is_some());
    }

    #[test]
    fn test_fresh_session_defaults_to_no_selection() {
        let session: PickingSession =
            serde_json::from_str(r#"{"id": "s1", "pickerUri": "https://p/s1"}"#).unwrap();
        assert!(!session.media_items_set);
    }

    #[test]
    fn test_media_items_page_parses() {
        let page: MediaItemsResponse = serde_json::from_str(
            r#"{
                "mediaItems": [
                    {
                        "id": "m1",
                        "createTime": "2024-06-01T12:00:00Z",
                        "mediaFile": {
                            "baseUrl": "https://cdn.example/m1",
                            "mimeType": "image/jpeg",
                            "filename": "IMG_0001.jpg",
                            "mediaFileMetadata": {"width": 4032, "height": 3024}
                        }
                    }
                ],
                "nextPageToken": "p2"
            }"#,
        )
        .unwrap();

        assert_eq!(page.media_items.len(), 1);
        let file = page.media_items[0].media_file.as_ref().unwrap();
        assert_eq!(file.filename.as_deref(), Some("IMG_0001.jpg"));
        assert_eq!(page.next_page_token.as_deref(), Some("p2"));
    }

    #[test]
    fn test_download_url_variants() {
        let file = MediaFile {
            base_url: "https://cdn.example/m1".to_string(),
            mime_type: None,
            filename: None,
            media_file_metadata: None,
        };
        assert_eq!(file.download_url(), "https://cdn.example/m1=d");
        assert_eq!(
            file.bounded_download_url(800, 600),
            "https://cdn.example/m1=w800-h600"
        );
    }
}
