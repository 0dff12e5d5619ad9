//! Import configuration and media classification

use media_store::MediaType;

/// Photo file extensions accepted without a usable MIME type
const PHOTO_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp", "heic", "bmp", "tiff"];

/// Video file extensions accepted without a usable MIME type
const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "avi", "mkv", "webm", "m4v", "3gp"];

/// Configuration for the import pipeline
#[derive(Debug, Clone)]
pub struct ImportConfig {
    /// Longest edge a stored photo may have; larger photos are resized down
    pub max_dimension: u32,

    /// Bounding box edge for generated thumbnails
    pub thumbnail_size: u32,

    /// JPEG quality for generated thumbnails (1-100)
    pub thumbnail_quality: u8,

    /// Maximum accepted size for direct uploads
    pub max_upload_bytes: u64,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            max_dimension: 2560,
            thumbnail_size: 400,
            thumbnail_quality: 85,
            max_upload_bytes: 100 * 1024 * 1024, // 100MB
        }
    }
}

/// Classify a file as photo or video from its MIME type, falling back to the
/// filename extension. Returns `None` for files that are neither.
pub fn classify(mime_type: Option<&str>, filename: &str) -> Option<MediaType> {
    if let Some(mime) = mime_type {
        if mime.starts_with("image/") {
            return Some(MediaType::Photo);
        }
        if mime.starts_with("video/") {
            return Some(MediaType::Video);
        }
    }

    let ext = extension_of(filename)?;
    if PHOTO_EXTENSIONS.contains(&ext.as_str()) {
        Some(MediaType::Photo)
    } else if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
        Some(MediaType::Video)
    } else {
        None
    }
}

/// Library file extension for a stored file, with leading dot.
///
/// Prefers the original filename's extension; falls back to one derived from
/// the MIME type, then to the media type's conventional default.
pub fn file_extension(filename: &str, mime_type: Option<&str>, media_type: MediaType) -> String {
    if let Some(ext) = extension_of(filename) {
        return format!(".{}", ext);
    }

    let from_mime = match mime_type {
        Some("image/jpeg") => "jpg",
        Some("image/png") => "png",
        Some("image/gif") => "gif",
        Some("image/webp") => "webp",
        Some("image/heic") => "heic",
        Some("video/mp4") => "mp4",
        Some("video/quicktime") => "mov",
        Some("video/webm") => "webm",
        _ => match media_type {
            MediaType::Photo => "jpg",
            MediaType::Video => "mp4",
        },
    };
    format!(".{}", from_mime)
}

fn extension_of(filename: &str) -> Option<String> {
    std::path::Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_by_mime() {
        assert_eq!(classify(Some("image/jpeg"), "x"), Some(MediaType::Photo));
        assert_eq!(classify(Some("video/mp4"), "x"), Some(MediaType::Video));
        assert_eq!(classify(Some("audio/mpeg"), "x"), None);
    }

    #[test]
    fn test_classify_by_extension_fallback() {
        assert_eq!(classify(None, "IMG_0001.HEIC"), Some(MediaType::Photo));
        assert_eq!(classify(None, "clip.mov"), Some(MediaType::Video));
        assert_eq!(classify(None, "notes.txt"), None);
        assert_eq!(classify(None, "no-extension"), None);
    }

    #[test]
    fn test_file_extension_prefers_filename() {
        assert_eq!(
            file_extension("IMG.JPG", Some("image/png"), MediaType::Photo),
            ".jpg"
        );
        assert_eq!(
            file_extension("clip", Some("video/mp4"), MediaType::Video),
            ".mp4"
        );
        // No filename or MIME hint: fall back to the media type default
        assert_eq!(file_extension("blob", None, MediaType::Video), ".mp4");
        assert_eq!(file_extension("blob", None, MediaType::Photo), ".jpg");
    }
}
