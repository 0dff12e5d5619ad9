//! Media library filesystem layout
//!
//! The library owns one root directory. Originals live under
//! `media/<year>/<month>/`, thumbnails under `.thumbnails/<year>/<month>/`.
//! The catalog stores paths relative to the root so the library can be
//! relocated without rewriting rows.

use crate::error::Result;
use chrono::{DateTime, Datelike, Utc};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Filesystem layout of the managed media library.
#[derive(Debug, Clone)]
pub struct MediaLibrary {
    root: PathBuf,
}

impl MediaLibrary {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Library-relative path for an original, bucketed by capture date.
    pub fn media_rel_path(&self, id: i64, taken_at: DateTime<Utc>, extension: &str) -> String {
        format!(
            "media/{:04}/{:02}/{}{}",
            taken_at.year(),
            taken_at.month(),
            id,
            extension
        )
    }

    /// Library-relative path for a thumbnail. Thumbnails are always JPEG.
    pub fn thumbnail_rel_path(&self, id: i64, taken_at: DateTime<Utc>) -> String {
        format!(
            ".thumbnails/{:04}/{:02}/{}.jpg",
            taken_at.year(),
            taken_at.month(),
            id
        )
    }

    /// Absolute path for a library-relative path.
    pub fn absolute(&self, rel_path: &str) -> PathBuf {
        self.root.join(rel_path)
    }

    /// Write a file at a library-relative path, creating parent directories.
    pub async fn write(&self, rel_path: &str, data: &[u8]) -> Result<()> {
        let path = self.absolute(rel_path);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, data).await?;
        debug!(path = %path.display(), bytes = data.len(), "Wrote library file");
        Ok(())
    }

    /// Delete a file at a library-relative path; `Ok(false)` when absent.
    pub async fn delete(&self, rel_path: &str) -> Result<bool> {
        match tokio::fs::remove_file(self.absolute(rel_path)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn library() -> MediaLibrary {
        MediaLibrary::new(
            std::env::temp_dir().join(format!("photoflow-lib-{}", uuid::Uuid::new_v4())),
        )
    }

    #[test]
    fn test_paths_bucket_by_capture_date() {
        let lib = library();
        let taken = Utc.with_ymd_and_hms(2024, 6, 3, 12, 0, 0).unwrap();

        assert_eq!(lib.media_rel_path(42, taken, ".jpg"), "media/2024/06/42.jpg");
        assert_eq!(
            lib.thumbnail_rel_path(42, taken),
            ".thumbnails/2024/06/42.jpg"
        );
    }

    #[tokio::test]
    async fn test_write_and_delete() {
        let lib = library();

        lib.write("media/2024/06/1.jpg", b"data").await.unwrap();
        assert_eq!(
            std::fs::read(lib.absolute("media/2024/06/1.jpg")).unwrap(),
            b"data"
        );

        assert!(lib.delete("media/2024/06/1.jpg").await.unwrap());
        assert!(!lib.delete("media/2024/06/1.jpg").await.unwrap());

        std::fs::remove_dir_all(lib.root()).unwrap();
    }
}
