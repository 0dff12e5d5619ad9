//! Import compensation
//!
//! Each import step that creates durable state pushes an undo action. On
//! failure the stack unwinds in reverse order, returning the library and
//! catalog to their pre-import state. Unwinding is best-effort: a failed
//! undo is logged and the remaining actions still run.

use media_store::MediaRepository;
use std::path::PathBuf;
use tracing::{debug, warn};

/// One undo action recorded during an import.
#[derive(Debug)]
pub enum Compensation {
    /// Remove a file written into the library
    RemoveFile(PathBuf),
    /// Delete the placeholder row created for this import
    DeletePlaceholder(i64),
    /// Undo an album membership recorded for this import
    DetachFromAlbum { media_id: i64, album_id: i64 },
}

/// LIFO stack of undo actions for one import attempt.
#[derive(Debug, Default)]
pub struct CompensationStack {
    steps: Vec<Compensation>,
}

impl CompensationStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, step: Compensation) {
        self.steps.push(step);
    }

    /// Undo all recorded steps, newest first.
    pub async fn unwind(self, media: &dyn MediaRepository) {
        for step in self.steps.into_iter().rev() {
            match step {
                Compensation::RemoveFile(path) => {
                    match tokio::fs::remove_file(&path).await {
                        Ok(()) => debug!(path = %path.display(), "Removed partial file"),
                        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                        Err(e) => {
                            warn!(path = %path.display(), "Failed to remove partial file: {}", e)
                        }
                    }
                }
                Compensation::DeletePlaceholder(id) => {
                    // Guarded delete: a finalized row is never removed here
                    match media.delete_placeholder(id).await {
                        Ok(_) => debug!(id, "Removed placeholder"),
                        Err(e) => warn!(id, "Failed to remove placeholder: {}", e),
                    }
                }
                Compensation::DetachFromAlbum { media_id, album_id } => {
                    match media.detach_from_album(media_id, album_id).await {
                        Ok(()) => debug!(media_id, album_id, "Removed album membership"),
                        Err(e) => {
                            warn!(media_id, album_id, "Failed to remove album membership: {}", e)
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use media_store::{
        create_test_pool, MediaType, NewPlaceholder, PlaceholderOutcome, SqliteMediaRepository,
    };

    #[tokio::test]
    async fn test_unwind_removes_file_and_placeholder() {
        let pool = create_test_pool().await.unwrap();
        let media = SqliteMediaRepository::new(pool);

        let id = match media
            .insert_placeholder(&NewPlaceholder {
                provider_id: "p".to_string(),
                provider_file_id: "f".to_string(),
                original_filename: "a.jpg".to_string(),
                media_type: MediaType::Photo,
                date_taken: None,
            })
            .await
            .unwrap()
        {
            PlaceholderOutcome::Created { id } => id,
            other => panic!("expected Created, got {:?}", other),
        };

        let path = std::env::temp_dir().join(format!("photoflow-saga-{}", uuid::Uuid::new_v4()));
        std::fs::write(&path, b"partial").unwrap();

        let mut stack = CompensationStack::new();
        stack.push(Compensation::DeletePlaceholder(id));
        stack.push(Compensation::RemoveFile(path.clone()));
        stack.unwind(&media).await;

        assert!(!path.exists());
        assert!(media.fetch_any(id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_unwind_detaches_album_membership_before_placeholder_delete() {
        use media_store::{AlbumRepository, SqliteAlbumRepository};

        let pool = create_test_pool().await.unwrap();
        let media = SqliteMediaRepository::new(pool.clone());
        let albums = SqliteAlbumRepository::new(pool);

        let id = match media
            .insert_placeholder(&NewPlaceholder {
                provider_id: "p".to_string(),
                provider_file_id: "f".to_string(),
                original_filename: "a.jpg".to_string(),
                media_type: MediaType::Photo,
                date_taken: None,
            })
            .await
            .unwrap()
        {
            PlaceholderOutcome::Created { id } => id,
            other => panic!("expected Created, got {:?}", other),
        };
        let album_id = albums.create("Holiday").await.unwrap();
        media.attach_to_album(id, album_id).await.unwrap();

        let mut stack = CompensationStack::new();
        stack.push(Compensation::DeletePlaceholder(id));
        stack.push(Compensation::DetachFromAlbum {
            media_id: id,
            album_id,
        });
        stack.unwind(&media).await;

        // The membership must go first or the row delete would hit the
        // foreign key on album_media
        assert!(!albums.contains(album_id, id).await.unwrap());
        assert!(media.fetch_any(id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_unwind_tolerates_missing_file() {
        let pool = create_test_pool().await.unwrap();
        let media = SqliteMediaRepository::new(pool);

        let mut stack = CompensationStack::new();
        stack.push(Compensation::RemoveFile(
            std::env::temp_dir().join("photoflow-saga-missing"),
        ));
        // Must not panic or error
        stack.unwind(&media).await;
    }
}
