//! Guest link repository

use crate::error::{Result, StoreError};
use crate::models::GuestLink;
use async_trait::async_trait;
use sqlx::{query_as, SqlitePool};

/// Guest upload link repository interface
#[async_trait]
pub trait GuestLinkRepository: Send + Sync {
    /// Persist a new guest link.
    async fn create(&self, link: &GuestLink) -> Result<()>;

    /// Look up a guest link.
    async fn get(&self, id: &str) -> Result<Option<GuestLink>>;

    /// Add `by` to the consumed upload count of a link.
    async fn increment_uploads(&self, id: &str, by: i64) -> Result<()>;
}

/// SQLite implementation of GuestLinkRepository
pub struct SqliteGuestLinkRepository {
    pool: SqlitePool,
}

impl SqliteGuestLinkRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl GuestLinkRepository for SqliteGuestLinkRepository {
    async fn create(&self, link: &GuestLink) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO guest_links
                (id, expires_at, max_uploads, current_uploads, target_album_id)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&link.id)
        .bind(link.expires_at)
        .bind(link.max_uploads)
        .bind(link.current_uploads)
        .bind(link.target_album_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<GuestLink>> {
        let link = query_as::<_, GuestLink>("SELECT * FROM guest_links WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(link)
    }

    async fn increment_uploads(&self, id: &str, by: i64) -> Result<()> {
        let result =
            sqlx::query("UPDATE guest_links SET current_uploads = current_uploads + ? WHERE id = ?")
                .bind(by)
                .bind(id)
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound {
                entity_type: "GuestLink".to_string(),
                id: id.to_string(),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_test_pool;

    async fn repo() -> SqliteGuestLinkRepository {
        SqliteGuestLinkRepository::new(create_test_pool().await.unwrap())
    }

    fn link(id: &str) -> GuestLink {
        GuestLink {
            id: id.to_string(),
            expires_at: None,
            max_uploads: Some(5),
            current_uploads: 0,
            target_album_id: None,
        }
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let repo = repo().await;

        repo.create(&link("g1")).await.unwrap();
        let stored = repo.get("g1").await.unwrap().unwrap();
        assert_eq!(stored.max_uploads, Some(5));
        assert_eq!(stored.current_uploads, 0);
    }

    #[tokio::test]
    async fn test_increment_uploads_accumulates() {
        let repo = repo().await;

        repo.create(&link("g1")).await.unwrap();
        repo.increment_uploads("g1", 2).await.unwrap();
        repo.increment_uploads("g1", 3).await.unwrap();

        let stored = repo.get("g1").await.unwrap().unwrap();
        assert_eq!(stored.current_uploads, 5);
        assert!(stored.is_exhausted());
    }

    #[tokio::test]
    async fn test_increment_missing_link_is_not_found() {
        let repo = repo().await;

        let result = repo.increment_uploads("ghost", 1).await;
        assert!(matches!(result, Err(StoreError::NotFound { .. })));
    }
}
