//! Picker session repository

use crate::error::Result;
use crate::models::PickerSession;
use async_trait::async_trait;
use sqlx::{query_as, SqlitePool};

/// Picker session repository interface
///
/// One row per provider: starting a new session replaces the old one, so a
/// provider can never have two live sessions.
#[async_trait]
pub trait PickerSessionRepository: Send + Sync {
    /// Insert or replace the session for a provider.
    async fn upsert(&self, session: &PickerSession) -> Result<()>;

    /// Look up the session for a provider.
    async fn get(&self, provider_id: &str) -> Result<Option<PickerSession>>;

    /// Remove the session for a provider; `Ok(false)` when none existed.
    async fn delete(&self, provider_id: &str) -> Result<bool>;
}

/// SQLite implementation of PickerSessionRepository
pub struct SqlitePickerSessionRepository {
    pool: SqlitePool,
}

impl SqlitePickerSessionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PickerSessionRepository for SqlitePickerSessionRepository {
    async fn upsert(&self, session: &PickerSession) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO picker_sessions
                (provider_id, session_id, picker_uri, media_items_set, expires_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT (provider_id) DO UPDATE SET
                session_id = excluded.session_id,
                picker_uri = excluded.picker_uri,
                media_items_set = excluded.media_items_set,
                expires_at = excluded.expires_at
            "#,
        )
        .bind(&session.provider_id)
        .bind(&session.session_id)
        .bind(&session.picker_uri)
        .bind(session.media_items_set)
        .bind(session.expires_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get(&self, provider_id: &str) -> Result<Option<PickerSession>> {
        let session =
            query_as::<_, PickerSession>("SELECT * FROM picker_sessions WHERE provider_id = ?")
                .bind(provider_id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(session)
    }

    async fn delete(&self, provider_id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM picker_sessions WHERE provider_id = ?")
            .bind(provider_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_test_pool;
    use crate::models::{ProviderConfig, ProviderType};
    use crate::repositories::provider_config::{
        ProviderConfigRepository, SqliteProviderConfigRepository,
    };

    async fn setup() -> (SqlitePickerSessionRepository, SqliteProviderConfigRepository) {
        let pool = create_test_pool().await.unwrap();
        let configs = SqliteProviderConfigRepository::new(pool.clone());
        configs
            .upsert(&ProviderConfig {
                id: "p1".to_string(),
                provider_type: ProviderType::CloudPicker,
                display_name: "Cloud Photos".to_string(),
                enabled: true,
                config: "{}".to_string(),
                last_sync_at: None,
            })
            .await
            .unwrap();
        (SqlitePickerSessionRepository::new(pool), configs)
    }

    fn session(session_id: &str) -> PickerSession {
        PickerSession {
            provider_id: "p1".to_string(),
            session_id: session_id.to_string(),
            picker_uri: format!("https://picker.example/{session_id}"),
            media_items_set: false,
            expires_at: None,
        }
    }

    #[tokio::test]
    async fn test_upsert_replaces_previous_session() {
        let (repo, _configs) = setup().await;

        repo.upsert(&session("s1")).await.unwrap();
        repo.upsert(&session("s2")).await.unwrap();

        let stored = repo.get("p1").await.unwrap().unwrap();
        assert_eq!(stored.session_id, "s2");
    }

    #[tokio::test]
    async fn test_delete() {
        let (repo, _configs) = setup().await;

        repo.upsert(&session("s1")).await.unwrap();
        assert!(repo.delete("p1").await.unwrap());
        assert!(!repo.delete("p1").await.unwrap());
        assert!(repo.get("p1").await.unwrap().is_none());
    }
}
