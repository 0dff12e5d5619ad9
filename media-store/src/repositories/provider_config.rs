//! Provider configuration repository

use crate::error::{Result, StoreError};
use crate::models::ProviderConfig;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{query_as, SqlitePool};

/// Provider configuration repository interface
#[async_trait]
pub trait ProviderConfigRepository: Send + Sync {
    /// Insert or replace a provider configuration.
    async fn upsert(&self, config: &ProviderConfig) -> Result<()>;

    /// Look up one provider configuration.
    async fn get(&self, id: &str) -> Result<Option<ProviderConfig>>;

    /// All enabled provider configurations.
    async fn list_enabled(&self) -> Result<Vec<ProviderConfig>>;

    /// Rewrite only the opaque config blob of a provider.
    ///
    /// Used by the token manager to persist refreshed credentials without
    /// disturbing the rest of the row.
    async fn update_config_blob(&self, id: &str, config: &str) -> Result<()>;

    /// Record the completion time of the latest sync pass.
    async fn set_last_sync(&self, id: &str, at: DateTime<Utc>) -> Result<()>;
}

/// SQLite implementation of ProviderConfigRepository
pub struct SqliteProviderConfigRepository {
    pool: SqlitePool,
}

impl SqliteProviderConfigRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProviderConfigRepository for SqliteProviderConfigRepository {
    async fn upsert(&self, config: &ProviderConfig) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO provider_configs
                (id, provider_type, display_name, enabled, config, last_sync_at)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT (id) DO UPDATE SET
                provider_type = excluded.provider_type,
                display_name = excluded.display_name,
                enabled = excluded.enabled,
                config = excluded.config,
                last_sync_at = excluded.last_sync_at
            "#,
        )
        .bind(&config.id)
        .bind(config.provider_type)
        .bind(&config.display_name)
        .bind(config.enabled)
        .bind(&config.config)
        .bind(config.last_sync_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<ProviderConfig>> {
        let config = query_as::<_, ProviderConfig>("SELECT * FROM provider_configs WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(config)
    }

    async fn list_enabled(&self) -> Result<Vec<ProviderConfig>> {
        let configs = query_as::<_, ProviderConfig>(
            "SELECT * FROM provider_configs WHERE enabled = 1 ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(configs)
    }

    async fn update_config_blob(&self, id: &str, config: &str) -> Result<()> {
        let result = sqlx::query("UPDATE provider_configs SET config = ? WHERE id = ?")
            .bind(config)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound {
                entity_type: "ProviderConfig".to_string(),
                id: id.to_string(),
            });
        }

        Ok(())
    }

    async fn set_last_sync(&self, id: &str, at: DateTime<Utc>) -> Result<()> {
        let result = sqlx::query("UPDATE provider_configs SET last_sync_at = ? WHERE id = ?")
            .bind(at)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound {
                entity_type: "ProviderConfig".to_string(),
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
    use crate::models::ProviderType;

    fn config(id: &str, enabled: bool) -> ProviderConfig {
        ProviderConfig {
            id: id.to_string(),
            provider_type: ProviderType::CloudPicker,
            display_name: "Cloud Photos".to_string(),
            enabled,
            config: "{}".to_string(),
            last_sync_at: None,
        }
    }

    async fn repo() -> SqliteProviderConfigRepository {
        SqliteProviderConfigRepository::new(create_test_pool().await.unwrap())
    }

    #[tokio::test]
    async fn test_upsert_and_get() {
        let repo = repo().await;

        repo.upsert(&config("p1", true)).await.unwrap();
        let stored = repo.get("p1").await.unwrap().unwrap();
        assert_eq!(stored.display_name, "Cloud Photos");

        // Upsert replaces in place
        let mut updated = config("p1", true);
        updated.display_name = "Renamed".to_string();
        repo.upsert(&updated).await.unwrap();
        let stored = repo.get("p1").await.unwrap().unwrap();
        assert_eq!(stored.display_name, "Renamed");
    }

    #[tokio::test]
    async fn test_list_enabled_skips_disabled() {
        let repo = repo().await;

        repo.upsert(&config("p1", true)).await.unwrap();
        repo.upsert(&config("p2", false)).await.unwrap();

        let enabled = repo.list_enabled().await.unwrap();
        assert_eq!(enabled.len(), 1);
        assert_eq!(enabled[0].id, "p1");
    }

    #[tokio::test]
    async fn test_update_config_blob() {
        let repo = repo().await;

        repo.upsert(&config("p1", true)).await.unwrap();
        repo.update_config_blob("p1", r#"{"refreshToken":"r"}"#)
            .await
            .unwrap();

        let stored = repo.get("p1").await.unwrap().unwrap();
        assert_eq!(stored.config, r#"{"refreshToken":"r"}"#);
    }

    #[tokio::test]
    async fn test_update_missing_provider_is_not_found() {
        let repo = repo().await;

        let result = repo.update_config_blob("ghost", "{}").await;
        assert!(matches!(result, Err(StoreError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_set_last_sync() {
        let repo = repo().await;

        repo.upsert(&config("p1", true)).await.unwrap();
        let at = Utc::now();
        repo.set_last_sync("p1", at).await.unwrap();

        let stored = repo.get("p1").await.unwrap().unwrap();
        assert_eq!(stored.last_sync_at, Some(at));
    }
}
