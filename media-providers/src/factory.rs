//! Provider factory and registry
//!
//! Builds `StorageProvider` instances from persisted provider configurations
//! and caches them. A cached provider keeps internal state (picker listings),
//! so configuration changes must invalidate the cache entry.

use media_auth::TokenManager;
use media_store::{ProviderConfigRepository, ProviderType};
use media_traits::{HttpClient, ProviderError, Result, StorageProvider};
use provider_picker::{PickerConnector, PickerSessionService};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, instrument};

/// Config blob shape for local providers.
#[derive(Debug, Deserialize)]
struct LocalProviderSettings {
    root: PathBuf,
}

/// Builds and caches storage providers from their persisted configuration.
pub struct ProviderFactory {
    configs: Arc<dyn ProviderConfigRepository>,
    http: Arc<dyn HttpClient>,
    tokens: Arc<TokenManager>,
    sessions: Arc<PickerSessionService>,
    cache: RwLock<HashMap<String, Arc<dyn StorageProvider>>>,
}

impl ProviderFactory {
    pub fn new(
        configs: Arc<dyn ProviderConfigRepository>,
        http: Arc<dyn HttpClient>,
        tokens: Arc<TokenManager>,
        sessions: Arc<PickerSessionService>,
    ) -> Self {
        Self {
            configs,
            http,
            tokens,
            sessions,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Resolve a provider by id, building it on first use.
    ///
    /// # Errors
    ///
    /// - `ProviderError::NotConfigured` - no configuration row exists
    /// - `ProviderError::Disabled` - the provider is configured but disabled
    #[instrument(skip(self))]
    pub async fn resolve(&self, provider_id: &str) -> Result<Arc<dyn StorageProvider>> {
        if let Some(provider) = self.cache.read().await.get(provider_id).cloned() {
            return Ok(provider);
        }

        let config = self
            .configs
            .get(provider_id)
            .await
            .map_err(|e| ProviderError::Internal(e.to_string()))?
            .ok_or_else(|| ProviderError::NotConfigured {
                provider_id: provider_id.to_string(),
            })?;

        if !config.enabled {
            return Err(ProviderError::Disabled {
                provider_id: provider_id.to_string(),
            });
        }

        let provider: Arc<dyn StorageProvider> = match config.provider_type {
            ProviderType::Local => {
                let settings: LocalProviderSettings = serde_json::from_str(&config.config)
                    .map_err(|e| {
                        ProviderError::Internal(format!("invalid local provider config: {}", e))
                    })?;
                Arc::new(crate::local::LocalProvider::new(
                    config.id.clone(),
                    config.display_name.clone(),
                    settings.root,
                ))
            }
            ProviderType::CloudPicker => Arc::new(PickerConnector::new(
                config.id.clone(),
                config.display_name.clone(),
                self.sessions.clone(),
                self.tokens.clone(),
                self.http.clone(),
            )),
        };

        let mut cache = self.cache.write().await;
        let provider = cache
            .entry(provider_id.to_string())
            .or_insert(provider)
            .clone();

        debug!("Provider built and cached");
        Ok(provider)
    }

    /// Drop the cached instance for a provider, forcing a rebuild on next use.
    pub async fn invalidate(&self, provider_id: &str) {
        self.cache.write().await.remove(provider_id);
    }

    /// Drop all cached provider instances.
    pub async fn invalidate_all(&self) {
        self.cache.write().await.clear();
    }
}
