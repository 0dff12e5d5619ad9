//! # OAuth Token Manager
//!
//! Keeps cloud provider credentials valid and scope-complete.
//!
//! ## Overview
//!
//! The `TokenManager` owns the credential blob stored in each provider's
//! configuration row. It refreshes access tokens before they expire,
//! persists the rewritten blob, and enforces that the user granted every
//! required scope. Authorizations with missing or empty scope grants are
//! revoked upstream so a half-working grant never lingers.
//!
//! ## Concurrency
//!
//! Refreshes are serialized per provider with a keyed lock: two tasks that
//! both find a stale token will perform one refresh, not two.

use crate::credentials::CloudCredentials;
use crate::error::{AuthError, Result};
use chrono::{Duration as ChronoDuration, Utc};
use media_store::{ProviderConfigRepository, ProviderType};
use media_traits::{HttpClient, HttpRequest};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

/// Read-only scope required for picker-based cloud providers.
pub const PICKER_READONLY_SCOPE: &str =
    "https://www.googleapis.com/auth/photospicker.mediaitems.readonly";

/// Buffer before token expiration that still counts as stale (1 minute)
const TOKEN_REFRESH_MARGIN: Duration = Duration::from_secs(60);

/// OAuth endpoint pair for a token authority.
#[derive(Debug, Clone)]
pub struct OAuthEndpoints {
    /// Token refresh endpoint
    pub token_url: String,
    /// Token revocation endpoint
    pub revoke_url: String,
}

impl Default for OAuthEndpoints {
    fn default() -> Self {
        Self {
            token_url: "https://oauth2.googleapis.com/token".to_string(),
            revoke_url: "https://oauth2.googleapis.com/revoke".to_string(),
        }
    }
}

/// Lifecycle state of a provider's access token, for status surfaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenState {
    /// An access token is stored and fresh
    Valid,
    /// The token is absent or within the refresh margin of its expiry
    Stale,
    /// Another task is refreshing right now
    Refreshing,
    /// No usable credentials are stored
    Failed,
}

/// Scopes a provider of the given type must hold.
pub fn required_scopes(provider_type: ProviderType) -> Vec<String> {
    match provider_type {
        ProviderType::Local => Vec::new(),
        ProviderType::CloudPicker => vec![PICKER_READONLY_SCOPE.to_string()],
    }
}

/// Wire shape of a token endpoint success response.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
    #[serde(default)]
    scope: Option<String>,
}

/// OAuth token manager for cloud providers.
pub struct TokenManager {
    http: Arc<dyn HttpClient>,
    configs: Arc<dyn ProviderConfigRepository>,
    endpoints: OAuthEndpoints,
    /// Refresh locks to prevent concurrent refreshes per provider
    refresh_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl TokenManager {
    pub fn new(http: Arc<dyn HttpClient>, configs: Arc<dyn ProviderConfigRepository>) -> Self {
        Self::with_endpoints(http, configs, OAuthEndpoints::default())
    }

    /// Create a manager pointed at non-default OAuth endpoints.
    pub fn with_endpoints(
        http: Arc<dyn HttpClient>,
        configs: Arc<dyn ProviderConfigRepository>,
        endpoints: OAuthEndpoints,
    ) -> Self {
        Self {
            http,
            configs,
            endpoints,
            refresh_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Returns a valid access token for the provider, refreshing if needed.
    ///
    /// Scope validation runs on every call: if the stored grant is missing a
    /// required scope the authorization is revoked upstream and an error is
    /// returned, even when the access token itself is still valid.
    ///
    /// # Errors
    ///
    /// - `AuthError::MissingCredentials` - no usable credential blob is stored
    /// - `AuthError::TokenExchangeFailed` - the token endpoint rejected the refresh
    /// - `AuthError::NoScopesGranted` / `AuthError::InsufficientScopes` - scope
    ///   validation failed; the grant has been revoked
    #[instrument(skip(self))]
    pub async fn ensure_valid_token(&self, provider_id: &str) -> Result<String> {
        // Serialize refreshes per provider
        let refresh_lock = {
            let mut locks = self.refresh_locks.lock().await;
            locks
                .entry(provider_id.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        let _guard = refresh_lock.lock().await;

        let mut credentials = self.load_credentials(provider_id).await?;

        if credentials.is_stale(TOKEN_REFRESH_MARGIN) {
            info!("Access token stale, refreshing");
            credentials = self.refresh(provider_id, credentials).await?;
        } else {
            debug!("Access token still valid");
        }

        self.validate_scopes(provider_id, &credentials).await?;

        credentials
            .access_token
            .ok_or_else(|| AuthError::OAuthFailed("refresh yielded no access token".to_string()))
    }

    /// Stores the credentials produced by a completed authorization flow,
    /// then validates the granted scopes.
    ///
    /// An authorization where the user granted nothing, or less than the
    /// required scope set, is revoked upstream and rejected.
    #[instrument(skip(self, credentials))]
    pub async fn complete_authorization(
        &self,
        provider_id: &str,
        credentials: CloudCredentials,
    ) -> Result<()> {
        let blob = serde_json::to_string(&credentials)
            .map_err(|e| AuthError::OAuthFailed(format!("failed to encode credentials: {}", e)))?;
        self.configs.update_config_blob(provider_id, &blob).await?;

        self.validate_scopes(provider_id, &credentials).await?;

        info!("Authorization completed");
        Ok(())
    }

    /// Current token state for a provider, without triggering a refresh.
    pub async fn token_state(&self, provider_id: &str) -> TokenState {
        // A held refresh lock means a refresh is in flight on another task
        if let Some(lock) = self.refresh_locks.lock().await.get(provider_id) {
            if lock.try_lock().is_err() {
                return TokenState::Refreshing;
            }
        }

        match self.load_credentials(provider_id).await {
            Ok(credentials) if credentials.is_stale(TOKEN_REFRESH_MARGIN) => TokenState::Stale,
            Ok(_) => TokenState::Valid,
            Err(_) => TokenState::Failed,
        }
    }

    /// Revokes the stored grant upstream. Best-effort: revocation failures
    /// are logged, never surfaced.
    #[instrument(skip(self))]
    pub async fn revoke_access(&self, provider_id: &str) -> Result<()> {
        let credentials = self.load_credentials(provider_id).await?;
        self.revoke(&credentials).await;
        Ok(())
    }

    async fn load_credentials(&self, provider_id: &str) -> Result<CloudCredentials> {
        let config = self.configs.get(provider_id).await?.ok_or_else(|| {
            AuthError::MissingCredentials {
                provider_id: provider_id.to_string(),
            }
        })?;

        serde_json::from_str(&config.config).map_err(|_| AuthError::MissingCredentials {
            provider_id: provider_id.to_string(),
        })
    }

    /// Perform a refresh-token grant and persist the rewritten blob.
    async fn refresh(
        &self,
        provider_id: &str,
        mut credentials: CloudCredentials,
    ) -> Result<CloudCredentials> {
        let mut params = HashMap::new();
        params.insert("grant_type", "refresh_token");
        params.insert("refresh_token", credentials.refresh_token.as_str());
        params.insert("client_id", credentials.client_id.as_str());
        params.insert("client_secret", credentials.client_secret.as_str());

        let body = serde_urlencoded::to_string(&params)
            .map_err(|e| AuthError::OAuthFailed(format!("failed to encode refresh request: {}", e)))?;

        let request = HttpRequest::post(self.endpoints.token_url.clone(), body.into_bytes())
            .with_header("Content-Type", "application/x-www-form-urlencoded");

        let response = self
            .http
            .execute(request)
            .await
            .map_err(|e| AuthError::OAuthFailed(e.to_string()))?;

        if !response.is_success() {
            warn!(status = response.status, "Token refresh rejected");
            return Err(AuthError::TokenExchangeFailed {
                status: response.status,
                message: response.body_text(),
            });
        }

        let token: TokenResponse = serde_json::from_slice(&response.body)
            .map_err(|e| AuthError::OAuthFailed(format!("failed to parse token response: {}", e)))?;

        credentials.access_token = Some(token.access_token);
        credentials.access_token_expiry =
            Some(Utc::now() + ChronoDuration::seconds(token.expires_in));
        if let Some(scope) = token.scope {
            credentials.granted_scopes = scope.split_whitespace().map(String::from).collect();
        }

        // The whole blob is rewritten so the new expiry survives restarts
        let blob = serde_json::to_string(&credentials)
            .map_err(|e| AuthError::OAuthFailed(format!("failed to encode credentials: {}", e)))?;
        self.configs.update_config_blob(provider_id, &blob).await?;

        info!("Access token refreshed");
        Ok(credentials)
    }

    /// Enforce the required scope set, revoking the grant on failure.
    async fn validate_scopes(
        &self,
        provider_id: &str,
        credentials: &CloudCredentials,
    ) -> Result<()> {
        let provider_type = self
            .configs
            .get(provider_id)
            .await?
            .map(|config| config.provider_type)
            .unwrap_or(ProviderType::CloudPicker);

        let required = required_scopes(provider_type);
        if required.is_empty() {
            return Ok(());
        }

        if credentials.granted_scopes.is_empty() {
            warn!("Authorization granted no scopes, revoking");
            self.revoke(credentials).await;
            return Err(AuthError::NoScopesGranted);
        }

        let missing = credentials.missing_scopes(&required);
        if !missing.is_empty() {
            warn!(?missing, "Authorization is missing required scopes, revoking");
            self.revoke(credentials).await;
            return Err(AuthError::InsufficientScopes { missing });
        }

        Ok(())
    }

    /// Best-effort upstream revocation of the refresh token.
    async fn revoke(&self, credentials: &CloudCredentials) {
        let mut params = HashMap::new();
        params.insert("token", credentials.refresh_token.as_str());

        let body = match serde_urlencoded::to_string(&params) {
            Ok(body) => body,
            Err(e) => {
                warn!("Failed to encode revocation request: {}", e);
                return;
            }
        };

        let request = HttpRequest::post(self.endpoints.revoke_url.clone(), body.into_bytes())
            .with_header("Content-Type", "application/x-www-form-urlencoded");

        match self.http.execute(request).await {
            Ok(response) if response.is_success() => debug!("Grant revoked upstream"),
            Ok(response) => warn!(status = response.status, "Revocation rejected upstream"),
            Err(e) => warn!("Revocation request failed: {}", e),
        }
    }
}
