//! Picker session lifecycle
//!
//! The picker protocol spans several independent requests: create a session,
//! hand the picker URI to the user, poll until the selection is committed,
//! then list what was picked. Every step persists its state in the session
//! row so the protocol survives restarts.

use crate::error::{PickerError, Result};
use crate::types::{
    CreateSessionRequest, MediaItemsResponse, PickedMediaItem, PickingConfig, PickingSession,
};
use media_auth::TokenManager;
use media_store::{PickerSession, PickerSessionRepository};
use media_traits::{HttpClient, HttpRequest, HttpResponse};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Picker API base URL
const PICKER_API_BASE: &str = "https://photospicker.googleapis.com/v1";

/// Items requested per listing page
const LIST_PAGE_SIZE: u32 = 100;

/// Manages remote picker sessions for cloud providers.
pub struct PickerSessionService {
    http: Arc<dyn HttpClient>,
    tokens: Arc<TokenManager>,
    sessions: Arc<dyn PickerSessionRepository>,
}

impl PickerSessionService {
    pub fn new(
        http: Arc<dyn HttpClient>,
        tokens: Arc<TokenManager>,
        sessions: Arc<dyn PickerSessionRepository>,
    ) -> Self {
        Self {
            http,
            tokens,
            sessions,
        }
    }

    /// Start a new picker session for the provider, optionally capping how
    /// many items the user may pick.
    ///
    /// Any previous session row for this provider is replaced; a provider can
    /// never have two live sessions.
    #[instrument(skip(self))]
    pub async fn start_session(
        &self,
        provider_id: &str,
        max_items: Option<u32>,
    ) -> Result<PickerSession> {
        let token = self.tokens.ensure_valid_token(provider_id).await?;

        let body = serde_json::to_vec(&CreateSessionRequest {
            picking_config: max_items.map(|n| PickingConfig {
                max_item_count: n.to_string(),
            }),
        })
        .map_err(|e| PickerError::Parse(e.to_string()))?;
        let request = HttpRequest::post(format!("{}/sessions", PICKER_API_BASE), body)
            .with_header("Content-Type", "application/json")
            .with_bearer(&token);
        let response = self.execute(request).await?;
        let remote: PickingSession = parse_body(&response)?;

        let session = PickerSession {
            provider_id: provider_id.to_string(),
            session_id: remote.id,
            picker_uri: remote.picker_uri,
            media_items_set: remote.media_items_set,
            expires_at: remote.expire_time,
        };
        self.sessions.upsert(&session).await?;

        info!(session_id = %session.session_id, "Picker session started");
        Ok(session)
    }

    /// Fetch the remote session state and persist it.
    ///
    /// Callers poll this until `media_items_set` turns true.
    #[instrument(skip(self))]
    pub async fn poll_session(&self, provider_id: &str) -> Result<PickerSession> {
        let stored = self.require_session(provider_id).await?;
        let token = self.tokens.ensure_valid_token(provider_id).await?;

        let request = HttpRequest::get(format!(
            "{}/sessions/{}",
            PICKER_API_BASE,
            urlencoding::encode(&stored.session_id)
        ))
        .with_bearer(&token);
        let response = self.execute(request).await?;
        let remote: PickingSession = parse_body(&response)?;

        let session = PickerSession {
            media_items_set: remote.media_items_set,
            expires_at: remote.expire_time,
            ..stored
        };
        self.sessions.upsert(&session).await?;

        debug!(
            media_items_set = session.media_items_set,
            "Picker session polled"
        );
        Ok(session)
    }

    /// List every media item the user picked in the committed session.
    ///
    /// # Errors
    ///
    /// - `PickerError::SessionNotFound` - no session exists for the provider
    /// - `PickerError::SessionNotReady` - the user has not committed a selection
    #[instrument(skip(self))]
    pub async fn list_selected(&self, provider_id: &str) -> Result<Vec<PickedMediaItem>> {
        let session = self.require_session(provider_id).await?;
        if !session.media_items_set {
            return Err(PickerError::SessionNotReady {
                provider_id: provider_id.to_string(),
            });
        }

        let token = self.tokens.ensure_valid_token(provider_id).await?;

        let mut items = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let mut url = format!(
                "{}/mediaItems?sessionId={}&pageSize={}",
                PICKER_API_BASE,
                urlencoding::encode(&session.session_id),
                LIST_PAGE_SIZE
            );
            if let Some(ref t) = page_token {
                url.push_str(&format!("&pageToken={}", urlencoding::encode(t)));
            }

            let response = self.execute(HttpRequest::get(url).with_bearer(&token)).await?;
            let page: MediaItemsResponse = parse_body(&response)?;

            items.extend(page.media_items);
            page_token = page.next_page_token;
            if page_token.is_none() {
                break;
            }
        }

        info!(count = items.len(), "Listed picked media items");
        Ok(items)
    }

    /// Delete the session remotely and drop its row.
    ///
    /// Remote deletion is best-effort: the row is removed even if the remote
    /// call fails, since expired sessions vanish upstream on their own.
    #[instrument(skip(self))]
    pub async fn delete_session(&self, provider_id: &str) -> Result<bool> {
        let Some(stored) = self.sessions.get(provider_id).await? else {
            return Ok(false);
        };

        match self.tokens.ensure_valid_token(provider_id).await {
            Ok(token) => {
                let request = HttpRequest::delete(format!(
                    "{}/sessions/{}",
                    PICKER_API_BASE,
                    urlencoding::encode(&stored.session_id)
                ))
                .with_bearer(&token);

                match self.execute(request).await {
                    Ok(_) => debug!("Remote picker session deleted"),
                    Err(e) => warn!("Remote picker session deletion failed: {}", e),
                }
            }
            Err(e) => warn!("Skipping remote session deletion, no valid token: {}", e),
        }

        self.sessions.delete(provider_id).await?;
        info!("Picker session removed");
        Ok(true)
    }

    async fn require_session(&self, provider_id: &str) -> Result<PickerSession> {
        self.sessions
            .get(provider_id)
            .await?
            .ok_or_else(|| PickerError::SessionNotFound {
                provider_id: provider_id.to_string(),
            })
    }

    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
        let response = self
            .http
            .execute(request)
            .await
            .map_err(|e| PickerError::Api {
                status: 0,
                message: e.to_string(),
            })?;

        if !response.is_success() {
            return Err(PickerError::Api {
                status: response.status,
                message: response.body_text(),
            });
        }
        Ok(response)
    }
}

fn parse_body<T: serde::de::DeserializeOwned>(response: &HttpResponse) -> Result<T> {
    serde_json::from_slice(&response.body).map_err(|e| PickerError::Parse(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bytes::Bytes;
    use chrono::{Duration, Utc};
    use media_auth::{CloudCredentials, PICKER_READONLY_SCOPE};
    use media_store::{
        create_test_pool, ProviderConfig, ProviderConfigRepository, ProviderType,
        SqlitePickerSessionRepository, SqliteProviderConfigRepository,
    };
    use media_traits::HttpMethod;
    use mockall::mock;
    use std::sync::Mutex as StdMutex;

    mock! {
        Http {}

        #[async_trait]
        impl HttpClient for Http {
            async fn execute(&self, request: HttpRequest) -> media_traits::Result<HttpResponse>;
        }
    }

    fn ok(body: &str) -> media_traits::Result<HttpResponse> {
        Ok(HttpResponse {
            status: 200,
            headers: Default::default(),
            body: Bytes::from(body.to_string()),
        })
    }

    async fn service(http: MockHttp) -> (PickerSessionService, Arc<SqlitePickerSessionRepository>) {
        let pool = create_test_pool().await.unwrap();
        let configs = Arc::new(SqliteProviderConfigRepository::new(pool.clone()));

        let blob = serde_json::to_string(&CloudCredentials {
            client_id: "cid".to_string(),
            client_secret: "cs".to_string(),
            refresh_token: "rt".to_string(),
            access_token: Some("tok".to_string()),
            access_token_expiry: Some(Utc::now() + Duration::hours(1)),
            granted_scopes: vec![PICKER_READONLY_SCOPE.to_string()],
        })
        .unwrap();
        configs
            .upsert(&ProviderConfig {
                id: "p1".to_string(),
                provider_type: ProviderType::CloudPicker,
                display_name: "Cloud Photos".to_string(),
                enabled: true,
                config: blob,
                last_sync_at: None,
            })
            .await
            .unwrap();

        let sessions = Arc::new(SqlitePickerSessionRepository::new(pool));
        let http: Arc<dyn HttpClient> = Arc::new(http);
        let tokens = Arc::new(TokenManager::new(http.clone(), configs));
        (
            PickerSessionService::new(http, tokens, sessions.clone()),
            sessions,
        )
    }

    #[tokio::test]
    async fn test_start_session_persists_row() {
        let mut http = MockHttp::new();
        http.expect_execute()
            .withf(|req| req.method == HttpMethod::Post && req.url.ends_with("/sessions"))
            .times(1)
            .returning(|_| ok(r#"{"id":"s1","pickerUri":"https://p/s1"}"#));

        let (service, sessions) = service(http).await;
        let session = service.start_session("p1", None).await.unwrap();
        assert_eq!(session.session_id, "s1");
        assert!(!session.media_items_set);

        let stored = sessions.get("p1").await.unwrap().unwrap();
        assert_eq!(stored.picker_uri, "https://p/s1");
    }

    #[tokio::test]
    async fn test_start_session_carries_item_bound_in_body() {
        let mut http = MockHttp::new();
        http.expect_execute()
            .withf(|req| {
                let body = std::str::from_utf8(req.body.as_deref().unwrap_or_default()).unwrap();
                req.method == HttpMethod::Post
                    && body == r#"{"pickingConfig":{"maxItemCount":"50"}}"#
            })
            .times(1)
            .returning(|_| ok(r#"{"id":"s1","pickerUri":"https://p/s1"}"#));

        let (service, _) = service(http).await;
        let session = service.start_session("p1", Some(50)).await.unwrap();
        assert_eq!(session.session_id, "s1");
    }

    #[tokio::test]
    async fn test_poll_session_updates_selection_flag() {
        let mut http = MockHttp::new();
        http.expect_execute()
            .withf(|req| req.method == HttpMethod::Post)
            .times(1)
            .returning(|_| ok(r#"{"id":"s1","pickerUri":"https://p/s1"}"#));
        http.expect_execute()
            .withf(|req| req.method == HttpMethod::Get && req.url.contains("/sessions/s1"))
            .times(1)
            .returning(|_| {
                ok(r#"{"id":"s1","pickerUri":"https://p/s1","mediaItemsSet":true}"#)
            });

        let (service, sessions) = service(http).await;
        service.start_session("p1", None).await.unwrap();
        let session = service.poll_session("p1").await.unwrap();
        assert!(session.media_items_set);
        assert!(sessions.get("p1").await.unwrap().unwrap().media_items_set);
    }

    #[tokio::test]
    async fn test_poll_without_session_fails() {
        let (service, _) = service(MockHttp::new()).await;
        let err = service.poll_session("p1").await.unwrap_err();
        assert!(matches!(err, PickerError::SessionNotFound { .. }));
    }

    #[tokio::test]
    async fn test_list_selected_requires_committed_selection() {
        let mut http = MockHttp::new();
        http.expect_execute()
            .withf(|req| req.method == HttpMethod::Post)
            .times(1)
            .returning(|_| ok(r#"{"id":"s1","pickerUri":"https://p/s1"}"#));

        let (service, _) = service(http).await;
        service.start_session("p1", None).await.unwrap();
        let err = service.list_selected("p1").await.unwrap_err();
        assert!(matches!(err, PickerError::SessionNotReady { .. }));
    }

    #[tokio::test]
    async fn test_list_selected_paginates() {
        let mut http = MockHttp::new();
        http.expect_execute()
            .withf(|req| req.method == HttpMethod::Post)
            .times(1)
            .returning(|_| {
                ok(r#"{"id":"s1","pickerUri":"https://p/s1","mediaItemsSet":true}"#)
            });

        let calls = StdMutex::new(0);
        http.expect_execute()
            .withf(|req| req.url.contains("/mediaItems"))
            .times(2)
            .returning(move |req| {
                let mut calls = calls.lock().unwrap();
                *calls += 1;
                if *calls == 1 {
                    assert!(!req.url.contains("pageToken"));
                    ok(r#"{"mediaItems":[{"id":"m1"}],"nextPageToken":"p2"}"#)
                } else {
                    assert!(req.url.contains("pageToken=p2"));
                    ok(r#"{"mediaItems":[{"id":"m2"}]}"#)
                }
            });

        let (service, _) = service(http).await;
        service.start_session("p1", None).await.unwrap();
        let items = service.list_selected("p1").await.unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].id, "m1");
        assert_eq!(items[1].id, "m2");
    }

    #[tokio::test]
    async fn test_delete_session_removes_row_even_if_remote_fails() {
        let mut http = MockHttp::new();
        http.expect_execute()
            .withf(|req| req.method == HttpMethod::Post)
            .times(1)
            .returning(|_| ok(r#"{"id":"s1","pickerUri":"https://p/s1"}"#));
        http.expect_execute()
            .withf(|req| req.method == HttpMethod::Delete)
            .times(1)
            .returning(|_| {
                Ok(HttpResponse {
                    status: 500,
                    headers: Default::default(),
                    body: Bytes::from_static(b"boom"),
                })
            });

        let (service, sessions) = service(http).await;
        service.start_session("p1", None).await.unwrap();

        assert!(service.delete_session("p1").await.unwrap());
        assert!(sessions.get("p1").await.unwrap().is_none());
        assert!(!service.delete_session("p1").await.unwrap());
    }
}
