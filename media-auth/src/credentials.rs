//! Cloud provider credential set
//!
//! The whole credential set lives as one JSON blob inside the provider's
//! configuration row. Only the token manager reads and rewrites it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// OAuth 2.0 credential set for one cloud provider.
///
/// # Security
///
/// Tokens must never be logged. The `Debug` implementation redacts all
/// secret fields.
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloudCredentials {
    /// OAuth client ID
    pub client_id: String,
    /// OAuth client secret
    pub client_secret: String,
    /// Long-lived refresh token
    pub refresh_token: String,
    /// Current access token, if one has been obtained
    #[serde(default)]
    pub access_token: Option<String>,
    /// When the access token expires (UTC)
    #[serde(default)]
    pub access_token_expiry: Option<DateTime<Utc>>,
    /// Scopes the user actually granted during authorization
    #[serde(default)]
    pub granted_scopes: Vec<String>,
}

impl CloudCredentials {
    /// Whether the access token is missing, expired, or expires within the
    /// given margin.
    pub fn is_stale(&self, margin: Duration) -> bool {
        match (&self.access_token, self.access_token_expiry) {
            (Some(_), Some(expiry)) => {
                let margin = chrono::Duration::from_std(margin).unwrap_or(chrono::Duration::zero());
                Utc::now() >= expiry - margin
            }
            _ => true,
        }
    }

    /// Required scopes that were not granted.
    pub fn missing_scopes(&self, required: &[String]) -> Vec<String> {
        required
            .iter()
            .filter(|scope| !self.granted_scopes.contains(scope))
            .cloned()
            .collect()
    }
}

// Custom Debug implementation to avoid logging secrets
impl fmt::Debug for CloudCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CloudCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .field("access_token", &self.access_token.as_ref().map(|_| "[REDACTED]"))
            .field("access_token_expiry", &self.access_token_expiry)
            .field("granted_scopes", &self.granted_scopes)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;

    fn credentials() -> CloudCredentials {
        CloudCredentials {
            client_id: "cid".to_string(),
            client_secret: "hush-value".to_string(),
            refresh_token: "rt-value".to_string(),
            access_token: Some("at-value".to_string()),
            access_token_expiry: Some(Utc::now() + ChronoDuration::hours(1)),
            granted_scopes: vec!["scope-a".to_string()],
        }
    }

    #[test]
    fn test_fresh_token_is_not_stale() {
        assert!(!credentials().is_stale(Duration::from_secs(60)));
    }

    #[test]
    fn test_token_within_margin_is_stale() {
        let creds = CloudCredentials {
            access_token_expiry: Some(Utc::now() + ChronoDuration::seconds(30)),
            ..credentials()
        };
        assert!(creds.is_stale(Duration::from_secs(60)));
    }

    #[test]
    fn test_missing_token_is_stale() {
        let creds = CloudCredentials {
            access_token: None,
            ..credentials()
        };
        assert!(creds.is_stale(Duration::from_secs(60)));
    }

    #[test]
    fn test_missing_scopes() {
        let required = vec!["scope-a".to_string(), "scope-b".to_string()];
        assert_eq!(
            credentials().missing_scopes(&required),
            vec!["scope-b".to_string()]
        );
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let debug_str = format!("{:?}", credentials());
        assert!(debug_str.contains("[REDACTED]"));
        assert!(!debug_str.contains("hush-value"));
        assert!(!debug_str.contains("rt-value"));
        assert!(!debug_str.contains("at-value"));
    }

    #[test]
    fn test_blob_round_trip_uses_camel_case() {
        let json = serde_json::to_string(&credentials()).unwrap();
        assert!(json.contains("clientId"));
        assert!(json.contains("refreshToken"));
        assert!(json.contains("grantedScopes"));

        let parsed: CloudCredentials = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.client_id, "cid");
    }

    #[test]
    fn test_minimal_blob_parses() {
        let parsed: CloudCredentials = serde_json::from_str(
            r#"{"clientId":"c","clientSecret":"s","refreshToken":"r"}"#,
        )
        .unwrap();
        assert!(parsed.access_token.is_none());
        assert!(parsed.granted_scopes.is_empty());
        assert!(parsed.is_stale(Duration::from_secs(60)));
    }
}
