use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("No credentials configured for provider {provider_id}")]
    MissingCredentials { provider_id: String },

    #[error("OAuth flow failed: {0}")]
    OAuthFailed(String),

    #[error("Authorization is missing required scopes: {}", missing.join(", "))]
    InsufficientScopes { missing: Vec<String> },

    #[error("No scopes were granted during authorization")]
    NoScopesGranted,

    #[error("Token exchange failed with status {status}: {message}")]
    TokenExchangeFailed { status: u16, message: String },

    #[error("Store error: {0}")]
    Store(#[from] media_store::StoreError),
}

pub type Result<T> = std::result::Result<T, AuthError>;
