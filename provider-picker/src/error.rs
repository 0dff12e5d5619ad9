use media_traits::ProviderError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PickerError {
    #[error("Picker API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Failed to parse picker response: {0}")]
    Parse(String),

    #[error("No picker session exists for provider {provider_id}")]
    SessionNotFound { provider_id: String },

    #[error("Picker session for provider {provider_id} has no selection yet")]
    SessionNotReady { provider_id: String },

    #[error("Auth error: {0}")]
    Auth(#[from] media_auth::AuthError),

    #[error("Store error: {0}")]
    Store(#[from] media_store::StoreError),
}

impl From<PickerError> for ProviderError {
    fn from(err: PickerError) -> Self {
        match err {
            PickerError::Api { status, message } => ProviderError::Api { status, message },
            PickerError::Parse(message) => ProviderError::Parse(message),
            PickerError::SessionNotFound { provider_id }
            | PickerError::SessionNotReady { provider_id } => {
                ProviderError::NotConfigured { provider_id }
            }
            PickerError::Auth(e) => ProviderError::Auth(e.to_string()),
            PickerError::Store(e) => ProviderError::Internal(e.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, PickerError>;
