use thiserror::Error;

/// Errors raised by storage backends and the HTTP abstraction.
///
/// Provider failures are never retried automatically by callers; the
/// backend-specific detail is preserved so it can be surfaced per item.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Provider {provider_id} is not configured")]
    NotConfigured { provider_id: String },

    #[error("Provider {provider_id} is disabled")]
    Disabled { provider_id: String },

    #[error("File {file_id} not found")]
    FileNotFound { file_id: String },

    #[error("Remote API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Failed to parse provider response: {0}")]
    Parse(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Operation {operation} not supported by provider {provider_id}")]
    Unsupported {
        provider_id: String,
        operation: String,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal provider error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, ProviderError>;
