use thiserror::Error;

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("Validation failed: {message}")]
    Validation { message: String },

    #[error("Guest link {link_id} upload quota exceeded")]
    QuotaExceeded { link_id: String },

    #[error("Provider error: {0}")]
    Provider(#[from] media_traits::ProviderError),

    #[error("Store error: {0}")]
    Store(#[from] media_store::StoreError),

    #[error("Image processing failed: {0}")]
    Image(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl IngestError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, IngestError>;
