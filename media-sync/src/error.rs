use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Sync already running for provider {provider_id}")]
    AlreadyRunning { provider_id: String },

    #[error("Provider error: {0}")]
    Provider(#[from] media_traits::ProviderError),

    #[error("Store error: {0}")]
    Store(#[from] media_store::StoreError),

    #[error("Ingest error: {0}")]
    Ingest(#[from] media_ingest::IngestError),
}

pub type Result<T> = std::result::Result<T, SyncError>;
