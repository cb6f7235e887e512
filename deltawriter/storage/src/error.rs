use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage backend requires a non-empty bucket name")]
    EmptyBucket,

    #[error("invalid storage URI: {0}")]
    InvalidUri(#[from] url::ParseError),

    #[error(transparent)]
    ObjectStore(#[from] object_store::Error),

    #[error("object store backend '{0}' has no registered provider in this build")]
    UnsupportedBackend(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;
