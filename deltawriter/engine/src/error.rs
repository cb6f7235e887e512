use thiserror::Error;

#[derive(Debug, Error)]
pub enum CommitError {
    #[error("optimistic-concurrency conflict persisted after {0} retries")]
    ConflictExhausted(usize),

    #[error("I/O error writing Delta table: {0}")]
    Io(#[from] deltalake::errors::DeltaTableError),

    #[error("record does not match the target schema: {0}")]
    SchemaMismatch(String),

    #[error("commit was interrupted")]
    Interrupted,

    #[error(transparent)]
    Arrow(#[from] deltalake::arrow::error::ArrowError),

    #[error(transparent)]
    Storage(#[from] deltawriter_storage::StoreError),
}

pub type Result<T> = std::result::Result<T, CommitError>;
