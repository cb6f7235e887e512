use thiserror::Error;

/// Aggregates every sub-crate's error type behind one facade error, the
/// way a top-level aggregate error wraps template/source/stage/destination
/// errors from its constituent crates.
#[derive(Debug, Error)]
pub enum DeltaWriteError {
    #[error(transparent)]
    Schema(#[from] deltawriter_schema::SchemaError),

    #[error(transparent)]
    Storage(#[from] deltawriter_storage::StoreError),

    #[error(transparent)]
    Commit(#[from] deltawriter_engine::CommitError),

    #[error(transparent)]
    Scheduler(#[from] deltawriter_scheduler::SchedulerError),

    #[error("invalid configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, DeltaWriteError>;
