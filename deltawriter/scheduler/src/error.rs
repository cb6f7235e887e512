use thiserror::Error;

/// Errors surfaced by [`crate::scheduler::BatchScheduler::submit`].
///
/// `Clone` because a single commit failure is fanned out, verbatim, to
/// every submission coalesced into that commit's group (§7 propagation
/// policy) — the underlying `deltalake`/`object_store` error types aren't
/// `Clone`, so commit failures are captured as a formatted message rather
/// than the original error value.
#[derive(Debug, Clone, Error)]
pub enum SchedulerError {
    #[error("invalid write request: {0}")]
    InvalidInput(String),

    #[error("write was not acknowledged within the configured timeout")]
    WriteTimeout,

    #[error("scheduler is shutting down")]
    Shutdown,

    #[error("commit failed: {0}")]
    CommitFailed(String),
}

impl From<deltawriter_engine::CommitError> for SchedulerError {
    fn from(err: deltawriter_engine::CommitError) -> Self {
        SchedulerError::CommitFailed(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, SchedulerError>;
