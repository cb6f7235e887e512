use deltawriter_engine::CommitResult;
use deltawriter_schema::{Record, RecordSchema};
use tokio::sync::oneshot;

use crate::error::SchedulerError;

/// One queued write request. Created at `submit` entry, destroyed once
/// the submitter observes completion (or the completion sink is dropped
/// because nobody is listening anymore).
pub struct WriteSubmission {
    pub table: String,
    pub records: Vec<Record>,
    pub schema: RecordSchema,
    pub completion: oneshot::Sender<Result<CommitResult, SchedulerError>>,
}

/// Tunables for the scheduler, mirroring `performance.*` in the
/// configuration surface.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    pub batch_timeout_ms: u64,
    pub max_batch_size: usize,
    pub write_timeout_ms: u64,
    pub commit_threads: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            batch_timeout_ms: 50,
            max_batch_size: 1000,
            write_timeout_ms: 30_000,
            commit_threads: 2,
        }
    }
}

/// Computes the drain cap for one tick from the current queue depth, per
/// §4.4 step 3: saturate under pressure, shrink when the queue is quiet.
pub fn optimal_batch_size(queue_depth: usize, configured: usize) -> usize {
    if queue_depth > 1000 {
        (configured * 2).min(10_000)
    } else if queue_depth > 100 {
        configured
    } else {
        (configured / 2).max(10)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn saturates_under_pressure() {
        assert_eq!(optimal_batch_size(1001, 1000), 2000);
        assert_eq!(optimal_batch_size(50_000, 8000), 10_000);
    }

    #[test]
    fn uses_configured_value_in_middle_band() {
        assert_eq!(optimal_batch_size(500, 1000), 1000);
    }

    #[test]
    fn shrinks_with_floor_when_quiet() {
        assert_eq!(optimal_batch_size(10, 1000), 500);
        assert_eq!(optimal_batch_size(1, 10), 10);
    }
}
