//! Write-batching and coalescing scheduler: queues per-table writes and
//! dispatches coalesced groups to the commit engine on a periodic tick.

pub mod error;
pub mod model;
pub mod scheduler;

pub use error::{Result, SchedulerError};
pub use model::{optimal_batch_size, SchedulerConfig, WriteSubmission};
pub use scheduler::BatchScheduler;
