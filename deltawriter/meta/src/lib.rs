//! Delta Lake write engine: batches concurrent per-table writes, commits
//! them as Delta transactions with optimistic-concurrency retry and
//! checkpointing, and tracks entity schemas in a registry.
//!
//! [`DeltaWriteService`] is the one type most callers need; `prelude`
//! re-exports everything else a caller typically names.

pub mod config;
pub mod error;
pub mod service;

pub use config::{Config, PerformanceConfig, SchemaConfig, SchemaEvolutionPolicy, StorageConfig, TableOverride};
pub use error::{DeltaWriteError, Result};
pub use service::DeltaWriteService;

pub mod prelude {
    pub use crate::config::{
        Config, PerformanceConfig, SchemaConfig, SchemaEvolutionPolicy, StorageConfig, TableOverride,
    };
    pub use crate::error::{DeltaWriteError, Result};
    pub use crate::service::DeltaWriteService;

    pub use deltawriter_engine::{CommitEngineConfig, CommitResult};
    pub use deltawriter_schema::{
        EntityMetadata, FieldType, Metrics, NoopMetrics, Record, RecordField, RecordSchema, RecordValue,
        RegistryStats,
    };
    pub use deltawriter_scheduler::{SchedulerConfig, SchedulerError};
    pub use deltawriter_storage::{PartitionStrategy, PathResolver, StorageBackend, StoragePath};
}
