use std::collections::HashMap;

use deltawriter_storage::{PartitionStrategy, StorageBackend};

use crate::error::{DeltaWriteError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaEvolutionPolicy {
    BackwardCompatible,
    ForwardCompatible,
    FullCompatible,
    None,
}

/// Per-table override of the global schema/partitioning defaults.
#[derive(Debug, Clone, Default)]
pub struct TableOverride {
    pub primary_key_column: Option<String>,
    pub partition_columns: Vec<String>,
    pub partition_strategy: Option<PartitionStrategy>,
}

#[derive(Debug, Clone)]
pub struct PerformanceConfig {
    pub batch_timeout_ms: u64,
    pub max_batch_size: usize,
    pub max_retries: usize,
    pub write_timeout_ms: u64,
    pub commit_threads: usize,
    pub checkpoint_interval: i64,
    pub connection_pool_size: usize,
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        Self {
            batch_timeout_ms: 50,
            max_batch_size: 1000,
            max_retries: 3,
            write_timeout_ms: 30_000,
            commit_threads: 2,
            checkpoint_interval: 10,
            connection_pool_size: 10,
        }
    }
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub base_path: String,
    pub partition_strategy: PartitionStrategy,
    pub compression_codec: String,
}

#[derive(Debug, Clone)]
pub struct SchemaConfig {
    pub evolution_policy: SchemaEvolutionPolicy,
    pub enable_schema_validation: bool,
    pub auto_register_schemas: bool,
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self {
            evolution_policy: SchemaEvolutionPolicy::BackwardCompatible,
            enable_schema_validation: true,
            auto_register_schemas: false,
        }
    }
}

/// Validated, in-memory configuration for a [`crate::service::DeltaWriteService`].
/// No file-format (TOML/YAML/env) loader is provided here — that belongs
/// to the out-of-scope HTTP/REST surface — but this is exactly the struct
/// such a loader would produce.
#[derive(Debug, Clone)]
pub struct Config {
    pub performance: PerformanceConfig,
    pub storage: StorageConfig,
    pub schema: SchemaConfig,
    pub tables: HashMap<String, TableOverride>,
}

impl Config {
    pub fn new(
        performance: PerformanceConfig,
        storage: StorageConfig,
        schema: SchemaConfig,
        tables: HashMap<String, TableOverride>,
    ) -> Result<Self> {
        if performance.batch_timeout_ms == 0 {
            return Err(DeltaWriteError::Config(
                "performance.batch_timeout_ms must be greater than 0".to_string(),
            ));
        }
        if performance.commit_threads < 1 {
            return Err(DeltaWriteError::Config(
                "performance.commit_threads must be at least 1".to_string(),
            ));
        }
        if performance.write_timeout_ms == 0 {
            return Err(DeltaWriteError::Config(
                "performance.write_timeout_ms must be greater than 0".to_string(),
            ));
        }

        Ok(Self {
            performance,
            storage,
            schema,
            tables,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn storage() -> StorageConfig {
        StorageConfig {
            backend: StorageBackend::Local,
            base_path: "/data".to_string(),
            partition_strategy: PartitionStrategy::None,
            compression_codec: "snappy".to_string(),
        }
    }

    #[test]
    fn zero_batch_timeout_is_rejected() {
        let performance = PerformanceConfig {
            batch_timeout_ms: 0,
            ..PerformanceConfig::default()
        };
        let err = Config::new(performance, storage(), SchemaConfig::default(), HashMap::new()).unwrap_err();
        assert!(matches!(err, DeltaWriteError::Config(_)));
    }

    #[test]
    fn zero_max_retries_is_allowed() {
        let performance = PerformanceConfig {
            max_retries: 0,
            ..PerformanceConfig::default()
        };
        assert!(Config::new(performance, storage(), SchemaConfig::default(), HashMap::new()).is_ok());
    }

    #[test]
    fn zero_commit_threads_is_rejected() {
        let performance = PerformanceConfig {
            commit_threads: 0,
            ..PerformanceConfig::default()
        };
        let err = Config::new(performance, storage(), SchemaConfig::default(), HashMap::new()).unwrap_err();
        assert!(matches!(err, DeltaWriteError::Config(_)));
    }
}
