use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use deltawriter_engine::{CommitEngine, CommitEngineConfig, CommitResult};
use deltawriter_schema::{
    EntityMetadata, Metrics, NoopMetrics, Record, RecordSchema, RegistryStats, SchemaError,
    SchemaRegistry, SchemaTranslator,
};
use deltawriter_scheduler::{BatchScheduler, SchedulerConfig};
use deltawriter_storage::PathResolver;
use tracing::debug;

use crate::config::Config;
use crate::error::{DeltaWriteError, Result};

fn scheduler_config_from(config: &Config) -> SchedulerConfig {
    SchedulerConfig {
        batch_timeout_ms: config.performance.batch_timeout_ms,
        max_batch_size: config.performance.max_batch_size,
        write_timeout_ms: config.performance.write_timeout_ms,
        commit_threads: config.performance.commit_threads,
    }
}

fn commit_engine_config_from(config: &Config) -> CommitEngineConfig {
    CommitEngineConfig {
        max_retries: config.performance.max_retries,
        checkpoint_interval: config.performance.checkpoint_interval,
        compression_codec: config.storage.compression_codec.clone(),
        ..CommitEngineConfig::default()
    }
}

fn path_resolver_from(config: &Config) -> PathResolver {
    let mut resolver = PathResolver::new(
        config.storage.backend.clone(),
        config.storage.base_path.clone(),
        config.storage.partition_strategy,
    );
    for (table, table_override) in &config.tables {
        if let Some(strategy) = table_override.partition_strategy {
            resolver = resolver.with_table_override(table.clone(), strategy);
        }
    }
    resolver
}

/// The one facade a caller holds: wires together the schema registry, the
/// schema translator, the path resolver, and the batch scheduler (which
/// owns its own commit engine). This is the write engine's single
/// documented entry point.
pub struct DeltaWriteService {
    registry: SchemaRegistry,
    translator: SchemaTranslator,
    scheduler: BatchScheduler,
    config: Config,
}

impl DeltaWriteService {
    pub fn new(config: Config) -> Self {
        Self::with_metrics(config, Arc::new(NoopMetrics))
    }

    pub fn with_metrics(config: Config, metrics: Arc<dyn Metrics>) -> Self {
        let path_resolver = path_resolver_from(&config);
        let commit_engine = CommitEngine::with_metrics(
            SchemaTranslator::new(),
            path_resolver,
            commit_engine_config_from(&config),
            metrics.clone(),
        );
        let scheduler = BatchScheduler::with_metrics(commit_engine, scheduler_config_from(&config), metrics);

        Self {
            registry: SchemaRegistry::new(),
            translator: SchemaTranslator::new(),
            scheduler,
            config,
        }
    }

    /// Starts the scheduler's ticker and worker pool.
    pub async fn start(&self) {
        self.scheduler.start().await;
    }

    /// Stops the scheduler, draining pending writes with `Shutdown`.
    pub async fn shutdown(&self) {
        self.scheduler.shutdown().await;
    }

    /// Registers a new entity type, or idempotently re-registers an
    /// identical, active one. See [`SchemaRegistry::register`].
    pub async fn register_entity(
        &self,
        entity_type: &str,
        schema: RecordSchema,
        primary_key_column: Option<String>,
        partition_columns: Vec<String>,
        properties: HashMap<String, String>,
    ) -> Result<()> {
        let metadata = EntityMetadata::new(
            entity_type,
            schema,
            primary_key_column,
            partition_columns,
            properties,
            Utc::now(),
        );
        self.registry
            .register(entity_type, metadata)
            .await
            .map_err(DeltaWriteError::from)
    }

    pub async fn get_entity(&self, entity_type: &str) -> Option<EntityMetadata> {
        self.registry.get(entity_type).await
    }

    pub async fn deactivate_entity(&self, entity_type: &str) -> Result<()> {
        self.registry
            .deactivate(entity_type)
            .await
            .map_err(DeltaWriteError::from)
    }

    pub async fn registry_stats(&self) -> RegistryStats {
        self.registry.stats().await
    }

    /// Writes `records` for `table`, auto-registering or validating the
    /// schema per `schema.auto_register_schemas` /
    /// `schema.enable_schema_validation`, then submits to the scheduler.
    pub async fn write(&self, table: &str, records: Vec<Record>, schema: RecordSchema) -> Result<CommitResult> {
        if self.config.schema.enable_schema_validation {
            self.validate_or_register(table, &schema).await?;
        }

        // Warms the translator's cache outside the commit path so the
        // first real commit for a new schema doesn't pay translation cost
        // under the scheduler's lock.
        let _ = self.translator.to_delta_schema(&schema).await;

        self.scheduler
            .submit(table, records, schema)
            .await
            .map_err(DeltaWriteError::from)
    }

    async fn validate_or_register(&self, table: &str, schema: &RecordSchema) -> Result<()> {
        match self.registry.get_schema(table).await {
            Some(registered) if registered.fingerprint() == schema.fingerprint() => Ok(()),
            Some(_) => Err(DeltaWriteError::from(SchemaError::SchemaConflict(table.to_string()))),
            None if self.config.schema.auto_register_schemas => {
                debug!(table, "auto-registering schema on first write");
                self.register_entity(table, schema.clone(), None, vec![], HashMap::new())
                    .await
            }
            None => Err(DeltaWriteError::from(SchemaError::NotRegistered(table.to_string()))),
        }
    }
}
