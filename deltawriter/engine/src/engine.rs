use std::sync::Arc;

use deltalake::kernel::StructType;
use deltalake::operations::create::CreateBuilder;
use deltalake::operations::DeltaOps;
use deltalake::parquet::basic::Compression;
use deltalake::parquet::file::properties::WriterProperties;
use deltalake::protocol::SaveMode;
use deltalake::{DeltaTable, DeltaTableError};
use deltawriter_schema::{Metrics, NoopMetrics, Record, RecordSchema, SchemaTranslator};
use deltawriter_storage::PathResolver;
use tokio::time::sleep;
use tracing::{debug, info, instrument, warn};

use crate::encoding::build_record_batch;
use crate::error::{CommitError, Result};
use crate::model::{CommitEngineConfig, CommitResult};

/// Is this commit failure an optimistic-concurrency conflict the caller
/// should retry, as opposed to a terminal I/O or schema error?
fn is_conflict(err: &DeltaTableError) -> bool {
    matches!(err, DeltaTableError::VersionAlreadyExists(_))
}

/// Maps `storage.compressionCodec` (§6) to the `parquet` crate's
/// `Compression` enum. Unrecognized values fall back to snappy with a
/// warning rather than failing the commit over a config typo.
fn parquet_compression_for(codec: &str) -> Compression {
    match codec.to_ascii_lowercase().as_str() {
        "snappy" => Compression::SNAPPY,
        "uncompressed" | "none" => Compression::UNCOMPRESSED,
        "lz4" | "lz4_raw" => Compression::LZ4_RAW,
        other => {
            warn!(codec = other, "unrecognized compression codec, defaulting to snappy");
            Compression::SNAPPY
        }
    }
}

/// Opens (or creates) the Delta table at `uri`, attaching `delta_schema`
/// when the table does not yet exist.
async fn open_or_create_table(uri: &str, delta_schema: &StructType) -> Result<DeltaTable> {
    match deltalake::open_table(uri).await {
        Ok(table) => Ok(table),
        Err(_) => {
            debug!(uri, "table does not exist yet, creating");
            let table = CreateBuilder::new()
                .with_location(uri)
                .with_save_mode(SaveMode::Ignore)
                .with_columns(delta_schema.fields().cloned())
                .await?;
            Ok(table)
        }
    }
}

/// A single commit attempt: open/create, encode, write a data file, and
/// commit the resulting `Add` action. Returns `Err` with the underlying
/// `DeltaTableError` classified by [`is_conflict`] on optimistic-concurrency
/// failure so the caller can retry.
async fn try_commit_once(
    uri: &str,
    delta_schema: &StructType,
    records: &[Record],
    compression_codec: &str,
) -> Result<i64> {
    let table = open_or_create_table(uri, delta_schema).await?;

    let batch = build_record_batch(delta_schema, records)?;
    let writer_properties = WriterProperties::builder()
        .set_compression(parquet_compression_for(compression_codec))
        .build();

    let table = DeltaOps(table)
        .write(vec![batch])
        .with_writer_properties(writer_properties)
        .await?;

    Ok(table.version())
}

/// For one `(table, coalesced-records, schema)` group: opens a Delta
/// transaction, writes Parquet data file(s), generates `Add` actions,
/// commits with optimistic concurrency, retries on conflict with
/// exponential backoff, and opportunistically emits checkpoints.
pub struct CommitEngine {
    translator: SchemaTranslator,
    path_resolver: PathResolver,
    config: CommitEngineConfig,
    metrics: Arc<dyn Metrics>,
}

impl CommitEngine {
    pub fn new(translator: SchemaTranslator, path_resolver: PathResolver, config: CommitEngineConfig) -> Self {
        Self::with_metrics(translator, path_resolver, config, Arc::new(NoopMetrics))
    }

    pub fn with_metrics(
        translator: SchemaTranslator,
        path_resolver: PathResolver,
        config: CommitEngineConfig,
        metrics: Arc<dyn Metrics>,
    ) -> Self {
        crate::handlers::register_handlers();
        Self {
            translator,
            path_resolver,
            config,
            metrics,
        }
    }

    #[instrument(skip(self, records, schema), fields(record_count = records.len()))]
    pub async fn commit(&self, table: &str, records: Vec<Record>, schema: &RecordSchema) -> Result<CommitResult> {
        if records.is_empty() {
            let current_version = self.current_version(table).await.unwrap_or(-1);
            return Ok(CommitResult { version: current_version });
        }

        let uri = self.path_resolver.resolve_base(table)?;
        let delta_schema = self.translator.to_delta_schema(schema).await;

        let mut attempt = 0usize;
        let mut conflicts = 0usize;
        loop {
            match try_commit_once(uri.as_str(), &delta_schema, &records, &self.config.compression_codec).await {
                Ok(version) => {
                    info!(table, version, conflicts, "committed delta version");
                    self.metrics.incr_writes();
                    self.maybe_checkpoint(uri.as_str(), version).await;
                    return Ok(CommitResult { version });
                }
                Err(CommitError::Io(err)) if is_conflict(&err) && attempt < self.config.max_retries => {
                    conflicts += 1;
                    self.metrics.incr_conflicts();
                    let backoff = (self.config.retry_base_ms.saturating_mul(1 << attempt))
                        .min(self.config.retry_cap_ms);
                    warn!(table, attempt, backoff_ms = backoff, "commit conflict, retrying");
                    sleep(std::time::Duration::from_millis(backoff)).await;
                    attempt += 1;
                }
                Err(CommitError::Io(err)) if is_conflict(&err) => {
                    return Err(CommitError::ConflictExhausted(self.config.max_retries));
                }
                Err(other) => return Err(other),
            }
        }
    }

    async fn current_version(&self, table: &str) -> Option<i64> {
        let uri = self.path_resolver.resolve_base(table).ok()?;
        deltalake::open_table(uri.as_str()).await.ok().map(|t| t.version())
    }

    async fn maybe_checkpoint(&self, uri: &str, version: i64) {
        if version <= 0 || self.config.checkpoint_interval <= 0 {
            return;
        }
        if version % self.config.checkpoint_interval != 0 {
            return;
        }
        match deltalake::open_table(uri).await {
            Ok(table) => {
                if let Err(err) = deltalake::checkpoints::create_checkpoint(&table).await {
                    warn!(uri, version, error = %err, "checkpoint failed, ignoring");
                } else {
                    info!(uri, version, "checkpoint created");
                    self.metrics.incr_checkpoints_created();
                }
            }
            Err(err) => warn!(uri, version, error = %err, "checkpoint skipped, could not reopen table"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_already_exists_is_classified_as_a_conflict() {
        assert!(is_conflict(&DeltaTableError::VersionAlreadyExists(3)));
    }

    #[test]
    fn generic_io_error_is_not_a_conflict() {
        let err = DeltaTableError::generic("boom");
        assert!(!is_conflict(&err));
    }
}
