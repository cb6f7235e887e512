use std::collections::HashMap;

use deltawriter_schema::RecordValue;
use tracing::debug;
use url::Url;

use crate::error::{Result, StoreError};
use crate::model::{PartitionStrategy, StorageBackend, StoragePath};

fn normalize_leading_slash(base: &str) -> String {
    if base.starts_with('/') {
        base.to_string()
    } else {
        format!("/{base}")
    }
}

/// Computes the storage URI for a table given a [`StorageBackend`] and an
/// optional per-table [`PartitionStrategy`] override of the configured
/// default.
pub struct PathResolver {
    backend: StorageBackend,
    base_path: String,
    default_strategy: PartitionStrategy,
    table_strategy_overrides: HashMap<String, PartitionStrategy>,
}

impl PathResolver {
    pub fn new(backend: StorageBackend, base_path: impl Into<String>, default_strategy: PartitionStrategy) -> Self {
        Self {
            backend,
            base_path: base_path.into(),
            default_strategy,
            table_strategy_overrides: HashMap::new(),
        }
    }

    pub fn with_table_override(mut self, entity_type: impl Into<String>, strategy: PartitionStrategy) -> Self {
        self.table_strategy_overrides.insert(entity_type.into(), strategy);
        self
    }

    fn strategy_for(&self, entity_type: &str) -> PartitionStrategy {
        self.table_strategy_overrides
            .get(entity_type)
            .copied()
            .unwrap_or(self.default_strategy)
    }

    /// Computes the base URI for `entity_type`, per the templates in §4.3.
    pub fn resolve_base(&self, entity_type: &str) -> Result<Url> {
        let uri = match &self.backend {
            StorageBackend::S3 { bucket } => {
                if bucket.is_empty() {
                    return Err(StoreError::EmptyBucket);
                }
                let base = normalize_leading_slash(&self.base_path);
                format!("s3a://{bucket}{base}/{entity_type}")
            }
            StorageBackend::Local => {
                let base = if self.base_path.starts_with('/') {
                    self.base_path.clone()
                } else {
                    format!("/tmp/{}", self.base_path)
                };
                format!("file://{base}/{entity_type}")
            }
            StorageBackend::Hdfs { namenode } => {
                let base = self.base_path.trim_start_matches('/');
                format!("hdfs://{namenode}/{base}/{entity_type}")
            }
            StorageBackend::Azure { container, account } => {
                let base = normalize_leading_slash(&self.base_path);
                format!("abfss://{container}@{account}.dfs.core.windows.net{base}/{entity_type}")
            }
            StorageBackend::Gcs { bucket } => {
                if bucket.is_empty() {
                    return Err(StoreError::EmptyBucket);
                }
                let base = normalize_leading_slash(&self.base_path);
                format!("gs://{bucket}{base}/{entity_type}")
            }
        };

        debug!(entity_type, uri, "resolved base storage URI");
        Ok(Url::parse(&uri)?)
    }

    /// Computes the full [`StoragePath`] for `entity_type`, applying the
    /// resolved partition strategy to `partition_values`.
    pub fn resolve(
        &self,
        entity_type: &str,
        partition_values: &HashMap<String, RecordValue>,
    ) -> Result<StoragePath> {
        let base_url = self.resolve_base(entity_type)?;
        let base_path = base_url.to_string();
        let strategy = self.strategy_for(entity_type);
        let partition_path = strategy.build_path(partition_values);
        let full_path = format!("{base_path}{partition_path}");

        Ok(StoragePath {
            base_path,
            partition_path,
            full_path,
            entity_type: entity_type.to_string(),
            storage_type: self.backend.storage_type().to_string(),
            protocol: self.backend.protocol().to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(StorageBackend::S3 { bucket: "my-bucket".into() }, "s3a://my-bucket/base/users")]
    #[case(StorageBackend::Hdfs { namenode: "nn1".into() }, "hdfs://nn1/base/users")]
    #[case(StorageBackend::Gcs { bucket: "my-bucket".into() }, "gs://my-bucket/base/users")]
    fn resolves_base_uri_per_backend(#[case] backend: StorageBackend, #[case] expected: &str) {
        let resolver = PathResolver::new(backend, "/base", PartitionStrategy::None);
        let uri = resolver.resolve_base("users").unwrap();
        assert_eq!(uri.as_str(), expected);
    }

    #[test]
    fn azure_uses_abfss_scheme() {
        let backend = StorageBackend::Azure {
            container: "data".into(),
            account: "myaccount".into(),
        };
        let resolver = PathResolver::new(backend, "/base", PartitionStrategy::None);
        let uri = resolver.resolve_base("users").unwrap();
        assert_eq!(uri.as_str(), "abfss://data@myaccount.dfs.core.windows.net/base/users");
    }

    #[test]
    fn local_backend_prefixes_relative_base_with_tmp() {
        let resolver = PathResolver::new(StorageBackend::Local, "base", PartitionStrategy::None);
        let uri = resolver.resolve_base("users").unwrap();
        assert_eq!(uri.as_str(), "file:///tmp/base/users");
    }

    #[test]
    fn empty_s3_bucket_is_rejected() {
        let resolver = PathResolver::new(
            StorageBackend::S3 { bucket: String::new() },
            "/base",
            PartitionStrategy::None,
        );
        assert!(matches!(resolver.resolve_base("users"), Err(StoreError::EmptyBucket)));
    }

    #[test]
    fn table_override_takes_precedence_over_default_strategy() {
        let resolver = PathResolver::new(
            StorageBackend::S3 { bucket: "b".into() },
            "/base",
            PartitionStrategy::None,
        )
        .with_table_override("users", PartitionStrategy::HashBased);

        let mut values = HashMap::new();
        values.insert("user_id".to_string(), RecordValue::String("u1".to_string()));
        let path = resolver.resolve("users", &values).unwrap();
        assert!(path.partition_path.starts_with("/partition="));
    }

    #[test]
    fn range_based_buckets_by_threshold() {
        let resolver = PathResolver::new(
            StorageBackend::S3 { bucket: "b".into() },
            "/base",
            PartitionStrategy::RangeBased,
        );
        let mut values = HashMap::new();
        values.insert("amount".to_string(), RecordValue::Int64(500));
        let path = resolver.resolve("orders", &values).unwrap();
        assert_eq!(path.partition_path, "/range=0-1K");
    }
}
