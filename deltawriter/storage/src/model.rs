use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};

use chrono::NaiveDate;
use deltawriter_schema::RecordValue;
use tracing::debug;

/// The storage vendor/style a table is rooted in. Deliberately a tagged
/// enum rather than a trait object: the only behavior it carries is URI
/// resolution, which does not need dynamic dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageBackend {
    S3 { bucket: String },
    Local,
    Hdfs { namenode: String },
    Azure { container: String, account: String },
    Gcs { bucket: String },
}

impl StorageBackend {
    pub fn protocol(&self) -> &'static str {
        match self {
            StorageBackend::S3 { .. } => "s3a",
            StorageBackend::Local => "file",
            StorageBackend::Hdfs { .. } => "hdfs",
            StorageBackend::Azure { .. } => "abfss",
            StorageBackend::Gcs { .. } => "gs",
        }
    }

    pub fn storage_type(&self) -> &'static str {
        match self {
            StorageBackend::S3 { .. } => "S3",
            StorageBackend::Local => "LOCAL",
            StorageBackend::Hdfs { .. } => "HDFS",
            StorageBackend::Azure { .. } => "AZURE",
            StorageBackend::Gcs { .. } => "GCS",
        }
    }
}

/// How partition values for a record map to a relative path segment.
/// Collapses the source's `PartitionStrategy` interface to a variant with
/// a single `build_path` method rather than a class hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartitionStrategy {
    None,
    DateBased,
    HashBased,
    RangeBased,
}

const DATE_BASED_FIELD_CANDIDATES: &[&str] =
    &["date", "signup_date", "created_date", "order_date", "event_date"];

fn record_value_to_string(value: &RecordValue) -> Option<String> {
    match value {
        RecordValue::String(s) => Some(s.clone()),
        RecordValue::Int32(i) => Some(i.to_string()),
        RecordValue::Int64(i) => Some(i.to_string()),
        RecordValue::Float32(f) => Some(f.to_string()),
        RecordValue::Float64(f) => Some(f.to_string()),
        RecordValue::Bool(b) => Some(b.to_string()),
        RecordValue::Bytes(_) | RecordValue::Null => None,
    }
}

fn record_value_to_f64(value: &RecordValue) -> Option<f64> {
    match value {
        RecordValue::Int32(i) => Some(*i as f64),
        RecordValue::Int64(i) => Some(*i as f64),
        RecordValue::Float32(f) => Some(*f as f64),
        RecordValue::Float64(f) => Some(*f),
        RecordValue::String(s) => s.parse::<f64>().ok(),
        RecordValue::Bool(_) | RecordValue::Bytes(_) | RecordValue::Null => None,
    }
}

/// The first value of a record in stable (sorted-by-field-name) order,
/// used by `HashBased` and `RangeBased` partitioning as "the first value".
fn first_value(values: &HashMap<String, RecordValue>) -> Option<&RecordValue> {
    let mut keys: Vec<&String> = values.keys().collect();
    keys.sort();
    keys.into_iter().next().and_then(|k| values.get(k))
}

impl PartitionStrategy {
    pub fn build_path(&self, values: &HashMap<String, RecordValue>) -> String {
        match self {
            PartitionStrategy::None => String::new(),
            PartitionStrategy::DateBased => {
                let date = DATE_BASED_FIELD_CANDIDATES
                    .iter()
                    .filter_map(|field| values.get(*field))
                    .filter_map(record_value_to_string)
                    .find_map(|s| NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok())
                    .unwrap_or_else(|| chrono::Utc::now().date_naive());

                format!(
                    "/year={:04}/month={:02}/day={:02}",
                    date.format("%Y"),
                    date.format("%m"),
                    date.format("%d")
                )
            }
            PartitionStrategy::HashBased => {
                let bucket = match first_value(values) {
                    Some(value) => {
                        let mut hasher = DefaultHasher::new();
                        record_value_to_string(value)
                            .unwrap_or_default()
                            .hash(&mut hasher);
                        (hasher.finish() % 100) as u64
                    }
                    None => {
                        debug!("no values to hash, defaulting to partition 00");
                        0
                    }
                };
                format!("/partition={bucket:02}")
            }
            PartitionStrategy::RangeBased => {
                let number = first_value(values).and_then(record_value_to_f64).unwrap_or(0.0);
                let bucket = if number < 1000.0 {
                    "0-1K"
                } else if number < 10_000.0 {
                    "1K-10K"
                } else if number < 100_000.0 {
                    "10K-100K"
                } else {
                    "100K+"
                };
                format!("/range={bucket}")
            }
        }
    }
}

/// A fully resolved storage location for one logical table, mirroring §3:
/// `full_path = base_path + partition_path`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoragePath {
    pub base_path: String,
    pub partition_path: String,
    pub full_path: String,
    pub entity_type: String,
    pub storage_type: String,
    pub protocol: String,
}
