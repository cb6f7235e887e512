use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// The primitive types a record field can hold, plus a nullable wrapper.
///
/// Mirrors the Avro-ish primitive set the ingestion side works with:
/// string/int32/int64/float32/float64/bool/bytes, with `Nullable` carrying
/// the wrapped type rather than being a separate leaf.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldType {
    String,
    Int32,
    Int64,
    Float32,
    Float64,
    Bool,
    Bytes,
    Nullable(Box<FieldType>),
}

impl FieldType {
    /// The canonical textual token used both for schema fingerprinting and
    /// for human-readable diagnostics.
    pub fn canonical_token(&self) -> String {
        match self {
            FieldType::String => "string".to_string(),
            FieldType::Int32 => "int32".to_string(),
            FieldType::Int64 => "int64".to_string(),
            FieldType::Float32 => "float32".to_string(),
            FieldType::Float64 => "float64".to_string(),
            FieldType::Bool => "bool".to_string(),
            FieldType::Bytes => "bytes".to_string(),
            FieldType::Nullable(inner) => format!("nullable({})", inner.canonical_token()),
        }
    }

    /// Whether a value of this type may be absent.
    pub fn is_nullable(&self) -> bool {
        matches!(self, FieldType::Nullable(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordField {
    pub name: String,
    pub field_type: FieldType,
}

impl RecordField {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
        }
    }
}

/// A named record schema: an ordered list of fields. Field order is load
/// bearing — it drives columnar encoding in the commit engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordSchema {
    pub name: String,
    pub fields: Vec<RecordField>,
}

impl RecordSchema {
    pub fn new(name: impl Into<String>, fields: Vec<RecordField>) -> Self {
        Self {
            name: name.into(),
            fields,
        }
    }

    pub fn field(&self, name: &str) -> Option<&RecordField> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.field(name).is_some()
    }

    /// Deterministic textual form used as the fingerprinting input. Two
    /// schemas are "identical" iff this string is equal.
    pub fn canonical_form(&self) -> String {
        let mut out = String::new();
        out.push_str(&self.name);
        out.push(':');
        for (i, field) in self.fields.iter().enumerate() {
            if i > 0 {
                out.push(',');
            }
            out.push_str(&field.name);
            out.push('=');
            out.push_str(&field.field_type.canonical_token());
        }
        out
    }

    /// SHA-256 prefix (8 lowercase hex chars) of [`Self::canonical_form`].
    pub fn fingerprint(&self) -> String {
        let digest = Sha256::digest(self.canonical_form().as_bytes());
        let hex = format!("{digest:x}");
        hex[..8].to_string()
    }
}

/// A single field value in a record. `Null` stands for an absent value of
/// a nullable field; the commit engine turns it into a type-default payload
/// with the null bit set during columnar encoding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RecordValue {
    String(String),
    Int32(i32),
    Int64(i64),
    Float32(f32),
    Float64(f64),
    Bool(bool),
    Bytes(Vec<u8>),
    Null,
}

/// One row conforming to some [`RecordSchema`], addressed by field name.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Record {
    pub values: HashMap<String, RecordValue>,
}

impl Record {
    pub fn new(values: HashMap<String, RecordValue>) -> Self {
        Self { values }
    }

    pub fn get(&self, field: &str) -> Option<&RecordValue> {
        self.values.get(field)
    }
}

/// Registry entry for one logical entity type: its schema, lineage
/// metadata and lifecycle flag.
///
/// `schemaVersion` is always derived from `schema` via fingerprinting — it
/// is never set independently, so the registry recomputes it on every
/// mutation rather than trusting a caller-supplied value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityMetadata {
    pub entity_type: String,
    pub schema: RecordSchema,
    pub primary_key_column: Option<String>,
    pub partition_columns: Vec<String>,
    pub properties: HashMap<String, String>,
    pub registered_at: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
    pub schema_version: String,
    pub active: bool,
}

impl EntityMetadata {
    /// Constructs metadata for a fresh registration: `registered_at` and
    /// `last_updated` both set to `now`, `schema_version` derived from
    /// `schema`, `active = true`.
    pub fn new(
        entity_type: impl Into<String>,
        schema: RecordSchema,
        primary_key_column: Option<String>,
        partition_columns: Vec<String>,
        properties: HashMap<String, String>,
        now: DateTime<Utc>,
    ) -> Self {
        let schema_version = schema.fingerprint();
        Self {
            entity_type: entity_type.into(),
            schema,
            primary_key_column,
            partition_columns,
            properties,
            registered_at: now,
            last_updated: now,
            schema_version,
            active: true,
        }
    }
}

/// Aggregate counters and health score returned by
/// [`crate::registry::SchemaRegistry::stats`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryStats {
    pub total: usize,
    pub active: usize,
    pub inactive: usize,
    pub entity_types: Vec<String>,
    pub health_score: f64,
}
