//! Entity/schema registry and Delta schema translation.
//!
//! Tracks logical entity types, their record schemas and schema
//! fingerprints ([`registry::SchemaRegistry`]), and translates a record
//! schema into the Delta Lake `StructType` the commit engine writes
//! ([`translator::SchemaTranslator`]).

pub mod error;
pub mod metrics;
pub mod model;
pub mod registry;
pub mod translator;

pub use error::{Result, SchemaError};
pub use metrics::{Metrics, NoopMetrics};
pub use model::{EntityMetadata, FieldType, Record, RecordField, RecordSchema, RecordValue, RegistryStats};
pub use registry::SchemaRegistry;
pub use translator::SchemaTranslator;
