use thiserror::Error;

/// Errors raised by [`crate::registry::SchemaRegistry`] and [`crate::translator::SchemaTranslator`].
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("entity type '{0}' is not a valid identifier (expected ^[A-Za-z][A-Za-z0-9_]*$)")]
    InvalidName(String),

    #[error("metadata for entity type '{0}' must not be null")]
    NullMetadata(String),

    #[error("field '{field}' referenced by entity '{entity}' is not present in its schema")]
    FieldNotInSchema { entity: String, field: String },

    #[error("entity type '{0}' is already registered with a different, active schema")]
    SchemaConflict(String),

    #[error("entity type '{0}' is not registered")]
    NotRegistered(String),
}

pub type Result<T> = std::result::Result<T, SchemaError>;
