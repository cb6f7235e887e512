use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::error::{Result, SchemaError};
use crate::model::{EntityMetadata, RecordSchema, RegistryStats};

fn is_valid_entity_type(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn validate_metadata_fields(metadata: &EntityMetadata) -> Result<()> {
    if !is_valid_entity_type(&metadata.entity_type) {
        return Err(SchemaError::InvalidName(metadata.entity_type.clone()));
    }
    if let Some(pk) = &metadata.primary_key_column {
        if !metadata.schema.has_field(pk) {
            return Err(SchemaError::FieldNotInSchema {
                entity: metadata.entity_type.clone(),
                field: pk.clone(),
            });
        }
    }
    for col in &metadata.partition_columns {
        if !metadata.schema.has_field(col) {
            return Err(SchemaError::FieldNotInSchema {
                entity: metadata.entity_type.clone(),
                field: col.clone(),
            });
        }
    }
    Ok(())
}

struct Inner {
    metadata: HashMap<String, EntityMetadata>,
    schemas: HashMap<String, RecordSchema>,
    registration_times: HashMap<String, DateTime<Utc>>,
}

impl Inner {
    fn new() -> Self {
        Self {
            metadata: HashMap::new(),
            schemas: HashMap::new(),
            registration_times: HashMap::new(),
        }
    }
}

/// Maps entity-type name to `(record schema, fingerprint, lifecycle
/// metadata)`, enforcing that the metadata map and schema map never
/// disagree. Guarded by a single reader/writer lock, per the spec's
/// concurrency model: all mutators take the writer lock, reads take the
/// reader lock, and the consistency invariant holds at every lock-release
/// boundary.
pub struct SchemaRegistry {
    inner: RwLock<Inner>,
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner::new()),
        }
    }

    /// Registers `metadata` under `entity_type`. Idempotent when the entry
    /// already exists, is active, and carries an identical schema;
    /// reactivates an inactive entry, preserving `registered_at`.
    pub async fn register(&self, entity_type: &str, mut metadata: EntityMetadata) -> Result<()> {
        validate_metadata_fields(&metadata)?;
        let now = Utc::now();
        let mut inner = self.inner.write().await;

        if let Some(existing) = inner.metadata.get(entity_type) {
            if existing.active {
                if existing.schema != metadata.schema {
                    return Err(SchemaError::SchemaConflict(entity_type.to_string()));
                }
                debug!(entity_type, "register: identical schema, idempotent no-op");
                return Ok(());
            }
            // Reactivation: keep the original registration time, refresh the rest.
            metadata.registered_at = existing.registered_at;
            metadata.last_updated = now;
            metadata.active = true;
            info!(entity_type, "reactivating previously deactivated entity");
        } else {
            metadata.registered_at = now;
            metadata.last_updated = now;
            metadata.active = true;
        }

        let schema_version = metadata.schema.fingerprint();
        metadata.schema_version = schema_version;

        inner
            .registration_times
            .insert(entity_type.to_string(), metadata.registered_at);
        inner
            .schemas
            .insert(entity_type.to_string(), metadata.schema.clone());
        inner.metadata.insert(entity_type.to_string(), metadata);

        info!(entity_type, "registered entity");
        Ok(())
    }

    /// Updates an existing entry. Requires the entity to already be
    /// registered; preserves `registered_at`; allows the schema to change.
    pub async fn update(&self, entity_type: &str, mut metadata: EntityMetadata) -> Result<()> {
        validate_metadata_fields(&metadata)?;
        let mut inner = self.inner.write().await;

        let existing = inner
            .metadata
            .get(entity_type)
            .ok_or_else(|| SchemaError::NotRegistered(entity_type.to_string()))?;

        if metadata.schema != existing.schema {
            warn!(entity_type, "schema changed via update");
        }

        metadata.registered_at = existing.registered_at;
        metadata.last_updated = Utc::now();
        metadata.schema_version = metadata.schema.fingerprint();

        inner
            .schemas
            .insert(entity_type.to_string(), metadata.schema.clone());
        inner.metadata.insert(entity_type.to_string(), metadata);

        Ok(())
    }

    /// Idempotent: sets `active = false`, retains the schema for later
    /// reactivation via [`Self::register`].
    pub async fn deactivate(&self, entity_type: &str) -> Result<()> {
        let mut inner = self.inner.write().await;
        let entry = inner
            .metadata
            .get_mut(entity_type)
            .ok_or_else(|| SchemaError::NotRegistered(entity_type.to_string()))?;
        entry.active = false;
        entry.last_updated = Utc::now();
        Ok(())
    }

    /// Read-only lookup, opportunistically repairing a missing schema
    /// entry under an upgraded (write) lock.
    pub async fn get(&self, entity_type: &str) -> Option<EntityMetadata> {
        {
            let inner = self.inner.read().await;
            if let Some(metadata) = inner.metadata.get(entity_type) {
                if inner.schemas.contains_key(entity_type) {
                    return Some(metadata.clone());
                }
            } else {
                return None;
            }
        }
        let mut inner = self.inner.write().await;
        if let Some(metadata) = inner.metadata.get(entity_type).cloned() {
            inner
                .schemas
                .entry(entity_type.to_string())
                .or_insert_with(|| metadata.schema.clone());
            Some(metadata)
        } else {
            None
        }
    }

    pub async fn get_schema(&self, entity_type: &str) -> Option<RecordSchema> {
        self.get(entity_type).await.map(|m| m.schema)
    }

    pub async fn is_registered(&self, entity_type: &str) -> bool {
        self.inner.read().await.metadata.contains_key(entity_type)
    }

    /// Repairs the metadata/schema maps to restore the consistency
    /// invariant and returns how many repairs were made. Never fails.
    pub async fn validate_consistency(&self) -> usize {
        let mut inner = self.inner.write().await;
        let mut repairs = 0usize;

        let entity_types: Vec<String> = inner.metadata.keys().cloned().collect();
        for entity_type in &entity_types {
            let schema = inner.metadata.get(entity_type).map(|m| m.schema.clone());
            let Some(schema) = schema else { continue };

            match inner.schemas.get(entity_type) {
                None => {
                    inner.schemas.insert(entity_type.clone(), schema);
                    repairs += 1;
                }
                Some(existing) if existing.fingerprint() != schema.fingerprint() => {
                    inner.schemas.insert(entity_type.clone(), schema);
                    repairs += 1;
                }
                _ => {}
            }
        }

        let orphaned: Vec<String> = inner
            .schemas
            .keys()
            .filter(|k| !inner.metadata.contains_key(*k))
            .cloned()
            .collect();
        for entity_type in orphaned {
            inner.schemas.remove(&entity_type);
            inner.registration_times.remove(&entity_type);
            repairs += 1;
        }

        if repairs > 0 {
            warn!(repairs, "schema registry consistency repair applied");
        }
        repairs
    }

    pub async fn stats(&self) -> RegistryStats {
        let inner = self.inner.read().await;
        let total = inner.metadata.len();
        let active = inner.metadata.values().filter(|m| m.active).count();
        let inconsistent = inner
            .metadata
            .keys()
            .filter(|k| {
                inner
                    .schemas
                    .get(*k)
                    .map(|s| s.fingerprint() != inner.metadata[*k].schema.fingerprint())
                    .unwrap_or(true)
            })
            .count();
        let orphaned = inner
            .schemas
            .keys()
            .filter(|k| !inner.metadata.contains_key(*k))
            .count();

        let health_score = if total == 0 {
            1.0
        } else {
            (1.0 - (inconsistent + orphaned) as f64 / total as f64).max(0.0)
        };

        RegistryStats {
            total,
            active,
            inactive: total - active,
            entity_types: inner.metadata.keys().cloned().collect(),
            health_score,
        }
    }

    /// Test-only full reset. Never called in production code paths.
    #[cfg(any(test, feature = "test-util"))]
    pub async fn clear_all(&self) {
        let mut inner = self.inner.write().await;
        inner.metadata.clear();
        inner.schemas.clear();
        inner.registration_times.clear();
    }
}
