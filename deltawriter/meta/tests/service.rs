use std::collections::HashMap;

use deltawriter::prelude::*;
use deltawriter_schema::{FieldType, Record, RecordField, RecordSchema, RecordValue};
use deltawriter_storage::{PartitionStrategy, StorageBackend};

fn users_schema() -> RecordSchema {
    RecordSchema::new(
        "users",
        vec![
            RecordField::new("user_id", FieldType::String),
            RecordField::new("username", FieldType::String),
            RecordField::new("email", FieldType::String),
        ],
    )
}

fn record(user_id: &str) -> Record {
    let mut values = HashMap::new();
    values.insert("user_id".to_string(), RecordValue::String(user_id.to_string()));
    values.insert("username".to_string(), RecordValue::String("a".to_string()));
    values.insert("email".to_string(), RecordValue::String("a@x".to_string()));
    Record::new(values)
}

async fn service_for(base_path: &str) -> DeltaWriteService {
    let storage = StorageConfig {
        backend: StorageBackend::Local,
        base_path: base_path.to_string(),
        partition_strategy: PartitionStrategy::None,
        compression_codec: "snappy".to_string(),
    };
    let config = Config::new(
        PerformanceConfig::default(),
        storage,
        SchemaConfig {
            auto_register_schemas: true,
            ..SchemaConfig::default()
        },
        HashMap::new(),
    )
    .unwrap();
    let service = DeltaWriteService::new(config);
    service.start().await;
    service
}

#[tokio::test]
async fn create_then_append_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let service = service_for(dir.path().to_str().unwrap()).await;

    let first = service.write("users", vec![record("u1")], users_schema()).await.unwrap();
    assert_eq!(first.version, 0);

    let second = service.write("users", vec![record("u2")], users_schema()).await.unwrap();
    assert_eq!(second.version, 1);
}

#[tokio::test]
async fn register_entity_is_idempotent_for_identical_schema() {
    let dir = tempfile::tempdir().unwrap();
    let service = service_for(dir.path().to_str().unwrap()).await;

    service
        .register_entity("users", users_schema(), Some("user_id".to_string()), vec![], HashMap::new())
        .await
        .unwrap();
    let first = service.get_entity("users").await.unwrap();

    service
        .register_entity("users", users_schema(), Some("user_id".to_string()), vec![], HashMap::new())
        .await
        .unwrap();
    let second = service.get_entity("users").await.unwrap();

    assert_eq!(first.registered_at, second.registered_at);
    assert_eq!(service.registry_stats().await.total, 1);
}

#[tokio::test]
async fn invalid_primary_key_is_rejected_without_mutation() {
    let dir = tempfile::tempdir().unwrap();
    let service = service_for(dir.path().to_str().unwrap()).await;

    let err = service
        .register_entity(
            "users",
            users_schema(),
            Some("nonexistent".to_string()),
            vec![],
            HashMap::new(),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, DeltaWriteError::Schema(_)));
    assert!(service.get_entity("users").await.is_none());
}
