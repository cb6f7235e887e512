use std::collections::HashMap;

use deltalake::kernel::{DataType, PrimitiveType, StructField, StructType};
use tokio::sync::RwLock;

use crate::model::{FieldType, RecordSchema};

fn primitive_for(field_type: &FieldType) -> (PrimitiveType, bool) {
    match field_type {
        FieldType::String => (PrimitiveType::String, false),
        FieldType::Int32 => (PrimitiveType::Integer, false),
        FieldType::Int64 => (PrimitiveType::Long, false),
        FieldType::Float32 => (PrimitiveType::Float, false),
        FieldType::Float64 => (PrimitiveType::Double, false),
        FieldType::Bool => (PrimitiveType::Boolean, false),
        FieldType::Bytes => (PrimitiveType::Binary, false),
        FieldType::Nullable(inner) => {
            let (primitive, _) = primitive_for(inner);
            (primitive, true)
        }
    }
}

/// Converts a [`RecordSchema`] into the Delta Lake `StructType` the commit
/// engine attaches to newly created tables, caching the result per schema
/// name. The cache is never evicted — it is bounded by the number of
/// distinct schema names seen in a process.
pub struct SchemaTranslator {
    cache: RwLock<HashMap<String, StructType>>,
}

impl Default for SchemaTranslator {
    fn default() -> Self {
        Self::new()
    }
}

impl SchemaTranslator {
    pub fn new() -> Self {
        Self {
            cache: RwLock::new(HashMap::new()),
        }
    }

    pub async fn to_delta_schema(&self, schema: &RecordSchema) -> StructType {
        if let Some(cached) = self.cache.read().await.get(&schema.name) {
            return cached.clone();
        }

        let mut fields = Vec::with_capacity(schema.fields.len());
        for field in &schema.fields {
            let (primitive, nullable) = primitive_for(&field.field_type);
            fields.push(StructField::new(
                field.name.clone(),
                DataType::Primitive(primitive),
                nullable,
            ));
        }

        let delta_schema = StructType::new(fields);
        self.cache
            .write()
            .await
            .insert(schema.name.clone(), delta_schema.clone());
        delta_schema
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RecordField;

    #[tokio::test]
    async fn translates_primitive_and_nullable_fields() {
        let translator = SchemaTranslator::new();
        let schema = RecordSchema::new(
            "users",
            vec![
                RecordField::new("user_id", FieldType::String),
                RecordField::new("age", FieldType::Nullable(Box::new(FieldType::Int32))),
            ],
        );

        let delta_schema = translator.to_delta_schema(&schema).await;
        let fields = delta_schema.fields().collect::<Vec<_>>();

        assert_eq!(fields.len(), 2);
        assert!(!fields[0].is_nullable());
        assert!(fields[1].is_nullable());
    }

    #[tokio::test]
    async fn result_is_cached_by_schema_name() {
        let translator = SchemaTranslator::new();
        let schema = RecordSchema::new("users", vec![RecordField::new("a", FieldType::String)]);

        let first = translator.to_delta_schema(&schema).await;
        let second = translator.to_delta_schema(&schema).await;
        assert_eq!(first.fields().count(), second.fields().count());
    }
}
