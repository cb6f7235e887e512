use std::sync::Arc;

use deltalake::arrow::array::{
    ArrayRef, BinaryBuilder, BooleanBuilder, Float32Builder, Float64Builder, Int32Builder,
    Int64Builder, StringBuilder,
};
use deltalake::arrow::datatypes::{DataType as ArrowDataType, Field as ArrowField, Schema as ArrowSchema};
use deltalake::arrow::record_batch::RecordBatch;
use deltalake::kernel::{DataType as DeltaDataType, PrimitiveType, StructType};
use deltawriter_schema::{Record, RecordValue};

use crate::error::{CommitError, Result};

fn arrow_type_for(primitive: &PrimitiveType) -> ArrowDataType {
    match primitive {
        PrimitiveType::String => ArrowDataType::Utf8,
        PrimitiveType::Integer => ArrowDataType::Int32,
        PrimitiveType::Long => ArrowDataType::Int64,
        PrimitiveType::Float => ArrowDataType::Float32,
        PrimitiveType::Double => ArrowDataType::Float64,
        PrimitiveType::Boolean => ArrowDataType::Boolean,
        PrimitiveType::Binary => ArrowDataType::Binary,
        other => {
            // Every field this engine ever builds is translated by
            // SchemaTranslator, which only ever emits the primitives above;
            // anything else is a programming error upstream, not user input.
            panic!("unsupported delta primitive type reached the encoder: {other:?}")
        }
    }
}

fn build_column(primitive: &PrimitiveType, field_name: &str, records: &[Record]) -> Result<ArrayRef> {
    match primitive {
        PrimitiveType::String => {
            let mut builder = StringBuilder::new();
            for record in records {
                match record.get(field_name) {
                    Some(RecordValue::String(s)) => builder.append_value(s),
                    Some(RecordValue::Null) | None => builder.append_null(),
                    Some(other) => {
                        return Err(CommitError::SchemaMismatch(format!(
                            "field '{field_name}' expected string, got {other:?}"
                        )))
                    }
                }
            }
            Ok(Arc::new(builder.finish()))
        }
        PrimitiveType::Integer => {
            let mut builder = Int32Builder::new();
            for record in records {
                match record.get(field_name) {
                    Some(RecordValue::Int32(v)) => builder.append_value(*v),
                    Some(RecordValue::Null) | None => builder.append_null(),
                    Some(other) => {
                        return Err(CommitError::SchemaMismatch(format!(
                            "field '{field_name}' expected int32, got {other:?}"
                        )))
                    }
                }
            }
            Ok(Arc::new(builder.finish()))
        }
        PrimitiveType::Long => {
            let mut builder = Int64Builder::new();
            for record in records {
                match record.get(field_name) {
                    Some(RecordValue::Int64(v)) => builder.append_value(*v),
                    Some(RecordValue::Null) | None => builder.append_null(),
                    Some(other) => {
                        return Err(CommitError::SchemaMismatch(format!(
                            "field '{field_name}' expected int64, got {other:?}"
                        )))
                    }
                }
            }
            Ok(Arc::new(builder.finish()))
        }
        PrimitiveType::Float => {
            let mut builder = Float32Builder::new();
            for record in records {
                match record.get(field_name) {
                    Some(RecordValue::Float32(v)) => builder.append_value(*v),
                    Some(RecordValue::Null) | None => builder.append_null(),
                    Some(other) => {
                        return Err(CommitError::SchemaMismatch(format!(
                            "field '{field_name}' expected float32, got {other:?}"
                        )))
                    }
                }
            }
            Ok(Arc::new(builder.finish()))
        }
        PrimitiveType::Double => {
            let mut builder = Float64Builder::new();
            for record in records {
                match record.get(field_name) {
                    Some(RecordValue::Float64(v)) => builder.append_value(*v),
                    Some(RecordValue::Null) | None => builder.append_null(),
                    Some(other) => {
                        return Err(CommitError::SchemaMismatch(format!(
                            "field '{field_name}' expected float64, got {other:?}"
                        )))
                    }
                }
            }
            Ok(Arc::new(builder.finish()))
        }
        PrimitiveType::Boolean => {
            let mut builder = BooleanBuilder::new();
            for record in records {
                match record.get(field_name) {
                    Some(RecordValue::Bool(v)) => builder.append_value(*v),
                    Some(RecordValue::Null) | None => builder.append_null(),
                    Some(other) => {
                        return Err(CommitError::SchemaMismatch(format!(
                            "field '{field_name}' expected bool, got {other:?}"
                        )))
                    }
                }
            }
            Ok(Arc::new(builder.finish()))
        }
        PrimitiveType::Binary => {
            let mut builder = BinaryBuilder::new();
            for record in records {
                match record.get(field_name) {
                    Some(RecordValue::Bytes(v)) => builder.append_value(v),
                    Some(RecordValue::Null) | None => builder.append_null(),
                    Some(other) => {
                        return Err(CommitError::SchemaMismatch(format!(
                            "field '{field_name}' expected bytes, got {other:?}"
                        )))
                    }
                }
            }
            Ok(Arc::new(builder.finish()))
        }
        other => panic!("unsupported delta primitive type reached the encoder: {other:?}"),
    }
}

/// Builds a single columnar Arrow batch from `records`, one column per
/// field of `schema`, in schema field order. Absent/null values get the
/// null bit set and a type-appropriate default payload (`append_null` on
/// the underlying Arrow builder writes both).
pub fn build_record_batch(schema: &StructType, records: &[Record]) -> Result<RecordBatch> {
    let mut arrow_fields = Vec::with_capacity(schema.fields().count());
    let mut columns = Vec::with_capacity(schema.fields().count());

    for field in schema.fields() {
        let primitive = match field.data_type() {
            DeltaDataType::Primitive(p) => p,
            other => {
                return Err(CommitError::SchemaMismatch(format!(
                    "field '{}' has unsupported non-primitive delta type {other:?}",
                    field.name()
                )))
            }
        };

        arrow_fields.push(ArrowField::new(field.name(), arrow_type_for(primitive), field.is_nullable()));
        columns.push(build_column(primitive, field.name(), records)?);
    }

    let arrow_schema = Arc::new(ArrowSchema::new(arrow_fields));
    Ok(RecordBatch::try_new(arrow_schema, columns)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use deltalake::kernel::StructField;
    use std::collections::HashMap;

    fn schema() -> StructType {
        StructType::new(vec![
            StructField::new("id", DeltaDataType::Primitive(PrimitiveType::String), false),
            StructField::new("age", DeltaDataType::Primitive(PrimitiveType::Integer), true),
        ])
    }

    #[test]
    fn encodes_present_and_null_values() {
        let mut present = HashMap::new();
        present.insert("id".to_string(), RecordValue::String("u1".to_string()));
        present.insert("age".to_string(), RecordValue::Int32(30));

        let mut missing_age = HashMap::new();
        missing_age.insert("id".to_string(), RecordValue::String("u2".to_string()));
        missing_age.insert("age".to_string(), RecordValue::Null);

        let records = vec![Record::new(present), Record::new(missing_age)];
        let batch = build_record_batch(&schema(), &records).unwrap();

        assert_eq!(batch.num_rows(), 2);
        assert_eq!(batch.num_columns(), 2);
        assert_eq!(batch.column(1).null_count(), 1);
    }

    #[test]
    fn type_mismatch_is_rejected() {
        let mut wrong_type = HashMap::new();
        wrong_type.insert("id".to_string(), RecordValue::Int32(1));
        wrong_type.insert("age".to_string(), RecordValue::Int32(1));

        let records = vec![Record::new(wrong_type)];
        let err = build_record_batch(&schema(), &records).unwrap_err();
        assert!(matches!(err, CommitError::SchemaMismatch(_)));
    }
}
