//! Conversion between entity-side [Value]s and store-side [StoreValue]s.
//!
//! The direction is always driven by the variant tag of the value being
//! converted. Geo-points and references pass through to the store as native
//! values. On the way back timestamps become date-times, geo-points and
//! references become plain documents.

use crate::common::{Document, Timestamp, Value};
use crate::errors::{DocMapError, DocMapResult, ErrorKind};
use crate::metadata::{MetadataStorageConfig, SubCollectionDescriptor};
use crate::store::{StoreFields, StoreValue};

/// Converts an entity's document form into the fields written to the store.
///
/// The identifier field and every sub-collection property are left out:
/// the id lives in the document path and sub-collections live in their own
/// collections.
pub fn serialize_for_storage(
    value: &Value,
    id_field: &str,
    sub_collections: &[SubCollectionDescriptor],
    config: &MetadataStorageConfig,
) -> DocMapResult<StoreFields> {
    let document = match value {
        Value::Document(doc) => doc,
        other => {
            log::error!("Cannot store a {} as a document", other.type_name());
            return Err(DocMapError::new(
                &format!("Cannot store a {} as a document", other.type_name()),
                ErrorKind::ObjectMappingError,
            ));
        }
    };

    let fields = document
        .iter()
        .filter(|(key, _)| key.as_str() != id_field)
        .filter(|(key, _)| !sub_collections.iter().any(|s| &s.property_key == *key))
        .map(|(key, value)| (key.clone(), to_store_value(value, config)))
        .collect();
    Ok(fields)
}

/// Converts stored fields back into a document. Null fields are dropped.
pub fn deserialize_from_storage(
    fields: &StoreFields,
    config: &MetadataStorageConfig,
) -> DocMapResult<Document> {
    let mut document = Document::new();
    for (key, value) in fields {
        if matches!(value, StoreValue::Null) {
            continue;
        }
        document.put_literal(key, from_store_value(value, config)?);
    }
    Ok(document)
}

/// Encodes one entity-side value. Also used for query filter values.
pub fn to_store_value(value: &Value, config: &MetadataStorageConfig) -> StoreValue {
    match value {
        Value::Null => StoreValue::Null,
        Value::Bool(b) => StoreValue::Boolean(*b),
        Value::I64(i) => StoreValue::Integer(*i),
        Value::F64(f) => StoreValue::Double(*f),
        Value::String(s) => StoreValue::String(s.clone()),
        Value::Bytes(b) => StoreValue::Bytes(b.clone()),
        Value::DateTime(dt) => StoreValue::Timestamp(timestamp(
            Timestamp::from_date_time(dt),
            config,
        )),
        Value::GeoPoint(point) => StoreValue::GeoPoint(*point),
        Value::Reference(reference) => StoreValue::Reference(reference.clone()),
        Value::Array(items) => {
            StoreValue::Array(items.iter().map(|v| to_store_value(v, config)).collect())
        }
        Value::Document(doc) => StoreValue::Map(
            doc.iter()
                .map(|(k, v)| (k.clone(), to_store_value(v, config)))
                .collect(),
        ),
    }
}

/// Decodes one store-side value.
pub fn from_store_value(value: &StoreValue, config: &MetadataStorageConfig) -> DocMapResult<Value> {
    let value = match value {
        StoreValue::Null => Value::Null,
        StoreValue::Boolean(b) => Value::Bool(*b),
        StoreValue::Integer(i) => Value::I64(*i),
        StoreValue::Double(d) => Value::F64(*d),
        StoreValue::String(s) => Value::String(s.clone()),
        StoreValue::Bytes(b) => Value::Bytes(b.clone()),
        StoreValue::Timestamp(ts) => Value::DateTime(timestamp(*ts, config).to_date_time()?),
        StoreValue::GeoPoint(point) => Value::Document(point.to_document()),
        StoreValue::Reference(reference) => Value::Document(reference.to_document()),
        StoreValue::Array(items) => Value::Array(
            items
                .iter()
                .map(|v| from_store_value(v, config))
                .collect::<DocMapResult<Vec<Value>>>()?,
        ),
        StoreValue::Map(fields) => Value::Document(deserialize_from_storage(fields, config)?),
    };
    Ok(value)
}

fn timestamp(ts: Timestamp, config: &MetadataStorageConfig) -> Timestamp {
    if config.are_timestamps_in_milliseconds {
        ts.truncate_to_millis()
    } else {
        ts
    }
}
