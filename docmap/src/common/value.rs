use crate::common::{Document, DocumentReference, GeoPoint};
use chrono::{DateTime, Utc};
use std::fmt::{Display, Formatter};

/// Represents an entity-side value. It can be a simple value like [Value::I64],
/// [Value::String] or a composite value like [Value::Document] or [Value::Array].
///
/// This is the in-memory representation entities are converted to and from
/// through [`crate::common::Convertible`]. Geo-points and references written by
/// an entity stay native all the way to the store; when read back the
/// transcoder hands them over as plain documents.
///
/// # Variants
/// - Null: Absence of a value
/// - Bool, I64, F64, String: Scalars
/// - Bytes: Binary data
/// - DateTime: UTC date-time
/// - GeoPoint, Reference: Store-native values on their way to the store
/// - Array: Ordered list of values
/// - Document: Nested key/value structure
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Value {
    /// Represents a null value.
    #[default]
    Null,
    /// Represents a boolean value.
    Bool(bool),
    /// Represents a signed 64-bit integer value.
    I64(i64),
    /// Represents a 64-bit floating point value.
    F64(f64),
    /// Represents a string value.
    String(String),
    /// Represents a byte array value.
    Bytes(Vec<u8>),
    /// Represents a UTC date-time value.
    DateTime(DateTime<Utc>),
    /// Represents a geographic point.
    GeoPoint(GeoPoint),
    /// Represents a reference to another document.
    Reference(DocumentReference),
    /// Represents an array value.
    Array(Vec<Value>),
    /// Represents a document value.
    Document(Document),
}

impl Value {
    pub fn from<T: Into<Value>>(value: T) -> Value {
        value.into()
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::I64(i) => Some(*i),
            _ => None,
        }
    }

    /// Returns the value as `f64`, widening integers.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::F64(f) => Some(*f),
            Value::I64(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_date_time(&self) -> Option<&DateTime<Utc>> {
        match self {
            Value::DateTime(dt) => Some(dt),
            _ => None,
        }
    }

    /// Returns the point whether it is held natively or as a
    /// `{latitude, longitude}` document.
    pub fn as_geo_point(&self) -> Option<GeoPoint> {
        match self {
            Value::GeoPoint(point) => Some(*point),
            Value::Document(doc) => GeoPoint::from_document(doc),
            _ => None,
        }
    }

    /// Returns the reference whether it is held natively or as an `{id, path}`
    /// document.
    pub fn as_reference(&self) -> Option<DocumentReference> {
        match self {
            Value::Reference(reference) => Some(reference.clone()),
            Value::Document(doc) => DocumentReference::from_document(doc),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Vec<Value>> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_document(&self) -> Option<&Document> {
        match self {
            Value::Document(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_document_mut(&mut self) -> Option<&mut Document> {
        match self {
            Value::Document(d) => Some(d),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_document(&self) -> bool {
        matches!(self, Value::Document(_))
    }

    pub fn is_array(&self) -> bool {
        matches!(self, Value::Array(_))
    }

    /// Short type name used in mapping error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::I64(_) => "integer",
            Value::F64(_) => "double",
            Value::String(_) => "string",
            Value::Bytes(_) => "bytes",
            Value::DateTime(_) => "datetime",
            Value::GeoPoint(_) => "geopoint",
            Value::Reference(_) => "reference",
            Value::Array(_) => "array",
            Value::Document(_) => "document",
        }
    }

    /// Takes the value out, leaving [Value::Null] in its place.
    pub fn take(&mut self) -> Value {
        std::mem::take(self)
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::I64(i) => write!(f, "{}", i),
            Value::F64(v) => write!(f, "{}", v),
            Value::String(s) => write!(f, "\"{}\"", s),
            Value::Bytes(b) => write!(f, "<{} bytes>", b.len()),
            Value::DateTime(dt) => write!(f, "{}", dt.to_rfc3339()),
            Value::GeoPoint(point) => write!(f, "({}, {})", point.latitude(), point.longitude()),
            Value::Reference(reference) => write!(f, "ref({})", reference.path()),
            Value::Array(items) => {
                write!(f, "[")?;
                for (index, item) in items.iter().enumerate() {
                    if index > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Value::Document(doc) => write!(f, "{}", doc),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

macro_rules! value_from_integer {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(value: $t) -> Self {
                    Value::I64(value as i64)
                }
            }
        )*
    };
}

value_from_integer!(i8, i16, i32, i64, u8, u16, u32);

impl From<f32> for Value {
    fn from(value: f32) -> Self {
        Value::F64(value as f64)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::F64(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<&String> for Value {
    fn from(value: &String) -> Self {
        Value::String(value.clone())
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(value: DateTime<Utc>) -> Self {
        Value::DateTime(value)
    }
}

impl From<Document> for Value {
    fn from(value: Document) -> Self {
        Value::Document(value)
    }
}

impl From<GeoPoint> for Value {
    fn from(value: GeoPoint) -> Self {
        Value::GeoPoint(value)
    }
}

impl From<DocumentReference> for Value {
    fn from(value: DocumentReference) -> Self {
        Value::Reference(value)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(value: Vec<T>) -> Self {
        Value::Array(value.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => v.into(),
            None => Value::Null,
        }
    }
}
