use crate::common::{Document, Value};
use crate::errors::{DocMapError, DocMapResult, ErrorKind};
use chrono::{DateTime, Utc};
use std::any::{Any, TypeId};
use std::collections::{BTreeMap, HashMap};

/// Two-way conversion between a Rust type and its entity-side [Value].
///
/// Every entity field type implements this trait. Struct and enum
/// implementations are usually generated with `#[derive(Convertible)]`.
pub trait Convertible {
    type Output;

    fn to_value(&self) -> DocMapResult<Value>;
    fn from_value(value: &Value) -> DocMapResult<Self::Output>;
}

/// Converts any convertible into a [Value].
pub fn to_value<T: Convertible + ?Sized>(value: &T) -> DocMapResult<Value> {
    value.to_value()
}

/// Rebuilds a typed value from a [Value].
pub fn from_value<T: Convertible>(value: &Value) -> DocMapResult<T::Output> {
    T::from_value(value)
}

fn mapping_error(value: &Value, expected: &str) -> DocMapError {
    log::error!("Value {} of type {} is not {}", value, value.type_name(), expected);
    DocMapError::new(
        &format!("Value of type {} is not {}", value.type_name(), expected),
        ErrorKind::ObjectMappingError,
    )
}

impl Convertible for bool {
    type Output = bool;

    fn to_value(&self) -> DocMapResult<Value> {
        Ok(Value::Bool(*self))
    }

    fn from_value(value: &Value) -> DocMapResult<Self> {
        value.as_bool().ok_or_else(|| mapping_error(value, "a bool"))
    }
}

macro_rules! convertible_integer {
    ($($t:ty),*) => {
        $(
            impl Convertible for $t {
                type Output = $t;

                fn to_value(&self) -> DocMapResult<Value> {
                    match i64::try_from(*self) {
                        Ok(i) => Ok(Value::I64(i)),
                        Err(_) => {
                            log::error!("Value {} does not fit in a stored integer", self);
                            Err(DocMapError::new(
                                &format!("Value {} does not fit in a stored integer", self),
                                ErrorKind::ObjectMappingError,
                            ))
                        }
                    }
                }

                fn from_value(value: &Value) -> DocMapResult<Self> {
                    match value {
                        Value::I64(i) => <$t>::try_from(*i).map_err(|_| {
                            log::error!("Value {} is out of range for {}", i, stringify!($t));
                            DocMapError::new(
                                &format!("Value {} is out of range for {}", i, stringify!($t)),
                                ErrorKind::ObjectMappingError,
                            )
                        }),
                        _ => Err(mapping_error(value, concat!("a ", stringify!($t)))),
                    }
                }
            }
        )*
    };
}

convertible_integer!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

impl Convertible for f32 {
    type Output = f32;

    fn to_value(&self) -> DocMapResult<Value> {
        Ok(Value::F64(*self as f64))
    }

    fn from_value(value: &Value) -> DocMapResult<Self> {
        value
            .as_f64()
            .map(|f| f as f32)
            .ok_or_else(|| mapping_error(value, "an f32"))
    }
}

impl Convertible for f64 {
    type Output = f64;

    fn to_value(&self) -> DocMapResult<Value> {
        Ok(Value::F64(*self))
    }

    /// Accepts integers too; the store does not keep `1.0` and `1` apart.
    fn from_value(value: &Value) -> DocMapResult<Self> {
        value.as_f64().ok_or_else(|| mapping_error(value, "an f64"))
    }
}

impl Convertible for String {
    type Output = String;

    fn to_value(&self) -> DocMapResult<Value> {
        Ok(Value::String(self.clone()))
    }

    fn from_value(value: &Value) -> DocMapResult<Self> {
        value
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| mapping_error(value, "a string"))
    }
}

impl Convertible for DateTime<Utc> {
    type Output = DateTime<Utc>;

    fn to_value(&self) -> DocMapResult<Value> {
        Ok(Value::DateTime(*self))
    }

    fn from_value(value: &Value) -> DocMapResult<Self> {
        value
            .as_date_time()
            .copied()
            .ok_or_else(|| mapping_error(value, "a date-time"))
    }
}

impl Convertible for Document {
    type Output = Document;

    fn to_value(&self) -> DocMapResult<Value> {
        Ok(Value::Document(self.clone()))
    }

    fn from_value(value: &Value) -> DocMapResult<Self> {
        value
            .as_document()
            .cloned()
            .ok_or_else(|| mapping_error(value, "a document"))
    }
}

impl Convertible for Value {
    type Output = Value;

    fn to_value(&self) -> DocMapResult<Value> {
        Ok(self.clone())
    }

    fn from_value(value: &Value) -> DocMapResult<Self> {
        Ok(value.clone())
    }
}

impl Convertible for () {
    type Output = ();

    fn to_value(&self) -> DocMapResult<Value> {
        Ok(Value::Null)
    }

    fn from_value(_value: &Value) -> DocMapResult<Self> {
        Ok(())
    }
}

impl<T> Convertible for Option<T>
where
    T: Convertible,
{
    type Output = Option<T::Output>;

    fn to_value(&self) -> DocMapResult<Value> {
        match self {
            Some(v) => v.to_value(),
            None => Ok(Value::Null),
        }
    }

    fn from_value(value: &Value) -> DocMapResult<Self::Output> {
        match value {
            Value::Null => Ok(None),
            _ => Ok(Some(T::from_value(value)?)),
        }
    }
}

impl<T> Convertible for Box<T>
where
    T: Convertible,
{
    type Output = Box<T::Output>;

    fn to_value(&self) -> DocMapResult<Value> {
        self.as_ref().to_value()
    }

    fn from_value(value: &Value) -> DocMapResult<Self::Output> {
        Ok(Box::new(T::from_value(value)?))
    }
}

impl<T> Convertible for Vec<T>
where
    T: Convertible + Any,
{
    type Output = Vec<T::Output>;

    /// `Vec<u8>` is stored as bytes, every other element type as an array.
    fn to_value(&self) -> DocMapResult<Value> {
        if TypeId::of::<T>() == TypeId::of::<u8>() {
            let mut bytes = Vec::with_capacity(self.len());
            for item in self {
                match item.to_value()? {
                    Value::I64(b) if (0..=255).contains(&b) => bytes.push(b as u8),
                    other => return Err(mapping_error(&other, "a byte")),
                }
            }
            return Ok(Value::Bytes(bytes));
        }

        let mut items = Vec::with_capacity(self.len());
        for item in self {
            items.push(item.to_value()?);
        }
        Ok(Value::Array(items))
    }

    fn from_value(value: &Value) -> DocMapResult<Self::Output> {
        match value {
            Value::Bytes(bytes) => bytes
                .iter()
                .map(|b| T::from_value(&Value::I64(*b as i64)))
                .collect(),
            Value::Array(items) => items.iter().map(T::from_value).collect(),
            Value::Null => Ok(Vec::new()),
            _ => Err(mapping_error(value, "an array")),
        }
    }
}

impl<V> Convertible for BTreeMap<String, V>
where
    V: Convertible,
{
    type Output = BTreeMap<String, V::Output>;

    fn to_value(&self) -> DocMapResult<Value> {
        let mut doc = Document::new();
        for (k, v) in self {
            put_map_entry(&mut doc, k, v.to_value()?)?;
        }
        Ok(Value::Document(doc))
    }

    fn from_value(value: &Value) -> DocMapResult<Self::Output> {
        if value.is_null() {
            return Ok(Default::default());
        }
        let doc = value
            .as_document()
            .ok_or_else(|| mapping_error(value, "a map"))?;
        doc.iter()
            .map(|(k, v)| Ok((k.clone(), V::from_value(v)?)))
            .collect()
    }
}

impl<V> Convertible for HashMap<String, V>
where
    V: Convertible,
{
    type Output = HashMap<String, V::Output>;

    fn to_value(&self) -> DocMapResult<Value> {
        let mut doc = Document::new();
        for (k, v) in self {
            put_map_entry(&mut doc, k, v.to_value()?)?;
        }
        Ok(Value::Document(doc))
    }

    fn from_value(value: &Value) -> DocMapResult<Self::Output> {
        if value.is_null() {
            return Ok(Default::default());
        }
        let doc = value
            .as_document()
            .ok_or_else(|| mapping_error(value, "a map"))?;
        doc.iter()
            .map(|(k, v)| Ok((k.clone(), V::from_value(v)?)))
            .collect()
    }
}

// map keys are literal, so a dotted key must not be split into a path
fn put_map_entry(doc: &mut Document, key: &str, value: Value) -> DocMapResult<()> {
    if key.is_empty() {
        log::error!("Map keys must not be empty");
        return Err(DocMapError::new(
            "Map keys must not be empty",
            ErrorKind::ObjectMappingError,
        ));
    }
    doc.put_literal(key, value);
    Ok(())
}
