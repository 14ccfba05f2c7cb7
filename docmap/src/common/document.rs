use im::OrdMap;

use crate::common::{Value, FIELD_SEPARATOR};
use crate::errors::{DocMapError, DocMapResult, ErrorKind};
use std::collections::BTreeMap;
use std::fmt::{Debug, Display, Formatter};

/// An ordered key/value structure holding the field data of an entity.
///
/// Keys are always [String]s and values are [Value]s. Nested documents are
/// addressed with dotted keys: for `{"address": {"city": "Oslo"}}`,
/// `document.get("address.city")` returns `"Oslo"`.
///
/// The map is an `im::OrdMap`, so cloning a document is O(1) and hydration
/// can hand copies around without deep copies.
#[derive(Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Document {
    data: OrdMap<String, Value>,
}

impl Document {
    /// Creates a new empty document.
    pub fn new() -> Self {
        Document {
            data: OrdMap::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Associates `value` with `key`, creating intermediate documents for
    /// dotted keys.
    ///
    /// # Errors
    ///
    /// Fails when the key is empty, or when an intermediate segment of a
    /// dotted key already holds a non-document value.
    pub fn put<K: AsRef<str>, T: Into<Value>>(&mut self, key: K, value: T) -> DocMapResult<()> {
        let key = key.as_ref();
        if key.is_empty() {
            log::error!("Document does not support empty key");
            return Err(DocMapError::new(
                "Document does not support empty key",
                ErrorKind::InvalidArgument,
            ));
        }

        let value = value.into();
        if key.contains(FIELD_SEPARATOR) {
            let splits: Vec<&str> = key.split(FIELD_SEPARATOR).collect();
            self.deep_put(&splits, value)
        } else {
            self.data.insert(key.to_string(), value);
            Ok(())
        }
    }

    /// Inserts a top-level key as-is, without splitting on dots.
    pub fn put_literal(&mut self, key: &str, value: Value) {
        self.data.insert(key.to_string(), value);
    }

    /// Returns the value for `key`, or [Value::Null] when absent.
    ///
    /// Dotted keys walk nested documents; a numeric segment indexes into an
    /// array (`tags.0`).
    pub fn get(&self, key: &str) -> Value {
        match self.data.get(key) {
            Some(value) => value.clone(),
            None if key.contains(FIELD_SEPARATOR) => self.deep_get(key).unwrap_or_default(),
            None => Value::Null,
        }
    }

    /// Returns a reference to a top-level value.
    pub fn get_ref(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    /// Removes a top-level key, returning its value.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.data.remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    /// Returns true if the (possibly dotted) field resolves to a value.
    pub fn contains_field(&self, field: &str) -> bool {
        if self.contains_key(field) {
            return true;
        }
        field.contains(FIELD_SEPARATOR) && self.deep_get(field).is_some()
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.data.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.data.iter()
    }

    pub fn to_map(&self) -> BTreeMap<String, Value> {
        self.data
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    fn deep_get(&self, key: &str) -> Option<Value> {
        let mut segments = key.split(FIELD_SEPARATOR);
        let first = segments.next()?;
        let mut current = self.data.get(first)?;
        for segment in segments {
            current = match current {
                Value::Document(doc) => doc.data.get(segment)?,
                Value::Array(items) => {
                    let index = segment.parse::<usize>().ok()?;
                    items.get(index)?
                }
                _ => return None,
            };
        }
        Some(current.clone())
    }

    fn deep_put(&mut self, splits: &[&str], value: Value) -> DocMapResult<()> {
        let (head, rest) = match splits.split_first() {
            Some(parts) => parts,
            None => return Ok(()),
        };

        if head.is_empty() {
            log::error!("Document does not support empty path segment");
            return Err(DocMapError::new(
                "Document does not support empty path segment",
                ErrorKind::InvalidArgument,
            ));
        }

        if rest.is_empty() {
            self.data.insert(head.to_string(), value);
            return Ok(());
        }

        let mut nested = match self.data.get(*head) {
            None | Some(Value::Null) => Document::new(),
            Some(Value::Document(doc)) => doc.clone(),
            Some(other) => {
                log::error!("Cannot put into '{}' because it holds a {}", head, other.type_name());
                return Err(DocMapError::new(
                    &format!("Cannot put into '{}' because it holds a {}", head, other.type_name()),
                    ErrorKind::InvalidArgument,
                ));
            }
        };
        nested.deep_put(rest, value)?;
        self.data.insert(head.to_string(), Value::Document(nested));
        Ok(())
    }
}

impl Debug for Document {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_map().entries(self.data.iter()).finish()
    }
}

impl Display for Document {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{{")?;
        for (index, (key, value)) in self.data.iter().enumerate() {
            if index > 0 {
                write!(f, ", ")?;
            }
            write!(f, "\"{}\": {}", key, value)?;
        }
        write!(f, "}}")
    }
}

impl FromIterator<(String, Value)> for Document {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Document {
            data: iter.into_iter().collect(),
        }
    }
}

pub fn normalize(value: &str) -> String {
    value.trim_matches('"').to_string()
}

/// Creates a Document with JSON-like syntax.
///
/// # Examples
///
/// ```rust
/// use docmap::doc;
///
/// let empty = doc!{};
///
/// let user = doc!{
///     name: "Ann",
///     address: {
///         city: "Oslo"
///     },
///     tags: ["a", "b"]
/// };
/// assert_eq!(user.get("address.city").as_str(), Some("Oslo"));
/// ```
#[macro_export]
macro_rules! doc {
    () => {
        $crate::common::Document::new()
    };

    ($($key:tt : $value:tt),* $(,)?) => {
        {
            #[allow(unused_imports)]
            use $crate::doc_value;

            let mut doc = $crate::common::Document::new();
            $(
                doc.put(&$crate::common::normalize(stringify!($key)), $crate::doc_value!($value))
                    .expect(&format!("Failed to put value {} in document", stringify!($value)));
            )*
            doc
        }
    };
}

/// Helper macro to convert values for the doc! macro.
#[macro_export]
macro_rules! doc_value {
    ({ $($key:tt : $value:tt),* $(,)? }) => {
        $crate::common::Value::Document($crate::doc!{ $($key : $value),* })
    };

    ([ $($value:tt),* $(,)? ]) => {
        $crate::common::Value::Array(vec![$($crate::doc_value!($value)),*])
    };

    ($value:expr) => {
        $crate::common::Value::from($value)
    };
}
