use std::fmt::{Display, Formatter};

use itertools::Itertools;

use crate::common::FIELD_SEPARATOR;

/// A dotted property path (`address.city`) naming a possibly nested field.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldPath(String);

impl FieldPath {
    pub fn new(path: &str) -> Self {
        FieldPath(path.to_string())
    }

    pub fn from_segments(segments: &[&str]) -> Self {
        FieldPath(segments.iter().join(FIELD_SEPARATOR))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split(FIELD_SEPARATOR)
    }

    pub fn is_nested(&self) -> bool {
        self.0.contains(FIELD_SEPARATOR)
    }
}

impl Display for FieldPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for FieldPath {
    fn from(path: &str) -> Self {
        FieldPath::new(path)
    }
}

impl From<String> for FieldPath {
    fn from(path: String) -> Self {
        FieldPath(path)
    }
}

impl From<&String> for FieldPath {
    fn from(path: &String) -> Self {
        FieldPath(path.clone())
    }
}

/// Builds a [FieldPath] from a field accessor chain, checked at compile
/// time against the entity type.
///
/// ```rust,ignore
/// let path = field!(User, address.city);
/// assert_eq!(path.as_str(), "address.city");
/// ```
///
/// Every segment must be a plain field access; fields behind an `Option`
/// or a collection have to be named with a string path instead.
#[macro_export]
macro_rules! field {
    ($entity:ty, $($segment:ident).+) => {{
        #[allow(dead_code, unused_variables)]
        fn __field_accessor(entity: &$entity) {
            let _ = &entity.$($segment).+;
        }
        $crate::query::FieldPath::from_segments(&[$(stringify!($segment)),+])
    }};
}
