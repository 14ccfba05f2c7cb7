use std::fmt::{Display, Formatter};

use crate::common::Document;

/// One rule an entity failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationViolation {
    /// Dotted path of the offending field.
    pub field: String,
    /// Name of the rule, e.g. `not_empty` or `min`.
    pub constraint: String,
    pub message: String,
}

impl ValidationViolation {
    pub fn new(field: &str, constraint: &str, message: &str) -> Self {
        ValidationViolation {
            field: field.to_string(),
            constraint: constraint.to_string(),
            message: message.to_string(),
        }
    }
}

impl Display for ValidationViolation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {} ({})", self.field, self.message, self.constraint)
    }
}

/// Checks an entity before it is written.
///
/// The entity arrives in its document form, identified by its entity name.
/// An empty result means the entity is valid. Any
/// `Fn(&str, &Document) -> Vec<ValidationViolation>` closure is a validator.
pub trait Validator: Send + Sync {
    fn validate(&self, entity_name: &str, document: &Document) -> Vec<ValidationViolation>;
}

impl<F> Validator for F
where
    F: Fn(&str, &Document) -> Vec<ValidationViolation> + Send + Sync,
{
    fn validate(&self, entity_name: &str, document: &Document) -> Vec<ValidationViolation> {
        self(entity_name, document)
    }
}
