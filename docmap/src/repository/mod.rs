//! Typed repositories over collection paths.
//!
//! A [Repository] is the facade application code uses; behind it sits one
//! of two strategies, direct store access or access through a transaction.
//! Both share the same mapping logic for serialization, hydration,
//! sub-collection wiring and validation.

mod default_repository;
mod entity;
#[allow(clippy::module_inception)]
mod repository;
mod repository_factory;
mod repository_operations;
mod transaction_repository;
mod validation;

pub use entity::*;
pub use repository::*;
pub use repository_factory::*;
pub use validation::*;
