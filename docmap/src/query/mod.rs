//! Immutable query composition.
//!
//! A [QueryBuilder] accumulates filters, at most one limit and ordered sort
//! clauses into a [QuerySpec]. Nothing touches the store until `find` or
//! `find_one` hands the spec to the bound [QueryExecutor].

mod field_path;
mod query_builder;
mod query_spec;

pub use field_path::*;
pub use query_builder::*;
pub use query_spec::*;
