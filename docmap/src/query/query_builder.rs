use std::fmt::{Debug, Formatter};
use std::marker::PhantomData;

use async_trait::async_trait;

use crate::common::Value;
use crate::errors::{DocMapError, DocMapResult, ErrorKind};
use crate::query::{Direction, FieldPath, QueryLine, QueryOperator, QuerySpec};

/// Runs a [QuerySpec] against a collection and materializes the results.
///
/// When `single` is true the executor must ask the store for at most one
/// document.
#[async_trait]
pub trait QueryExecutor<T>: Send + Sync {
    async fn execute(&self, spec: &QuerySpec, single: bool) -> DocMapResult<Vec<T>>;
}

/// An immutable, chainable query.
///
/// Every method takes `&self` and returns a new builder, so a partially
/// built query can be reused as the base of several others:
///
/// ```rust,ignore
/// let adults = users.where_greater_or_equal_than("age", 18);
/// let oldest = adults.order_by_descending("age").limit(1)?.find_one().await?;
/// let named_ann = adults.where_equal_to("name", "Ann").find().await?;
/// ```
pub struct QueryBuilder<T, E> {
    executor: E,
    spec: QuerySpec,
    _entity: PhantomData<fn() -> T>,
}

impl<T, E: Clone> Clone for QueryBuilder<T, E> {
    fn clone(&self) -> Self {
        QueryBuilder {
            executor: self.executor.clone(),
            spec: self.spec.clone(),
            _entity: PhantomData,
        }
    }
}

impl<T, E> Debug for QueryBuilder<T, E> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryBuilder")
            .field("spec", &self.spec)
            .finish()
    }
}

impl<T, E> QueryBuilder<T, E>
where
    T: Send + 'static,
    E: QueryExecutor<T> + Clone,
{
    pub fn new(executor: E) -> Self {
        QueryBuilder::with_spec(executor, QuerySpec::new())
    }

    pub fn with_spec(executor: E, spec: QuerySpec) -> Self {
        QueryBuilder {
            executor,
            spec,
            _entity: PhantomData,
        }
    }

    /// The accumulated clauses.
    pub fn spec(&self) -> &QuerySpec {
        &self.spec
    }

    pub fn where_equal_to(&self, field: impl Into<FieldPath>, value: impl Into<Value>) -> Self {
        self.filter(field.into(), QueryOperator::Equal, value.into())
    }

    pub fn where_greater_than(&self, field: impl Into<FieldPath>, value: impl Into<Value>) -> Self {
        self.filter(field.into(), QueryOperator::GreaterThan, value.into())
    }

    pub fn where_greater_or_equal_than(
        &self,
        field: impl Into<FieldPath>,
        value: impl Into<Value>,
    ) -> Self {
        self.filter(field.into(), QueryOperator::GreaterOrEqual, value.into())
    }

    pub fn where_less_than(&self, field: impl Into<FieldPath>, value: impl Into<Value>) -> Self {
        self.filter(field.into(), QueryOperator::LessThan, value.into())
    }

    pub fn where_less_or_equal_than(
        &self,
        field: impl Into<FieldPath>,
        value: impl Into<Value>,
    ) -> Self {
        self.filter(field.into(), QueryOperator::LessOrEqual, value.into())
    }

    pub fn where_array_contains(&self, field: impl Into<FieldPath>, value: impl Into<Value>) -> Self {
        self.filter(field.into(), QueryOperator::ArrayContains, value.into())
    }

    /// Caps the number of results. A later call replaces an earlier one.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` when `limit` is negative.
    pub fn limit(&self, limit: i64) -> DocMapResult<Self> {
        let limit = validate_limit(limit)?;
        Ok(self.derive(self.spec.with_limit(limit)))
    }

    pub fn order_by_ascending(&self, field: impl Into<FieldPath>) -> Self {
        self.derive(self.spec.with_order(field.into(), Direction::Ascending))
    }

    pub fn order_by_descending(&self, field: impl Into<FieldPath>) -> Self {
        self.derive(self.spec.with_order(field.into(), Direction::Descending))
    }

    /// Runs the query and returns every matching entity.
    pub async fn find(&self) -> DocMapResult<Vec<T>> {
        self.executor.execute(&self.spec, false).await
    }

    /// Runs the query for at most one entity.
    pub async fn find_one(&self) -> DocMapResult<Option<T>> {
        let results = self.executor.execute(&self.spec, true).await?;
        Ok(results.into_iter().next())
    }

    fn filter(&self, field: FieldPath, operator: QueryOperator, value: Value) -> Self {
        self.derive(self.spec.with_line(QueryLine::new(field, operator, value)))
    }

    fn derive(&self, spec: QuerySpec) -> Self {
        QueryBuilder::with_spec(self.executor.clone(), spec)
    }
}

pub(crate) fn validate_limit(limit: i64) -> DocMapResult<usize> {
    if limit < 0 {
        log::error!("Query limit must not be negative, got {}", limit);
        return Err(DocMapError::new(
            &format!("Query limit must not be negative, got {}", limit),
            ErrorKind::InvalidArgument,
        ));
    }
    usize::try_from(limit).map_err(|_| {
        log::error!("Query limit {} is too large", limit);
        DocMapError::new(
            &format!("Query limit {} is too large", limit),
            ErrorKind::InvalidArgument,
        )
    })
}
