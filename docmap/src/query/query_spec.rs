use std::fmt::{Display, Formatter};

use crate::common::Value;
use crate::query::FieldPath;

/// Comparison applied by a single filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryOperator {
    Equal,
    LessThan,
    LessOrEqual,
    GreaterThan,
    GreaterOrEqual,
    /// Matches when the field is an array holding the value.
    ArrayContains,
}

impl Display for QueryOperator {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let symbol = match self {
            QueryOperator::Equal => "==",
            QueryOperator::LessThan => "<",
            QueryOperator::LessOrEqual => "<=",
            QueryOperator::GreaterThan => ">",
            QueryOperator::GreaterOrEqual => ">=",
            QueryOperator::ArrayContains => "array-contains",
        };
        write!(f, "{}", symbol)
    }
}

/// One filter: `field operator value`.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryLine {
    pub field: FieldPath,
    pub operator: QueryOperator,
    pub value: Value,
}

impl QueryLine {
    pub fn new(field: FieldPath, operator: QueryOperator, value: Value) -> Self {
        QueryLine {
            field,
            operator,
            value,
        }
    }
}

impl Display for QueryLine {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} {}", self.field, self.operator, self.value)
    }
}

/// Sort direction of an [OrderByClause].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderByClause {
    pub field: FieldPath,
    pub direction: Direction,
}

/// The accumulated state of a query. Builders never mutate a spec they
/// have handed out; each chaining call produces a new one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuerySpec {
    pub lines: Vec<QueryLine>,
    pub limit: Option<usize>,
    pub order_by: Vec<OrderByClause>,
}

impl QuerySpec {
    pub fn new() -> Self {
        QuerySpec::default()
    }

    pub(crate) fn with_line(&self, line: QueryLine) -> Self {
        let mut spec = self.clone();
        spec.lines.push(line);
        spec
    }

    pub(crate) fn with_limit(&self, limit: usize) -> Self {
        let mut spec = self.clone();
        spec.limit = Some(limit);
        spec
    }

    pub(crate) fn with_order(&self, field: FieldPath, direction: Direction) -> Self {
        let mut spec = self.clone();
        spec.order_by.push(OrderByClause { field, direction });
        spec
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty() && self.limit.is_none() && self.order_by.is_empty()
    }
}

impl Display for QuerySpec {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "where [")?;
        for (index, line) in self.lines.iter().enumerate() {
            if index > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", line)?;
        }
        write!(f, "]")?;
        for order in &self.order_by {
            write!(f, " order by {} {:?}", order.field, order.direction)?;
        }
        if let Some(limit) = self.limit {
            write!(f, " limit {}", limit)?;
        }
        Ok(())
    }
}
