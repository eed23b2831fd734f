//! Declarative query definitions.
//!
//! A [`QueryDefinition`] describes one analytic stream: grouping fields,
//! aggregate expressions, an optional row filter, an optional sort, and the
//! output mode its results are emitted under. Definitions are built once at
//! startup and never mutated.

use std::fmt;

use super::types::{FieldValue, Record};
use crate::orderstream::schema::Field;

/// How a query's results reach the sink each trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Only rows derived from newly arrived records; never re-emitted
    Append,
    /// Only grouping keys whose state changed this trigger
    Update,
    /// The full current state, every trigger
    Complete,
}

impl fmt::Display for OutputMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputMode::Append => write!(f, "Append"),
            OutputMode::Update => write!(f, "Update"),
            OutputMode::Complete => write!(f, "Complete"),
        }
    }
}

/// Aggregate functions available to query definitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateFunction {
    Sum,
    Count,
    Avg,
}

/// One aggregate output column: function, input field, output alias.
#[derive(Debug, Clone)]
pub struct AggregateExpr {
    pub function: AggregateFunction,
    /// Input field; `None` for a bare row count
    pub field: Option<Field>,
    pub alias: &'static str,
}

impl AggregateExpr {
    pub fn sum(field: Field, alias: &'static str) -> Self {
        Self {
            function: AggregateFunction::Sum,
            field: Some(field),
            alias,
        }
    }

    pub fn count(alias: &'static str) -> Self {
        Self {
            function: AggregateFunction::Count,
            field: None,
            alias,
        }
    }

    pub fn avg(field: Field, alias: &'static str) -> Self {
        Self {
            function: AggregateFunction::Avg,
            field: Some(field),
            alias,
        }
    }
}

/// Comparison operators for row filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    GreaterThan,
    LessThan,
    Equals,
}

/// Row filter compared against one numeric field.
#[derive(Debug, Clone)]
pub struct FilterPredicate {
    pub field: Field,
    pub op: CompareOp,
    pub value: f64,
}

impl FilterPredicate {
    pub fn greater_than(field: Field, value: f64) -> Self {
        Self {
            field,
            op: CompareOp::GreaterThan,
            value,
        }
    }

    /// Evaluate against a record. NULL or missing fields never match.
    pub fn matches(&self, record: &Record) -> bool {
        let actual = match record.get(self.field).and_then(FieldValue::as_f64) {
            Some(v) => v,
            None => return false,
        };
        match self.op {
            CompareOp::GreaterThan => actual > self.value,
            CompareOp::LessThan => actual < self.value,
            CompareOp::Equals => actual == self.value,
        }
    }
}

/// Descending/ascending sort on one output column.
#[derive(Debug, Clone)]
pub struct SortSpec {
    pub by_alias: &'static str,
    pub descending: bool,
}

impl SortSpec {
    pub fn descending(by_alias: &'static str) -> Self {
        Self {
            by_alias,
            descending: true,
        }
    }
}

/// Immutable description of one analytic stream.
#[derive(Debug, Clone)]
pub struct QueryDefinition {
    pub name: &'static str,
    /// Grouping fields; empty for ungrouped aggregates and passthroughs
    pub group_by: Vec<Field>,
    pub aggregates: Vec<AggregateExpr>,
    pub filter: Option<FilterPredicate>,
    /// Column projection for passthrough (non-aggregating) queries
    pub projection: Option<Vec<Field>>,
    pub sort: Option<SortSpec>,
    pub output_mode: OutputMode,
}

impl QueryDefinition {
    /// Passthrough queries carry records straight to the sink without state.
    pub fn is_passthrough(&self) -> bool {
        self.aggregates.is_empty()
    }

    /// Whether a record participates in this query.
    pub fn accepts(&self, record: &Record) -> bool {
        match &self.filter {
            Some(predicate) => predicate.matches(record),
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record_with_total(total: f64) -> Record {
        let mut r = Record::new();
        r.insert(Field::Total, FieldValue::Float(total));
        r
    }

    #[test]
    fn test_filter_greater_than() {
        let filter = FilterPredicate::greater_than(Field::Total, 100.0);
        assert!(filter.matches(&record_with_total(150.0)));
        assert!(!filter.matches(&record_with_total(100.0)));
        assert!(!filter.matches(&record_with_total(25.0)));
    }

    #[test]
    fn test_filter_rejects_null_field() {
        let filter = FilterPredicate::greater_than(Field::Total, 100.0);
        let mut r = Record::new();
        r.insert(Field::Total, FieldValue::Null);
        assert!(!filter.matches(&r));
        assert!(!filter.matches(&Record::new()));
    }
}
