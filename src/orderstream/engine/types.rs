//! Core streaming data types.
//!
//! This module contains the fundamental types moved between the file source,
//! the aggregation engine, and the sinks:
//! - [`FieldValue`] - the value type system for record fields
//! - [`Record`] - one parsed order row
//! - [`Batch`] - the records ingested in one trigger
//! - [`ResultRow`] - a materialized output tuple handed to a sink

use chrono::{DateTime, Utc};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::orderstream::schema::Field;

/// A value in a record field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// 64-bit signed integer (Integer32 columns are widened on parse)
    Integer(i64),
    /// 64-bit floating point number
    Float(f64),
    /// UTF-8 string
    String(String),
    /// Missing value in a nullable column
    Null,
}

impl FieldValue {
    /// Numeric view of the value, used by aggregate updates and filters.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Integer(i) => Some(*i as f64),
            FieldValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Integer(i) => write!(f, "{}", i),
            FieldValue::Float(v) => write!(f, "{}", v),
            FieldValue::String(s) => write!(f, "{}", s),
            FieldValue::Null => write!(f, "NULL"),
        }
    }
}

impl Eq for FieldValue {}

/// Hash uses the f64 bit representation so float-valued grouping keys are
/// hashable (NaN, infinity and -0.0 included).
impl Hash for FieldValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            FieldValue::Integer(i) => i.hash(state),
            FieldValue::Float(f) => f.to_bits().hash(state),
            FieldValue::String(s) => s.hash(state),
            FieldValue::Null => {}
        }
    }
}

/// Total order over field values for deterministic tie-breaking: NULL first,
/// then numerics, then strings.
pub fn compare_field_values(a: &FieldValue, b: &FieldValue) -> Ordering {
    match (a, b) {
        (FieldValue::Null, FieldValue::Null) => Ordering::Equal,
        (FieldValue::Null, _) => Ordering::Less,
        (_, FieldValue::Null) => Ordering::Greater,
        (FieldValue::String(x), FieldValue::String(y)) => x.cmp(y),
        (FieldValue::String(_), _) => Ordering::Greater,
        (_, FieldValue::String(_)) => Ordering::Less,
        (x, y) => {
            let xf = x.as_f64().unwrap_or(f64::NAN);
            let yf = y.as_f64().unwrap_or(f64::NAN);
            xf.partial_cmp(&yf).unwrap_or(Ordering::Equal)
        }
    }
}

/// One parsed order row. Immutable once parsed; owned by its batch.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    fields: HashMap<Field, FieldValue>,
}

impl Record {
    pub fn new() -> Self {
        Self {
            fields: HashMap::new(),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            fields: HashMap::with_capacity(capacity),
        }
    }

    pub fn insert(&mut self, field: Field, value: FieldValue) {
        self.fields.insert(field, value);
    }

    pub fn get(&self, field: Field) -> Option<&FieldValue> {
        self.fields.get(&field)
    }

    /// Value for a field, with NULL standing in for absent columns.
    pub fn value_or_null(&self, field: Field) -> FieldValue {
        self.fields.get(&field).cloned().unwrap_or(FieldValue::Null)
    }
}

impl Default for Record {
    fn default() -> Self {
        Self::new()
    }
}

/// The set of new records ingested in one trigger.
///
/// Batch ids increase monotonically for the lifetime of a source. Batches are
/// consumed by the aggregation engine and discarded; only accumulator state
/// survives the trigger.
#[derive(Debug, Clone)]
pub struct Batch {
    pub id: u64,
    pub records: Vec<Record>,
    /// Rows dropped by the parser while building this batch
    pub parse_errors: u64,
    pub ingested_at: DateTime<Utc>,
    /// Source files this batch was read from, in ingestion order
    pub source_files: Vec<String>,
}

impl Batch {
    pub fn new(id: u64) -> Self {
        Self {
            id,
            records: Vec::new(),
            parse_errors: 0,
            ingested_at: Utc::now(),
            source_files: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }
}

/// Tuple of column values defining an aggregate bucket. Ungrouped queries use
/// the empty tuple.
pub type GroupKey = Vec<FieldValue>;

/// A materialized output tuple for one grouping key. Transient: built at
/// emission time and not retained after the sink write.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultRow {
    columns: Vec<(&'static str, FieldValue)>,
}

impl ResultRow {
    pub fn new() -> Self {
        Self {
            columns: Vec::new(),
        }
    }

    pub fn push(&mut self, name: &'static str, value: FieldValue) {
        self.columns.push((name, value));
    }

    pub fn columns(&self) -> &[(&'static str, FieldValue)] {
        &self.columns
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.columns
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v)
    }
}

impl Default for ResultRow {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_value_display() {
        assert_eq!(FieldValue::Integer(42).to_string(), "42");
        assert_eq!(FieldValue::Float(2.5).to_string(), "2.5");
        assert_eq!(FieldValue::String("Pen".into()).to_string(), "Pen");
        assert_eq!(FieldValue::Null.to_string(), "NULL");
    }

    #[test]
    fn test_compare_orders_numerics_and_strings() {
        assert_eq!(
            compare_field_values(&FieldValue::Integer(1), &FieldValue::Float(2.0)),
            Ordering::Less
        );
        assert_eq!(
            compare_field_values(
                &FieldValue::String("a".into()),
                &FieldValue::String("b".into())
            ),
            Ordering::Less
        );
        assert_eq!(
            compare_field_values(&FieldValue::Null, &FieldValue::Integer(0)),
            Ordering::Less
        );
    }

    #[test]
    fn test_group_key_hash_equality() {
        use std::collections::HashMap;
        let mut map: HashMap<GroupKey, u32> = HashMap::new();
        map.insert(vec![FieldValue::String("Pen".into())], 1);
        assert_eq!(map.get(&vec![FieldValue::String("Pen".into())]), Some(&1));
    }

    #[test]
    fn test_result_row_lookup() {
        let mut row = ResultRow::new();
        row.push("total_sales", FieldValue::Float(25.0));
        assert_eq!(row.get("total_sales"), Some(&FieldValue::Float(25.0)));
        assert_eq!(row.get("missing"), None);
    }
}
