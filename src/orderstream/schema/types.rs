//! Order record schemas.
//!
//! Two CSV layouts are supported, selected at startup:
//!
//! - Variant 1 (orders1 feed): order_id, client_id, client_name, product,
//!   quantity, price, order_date, status, total
//! - Variant 2 (orders2/orders3 feed): order_id, client_id, product_id,
//!   product_name, quantity, unit_price, total_amount, order_date, status
//!
//! Columns are identified by the [`Field`] enum rather than by name, so a
//! query definition cannot reference a column that does not exist in the
//! running variant's layout.

use std::fmt;

use super::error::ParseError;
use crate::orderstream::engine::types::{FieldValue, Record};

/// Which CSV layout a feed uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaVariant {
    V1,
    V2,
}

impl fmt::Display for SchemaVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaVariant::V1 => write!(f, "1"),
            SchemaVariant::V2 => write!(f, "2"),
        }
    }
}

/// Column identifiers across both schema variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    OrderId,
    ClientId,
    ClientName,
    Product,
    ProductId,
    ProductName,
    Quantity,
    Price,
    UnitPrice,
    Total,
    TotalAmount,
    OrderDate,
    Status,
}

impl Field {
    /// Column name as it appears in CSV headers and result tables.
    pub fn name(&self) -> &'static str {
        match self {
            Field::OrderId => "order_id",
            Field::ClientId => "client_id",
            Field::ClientName => "client_name",
            Field::Product => "product",
            Field::ProductId => "product_id",
            Field::ProductName => "product_name",
            Field::Quantity => "quantity",
            Field::Price => "price",
            Field::UnitPrice => "unit_price",
            Field::Total => "total",
            Field::TotalAmount => "total_amount",
            Field::OrderDate => "order_date",
            Field::Status => "status",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Column data types understood by the parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Integer64,
    Integer32,
    Float64,
    Utf8,
}

/// One column in a schema layout.
#[derive(Debug, Clone)]
pub struct FieldDefinition {
    pub field: Field,
    pub field_type: FieldType,
    pub nullable: bool,
}

impl FieldDefinition {
    fn new(field: Field, field_type: FieldType, nullable: bool) -> Self {
        Self {
            field,
            field_type,
            nullable,
        }
    }
}

/// Ordered column layout for one schema variant.
///
/// Numeric columns feed running sums and filters downstream, so they are
/// declared non-nullable: an empty value there drops the row at parse time
/// instead of poisoning aggregate state. String columns admit NULL.
#[derive(Debug, Clone)]
pub struct Schema {
    variant: SchemaVariant,
    fields: Vec<FieldDefinition>,
}

impl Schema {
    /// Build the column layout for a schema variant.
    pub fn for_variant(variant: SchemaVariant) -> Self {
        let fields = match variant {
            SchemaVariant::V1 => vec![
                FieldDefinition::new(Field::OrderId, FieldType::Integer64, false),
                FieldDefinition::new(Field::ClientId, FieldType::Utf8, true),
                FieldDefinition::new(Field::ClientName, FieldType::Utf8, true),
                FieldDefinition::new(Field::Product, FieldType::Utf8, true),
                FieldDefinition::new(Field::Quantity, FieldType::Integer32, false),
                FieldDefinition::new(Field::Price, FieldType::Float64, false),
                FieldDefinition::new(Field::OrderDate, FieldType::Utf8, true),
                FieldDefinition::new(Field::Status, FieldType::Utf8, true),
                FieldDefinition::new(Field::Total, FieldType::Float64, false),
            ],
            SchemaVariant::V2 => vec![
                FieldDefinition::new(Field::OrderId, FieldType::Integer64, false),
                FieldDefinition::new(Field::ClientId, FieldType::Utf8, true),
                FieldDefinition::new(Field::ProductId, FieldType::Utf8, true),
                FieldDefinition::new(Field::ProductName, FieldType::Utf8, true),
                FieldDefinition::new(Field::Quantity, FieldType::Integer32, false),
                FieldDefinition::new(Field::UnitPrice, FieldType::Float64, false),
                FieldDefinition::new(Field::TotalAmount, FieldType::Float64, false),
                FieldDefinition::new(Field::OrderDate, FieldType::Utf8, true),
                FieldDefinition::new(Field::Status, FieldType::Utf8, true),
            ],
        };

        Self { variant, fields }
    }

    pub fn variant(&self) -> SchemaVariant {
        self.variant
    }

    /// Ordered column definitions for this layout.
    pub fn fields(&self) -> &[FieldDefinition] {
        &self.fields
    }

    /// All column identifiers in layout order (the raw-passthrough projection).
    pub fn field_names(&self) -> Vec<Field> {
        self.fields.iter().map(|d| d.field).collect()
    }

    /// Parse one raw CSV row into a typed record.
    ///
    /// Field count must match the layout exactly. Typed conversions that fail
    /// and empty values in non-nullable columns are parse errors; the caller
    /// skips and counts those rows.
    pub fn parse_row(&self, raw_fields: &[String]) -> Result<Record, ParseError> {
        if raw_fields.len() != self.fields.len() {
            return Err(ParseError::FieldCountMismatch {
                expected: self.fields.len(),
                actual: raw_fields.len(),
            });
        }

        let mut record = Record::with_capacity(self.fields.len());
        for (def, raw) in self.fields.iter().zip(raw_fields) {
            let trimmed = raw.trim();
            let value = if trimmed.is_empty() {
                if !def.nullable {
                    return Err(ParseError::NullValue { field: def.field });
                }
                FieldValue::Null
            } else {
                Self::convert(def, trimmed)?
            };
            record.insert(def.field, value);
        }

        Ok(record)
    }

    fn convert(def: &FieldDefinition, raw: &str) -> Result<FieldValue, ParseError> {
        let invalid = || ParseError::InvalidValue {
            field: def.field,
            value: raw.to_string(),
            expected: def.field_type,
        };

        match def.field_type {
            FieldType::Integer64 => raw
                .parse::<i64>()
                .map(FieldValue::Integer)
                .map_err(|_| invalid()),
            FieldType::Integer32 => raw
                .parse::<i32>()
                .map(|i| FieldValue::Integer(i as i64))
                .map_err(|_| invalid()),
            FieldType::Float64 => raw
                .parse::<f64>()
                .map(FieldValue::Float)
                .map_err(|_| invalid()),
            FieldType::Utf8 => Ok(FieldValue::String(raw.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(fields: &[&str]) -> Vec<String> {
        fields.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_valid_v1_row() {
        let schema = Schema::for_variant(SchemaVariant::V1);
        let record = schema
            .parse_row(&row(&[
                "1",
                "C1",
                "Alice",
                "Pen",
                "10",
                "2.5",
                "2024-01-01",
                "NEW",
                "25.0",
            ]))
            .unwrap();

        assert_eq!(record.get(Field::OrderId), Some(&FieldValue::Integer(1)));
        assert_eq!(record.get(Field::Quantity), Some(&FieldValue::Integer(10)));
        assert_eq!(record.get(Field::Total), Some(&FieldValue::Float(25.0)));
        assert_eq!(
            record.get(Field::Product),
            Some(&FieldValue::String("Pen".to_string()))
        );
    }

    #[test]
    fn test_parse_valid_v2_row() {
        let schema = Schema::for_variant(SchemaVariant::V2);
        let record = schema
            .parse_row(&row(&[
                "7",
                "C9",
                "P3",
                "Stapler",
                "2",
                "12.0",
                "24.0",
                "2024-02-02",
                "SHIPPED",
            ]))
            .unwrap();

        assert_eq!(
            record.get(Field::ProductName),
            Some(&FieldValue::String("Stapler".to_string()))
        );
        assert_eq!(
            record.get(Field::TotalAmount),
            Some(&FieldValue::Float(24.0))
        );
    }

    #[test]
    fn test_field_count_mismatch() {
        let schema = Schema::for_variant(SchemaVariant::V1);
        let err = schema.parse_row(&row(&["1", "C1"])).unwrap_err();
        assert_eq!(
            err,
            ParseError::FieldCountMismatch {
                expected: 9,
                actual: 2
            }
        );
    }

    #[test]
    fn test_non_numeric_quantity_rejected() {
        let schema = Schema::for_variant(SchemaVariant::V1);
        let err = schema
            .parse_row(&row(&[
                "1",
                "C1",
                "Alice",
                "Pen",
                "lots",
                "2.5",
                "2024-01-01",
                "NEW",
                "25.0",
            ]))
            .unwrap_err();
        assert!(matches!(
            err,
            ParseError::InvalidValue {
                field: Field::Quantity,
                ..
            }
        ));
    }

    #[test]
    fn test_empty_nullable_string_parses_to_null() {
        let schema = Schema::for_variant(SchemaVariant::V1);
        let record = schema
            .parse_row(&row(&[
                "1",
                "C1",
                "",
                "Pen",
                "10",
                "2.5",
                "2024-01-01",
                "NEW",
                "25.0",
            ]))
            .unwrap();
        assert_eq!(record.get(Field::ClientName), Some(&FieldValue::Null));
    }

    #[test]
    fn test_empty_required_numeric_rejected() {
        let schema = Schema::for_variant(SchemaVariant::V1);
        let err = schema
            .parse_row(&row(&[
                "1",
                "C1",
                "Alice",
                "Pen",
                "10",
                "2.5",
                "2024-01-01",
                "NEW",
                "",
            ]))
            .unwrap_err();
        assert_eq!(err, ParseError::NullValue { field: Field::Total });
    }
}
