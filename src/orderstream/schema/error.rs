//! Schema-level parse errors.

use std::error::Error;
use std::fmt;

use super::types::{Field, FieldType};

/// Per-row parse failure.
///
/// Parse errors are recoverable by design: the offending row is skipped and
/// counted, the rest of the batch continues. They never escalate to the
/// trigger level.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseError {
    /// Row has a different number of fields than the schema declares
    FieldCountMismatch { expected: usize, actual: usize },
    /// A typed field failed conversion (e.g. non-numeric quantity)
    InvalidValue {
        field: Field,
        value: String,
        expected: FieldType,
    },
    /// Empty value in a non-nullable field
    NullValue { field: Field },
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::FieldCountMismatch { expected, actual } => {
                write!(f, "expected {} fields, got {}", expected, actual)
            }
            ParseError::InvalidValue {
                field,
                value,
                expected,
            } => write!(
                f,
                "invalid value '{}' for field '{}' (expected {:?})",
                value, field, expected
            ),
            ParseError::NullValue { field } => {
                write!(f, "empty value in non-nullable field '{}'", field)
            }
        }
    }
}

impl Error for ParseError {}
