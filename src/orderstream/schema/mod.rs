//! Schema registry for the order CSV feeds.
//!
//! Resolves a schema variant to its ordered column layout and parses raw CSV
//! rows into typed records. Consulted by the file source at parse time.

pub mod error;
pub mod types;

pub use error::ParseError;
pub use types::{Field, FieldDefinition, FieldType, Schema, SchemaVariant};
