//! Micro-batch aggregation engine.
//!
//! Maintains per-query running state across batches and materializes result
//! rows per trigger under three output semantics (Append, Update, Complete).

pub mod accumulator;
pub mod aggregation;
pub mod query;
pub mod registry;
pub mod types;

pub use accumulator::GroupAccumulator;
pub use aggregation::{emit_rows, AggregationEngine, QueryState};
pub use query::{
    AggregateExpr, AggregateFunction, CompareOp, FilterPredicate, OutputMode, QueryDefinition,
    SortSpec,
};
pub use registry::QueryRegistry;
pub use types::{compare_field_values, Batch, FieldValue, GroupKey, Record, ResultRow};
