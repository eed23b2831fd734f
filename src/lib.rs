//! # orderstream
//!
//! A micro-batch streaming analytics engine over order CSV feeds. CSV files
//! arriving in a watched directory are ingested incrementally, folded into
//! running aggregates, and emitted to a console sink under Append, Update and
//! Complete output semantics.
//!
//! ## Architecture
//!
//! - **schema**: the two supported record layouts and typed row parsing
//! - **datasource**: watched-directory file source with committed-file
//!   tracking, console sink, and the seams between them and the scheduler
//! - **engine**: per-query accumulator state, batch folding and result
//!   materialization, plus the static registry of the seven analytic streams
//! - **server**: layered configuration, the sequential trigger scheduler and
//!   signal-driven graceful shutdown

pub mod orderstream;

pub use orderstream::datasource::{ConsoleSink, FileSource, FileSourceConfig};
pub use orderstream::engine::{OutputMode, QueryRegistry};
pub use orderstream::schema::{Schema, SchemaVariant};
pub use orderstream::server::{AnalyticsConfig, TriggerScheduler};
