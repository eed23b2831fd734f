//! Console sink.

pub mod sink;

pub use sink::ConsoleSink;
