//! Source and sink seams.
//!
//! The scheduler drives any [`BatchSource`] and [`SinkWriter`] pair; the file
//! source and console sink are the shipped implementations, the mock sink
//! backs the tests.

use async_trait::async_trait;

use super::types::{SinkWriteError, SourceError};
use crate::orderstream::engine::{Batch, OutputMode, ResultRow};

/// A source of monotonically-increasing record batches.
#[async_trait]
pub trait BatchSource: Send {
    /// Poll for newly arrived data. Returns an empty batch when nothing new
    /// arrived; the trigger still fires.
    async fn next_batch(&mut self) -> Result<Batch, SourceError>;

    /// Commit the input consumed by the last batch. Called once per trigger,
    /// after emission, so a crash beforehand replays the batch (at-least-once).
    async fn commit(&mut self) -> Result<(), SourceError>;
}

/// Destination for one query's result rows each trigger.
#[async_trait]
pub trait SinkWriter: Send {
    async fn write(
        &mut self,
        query_name: &str,
        mode: OutputMode,
        rows: &[ResultRow],
    ) -> Result<(), SinkWriteError>;
}
