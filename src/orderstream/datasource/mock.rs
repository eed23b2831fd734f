//! Recording sink for tests.

use async_trait::async_trait;
use std::collections::HashSet;

use super::traits::SinkWriter;
use super::types::SinkWriteError;
use crate::orderstream::engine::{OutputMode, ResultRow};

/// One captured sink write.
#[derive(Debug, Clone)]
pub struct RecordedWrite {
    pub query: String,
    pub mode: OutputMode,
    pub rows: Vec<ResultRow>,
}

/// Sink that records every write; can be told to fail named queries to
/// exercise the skip-and-continue emission path.
#[derive(Debug, Default)]
pub struct MockSink {
    pub writes: Vec<RecordedWrite>,
    fail_queries: HashSet<String>,
}

impl MockSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every write for `query_name` return a [`SinkWriteError`].
    pub fn fail_query(mut self, query_name: &str) -> Self {
        self.fail_queries.insert(query_name.to_string());
        self
    }

    /// All captured writes for one query, in arrival order.
    pub fn writes_for(&self, query_name: &str) -> Vec<&RecordedWrite> {
        self.writes
            .iter()
            .filter(|w| w.query == query_name)
            .collect()
    }
}

#[async_trait]
impl SinkWriter for MockSink {
    async fn write(
        &mut self,
        query_name: &str,
        mode: OutputMode,
        rows: &[ResultRow],
    ) -> Result<(), SinkWriteError> {
        if self.fail_queries.contains(query_name) {
            return Err(SinkWriteError::new(query_name, "injected failure"));
        }
        self.writes.push(RecordedWrite {
            query: query_name.to_string(),
            mode,
            rows: rows.to_vec(),
        });
        Ok(())
    }
}
