//! Tabular console output, one block per query per trigger.
//!
//! Each write renders a bordered block with the query name, its output mode
//! and a per-query batch counter, followed by the result rows as a
//! width-aligned text table. Newest trigger is appended below earlier ones.

use async_trait::async_trait;
use std::collections::HashMap;

use crate::orderstream::datasource::traits::SinkWriter;
use crate::orderstream::datasource::types::SinkWriteError;
use crate::orderstream::engine::{OutputMode, ResultRow};

const RULE: &str = "-------------------------------------------";

/// Console sink writing aligned text tables to stdout.
pub struct ConsoleSink {
    batch_counters: HashMap<String, u64>,
}

impl ConsoleSink {
    pub fn new() -> Self {
        Self {
            batch_counters: HashMap::new(),
        }
    }

    /// Render one output block. Column widths are sized to content, so raw
    /// rows are never truncated.
    fn render(query_name: &str, mode: OutputMode, batch: u64, rows: &[ResultRow]) -> String {
        let mut out = String::new();
        out.push_str(RULE);
        out.push('\n');
        out.push_str(&format!("Batch: {} -- {} [{}]\n", batch, query_name, mode));
        out.push_str(RULE);
        out.push('\n');

        if rows.is_empty() {
            out.push_str("(0 rows)\n");
            return out;
        }

        let headers: Vec<&str> = rows[0].columns().iter().map(|(name, _)| *name).collect();
        let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
        let cells: Vec<Vec<String>> = rows
            .iter()
            .map(|row| {
                row.columns()
                    .iter()
                    .map(|(_, value)| value.to_string())
                    .collect()
            })
            .collect();
        for row in &cells {
            for (i, cell) in row.iter().enumerate() {
                if i < widths.len() && cell.len() > widths[i] {
                    widths[i] = cell.len();
                }
            }
        }

        out.push('|');
        for (header, width) in headers.iter().zip(&widths) {
            out.push_str(&format!("{:<width$}|", header, width = *width));
        }
        out.push('\n');

        for row in &cells {
            out.push('|');
            for (cell, width) in row.iter().zip(&widths) {
                out.push_str(&format!("{:<width$}|", cell, width = *width));
            }
            out.push('\n');
        }

        out
    }
}

impl Default for ConsoleSink {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SinkWriter for ConsoleSink {
    async fn write(
        &mut self,
        query_name: &str,
        mode: OutputMode,
        rows: &[ResultRow],
    ) -> Result<(), SinkWriteError> {
        let counter = self.batch_counters.entry(query_name.to_string()).or_insert(0);
        let block = Self::render(query_name, mode, *counter, rows);
        *counter += 1;

        println!("{}", block);
        Ok(())
    }
}
