//! Watched-directory CSV source.
//!
//! Each poll lists the watched directory, takes every CSV file not yet
//! committed, and concatenates their parsed rows into one batch. Files join
//! the committed set at batch commit, after emission, so a crash mid-trigger
//! replays them on the next start.

use async_trait::async_trait;
use log::{debug, info, warn};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::time::UNIX_EPOCH;

use super::config::FileSourceConfig;
use super::offset::{FileToken, OffsetLog};
use crate::orderstream::datasource::traits::BatchSource;
use crate::orderstream::datasource::types::SourceError;
use crate::orderstream::engine::Batch;
use crate::orderstream::schema::Schema;

/// Incremental CSV file source over one watched directory.
#[derive(Debug)]
pub struct FileSource {
    config: FileSourceConfig,
    schema: Schema,
    offsets: OffsetLog,
    /// Files read into the last batch, excluded from polling until committed
    pending: Vec<FileToken>,
    next_batch_id: u64,
}

impl FileSource {
    /// Open the source. The watched directory must exist; a missing
    /// directory at startup is fatal.
    pub fn new(config: FileSourceConfig, schema: Schema) -> Result<Self, SourceError> {
        if !config.path.is_dir() {
            return Err(SourceError::Unavailable(format!(
                "watched directory '{}' does not exist",
                config.path.display()
            )));
        }

        let offsets = OffsetLog::load(&config.offset_log)?;
        info!(
            "File source watching '{}' ({} files already committed)",
            config.path.display(),
            offsets.len()
        );

        Ok(Self {
            config,
            schema,
            offsets,
            pending: Vec::new(),
            next_batch_id: 0,
        })
    }

    /// List CSV files in the watched directory that are neither committed
    /// nor staged in the current uncommitted batch, ordered lexicographically
    /// by filename then by modification time for deterministic replay.
    pub fn poll_new_files(&self) -> Result<Vec<FileToken>, SourceError> {
        let entries = std::fs::read_dir(&self.config.path).map_err(|e| {
            SourceError::Unavailable(format!("{}: {}", self.config.path.display(), e))
        })?;

        let mut files = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| SourceError::Io(e.to_string()))?;
            let path = entry.path();
            if !path.is_file() || !Self::is_csv(&path) {
                continue;
            }

            let path_str = path.to_string_lossy().to_string();
            if self.offsets.contains(&path_str)
                || self.pending.iter().any(|t| t.path == path_str)
            {
                continue;
            }

            let metadata = entry.metadata().map_err(|e| SourceError::Io(e.to_string()))?;
            let modified_ms = metadata
                .modified()
                .ok()
                .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
                .map(|d| d.as_millis() as i64)
                .unwrap_or(0);

            files.push(FileToken {
                path: path_str,
                size: metadata.len(),
                modified_ms,
            });
        }

        files.sort_by(|a, b| a.path.cmp(&b.path).then(a.modified_ms.cmp(&b.modified_ms)));
        Ok(files)
    }

    fn is_csv(path: &Path) -> bool {
        path.extension()
            .map(|ext| ext.eq_ignore_ascii_case("csv"))
            .unwrap_or(false)
    }

    /// Read one file into raw field lists, header line skipped.
    fn read_raw_rows(&self, token: &FileToken) -> Result<Vec<Vec<String>>, SourceError> {
        let file = File::open(&token.path)
            .map_err(|e| SourceError::Io(format!("{}: {}", token.path, e)))?;
        let reader = BufReader::new(file);

        let mut rows = Vec::new();
        let mut line_number = 0usize;
        for line in reader.lines() {
            let line = line.map_err(|e| SourceError::Io(format!("{}: {}", token.path, e)))?;
            line_number += 1;

            if self.config.csv_has_header && line_number == 1 {
                continue;
            }
            if line.trim().is_empty() {
                continue;
            }
            rows.push(self.parse_csv_fields(&line));
        }

        Ok(rows)
    }

    /// Split one CSV line, honoring quoted fields and doubled-quote escapes.
    fn parse_csv_fields(&self, line: &str) -> Vec<String> {
        let mut fields = Vec::new();
        let mut current_field = String::new();
        let mut in_quotes = false;
        let mut chars = line.chars().peekable();

        while let Some(ch) = chars.next() {
            match ch {
                c if c == self.config.csv_quote => {
                    if in_quotes {
                        if chars.peek() == Some(&self.config.csv_quote) {
                            current_field.push(self.config.csv_quote);
                            chars.next();
                        } else {
                            in_quotes = false;
                        }
                    } else {
                        in_quotes = true;
                    }
                }
                c if c == self.config.csv_delimiter && !in_quotes => {
                    fields.push(current_field.trim().to_string());
                    current_field.clear();
                }
                c => current_field.push(c),
            }
        }
        fields.push(current_field.trim().to_string());

        fields
    }

    /// Poll and parse everything new into the next batch.
    ///
    /// Malformed rows are skipped and counted, never fatal. The files read
    /// here stay staged until [`FileSource::commit_batch`] runs.
    pub fn poll_batch(&mut self) -> Result<Batch, SourceError> {
        let files = self.poll_new_files()?;

        let mut batch = Batch::new(self.next_batch_id);
        self.next_batch_id += 1;

        for token in files {
            let raw_rows = self.read_raw_rows(&token)?;
            let mut parsed = 0usize;
            for raw in &raw_rows {
                match self.schema.parse_row(raw) {
                    Ok(record) => {
                        batch.records.push(record);
                        parsed += 1;
                    }
                    Err(e) => {
                        batch.parse_errors += 1;
                        warn!("Skipping malformed row in '{}': {}", token.path, e);
                    }
                }
            }
            debug!(
                "Read '{}': {} rows parsed, {} skipped",
                token.path,
                parsed,
                raw_rows.len() - parsed
            );
            batch.source_files.push(token.path.clone());
            self.pending.push(token);
        }

        Ok(batch)
    }

    /// Mark the files behind the last batch as committed.
    pub fn commit_batch(&mut self) -> Result<(), SourceError> {
        self.offsets.commit(&self.pending)?;
        self.pending.clear();
        Ok(())
    }

    pub fn committed_files(&self) -> usize {
        self.offsets.len()
    }
}

#[async_trait]
impl BatchSource for FileSource {
    async fn next_batch(&mut self) -> Result<Batch, SourceError> {
        self.poll_batch()
    }

    async fn commit(&mut self) -> Result<(), SourceError> {
        self.commit_batch()
    }
}
