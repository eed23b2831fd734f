//! Committed-file tracking.
//!
//! The offset log is an append-only JSON-lines file, one entry per ingested
//! file. It is loaded once at startup and appended to at batch commit, so a
//! crash between reading a file and committing it replays that file on the
//! next start (at-least-once). Exactly one writer mutates the set: the file
//! source, at commit time.

use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use crate::orderstream::datasource::types::SourceError;

/// Identity token for one ingested file: path plus a size/mtime stamp.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct FileToken {
    pub path: String,
    pub size: u64,
    pub modified_ms: i64,
}

/// Set of committed files backed by the append-only log.
#[derive(Debug)]
pub struct OffsetLog {
    path: PathBuf,
    committed: HashSet<String>,
}

impl OffsetLog {
    /// Load the committed set from disk. A missing log file means a fresh
    /// start; unparsable lines (e.g. a truncated tail after a crash) are
    /// skipped with a warning, which at worst replays a file.
    pub fn load(path: &Path) -> Result<Self, SourceError> {
        let mut committed = HashSet::new();

        if path.exists() {
            let file = File::open(path)
                .map_err(|e| SourceError::OffsetLog(format!("{}: {}", path.display(), e)))?;
            for line in BufReader::new(file).lines() {
                let line =
                    line.map_err(|e| SourceError::OffsetLog(format!("{}: {}", path.display(), e)))?;
                if line.trim().is_empty() {
                    continue;
                }
                match serde_json::from_str::<FileToken>(&line) {
                    Ok(token) => {
                        committed.insert(token.path);
                    }
                    Err(e) => {
                        warn!("Skipping unparsable offset log line: {}", e);
                    }
                }
            }
        }

        Ok(Self {
            path: path.to_path_buf(),
            committed,
        })
    }

    pub fn contains(&self, file_path: &str) -> bool {
        self.committed.contains(file_path)
    }

    pub fn len(&self) -> usize {
        self.committed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.committed.is_empty()
    }

    /// Append the given tokens and fold them into the in-memory set.
    ///
    /// The set is only updated after every line reached the log, so a failed
    /// append leaves the files eligible for replay rather than dropped.
    pub fn commit(&mut self, tokens: &[FileToken]) -> Result<(), SourceError> {
        if tokens.is_empty() {
            return Ok(());
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| SourceError::OffsetLog(format!("{}: {}", self.path.display(), e)))?;

        for token in tokens {
            let line = serde_json::to_string(token)
                .map_err(|e| SourceError::OffsetLog(e.to_string()))?;
            writeln!(file, "{}", line)
                .map_err(|e| SourceError::OffsetLog(format!("{}: {}", self.path.display(), e)))?;
        }
        file.flush()
            .map_err(|e| SourceError::OffsetLog(format!("{}: {}", self.path.display(), e)))?;

        for token in tokens {
            self.committed.insert(token.path.clone());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn token(path: &str) -> FileToken {
        FileToken {
            path: path.to_string(),
            size: 10,
            modified_ms: 1_700_000_000_000,
        }
    }

    #[test]
    fn test_load_missing_log_starts_empty() {
        let dir = TempDir::new().unwrap();
        let log = OffsetLog::load(&dir.path().join("orders.offsets")).unwrap();
        assert!(log.is_empty());
    }

    #[test]
    fn test_commit_then_reload() {
        let dir = TempDir::new().unwrap();
        let log_path = dir.path().join("orders.offsets");

        let mut log = OffsetLog::load(&log_path).unwrap();
        log.commit(&[token("a.csv"), token("b.csv")]).unwrap();
        assert!(log.contains("a.csv"));

        let reloaded = OffsetLog::load(&log_path).unwrap();
        assert_eq!(reloaded.len(), 2);
        assert!(reloaded.contains("b.csv"));
    }

    #[test]
    fn test_corrupt_tail_line_is_skipped() {
        let dir = TempDir::new().unwrap();
        let log_path = dir.path().join("orders.offsets");

        let mut log = OffsetLog::load(&log_path).unwrap();
        log.commit(&[token("a.csv")]).unwrap();
        std::fs::write(
            &log_path,
            format!(
                "{}\n{{\"path\": \"trunc",
                serde_json::to_string(&token("a.csv")).unwrap()
            ),
        )
        .unwrap();

        let reloaded = OffsetLog::load(&log_path).unwrap();
        assert_eq!(reloaded.len(), 1);
        assert!(reloaded.contains("a.csv"));
    }
}
