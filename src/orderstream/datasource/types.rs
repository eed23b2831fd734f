//! Shared datasource error types.

use std::error::Error;
use std::fmt;

/// Errors raised by a batch source.
#[derive(Debug, Clone)]
pub enum SourceError {
    /// Watched directory is missing or unlistable; retried with backoff
    /// mid-run, fatal at startup and after retry exhaustion
    Unavailable(String),
    /// IO failure reading a data file
    Io(String),
    /// Offset-log read or append failure
    OffsetLog(String),
}

impl SourceError {
    pub fn is_unavailable(&self) -> bool {
        matches!(self, SourceError::Unavailable(_))
    }
}

impl fmt::Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceError::Unavailable(msg) => write!(f, "source unavailable: {}", msg),
            SourceError::Io(msg) => write!(f, "source IO error: {}", msg),
            SourceError::OffsetLog(msg) => write!(f, "offset log error: {}", msg),
        }
    }
}

impl Error for SourceError {}

/// Per-query, per-trigger sink write failure. Logged and skipped; never
/// affects sibling queries or future triggers.
#[derive(Debug, Clone)]
pub struct SinkWriteError {
    pub query: String,
    pub message: String,
}

impl SinkWriteError {
    pub fn new(query: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for SinkWriteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sink write failed for '{}': {}", self.query, self.message)
    }
}

impl Error for SinkWriteError {}
