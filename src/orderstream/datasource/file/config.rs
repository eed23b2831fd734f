//! Watched-directory source configuration.

use std::path::{Path, PathBuf};

/// Configuration for the watched-directory CSV source.
#[derive(Debug, Clone)]
pub struct FileSourceConfig {
    /// Directory to watch for arriving CSV files
    pub path: PathBuf,
    /// Where the committed-file log lives. Only `*.csv` files are ingested,
    /// so the log is never picked up as input even when it sits in `path`
    pub offset_log: PathBuf,
    /// First line of every file is a header row
    pub csv_has_header: bool,
    pub csv_delimiter: char,
    pub csv_quote: char,
}

impl FileSourceConfig {
    pub fn new(path: impl AsRef<Path>, offset_log: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            offset_log: offset_log.as_ref().to_path_buf(),
            csv_has_header: true,
            csv_delimiter: ',',
            csv_quote: '"',
        }
    }

    pub fn with_header(mut self, has_header: bool) -> Self {
        self.csv_has_header = has_header;
        self
    }

    pub fn with_delimiter(mut self, delimiter: char) -> Self {
        self.csv_delimiter = delimiter;
        self
    }
}
