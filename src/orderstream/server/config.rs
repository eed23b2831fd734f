//! Runtime configuration.
//!
//! Layered: built-in defaults per schema variant, then CLI flags, then
//! environment variables (highest priority):
//!
//! - `ORDERSTREAM_DATA_DIR`: watched directory override
//! - `ORDERSTREAM_TRIGGER_MS`: trigger interval override, in milliseconds

use std::env;
use std::error::Error;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::orderstream::schema::SchemaVariant;

/// Invalid startup arguments. Fatal before any query starts.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// schema_variant argument was not 1 or 2
    InvalidVariant(String),
    /// Trigger interval could not be parsed or was zero
    InvalidTriggerInterval(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidVariant(arg) => {
                write!(f, "invalid schema variant '{}' (expected 1 or 2)", arg)
            }
            ConfigError::InvalidTriggerInterval(arg) => {
                write!(f, "invalid trigger interval '{}'", arg)
            }
        }
    }
}

impl Error for ConfigError {}

/// Parse the CLI schema_variant argument.
pub fn parse_variant(arg: &str) -> Result<SchemaVariant, ConfigError> {
    match arg.trim() {
        "1" => Ok(SchemaVariant::V1),
        "2" => Ok(SchemaVariant::V2),
        other => Err(ConfigError::InvalidVariant(other.to_string())),
    }
}

/// Complete runtime configuration for one analytics process.
#[derive(Debug, Clone)]
pub struct AnalyticsConfig {
    pub variant: SchemaVariant,
    /// Directory watched for arriving CSV files; distinct per variant
    pub data_dir: PathBuf,
    /// Committed-file log; lives next to the data directory, not inside it
    pub offset_log: PathBuf,
    pub trigger_interval: Duration,
    /// Poll retry attempts before a mid-run source outage becomes fatal
    pub max_poll_retries: u32,
    /// Base backoff between poll retries; doubles per attempt
    pub retry_backoff: Duration,
}

impl AnalyticsConfig {
    /// Defaults for a schema variant.
    pub fn for_variant(variant: SchemaVariant) -> Self {
        let (data_dir, offset_log) = match variant {
            SchemaVariant::V1 => ("./data/orders1", "./data/orders1.offsets"),
            SchemaVariant::V2 => ("./data/orders2", "./data/orders2.offsets"),
        };

        Self {
            variant,
            data_dir: PathBuf::from(data_dir),
            offset_log: PathBuf::from(offset_log),
            trigger_interval: Duration::from_millis(1000),
            max_poll_retries: 5,
            retry_backoff: Duration::from_millis(500),
        }
    }

    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = dir.into();
        self
    }

    pub fn with_offset_log(mut self, path: impl Into<PathBuf>) -> Self {
        self.offset_log = path.into();
        self
    }

    pub fn with_trigger_interval(mut self, interval: Duration) -> Self {
        self.trigger_interval = interval;
        self
    }

    pub fn with_max_poll_retries(mut self, retries: u32) -> Self {
        self.max_poll_retries = retries;
        self
    }

    pub fn with_retry_backoff(mut self, backoff: Duration) -> Self {
        self.retry_backoff = backoff;
        self
    }

    /// Apply environment overrides on top of the current values.
    pub fn apply_env(mut self) -> Result<Self, ConfigError> {
        if let Ok(dir) = env::var("ORDERSTREAM_DATA_DIR") {
            if !dir.is_empty() {
                self.data_dir = PathBuf::from(dir);
            }
        }

        if let Ok(ms) = env::var("ORDERSTREAM_TRIGGER_MS") {
            let parsed = ms
                .parse::<u64>()
                .map_err(|_| ConfigError::InvalidTriggerInterval(ms.clone()))?;
            if parsed == 0 {
                return Err(ConfigError::InvalidTriggerInterval(ms));
            }
            self.trigger_interval = Duration::from_millis(parsed);
        }

        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_variant() {
        assert_eq!(parse_variant("1").unwrap(), SchemaVariant::V1);
        assert_eq!(parse_variant("2").unwrap(), SchemaVariant::V2);
        assert_eq!(
            parse_variant("3").unwrap_err(),
            ConfigError::InvalidVariant("3".to_string())
        );
        assert!(parse_variant("two").is_err());
    }

    #[test]
    fn test_variant_defaults_use_distinct_directories() {
        let v1 = AnalyticsConfig::for_variant(SchemaVariant::V1);
        let v2 = AnalyticsConfig::for_variant(SchemaVariant::V2);
        assert_ne!(v1.data_dir, v2.data_dir);
        assert_ne!(v1.offset_log, v2.offset_log);
    }

    #[test]
    fn test_builder_overrides() {
        let config = AnalyticsConfig::for_variant(SchemaVariant::V1)
            .with_data_dir("/tmp/orders")
            .with_trigger_interval(Duration::from_millis(50))
            .with_max_poll_retries(2);
        assert_eq!(config.data_dir, PathBuf::from("/tmp/orders"));
        assert_eq!(config.trigger_interval, Duration::from_millis(50));
        assert_eq!(config.max_poll_retries, 2);
    }
}
