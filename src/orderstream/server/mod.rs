//! Runtime: configuration, trigger scheduling and shutdown handling.

pub mod config;
pub mod scheduler;
pub mod shutdown;

pub use config::{parse_variant, AnalyticsConfig, ConfigError};
pub use scheduler::{SchedulerError, TriggerScheduler, TriggerState, TriggerStats};
pub use shutdown::{shutdown_signal, ShutdownSignal};
