//! Data source and sink abstractions.
//!
//! - **BatchSource/SinkWriter**: seams the scheduler drives
//! - **file**: watched-directory CSV source with committed-file tracking
//! - **console**: tabular stdout sink
//! - **mock**: recording sink for tests

pub mod console;
pub mod file;
pub mod mock;
pub mod traits;
pub mod types;

pub use console::ConsoleSink;
pub use file::{FileSource, FileSourceConfig, FileToken, OffsetLog};
pub use traits::{BatchSource, SinkWriter};
pub use types::{SinkWriteError, SourceError};
