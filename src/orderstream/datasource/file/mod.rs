//! Watched-directory CSV file source.

pub mod config;
pub mod offset;
pub mod source;

pub use config::FileSourceConfig;
pub use offset::{FileToken, OffsetLog};
pub use source::FileSource;
