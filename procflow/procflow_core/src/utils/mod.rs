//! Configuration and logging utilities.

pub mod config;
pub mod logging;

pub use config::{AuthConfig, EngineConfig, LayoutConfig, LoggingConfig, StorageConfig};
pub use logging::init_tracing;
