//! Logging setup.
//!
//! Library code only emits `tracing` events. Binaries call [`init_tracing`]
//! once at startup to install a subscriber; `RUST_LOG` takes precedence over
//! the configured level.

use tracing_subscriber::EnvFilter;

use crate::error::ConfigError;
use crate::utils::config::LoggingConfig;

/// Build the filter for the given configuration.
pub fn env_filter(config: &LoggingConfig) -> Result<EnvFilter, ConfigError> {
    match std::env::var("RUST_LOG") {
        Ok(directives) if !directives.trim().is_empty() => EnvFilter::try_new(directives)
            .map_err(|e| ConfigError::Invalid(format!("RUST_LOG: {}", e))),
        _ => EnvFilter::try_new(&config.level)
            .map_err(|e| ConfigError::Invalid(format!("logging.level: {}", e))),
    }
}

/// Install the global subscriber.
///
/// Returns `Ok(false)` when a subscriber was already installed, which is
/// expected in tests that initialize logging more than once.
pub fn init_tracing(config: &LoggingConfig) -> Result<bool, ConfigError> {
    let filter = env_filter(config)?;
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    let installed = if config.json {
        builder.json().try_init().is_ok()
    } else {
        builder.try_init().is_ok()
    };

    Ok(installed)
}
