//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Invalid {0} URL, expected http:// or https://")]
    InvalidUrl(&'static str),

    #[error("Invalid {0} timeout")]
    InvalidTimeout(&'static str),

    #[error("Status poll interval must be positive")]
    InvalidPollInterval,

    #[error("Driver search timeout is shorter than the poll interval")]
    SearchTimeoutTooShort,

    #[error("Signal buffer must be positive")]
    InvalidSignalBuffer,

    #[error("Average speed must be positive")]
    InvalidSpeed,

    #[error("Invalid log filter: {0}")]
    InvalidLogFilter(String),
}
