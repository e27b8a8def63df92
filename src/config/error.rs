//! Configuration error types

use thiserror::Error;

use crate::domain::foundation::BillingError;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

impl From<ConfigError> for BillingError {
    fn from(err: ConfigError) -> Self {
        BillingError::configuration("environment", err.to_string())
    }
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Invalid port number")]
    InvalidPort,

    #[error("Invalid listen address")]
    InvalidAddress,

    #[error("Invalid timeout for {0}")]
    InvalidTimeout(&'static str),

    #[error("{0} must be an http(s) URL")]
    InvalidUrl(&'static str),

    #[error("Invalid log level directive: {0}")]
    InvalidLogLevel(String),
}
