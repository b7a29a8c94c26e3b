//! Error handling module
//!
//! This module defines the error types and result type aliases used in the application.

use thiserror::Error;
use std::io;

use crate::config::ConfigError;

/// AuthGate error type
#[derive(Error, Debug)]
pub enum AppError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Configuration error (resolution or validation)
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The configured listen address is already bound
    #[error("{0} is not available (is {1} already running?)")]
    AddressInUse(String, &'static str),

    /// Healthcheck request failed or reported not ok
    #[error("healthcheck against {url} failed: {reason}")]
    Healthcheck { url: String, reason: String },

    /// Other error
    #[error("Other error: {0}")]
    Other(String),
}

/// Result type alias
///
/// This is a `Result` type alias that uses our custom `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "File not found");
        let app_err: AppError = io_err.into();

        match app_err {
            AppError::Io(_) => {}
            _ => panic!("Should convert to IO error"),
        }
    }

    #[test]
    fn test_config_error_is_transparent() {
        let err: AppError = ConfigError::MissingRequired("oauth.client_id".to_string()).into();
        let err_str = err.to_string();
        assert!(err_str.starts_with("configuration error:"));
        assert!(err_str.contains("oauth.client_id"));
    }

    #[test]
    fn test_address_in_use_display() {
        let err = AppError::AddressInUse("0.0.0.0:9090".to_string(), "AuthGate");
        assert_eq!(
            err.to_string(),
            "0.0.0.0:9090 is not available (is AuthGate already running?)"
        );
    }
}
