//! Configuration errors
//!
//! This module defines error types for the configuration module.

use std::path::PathBuf;

use thiserror::Error;

/// Configuration error type
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The packaged defaults could not be read or parsed
    #[error("Fatal error reading packaged defaults: {0}")]
    Defaults(String),

    /// Error reading a configuration file
    #[error("Error reading configuration file {}: {}", .0.display(), .1)]
    FileRead(PathBuf, String),

    /// Error parsing a configuration file
    #[error("Error parsing configuration file {}: {}", .0.display(), .1)]
    Parse(PathBuf, String),

    /// An environment override could not be coerced to the key's type
    #[error("Invalid value for environment variable {0}: {1}")]
    InvalidEnv(String, String),

    /// The merged tree could not be mapped onto the settings structure
    #[error("Error reading configuration under '{0}': {1}")]
    Unmarshal(String, String),

    /// Provider identifier outside the supported set
    #[error("configuration error: Unknown oauth provider: {0}")]
    UnknownProvider(String),

    /// A required option was not set by any source
    #[error("configuration error: required configuration option {0} is not set")]
    MissingRequired(String),

    /// A provider field is empty
    #[error("configuration error: {0} not found")]
    MissingValue(String),

    /// A callback URL is outside the configured domains or lacks the auth path
    #[error("configuration error: oauth.callback_url ({url}) {reason}")]
    InvalidCallback { url: String, reason: String },

    /// Invalid value or combination of values
    #[error("configuration error: {0}")]
    Invalid(String),

    /// The operating system could not supply secure randomness
    #[error("secure random source unavailable: {0}")]
    Entropy(String),

    /// The process-wide configuration was installed twice
    #[error("configuration already initialized")]
    AlreadyInitialized,
}

/// Result type alias for configuration operations
pub type Result<T> = std::result::Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_provider_names_value() {
        let err = ConfigError::UnknownProvider("myspace".to_string());
        assert_eq!(err.to_string(), "configuration error: Unknown oauth provider: myspace");
    }

    #[test]
    fn test_file_errors_name_path() {
        let err = ConfigError::Parse(PathBuf::from("/etc/authgate/config.yml"), "bad indent".to_string());
        let msg = err.to_string();
        assert!(msg.contains("/etc/authgate/config.yml"));
        assert!(msg.contains("bad indent"));
    }
}
