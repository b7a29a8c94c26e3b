//! Configuration module
//!
//! This module resolves the process configuration from the packaged
//! defaults, an override file and environment variables, applies derived
//! and provider-specific defaults, provisions secrets and validates the
//! result before anything is served.

pub mod builder;
pub mod defaults;
pub mod error;
pub mod legacy;
pub mod manager;
pub mod secret;
pub mod snapshot;
pub mod source;
pub mod tree;
pub mod types;
pub mod validator;

// Re-export types and traits
pub use self::builder::{auto_load, ConfigBuilder, Locations};
pub use self::defaults::{Branding, BRANDING};
pub use self::error::{ConfigError, Result};
pub use self::manager::{get_config, initialize, replace_for_tests};
pub use self::secret::get_or_create_secret;
pub use self::snapshot::{log_config, Snapshot};
pub use self::source::{ConfigSource, DefaultSource, EnvSource, FileSource, ValueSource};
pub use self::tree::ConfigTree;
pub use self::types::{Secret, Settings};
pub use self::validator::{validate_config, ConfigValidator};
