//! AuthGate: configuration core of an OAuth authentication proxy
//!
//! Resolves the layered configuration (packaged defaults, an override file
//! and environment variables), migrates the legacy root key, applies OAuth
//! provider defaults, provisions signing secrets and validates the result.
//!
//! # Example
//!
//! ```no_run
//! use authgate_proxy::config::{self, ConfigBuilder, EnvSource, Locations};
//!
//! fn main() -> authgate_proxy::Result<()> {
//!     let env = EnvSource::from_process();
//!     let snapshot = ConfigBuilder::new(Locations::from_env(&env)?)
//!         .with_env(env)
//!         .build()?;
//!
//!     let snapshot = config::initialize(snapshot)?;
//!     println!("listening on {}", snapshot.listen_address());
//!     Ok(())
//! }
//! ```

// Public modules
pub mod common;
pub mod config;
pub mod healthcheck;
pub mod oauth;

// Re-export commonly used structures and functions for convenience
pub use common::{is_listen_address_free, AppError, Result};
pub use config::{Snapshot, BRANDING};
pub use oauth::{OAuthClient, OAuthProviderConfig, Provider};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
