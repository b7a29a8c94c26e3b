//! OAuth provider descriptors and client construction

pub mod client;
pub mod defaults;
pub mod provider;

pub use client::{AuthUrlParam, Endpoint, OAuthClient};
pub use defaults::apply_provider_defaults;
pub use provider::{OAuthProviderConfig, Provider};
