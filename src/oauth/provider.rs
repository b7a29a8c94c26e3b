//! OAuth provider identity and configuration

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

use crate::config::types::{string_list, string_or_scalar, Secret};
use crate::config::ConfigError;

/// Supported identity providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Provider {
    Google,
    GitHub,
    IndieAuth,
    Adfs,
    Oidc,
    HomeAssistant,
    OpenStax,
}

impl Provider {
    /// Every supported provider
    pub const ALL: [Provider; 7] = [
        Provider::Google,
        Provider::GitHub,
        Provider::IndieAuth,
        Provider::Adfs,
        Provider::Oidc,
        Provider::HomeAssistant,
        Provider::OpenStax,
    ];

    /// Identifier used in configuration files
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Google => "google",
            Provider::GitHub => "github",
            Provider::IndieAuth => "indieauth",
            Provider::Adfs => "adfs",
            Provider::Oidc => "oidc",
            Provider::HomeAssistant => "homeassistant",
            Provider::OpenStax => "openstax",
        }
    }

    /// Whether a client secret must be configured
    ///
    /// ADFS and OIDC accept one but can run without.
    pub fn requires_client_secret(&self) -> bool {
        !matches!(
            self,
            Provider::IndieAuth | Provider::HomeAssistant | Provider::Adfs | Provider::Oidc
        )
    }

    /// Whether an authorization URL must be configured (Google's is fixed)
    pub fn requires_auth_url(&self) -> bool {
        !matches!(self, Provider::Google)
    }

    /// Whether a user info URL must be configured
    pub fn requires_user_info_url(&self) -> bool {
        !matches!(
            self,
            Provider::Google | Provider::IndieAuth | Provider::HomeAssistant | Provider::Adfs
        )
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = ConfigError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Provider::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| ConfigError::UnknownProvider(s.to_string()))
    }
}

/// Provider descriptor: the `oauth` sub-tree of the configuration
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct OAuthProviderConfig {
    /// Provider identifier as configured
    pub provider: String,
    #[serde(deserialize_with = "string_or_scalar")]
    pub client_id: String,
    pub client_secret: Secret,
    pub auth_url: String,
    pub token_url: String,
    pub callback_url: String,
    #[serde(deserialize_with = "string_list")]
    pub callback_urls: Vec<String>,
    #[serde(deserialize_with = "string_list")]
    pub scopes: Vec<String>,
    pub user_info_url: String,
    /// Google hosted domain hint (`hd`)
    #[serde(rename = "preferreddomain")]
    pub preferred_domain: String,
}

impl OAuthProviderConfig {
    /// Parsed provider, `None` if the identifier is not supported
    pub fn provider_kind(&self) -> Option<Provider> {
        self.provider.parse().ok()
    }

    /// Every configured callback URL, the single one first
    pub fn all_callback_urls(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.callback_url.as_str())
            .filter(|url| !url.is_empty())
            .chain(self.callback_urls.iter().map(String::as_str))
    }
}
