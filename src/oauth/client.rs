//! Provider-agnostic OAuth client descriptor

use crate::config::types::Secret;
use crate::oauth::provider::OAuthProviderConfig;

/// Authorization and token endpoints
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Endpoint {
    pub auth_url: String,
    pub token_url: String,
}

/// Extra query parameter added to the authorization request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUrlParam {
    pub key: &'static str,
    pub value: String,
}

/// Client used by the token exchange flow
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OAuthClient {
    pub client_id: String,
    pub client_secret: Secret,
    pub endpoint: Endpoint,
    pub redirect_url: String,
    pub scopes: Vec<String>,
    /// At most one provider-specific authorization parameter (`hd`, `resource`)
    pub auth_param: Option<AuthUrlParam>,
}

impl OAuthClient {
    /// Build a client verbatim from a provider descriptor
    pub fn from_provider(config: &OAuthProviderConfig) -> Self {
        Self {
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            endpoint: Endpoint {
                auth_url: config.auth_url.clone(),
                token_url: config.token_url.clone(),
            },
            redirect_url: config.callback_url.clone(),
            scopes: config.scopes.clone(),
            auth_param: None,
        }
    }

    /// Attach the authorization request parameter
    pub fn with_auth_param(mut self, key: &'static str, value: impl Into<String>) -> Self {
        self.auth_param = Some(AuthUrlParam {
            key,
            value: value.into(),
        });
        self
    }
}
