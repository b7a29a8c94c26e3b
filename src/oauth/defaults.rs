//! Provider specific defaulting
//!
//! Each provider with special handling has one entry in [`PROFILES`]: a pure
//! function filling unset descriptor fields and a client constructor.
//! Providers without an entry use [`GENERIC`].

use log::debug;

use crate::oauth::client::{Endpoint, OAuthClient};
use crate::oauth::provider::{OAuthProviderConfig, Provider};

pub const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/auth";
pub const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
pub const GOOGLE_USER_INFO_URL: &str = "https://www.googleapis.com/oauth2/v3/userinfo";
pub const GOOGLE_SCOPE: &str = "email";

pub const GITHUB_AUTH_URL: &str = "https://github.com/login/oauth/authorize";
pub const GITHUB_TOKEN_URL: &str = "https://github.com/login/oauth/access_token";
pub const GITHUB_USER_INFO_URL: &str = "https://api.github.com/user?access_token=";
pub const GITHUB_SCOPE: &str = "read:user";

/// Defaulting and client construction for one provider
pub struct ProviderProfile {
    pub provider: Option<Provider>,
    pub configure: fn(OAuthProviderConfig) -> OAuthProviderConfig,
    pub client: fn(&OAuthProviderConfig) -> OAuthClient,
}

pub static PROFILES: [ProviderProfile; 3] = [
    ProviderProfile {
        provider: Some(Provider::Google),
        configure: configure_google,
        client: google_client,
    },
    ProviderProfile {
        provider: Some(Provider::GitHub),
        configure: configure_github,
        client: OAuthClient::from_provider,
    },
    ProviderProfile {
        provider: Some(Provider::Adfs),
        configure: keep,
        client: adfs_client,
    },
];

/// IndieAuth, OIDC, OpenStax, HomeAssistant and unknown identifiers
pub static GENERIC: ProviderProfile = ProviderProfile {
    provider: None,
    configure: keep,
    client: OAuthClient::from_provider,
};

/// Profile responsible for the descriptor's provider
pub fn profile_for(config: &OAuthProviderConfig) -> &'static ProviderProfile {
    let kind = config.provider_kind();
    PROFILES
        .iter()
        .find(|profile| kind.is_some() && profile.provider == kind)
        .unwrap_or(&GENERIC)
}

/// Fill provider defaults and build the matching OAuth client
///
/// Exactly one profile runs. Unknown providers take the generic path and are
/// rejected later by validation.
pub fn apply_provider_defaults(config: OAuthProviderConfig) -> (OAuthProviderConfig, OAuthClient) {
    let profile = profile_for(&config);
    debug!(
        "applying oauth defaults for provider '{}' ({})",
        config.provider,
        profile.provider.map_or("generic", |p| p.as_str())
    );
    let config = (profile.configure)(config);
    let client = (profile.client)(&config);
    (config, client)
}

fn keep(config: OAuthProviderConfig) -> OAuthProviderConfig {
    config
}

fn configure_google(mut config: OAuthProviderConfig) -> OAuthProviderConfig {
    config.user_info_url = GOOGLE_USER_INFO_URL.to_string();
    if config.scopes.is_empty() {
        config.scopes = vec![GOOGLE_SCOPE.to_string()];
    }
    config
}

// Google always talks to its well-known endpoints. The redirect URL is left
// empty; the login handler picks a callback per request.
fn google_client(config: &OAuthProviderConfig) -> OAuthClient {
    let client = OAuthClient {
        client_id: config.client_id.clone(),
        client_secret: config.client_secret.clone(),
        endpoint: Endpoint {
            auth_url: GOOGLE_AUTH_URL.to_string(),
            token_url: GOOGLE_TOKEN_URL.to_string(),
        },
        redirect_url: String::new(),
        scopes: config.scopes.clone(),
        auth_param: None,
    };
    if config.preferred_domain.is_empty() {
        client
    } else {
        debug!(
            "setting Google OAuth preferred login domain param 'hd' to {}",
            config.preferred_domain
        );
        client.with_auth_param("hd", config.preferred_domain.clone())
    }
}

fn configure_github(mut config: OAuthProviderConfig) -> OAuthProviderConfig {
    fill(&mut config.auth_url, GITHUB_AUTH_URL);
    fill(&mut config.token_url, GITHUB_TOKEN_URL);
    fill(&mut config.user_info_url, GITHUB_USER_INFO_URL);
    if config.scopes.is_empty() {
        config.scopes = vec![GITHUB_SCOPE.to_string()];
    }
    config
}

// ADFS only includes claims in the id token when `resource` is requested
fn adfs_client(config: &OAuthProviderConfig) -> OAuthClient {
    debug!("setting ADFS OAuth param 'resource' to {}", config.callback_url);
    OAuthClient::from_provider(config).with_auth_param("resource", config.callback_url.clone())
}

fn fill(field: &mut String, default: &str) {
    if field.is_empty() {
        *field = default.to_string();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::types::Secret;

    fn descriptor(provider: &str) -> OAuthProviderConfig {
        OAuthProviderConfig {
            provider: provider.to_string(),
            client_id: "client".to_string(),
            client_secret: Secret::new("secret"),
            callback_url: "https://login.example.com/auth".to_string(),
            ..Default::default()
        }
    }

    fn assert_idempotent(config: OAuthProviderConfig) {
        let (once, client_once) = apply_provider_defaults(config);
        let (twice, client_twice) = apply_provider_defaults(once.clone());
        assert_eq!(once, twice);
        assert_eq!(client_once, client_twice);
    }

    #[test]
    fn test_google_defaults() {
        let mut config = descriptor("google");
        config.user_info_url = "https://elsewhere.example.com/me".to_string();

        let (config, client) = apply_provider_defaults(config);
        assert_eq!(config.user_info_url, GOOGLE_USER_INFO_URL);
        assert_eq!(config.scopes, vec!["email"]);
        assert_eq!(client.endpoint.auth_url, GOOGLE_AUTH_URL);
        assert_eq!(client.endpoint.token_url, GOOGLE_TOKEN_URL);
        assert_eq!(client.redirect_url, "");
        assert!(client.auth_param.is_none());
    }

    #[test]
    fn test_google_keeps_configured_scopes() {
        let mut config = descriptor("google");
        config.scopes = vec!["openid".to_string(), "profile".to_string()];

        let (config, client) = apply_provider_defaults(config);
        assert_eq!(config.scopes, vec!["openid", "profile"]);
        assert_eq!(client.scopes, config.scopes);
    }

    #[test]
    fn test_google_preferred_domain_sets_hd() {
        let mut config = descriptor("google");
        config.preferred_domain = "example.com".to_string();

        let (_, client) = apply_provider_defaults(config);
        let param = client.auth_param.unwrap();
        assert_eq!(param.key, "hd");
        assert_eq!(param.value, "example.com");
    }

    #[test]
    fn test_github_fills_only_unset_fields() {
        let mut config = descriptor("github");
        config.auth_url = "https://ghe.example.com/login/oauth/authorize".to_string();

        let (config, client) = apply_provider_defaults(config);
        assert_eq!(config.auth_url, "https://ghe.example.com/login/oauth/authorize");
        assert_eq!(config.token_url, GITHUB_TOKEN_URL);
        assert_eq!(config.user_info_url, GITHUB_USER_INFO_URL);
        assert_eq!(config.scopes, vec!["read:user"]);
        assert_eq!(client.endpoint.auth_url, config.auth_url);
        assert_eq!(client.redirect_url, config.callback_url);
        assert!(client.auth_param.is_none());
    }

    #[test]
    fn test_adfs_sets_resource_param() {
        let (config, client) = apply_provider_defaults(descriptor("adfs"));
        let param = client.auth_param.unwrap();
        assert_eq!(param.key, "resource");
        assert_eq!(param.value, config.callback_url);
    }

    #[test]
    fn test_generic_providers_are_untouched() {
        for provider in ["indieauth", "oidc", "openstax", "homeassistant", "facebook"] {
            let config = descriptor(provider);
            let (defaulted, client) = apply_provider_defaults(config.clone());
            assert_eq!(defaulted, config, "{} should not be defaulted", provider);
            assert_eq!(client, OAuthClient::from_provider(&config));
        }
    }

    #[test]
    fn test_dispatch_picks_one_profile() {
        assert_eq!(profile_for(&descriptor("google")).provider, Some(Provider::Google));
        assert_eq!(profile_for(&descriptor("github")).provider, Some(Provider::GitHub));
        assert_eq!(profile_for(&descriptor("adfs")).provider, Some(Provider::Adfs));
        assert_eq!(profile_for(&descriptor("oidc")).provider, None);
        assert_eq!(profile_for(&descriptor("")).provider, None);
    }

    #[test]
    fn test_defaulting_is_idempotent() {
        let mut google = descriptor("google");
        google.preferred_domain = "example.com".to_string();
        assert_idempotent(google);
        assert_idempotent(descriptor("github"));
        assert_idempotent(descriptor("adfs"));
        assert_idempotent(descriptor("oidc"));
    }
}
