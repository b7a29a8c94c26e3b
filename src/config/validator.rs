//! Configuration validator
//!
//! Hard checks run in a fixed order and stop at the first violation. Short
//! secrets are reported as warnings only.

use log::{debug, error};

use crate::config::defaults::{self, CALLBACK_PATH_MARKER, MIN_SECRET_LENGTH, REQUIRED_OPTIONS};
use crate::config::error::{ConfigError, Result};
use crate::config::snapshot::Snapshot;
use crate::oauth::Provider;

/// Validate a resolved snapshot, returning the first violated invariant
pub fn validate_config(snapshot: &Snapshot) -> Result<()> {
    let provider = validate_provider(snapshot)?;
    validate_required_options(snapshot)?;
    validate_access_policy(snapshot)?;
    validate_provider_fields(snapshot, provider)?;
    validate_callback_urls(snapshot)?;

    for warning in snapshot.check_warnings() {
        error!("{}", warning);
    }

    validate_max_ages(snapshot)
}

/// The provider identifier must be one of the supported set
fn validate_provider(snapshot: &Snapshot) -> Result<Provider> {
    snapshot.oauth().provider.parse()
}

/// Required options must come from a source, not from a fallback value
fn validate_required_options(snapshot: &Snapshot) -> Result<()> {
    for option in REQUIRED_OPTIONS {
        if !snapshot.is_set(option) {
            return Err(ConfigError::MissingRequired(option.to_string()));
        }
    }
    Ok(())
}

/// Either the domain list or the allow-all flag must be configured
fn validate_access_policy(snapshot: &Snapshot) -> Result<()> {
    if !snapshot.is_setting_set("allowAllUsers") && !snapshot.is_setting_set("domains") {
        return Err(ConfigError::Invalid(format!(
            "either one of {} or {} needs to be set (but not both)",
            defaults::key(snapshot.root_key(), "domains"),
            defaults::key(snapshot.root_key(), "allowAllUsers"),
        )));
    }
    Ok(())
}

fn validate_provider_fields(snapshot: &Snapshot, provider: Provider) -> Result<()> {
    let oauth = snapshot.oauth();

    if oauth.client_id.is_empty() {
        return Err(ConfigError::MissingValue("oauth.client_id".to_string()));
    }
    if provider.requires_client_secret() && oauth.client_secret.is_empty() {
        return Err(ConfigError::MissingValue("oauth.client_secret".to_string()));
    }
    if provider.requires_auth_url() && oauth.auth_url.is_empty() {
        return Err(ConfigError::MissingValue("oauth.auth_url".to_string()));
    }
    if provider.requires_user_info_url() && oauth.user_info_url.is_empty() {
        return Err(ConfigError::MissingValue("oauth.user_info_url".to_string()));
    }
    Ok(())
}

/// Unless `allowAllUsers` is configured, callbacks must land on a cookie domain
///
/// Any explicit `allowAllUsers` value, `false` included, skips the check.
fn validate_callback_urls(snapshot: &Snapshot) -> Result<()> {
    if snapshot.is_setting_set("allowAllUsers") {
        return Ok(());
    }
    let settings = snapshot.settings();

    for url in snapshot.oauth().all_callback_urls() {
        check_callback_url(url, &settings.domains)?;
    }
    Ok(())
}

/// Check one callback URL against the configured cookie domains
pub fn check_callback_url(url: &str, domains: &[String]) -> Result<()> {
    if !domains.iter().any(|domain| url.contains(domain.as_str())) {
        return Err(ConfigError::InvalidCallback {
            url: url.to_string(),
            reason: format!(
                "must be within the configured domain where the cookie will be set {:?}",
                domains
            ),
        });
    }

    if !url.contains(CALLBACK_PATH_MARKER) {
        return Err(ConfigError::InvalidCallback {
            url: url.to_string(),
            reason: format!("must contain '{}'", CALLBACK_PATH_MARKER),
        });
    }
    Ok(())
}

fn validate_max_ages(snapshot: &Snapshot) -> Result<()> {
    let settings = snapshot.settings();
    let cookie = settings.cookie.max_age;
    let jwt = settings.jwt.max_age;

    if cookie < 0 {
        return Err(ConfigError::Invalid(format!(
            "cookie maxAge cannot be lower than 0 (currently: {})",
            cookie
        )));
    }
    if jwt <= 0 {
        return Err(ConfigError::Invalid(format!(
            "JWT maxAge cannot be zero or lower (currently: {})",
            jwt
        )));
    }
    if cookie > jwt {
        return Err(ConfigError::Invalid(format!(
            "Cookie maxAge ({}) cannot be larger than the JWT maxAge ({})",
            cookie, jwt
        )));
    }
    Ok(())
}

/// Configuration validator trait
pub trait ConfigValidator {
    /// Check configuration for warnings
    fn check_warnings(&self) -> Vec<String>;
}

impl ConfigValidator for Snapshot {
    fn check_warnings(&self) -> Vec<String> {
        let settings = self.settings();
        let mut warnings = Vec::new();

        let secrets = [
            ("jwt.secret", "secret", settings.jwt.secret.len()),
            ("session.key", "session key", settings.session.key.len()),
        ];
        for (path, name, len) in secrets {
            let key = defaults::key(self.root_key(), path);
            debug!("{} is {} characters long", key, len);
            if len < MIN_SECRET_LENGTH {
                warnings.push(format!(
                    "Your {} is too short! ({} characters long). Please consider deleting {} to automatically generate a secret of {} characters",
                    name, len, key, MIN_SECRET_LENGTH
                ));
            }
        }

        warnings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::tree::ConfigTree;
    use crate::config::types::Settings;
    use crate::oauth::{apply_provider_defaults, OAuthProviderConfig};
    use serde_json::{json, Value};

    const SECRET: &str = "0123456789012345678901234567890123456789abcd";

    /// A snapshot that passes every check, with `overrides` merged on top
    fn snapshot(overrides: Value) -> Snapshot {
        let mut tree = ConfigTree::from_value(json!({
            "authgate": {
                "domains": ["example.com"],
                "jwt": {"maxage": 240, "secret": SECRET},
                "cookie": {"maxage": 240},
                "session": {"key": SECRET}
            },
            "oauth": {
                "provider": "github",
                "client_id": "client",
                "client_secret": "secret",
                "callback_url": "https://login.example.com/auth"
            }
        }));
        tree.merge(ConfigTree::from_value(overrides));

        let settings: Settings = tree.unmarshal_key("authgate").unwrap();
        let oauth: OAuthProviderConfig = tree.unmarshal_key("oauth").unwrap();
        let (oauth, client) = apply_provider_defaults(oauth);
        Snapshot::from_parts(settings, oauth, client, tree, "authgate")
    }

    fn error_of(overrides: Value) -> String {
        validate_config(&snapshot(overrides)).unwrap_err().to_string()
    }

    #[test]
    fn test_valid_configuration() {
        assert!(validate_config(&snapshot(json!({}))).is_ok());
    }

    #[test]
    fn test_unknown_provider_is_named() {
        let err = error_of(json!({"oauth": {"provider": "myspace"}}));
        assert!(err.contains("myspace"), "{}", err);
    }

    #[test]
    fn test_provider_checked_before_required_options() {
        let tree = ConfigTree::from_value(json!({"oauth": {"provider": "myspace"}}));
        let oauth: OAuthProviderConfig = tree.unmarshal_key("oauth").unwrap();
        let snapshot = Snapshot::from_parts(
            Settings::default(),
            oauth,
            Default::default(),
            tree,
            "authgate",
        );
        assert!(matches!(
            validate_config(&snapshot),
            Err(ConfigError::UnknownProvider(p)) if p == "myspace"
        ));
    }

    #[test]
    fn test_required_option_must_be_set() {
        let tree = ConfigTree::from_value(json!({
            "authgate": {"allowallusers": true},
            "oauth": {"provider": "google"}
        }));
        let oauth: OAuthProviderConfig = tree.unmarshal_key("oauth").unwrap();
        let snapshot = Snapshot::from_parts(
            tree.unmarshal_key("authgate").unwrap(),
            oauth,
            Default::default(),
            tree,
            "authgate",
        );
        match validate_config(&snapshot) {
            Err(ConfigError::MissingRequired(key)) => assert_eq!(key, "oauth.client_id"),
            other => panic!("expected MissingRequired, got {:?}", other),
        }
    }

    #[test]
    fn test_domains_or_allow_all_users() {
        let tree = ConfigTree::from_value(json!({
            "authgate": {"jwt": {"maxage": 240}},
            "oauth": {"provider": "github", "client_id": "client"}
        }));
        let snapshot = Snapshot::from_parts(
            tree.unmarshal_key("authgate").unwrap(),
            tree.unmarshal_key("oauth").unwrap(),
            Default::default(),
            tree,
            "authgate",
        );
        let err = validate_config(&snapshot).unwrap_err().to_string();
        assert!(err.contains("authgate.domains"), "{}", err);
        assert!(err.contains("authgate.allowAllUsers"), "{}", err);
    }

    #[test]
    fn test_client_secret_requirement_depends_on_provider() {
        let err = error_of(json!({"oauth": {"client_secret": ""}}));
        assert!(err.contains("oauth.client_secret"), "{}", err);

        let oidc = json!({"oauth": {
            "provider": "oidc",
            "client_secret": "",
            "auth_url": "https://idp.example.com/authorize",
            "user_info_url": "https://idp.example.com/userinfo"
        }});
        assert!(validate_config(&snapshot(oidc)).is_ok());
    }

    #[test]
    fn test_auth_url_required_except_google() {
        let err = error_of(json!({"oauth": {"provider": "oidc", "user_info_url": "https://idp.example.com/me"}}));
        assert!(err.contains("oauth.auth_url"), "{}", err);

        assert!(validate_config(&snapshot(json!({"oauth": {"provider": "google"}}))).is_ok());
    }

    #[test]
    fn test_user_info_url_required_for_generic_providers() {
        let err = error_of(json!({"oauth": {"provider": "openstax", "auth_url": "https://accounts.openstax.org/oauth/authorize"}}));
        assert!(err.contains("oauth.user_info_url"), "{}", err);

        let adfs = json!({"oauth": {"provider": "adfs", "auth_url": "https://adfs.example.com/adfs/oauth2/authorize"}});
        assert!(validate_config(&snapshot(adfs)).is_ok());
    }

    #[test]
    fn test_callback_url_domain_and_marker() {
        let example = vec!["example.com".to_string()];
        let other = vec!["other.com".to_string()];
        let url = "https://app.example.com/auth/callback";

        assert!(check_callback_url(url, &example).is_ok());
        assert!(matches!(
            check_callback_url(url, &other),
            Err(ConfigError::InvalidCallback { url: u, .. }) if u == url
        ));
        assert!(check_callback_url("https://app.example.com/login", &example).is_err());
        assert!(check_callback_url("https://app.other.com/callback", &other).is_err());
    }

    #[test]
    fn test_every_callback_url_is_checked() {
        let err = error_of(json!({"oauth": {"callback_urls": [
            "https://a.example.com/auth",
            "https://b.elsewhere.org/auth"
        ]}}));
        assert!(err.contains("https://b.elsewhere.org/auth"), "{}", err);
    }

    #[test]
    fn test_allow_all_users_skips_callback_check() {
        let overrides = json!({
            "authgate": {"allowallusers": true},
            "oauth": {"callback_url": "https://login.elsewhere.org/auth"}
        });
        assert!(validate_config(&snapshot(overrides)).is_ok());
    }

    #[test]
    fn test_explicit_allow_all_users_false_skips_callback_check() {
        let tree = ConfigTree::from_value(json!({
            "authgate": {
                "allowallusers": false,
                "jwt": {"maxage": 240, "secret": SECRET},
                "cookie": {"maxage": 240},
                "session": {"key": SECRET}
            },
            "oauth": {
                "provider": "github",
                "client_id": "client",
                "client_secret": "secret",
                "callback_url": "https://app.example.com/auth"
            }
        }));
        let oauth: OAuthProviderConfig = tree.unmarshal_key("oauth").unwrap();
        let (oauth, client) = apply_provider_defaults(oauth);
        let snapshot = Snapshot::from_parts(
            tree.unmarshal_key("authgate").unwrap(),
            oauth,
            client,
            tree,
            "authgate",
        );
        assert!(validate_config(&snapshot).is_ok());
    }

    #[test]
    fn test_cookie_max_age_not_negative() {
        let err = error_of(json!({"authgate": {"cookie": {"maxage": -1}}}));
        assert!(err.contains("cookie maxAge"), "{}", err);
    }

    #[test]
    fn test_jwt_max_age_positive() {
        let zero = json!({"authgate": {"jwt": {"maxage": 0}, "cookie": {"maxage": 0}}});
        assert!(error_of(zero).contains("JWT maxAge"));

        let one = json!({"authgate": {"jwt": {"maxage": 1}, "cookie": {"maxage": 1}}});
        assert!(validate_config(&snapshot(one)).is_ok());
    }

    #[test]
    fn test_cookie_max_age_within_jwt_max_age() {
        let longer = json!({"authgate": {"jwt": {"maxage": 60}, "cookie": {"maxage": 120}}});
        let err = error_of(longer);
        assert!(err.contains("(120)") && err.contains("(60)"), "{}", err);

        let equal = json!({"authgate": {"jwt": {"maxage": 60}, "cookie": {"maxage": 60}}});
        assert!(validate_config(&snapshot(equal)).is_ok());
    }

    #[test]
    fn test_short_secrets_are_warnings() {
        assert!(snapshot(json!({})).check_warnings().is_empty());

        let snapshot = snapshot(json!({"authgate": {"jwt": {"secret": "short"}}}));
        let warnings = snapshot.check_warnings();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("authgate.jwt.secret"));
        assert!(warnings[0].contains("(5 characters long)"));
        assert!(validate_config(&snapshot).is_ok());
    }
}
