//! Resolved configuration snapshot

use std::path::Path;

use log::info;

use crate::common::net::listen_address;
use crate::config::builder::{ConfigBuilder, Locations};
use crate::config::defaults;
use crate::config::error::Result;
use crate::config::source::EnvSource;
use crate::config::tree::ConfigTree;
use crate::config::types::Settings;
use crate::oauth::{OAuthClient, OAuthProviderConfig};

/// Fully merged, defaulted and validated configuration
///
/// Built once by [`ConfigBuilder`] and never mutated afterwards.
#[derive(Debug, Clone)]
pub struct Snapshot {
    settings: Settings,
    oauth: OAuthProviderConfig,
    client: OAuthClient,
    tree: ConfigTree,
    root_key: &'static str,
}

impl Snapshot {
    /// Assemble a snapshot from resolved parts
    pub fn from_parts(
        settings: Settings,
        oauth: OAuthProviderConfig,
        client: OAuthClient,
        tree: ConfigTree,
        root_key: &'static str,
    ) -> Self {
        Self {
            settings,
            oauth,
            client,
            tree,
            root_key,
        }
    }

    /// Resolve from scratch with `config_path` as the override document
    ///
    /// The directory holding the document is used as the root directory, so
    /// generated secrets land next to it. The process environment is ignored.
    pub fn for_tests(config_path: &Path) -> Result<Self> {
        let root = config_path.parent().unwrap_or_else(|| Path::new("."));
        ConfigBuilder::new(Locations::new(root))
            .with_env(EnvSource::default())
            .with_cli_config(config_path)
            .build()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// OAuth provider descriptor after defaulting
    pub fn oauth(&self) -> &OAuthProviderConfig {
        &self.oauth
    }

    pub fn client(&self) -> &OAuthClient {
        &self.client
    }

    pub fn tree(&self) -> &ConfigTree {
        &self.tree
    }

    /// Root key the settings were read from (current or legacy)
    pub fn root_key(&self) -> &'static str {
        self.root_key
    }

    /// Whether any source explicitly set the dotted key
    pub fn is_set(&self, key: &str) -> bool {
        self.tree.is_set(key)
    }

    /// Whether a key below the active root key was explicitly set
    pub fn is_setting_set(&self, path: &str) -> bool {
        self.tree.is_set(&defaults::key(self.root_key, path))
    }

    /// `host:port` the server listens on
    pub fn listen_address(&self) -> String {
        listen_address(&self.settings.listen, self.settings.port)
    }
}

/// Log the final configuration; secrets are shown by length and fingerprint only
pub fn log_config(snapshot: &Snapshot) {
    let s = snapshot.settings();
    let o = snapshot.oauth();

    info!("Configuration (root key '{}'):", snapshot.root_key());
    info!("  listen: {}", snapshot.listen_address());
    info!("  healthcheck: {}", s.health_check);
    info!("  loglevel: {}", s.log_level);
    info!("  domains: {:?}", s.domains);
    info!("  whitelist: {:?}", s.whitelist);
    info!("  allowAllUsers: {}", s.allow_all_users);
    info!("  publicAccess: {}", s.public_access);
    info!(
        "  jwt: maxAge={} issuer={} compress={} secret={}",
        s.jwt.max_age, s.jwt.issuer, s.jwt.compress, s.jwt.secret
    );
    info!(
        "  cookie: name={} domain={} secure={} httpOnly={} maxAge={}",
        s.cookie.name, s.cookie.domain, s.cookie.secure, s.cookie.http_only, s.cookie.max_age
    );
    info!("  session: name={} key={}", s.session.name, s.session.key);
    info!("  headers: {:?}", s.headers);
    info!("  db.file: {}", s.db.file);
    if s.testing {
        info!("  testing: true test_urls={:?}", s.test_urls);
    }
    info!("  webapp: {}", s.web_app);
    info!(
        "  oauth: provider={} client_id={} client_secret={} callback_url={} callback_urls={:?}",
        o.provider, o.client_id, o.client_secret, o.callback_url, o.callback_urls
    );
    info!(
        "  oauth: auth_url={} token_url={} user_info_url={} scopes={:?}",
        o.auth_url, o.token_url, o.user_info_url, o.scopes
    );
    if let Some(param) = &snapshot.client().auth_param {
        info!("  oauth: auth param {}={}", param.key, param.value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_accessors() {
        let tree = ConfigTree::from_value(json!({
            "gatekeeper": {"domains": ["example.com"], "port": 9090}
        }));
        let settings: Settings = tree.unmarshal_key("gatekeeper").unwrap();
        let snapshot = Snapshot::from_parts(
            settings,
            OAuthProviderConfig::default(),
            OAuthClient::default(),
            tree,
            "gatekeeper",
        );

        assert_eq!(snapshot.root_key(), "gatekeeper");
        assert!(snapshot.is_setting_set("domains"));
        assert!(!snapshot.is_setting_set("allowAllUsers"));
        assert!(snapshot.is_set("gatekeeper.port"));
        assert_eq!(snapshot.listen_address(), "0.0.0.0:9090");
    }
}
