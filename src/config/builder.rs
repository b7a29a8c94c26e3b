//! Configuration builder
//!
//! This module resolves the configuration snapshot: it merges the ordered
//! sources, falls back to the legacy root key, fills derived defaults and
//! provisions secrets, applies the provider defaults and finally validates.

use std::env;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};

use crate::config::defaults::{self, BRANDING, CONFIG_ENV, OAUTH_KEY, ROOT_ENV};
use crate::config::error::{ConfigError, Result};
use crate::config::legacy::migrate_if_needed;
use crate::config::secret::{generate_session_key, get_or_create_secret};
use crate::config::snapshot::Snapshot;
use crate::config::source::{ConfigSource, DefaultSource, EnvSource, FileSource};
use crate::config::tree::ConfigTree;
use crate::config::types::Settings;
use crate::config::validator::validate_config;
use crate::oauth::{apply_provider_defaults, OAuthProviderConfig};

/// Directories the configuration is read from and secrets are stored in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locations {
    root: PathBuf,
}

impl Locations {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// `AUTHGATE_ROOT` if set, otherwise the directory holding the executable
    pub fn from_env(env: &EnvSource) -> Result<Self> {
        if let Some(root) = env.get(ROOT_ENV) {
            info!("set root directory from {} env var: {}", ROOT_ENV, root);
            return Ok(Self::new(root));
        }

        let exe = env::current_exe()
            .map_err(|e| ConfigError::Invalid(format!("cannot locate the executable: {}", e)))?;
        let root = exe.parent().map(Path::to_path_buf).unwrap_or_default();
        debug!("root directory: {}", root.display());
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `<root>/config`
    pub fn config_dir(&self) -> PathBuf {
        self.root.join(defaults::DEFAULT_CONFIG_DIR)
    }

    /// `<root>/config/secret`
    pub fn secret_file(&self) -> PathBuf {
        self.config_dir().join(defaults::SECRET_FILE)
    }

    /// `<root>/config/config.yml`
    pub fn default_config_file(&self) -> PathBuf {
        self.config_dir().join(defaults::DEFAULT_CONFIG_FILE)
    }
}

/// Configuration builder
///
/// Sources are applied in a fixed order: packaged defaults, the override
/// file, then environment variables.
pub struct ConfigBuilder {
    locations: Locations,
    env: EnvSource,
    cli_config: Option<PathBuf>,
    port_override: Option<u16>,
    validate: bool,
}

impl ConfigBuilder {
    /// Create a builder reading the process environment
    pub fn new(locations: Locations) -> Self {
        Self {
            locations,
            env: EnvSource::from_process(),
            cli_config: None,
            port_override: None,
            validate: true,
        }
    }

    /// Replace the environment snapshot
    pub fn with_env(mut self, env: EnvSource) -> Self {
        self.env = env;
        self
    }

    /// Override file given on the command line
    pub fn with_cli_config<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.cli_config = Some(path.as_ref().to_path_buf());
        self
    }

    /// Port given on the command line, applied after all defaults
    pub fn with_port_override(mut self, port: Option<u16>) -> Self {
        self.port_override = port;
        self
    }

    /// Disable validation
    pub fn without_validation(mut self) -> Self {
        self.validate = false;
        self
    }

    /// Override file by precedence: `AUTHGATE_CONFIG`, the command line, `<root>/config/config.yml`
    pub fn override_file(&self) -> PathBuf {
        if let Some(path) = self.env.get(CONFIG_ENV) {
            let path = absolute(Path::new(path));
            info!("config file set by {} env var: {}", CONFIG_ENV, path.display());
            return path;
        }
        if let Some(path) = &self.cli_config {
            info!("config file set on command line: {}", path.display());
            return path.clone();
        }
        self.locations.default_config_file()
    }

    /// Ordered source list, lowest precedence first
    fn sources(&self) -> Vec<Box<dyn ConfigSource>> {
        vec![
            Box::new(DefaultSource::packaged(&self.locations.config_dir())),
            Box::new(FileSource::new(self.override_file())),
            Box::new(self.env.clone()),
        ]
    }

    /// Merge every source into a single tree
    pub fn load_tree(&self) -> Result<ConfigTree> {
        let mut tree = ConfigTree::new();
        for source in self.sources() {
            let source_type = source.source_type();
            match source.load()? {
                Some(partial) => {
                    debug!("Merging configuration from source: {}", source_type);
                    tree.merge(partial);
                }
                None => debug!("No configuration from source: {}", source_type),
            }
        }
        Ok(tree)
    }

    /// Resolve, default and validate the configuration
    pub fn build(self) -> Result<Snapshot> {
        let tree = self.load_tree()?;

        let settings: Settings = tree.unmarshal_key(BRANDING.lc_name)?;
        let (settings, root_key) = migrate_if_needed(settings, &tree);
        let mut settings = apply_settings_defaults(settings, &tree, root_key, &self.locations)?;
        if let Some(port) = self.port_override {
            debug!("port set on command line: {}", port);
            settings.port = port;
        }

        let oauth: OAuthProviderConfig = tree.unmarshal_key(OAUTH_KEY)?;
        let (oauth, client) = apply_provider_defaults(oauth);

        let snapshot = Snapshot::from_parts(settings, oauth, client, tree, root_key);

        if self.validate {
            debug!("Validating configuration");
            validate_config(&snapshot)?;
        }

        Ok(snapshot)
    }
}

/// Fill values derived from other settings and provision missing secrets
fn apply_settings_defaults(
    mut settings: Settings,
    tree: &ConfigTree,
    root_key: &str,
    locations: &Locations,
) -> Result<Settings> {
    let is_set = |path: &str| tree.is_set(&defaults::key(root_key, path));

    if !is_set("jwt.secret") {
        settings.jwt.secret = get_or_create_secret(&locations.secret_file())?;
    }

    if !is_set("cookie.maxAge") {
        settings.cookie.max_age = settings.jwt.max_age;
    } else if settings.cookie.max_age > settings.jwt.max_age {
        warn!(
            "setting `{root}.cookie.maxage` to `{root}.jwt.maxage` value of {} minutes (currently set to {} minutes)",
            settings.jwt.max_age,
            settings.cookie.max_age,
            root = root_key
        );
        settings.cookie.max_age = settings.jwt.max_age;
    }

    if !is_set("session.key") {
        settings.session.key = generate_session_key()?;
    }

    if is_set("test_url") {
        settings.test_urls.push(settings.test_url.clone());
    }

    if !is_set("webapp") {
        settings.web_app = false;
    }

    Ok(settings)
}

fn absolute(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    match env::current_dir() {
        Ok(cwd) => cwd.join(path),
        Err(_) => path.to_path_buf(),
    }
}

/// Resolve the configuration the way the server does at startup
pub fn auto_load(cli_config: Option<&Path>, port: Option<u16>) -> Result<Snapshot> {
    let env = EnvSource::from_process();
    let locations = Locations::from_env(&env)?;
    let mut builder = ConfigBuilder::new(locations)
        .with_env(env)
        .with_port_override(port);
    if let Some(path) = cli_config {
        builder = builder.with_cli_config(path);
    }
    builder.build()
}
