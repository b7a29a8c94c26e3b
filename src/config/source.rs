//! Configuration sources
//!
//! This module defines the ordered configuration tiers. Each source yields a
//! partial tree; the builder merges them left to right, so later sources win
//! on the keys they set and never on keys they leave out.

use std::collections::HashMap;
use std::env;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use ::config::{Config, File, FileFormat};
use log::{debug, info, warn};
use serde_json::Value;

use crate::config::defaults::{self, BRANDING, EMBEDDED_DEFAULTS, OAUTH_KEY};
use crate::config::error::{ConfigError, Result};
use crate::config::tree::ConfigTree;
use crate::config::types::split_list;

/// Source of a configuration value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueSource {
    /// Packaged defaults
    Default,
    /// Override configuration file
    File,
    /// Environment variable
    Environment,
}

impl std::fmt::Display for ValueSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValueSource::Default => write!(f, "defaults"),
            ValueSource::File => write!(f, "file"),
            ValueSource::Environment => write!(f, "environment"),
        }
    }
}

/// Configuration source trait
pub trait ConfigSource {
    /// Load the partial tree of this source
    ///
    /// `Ok(None)` means the source is absent, which is not an error.
    fn load(&self) -> Result<Option<ConfigTree>>;

    /// Get the source type
    fn source_type(&self) -> ValueSource;
}

/// Parse a document with the `config` crate and normalize it into a tree
pub fn parse_document(text: &str, format: FileFormat) -> std::result::Result<ConfigTree, ::config::ConfigError> {
    let value: Value = Config::builder()
        .add_source(File::from_str(text, format))
        .build()?
        .try_deserialize()?;
    Ok(ConfigTree::from_value(value))
}

/// Pick the document format from a file extension; YAML unless it says JSON
pub fn format_for(path: &Path) -> FileFormat {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("json") => FileFormat::Json,
        _ => FileFormat::Yaml,
    }
}

/// Packaged defaults
///
/// Reads the defaults file when one is installed next to the binary,
/// otherwise the copy embedded at compile time. Failing to parse the
/// defaults is always fatal.
pub struct DefaultSource {
    pub path: Option<PathBuf>,
}

impl DefaultSource {
    /// Defaults embedded in the binary
    pub fn embedded() -> Self {
        Self { path: None }
    }

    /// Defaults installed at `<config_dir>/.defaults.yml`, falling back to the embedded copy
    pub fn packaged(config_dir: &Path) -> Self {
        let path = config_dir.join(defaults::DEFAULTS_FILE);
        if path.is_file() {
            Self { path: Some(path) }
        } else {
            Self::embedded()
        }
    }
}

impl ConfigSource for DefaultSource {
    fn load(&self) -> Result<Option<ConfigTree>> {
        let tree = match &self.path {
            Some(path) => {
                debug!("Loading default config from {}", path.display());
                let text = fs::read_to_string(path)
                    .map_err(|e| ConfigError::Defaults(format!("{}: {}", path.display(), e)))?;
                parse_document(&text, format_for(path))
                    .map_err(|e| ConfigError::Defaults(format!("{}: {}", path.display(), e)))?
            }
            None => {
                debug!("Loading embedded default config");
                parse_document(EMBEDDED_DEFAULTS, FileFormat::Yaml)
                    .map_err(|e| ConfigError::Defaults(e.to_string()))?
            }
        };
        Ok(Some(tree))
    }

    fn source_type(&self) -> ValueSource {
        ValueSource::Default
    }
}

/// File configuration source
pub struct FileSource {
    pub path: PathBuf,
}

impl FileSource {
    /// Create a new file source
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl ConfigSource for FileSource {
    fn load(&self) -> Result<Option<ConfigTree>> {
        debug!("Merging additional config from {}", self.path.display());

        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!("No additional config file found at {}", self.path.display());
                warn!("Will use default values unless overridden by environment variables");
                return Ok(None);
            }
            Err(e) => return Err(ConfigError::FileRead(self.path.clone(), e.to_string())),
        };

        let tree = parse_document(&text, format_for(&self.path))
            .map_err(|e| ConfigError::Parse(self.path.clone(), e.to_string()))?;

        info!("Configuration loaded from {}", self.path.display());
        Ok(Some(tree))
    }

    fn source_type(&self) -> ValueSource {
        ValueSource::File
    }
}

/// Type of a configuration key, used to coerce environment values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Str,
    Bool,
    Int,
    List,
}

/// Keys below the branding (or legacy) root that can be overridden from the environment
pub const SETTINGS_KEYS: &[(&str, ValueKind)] = &[
    ("loglevel", ValueKind::Str),
    ("listen", ValueKind::Str),
    ("port", ValueKind::Int),
    ("healthcheck", ValueKind::Bool),
    ("domains", ValueKind::List),
    ("whitelist", ValueKind::List),
    ("allowallusers", ValueKind::Bool),
    ("publicaccess", ValueKind::Bool),
    ("jwt.maxage", ValueKind::Int),
    ("jwt.issuer", ValueKind::Str),
    ("jwt.secret", ValueKind::Str),
    ("jwt.compress", ValueKind::Bool),
    ("cookie.name", ValueKind::Str),
    ("cookie.domain", ValueKind::Str),
    ("cookie.secure", ValueKind::Bool),
    ("cookie.httponly", ValueKind::Bool),
    ("cookie.maxage", ValueKind::Int),
    ("headers.jwt", ValueKind::Str),
    ("headers.user", ValueKind::Str),
    ("headers.querystring", ValueKind::Str),
    ("headers.redirect", ValueKind::Str),
    ("headers.success", ValueKind::Str),
    ("headers.claimheader", ValueKind::Str),
    ("headers.claims", ValueKind::List),
    ("headers.accesstoken", ValueKind::Str),
    ("headers.idtoken", ValueKind::Str),
    ("db.file", ValueKind::Str),
    ("session.name", ValueKind::Str),
    ("session.key", ValueKind::Str),
    ("test_url", ValueKind::Str),
    ("test_urls", ValueKind::List),
    ("testing", ValueKind::Bool),
    ("webapp", ValueKind::Bool),
];

/// Keys below `oauth` that can be overridden from the environment
pub const OAUTH_KEYS: &[(&str, ValueKind)] = &[
    ("provider", ValueKind::Str),
    ("client_id", ValueKind::Str),
    ("client_secret", ValueKind::Str),
    ("auth_url", ValueKind::Str),
    ("token_url", ValueKind::Str),
    ("callback_url", ValueKind::Str),
    ("callback_urls", ValueKind::List),
    ("scopes", ValueKind::List),
    ("user_info_url", ValueKind::Str),
    ("preferreddomain", ValueKind::Str),
];

/// Environment variable configuration source
///
/// Holds a snapshot of the variables so resolution is deterministic and
/// tests can inject their own set.
#[derive(Debug, Clone, Default)]
pub struct EnvSource {
    vars: HashMap<String, String>,
}

impl EnvSource {
    /// Snapshot the process environment
    ///
    /// Variables whose name or value is not valid UTF-8 are skipped.
    pub fn from_process() -> Self {
        let vars = env::vars_os()
            .filter_map(|(key, value)| match (key.into_string(), value.into_string()) {
                (Ok(key), Ok(value)) => Some((key, value)),
                (key, _) => {
                    debug!("ignoring non UTF-8 environment variable {:?}", key);
                    None
                }
            })
            .collect();
        Self { vars }
    }

    /// Use an explicit set of variables
    pub fn from_vars<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: vars.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }

    /// Value of a variable; empty values count as unset
    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str).filter(|v| !v.is_empty())
    }

    /// Environment variable name for a dotted key: `authgate.jwt.maxage` -> `AUTHGATE_JWT_MAXAGE`
    pub fn env_name(key: &str) -> String {
        key.replace('.', "_").to_uppercase()
    }

    /// Every overridable key with its type
    pub fn known_keys() -> Vec<(String, ValueKind)> {
        let roots = [BRANDING.lc_name, BRANDING.old_lc_name];
        let settings = roots.iter().flat_map(|root| {
            SETTINGS_KEYS
                .iter()
                .map(move |(path, kind)| (defaults::key(root, path), *kind))
        });
        let oauth = OAUTH_KEYS
            .iter()
            .map(|(path, kind)| (defaults::key(OAUTH_KEY, path), *kind));
        settings.chain(oauth).collect()
    }
}

impl ConfigSource for EnvSource {
    fn load(&self) -> Result<Option<ConfigTree>> {
        debug!("Reading environment variables for overrides");

        let mut tree = ConfigTree::new();
        for (key, kind) in Self::known_keys() {
            let name = Self::env_name(&key);
            if let Some(raw) = self.get(&name) {
                let value = coerce(kind, raw).map_err(|e| ConfigError::InvalidEnv(name.clone(), e))?;
                info!("{} overridden by environment variable {}", key, name);
                tree.set(&key, value);
            }
        }

        if tree.is_empty() {
            Ok(None)
        } else {
            Ok(Some(tree))
        }
    }

    fn source_type(&self) -> ValueSource {
        ValueSource::Environment
    }
}

fn coerce(kind: ValueKind, raw: &str) -> std::result::Result<Value, String> {
    match kind {
        ValueKind::Str => Ok(Value::String(raw.to_string())),
        ValueKind::Bool => match raw.trim().to_lowercase().as_str() {
            "1" | "t" | "true" | "yes" | "on" => Ok(Value::Bool(true)),
            "0" | "f" | "false" | "no" | "off" => Ok(Value::Bool(false)),
            other => Err(format!("expected a boolean, got '{}'", other)),
        },
        ValueKind::Int => raw
            .trim()
            .parse::<i64>()
            .map(Value::from)
            .map_err(|e| format!("expected an integer, got '{}': {}", raw, e)),
        ValueKind::List => Ok(Value::from(split_list(raw))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    #[test]
    fn test_embedded_defaults_parse() {
        let tree = DefaultSource::embedded().load().unwrap().unwrap();
        assert_eq!(tree.get("authgate.port"), Some(&json!(9090)));
        assert_eq!(tree.get("authgate.jwt.maxAge"), Some(&json!(240)));
        // Must be configured by the operator
        assert!(!tree.is_set("authgate.domains"));
        assert!(!tree.is_set("authgate.allowAllUsers"));
        assert!(!tree.is_set("oauth.provider"));
    }

    #[test]
    fn test_broken_packaged_defaults_are_fatal() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(defaults::DEFAULTS_FILE), "authgate: [unclosed").unwrap();

        let source = DefaultSource::packaged(dir.path());
        assert!(matches!(source.load(), Err(ConfigError::Defaults(_))));
    }

    #[test]
    fn test_missing_file_is_soft() {
        let dir = tempfile::tempdir().unwrap();
        let source = FileSource::new(dir.path().join("config.yml"));
        assert!(source.load().unwrap().is_none());
    }

    #[test]
    fn test_unparseable_file_is_fatal() {
        let mut file = tempfile::Builder::new().suffix(".yml").tempfile().unwrap();
        writeln!(file, "authgate:\n  port: [9090").unwrap();

        let source = FileSource::new(file.path());
        assert!(matches!(source.load(), Err(ConfigError::Parse(..))));
    }

    #[test]
    fn test_json_file() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, r#"{{"oauth": {{"provider": "github", "client_id": "abc"}}}}"#).unwrap();

        let tree = FileSource::new(file.path()).load().unwrap().unwrap();
        assert_eq!(tree.get("oauth.provider"), Some(&json!("github")));
    }

    #[test]
    fn test_env_name() {
        assert_eq!(EnvSource::env_name("authgate.jwt.maxage"), "AUTHGATE_JWT_MAXAGE");
        assert_eq!(EnvSource::env_name("oauth.client_id"), "OAUTH_CLIENT_ID");
        assert_eq!(EnvSource::env_name("authgate.test_url"), "AUTHGATE_TEST_URL");
    }

    #[test]
    fn test_env_values_are_coerced() {
        let env = EnvSource::from_vars([
            ("AUTHGATE_PORT", "9091"),
            ("AUTHGATE_ALLOWALLUSERS", "true"),
            ("AUTHGATE_DOMAINS", "example.com,example.org"),
            ("OAUTH_CLIENT_ID", "12345"),
            ("UNRELATED", "ignored"),
        ]);

        let tree = env.load().unwrap().unwrap();
        assert_eq!(tree.get("authgate.port"), Some(&json!(9091)));
        assert_eq!(tree.get("authgate.allowallusers"), Some(&json!(true)));
        assert_eq!(tree.get("authgate.domains"), Some(&json!(["example.com", "example.org"])));
        // Numeric-looking strings stay strings for string keys
        assert_eq!(tree.get("oauth.client_id"), Some(&json!("12345")));
        assert_eq!(tree.as_map().len(), 2);
    }

    #[test]
    fn test_empty_env_value_is_unset() {
        let env = EnvSource::from_vars([("AUTHGATE_PORT", "")]);
        assert!(env.load().unwrap().is_none());
    }

    #[cfg(unix)]
    #[test]
    #[serial_test::serial]
    fn test_process_env_skips_non_utf8_values() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        env::set_var("AUTHGATE_TEST_NON_UTF8", OsStr::from_bytes(b"\xff\xfe"));
        env::set_var("AUTHGATE_TEST_UTF8", "plain");

        let source = EnvSource::from_process();

        env::remove_var("AUTHGATE_TEST_NON_UTF8");
        env::remove_var("AUTHGATE_TEST_UTF8");

        assert_eq!(source.get("AUTHGATE_TEST_NON_UTF8"), None);
        assert_eq!(source.get("AUTHGATE_TEST_UTF8"), Some("plain"));
    }

    #[test]
    fn test_invalid_env_value_names_variable() {
        let env = EnvSource::from_vars([("AUTHGATE_JWT_MAXAGE", "forever")]);
        match env.load() {
            Err(ConfigError::InvalidEnv(name, _)) => assert_eq!(name, "AUTHGATE_JWT_MAXAGE"),
            other => panic!("expected InvalidEnv, got {:?}", other),
        }
    }
}
