//! Default configuration values
//!
//! Branding, file locations and the packaged defaults document. This is the
//! single source of truth for names used to namespace config keys and
//! environment variables.

/// Product names used to namespace configuration keys and environment variables
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Branding {
    /// Lower case name, the root key of the configuration tree
    pub lc_name: &'static str,
    /// Upper case name, the environment variable prefix
    pub uc_name: &'static str,
    /// Camel case name, for human-facing messages
    pub cc_name: &'static str,
    /// Previous root key, still honored with a deprecation warning
    pub old_lc_name: &'static str,
    /// Project documentation
    pub url: &'static str,
}

/// Branding of this build
pub const BRANDING: Branding = Branding {
    lc_name: "authgate",
    uc_name: "AUTHGATE",
    cc_name: "AuthGate",
    old_lc_name: "gatekeeper",
    url: "https://github.com/authgate/authgate-proxy",
};

/// Root key of the OAuth provider sub-tree
pub const OAUTH_KEY: &str = "oauth";

/// Environment variable naming the base directory (`AUTHGATE_ROOT`)
pub const ROOT_ENV: &str = "AUTHGATE_ROOT";

/// Environment variable naming an override configuration file (`AUTHGATE_CONFIG`)
pub const CONFIG_ENV: &str = "AUTHGATE_CONFIG";

/// Configuration directory, relative to the root directory
pub const DEFAULT_CONFIG_DIR: &str = "config";

/// Conventional override configuration file name
pub const DEFAULT_CONFIG_FILE: &str = "config.yml";

/// Packaged defaults file name
pub const DEFAULTS_FILE: &str = ".defaults.yml";

/// JWT secret file name, inside the configuration directory
pub const SECRET_FILE: &str = "secret";

/// Packaged defaults, embedded at compile time
pub const EMBEDDED_DEFAULTS: &str = include_str!("../../config/.defaults.yml");

/// Options that must be explicitly configured
pub const REQUIRED_OPTIONS: [&str; 2] = ["oauth.provider", "oauth.client_id"];

/// Number of random bytes in a generated secret
pub const SECRET_BYTES: usize = 32;

/// Length of a base64 string carrying `SECRET_BYTES` bytes (6 bits per char)
pub const MIN_SECRET_LENGTH: usize = 44;

/// Path marker every callback URL must contain
pub const CALLBACK_PATH_MARKER: &str = "/auth";

/// Build a dotted key below a root key
pub fn key(root: &str, path: &str) -> String {
    format!("{}.{}", root, path)
}
