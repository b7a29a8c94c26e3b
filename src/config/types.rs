//! Configuration types
//!
//! This module contains the settings structures the merged configuration tree
//! is mapped onto. Field names in documents are case-insensitive, so every
//! serde name here is the lower-cased key.

use std::fmt;

use serde::{Deserialize, Deserializer};
use sha2::{Digest, Sha256};

/// Sensitive value (signing secret, session key, client secret)
///
/// Never printed: `Debug` and `Display` show a redaction marker.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Secret(Vec<u8>);

impl Secret {
    /// Wrap raw secret bytes
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    /// Access the raw bytes
    pub fn expose(&self) -> &[u8] {
        &self.0
    }

    /// Length in bytes
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the secret is empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Short SHA-256 fingerprint, safe to log
    pub fn fingerprint(&self) -> String {
        let digest = Sha256::digest(&self.0);
        digest.iter().take(4).map(|b| format!("{:02x}", b)).collect()
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Secret(<redacted {} bytes>)", self.0.len())
    }
}

impl fmt::Display for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<redacted>")
    }
}

impl<'de> Deserialize<'de> for Secret {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        string_or_scalar(deserializer).map(Secret::new)
    }
}

/// Split a list given as a single string on commas and whitespace
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(|c: char| c == ',' || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Custom deserializer accepting any scalar and keeping its text form
///
/// YAML reads `client_id: 1234567890` as an integer; free-form string keys
/// take it as the string `"1234567890"`.
pub(crate) fn string_or_scalar<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Scalar {
        Str(String),
        Int(i64),
        UInt(u64),
        Float(f64),
        Bool(bool),
    }

    Ok(match Scalar::deserialize(deserializer)? {
        Scalar::Str(s) => s,
        Scalar::Int(n) => n.to_string(),
        Scalar::UInt(n) => n.to_string(),
        Scalar::Float(n) => n.to_string(),
        Scalar::Bool(b) => b.to_string(),
    })
}

/// Custom deserializer accepting either a sequence or a single delimited string
pub(crate) fn string_list<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(s) => split_list(&s),
        OneOrMany::Many(items) => items,
    })
}

/// Process settings, found under the branding root key
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    // --- Network settings ---

    /// Log level (error, warn, info, debug, trace)
    #[serde(rename = "loglevel")]
    pub log_level: String,

    /// Listen host
    pub listen: String,

    /// Listen port
    pub port: u16,

    /// Whether the healthcheck endpoint is served
    #[serde(rename = "healthcheck")]
    pub health_check: bool,

    // --- Access policy ---

    /// Domains the cookie may be set for, in configured order
    #[serde(deserialize_with = "string_list")]
    pub domains: Vec<String>,

    /// Identities allowed in regardless of domain
    #[serde(deserialize_with = "string_list")]
    pub whitelist: Vec<String>,

    /// Let every authenticated user in
    #[serde(rename = "allowallusers")]
    pub allow_all_users: bool,

    /// Skip authentication entirely
    #[serde(rename = "publicaccess")]
    pub public_access: bool,

    pub jwt: JwtSettings,
    pub cookie: CookieSettings,
    pub headers: HeaderSettings,
    pub db: DbSettings,
    pub session: SessionSettings,

    // --- Testing ---

    pub test_url: String,

    #[serde(deserialize_with = "string_list")]
    pub test_urls: Vec<String>,

    pub testing: bool,

    #[serde(rename = "webapp")]
    pub web_app: bool,
}

/// JWT policy
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct JwtSettings {
    /// Token lifetime in minutes
    #[serde(rename = "maxage")]
    pub max_age: i64,
    #[serde(deserialize_with = "string_or_scalar")]
    pub issuer: String,
    /// Signing secret
    pub secret: Secret,
    pub compress: bool,
}

/// Cookie policy
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct CookieSettings {
    pub name: String,
    #[serde(deserialize_with = "string_or_scalar")]
    pub domain: String,
    pub secure: bool,
    #[serde(rename = "httponly")]
    pub http_only: bool,
    /// Cookie lifetime in minutes, never longer than the JWT lifetime
    #[serde(rename = "maxage")]
    pub max_age: i64,
}

/// Names of the headers exchanged with the protected application
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct HeaderSettings {
    pub jwt: String,
    pub user: String,
    #[serde(rename = "querystring")]
    pub query_string: String,
    pub redirect: String,
    pub success: String,
    #[serde(rename = "claimheader")]
    pub claim_header: String,
    #[serde(deserialize_with = "string_list")]
    pub claims: Vec<String>,
    #[serde(rename = "accesstoken")]
    pub access_token: String,
    #[serde(rename = "idtoken")]
    pub id_token: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DbSettings {
    pub file: String,
}

/// Session cookie policy
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    pub name: String,
    /// Session signing key
    pub key: Secret,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_secret_is_redacted() {
        let secret = Secret::new("hunter2-hunter2");
        assert!(!format!("{:?}", secret).contains("hunter2"));
        assert!(!format!("{}", secret).contains("hunter2"));
        assert_eq!(secret.len(), 15);
        assert_eq!(secret.fingerprint().len(), 8);
    }

    #[test]
    fn test_settings_from_lowercased_tree() {
        let settings: Settings = serde_json::from_value(json!({
            "listen": "127.0.0.1",
            "port": 9090,
            "allowallusers": true,
            "jwt": {"maxage": 60, "secret": "abc"},
            "cookie": {"maxage": 30, "httponly": true},
            "headers": {"claims": ["groups", "email"]}
        }))
        .unwrap();

        assert_eq!(settings.port, 9090);
        assert!(settings.allow_all_users);
        assert_eq!(settings.jwt.max_age, 60);
        assert_eq!(settings.jwt.secret.expose(), b"abc");
        assert_eq!(settings.cookie.max_age, 30);
        assert!(settings.cookie.http_only);
        assert_eq!(settings.headers.claims, vec!["groups", "email"]);
        assert!(settings.domains.is_empty());
    }

    #[test]
    fn test_string_list_accepts_delimited_string() {
        let settings: Settings = serde_json::from_value(json!({
            "domains": "example.com, example.org internal.example.net"
        }))
        .unwrap();

        assert_eq!(settings.domains, vec!["example.com", "example.org", "internal.example.net"]);
    }

    #[test]
    fn test_numeric_scalars_read_as_strings() {
        let settings: Settings = serde_json::from_value(json!({
            "jwt": {"secret": 1234567890, "issuer": 42},
            "session": {"key": 1.5},
            "cookie": {"domain": true}
        }))
        .unwrap();

        assert_eq!(settings.jwt.secret.expose(), b"1234567890");
        assert_eq!(settings.jwt.issuer, "42");
        assert_eq!(settings.session.key.expose(), b"1.5");
        assert_eq!(settings.cookie.domain, "true");
    }

    #[test]
    fn test_secret_rejects_structured_values() {
        let result: std::result::Result<Secret, _> = serde_json::from_value(json!({"nested": 1}));
        assert!(result.is_err());
    }
}
