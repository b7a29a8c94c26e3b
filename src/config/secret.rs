//! Secret provisioning
//!
//! Signing secrets are 32 random bytes from the operating system, base64
//! encoded (44 characters). The JWT secret is persisted to a file so that
//! issued tokens survive a restart; the session key is kept in memory only.
//!
//! Two instances provisioning the same secret file at the same moment race;
//! the last writer wins and the other instance runs with a secret that no
//! longer matches the file until it restarts.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use log::{debug, info, warn};
use rand::rngs::OsRng;
use rand::TryRngCore;

use crate::config::defaults::SECRET_BYTES;
use crate::config::error::{ConfigError, Result};
use crate::config::types::Secret;

/// Generate a new base64 encoded secret from the OS random source
///
/// Fails only if the OS cannot provide randomness, which must stop startup.
pub fn generate_secret() -> Result<Secret> {
    let mut bytes = [0u8; SECRET_BYTES];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|e| ConfigError::Entropy(e.to_string()))?;
    Ok(Secret::new(STANDARD.encode(bytes)))
}

/// Read the secret stored at `path`, or generate and store a new one
///
/// The file is the source of truth across restarts. Failing to store a
/// freshly generated secret is logged and the secret is used anyway.
pub fn get_or_create_secret(path: &Path) -> Result<Secret> {
    match fs::read(path) {
        Ok(bytes) => {
            info!("jwt.secret read from {}", path.display());
            return Ok(Secret::new(bytes));
        }
        Err(e) => {
            debug!("{}", e);
            info!("jwt.secret not found in {}", path.display());
        }
    }

    warn!("generating random jwt.secret and storing it in {}", path.display());
    let secret = generate_secret()?;
    if let Err(e) = store_secret(path, &secret) {
        warn!("unable to store jwt.secret in {}: {}", path.display(), e);
    }
    Ok(secret)
}

/// Generate a session key for this process run only
pub fn generate_session_key() -> Result<Secret> {
    warn!("generating random session.key");
    generate_secret()
}

/// Write a secret with owner-only permissions (0600 on Unix)
fn store_secret(path: &Path, secret: &Secret) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        let mut file = fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(0o600)
            .open(path)?;
        file.write_all(secret.expose())?;
    }

    #[cfg(not(unix))]
    {
        let mut file = fs::File::create(path)?;
        file.write_all(secret.expose())?;
    }

    Ok(())
}
