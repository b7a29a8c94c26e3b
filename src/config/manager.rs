//! Configuration manager
//!
//! Holds the process-wide snapshot. It is installed once at startup and read
//! by every consumer afterwards; test harnesses may replace it wholesale.

use std::sync::{Arc, RwLock};

use log::info;
use once_cell::sync::Lazy;

use crate::config::error::{ConfigError, Result};
use crate::config::snapshot::Snapshot;

// Global instance
static CURRENT: Lazy<RwLock<Option<Arc<Snapshot>>>> = Lazy::new(|| RwLock::new(None));

/// Install the process-wide configuration
///
/// Fails if a configuration is already installed.
pub fn initialize(snapshot: Snapshot) -> Result<Arc<Snapshot>> {
    let mut current = CURRENT.write().unwrap_or_else(|e| e.into_inner());
    if current.is_some() {
        return Err(ConfigError::AlreadyInitialized);
    }

    info!("Initializing global configuration");
    let snapshot = Arc::new(snapshot);
    *current = Some(Arc::clone(&snapshot));
    Ok(snapshot)
}

/// Get the installed configuration, `None` before [`initialize`]
pub fn get_config() -> Option<Arc<Snapshot>> {
    CURRENT.read().unwrap_or_else(|e| e.into_inner()).clone()
}

/// Replace the installed configuration, whether or not one exists
///
/// Only test harnesses rebuild the configuration; the old snapshot is
/// dropped as a whole so no field survives from a previous run.
pub fn replace_for_tests(snapshot: Snapshot) -> Arc<Snapshot> {
    let snapshot = Arc::new(snapshot);
    *CURRENT.write().unwrap_or_else(|e| e.into_inner()) = Some(Arc::clone(&snapshot));
    snapshot
}
