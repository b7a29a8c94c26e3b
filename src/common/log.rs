//! Logging helpers
//!
//! The logger is installed once with a permissive filter; the effective level is
//! then governed by `log::set_max_level`, which can be adjusted after the
//! configuration has been resolved.

use std::str::FromStr;

use log::LevelFilter;

/// Initialize the logging system
///
/// # Parameters
///
/// * `level` - Initial log level, used until the configuration is resolved
pub fn init_logger(level: &str) {
    let filter = parse_level(level).unwrap_or(LevelFilter::Info);

    // RUST_LOG still takes precedence over the level passed in here
    let env = env_logger::Env::default().filter_or("RUST_LOG", "trace");
    let installed = env_logger::Builder::from_env(env).try_init().is_ok();

    log::set_max_level(filter);
    if !installed {
        log::debug!("logger already installed, level set to {}", filter);
    }
}

/// Change the effective log level at runtime
///
/// Unknown level names are ignored with a warning.
pub fn set_log_level(level: &str) {
    match parse_level(level) {
        Some(filter) => log::set_max_level(filter),
        None => log::warn!("Unknown log level '{}', keeping {}", level, log::max_level()),
    }
}

/// Parse a level name (error, warn, info, debug, trace, off)
pub fn parse_level(level: &str) -> Option<LevelFilter> {
    LevelFilter::from_str(level.trim()).ok()
}
