//! Legacy namespace migration
//!
//! Older configuration files use `gatekeeper:` as the root key. When the
//! current root yields no domains, the same merged tree is read again under
//! the legacy root and, if that produces domains, it replaces the settings
//! wholesale.

use log::error;

use crate::config::defaults::BRANDING;
use crate::config::tree::ConfigTree;
use crate::config::types::Settings;

/// Fall back to the legacy root key if the current one configures no domains
///
/// Returns the settings to use and the root key they were read from.
pub fn migrate_if_needed(settings: Settings, tree: &ConfigTree) -> (Settings, &'static str) {
    let branding = &BRANDING;
    if !settings.domains.is_empty() {
        return (settings, branding.lc_name);
    }

    let legacy = match tree.unmarshal_key::<Settings>(branding.old_lc_name) {
        Ok(legacy) => legacy,
        Err(e) => {
            error!("{}", e);
            return (settings, branding.lc_name);
        }
    };

    if legacy.domains.is_empty() {
        return (settings, branding.lc_name);
    }

    error!(
        "\n\nIMPORTANT!\n\nplease update your config file to change '{}:' to '{}:' as per {}\n",
        branding.old_lc_name, branding.lc_name, branding.url
    );
    (legacy, branding.old_lc_name)
}
