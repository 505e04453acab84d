//! Settings store consumed by the tree
//!
//! The tree reads the sidebar settings on demand and listens for change
//! notifications carrying the affected setting path.

use crate::event::Emitter;
use gh_pr_config::SidebarConfig;
use std::sync::RwLock;

/// A configuration change, carrying the affected setting path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigurationChange {
    pub setting: String,
}

impl ConfigurationChange {
    pub fn new(setting: impl Into<String>) -> Self {
        Self {
            setting: setting.into(),
        }
    }

    /// Whether the change touches `section` or anything below it
    pub fn affects(&self, section: &str) -> bool {
        self.setting == section
            || self
                .setting
                .strip_prefix(section)
                .is_some_and(|rest| rest.starts_with('.'))
            || section
                .strip_prefix(self.setting.as_str())
                .is_some_and(|rest| rest.starts_with('.'))
    }
}

pub trait SettingsStore: Send + Sync {
    /// Current settings snapshot
    fn config(&self) -> SidebarConfig;

    fn on_did_change_configuration(&self) -> &Emitter<ConfigurationChange>;
}

/// `SettingsStore` over an in-memory `SidebarConfig`
///
/// `replace` swaps the whole config and fires one change per setting path
/// that actually differs.
#[derive(Debug, Default)]
pub struct ConfigSettings {
    config: RwLock<SidebarConfig>,
    on_did_change_configuration: Emitter<ConfigurationChange>,
}

impl ConfigSettings {
    pub fn new(config: SidebarConfig) -> Self {
        Self {
            config: RwLock::new(config),
            on_did_change_configuration: Emitter::new(),
        }
    }

    /// Install a new config, returning the setting paths that changed
    pub fn replace(&self, config: SidebarConfig) -> Vec<&'static str> {
        let changed = {
            let mut current = self.config.write().unwrap_or_else(|e| e.into_inner());
            let changed = current.changed_settings(&config);
            *current = config;
            changed
        };

        for setting in &changed {
            log::debug!("ConfigSettings: {} changed", setting);
            self.on_did_change_configuration
                .fire(&ConfigurationChange::new(*setting));
        }
        changed
    }
}

impl SettingsStore for ConfigSettings {
    fn config(&self) -> SidebarConfig {
        self.config
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    fn on_did_change_configuration(&self) -> &Emitter<ConfigurationChange> {
        &self.on_did_change_configuration
    }
}
