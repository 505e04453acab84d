//! Sidebar settings file lookup
//!
//! The first readable file wins:
//! 1. `$CWD/.gh-pr-sidebar.toml`
//! 2. `~/.gh-pr-sidebar.toml`
//! 3. `<config dir>/gh-pr-sidebar/config.toml`

use std::path::{Path, PathBuf};

const CONFIG_FILE: &str = ".gh-pr-sidebar.toml";
const APP_CONFIG_FILE: &str = "gh-pr-sidebar/config.toml";

/// Candidate settings files, most specific first
fn candidate_paths(home: Option<&Path>, config: Option<&Path>) -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from(CONFIG_FILE)];
    paths.extend(home.map(|dir| dir.join(CONFIG_FILE)));
    paths.extend(config.map(|dir| dir.join(APP_CONFIG_FILE)));
    paths
}

/// Content of the first readable file in `paths`
fn read_first(paths: &[PathBuf]) -> Option<String> {
    paths.iter().find_map(|path| {
        let content = std::fs::read_to_string(path).ok()?;
        log::debug!("Loaded config from {}", path.display());
        Some(content)
    })
}

/// Load the settings file content, None when no candidate exists
pub fn load_config_file() -> Option<String> {
    let home = dirs::home_dir();
    let config = dirs::config_dir();
    read_first(&candidate_paths(home.as_deref(), config.as_deref()))
}
