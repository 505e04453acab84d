//! Configuration and data directory paths
//!
//! Uses XDG directories via `dirs` crate with fallbacks.
//!
//! Platform-specific locations:
//! - Linux: `~/.config/gh-pr-sidebar/`, `~/.cache/gh-pr-sidebar/`
//! - macOS: `~/Library/Application Support/gh-pr-sidebar/`, `~/Library/Caches/gh-pr-sidebar/`
//! - Windows: `%APPDATA%\gh-pr-sidebar\`, `%LOCALAPPDATA%\gh-pr-sidebar\`

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

const APP_NAME: &str = "gh-pr-sidebar";
const WORKSPACES_DIR: &str = "workspaces";

/// Get the application config directory
/// Returns ~/.config/gh-pr-sidebar/ on Linux, ~/Library/Application Support/gh-pr-sidebar/ on macOS
pub fn config_dir() -> Result<PathBuf> {
    let base = dirs::config_dir().context("Could not determine config directory")?;
    let dir = base.join(APP_NAME);
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

/// Get the application cache directory
/// Returns ~/.cache/gh-pr-sidebar/ on Linux, ~/Library/Caches/gh-pr-sidebar/ on macOS
pub fn cache_dir() -> Result<PathBuf> {
    let base = dirs::cache_dir().context("Could not determine cache directory")?;
    let dir = base.join(APP_NAME);
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

/// Get path to the state file of one workspace
///
/// Every workspace root gets its own JSON file so expansion and checkbox
/// state never leaks between checkouts.
pub fn workspace_state_path(workspace_root: &Path) -> Result<PathBuf> {
    let file_name = format!("{}.json", workspace_file_stem(workspace_root));
    Ok(config_dir()?.join(WORKSPACES_DIR).join(file_name))
}

/// Flatten a workspace path into a file-system safe stem
fn workspace_file_stem(workspace_root: &Path) -> String {
    let stem: String = workspace_root
        .to_string_lossy()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    let stem = stem.trim_matches('_');
    if stem.is_empty() {
        "default".to_string()
    } else {
        stem.to_string()
    }
}
