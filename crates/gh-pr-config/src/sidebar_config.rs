//! Sidebar settings
//!
//! Settings loaded from `.gh-pr-sidebar.toml`. Each field maps to one
//! setting path under the `githubPullRequests` namespace, which is what
//! configuration-change notifications carry.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Setting path of [`SidebarConfig::file_list_layout`]
pub const FILE_LIST_LAYOUT_SETTING: &str = "githubPullRequests.fileListLayout";
/// Setting path of [`SidebarConfig::queries`]
pub const QUERIES_SETTING: &str = "githubPullRequests.queries";
/// Setting path of [`SidebarConfig::remotes`]
pub const REMOTES_SETTING: &str = "githubPullRequests.remotes";

/// How the files of a pull request are listed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileListLayout {
    /// One entry per file, full path as label
    Flat,
    /// Files grouped under their directories
    #[default]
    Tree,
}

/// A named pull request query shown as its own category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryConfig {
    /// Category label, also the category identity
    pub label: String,
    /// Search query handed to the data source
    pub query: String,
}

impl QueryConfig {
    pub fn new(label: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            query: query.into(),
        }
    }
}

/// Sidebar configuration loaded from .gh-pr-sidebar.toml
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SidebarConfig {
    /// Layout of the file list under each pull request
    #[serde(default)]
    pub file_list_layout: FileListLayout,

    /// Query categories, in display order
    #[serde(default = "default_queries")]
    pub queries: Vec<QueryConfig>,

    /// Remote allowlist. `None` means the setting is not present at all,
    /// which is different from an explicitly empty list.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remotes: Option<Vec<String>>,
}

fn default_queries() -> Vec<QueryConfig> {
    vec![
        QueryConfig::new(
            "Waiting For My Review",
            "is:open review-requested:${user}",
        ),
        QueryConfig::new("Assigned To Me", "is:open assignee:${user}"),
        QueryConfig::new("Created By Me", "is:open author:${user}"),
    ]
}

impl Default for SidebarConfig {
    fn default() -> Self {
        Self {
            file_list_layout: FileListLayout::default(),
            queries: default_queries(),
            remotes: None,
        }
    }
}

impl SidebarConfig {
    /// Load config from the first settings file found, or use defaults
    pub fn load() -> Self {
        if let Some(content) = crate::load_config_file() {
            match Self::from_toml(&content) {
                Ok(config) => {
                    log::info!("Loaded sidebar config from file");
                    return config;
                }
                Err(e) => {
                    log::warn!("Failed to parse config file: {:#}", e);
                }
            }
        }

        log::debug!("Using default sidebar config");
        Self::default()
    }

    /// Parse a config from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse sidebar config")
    }

    /// Setting paths whose values differ between `self` and `other`
    pub fn changed_settings(&self, other: &SidebarConfig) -> Vec<&'static str> {
        let mut changed = Vec::new();
        if self.file_list_layout != other.file_list_layout {
            changed.push(FILE_LIST_LAYOUT_SETTING);
        }
        if self.queries != other.queries {
            changed.push(QUERIES_SETTING);
        }
        if self.remotes != other.remotes {
            changed.push(REMOTES_SETTING);
        }
        changed
    }

    /// Whether a remote allowlist is configured (even an empty one)
    pub fn has_remotes_setting(&self) -> bool {
        self.remotes.is_some()
    }
}
