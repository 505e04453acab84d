//! Settings and workspace state for gh-pr-sidebar
//!
//! This crate provides:
//! - File path utilities for config and cache directories
//! - Sidebar settings loading (TOML)
//! - Workspace-scoped key/value persistence (`Memento`)

pub mod config_file;
pub mod memento;
pub mod paths;
pub mod sidebar_config;

pub use config_file::load_config_file;
pub use memento::{FileMemento, Memento, MemoryMemento};
pub use paths::{cache_dir, config_dir, workspace_state_path};
pub use sidebar_config::{
    FileListLayout, QueryConfig, SidebarConfig, FILE_LIST_LAYOUT_SETTING, QUERIES_SETTING,
    REMOTES_SETTING,
};

/// Default GitHub host (public GitHub)
pub const DEFAULT_HOST: &str = "github.com";

/// Namespace every sidebar setting path lives under
pub const SETTINGS_NAMESPACE: &str = "githubPullRequests";
