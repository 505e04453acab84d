//! Collaborator interfaces consumed by the tree
//!
//! The tree never owns repositories, credentials or the view; it reaches
//! them only through these traits. Every change stream is an [`Emitter`]
//! the provider subscribes to.

use crate::event::Emitter;
use crate::item::CheckboxState;
use crate::node::TreeNode;
use gh_client::{PullRequestSource, Remote};
use std::path::PathBuf;
use std::sync::Arc;

/// Coarse status reported by the repositories manager
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ManagerState {
    #[default]
    Uninitialized,
    Initializing,
    NeedsAuthentication,
    RepositoriesLoaded,
}

/// Credential providers the tree asks about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthProvider {
    GitHub,
    GitHubEnterprise,
}

/// A folder opened in the workspace
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WorkspaceFolder {
    pub name: String,
    pub path: PathBuf,
}

impl WorkspaceFolder {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }

    /// Identity of the folder in caches and persisted state
    ///
    /// Two folders may share a name but never a path.
    pub fn key(&self) -> String {
        self.path.to_string_lossy().into_owned()
    }
}

/// The repository of one workspace folder
pub trait FolderRepositoryManager: Send + Sync {
    fn folder(&self) -> &WorkspaceFolder;

    /// Native git remotes of the repository, GitHub or not
    fn remotes(&self) -> Vec<Remote>;

    /// GitHub remotes usable under the current remote allowlist
    fn github_remotes(&self) -> Vec<Remote>;

    /// Every GitHub remote, ignoring the allowlist
    fn all_github_remotes(&self) -> Vec<Remote>;

    /// Fires when the folder's repositories or remotes change
    fn on_did_change_repositories(&self) -> &Emitter<()>;

    /// Data source for this folder's pull requests
    fn source(&self) -> Arc<dyn PullRequestSource>;
}

/// Owner of all folder repository managers
pub trait RepositoriesManager: Send + Sync {
    fn state(&self) -> ManagerState;

    fn on_did_change_state(&self) -> &Emitter<ManagerState>;

    fn folder_managers(&self) -> Vec<Arc<dyn FolderRepositoryManager>>;

    /// Fires when folders are added to or removed from the workspace
    fn on_did_change_folder_managers(&self) -> &Emitter<()>;
}

pub trait CredentialStore: Send + Sync {
    fn is_authenticated(&self, provider: AuthProvider) -> bool;
}

/// Review state of one folder
pub trait ReviewModel: Send + Sync {
    /// Fires when the set of locally changed files under review changes
    fn on_did_change_local_file_changes(&self) -> &Emitter<()>;
}

/// How `reveal` brings a node into view
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RevealOptions {
    pub select: bool,
    pub focus: bool,
    /// Levels to expand below the revealed node (0 = none)
    pub expand: u8,
}

impl RevealOptions {
    /// Select the node and expand it one level
    pub fn select_and_expand() -> Self {
        Self {
            select: true,
            focus: false,
            expand: 1,
        }
    }
}

/// Checkbox toggles reported by the host in one batch
pub type CheckboxChanges = Vec<(TreeNode, CheckboxState)>;

/// The host view showing the tree
pub trait TreeView: Send + Sync {
    fn reveal(&self, node: &TreeNode, options: RevealOptions) -> anyhow::Result<()>;

    /// Set a context flag the host uses for conditional UI
    fn set_context(&self, key: &str, value: bool);

    /// Open the host's settings UI at a setting path
    fn open_settings(&self, setting: &str) -> anyhow::Result<()>;

    fn on_did_expand_element(&self) -> &Emitter<TreeNode>;

    fn on_did_collapse_element(&self) -> &Emitter<TreeNode>;

    fn on_did_change_checkbox_state(&self) -> &Emitter<CheckboxChanges>;
}
