//! Pull request sidebar tree
//!
//! A lazily materialized tree of pull requests, grouped by workspace folder
//! and category, that stays consistent with a host view while repository
//! topology, authentication state and user interaction change underneath it.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                  PullRequestsTreeProvider                    │
//! │  get_children / get_parent / get_tree_item / refresh         │
//! └──────────────────────────────────────────────────────────────┘
//!        │                 │                   │
//!        ▼                 ▼                   ▼
//! ┌─────────────┐   ┌─────────────┐    ┌────────────────┐
//! │  readiness  │   │  TreeNode   │    │   TreeState    │
//! │    gate     │   │  variants   │    │ expansion set, │
//! │ (pure fn)   │   │             │    │ checkbox state │
//! └─────────────┘   └─────────────┘    └────────────────┘
//!                          │                   │
//!                          ▼                   ▼
//!                   ┌─────────────┐      ┌──────────┐
//!                   │PrsTreeModel │      │ Memento  │
//!                   │ page cache  │      └──────────┘
//!                   └─────────────┘
//!                          │
//!                          ▼
//!                  PullRequestSource
//! ```
//!
//! Collaborators the tree does not own (repositories, credentials, review
//! models, settings, the view) are reached through the traits in [`host`]
//! and [`settings`].

pub mod commands;
pub mod epoch;
pub mod error;
pub mod event;
pub mod host;
pub mod item;
pub mod model;
pub mod node;
pub mod provider;
pub mod readiness;
pub mod settings;
pub mod state;

#[cfg(test)]
mod testing;

pub use commands::{CommandId, TreeCommands};
pub use epoch::TreeEpoch;
pub use error::TreeError;
pub use event::{DisposableStore, Emitter, Subscription};
pub use host::{
    AuthProvider, CheckboxChanges, CredentialStore, FolderRepositoryManager, ManagerState,
    RepositoriesManager, RevealOptions, ReviewModel, TreeView, WorkspaceFolder,
};
pub use item::{CheckboxState, Collapsible, ItemCommand, TreeItem};
pub use model::{CategoryKey, CategoryPage, PrsTreeModel};
pub use node::{ActionKind, NodeKind, TreeNode};
pub use provider::{PullRequestTarget, PullRequestsTreeProvider, TreeChange, INITIALIZED_CONTEXT};
pub use readiness::{placeholder_actions, GateInput, ReadinessState};
pub use settings::{ConfigSettings, ConfigurationChange, SettingsStore};
pub use state::TreeState;
