//! Remote-readiness gate
//!
//! Decides which placeholder actions stand in for the tree when no usable
//! GitHub remote exists. The decision itself is a pure function of a
//! [`GateInput`]; collecting that input is the only part that looks at the
//! collaborators, and it tolerates their absence.

use crate::host::{AuthProvider, CredentialStore, ManagerState, RepositoriesManager};
use crate::node::ActionKind;
use crate::settings::SettingsStore;

/// Coarse readiness derived from the repositories manager
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReadinessState {
    #[default]
    Uninitialized,
    Initializing,
    NeedsAuthentication,
    ReadyWithRemotes,
    ReadyWithoutRemotes,
}

impl ReadinessState {
    /// Readiness of a manager; a missing manager is `Uninitialized`
    pub fn of(manager: Option<&dyn RepositoriesManager>) -> Self {
        let Some(manager) = manager else {
            return ReadinessState::Uninitialized;
        };
        match manager.state() {
            ManagerState::Uninitialized => ReadinessState::Uninitialized,
            ManagerState::Initializing => ReadinessState::Initializing,
            ManagerState::NeedsAuthentication => ReadinessState::NeedsAuthentication,
            ManagerState::RepositoriesLoaded => {
                let has_remotes = manager
                    .folder_managers()
                    .iter()
                    .any(|folder| !folder.github_remotes().is_empty());
                if has_remotes {
                    ReadinessState::ReadyWithRemotes
                } else {
                    ReadinessState::ReadyWithoutRemotes
                }
            }
        }
    }
}

/// Everything the gate decides on
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GateInput {
    pub readiness: ReadinessState,
    /// A remote allowlist setting is present (even an empty one)
    pub remotes_setting_present: bool,
    /// Some folder has a GitHub Enterprise remote, allowlisted or not
    pub has_enterprise_remote: bool,
    pub enterprise_authenticated: bool,
}

impl GateInput {
    /// Gather the gate's input from the collaborators at hand
    ///
    /// A missing manager counts as zero remotes and zero enterprise remotes;
    /// missing credentials count as not signed in.
    pub fn collect(
        manager: Option<&dyn RepositoriesManager>,
        credentials: Option<&dyn CredentialStore>,
        settings: &dyn SettingsStore,
    ) -> Self {
        let has_enterprise_remote = manager.is_some_and(|manager| {
            manager.folder_managers().iter().any(|folder| {
                folder
                    .all_github_remotes()
                    .iter()
                    .any(|remote| remote.is_enterprise())
            })
        });

        Self {
            readiness: ReadinessState::of(manager),
            remotes_setting_present: settings.config().has_remotes_setting(),
            has_enterprise_remote,
            enterprise_authenticated: credentials
                .is_some_and(|c| c.is_authenticated(AuthProvider::GitHubEnterprise)),
        }
    }
}

/// Placeholder actions to show instead of the tree, in display order
pub fn placeholder_actions(input: &GateInput) -> Vec<ActionKind> {
    if input.readiness == ReadinessState::NeedsAuthentication {
        return Vec::new();
    }

    let mut actions = if input.remotes_setting_present {
        vec![ActionKind::NoMatchingRemotes, ActionKind::ConfigureRemotes]
    } else {
        vec![ActionKind::NoRemotes]
    };

    if input.has_enterprise_remote && !input.enterprise_authenticated {
        actions.push(ActionKind::LoginEnterprise);
    }
    actions
}
