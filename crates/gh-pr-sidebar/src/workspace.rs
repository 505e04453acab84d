//! Repository collaborators built from a workspace fixture
//!
//! Stands in for the git integration of a real host: every fixture folder
//! becomes a [`FixtureFolder`] whose remotes are parsed from the fixture's
//! remote URLs, classified as GitHub or not, and filtered by the remote
//! allowlist of the sidebar settings.

use gh_client::{Fixture, FolderFixture, PullRequestSource, Remote, DEFAULT_HOST};
use gh_pr_tree::{
    AuthProvider, CredentialStore, Emitter, FolderRepositoryManager, ManagerState,
    RepositoriesManager, ReviewModel, WorkspaceFolder,
};
use std::sync::{Arc, Mutex};

/// Whether a remote points at GitHub or a GitHub Enterprise host
pub fn is_github_host(host: &str) -> bool {
    host.contains("github")
}

/// One workspace folder of the fixture
pub struct FixtureFolder {
    folder: WorkspaceFolder,
    remotes: Vec<Remote>,
    all_github_remotes: Vec<Remote>,
    allowlist: Option<Vec<String>>,
    source: Arc<dyn PullRequestSource>,
    on_did_change_repositories: Emitter<()>,
}

impl FixtureFolder {
    pub fn new(fixture: &Fixture, folder: &FolderFixture, allowlist: Option<Vec<String>>) -> Self {
        let remotes = folder.parsed_remotes();
        let all_github_remotes = remotes
            .iter()
            .filter(|r| is_github_host(&r.host))
            .cloned()
            .collect();

        Self {
            folder: WorkspaceFolder::new(folder.name.clone(), folder.path.clone()),
            remotes,
            all_github_remotes,
            allowlist,
            source: Arc::new(fixture.client_for(folder)),
            on_did_change_repositories: Emitter::new(),
        }
    }
}

impl FolderRepositoryManager for FixtureFolder {
    fn folder(&self) -> &WorkspaceFolder {
        &self.folder
    }

    fn remotes(&self) -> Vec<Remote> {
        self.remotes.clone()
    }

    fn github_remotes(&self) -> Vec<Remote> {
        match &self.allowlist {
            Some(names) => self
                .all_github_remotes
                .iter()
                .filter(|r| names.contains(&r.name))
                .cloned()
                .collect(),
            None => self.all_github_remotes.clone(),
        }
    }

    fn all_github_remotes(&self) -> Vec<Remote> {
        self.all_github_remotes.clone()
    }

    fn on_did_change_repositories(&self) -> &Emitter<()> {
        &self.on_did_change_repositories
    }

    fn source(&self) -> Arc<dyn PullRequestSource> {
        Arc::clone(&self.source)
    }
}

/// Local file changes under review in one fixture folder
pub struct FixtureReviewModel {
    folder: String,
    on_did_change_local_file_changes: Emitter<()>,
}

impl FixtureReviewModel {
    pub fn new(folder: impl Into<String>) -> Self {
        Self {
            folder: folder.into(),
            on_did_change_local_file_changes: Emitter::new(),
        }
    }

    pub fn folder(&self) -> &str {
        &self.folder
    }

    /// Announce that the folder's working tree changed
    pub fn touch(&self) {
        log::debug!("FixtureReviewModel {}: local files changed", self.folder);
        self.on_did_change_local_file_changes.fire(&());
    }
}

impl ReviewModel for FixtureReviewModel {
    fn on_did_change_local_file_changes(&self) -> &Emitter<()> {
        &self.on_did_change_local_file_changes
    }
}

/// Repositories manager over a fixed set of fixture folders
pub struct FixtureWorkspace {
    state: Mutex<ManagerState>,
    on_did_change_state: Emitter<ManagerState>,
    folders: Vec<Arc<dyn FolderRepositoryManager>>,
    review_models: Vec<Arc<FixtureReviewModel>>,
    on_did_change_folder_managers: Emitter<()>,
}

impl FixtureWorkspace {
    /// Every folder of `fixture`, with remotes filtered by `allowlist`
    pub fn new(fixture: &Fixture, allowlist: Option<Vec<String>>) -> Self {
        let folders = fixture
            .folders
            .iter()
            .map(|folder| {
                Arc::new(FixtureFolder::new(fixture, folder, allowlist.clone()))
                    as Arc<dyn FolderRepositoryManager>
            })
            .collect();
        let review_models = fixture
            .folders
            .iter()
            .map(|folder| Arc::new(FixtureReviewModel::new(folder.name.clone())))
            .collect();

        Self {
            state: Mutex::new(ManagerState::Initializing),
            on_did_change_state: Emitter::new(),
            folders,
            review_models,
            on_did_change_folder_managers: Emitter::new(),
        }
    }

    /// Finish loading, announcing the state change
    pub fn mark_loaded(&self) {
        let state = ManagerState::RepositoriesLoaded;
        *self.state.lock().unwrap_or_else(|e| e.into_inner()) = state;
        log::debug!("FixtureWorkspace: {:?}", state);
        self.on_did_change_state.fire(&state);
    }

    /// One review model per folder, in folder order
    pub fn review_models(&self) -> Vec<Arc<dyn ReviewModel>> {
        self.review_models
            .iter()
            .map(|model| Arc::clone(model) as Arc<dyn ReviewModel>)
            .collect()
    }

    /// Review model of the folder called `name`
    pub fn review_model(&self, name: &str) -> Option<Arc<FixtureReviewModel>> {
        self.review_models
            .iter()
            .find(|model| model.folder() == name)
            .cloned()
    }
}

impl RepositoriesManager for FixtureWorkspace {
    fn state(&self) -> ManagerState {
        *self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn on_did_change_state(&self) -> &Emitter<ManagerState> {
        &self.on_did_change_state
    }

    fn folder_managers(&self) -> Vec<Arc<dyn FolderRepositoryManager>> {
        self.folders.clone()
    }

    fn on_did_change_folder_managers(&self) -> &Emitter<()> {
        &self.on_did_change_folder_managers
    }
}

/// Sign-in state derived from the fixture's authenticated hosts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixtureCredentials {
    github: bool,
    enterprise: bool,
}

impl FixtureCredentials {
    pub fn new(fixture: &Fixture) -> Self {
        Self {
            github: fixture.is_authenticated(DEFAULT_HOST),
            enterprise: fixture
                .authenticated_hosts
                .iter()
                .any(|host| host != DEFAULT_HOST),
        }
    }
}

impl CredentialStore for FixtureCredentials {
    fn is_authenticated(&self, provider: AuthProvider) -> bool {
        match provider {
            AuthProvider::GitHub => self.github,
            AuthProvider::GitHubEnterprise => self.enterprise,
        }
    }
}
