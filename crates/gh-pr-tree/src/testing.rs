//! In-memory collaborators for unit tests
//!
//! Hand-written fakes of every interface the provider consumes, plus a
//! `Harness` wiring them into an initialized provider.

use crate::event::Emitter;
use crate::host::{
    AuthProvider, CheckboxChanges, CredentialStore, FolderRepositoryManager, ManagerState,
    RepositoriesManager, RevealOptions, ReviewModel, TreeView, WorkspaceFolder,
};
use crate::item::CheckboxState;
use crate::node::TreeNode;
use crate::provider::PullRequestsTreeProvider;
use crate::settings::{ConfigSettings, ConfigurationChange, SettingsStore};
use anyhow::Result;
use async_trait::async_trait;
use gh_client::{
    CategoryQuery, CountingSource, FileChange, FileStatus, Fixture, FixtureClient, FolderFixture,
    PullRequest, PullRequestPage, PullRequestSource, Remote, RemoteFixture, DEFAULT_HOST,
};
use gh_pr_config::{Memento, MemoryMemento, SidebarConfig};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

/// Pull requests numbered `numbers`, newest (highest) first
pub(crate) fn pull_requests(numbers: impl IntoIterator<Item = u64>) -> Vec<PullRequest> {
    let mut numbers: Vec<u64> = numbers.into_iter().collect();
    numbers.sort_unstable_by(|a, b| b.cmp(a));
    numbers
        .into_iter()
        .map(|n| {
            PullRequest::new(n, format!("Change {}", n), "octocat")
                .with_head_branch(format!("feature/{}", n))
                .with_body(format!("Body of #{}", n))
        })
        .collect()
}

/// A folder fixture whose pull requests each touch the same three files
pub(crate) fn folder_fixture(
    name: &str,
    remote_url: Option<&str>,
    numbers: impl IntoIterator<Item = u64>,
) -> FolderFixture {
    let pull_requests = pull_requests(numbers);
    let files: BTreeMap<String, Vec<FileChange>> = pull_requests
        .iter()
        .map(|pr| {
            (
                pr.number.to_string(),
                vec![
                    FileChange::new("src/tree/node.rs", FileStatus::Added),
                    FileChange::new("README.md", FileStatus::Modified),
                    FileChange::new("src/lib.rs", FileStatus::Modified),
                ],
            )
        })
        .collect();

    FolderFixture {
        name: name.to_string(),
        path: PathBuf::from(format!("/work/{}", name)),
        remotes: remote_url
            .map(|url| {
                vec![RemoteFixture {
                    name: "origin".to_string(),
                    url: url.to_string(),
                }]
            })
            .unwrap_or_default(),
        local_branches: pull_requests
            .first()
            .map(|pr| vec![pr.head_branch.clone()])
            .unwrap_or_default(),
        queries: BTreeMap::new(),
        files,
        pull_requests,
    }
}

/// A fixture client for one folder, signed in to its host or not
pub(crate) fn source_for(
    folder: &FolderFixture,
    page_size: usize,
    authenticated: bool,
) -> FixtureClient {
    let host = folder
        .parsed_remotes()
        .first()
        .map(|r| r.host.clone())
        .unwrap_or_else(|| DEFAULT_HOST.to_string());
    let fixture = Fixture {
        authenticated_hosts: if authenticated { vec![host] } else { Vec::new() },
        page_size,
        folders: vec![folder.clone()],
    };
    fixture.client_for(folder)
}

/// Source that yields to the runtime once before every fetch
#[derive(Debug, Clone)]
pub(crate) struct YieldingSource<S> {
    inner: S,
}

impl<S> YieldingSource<S> {
    pub(crate) fn new(inner: S) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<S: PullRequestSource> PullRequestSource for YieldingSource<S> {
    async fn fetch_pull_requests(
        &self,
        query: &CategoryQuery,
        cursor: Option<&str>,
    ) -> Result<PullRequestPage> {
        tokio::task::yield_now().await;
        self.inner.fetch_pull_requests(query, cursor).await
    }

    async fn fetch_file_changes(&self, pr_number: u64) -> Result<Vec<FileChange>> {
        tokio::task::yield_now().await;
        self.inner.fetch_file_changes(pr_number).await
    }
}

/// Host view recording what the provider asked of it
#[derive(Default)]
pub(crate) struct FakeView {
    pub reveals: Mutex<Vec<(String, RevealOptions)>>,
    pub contexts: Mutex<Vec<(String, bool)>>,
    pub opened_settings: Mutex<Vec<String>>,
    expand: Emitter<TreeNode>,
    collapse: Emitter<TreeNode>,
    checkbox: Emitter<CheckboxChanges>,
}

impl FakeView {
    pub(crate) fn expand(&self, node: &TreeNode) {
        self.expand.fire(node);
    }

    pub(crate) fn collapse(&self, node: &TreeNode) {
        self.collapse.fire(node);
    }

    pub(crate) fn toggle(&self, changes: Vec<(TreeNode, CheckboxState)>) {
        self.checkbox.fire(&changes);
    }

    pub(crate) fn listener_count(&self) -> usize {
        self.expand.listener_count()
            + self.collapse.listener_count()
            + self.checkbox.listener_count()
    }
}

impl TreeView for FakeView {
    fn reveal(&self, node: &TreeNode, options: RevealOptions) -> Result<()> {
        self.reveals
            .lock()
            .unwrap()
            .push((node.id().to_string(), options));
        Ok(())
    }

    fn set_context(&self, key: &str, value: bool) {
        self.contexts.lock().unwrap().push((key.to_string(), value));
    }

    fn open_settings(&self, setting: &str) -> Result<()> {
        self.opened_settings.lock().unwrap().push(setting.to_string());
        Ok(())
    }

    fn on_did_expand_element(&self) -> &Emitter<TreeNode> {
        &self.expand
    }

    fn on_did_collapse_element(&self) -> &Emitter<TreeNode> {
        &self.collapse
    }

    fn on_did_change_checkbox_state(&self) -> &Emitter<CheckboxChanges> {
        &self.checkbox
    }
}

/// Folder repository with explicit remote lists
pub(crate) struct FakeFolder {
    folder: WorkspaceFolder,
    remotes: Vec<Remote>,
    github_remotes: Vec<Remote>,
    all_github_remotes: Vec<Remote>,
    source: Arc<dyn PullRequestSource>,
    changed: Emitter<()>,
}

impl FakeFolder {
    /// A folder without remotes whose source serves nothing
    pub(crate) fn new(name: &str) -> Self {
        let fixture = folder_fixture(name, None, Vec::<u64>::new());
        Self::with_source(name, Arc::new(source_for(&fixture, 20, true)))
    }

    pub(crate) fn with_source(name: &str, source: Arc<dyn PullRequestSource>) -> Self {
        Self {
            folder: WorkspaceFolder::new(name, format!("/work/{}", name)),
            remotes: Vec::new(),
            github_remotes: Vec::new(),
            all_github_remotes: Vec::new(),
            source,
            changed: Emitter::new(),
        }
    }

    /// Place the folder at `path` instead of `/work/<name>`
    pub(crate) fn at(mut self, path: &str) -> Self {
        self.folder.path = PathBuf::from(path);
        self
    }

    /// A usable GitHub remote
    pub(crate) fn with_github_remote(mut self, remote: Remote) -> Self {
        self.remotes.push(remote.clone());
        self.github_remotes.push(remote.clone());
        self.all_github_remotes.push(remote);
        self
    }

    /// A GitHub remote excluded by the remote allowlist
    pub(crate) fn with_filtered_remote(mut self, remote: Remote) -> Self {
        self.remotes.push(remote.clone());
        self.all_github_remotes.push(remote);
        self
    }

    /// A remote that is not on GitHub at all
    pub(crate) fn with_other_remote(mut self, remote: Remote) -> Self {
        self.remotes.push(remote);
        self
    }

    /// A GitHub remote the repository itself does not list
    pub(crate) fn with_detached_github_remote(mut self, remote: Remote) -> Self {
        self.github_remotes.push(remote.clone());
        self.all_github_remotes.push(remote);
        self
    }

    pub(crate) fn shared(self) -> Arc<dyn FolderRepositoryManager> {
        Arc::new(self)
    }

    /// Announce a change of the folder's repositories
    pub(crate) fn fire_changed(&self) {
        self.changed.fire(&());
    }
}

impl FolderRepositoryManager for FakeFolder {
    fn folder(&self) -> &WorkspaceFolder {
        &self.folder
    }

    fn remotes(&self) -> Vec<Remote> {
        self.remotes.clone()
    }

    fn github_remotes(&self) -> Vec<Remote> {
        self.github_remotes.clone()
    }

    fn all_github_remotes(&self) -> Vec<Remote> {
        self.all_github_remotes.clone()
    }

    fn on_did_change_repositories(&self) -> &Emitter<()> {
        &self.changed
    }

    fn source(&self) -> Arc<dyn PullRequestSource> {
        Arc::clone(&self.source)
    }
}

/// Repositories manager whose state and folders tests set directly
pub(crate) struct FakeManager {
    state: Mutex<ManagerState>,
    state_changed: Emitter<ManagerState>,
    folders: Mutex<Vec<Arc<dyn FolderRepositoryManager>>>,
    folders_changed: Emitter<()>,
}

impl FakeManager {
    pub(crate) fn new(state: ManagerState, folders: Vec<Arc<dyn FolderRepositoryManager>>) -> Self {
        Self {
            state: Mutex::new(state),
            state_changed: Emitter::new(),
            folders: Mutex::new(folders),
            folders_changed: Emitter::new(),
        }
    }

    pub(crate) fn loaded(folders: Vec<Arc<dyn FolderRepositoryManager>>) -> Self {
        Self::new(ManagerState::RepositoriesLoaded, folders)
    }

    pub(crate) fn set_state(&self, state: ManagerState) {
        *self.state.lock().unwrap() = state;
        self.state_changed.fire(&state);
    }

    pub(crate) fn set_folders(&self, folders: Vec<Arc<dyn FolderRepositoryManager>>) {
        *self.folders.lock().unwrap() = folders;
        self.folders_changed.fire(&());
    }

    pub(crate) fn listener_count(&self) -> usize {
        self.state_changed.listener_count() + self.folders_changed.listener_count()
    }
}

impl RepositoriesManager for FakeManager {
    fn state(&self) -> ManagerState {
        *self.state.lock().unwrap()
    }

    fn on_did_change_state(&self) -> &Emitter<ManagerState> {
        &self.state_changed
    }

    fn folder_managers(&self) -> Vec<Arc<dyn FolderRepositoryManager>> {
        self.folders.lock().unwrap().clone()
    }

    fn on_did_change_folder_managers(&self) -> &Emitter<()> {
        &self.folders_changed
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct FakeCredentials {
    pub github: bool,
    pub enterprise: bool,
}

impl FakeCredentials {
    pub(crate) fn github_only() -> Self {
        Self {
            github: true,
            enterprise: false,
        }
    }
}

impl CredentialStore for FakeCredentials {
    fn is_authenticated(&self, provider: AuthProvider) -> bool {
        match provider {
            AuthProvider::GitHub => self.github,
            AuthProvider::GitHubEnterprise => self.enterprise,
        }
    }
}

#[derive(Default)]
pub(crate) struct FakeReviewModel {
    pub changed: Emitter<()>,
}

impl ReviewModel for FakeReviewModel {
    fn on_did_change_local_file_changes(&self) -> &Emitter<()> {
        &self.changed
    }
}

/// Settings store counting how often the config is read
pub(crate) struct CountingSettings {
    inner: ConfigSettings,
    reads: Mutex<usize>,
}

impl CountingSettings {
    pub(crate) fn new(config: SidebarConfig) -> Self {
        Self {
            inner: ConfigSettings::new(config),
            reads: Mutex::new(0),
        }
    }

    pub(crate) fn reads(&self) -> usize {
        *self.reads.lock().unwrap()
    }

    pub(crate) fn replace(&self, config: SidebarConfig) -> Vec<&'static str> {
        self.inner.replace(config)
    }
}

impl SettingsStore for CountingSettings {
    fn config(&self) -> SidebarConfig {
        *self.reads.lock().unwrap() += 1;
        self.inner.config()
    }

    fn on_did_change_configuration(&self) -> &Emitter<ConfigurationChange> {
        self.inner.on_did_change_configuration()
    }
}

/// An initialized provider over fakes
pub(crate) struct Harness {
    pub provider: PullRequestsTreeProvider,
    pub view: Arc<FakeView>,
    pub settings: Arc<CountingSettings>,
    pub memento: Arc<MemoryMemento>,
    pub manager: Arc<FakeManager>,
    pub review_model: Arc<FakeReviewModel>,
    pub source: CountingSource<FixtureClient>,
}

impl Harness {
    /// Provider without folders, not yet initialized
    pub(crate) fn uninitialized(config: SidebarConfig) -> Self {
        Self::build(config, Arc::new(MemoryMemento::new()))
    }

    fn build(config: SidebarConfig, memento: Arc<MemoryMemento>) -> Self {
        let view = Arc::new(FakeView::default());
        let settings = Arc::new(CountingSettings::new(config));
        let dyn_memento: Arc<dyn Memento> = memento.clone();
        let provider = PullRequestsTreeProvider::new(view.clone(), settings.clone(), dyn_memento);
        let empty = folder_fixture("none", None, Vec::<u64>::new());

        Self {
            provider,
            view,
            settings,
            memento,
            manager: Arc::new(FakeManager::loaded(Vec::new())),
            review_model: Arc::new(FakeReviewModel::default()),
            source: CountingSource::new(source_for(&empty, 20, true)),
        }
    }

    /// Initialize with `folders` and the given credentials
    pub(crate) fn with_folders(
        config: SidebarConfig,
        folders: Vec<Arc<dyn FolderRepositoryManager>>,
        credentials: FakeCredentials,
    ) -> Self {
        Self::with_manager(config, FakeManager::loaded(folders), credentials)
    }

    /// Initialize with a prepared manager
    pub(crate) fn with_manager(
        config: SidebarConfig,
        manager: FakeManager,
        credentials: FakeCredentials,
    ) -> Self {
        let mut harness = Self::uninitialized(config);
        harness.manager = Arc::new(manager);
        harness.initialize(credentials);
        harness
    }

    /// One folder on github.com serving pull requests `numbers`
    pub(crate) fn single_folder(numbers: impl IntoIterator<Item = u64>, page_size: usize) -> Self {
        Self::folders(&["api"], numbers, page_size)
    }

    /// One folder per name, all sharing one counting source
    pub(crate) fn folders(
        names: &[&str],
        numbers: impl IntoIterator<Item = u64>,
        page_size: usize,
    ) -> Self {
        Self::folders_with(
            names,
            numbers,
            page_size,
            SidebarConfig::default(),
            Arc::new(MemoryMemento::new()),
        )
    }

    /// Like `folders`, with explicit settings and persisted state
    pub(crate) fn folders_with(
        names: &[&str],
        numbers: impl IntoIterator<Item = u64>,
        page_size: usize,
        config: SidebarConfig,
        memento: Arc<MemoryMemento>,
    ) -> Self {
        let fixture = folder_fixture("api", Some("https://github.com/acme/api.git"), numbers);
        let source = CountingSource::new(source_for(&fixture, page_size, true));
        let folders = names
            .iter()
            .map(|name| {
                FakeFolder::with_source(name, Arc::new(source.clone()))
                    .with_github_remote(Remote::new("origin", DEFAULT_HOST, "acme", *name))
                    .shared()
            })
            .collect();

        let mut harness = Self::build(config, memento);
        harness.manager = Arc::new(FakeManager::loaded(folders));
        harness.source = source;
        harness.initialize(FakeCredentials::github_only());
        harness
    }

    pub(crate) fn initialize(&self, credentials: FakeCredentials) {
        self.provider
            .initialize(
                self.manager.clone(),
                vec![self.review_model.clone() as Arc<dyn ReviewModel>],
                Arc::new(credentials),
            )
            .unwrap();
    }
}
