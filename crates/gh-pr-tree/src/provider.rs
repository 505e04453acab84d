//! Pull request tree provider
//!
//! The provider answers the host's pull protocol (`get_children`,
//! `get_parent`, `get_tree_item`) and turns every upstream change into one
//! notification stream the host listens to.
//!
//! # Architecture
//!
//! ```text
//!  repositories manager ─┐
//!  folder repositories ──┤
//!  review models ────────┼──► refresh(node?) ──► on_did_change_tree_data ──► host
//!  settings changes ─────┤                                                    │
//!  category data ────────┘                                                    │
//!                                                                             ▼
//!  host expand/collapse ──► TreeState (expansion set)          get_children(node?)
//!  host checkbox ─────────► FileChangeNode                                    │
//!                                                                             ▼
//!                                           readiness gate │ root rebuild │ node.children()
//! ```
//!
//! Exactly one root set is current at a time. A root rebuild disposes the
//! previous set in full before the new one is returned, and bumps the
//! [`TreeEpoch`] so fetches still in flight for old nodes discard their
//! results.

use crate::epoch::TreeEpoch;
use crate::error::TreeError;
use crate::event::{DisposableStore, Emitter};
use crate::host::{
    CredentialStore, FolderRepositoryManager, ManagerState, RepositoriesManager, ReviewModel,
    RevealOptions, TreeView,
};
use crate::item::{CheckboxState, TreeItem};
use crate::model::PrsTreeModel;
use crate::node::{
    category_nodes, ActionKind, ActionNode, CategoryNode, NodeContext, NodeKind, RefreshFn,
    TreeNode, WorkspaceFolderNode,
};
use crate::readiness::{placeholder_actions, GateInput};
use crate::settings::SettingsStore;
use crate::state::TreeState;
use gh_pr_config::{Memento, FILE_LIST_LAYOUT_SETTING, QUERIES_SETTING};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};


/// Host context flag, false while the repositories manager initializes
pub const INITIALIZED_CONTEXT: &str = "github:initialized";

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

/// What changed, as announced to the host
#[derive(Debug, Clone)]
pub enum TreeChange {
    /// Re-request the root
    All,
    /// Re-request the children of one node
    Node(TreeNode),
}

/// A pull request to reveal
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestTarget {
    /// Restrict the search to the folder with this name
    pub folder: Option<String>,
    pub number: u64,
}

impl PullRequestTarget {
    pub fn new(number: u64) -> Self {
        Self {
            folder: None,
            number,
        }
    }

    pub fn in_folder(mut self, folder: impl Into<String>) -> Self {
        self.folder = Some(folder.into());
        self
    }
}

struct Collaborators {
    manager: Arc<dyn RepositoriesManager>,
    credentials: Arc<dyn CredentialStore>,
}

struct ProviderInner {
    view: Arc<dyn TreeView>,
    settings: Arc<dyn SettingsStore>,
    state: Arc<TreeState>,
    model: Arc<PrsTreeModel>,
    epoch: TreeEpoch,
    collaborators: Mutex<Option<Collaborators>>,
    root: Mutex<Option<Vec<TreeNode>>>,
    initialized_context: Mutex<Option<bool>>,
    on_did_change_tree_data: Emitter<TreeChange>,
    firing: AtomicBool,
    disposed: AtomicBool,
    disposables: DisposableStore,
    folder_disposables: DisposableStore,
}

/// The tree data provider
///
/// Cheap to clone; clones share one tree.
#[derive(Clone)]
pub struct PullRequestsTreeProvider {
    inner: Arc<ProviderInner>,
}

impl PullRequestsTreeProvider {
    /// Create a provider and subscribe to the view and settings
    ///
    /// Expansion and checkbox state are loaded from `memento` once, here.
    pub fn new(
        view: Arc<dyn TreeView>,
        settings: Arc<dyn SettingsStore>,
        memento: Arc<dyn Memento>,
    ) -> Self {
        let inner = Arc::new(ProviderInner {
            view,
            settings,
            state: Arc::new(TreeState::load(memento)),
            model: Arc::new(PrsTreeModel::new()),
            epoch: TreeEpoch::new(),
            collaborators: Mutex::new(None),
            root: Mutex::new(None),
            initialized_context: Mutex::new(None),
            on_did_change_tree_data: Emitter::new(),
            firing: AtomicBool::new(false),
            disposed: AtomicBool::new(false),
            disposables: DisposableStore::new(),
            folder_disposables: DisposableStore::new(),
        });

        let weak = Arc::downgrade(&inner);
        inner
            .disposables
            .add(inner.view.on_did_expand_element().event(move |node| {
                if let Some(inner) = weak.upgrade() {
                    inner.track_expansion(node, true);
                }
            }));

        let weak = Arc::downgrade(&inner);
        inner
            .disposables
            .add(inner.view.on_did_collapse_element().event(move |node| {
                if let Some(inner) = weak.upgrade() {
                    inner.track_expansion(node, false);
                }
            }));

        let weak = Arc::downgrade(&inner);
        inner
            .disposables
            .add(inner.view.on_did_change_checkbox_state().event(move |changes| {
                if let Some(inner) = weak.upgrade() {
                    inner.apply_checkbox_changes(changes);
                }
            }));

        let weak = Arc::downgrade(&inner);
        inner
            .disposables
            .add(inner.settings.on_did_change_configuration().event(move |change| {
                if change.affects(FILE_LIST_LAYOUT_SETTING) || change.affects(QUERIES_SETTING) {
                    if let Some(inner) = weak.upgrade() {
                        log::debug!("PullRequestsTreeProvider: {} changed", change.setting);
                        inner.refresh(None);
                    }
                }
            }));

        Self { inner }
    }

    /// Wire the repository, review and credential collaborators
    ///
    /// Fails with [`TreeError::AlreadyInitialized`] on a second call,
    /// leaving every existing subscription and the root set untouched.
    pub fn initialize(
        &self,
        manager: Arc<dyn RepositoriesManager>,
        review_models: Vec<Arc<dyn ReviewModel>>,
        credentials: Arc<dyn CredentialStore>,
    ) -> Result<(), TreeError> {
        let inner = &self.inner;
        {
            let mut slot = lock(&inner.collaborators);
            if slot.is_some() {
                log::error!("PullRequestsTreeProvider: initialize called twice");
                return Err(TreeError::AlreadyInitialized);
            }
            if inner.disposed.load(Ordering::SeqCst) {
                return Err(TreeError::Disposed);
            }
            *slot = Some(Collaborators {
                manager: Arc::clone(&manager),
                credentials,
            });
        }

        let weak = Arc::downgrade(inner);
        inner
            .disposables
            .add(manager.on_did_change_state().event(move |state| {
                if let Some(inner) = weak.upgrade() {
                    log::debug!("PullRequestsTreeProvider: manager state {:?}", state);
                    inner.refresh(None);
                }
            }));

        let weak = Arc::downgrade(inner);
        inner
            .disposables
            .add(manager.on_did_change_folder_managers().event(move |_| {
                if let Some(inner) = weak.upgrade() {
                    log::debug!("PullRequestsTreeProvider: workspace folders changed");
                    inner.subscribe_folders();
                    inner.refresh(None);
                }
            }));

        inner.subscribe_folders();

        for review_model in &review_models {
            let weak = Arc::downgrade(inner);
            inner
                .disposables
                .add(review_model.on_did_change_local_file_changes().event(move |_| {
                    if let Some(inner) = weak.upgrade() {
                        inner.refresh(None);
                    }
                }));
        }

        log::info!(
            "PullRequestsTreeProvider: initialized with {} folders, {} review models",
            manager.folder_managers().len(),
            review_models.len()
        );
        Ok(())
    }

    /// Announce a change of one subtree (`Some`) or the whole tree (`None`)
    pub fn refresh(&self, node: Option<&TreeNode>) {
        self.inner.refresh(node)
    }

    pub fn on_did_change_tree_data(&self) -> &Emitter<TreeChange> {
        &self.inner.on_did_change_tree_data
    }

    /// Children of `element`, or the root set when `None`
    pub async fn get_children(&self, element: Option<&TreeNode>) -> Vec<TreeNode> {
        self.inner.get_children(element).await
    }

    pub fn get_parent(&self, element: &TreeNode) -> Option<TreeNode> {
        element.parent()
    }

    /// Children already materialized, never fetching
    pub fn cached_children(&self, element: Option<&TreeNode>) -> Option<Vec<TreeNode>> {
        match element {
            Some(element) => element.cached_children(),
            None => lock(&self.inner.root).clone(),
        }
    }

    pub async fn get_tree_item(&self, element: &TreeNode) -> anyhow::Result<TreeItem> {
        element.tree_item().await
    }

    /// Fill the deferred parts of an item, for node kinds that defer any
    pub async fn resolve_tree_item(&self, element: &TreeNode, item: TreeItem) -> TreeItem {
        if element.resolves_lazily() {
            element.resolve_tree_item(item).await
        } else {
            item
        }
    }

    /// Reveal a pull request in the "All Open" category
    ///
    /// Materializes the root set first if nothing is cached yet. Returns
    /// whether the pull request was found; not finding it is no error.
    pub async fn expand_pull_request(&self, target: &PullRequestTarget) -> anyhow::Result<bool> {
        let roots = match self.cached_children(None) {
            Some(roots) => roots,
            None => self.get_children(None).await,
        };

        for root in roots {
            let category = match root.kind() {
                NodeKind::WorkspaceFolder => {
                    let matches_folder = root.as_workspace_folder().is_some_and(|folder| {
                        target.folder.as_deref().is_none_or(|name| name == folder.name())
                    });
                    if !matches_folder {
                        continue;
                    }
                    root.children()
                        .await
                        .into_iter()
                        .find(|child| child.as_category().is_some_and(|c| c.is_all()))
                }
                NodeKind::Category => Some(root),
                _ => None,
            };

            let Some(category) = category.as_ref().and_then(TreeNode::as_category) else {
                continue;
            };
            if !category.is_all()
                || target
                    .folder
                    .as_deref()
                    .is_some_and(|name| name != category.folder_name())
            {
                continue;
            }

            if let Some(node) = category.find_pull_request(target.number).await {
                log::debug!("PullRequestsTreeProvider: revealing {}", node.id());
                self.reveal(&node, RevealOptions::select_and_expand())?;
                return Ok(true);
            }
        }

        log::debug!(
            "PullRequestsTreeProvider: pull request #{} not in the tree",
            target.number
        );
        Ok(false)
    }

    pub fn reveal(&self, element: &TreeNode, options: RevealOptions) -> anyhow::Result<()> {
        self.inner.view.reveal(element, options)
    }

    /// Category with this id among the materialized nodes
    pub fn find_category(&self, id: &str) -> Option<Arc<CategoryNode>> {
        let roots = self.cached_children(None)?;
        roots
            .iter()
            .flat_map(|root| match root.kind() {
                NodeKind::WorkspaceFolder => root.cached_children().unwrap_or_default(),
                _ => vec![root.clone()],
            })
            .find(|node| node.kind() == NodeKind::Category && node.id() == id)
            .and_then(|node| node.as_category().cloned())
    }

    pub fn model(&self) -> &Arc<PrsTreeModel> {
        &self.inner.model
    }

    pub fn state(&self) -> &Arc<TreeState> {
        &self.inner.state
    }

    pub fn view(&self) -> &Arc<dyn TreeView> {
        &self.inner.view
    }

    /// Root-set generation, bumped on every rebuild
    pub fn epoch(&self) -> u64 {
        self.inner.epoch.current()
    }

    /// Release every subscription and the current root set
    ///
    /// Safe to call before `initialize` and more than once.
    pub fn dispose(&self) {
        let inner = &self.inner;
        if inner.disposed.swap(true, Ordering::SeqCst) {
            return;
        }
        inner.disposables.dispose();
        inner.folder_disposables.dispose();
        inner.dispose_root();
        log::debug!("PullRequestsTreeProvider: disposed");
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.load(Ordering::SeqCst)
    }
}

impl ProviderInner {
    fn refresh(&self, node: Option<&TreeNode>) {
        if self.disposed.load(Ordering::SeqCst) {
            return;
        }
        if self.firing.swap(true, Ordering::SeqCst) {
            log::debug!(
                "PullRequestsTreeProvider: dropping nested refresh of {:?}",
                node
            );
            return;
        }

        let change = match node {
            Some(node) => {
                node.invalidate();
                log::debug!("PullRequestsTreeProvider: refresh {}", node.id());
                TreeChange::Node(node.clone())
            }
            None => {
                log::debug!("PullRequestsTreeProvider: refresh all");
                TreeChange::All
            }
        };
        self.on_did_change_tree_data.fire(&change);
        self.firing.store(false, Ordering::SeqCst);
    }

    async fn get_children(self: &Arc<Self>, element: Option<&TreeNode>) -> Vec<TreeNode> {
        let Some((manager, credentials)) = self.collaborators() else {
            log::debug!("PullRequestsTreeProvider: get_children before initialize");
            return Vec::new();
        };

        let folders = manager.folder_managers();
        if folders.is_empty() {
            return Vec::new();
        }

        if manager.state() == ManagerState::Initializing {
            self.set_initialized_context(false);
            return Vec::new();
        }
        self.set_initialized_context(true);

        if folders.iter().all(|folder| folder.github_remotes().is_empty()) {
            let input = GateInput::collect(
                Some(manager.as_ref()),
                Some(credentials.as_ref()),
                self.settings.as_ref(),
            );
            let actions = placeholder_actions(&input);
            log::debug!(
                "PullRequestsTreeProvider: no usable GitHub remotes, showing {:?}",
                actions
            );
            return self.placeholders(element, &actions);
        }

        match element {
            None if folders.iter().all(|folder| folder.remotes().is_empty()) => {
                self.placeholders(None, &[ActionKind::Empty])
            }
            None => self.rebuild_root(&folders),
            Some(element) => element.children().await,
        }
    }

    /// Placeholder actions below `element`, or as the new root set
    fn placeholders(&self, element: Option<&TreeNode>, actions: &[ActionKind]) -> Vec<TreeNode> {
        match element {
            Some(parent) => {
                let core = parent.as_node().core();
                let nodes: Vec<TreeNode> = actions
                    .iter()
                    .map(|kind| {
                        TreeNode::Action(ActionNode::new(
                            *kind,
                            Some(parent),
                            &self.epoch,
                            core.born(),
                        ))
                    })
                    .collect();
                core.install(nodes)
            }
            None => {
                self.dispose_root();
                let born = self.epoch.bump();
                let nodes: Vec<TreeNode> = actions
                    .iter()
                    .map(|kind| {
                        TreeNode::Action(ActionNode::new(*kind, None, &self.epoch, born))
                    })
                    .collect();
                *lock(&self.root) = Some(nodes.clone());
                nodes
            }
        }
    }

    fn rebuild_root(
        self: &Arc<Self>,
        folders: &[Arc<dyn FolderRepositoryManager>],
    ) -> Vec<TreeNode> {
        self.dispose_root();
        let born = self.epoch.bump();
        let ctx = self.node_context();

        let nodes = match folders {
            [folder] => category_nodes(folder, None, &ctx, born),
            _ => folders
                .iter()
                .map(|folder| {
                    TreeNode::WorkspaceFolder(WorkspaceFolderNode::new(
                        Arc::clone(folder),
                        &ctx,
                        born,
                    ))
                })
                .collect(),
        };

        log::debug!(
            "PullRequestsTreeProvider: root set {} with {} nodes",
            born,
            nodes.len()
        );
        *lock(&self.root) = Some(nodes.clone());
        nodes
    }

    fn dispose_root(&self) {
        let previous = lock(&self.root).take();
        if let Some(previous) = previous {
            log::debug!(
                "PullRequestsTreeProvider: disposing {} root nodes",
                previous.len()
            );
            for node in previous {
                node.dispose();
            }
        }
    }

    fn node_context(self: &Arc<Self>) -> NodeContext {
        let weak: Weak<ProviderInner> = Arc::downgrade(self);
        let refresh: RefreshFn = Arc::new(move |node: Option<TreeNode>| {
            if let Some(inner) = weak.upgrade() {
                inner.refresh(node.as_ref());
            }
        });
        NodeContext {
            model: Arc::clone(&self.model),
            state: Arc::clone(&self.state),
            settings: Arc::clone(&self.settings),
            epoch: self.epoch.clone(),
            refresh,
        }
    }

    fn collaborators(&self) -> Option<(Arc<dyn RepositoriesManager>, Arc<dyn CredentialStore>)> {
        lock(&self.collaborators)
            .as_ref()
            .map(|c| (Arc::clone(&c.manager), Arc::clone(&c.credentials)))
    }

    fn subscribe_folders(self: &Arc<Self>) {
        self.folder_disposables.clear();
        let Some((manager, _)) = self.collaborators() else {
            return;
        };
        for folder in manager.folder_managers() {
            let weak = Arc::downgrade(self);
            self.folder_disposables
                .add(folder.on_did_change_repositories().event(move |_| {
                    if let Some(inner) = weak.upgrade() {
                        inner.refresh(None);
                    }
                }));
        }
    }

    fn set_initialized_context(&self, value: bool) {
        let changed = {
            let mut current = lock(&self.initialized_context);
            let changed = *current != Some(value);
            *current = Some(value);
            changed
        };
        if changed {
            self.view.set_context(INITIALIZED_CONTEXT, value);
        }
    }

    fn track_expansion(&self, node: &TreeNode, expanded: bool) {
        if node.kind() != NodeKind::Category {
            return;
        }
        if let Err(e) = self.state.set_expanded(node.id(), expanded) {
            log::error!(
                "PullRequestsTreeProvider: failed to persist expansion of {}: {:#}",
                node.id(),
                e
            );
        }
    }

    fn apply_checkbox_changes(&self, changes: &[(TreeNode, CheckboxState)]) {
        for (node, state) in changes {
            match node.as_file_change() {
                Some(file) => file.update_from_checkbox_changed(*state),
                None => log::debug!(
                    "PullRequestsTreeProvider: ignoring checkbox change on {:?}",
                    node
                ),
            }
        }
    }
}
