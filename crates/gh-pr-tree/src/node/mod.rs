//! Tree nodes
//!
//! Every node implements [`Node`]; the closed set of variants is the
//! [`TreeNode`] enum, which is what the provider and the host pass around.
//!
//! ```text
//! WorkspaceFolder (multi-folder shape only)
//!   └── Category ("Local Pull Request Branches", queries..., "All Open")
//!         ├── PullRequest
//!         │     ├── Directory
//!         │     │     └── FileChange (checkbox)
//!         │     └── FileChange (checkbox)
//!         └── Action (More, Empty, Login, Error, ...)
//! ```
//!
//! Nodes own their children top-down. Parent links are weak lookups. A
//! node's materialized children stay its cached answer until the node is
//! invalidated or disposed.

mod action;
mod category;
mod file_change;
mod pull_request;
mod workspace_folder;

pub use action::{ActionKind, ActionNode};
pub use category::{CategoryNode, ALL_OPEN_LABEL, LOCAL_BRANCHES_LABEL};
pub use file_change::{DirectoryNode, FileEntry, FileChangeNode};
pub use pull_request::PullRequestNode;
pub use workspace_folder::{category_nodes, WorkspaceFolderNode};

pub(crate) use action::error_action;

use crate::epoch::TreeEpoch;
use crate::event::DisposableStore;
use crate::item::TreeItem;
use crate::model::PrsTreeModel;
use crate::settings::SettingsStore;
use crate::state::TreeState;
use async_trait::async_trait;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

/// Kind of a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    WorkspaceFolder,
    Category,
    PullRequest,
    Directory,
    FileChange,
    Action(ActionKind),
}

/// Fires a scoped (`Some`) or full (`None`) refresh on the provider
pub type RefreshFn = Arc<dyn Fn(Option<TreeNode>) + Send + Sync>;

/// Everything a node needs from the provider
#[derive(Clone)]
pub struct NodeContext {
    pub model: Arc<PrsTreeModel>,
    pub state: Arc<TreeState>,
    pub settings: Arc<dyn SettingsStore>,
    pub epoch: TreeEpoch,
    pub refresh: RefreshFn,
}

/// The capability every node variant implements
#[async_trait]
pub trait Node: Send + Sync {
    /// Shared identity, parent link and child cache
    fn core(&self) -> &NodeCore;

    fn kind(&self) -> NodeKind;

    /// Host descriptor of this node
    async fn tree_item(&self) -> anyhow::Result<TreeItem>;

    /// Build the children from scratch
    ///
    /// Called only when nothing is cached. Failures are turned into action
    /// nodes here rather than propagated.
    async fn load_children(&self) -> Vec<TreeNode>;

    /// Whether `resolve_tree_item` adds anything
    fn resolves_lazily(&self) -> bool {
        false
    }

    /// Fill the expensive parts of an already rendered item
    async fn resolve_tree_item(&self, item: TreeItem) -> TreeItem {
        item
    }
}

/// State shared by every node variant
pub struct NodeCore {
    id: String,
    parent: Option<WeakTreeNode>,
    born: u64,
    epoch: TreeEpoch,
    disposed: AtomicBool,
    children: Mutex<Option<Vec<TreeNode>>>,
    subscriptions: DisposableStore,
}

impl NodeCore {
    pub fn new(
        id: impl Into<String>,
        parent: Option<WeakTreeNode>,
        epoch: &TreeEpoch,
        born: u64,
    ) -> Self {
        Self {
            id: id.into(),
            parent,
            born,
            epoch: epoch.clone(),
            disposed: AtomicBool::new(false),
            children: Mutex::new(None),
            subscriptions: DisposableStore::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn parent(&self) -> Option<TreeNode> {
        self.parent.as_ref().and_then(WeakTreeNode::upgrade)
    }

    /// Root-set generation this node belongs to
    pub fn born(&self) -> u64 {
        self.born
    }

    /// Disposed, or part of a root set that has been replaced
    pub fn is_stale(&self) -> bool {
        self.disposed.load(Ordering::SeqCst) || !self.epoch.is_current(self.born)
    }

    pub fn cached_children(&self) -> Option<Vec<TreeNode>> {
        lock(&self.children).clone()
    }

    /// Install freshly built children as the cached answer
    ///
    /// A stale node discards and disposes what it was handed and answers
    /// with nothing. Children replaced by the install are disposed.
    pub fn install(&self, children: Vec<TreeNode>) -> Vec<TreeNode> {
        let previous = {
            let mut slot = lock(&self.children);
            if self.is_stale() {
                drop(slot);
                log::debug!(
                    "Node {}: discarding {} children of a stale fetch",
                    self.id,
                    children.len()
                );
                for child in &children {
                    child.dispose();
                }
                return Vec::new();
            }
            slot.replace(children.clone())
        };

        for child in previous.into_iter().flatten() {
            child.dispose();
        }
        children
    }

    /// Drop the cached children so the next request rebuilds them
    pub fn invalidate(&self) {
        let previous = lock(&self.children).take();
        if let Some(previous) = previous {
            log::debug!("Node {}: invalidated {} children", self.id, previous.len());
            for child in previous {
                child.dispose();
            }
        }
    }

    /// Release subscriptions and dispose the subtree; runs once
    pub fn dispose(&self) {
        if self.disposed.swap(true, Ordering::SeqCst) {
            return;
        }
        let children = lock(&self.children).take();
        for child in children.into_iter().flatten() {
            child.dispose();
        }
        self.subscriptions.dispose();
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::SeqCst)
    }

    /// Subscriptions released when the node is disposed
    pub fn subscriptions(&self) -> &DisposableStore {
        &self.subscriptions
    }
}

impl fmt::Debug for NodeCore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeCore")
            .field("id", &self.id)
            .field("born", &self.born)
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

/// A node of the tree
#[derive(Clone)]
pub enum TreeNode {
    WorkspaceFolder(Arc<WorkspaceFolderNode>),
    Category(Arc<CategoryNode>),
    PullRequest(Arc<PullRequestNode>),
    Directory(Arc<DirectoryNode>),
    FileChange(Arc<FileChangeNode>),
    Action(Arc<ActionNode>),
}

impl TreeNode {
    pub fn as_node(&self) -> &dyn Node {
        match self {
            TreeNode::WorkspaceFolder(n) => &**n as &dyn Node,
            TreeNode::Category(n) => &**n as &dyn Node,
            TreeNode::PullRequest(n) => &**n as &dyn Node,
            TreeNode::Directory(n) => &**n as &dyn Node,
            TreeNode::FileChange(n) => &**n as &dyn Node,
            TreeNode::Action(n) => &**n as &dyn Node,
        }
    }

    pub fn id(&self) -> &str {
        self.as_node().core().id()
    }

    pub fn kind(&self) -> NodeKind {
        self.as_node().kind()
    }

    pub fn parent(&self) -> Option<TreeNode> {
        self.as_node().core().parent()
    }

    pub fn cached_children(&self) -> Option<Vec<TreeNode>> {
        self.as_node().core().cached_children()
    }

    /// Cached children, or freshly loaded ones installed as the new cache
    pub async fn children(&self) -> Vec<TreeNode> {
        if let Some(children) = self.cached_children() {
            return children;
        }
        let node = self.as_node();
        let loaded = node.load_children().await;
        node.core().install(loaded)
    }

    pub async fn tree_item(&self) -> anyhow::Result<TreeItem> {
        self.as_node().tree_item().await
    }

    pub fn resolves_lazily(&self) -> bool {
        self.as_node().resolves_lazily()
    }

    pub async fn resolve_tree_item(&self, item: TreeItem) -> TreeItem {
        self.as_node().resolve_tree_item(item).await
    }

    pub fn invalidate(&self) {
        self.as_node().core().invalidate()
    }

    pub fn dispose(&self) {
        self.as_node().core().dispose()
    }

    pub fn is_disposed(&self) -> bool {
        self.as_node().core().is_disposed()
    }

    pub fn downgrade(&self) -> WeakTreeNode {
        match self {
            TreeNode::WorkspaceFolder(n) => WeakTreeNode::WorkspaceFolder(Arc::downgrade(n)),
            TreeNode::Category(n) => WeakTreeNode::Category(Arc::downgrade(n)),
            TreeNode::PullRequest(n) => WeakTreeNode::PullRequest(Arc::downgrade(n)),
            TreeNode::Directory(n) => WeakTreeNode::Directory(Arc::downgrade(n)),
            TreeNode::FileChange(n) => WeakTreeNode::FileChange(Arc::downgrade(n)),
            TreeNode::Action(n) => WeakTreeNode::Action(Arc::downgrade(n)),
        }
    }

    /// Same node object, not just the same identity
    pub fn ptr_eq(&self, other: &TreeNode) -> bool {
        match (self, other) {
            (TreeNode::WorkspaceFolder(a), TreeNode::WorkspaceFolder(b)) => Arc::ptr_eq(a, b),
            (TreeNode::Category(a), TreeNode::Category(b)) => Arc::ptr_eq(a, b),
            (TreeNode::PullRequest(a), TreeNode::PullRequest(b)) => Arc::ptr_eq(a, b),
            (TreeNode::Directory(a), TreeNode::Directory(b)) => Arc::ptr_eq(a, b),
            (TreeNode::FileChange(a), TreeNode::FileChange(b)) => Arc::ptr_eq(a, b),
            (TreeNode::Action(a), TreeNode::Action(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    pub fn as_category(&self) -> Option<&Arc<CategoryNode>> {
        match self {
            TreeNode::Category(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_pull_request(&self) -> Option<&Arc<PullRequestNode>> {
        match self {
            TreeNode::PullRequest(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_file_change(&self) -> Option<&Arc<FileChangeNode>> {
        match self {
            TreeNode::FileChange(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_workspace_folder(&self) -> Option<&Arc<WorkspaceFolderNode>> {
        match self {
            TreeNode::WorkspaceFolder(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_action(&self) -> Option<&Arc<ActionNode>> {
        match self {
            TreeNode::Action(n) => Some(n),
            _ => None,
        }
    }
}

/// Identity equality: same kind and same id
impl PartialEq for TreeNode {
    fn eq(&self, other: &Self) -> bool {
        self.kind() == other.kind() && self.id() == other.id()
    }
}

impl Eq for TreeNode {}

impl fmt::Debug for TreeNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}({})", self.kind(), self.id())
    }
}

/// Non-owning link to a node, used for parent lookups
#[derive(Clone)]
pub enum WeakTreeNode {
    WorkspaceFolder(Weak<WorkspaceFolderNode>),
    Category(Weak<CategoryNode>),
    PullRequest(Weak<PullRequestNode>),
    Directory(Weak<DirectoryNode>),
    FileChange(Weak<FileChangeNode>),
    Action(Weak<ActionNode>),
}

impl WeakTreeNode {
    pub fn upgrade(&self) -> Option<TreeNode> {
        match self {
            WeakTreeNode::WorkspaceFolder(w) => w.upgrade().map(TreeNode::WorkspaceFolder),
            WeakTreeNode::Category(w) => w.upgrade().map(TreeNode::Category),
            WeakTreeNode::PullRequest(w) => w.upgrade().map(TreeNode::PullRequest),
            WeakTreeNode::Directory(w) => w.upgrade().map(TreeNode::Directory),
            WeakTreeNode::FileChange(w) => w.upgrade().map(TreeNode::FileChange),
            WeakTreeNode::Action(w) => w.upgrade().map(TreeNode::Action),
        }
    }
}

impl fmt::Debug for WeakTreeNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.upgrade() {
            Some(node) => write!(f, "Weak({:?})", node),
            None => write!(f, "Weak(<dropped>)"),
        }
    }
}
