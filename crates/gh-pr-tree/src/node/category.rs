//! Category nodes
//!
//! A category lists the pull requests of one query in one folder. Its pages
//! live in the shared `PrsTreeModel`; the node only turns them into children.

use super::{
    error_action, ActionKind, ActionNode, Node, NodeContext, NodeCore, NodeKind,
    PullRequestNode, TreeNode, WeakTreeNode,
};
use crate::host::FolderRepositoryManager;
use crate::item::{Collapsible, TreeItem};
use crate::model::CategoryKey;
use async_trait::async_trait;
use gh_client::CategoryQuery;
use std::sync::{Arc, Weak};

/// Label of the built-in category of locally checked out branches
pub const LOCAL_BRANCHES_LABEL: &str = "Local Pull Request Branches";
/// Label of the built-in category of every open pull request
pub const ALL_OPEN_LABEL: &str = "All Open";

pub struct CategoryNode {
    core: NodeCore,
    me: Weak<CategoryNode>,
    ctx: NodeContext,
    folder: Arc<dyn FolderRepositoryManager>,
    key: CategoryKey,
    label: String,
    query: CategoryQuery,
}

impl CategoryNode {
    /// Build a category and subscribe it to data changes of its key
    pub fn new(
        id: String,
        label: String,
        query: CategoryQuery,
        folder: Arc<dyn FolderRepositoryManager>,
        parent: Option<WeakTreeNode>,
        ctx: &NodeContext,
        born: u64,
    ) -> Arc<Self> {
        Arc::new_cyclic(|me: &Weak<CategoryNode>| {
            let key = CategoryKey::new(folder.folder().key(), label.clone());
            let core = NodeCore::new(id, parent, &ctx.epoch, born);

            let weak = me.clone();
            let watched = key.clone();
            let refresh = Arc::clone(&ctx.refresh);
            core.subscriptions()
                .add(ctx.model.on_did_change_data().event(move |changed| {
                    if *changed != watched {
                        return;
                    }
                    if let Some(node) = weak.upgrade() {
                        refresh(Some(TreeNode::Category(node)));
                    }
                }));

            Self {
                core,
                me: me.clone(),
                ctx: ctx.clone(),
                folder,
                key,
                label,
                query,
            }
        })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn key(&self) -> &CategoryKey {
        &self.key
    }

    pub fn query(&self) -> &CategoryQuery {
        &self.query
    }

    pub fn folder_name(&self) -> &str {
        &self.folder.folder().name
    }

    /// Whether this is the built-in "All Open" category
    pub fn is_all(&self) -> bool {
        self.query == CategoryQuery::All
    }

    fn weak(&self) -> WeakTreeNode {
        WeakTreeNode::Category(self.me.clone())
    }

    /// Fetch the next page; the model's change event refreshes this node
    pub async fn load_more(&self) -> anyhow::Result<()> {
        let source = self.folder.source();
        self.ctx
            .model
            .load_more(source.as_ref(), &self.key, &self.query)
            .await?;
        Ok(())
    }

    /// Find the node of pull request `number`, following further pages
    ///
    /// Pages fetched during the search refresh this node once, before the
    /// returned node is materialized.
    pub async fn find_pull_request(&self, number: u64) -> Option<TreeNode> {
        let this = self.me.upgrade().map(TreeNode::Category)?;
        let is_target = |child: &TreeNode| {
            child
                .as_pull_request()
                .is_some_and(|pr| pr.pull_request().number == number)
        };

        let mut loaded_pages = false;
        loop {
            let children = this.children().await;
            if children.iter().any(is_target)
                || !self.ctx.model.has_more(&self.key)
                || self.core.is_stale()
            {
                break;
            }

            let source = self.folder.source();
            if let Err(e) = self
                .ctx
                .model
                .get_pull_requests(source.as_ref(), &self.key, &self.query, true)
                .await
            {
                log::warn!("CategoryNode {}: failed to load next page: {:#}", self.core.id(), e);
                break;
            }
            loaded_pages = true;
            self.core.invalidate();
        }

        if loaded_pages {
            (self.ctx.refresh)(Some(this.clone()));
        }
        this.children().await.into_iter().find(is_target)
    }
}

#[async_trait]
impl Node for CategoryNode {
    fn core(&self) -> &NodeCore {
        &self.core
    }

    fn kind(&self) -> NodeKind {
        NodeKind::Category
    }

    async fn tree_item(&self) -> anyhow::Result<TreeItem> {
        let collapsible = if self.ctx.state.is_expanded(self.core.id()) {
            Collapsible::Expanded
        } else {
            Collapsible::Collapsed
        };
        Ok(TreeItem::new(self.core.id(), self.label.clone(), collapsible)
            .with_context_value("category"))
    }

    async fn load_children(&self) -> Vec<TreeNode> {
        let source = self.folder.source();
        let born = self.core.born();
        let id = self.core.id();

        let page = match self
            .ctx
            .model
            .get_pull_requests(source.as_ref(), &self.key, &self.query, false)
            .await
        {
            Ok(page) => page,
            Err(e) => return vec![error_action(&e, self.weak(), id, &self.ctx, born)],
        };

        let mut children: Vec<TreeNode> = page
            .pull_requests
            .iter()
            .map(|pr| {
                TreeNode::PullRequest(PullRequestNode::new(
                    pr.clone(),
                    Arc::clone(&self.folder),
                    self.weak(),
                    id,
                    &self.ctx,
                    born,
                ))
            })
            .collect();

        let trailer = if page.has_more() {
            Some(ActionKind::More)
        } else if page.unsearched_remotes {
            Some(ActionKind::TryOtherRemotes)
        } else if children.is_empty() {
            Some(ActionKind::Empty)
        } else {
            None
        };

        if let Some(kind) = trailer {
            let argument = (kind == ActionKind::More).then(|| id.to_string());
            children.push(TreeNode::Action(ActionNode::below(
                kind,
                self.weak(),
                id,
                &self.ctx,
                born,
                None,
                argument,
            )));
        }

        log::debug!(
            "CategoryNode {}: {} children (more: {})",
            id,
            children.len(),
            page.has_more()
        );
        children
    }
}

impl std::fmt::Debug for CategoryNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CategoryNode")
            .field("core", &self.core)
            .field("key", &self.key)
            .field("query", &self.query)
            .finish()
    }
}
