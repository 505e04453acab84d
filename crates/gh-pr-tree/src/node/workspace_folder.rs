//! Workspace folder nodes and the category list of a folder

use super::{CategoryNode, Node, NodeContext, NodeCore, NodeKind, TreeNode, WeakTreeNode};
use super::{ALL_OPEN_LABEL, LOCAL_BRANCHES_LABEL};
use crate::host::FolderRepositoryManager;
use crate::item::{Collapsible, TreeItem};
use async_trait::async_trait;
use gh_client::CategoryQuery;
use std::collections::HashSet;
use std::sync::{Arc, Weak};

/// Build the categories of one folder, in display order
///
/// `parent` is the workspace folder node in the multi-folder shape and
/// `None` when the categories are the root set. Category ids are the label
/// alone at the root and `<folder>/<label>` below a folder node.
pub fn category_nodes(
    folder: &Arc<dyn FolderRepositoryManager>,
    parent: Option<WeakTreeNode>,
    ctx: &NodeContext,
    born: u64,
) -> Vec<TreeNode> {
    let config = ctx.settings.config();
    let folder_name = folder.folder().name.clone();

    let mut categories = vec![(LOCAL_BRANCHES_LABEL.to_string(), CategoryQuery::LocalBranches)];
    let mut seen: HashSet<String> = [LOCAL_BRANCHES_LABEL, ALL_OPEN_LABEL]
        .into_iter()
        .map(String::from)
        .collect();
    for query in config.queries {
        if !seen.insert(query.label.clone()) {
            log::warn!(
                "Folder {}: skipping duplicate category '{}'",
                folder_name,
                query.label
            );
            continue;
        }
        categories.push((query.label, CategoryQuery::Query(query.query)));
    }
    categories.push((ALL_OPEN_LABEL.to_string(), CategoryQuery::All));

    categories
        .into_iter()
        .map(|(label, query)| {
            let id = if parent.is_some() {
                format!("{}/{}", folder_name, label)
            } else {
                label.clone()
            };
            TreeNode::Category(CategoryNode::new(
                id,
                label,
                query,
                Arc::clone(folder),
                parent.clone(),
                ctx,
                born,
            ))
        })
        .collect()
}

/// One folder of a multi-folder workspace
pub struct WorkspaceFolderNode {
    core: NodeCore,
    me: Weak<WorkspaceFolderNode>,
    ctx: NodeContext,
    folder: Arc<dyn FolderRepositoryManager>,
}

impl WorkspaceFolderNode {
    pub fn new(
        folder: Arc<dyn FolderRepositoryManager>,
        ctx: &NodeContext,
        born: u64,
    ) -> Arc<Self> {
        Arc::new_cyclic(|me| Self {
            core: NodeCore::new(folder.folder().key(), None, &ctx.epoch, born),
            me: me.clone(),
            ctx: ctx.clone(),
            folder,
        })
    }

    pub fn name(&self) -> &str {
        &self.folder.folder().name
    }
}

#[async_trait]
impl Node for WorkspaceFolderNode {
    fn core(&self) -> &NodeCore {
        &self.core
    }

    fn kind(&self) -> NodeKind {
        NodeKind::WorkspaceFolder
    }

    async fn tree_item(&self) -> anyhow::Result<TreeItem> {
        Ok(
            TreeItem::new(self.core.id(), self.name(), Collapsible::Expanded)
                .with_context_value("workspacefolder"),
        )
    }

    async fn load_children(&self) -> Vec<TreeNode> {
        category_nodes(
            &self.folder,
            Some(WeakTreeNode::WorkspaceFolder(self.me.clone())),
            &self.ctx,
            self.core.born(),
        )
    }
}

impl std::fmt::Debug for WorkspaceFolderNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkspaceFolderNode")
            .field("core", &self.core)
            .field("folder", self.folder.folder())
            .finish()
    }
}
