//! Pull request nodes

use super::file_change::{entry_nodes, FileChangeNode, FileEntry};
use super::{error_action, Node, NodeContext, NodeCore, NodeKind, TreeNode, WeakTreeNode};
use crate::host::FolderRepositoryManager;
use crate::item::{Collapsible, TreeItem};
use async_trait::async_trait;
use gh_client::PullRequest;
use gh_pr_config::FileListLayout;
use std::sync::{Arc, Weak};

pub struct PullRequestNode {
    core: NodeCore,
    me: Weak<PullRequestNode>,
    ctx: NodeContext,
    folder: Arc<dyn FolderRepositoryManager>,
    pull_request: PullRequest,
}

impl PullRequestNode {
    pub fn new(
        pull_request: PullRequest,
        folder: Arc<dyn FolderRepositoryManager>,
        parent: WeakTreeNode,
        parent_id: &str,
        ctx: &NodeContext,
        born: u64,
    ) -> Arc<Self> {
        Arc::new_cyclic(|me| Self {
            core: NodeCore::new(
                format!("{}/#{}", parent_id, pull_request.number),
                Some(parent),
                &ctx.epoch,
                born,
            ),
            me: me.clone(),
            ctx: ctx.clone(),
            folder,
            pull_request,
        })
    }

    pub fn pull_request(&self) -> &PullRequest {
        &self.pull_request
    }

    /// Key of this pull request's files in the checkbox state, shared by
    /// every category listing it
    fn checkbox_prefix(&self) -> String {
        format!("{}#{}", self.folder.folder().key(), self.pull_request.number)
    }
}

#[async_trait]
impl Node for PullRequestNode {
    fn core(&self) -> &NodeCore {
        &self.core
    }

    fn kind(&self) -> NodeKind {
        NodeKind::PullRequest
    }

    async fn tree_item(&self) -> anyhow::Result<TreeItem> {
        let pr = &self.pull_request;
        let context = if pr.draft {
            "pullrequest:draft"
        } else {
            "pullrequest"
        };
        Ok(TreeItem::new(
            self.core.id(),
            format!("#{}: {}", pr.number, pr.title),
            Collapsible::Collapsed,
        )
        .with_description(format!("by @{}", pr.author))
        .with_context_value(context))
    }

    async fn load_children(&self) -> Vec<TreeNode> {
        let source = self.folder.source();
        let born = self.core.born();
        let id = self.core.id();
        let parent = WeakTreeNode::PullRequest(self.me.clone());

        let mut files = match source.fetch_file_changes(self.pull_request.number).await {
            Ok(files) => files,
            Err(e) => return vec![error_action(&e, parent, id, &self.ctx, born)],
        };

        let prefix = self.checkbox_prefix();
        match self.ctx.settings.config().file_list_layout {
            FileListLayout::Flat => {
                files.sort_by(|a, b| a.path.cmp(&b.path));
                files
                    .into_iter()
                    .map(|change| {
                        let label = change.path.clone();
                        TreeNode::FileChange(FileChangeNode::new(
                            change,
                            label,
                            parent.clone(),
                            id,
                            &prefix,
                            &self.ctx,
                            born,
                        ))
                    })
                    .collect()
            }
            FileListLayout::Tree => {
                let root = FileEntry::from_files(&files);
                entry_nodes(&root.children, parent, id, &prefix, &self.ctx, born)
            }
        }
    }

    fn resolves_lazily(&self) -> bool {
        true
    }

    async fn resolve_tree_item(&self, mut item: TreeItem) -> TreeItem {
        let pr = &self.pull_request;
        let mut tooltip = format!(
            "{} (#{})\n@{} wants to merge {} into {}",
            pr.title, pr.number, pr.author, pr.head_branch, pr.base_branch
        );
        if let Some(body) = pr.body.as_deref().filter(|b| !b.trim().is_empty()) {
            tooltip.push_str("\n\n");
            tooltip.push_str(body.trim());
        }
        item.tooltip = Some(tooltip);
        item
    }
}

impl std::fmt::Debug for PullRequestNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PullRequestNode")
            .field("core", &self.core)
            .field("number", &self.pull_request.number)
            .finish()
    }
}
