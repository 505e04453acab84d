//! Placeholder and action nodes
//!
//! Absence conditions and failures are modeled as data: a leaf node with a
//! fixed label and, where the user can do something about it, a command.

use super::{Node, NodeContext, NodeCore, NodeKind, TreeNode, WeakTreeNode};
use crate::commands::CommandId;
use crate::epoch::TreeEpoch;
use crate::item::{Collapsible, ItemCommand, TreeItem};
use async_trait::async_trait;
use gh_client::ClientError;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    /// Category without pull requests
    Empty,
    /// Category has further pages
    More,
    /// Some remotes were not searched yet
    TryOtherRemotes,
    /// Not signed in to github.com
    Login,
    /// Not signed in to a GitHub Enterprise host
    LoginEnterprise,
    /// No GitHub remote in any folder
    NoRemotes,
    /// The remote allowlist matched nothing
    NoMatchingRemotes,
    /// Open the remote allowlist setting
    ConfigureRemotes,
    /// A fetch failed
    Error,
}

impl ActionKind {
    pub fn label(&self) -> &'static str {
        match self {
            ActionKind::Empty => "0 pull requests in this category",
            ActionKind::More => "Load more",
            ActionKind::TryOtherRemotes => "Continue fetching from other remotes",
            ActionKind::Login => "Sign in",
            ActionKind::LoginEnterprise => "Sign in with GitHub Enterprise...",
            ActionKind::NoRemotes => "No GitHub repositories found.",
            ActionKind::NoMatchingRemotes => "No remotes match the current setting.",
            ActionKind::ConfigureRemotes => "Configure remotes...",
            ActionKind::Error => "Error while fetching pull requests",
        }
    }

    /// Id suffix, unique per kind
    pub fn slug(&self) -> &'static str {
        match self {
            ActionKind::Empty => "empty",
            ActionKind::More => "more",
            ActionKind::TryOtherRemotes => "try-other-remotes",
            ActionKind::Login => "login",
            ActionKind::LoginEnterprise => "login-enterprise",
            ActionKind::NoRemotes => "no-remotes",
            ActionKind::NoMatchingRemotes => "no-matching-remotes",
            ActionKind::ConfigureRemotes => "configure-remotes",
            ActionKind::Error => "error",
        }
    }

    fn command(&self) -> Option<CommandId> {
        match self {
            ActionKind::More => Some(CommandId::LoadMore),
            ActionKind::TryOtherRemotes | ActionKind::ConfigureRemotes => {
                Some(CommandId::ConfigureRemotes)
            }
            ActionKind::Login => Some(CommandId::SignIn),
            ActionKind::LoginEnterprise => Some(CommandId::SignInEnterprise),
            ActionKind::Empty
            | ActionKind::NoRemotes
            | ActionKind::NoMatchingRemotes
            | ActionKind::Error => None,
        }
    }
}

/// Leaf node standing in for data
#[derive(Debug)]
pub struct ActionNode {
    core: NodeCore,
    kind: ActionKind,
    detail: Option<String>,
    argument: Option<String>,
}

impl ActionNode {
    /// Build an action node below `parent`, or at the root when `None`
    pub fn new(
        kind: ActionKind,
        parent: Option<&TreeNode>,
        epoch: &TreeEpoch,
        born: u64,
    ) -> Arc<Self> {
        let parent_id = parent.map_or("root", TreeNode::id);
        let id = format!("{}:{}", parent_id, kind.slug());
        Arc::new(Self {
            core: NodeCore::new(id, parent.map(TreeNode::downgrade), epoch, born),
            kind,
            detail: None,
            argument: None,
        })
    }

    /// Build an action node below a parent known only by its weak link
    pub(crate) fn below(
        kind: ActionKind,
        parent: WeakTreeNode,
        parent_id: &str,
        ctx: &NodeContext,
        born: u64,
        detail: Option<String>,
        argument: Option<String>,
    ) -> Arc<Self> {
        Arc::new(Self {
            core: NodeCore::new(
                format!("{}:{}", parent_id, kind.slug()),
                Some(parent),
                &ctx.epoch,
                born,
            ),
            kind,
            detail,
            argument,
        })
    }

    pub fn action(&self) -> ActionKind {
        self.kind
    }

    pub fn detail(&self) -> Option<&str> {
        self.detail.as_deref()
    }
}

#[async_trait]
impl Node for ActionNode {
    fn core(&self) -> &NodeCore {
        &self.core
    }

    fn kind(&self) -> NodeKind {
        NodeKind::Action(self.kind)
    }

    async fn tree_item(&self) -> anyhow::Result<TreeItem> {
        let mut item = TreeItem::new(self.core.id(), self.kind.label(), Collapsible::None)
            .with_context_value(self.kind.slug());
        if let Some(detail) = &self.detail {
            item = item.with_description(detail.clone());
        }
        if let Some(id) = self.kind.command() {
            let mut command = ItemCommand::new(id, self.kind.label());
            if let Some(argument) = &self.argument {
                command = command.with_argument(argument.clone());
            }
            item = item.with_command(command);
        }
        Ok(item)
    }

    async fn load_children(&self) -> Vec<TreeNode> {
        Vec::new()
    }
}

/// Turn a fetch failure into the node the user should see instead
pub(crate) fn error_action(
    err: &anyhow::Error,
    parent: WeakTreeNode,
    parent_id: &str,
    ctx: &NodeContext,
    born: u64,
) -> TreeNode {
    let (kind, detail) = match err.downcast_ref::<ClientError>() {
        Some(client_err @ ClientError::Unauthenticated { .. }) => {
            let kind = if client_err.is_enterprise_auth() {
                ActionKind::LoginEnterprise
            } else {
                ActionKind::Login
            };
            (kind, None)
        }
        _ => (ActionKind::Error, Some(format!("{:#}", err))),
    };

    log::debug!("Node {}: fetch failed, showing {:?}: {:#}", parent_id, kind, err);
    TreeNode::Action(ActionNode::below(
        kind, parent, parent_id, ctx, born, detail, None,
    ))
}
