//! Console rendition of the host view
//!
//! `ConsoleView` answers the view side of the provider's protocol and
//! `render_tree` pulls the tree the way a host would, one `get_children` per
//! expandable node, printing each level with box-drawing prefixes.

use anyhow::Result;
use gh_pr_tree::{
    CheckboxChanges, CheckboxState, Collapsible, Emitter, PullRequestsTreeProvider, RevealOptions,
    TreeItem, TreeNode, TreeView,
};
use std::sync::Mutex;

#[derive(Default)]
pub struct ConsoleView {
    revealed: Mutex<Vec<String>>,
    opened_settings: Mutex<Vec<String>>,
    on_did_expand_element: Emitter<TreeNode>,
    on_did_collapse_element: Emitter<TreeNode>,
    on_did_change_checkbox_state: Emitter<CheckboxChanges>,
}

impl ConsoleView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ids of the nodes revealed so far
    pub fn revealed(&self) -> Vec<String> {
        self.revealed
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn opened_settings(&self) -> Vec<String> {
        self.opened_settings
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

impl TreeView for ConsoleView {
    fn reveal(&self, node: &TreeNode, options: RevealOptions) -> Result<()> {
        log::info!("ConsoleView: reveal {} {:?}", node.id(), options);

        // Revealing a node expands every ancestor on the way
        let mut ancestor = node.parent();
        while let Some(current) = ancestor {
            self.on_did_expand_element.fire(&current);
            ancestor = current.parent();
        }
        if options.expand > 0 {
            self.on_did_expand_element.fire(node);
        }

        self.revealed
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(node.id().to_string());
        Ok(())
    }

    fn set_context(&self, key: &str, value: bool) {
        log::debug!("ConsoleView: context {} = {}", key, value);
    }

    fn open_settings(&self, setting: &str) -> Result<()> {
        log::info!("ConsoleView: open settings at {}", setting);
        self.opened_settings
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(setting.to_string());
        Ok(())
    }

    fn on_did_expand_element(&self) -> &Emitter<TreeNode> {
        &self.on_did_expand_element
    }

    fn on_did_collapse_element(&self) -> &Emitter<TreeNode> {
        &self.on_did_collapse_element
    }

    fn on_did_change_checkbox_state(&self) -> &Emitter<CheckboxChanges> {
        &self.on_did_change_checkbox_state
    }
}

fn describe(item: &TreeItem) -> String {
    let mut line = String::new();
    match item.checkbox {
        Some(CheckboxState::Checked) => line.push_str("[x] "),
        Some(CheckboxState::Unchecked) => line.push_str("[ ] "),
        None => {}
    }
    line.push_str(&item.label);
    if let Some(description) = &item.description {
        line.push_str("  ");
        line.push_str(description);
    }
    line
}

fn push_children(
    pending: &mut Vec<(TreeNode, String, bool)>,
    children: Vec<TreeNode>,
    prefix: &str,
) {
    let count = children.len();
    for (index, child) in children.into_iter().enumerate().rev() {
        pending.push((child, prefix.to_string(), index + 1 == count));
    }
}

/// Render every node of the tree, expanding all expandable items
pub async fn render_tree(provider: &PullRequestsTreeProvider) -> Result<Vec<String>> {
    let mut lines = Vec::new();
    let mut pending = Vec::new();
    push_children(&mut pending, provider.get_children(None).await, "");

    while let Some((node, prefix, last)) = pending.pop() {
        let item = provider.get_tree_item(&node).await?;
        let (branch, indent) = if last {
            ("└── ", "    ")
        } else {
            ("├── ", "│   ")
        };
        lines.push(format!("{}{}{}", prefix, branch, describe(&item)));

        if item.collapsible != Collapsible::None {
            let children = provider.get_children(Some(&node)).await;
            push_children(&mut pending, children, &format!("{}{}", prefix, indent));
        }
    }
    Ok(lines)
}
