//! File change and directory nodes
//!
//! Files of a pull request are kept in memory once fetched. In the tree
//! layout they are grouped under directory nodes built from a
//! [`FileEntry`] tree; chains of single-child directories collapse into one
//! node labelled with the joined path.

use super::{Node, NodeContext, NodeCore, NodeKind, TreeNode, WeakTreeNode};
use crate::item::{CheckboxState, Collapsible, TreeItem};
use async_trait::async_trait;
use gh_client::FileChange;
use std::sync::{Arc, Weak};

/// Entry in the directory tree of a pull request's files
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    /// Display name (file name, or one or more joined directory names)
    pub name: String,
    /// Path from the repository root
    pub path: String,
    /// The change, for files; `None` for directories
    pub change: Option<FileChange>,
    /// Child entries (directories only)
    pub children: Vec<FileEntry>,
}

impl FileEntry {
    fn directory(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            change: None,
            children: Vec::new(),
        }
    }

    fn file(name: impl Into<String>, change: &FileChange) -> Self {
        Self {
            name: name.into(),
            path: change.path.clone(),
            change: Some(change.clone()),
            children: Vec::new(),
        }
    }

    /// Build the tree of a flat file list
    ///
    /// Directories come before files, both alphabetical, and single-child
    /// directory chains are compacted.
    pub fn from_files(files: &[FileChange]) -> Self {
        let mut root = FileEntry::directory("", "");

        for change in files {
            let parts: Vec<&str> = change.path.split('/').filter(|p| !p.is_empty()).collect();
            root.insert_path(&parts, change);
        }

        root.sort_recursive();
        root.compact_recursive();
        root
    }

    pub fn is_directory(&self) -> bool {
        self.change.is_none()
    }

    fn insert_path(&mut self, parts: &[&str], change: &FileChange) {
        match parts {
            [] => {}
            [name] => self.children.push(FileEntry::file(*name, change)),
            [dir_name, rest @ ..] => {
                let existing = self
                    .children
                    .iter_mut()
                    .find(|c| c.name == *dir_name && c.is_directory());

                if let Some(dir) = existing {
                    dir.insert_path(rest, change);
                } else {
                    let path = if self.path.is_empty() {
                        dir_name.to_string()
                    } else {
                        format!("{}/{}", self.path, dir_name)
                    };
                    let mut dir = FileEntry::directory(*dir_name, path);
                    dir.insert_path(rest, change);
                    self.children.push(dir);
                }
            }
        }
    }

    fn sort_recursive(&mut self) {
        self.children.sort_by(|a, b| match (a.is_directory(), b.is_directory()) {
            (true, false) => std::cmp::Ordering::Less,
            (false, true) => std::cmp::Ordering::Greater,
            _ => a.name.cmp(&b.name),
        });

        for child in &mut self.children {
            child.sort_recursive();
        }
    }

    fn compact_recursive(&mut self) {
        for child in &mut self.children {
            while child.is_directory()
                && child.children.len() == 1
                && child.children[0].is_directory()
            {
                let only = child.children.remove(0);
                child.name = format!("{}/{}", child.name, only.name);
                child.path = only.path;
                child.children = only.children;
            }
            child.compact_recursive();
        }
    }
}

/// Build nodes for a list of sibling entries
pub(crate) fn entry_nodes(
    entries: &[FileEntry],
    parent: WeakTreeNode,
    pr_id: &str,
    checkbox_prefix: &str,
    ctx: &NodeContext,
    born: u64,
) -> Vec<TreeNode> {
    entries
        .iter()
        .map(|entry| match &entry.change {
            Some(change) => TreeNode::FileChange(FileChangeNode::new(
                change.clone(),
                entry.name.clone(),
                parent.clone(),
                pr_id,
                checkbox_prefix,
                ctx,
                born,
            )),
            None => TreeNode::Directory(DirectoryNode::new(
                entry.clone(),
                parent.clone(),
                pr_id,
                checkbox_prefix,
                ctx,
                born,
            )),
        })
        .collect()
}

/// A directory below a pull request in the tree layout
pub struct DirectoryNode {
    core: NodeCore,
    me: Weak<DirectoryNode>,
    ctx: NodeContext,
    entry: FileEntry,
    pr_id: String,
    checkbox_prefix: String,
}

impl DirectoryNode {
    fn new(
        entry: FileEntry,
        parent: WeakTreeNode,
        pr_id: &str,
        checkbox_prefix: &str,
        ctx: &NodeContext,
        born: u64,
    ) -> Arc<Self> {
        Arc::new_cyclic(|me| Self {
            core: NodeCore::new(
                format!("{}/{}/", pr_id, entry.path),
                Some(parent),
                &ctx.epoch,
                born,
            ),
            me: me.clone(),
            ctx: ctx.clone(),
            entry,
            pr_id: pr_id.to_string(),
            checkbox_prefix: checkbox_prefix.to_string(),
        })
    }

    pub fn entry(&self) -> &FileEntry {
        &self.entry
    }
}

#[async_trait]
impl Node for DirectoryNode {
    fn core(&self) -> &NodeCore {
        &self.core
    }

    fn kind(&self) -> NodeKind {
        NodeKind::Directory
    }

    async fn tree_item(&self) -> anyhow::Result<TreeItem> {
        Ok(
            TreeItem::new(self.core.id(), self.entry.name.clone(), Collapsible::Expanded)
                .with_context_value("directory"),
        )
    }

    async fn load_children(&self) -> Vec<TreeNode> {
        entry_nodes(
            &self.entry.children,
            WeakTreeNode::Directory(self.me.clone()),
            &self.pr_id,
            &self.checkbox_prefix,
            &self.ctx,
            self.core.born(),
        )
    }
}

impl std::fmt::Debug for DirectoryNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirectoryNode")
            .field("core", &self.core)
            .field("path", &self.entry.path)
            .finish()
    }
}

/// A changed file, checkbox capable ("viewed")
pub struct FileChangeNode {
    core: NodeCore,
    ctx: NodeContext,
    change: FileChange,
    label: String,
    checkbox_key: String,
}

impl FileChangeNode {
    pub(crate) fn new(
        change: FileChange,
        label: String,
        parent: WeakTreeNode,
        pr_id: &str,
        checkbox_prefix: &str,
        ctx: &NodeContext,
        born: u64,
    ) -> Arc<Self> {
        Arc::new(Self {
            core: NodeCore::new(
                format!("{}/{}", pr_id, change.path),
                Some(parent),
                &ctx.epoch,
                born,
            ),
            ctx: ctx.clone(),
            checkbox_key: format!("{}:{}", checkbox_prefix, change.path),
            change,
            label,
        })
    }

    pub fn change(&self) -> &FileChange {
        &self.change
    }

    pub fn checkbox(&self) -> CheckboxState {
        self.ctx.state.checkbox(&self.checkbox_key)
    }

    /// Record a checkbox toggle reported by the host
    ///
    /// Repeating the current state is a no-op. Never refreshes the tree.
    pub fn update_from_checkbox_changed(&self, state: CheckboxState) {
        match self.ctx.state.set_checkbox(&self.checkbox_key, state) {
            Ok(true) => log::debug!("FileChangeNode {}: now {:?}", self.core.id(), state),
            Ok(false) => {}
            Err(e) => log::error!(
                "FileChangeNode {}: failed to persist checkbox state: {:#}",
                self.core.id(),
                e
            ),
        }
    }
}

#[async_trait]
impl Node for FileChangeNode {
    fn core(&self) -> &NodeCore {
        &self.core
    }

    fn kind(&self) -> NodeKind {
        NodeKind::FileChange
    }

    async fn tree_item(&self) -> anyhow::Result<TreeItem> {
        Ok(
            TreeItem::new(self.core.id(), self.label.clone(), Collapsible::None)
                .with_description(format!(
                    "{} +{} -{}",
                    self.change.status.letter(),
                    self.change.additions,
                    self.change.deletions
                ))
                .with_context_value("filechange")
                .with_checkbox(self.checkbox()),
        )
    }

    async fn load_children(&self) -> Vec<TreeNode> {
        Vec::new()
    }
}

impl std::fmt::Debug for FileChangeNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileChangeNode")
            .field("core", &self.core)
            .field("path", &self.change.path)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gh_client::FileStatus;
    use pretty_assertions::assert_eq;

    fn names(entries: &[FileEntry]) -> Vec<&str> {
        entries.iter().map(|e| e.name.as_str()).collect()
    }

    #[test]
    fn test_from_files_sorts_directories_first() {
        let files = vec![
            FileChange::new("README.md", FileStatus::Modified),
            FileChange::new("src/main.rs", FileStatus::Modified),
            FileChange::new("Cargo.toml", FileStatus::Modified),
            FileChange::new("src/app.rs", FileStatus::Added),
            FileChange::new("docs/guide.md", FileStatus::Added),
        ];
        let root = FileEntry::from_files(&files);

        assert_eq!(names(&root.children), vec!["docs", "src", "Cargo.toml", "README.md"]);
        assert_eq!(names(&root.children[1].children), vec!["app.rs", "main.rs"]);
        assert_eq!(root.children[1].path, "src");
    }

    #[test]
    fn test_single_child_directories_compact() {
        let files = vec![
            FileChange::new("crates/core/src/lib.rs", FileStatus::Modified),
            FileChange::new("crates/core/src/tree.rs", FileStatus::Deleted),
        ];
        let root = FileEntry::from_files(&files);

        assert_eq!(names(&root.children), vec!["crates/core/src"]);
        let dir = &root.children[0];
        assert_eq!(dir.path, "crates/core/src");
        assert_eq!(names(&dir.children), vec!["lib.rs", "tree.rs"]);
        assert_eq!(dir.children[1].change.as_ref().map(|c| c.status), Some(FileStatus::Deleted));
    }

    #[test]
    fn test_directory_with_file_and_subdir_is_not_compacted() {
        let files = vec![
            FileChange::new("src/lib.rs", FileStatus::Modified),
            FileChange::new("src/tree/node.rs", FileStatus::Added),
        ];
        let root = FileEntry::from_files(&files);

        assert_eq!(names(&root.children), vec!["src"]);
        assert_eq!(names(&root.children[0].children), vec!["tree", "lib.rs"]);
        assert_eq!(root.children[0].children[0].path, "src/tree");
    }
}
