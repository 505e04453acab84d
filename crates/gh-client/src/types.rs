//! Pull request data transfer objects
//!
//! These types represent what a `PullRequestSource` hands to the tree.
//! They are intentionally separate from tree nodes to keep this crate
//! free of any view concerns.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A pull request as listed in a category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequest {
    /// PR number (e.g., 123)
    pub number: u64,

    /// PR title
    pub title: String,

    /// PR body/description
    #[serde(default)]
    pub body: Option<String>,

    /// Author's GitHub username
    pub author: String,

    /// Base branch name (e.g., "main")
    #[serde(default = "default_base_branch")]
    pub base_branch: String,

    /// HEAD branch name (e.g., "feature/foo")
    #[serde(default)]
    pub head_branch: String,

    /// Whether the PR is a draft
    #[serde(default)]
    pub draft: bool,

    /// When the PR was created
    pub created_at: DateTime<Utc>,

    /// When the PR was last updated
    pub updated_at: DateTime<Utc>,

    /// PR URL for opening in browser
    #[serde(default)]
    pub html_url: String,
}

fn default_base_branch() -> String {
    "main".to_string()
}

impl PullRequest {
    /// Create a pull request with the given data, timestamps set to now
    pub fn new(number: u64, title: impl Into<String>, author: impl Into<String>) -> Self {
        Self {
            number,
            title: title.into(),
            body: None,
            author: author.into(),
            base_branch: default_base_branch(),
            head_branch: String::new(),
            draft: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            html_url: String::new(),
        }
    }

    /// Set the HEAD branch
    pub fn with_head_branch(mut self, branch: impl Into<String>) -> Self {
        self.head_branch = branch.into();
        self
    }

    /// Set the body
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }
}

/// One page of a category listing
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestPage {
    /// Pull requests on this page
    pub items: Vec<PullRequest>,

    /// Cursor of the next page (None = last page)
    pub next_cursor: Option<String>,

    /// Some remotes of the folder were not searched yet
    #[serde(default)]
    pub unsearched_remotes: bool,
}

/// Which pull requests a category lists
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryQuery {
    /// Pull requests whose head branch is checked out locally
    LocalBranches,
    /// A user-configured search query
    Query(String),
    /// Every open pull request
    All,
}

/// Change status of a file in a pull request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileStatus {
    Added,
    Modified,
    Deleted,
    Renamed,
}

impl FileStatus {
    /// Single-letter marker, git style
    pub fn letter(&self) -> &'static str {
        match self {
            FileStatus::Added => "A",
            FileStatus::Modified => "M",
            FileStatus::Deleted => "D",
            FileStatus::Renamed => "R",
        }
    }
}

/// A file changed by a pull request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileChange {
    /// Path relative to the repository root, `/` separated
    pub path: String,

    /// Change status
    pub status: FileStatus,

    /// Number of lines added
    #[serde(default)]
    pub additions: u64,

    /// Number of lines deleted
    #[serde(default)]
    pub deletions: u64,
}

impl FileChange {
    pub fn new(path: impl Into<String>, status: FileStatus) -> Self {
        Self {
            path: path.into(),
            status,
            additions: 0,
            deletions: 0,
        }
    }

    /// Last path segment
    pub fn file_name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }
}

/// A git remote of a workspace folder's repository
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Remote {
    /// Remote name (e.g., "origin")
    pub name: String,
    /// Host the remote points at
    pub host: String,
    /// Repository owner
    pub owner: String,
    /// Repository name
    pub repo: String,
}

impl Remote {
    pub fn new(
        name: impl Into<String>,
        host: impl Into<String>,
        owner: impl Into<String>,
        repo: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            host: host.into(),
            owner: owner.into(),
            repo: repo.into(),
        }
    }

    /// Parse a remote URL
    ///
    /// Accepts `https://host/owner/repo(.git)`, `ssh://git@host/owner/repo(.git)`
    /// and scp-like `git@host:owner/repo(.git)`. Returns `None` for anything
    /// that does not name an owner and a repository.
    pub fn parse(name: impl Into<String>, url: &str) -> Option<Self> {
        let url = url.trim();
        let (host, path) = if let Some(rest) = url
            .strip_prefix("https://")
            .or_else(|| url.strip_prefix("http://"))
            .or_else(|| url.strip_prefix("ssh://"))
        {
            let rest = rest.rsplit_once('@').map_or(rest, |(_, r)| r);
            rest.split_once('/')?
        } else {
            let rest = url.split_once('@').map_or(url, |(_, r)| r);
            rest.split_once(':')?
        };

        let path = path.trim_end_matches('/');
        let path = path.strip_suffix(".git").unwrap_or(path);
        let (owner, repo) = path.split_once('/')?;
        if host.is_empty() || owner.is_empty() || repo.is_empty() || repo.contains('/') {
            return None;
        }

        // Strip an explicit port from the host
        let host = host.split(':').next().unwrap_or(host);
        Some(Self::new(name, host.to_lowercase(), owner, repo))
    }

    /// Whether the remote points at a GitHub Enterprise host
    pub fn is_enterprise(&self) -> bool {
        self.host != crate::DEFAULT_HOST
    }

    /// Display name (owner/repo)
    pub fn display_name(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }
}
