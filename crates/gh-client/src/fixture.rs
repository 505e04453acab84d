//! Fixture-backed pull request source
//!
//! Serves pull requests from a JSON description of a workspace. Used by the
//! demo host and by tests that want realistic data without a network.
//!
//! ```json
//! {
//!   "authenticated_hosts": ["github.com"],
//!   "page_size": 20,
//!   "folders": [{
//!     "name": "api",
//!     "path": "/src/api",
//!     "remotes": [{ "name": "origin", "url": "https://github.com/acme/api.git" }],
//!     "local_branches": ["feature/login"],
//!     "pull_requests": [ ... ],
//!     "queries": { "is:open author:${user}": [12] },
//!     "files": { "12": [{ "path": "src/lib.rs", "status": "modified" }] }
//!   }]
//! }
//! ```

use crate::client::PullRequestSource;
use crate::error::ClientError;
use crate::types::{CategoryQuery, FileChange, PullRequest, PullRequestPage, Remote};
use anyhow::{Context, Result};
use async_trait::async_trait;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

const DEFAULT_PAGE_SIZE: usize = 20;

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

/// A remote as written in a fixture
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteFixture {
    pub name: String,
    pub url: String,
}

/// One workspace folder of a fixture
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FolderFixture {
    /// Folder display name
    pub name: String,
    /// Folder path on disk
    #[serde(default)]
    pub path: PathBuf,
    /// Git remotes of the folder's repository
    #[serde(default)]
    pub remotes: Vec<RemoteFixture>,
    /// Branches checked out locally
    #[serde(default)]
    pub local_branches: Vec<String>,
    /// Every open pull request, newest first
    #[serde(default)]
    pub pull_requests: Vec<PullRequest>,
    /// Query string to matching pull request numbers
    #[serde(default)]
    pub queries: BTreeMap<String, Vec<u64>>,
    /// Pull request number to changed files
    #[serde(default)]
    pub files: BTreeMap<String, Vec<FileChange>>,
}

impl FolderFixture {
    /// Remotes that parse as `host/owner/repo`
    pub fn parsed_remotes(&self) -> Vec<Remote> {
        self.remotes
            .iter()
            .filter_map(|r| Remote::parse(r.name.clone(), &r.url))
            .collect()
    }
}

/// A whole workspace fixture
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fixture {
    /// Hosts with valid credentials
    #[serde(default)]
    pub authenticated_hosts: Vec<String>,
    /// Pull requests per page
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    /// Workspace folders
    #[serde(default)]
    pub folders: Vec<FolderFixture>,
}

impl Fixture {
    /// Load a fixture from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read fixture: {:?}", path))?;
        Self::from_json(&content).with_context(|| format!("Failed to parse fixture: {:?}", path))
    }

    /// Parse a fixture from JSON text
    pub fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Whether requests to `host` are authenticated
    pub fn is_authenticated(&self, host: &str) -> bool {
        self.authenticated_hosts.iter().any(|h| h == host)
    }

    /// Build a source serving one folder of this fixture
    pub fn client_for(&self, folder: &FolderFixture) -> FixtureClient {
        let host = folder
            .parsed_remotes()
            .into_iter()
            .next()
            .map(|r| r.host)
            .unwrap_or_else(|| crate::DEFAULT_HOST.to_string());
        FixtureClient {
            authenticated: self.is_authenticated(&host),
            host,
            page_size: self.page_size.max(1),
            folder: folder.clone(),
        }
    }
}

/// `PullRequestSource` over one `FolderFixture`
///
/// Cursors are plain offsets into the filtered list.
#[derive(Debug, Clone)]
pub struct FixtureClient {
    folder: FolderFixture,
    host: String,
    page_size: usize,
    authenticated: bool,
}

impl FixtureClient {
    fn ensure_authenticated(&self) -> Result<()> {
        if self.authenticated {
            Ok(())
        } else {
            Err(ClientError::Unauthenticated {
                host: self.host.clone(),
            }
            .into())
        }
    }

    fn matching(&self, query: &CategoryQuery) -> Vec<PullRequest> {
        match query {
            CategoryQuery::All => self.folder.pull_requests.clone(),
            CategoryQuery::LocalBranches => {
                let local: HashSet<&str> =
                    self.folder.local_branches.iter().map(String::as_str).collect();
                self.folder
                    .pull_requests
                    .iter()
                    .filter(|pr| local.contains(pr.head_branch.as_str()))
                    .cloned()
                    .collect()
            }
            CategoryQuery::Query(q) => {
                let numbers = self.folder.queries.get(q).cloned().unwrap_or_default();
                self.folder
                    .pull_requests
                    .iter()
                    .filter(|pr| numbers.contains(&pr.number))
                    .cloned()
                    .collect()
            }
        }
    }
}

#[async_trait]
impl PullRequestSource for FixtureClient {
    async fn fetch_pull_requests(
        &self,
        query: &CategoryQuery,
        cursor: Option<&str>,
    ) -> Result<PullRequestPage> {
        self.ensure_authenticated()?;

        let offset = match cursor {
            Some(c) => c
                .parse::<usize>()
                .map_err(|_| ClientError::Request(format!("invalid cursor '{}'", c)))?,
            None => 0,
        };

        let all = self.matching(query);
        let end = (offset + self.page_size).min(all.len());
        let items = all.get(offset..end).map(<[_]>::to_vec).unwrap_or_default();
        let next_cursor = (end < all.len()).then(|| end.to_string());

        debug!(
            "Fixture {}: {:?} offset {} -> {} PRs (more: {})",
            self.folder.name,
            query,
            offset,
            items.len(),
            next_cursor.is_some()
        );

        Ok(PullRequestPage {
            items,
            next_cursor,
            unsearched_remotes: false,
        })
    }

    async fn fetch_file_changes(&self, pr_number: u64) -> Result<Vec<FileChange>> {
        self.ensure_authenticated()?;

        if !self.folder.pull_requests.iter().any(|pr| pr.number == pr_number) {
            return Err(ClientError::NotFound(pr_number).into());
        }

        Ok(self
            .folder
            .files
            .get(&pr_number.to_string())
            .cloned()
            .unwrap_or_default())
    }
}
