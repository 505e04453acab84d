//! Pull request tree model
//!
//! Caches the fetched pages of every category, keyed by folder and category
//! identity, and collapses concurrent fetches for the same key.
//!
//! # Architecture
//!
//! ```text
//!   CategoryNode::children()          TreeCommands (pr.loadMore)
//!            │                                  │
//!            ▼                                  ▼
//!   get_pull_requests(key, false)       load_more(key)
//!            │                                  │
//!            └──────────────┬───────────────────┘
//!                           ▼
//!          ┌─────────────────────────────────┐
//!          │ per-key tokio Mutex (in flight) │
//!          │ re-check cache after locking    │
//!          └─────────────────────────────────┘
//!                           │
//!                           ▼
//!               PullRequestSource::fetch_pull_requests
//!                           │
//!                           ▼
//!          pages[key] updated, on_did_change_data fired (load_more)
//! ```

use crate::event::Emitter;
use anyhow::Result;
use gh_client::{CategoryQuery, PullRequest, PullRequestSource};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

/// Cache key of one category in one folder
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CategoryKey {
    /// Folder identity, see [`WorkspaceFolder::key`](crate::host::WorkspaceFolder::key)
    pub folder: String,
    pub category: String,
}

impl CategoryKey {
    pub fn new(folder: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            folder: folder.into(),
            category: category.into(),
        }
    }
}

impl fmt::Display for CategoryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.folder, self.category)
    }
}

/// Every page fetched so far for one category
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryPage {
    pub pull_requests: Vec<PullRequest>,
    /// Cursor of the next page (None = everything fetched)
    pub next_cursor: Option<String>,
    pub unsearched_remotes: bool,
}

impl CategoryPage {
    pub fn has_more(&self) -> bool {
        self.next_cursor.is_some()
    }
}

/// Category cache shared by every node of the tree
#[derive(Default)]
pub struct PrsTreeModel {
    pages: Mutex<HashMap<CategoryKey, CategoryPage>>,
    in_flight: Mutex<HashMap<CategoryKey, Arc<tokio::sync::Mutex<()>>>>,
    on_did_change_data: Emitter<CategoryKey>,
}

impl PrsTreeModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fires with the key of a category whose data changed outside of a
    /// regular child fetch
    pub fn on_did_change_data(&self) -> &Emitter<CategoryKey> {
        &self.on_did_change_data
    }

    /// Cached pages of a category, never fetching
    pub fn cached(&self, key: &CategoryKey) -> Option<CategoryPage> {
        lock(&self.pages).get(key).cloned()
    }

    pub fn has_more(&self, key: &CategoryKey) -> bool {
        lock(&self.pages).get(key).is_some_and(CategoryPage::has_more)
    }

    /// Pull requests of a category, fetching only what the cache lacks
    ///
    /// Without `fetch_next_page` a cached category is returned as is. With
    /// it, the page after the cached cursor is fetched and appended. A caller
    /// that waited behind a concurrent fetch for the same key gets that
    /// fetch's result instead of issuing its own.
    pub async fn get_pull_requests(
        &self,
        source: &dyn PullRequestSource,
        key: &CategoryKey,
        query: &CategoryQuery,
        fetch_next_page: bool,
    ) -> Result<CategoryPage> {
        let seen = self.cached(key);
        if let Some(page) = &seen {
            if !fetch_next_page || !page.has_more() {
                return Ok(page.clone());
            }
        }

        let gate = self.key_lock(key);
        let _guard = gate.lock().await;

        let current = self.cached(key);
        if let Some(page) = &current {
            let fetched_meanwhile = match &seen {
                None => true,
                Some(seen) => seen.next_cursor != page.next_cursor,
            };
            if fetched_meanwhile || !page.has_more() {
                log::debug!("PrsTreeModel: {} served by a concurrent fetch", key);
                return Ok(page.clone());
            }
        }

        let cursor = match (&current, fetch_next_page) {
            (Some(page), true) => page.next_cursor.clone(),
            _ => None,
        };

        log::debug!(
            "PrsTreeModel: fetching {} ({:?}, cursor {:?})",
            key,
            query,
            cursor
        );
        let fetched = source.fetch_pull_requests(query, cursor.as_deref()).await?;

        let page = {
            let mut pages = lock(&self.pages);
            let entry = pages.entry(key.clone()).or_default();
            if cursor.is_some() {
                for pr in fetched.items {
                    if !entry.pull_requests.iter().any(|p| p.number == pr.number) {
                        entry.pull_requests.push(pr);
                    }
                }
            } else {
                entry.pull_requests = fetched.items;
            }
            entry.next_cursor = fetched.next_cursor;
            entry.unsearched_remotes = fetched.unsearched_remotes;
            entry.clone()
        };

        log::debug!(
            "PrsTreeModel: {} now holds {} pull requests (more: {})",
            key,
            page.pull_requests.len(),
            page.has_more()
        );
        Ok(page)
    }

    /// Fetch the next page of a category and announce the change
    pub async fn load_more(
        &self,
        source: &dyn PullRequestSource,
        key: &CategoryKey,
        query: &CategoryQuery,
    ) -> Result<CategoryPage> {
        let page = self.get_pull_requests(source, key, query, true).await?;
        self.on_did_change_data.fire(key);
        Ok(page)
    }

    /// Forget one category
    pub fn clear(&self, key: &CategoryKey) {
        if lock(&self.pages).remove(key).is_some() {
            log::debug!("PrsTreeModel: cleared {}", key);
        }
    }

    /// Forget every category
    pub fn clear_all(&self) {
        let cleared = {
            let mut pages = lock(&self.pages);
            let count = pages.len();
            pages.clear();
            count
        };
        log::debug!("PrsTreeModel: cleared {} categories", cleared);
    }

    fn key_lock(&self, key: &CategoryKey) -> Arc<tokio::sync::Mutex<()>> {
        Arc::clone(
            lock(&self.in_flight)
                .entry(key.clone())
                .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(()))),
        )
    }
}

impl fmt::Debug for PrsTreeModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrsTreeModel")
            .field("categories", &lock(&self.pages).len())
            .field("on_did_change_data", &self.on_did_change_data)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{folder_fixture, source_for, YieldingSource};
    use gh_client::CountingSource;

    fn key() -> CategoryKey {
        CategoryKey::new("api", "All Open")
    }

    #[tokio::test]
    async fn test_second_request_is_served_from_cache() {
        let folder = folder_fixture("api", Some("https://github.com/acme/api"), 1..=3);
        let source = CountingSource::new(source_for(&folder, 20, true));
        let model = PrsTreeModel::new();

        let first = model
            .get_pull_requests(&source, &key(), &CategoryQuery::All, false)
            .await
            .unwrap();
        let second = model
            .get_pull_requests(&source, &key(), &CategoryQuery::All, false)
            .await
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(first.pull_requests.len(), 3);
        assert_eq!(source.pull_request_calls(), 1);
        assert!(!model.has_more(&key()));
    }

    #[tokio::test]
    async fn test_load_more_appends_and_fires() {
        let folder = folder_fixture("api", Some("https://github.com/acme/api"), 1..=5);
        let source = CountingSource::new(source_for(&folder, 2, true));
        let model = PrsTreeModel::new();

        let fired = Arc::new(Mutex::new(Vec::new()));
        let f = Arc::clone(&fired);
        let _sub = model
            .on_did_change_data()
            .event(move |k: &CategoryKey| f.lock().unwrap().push(k.clone()));

        let page = model
            .get_pull_requests(&source, &key(), &CategoryQuery::All, false)
            .await
            .unwrap();
        assert_eq!(page.pull_requests.len(), 2);
        assert!(model.has_more(&key()));

        let page = model
            .load_more(&source, &key(), &CategoryQuery::All)
            .await
            .unwrap();
        let numbers: Vec<u64> = page.pull_requests.iter().map(|p| p.number).collect();
        assert_eq!(numbers, vec![5, 4, 3, 2]);
        assert_eq!(*fired.lock().unwrap(), vec![key()]);
        assert_eq!(source.pull_request_calls(), 2);
    }

    #[tokio::test]
    async fn test_concurrent_requests_collapse() {
        let folder = folder_fixture("api", Some("https://github.com/acme/api"), 1..=3);
        let source = CountingSource::new(YieldingSource::new(source_for(&folder, 20, true)));
        let model = PrsTreeModel::new();
        let category = key();

        let (a, b) = tokio::join!(
            model.get_pull_requests(&source, &category, &CategoryQuery::All, false),
            model.get_pull_requests(&source, &category, &CategoryQuery::All, false),
        );

        assert_eq!(a.unwrap(), b.unwrap());
        assert_eq!(source.pull_request_calls(), 1);
    }

    #[tokio::test]
    async fn test_fetch_error_is_not_cached() {
        let folder = folder_fixture("api", Some("https://github.com/acme/api"), 1..=3);
        let source = CountingSource::new(source_for(&folder, 20, false));
        let model = PrsTreeModel::new();

        assert!(model
            .get_pull_requests(&source, &key(), &CategoryQuery::All, false)
            .await
            .is_err());
        assert!(model.cached(&key()).is_none());
    }

    #[tokio::test]
    async fn test_clear_forces_refetch() {
        let folder = folder_fixture("api", Some("https://github.com/acme/api"), 1..=3);
        let source = CountingSource::new(source_for(&folder, 20, true));
        let model = PrsTreeModel::new();
        let other = CategoryKey::new("api", "Mine");

        model
            .get_pull_requests(&source, &key(), &CategoryQuery::All, false)
            .await
            .unwrap();
        model
            .get_pull_requests(&source, &other, &CategoryQuery::All, false)
            .await
            .unwrap();

        model.clear(&key());
        assert!(model.cached(&key()).is_none());
        assert!(model.cached(&other).is_some());

        model
            .get_pull_requests(&source, &key(), &CategoryQuery::All, false)
            .await
            .unwrap();
        assert_eq!(source.pull_request_calls(), 3);

        model.clear_all();
        assert!(model.cached(&other).is_none());
    }
}
