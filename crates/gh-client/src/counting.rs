//! Call-counting source (decorator pattern)
//!
//! Wraps any `PullRequestSource` and records how often each operation was
//! called. The tree's tests use it to prove that cached children are served
//! without a fetch and that concurrent requests collapse into one.

use crate::client::PullRequestSource;
use crate::types::{CategoryQuery, FileChange, PullRequestPage};
use anyhow::Result;
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

/// Counting decorator around an inner source
///
/// Clones share their counters, so a test can keep one clone and hand the
/// other to the code under test.
#[derive(Debug, Clone)]
pub struct CountingSource<S: PullRequestSource> {
    inner: S,
    pull_request_calls: Arc<Mutex<usize>>,
    file_change_calls: Arc<Mutex<usize>>,
    queries: Arc<Mutex<Vec<CategoryQuery>>>,
}

impl<S: PullRequestSource> CountingSource<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            pull_request_calls: Arc::new(Mutex::new(0)),
            file_change_calls: Arc::new(Mutex::new(0)),
            queries: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Number of `fetch_pull_requests` calls so far
    pub fn pull_request_calls(&self) -> usize {
        *self.pull_request_calls.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Number of `fetch_file_changes` calls so far
    pub fn file_change_calls(&self) -> usize {
        *self.file_change_calls.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Queries seen by `fetch_pull_requests`, in call order
    pub fn queries(&self) -> Vec<CategoryQuery> {
        self.queries.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[async_trait]
impl<S: PullRequestSource> PullRequestSource for CountingSource<S> {
    async fn fetch_pull_requests(
        &self,
        query: &CategoryQuery,
        cursor: Option<&str>,
    ) -> Result<PullRequestPage> {
        *self.pull_request_calls.lock().unwrap_or_else(|e| e.into_inner()) += 1;
        self.queries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(query.clone());
        self.inner.fetch_pull_requests(query, cursor).await
    }

    async fn fetch_file_changes(&self, pr_number: u64) -> Result<Vec<FileChange>> {
        *self.file_change_calls.lock().unwrap_or_else(|e| e.into_inner()) += 1;
        self.inner.fetch_file_changes(pr_number).await
    }
}
