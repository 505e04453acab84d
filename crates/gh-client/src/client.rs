//! Pull request source trait
//!
//! Defines the `PullRequestSource` trait every data-fetching backend
//! implements for one workspace folder.

use crate::types::{CategoryQuery, FileChange, PullRequestPage};
use async_trait::async_trait;

/// Pull request data for one workspace folder
///
/// Implementations fetch from a remote API, a fixture file, or anything
/// else. Retries, if any, belong in the implementation; the tree never
/// retries on its own.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync` so nodes can share them.
///
/// # Example
///
/// ```rust,ignore
/// use gh_client::{CategoryQuery, PullRequestSource};
///
/// async fn first_page(source: &dyn PullRequestSource) -> anyhow::Result<usize> {
///     let page = source.fetch_pull_requests(&CategoryQuery::All, None).await?;
///     Ok(page.items.len())
/// }
/// ```
#[async_trait]
pub trait PullRequestSource: Send + Sync {
    /// Fetch one page of pull requests matching a category query
    ///
    /// # Arguments
    ///
    /// * `query` - Which category to fetch
    /// * `cursor` - Continuation cursor from the previous page, `None` for the first page
    ///
    /// # Returns
    ///
    /// The page of pull requests and the cursor of the next page, if any.
    async fn fetch_pull_requests(
        &self,
        query: &CategoryQuery,
        cursor: Option<&str>,
    ) -> anyhow::Result<PullRequestPage>;

    /// Fetch the changed files of a pull request
    ///
    /// # Arguments
    ///
    /// * `pr_number` - Pull request number
    async fn fetch_file_changes(&self, pr_number: u64) -> anyhow::Result<Vec<FileChange>>;
}
