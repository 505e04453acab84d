//! Pull request data source boundary
//!
//! The sidebar tree never talks to a remote API directly. Everything it
//! needs from one workspace folder's repository goes through the
//! `PullRequestSource` trait defined here.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │            PullRequestSource trait               │
//! │  - fetch_pull_requests(query, cursor)            │
//! │  - fetch_file_changes(pr_number)                 │
//! └─────────────────────────────────────────────────┘
//!                        │
//!        ┌───────────────┴───────────────┐
//!        ▼                               ▼
//! ┌─────────────────┐         ┌─────────────────────┐
//! │  FixtureClient  │         │  CountingSource<S>  │
//! │ (JSON fixtures) │         │ (call-count wrapper)│
//! └─────────────────┘         └─────────────────────┘
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use gh_client::{CategoryQuery, Fixture, PullRequestSource};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let fixture = Fixture::load("workspace.json")?;
//! let client = fixture.client_for(&fixture.folders[0]);
//! let page = client.fetch_pull_requests(&CategoryQuery::All, None).await?;
//! println!("{} open pull requests", page.items.len());
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod counting;
pub mod error;
pub mod fixture;
pub mod types;

/// Default GitHub host (public GitHub)
pub use gh_pr_config::DEFAULT_HOST;

pub use client::PullRequestSource;
pub use counting::CountingSource;
pub use error::ClientError;
pub use fixture::{Fixture, FixtureClient, FolderFixture, RemoteFixture};
pub use types::{
    CategoryQuery, FileChange, FileStatus, PullRequest, PullRequestPage, Remote,
};
