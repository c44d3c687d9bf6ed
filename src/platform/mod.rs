//! Platform services
//!
//! The matching and merge core only talks to the code host through
//! [`PlatformService`]. Pagination, rate-limit backoff and HTTP retries live
//! behind this trait; callers see one `Result` per operation.

mod detection;
mod github;

pub use detection::{SourceReference, parse_pr_reference};
pub use github::GitHubService;

use crate::error::Result;
use crate::types::{
    MergeMethod, MergeResult, PlatformConfig, PrKey, PullRequestRecord, RepoId, RepositorySummary,
};
use async_trait::async_trait;
use std::collections::BTreeSet;

/// Platform service trait for organization-wide PR operations
///
/// Read-only methods may be called concurrently across repositories.
/// Mutating methods (`create_approval_review`, `update_branch`,
/// `merge_pull_request`) are always issued sequentially by the orchestrator.
#[async_trait]
pub trait PlatformService: Send + Sync {
    /// Login of the authenticated user (validates the token)
    async fn current_user(&self) -> Result<String>;

    /// List every repository in an organization
    async fn list_organization_repositories(&self, org: &str) -> Result<Vec<RepositorySummary>>;

    /// List open PRs of a repository.
    ///
    /// List payloads carry no mergeability, so records report
    /// `MergeableState::Unknown` and an empty changed-file set.
    async fn list_open_pull_requests(&self, repo: &RepoId) -> Result<Vec<PullRequestRecord>>;

    /// Fetch a fresh snapshot of one PR, including mergeability
    async fn get_pull_request(&self, key: &PrKey) -> Result<PullRequestRecord>;

    /// Paths changed by a PR
    async fn get_changed_files(&self, key: &PrKey) -> Result<BTreeSet<String>>;

    /// Submit an approving review
    async fn create_approval_review(&self, key: &PrKey, body: &str) -> Result<()>;

    /// Merge the base branch into the PR head.
    ///
    /// `expected_head_sha` guards against updating a head that moved since
    /// the snapshot was taken.
    async fn update_branch(&self, key: &PrKey, expected_head_sha: &str) -> Result<()>;

    /// Merge a PR with the specified method
    async fn merge_pull_request(&self, key: &PrKey, method: MergeMethod) -> Result<MergeResult>;

    /// Get the platform configuration
    fn config(&self) -> &PlatformConfig;
}
