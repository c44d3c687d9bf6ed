//! Core types for dependamerge

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// A repository identity (owner + name)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RepoId {
    /// Repository owner (organization or user)
    pub owner: String,
    /// Repository name
    pub name: String,
}

impl RepoId {
    /// Create a repository id
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }

    /// Case-insensitive identity check (GitHub names are case-insensitive)
    pub fn same_as(&self, other: &Self) -> bool {
        self.owner.eq_ignore_ascii_case(&other.owner) && self.name.eq_ignore_ascii_case(&other.name)
    }
}

impl fmt::Display for RepoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// Unique key of a pull request: owner + repo + number
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PrKey {
    /// Repository holding the PR
    pub repo: RepoId,
    /// PR number
    pub number: u64,
}

impl PrKey {
    /// Create a PR key
    pub fn new(owner: impl Into<String>, repo: impl Into<String>, number: u64) -> Self {
        Self {
            repo: RepoId::new(owner, repo),
            number,
        }
    }
}

impl fmt::Display for PrKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.repo, self.number)
    }
}

/// Repository entry returned by an organization listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositorySummary {
    /// Repository identity
    pub id: RepoId,
    /// Whether the repository is archived (read-only)
    pub archived: bool,
}

/// PR lifecycle state (open, closed, merged)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrState {
    /// PR is open
    Open,
    /// PR was closed without merging
    Closed,
    /// PR was merged
    Merged,
}

impl fmt::Display for PrState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open => write!(f, "open"),
            Self::Closed => write!(f, "closed"),
            Self::Merged => write!(f, "merged"),
        }
    }
}

/// Platform-reported readiness of a PR to merge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MergeableState {
    /// Clean, can be merged as-is
    Mergeable,
    /// Has merge conflicts with its base
    Conflicting,
    /// Head branch is behind its base
    Behind,
    /// Required checks or reviews block the merge
    BlockedByChecks,
    /// Not (yet) computed by the platform
    Unknown,
}

impl MergeableState {
    /// Map GitHub's `mergeable_state` / `mergeable` pair onto our enum.
    ///
    /// `unstable` (failing non-required checks) and `has_hooks` still merge.
    pub fn from_github(mergeable_state: Option<&str>, mergeable: Option<bool>) -> Self {
        match mergeable_state {
            Some("clean" | "unstable" | "has_hooks") => Self::Mergeable,
            Some("dirty") => Self::Conflicting,
            Some("behind") => Self::Behind,
            Some("blocked") => Self::BlockedByChecks,
            _ if mergeable == Some(false) => Self::Conflicting,
            _ => Self::Unknown,
        }
    }
}

impl fmt::Display for MergeableState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mergeable => write!(f, "mergeable"),
            Self::Conflicting => write!(f, "conflicting"),
            Self::Behind => write!(f, "behind"),
            Self::BlockedByChecks => write!(f, "blocked by checks"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// Immutable snapshot of a pull request, fetched once per state transition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PullRequestRecord {
    /// Unique key
    pub key: PrKey,
    /// PR title
    pub title: String,
    /// Author login (e.g. `dependabot[bot]`)
    pub author: String,
    /// Head commit SHA
    pub head_sha: String,
    /// Base commit SHA
    pub base_sha: String,
    /// Head branch name
    pub head_ref: String,
    /// Base branch name
    pub base_ref: String,
    /// Changed file paths (empty until fetched)
    pub changed_files: BTreeSet<String>,
    /// Whether PR is a draft
    pub is_draft: bool,
    /// Lifecycle state
    pub state: PrState,
    /// Mergeability as last reported
    pub mergeable_state: MergeableState,
    /// Web URL for the PR
    pub html_url: String,
}

impl PullRequestRecord {
    /// Return a copy carrying the given changed-file set
    #[must_use]
    pub fn with_changed_files(mut self, files: BTreeSet<String>) -> Self {
        self.changed_files = files;
        self
    }
}

/// Result of a merge operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeResult {
    /// Whether the merge was successful
    pub merged: bool,
    /// The SHA of the merge commit (if successful)
    pub sha: Option<String>,
    /// Message from the merge operation (especially on failure)
    pub message: Option<String>,
}

/// Merge strategy/method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum MergeMethod {
    /// Create a merge commit
    #[default]
    Merge,
    /// Squash all commits into one
    Squash,
    /// Rebase commits onto base branch
    Rebase,
}

impl fmt::Display for MergeMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Squash => write!(f, "squash"),
            Self::Merge => write!(f, "merge"),
            Self::Rebase => write!(f, "rebase"),
        }
    }
}

impl FromStr for MergeMethod {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "merge" => Ok(Self::Merge),
            "squash" => Ok(Self::Squash),
            "rebase" => Ok(Self::Rebase),
            other => Err(crate::error::Error::Config(format!(
                "unknown merge method '{other}' (expected merge, squash or rebase)"
            ))),
        }
    }
}

/// Platform configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformConfig {
    /// Custom host (None for github.com)
    pub host: Option<String>,
    /// REST API base URL, without trailing slash
    pub api_base: String,
}

impl PlatformConfig {
    /// Configuration for github.com or a GitHub Enterprise host
    pub fn for_host(host: Option<String>) -> Self {
        let api_base = host.as_ref().map_or_else(
            || "https://api.github.com".to_string(),
            |h| format!("https://{h}/api/v3"),
        );
        Self { host, api_base }
    }
}
