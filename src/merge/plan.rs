//! Merge assessment - pure functions deciding the next state transition
//!
//! No I/O happens here. Given a PR snapshot and the run configuration, the
//! assessment says where the state machine goes next; `execute` performs it.

use crate::config::MergeConfig;
use crate::types::{MergeableState, PrState, PullRequestRecord};
use std::fmt;

/// Reason strings recorded on outcomes
pub mod reasons {
    /// PR is a draft
    pub const DRAFT: &str = "draft";
    /// Conflicting or blocked by checks
    pub const NOT_MERGEABLE: &str = "not mergeable";
    /// Closed without merging
    pub const CLOSED: &str = "closed";
    /// Behind its base and branch updates are disabled
    pub const BEHIND: &str = "behind base branch";
    /// Behind its base even after one update
    pub const STILL_BEHIND: &str = "still behind after update";
    /// Already merged before this run
    pub const ALREADY_MERGED: &str = "already merged";
    /// Platform never finished computing mergeability
    pub const MERGEABILITY_UNKNOWN: &str = "mergeability unknown";
    /// Head did not move after the branch update was accepted
    pub const UPDATE_NOT_APPLIED: &str = "branch update not applied";
    /// Interrupted before the next mutating call
    pub const CANCELLED: &str = "cancelled";
}

/// Confidence level for a merge attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeConfidence {
    /// All conditions verified - merge should succeed
    Certain,
    /// Some conditions unknown - merge may fail
    Uncertain(String),
}

/// Where the state machine goes from a snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Assessment {
    /// Terminal: merged before we got here
    AlreadyMerged,
    /// Terminal: leave the PR alone
    Skip(&'static str),
    /// Mergeability still being computed; re-check before acting
    Pending,
    /// Branch is behind and may be updated once
    Stale,
    /// Terminal: behind again after the one allowed update
    StillBehind,
    /// Validated; approve then merge
    Ready(MergeConfidence),
}

impl fmt::Display for Assessment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyMerged => write!(f, "{}", reasons::ALREADY_MERGED),
            Self::Skip(reason) => write!(f, "skip: {reason}"),
            Self::Pending => write!(f, "pending (mergeability unknown)"),
            Self::Stale => write!(f, "stale (branch update needed)"),
            Self::StillBehind => write!(f, "{}", reasons::STILL_BEHIND),
            Self::Ready(MergeConfidence::Certain) => write!(f, "ready"),
            Self::Ready(MergeConfidence::Uncertain(why)) => write!(f, "ready (uncertain: {why})"),
        }
    }
}

/// Assess a PR snapshot (PURE - no I/O, easily testable)
///
/// `branch_updated` is true when this snapshot was fetched after our one
/// update-branch attempt; a PR still behind at that point is a failure.
pub fn assess(pr: &PullRequestRecord, config: &MergeConfig, branch_updated: bool) -> Assessment {
    match pr.state {
        PrState::Merged => return Assessment::AlreadyMerged,
        PrState::Closed => return Assessment::Skip(reasons::CLOSED),
        PrState::Open => {}
    }

    if pr.is_draft {
        return Assessment::Skip(reasons::DRAFT);
    }

    match pr.mergeable_state {
        MergeableState::Mergeable => Assessment::Ready(MergeConfidence::Certain),
        MergeableState::Unknown => Assessment::Pending,
        MergeableState::Conflicting | MergeableState::BlockedByChecks => {
            Assessment::Skip(reasons::NOT_MERGEABLE)
        }
        MergeableState::Behind if branch_updated => Assessment::StillBehind,
        MergeableState::Behind if config.auto_fix => Assessment::Stale,
        MergeableState::Behind => Assessment::Skip(reasons::BEHIND),
    }
}
