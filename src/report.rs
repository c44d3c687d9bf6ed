//! Run report and result aggregation
//!
//! Outcomes are appended in discovery order and never touched again, so an
//! unchanged organization produces an identical report on every run.

use crate::types::{PrKey, RepoId};
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use tracing::warn;

/// What an outcome is about
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OutcomeTarget {
    /// A single pull request
    PullRequest {
        /// PR key
        key: PrKey,
    },
    /// A whole repository whose PRs could not be fetched
    Repository {
        /// Repository id
        repo: RepoId,
    },
    /// The organization listing itself
    Organization {
        /// Organization login
        org: String,
    },
}

impl fmt::Display for OutcomeTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PullRequest { key } => write!(f, "{key}"),
            Self::Repository { repo } => write!(f, "{repo}"),
            Self::Organization { org } => write!(f, "{org} (organization)"),
        }
    }
}

/// Terminal status of one orchestrated item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutcomeStatus {
    /// Approved and merged by this run
    Merged,
    /// Already merged before this run touched it
    AlreadyMerged,
    /// Deliberately left alone
    Skipped,
    /// Something went wrong
    Failed,
}

impl fmt::Display for OutcomeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Merged => write!(f, "merged"),
            Self::AlreadyMerged => write!(f, "already merged"),
            Self::Skipped => write!(f, "skipped"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// Terminal outcome for one PR (or repository fetch)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MergeOutcome {
    /// What the outcome is about
    pub target: OutcomeTarget,
    /// Terminal status
    pub status: OutcomeStatus,
    /// Human-readable reason
    pub reason: String,
    /// Whether mutating steps were simulated (dry run)
    pub simulated: bool,
    /// Similarity confidence, for matched candidates
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    /// Marks the source PR's own outcome
    pub is_source: bool,
}

impl MergeOutcome {
    /// Outcome for a PR
    pub fn for_pr(key: PrKey, status: OutcomeStatus, reason: impl Into<String>) -> Self {
        Self {
            target: OutcomeTarget::PullRequest { key },
            status,
            reason: reason.into(),
            simulated: false,
            confidence: None,
            is_source: false,
        }
    }

    /// Failed-at-fetch outcome for a repository
    pub fn repository_failed(repo: RepoId, reason: impl Into<String>) -> Self {
        Self {
            target: OutcomeTarget::Repository { repo },
            status: OutcomeStatus::Failed,
            reason: reason.into(),
            simulated: false,
            confidence: None,
            is_source: false,
        }
    }

    /// Failed organization listing
    pub fn organization_failed(org: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            target: OutcomeTarget::Organization { org: org.into() },
            status: OutcomeStatus::Failed,
            reason: reason.into(),
            simulated: false,
            confidence: None,
            is_source: false,
        }
    }

    /// Mark as simulated
    #[must_use]
    pub fn simulated(mut self, simulated: bool) -> Self {
        self.simulated = simulated;
        self
    }

    /// Attach the match confidence
    #[must_use]
    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = Some(confidence);
        self
    }

    /// Mark as the source PR's outcome
    #[must_use]
    pub fn as_source(mut self) -> Self {
        self.is_source = true;
        self
    }

    /// PR key, if this outcome is about a PR
    pub const fn pr_key(&self) -> Option<&PrKey> {
        match &self.target {
            OutcomeTarget::PullRequest { key } => Some(key),
            _ => None,
        }
    }
}

/// Aggregate counts over a report
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReportCounts {
    /// Candidates whose confidence reached the threshold
    pub matched: usize,
    /// Merged by this run
    pub merged: usize,
    /// Already merged beforehand
    pub already_merged: usize,
    /// Skipped
    pub skipped: usize,
    /// Failed
    pub failed: usize,
}

/// Finalized run summary
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunReport {
    /// Outcomes in discovery order (source PR last)
    pub outcomes: Vec<MergeOutcome>,
    /// Aggregate counts
    pub counts: ReportCounts,
    /// Candidates scored against the source
    pub candidates_evaluated: usize,
    /// Whether this was a dry run
    pub dry_run: bool,
}

impl RunReport {
    /// Outcomes that did not end in a merge
    pub fn non_merged(&self) -> impl Iterator<Item = &MergeOutcome> {
        self.outcomes
            .iter()
            .filter(|o| o.status != OutcomeStatus::Merged)
    }

    /// Outcome recorded for a given PR
    pub fn outcome_for(&self, key: &PrKey) -> Option<&MergeOutcome> {
        self.outcomes.iter().find(|o| o.pr_key() == Some(key))
    }
}

/// Collects outcomes as orchestration proceeds
///
/// The only shared mutable state of a run. Appends happen from the
/// sequential orchestration loop, one at a time.
#[derive(Debug, Default)]
pub struct ResultAggregator {
    report: RunReport,
    seen: HashSet<OutcomeTarget>,
}

impl ResultAggregator {
    /// Start an empty report
    pub fn new(dry_run: bool) -> Self {
        Self {
            report: RunReport {
                dry_run,
                ..RunReport::default()
            },
            seen: HashSet::new(),
        }
    }

    /// Count a candidate that reached the threshold
    pub const fn record_match(&mut self) {
        self.report.counts.matched += 1;
    }

    /// Count scored candidates
    pub const fn record_evaluated(&mut self, count: usize) {
        self.report.candidates_evaluated += count;
    }

    /// Whether an outcome already exists for this target
    pub fn has_outcome(&self, target: &OutcomeTarget) -> bool {
        self.seen.contains(target)
    }

    /// Append an outcome. A second outcome for the same target is dropped.
    pub fn record(&mut self, outcome: MergeOutcome) -> bool {
        if !self.seen.insert(outcome.target.clone()) {
            warn!(item = %outcome.target, "duplicate outcome ignored");
            return false;
        }

        let counts = &mut self.report.counts;
        match outcome.status {
            OutcomeStatus::Merged => counts.merged += 1,
            OutcomeStatus::AlreadyMerged => counts.already_merged += 1,
            OutcomeStatus::Skipped => counts.skipped += 1,
            OutcomeStatus::Failed => counts.failed += 1,
        }
        self.report.outcomes.push(outcome);
        true
    }

    /// Borrow the report built so far
    pub const fn report(&self) -> &RunReport {
        &self.report
    }

    /// Finalize
    pub fn finish(self) -> RunReport {
        self.report
    }
}
