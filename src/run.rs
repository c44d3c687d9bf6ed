//! Run driver
//!
//! A run has two halves. [`discover`] is read-only: it validates the source
//! PR, scans the organization, fetches candidates and scores them.
//! [`execute_run`] then drives every match (and finally the source PR)
//! through the merge state machine, strictly one PR at a time.

use crate::automation::AutomationTool;
use crate::cancel::CancellationToken;
use crate::config::MergeConfig;
use crate::error::Result;
use crate::merge::{MergeOrchestrator, reasons};
use crate::platform::PlatformService;
use crate::progress::ProgressCallback;
use crate::report::{MergeOutcome, OutcomeStatus, OutcomeTarget, ResultAggregator, RunReport};
use crate::scan::{CandidateFetch, CandidateFilter, fetch_candidates, scan_organization};
use crate::similarity::{SimilarityScore, score_candidate};
use crate::types::{PrKey, PrState, PullRequestRecord};
use tracing::{debug, info};

/// One discovery result, in scan order
#[derive(Debug, Clone)]
pub enum DiscoveryEntry {
    /// Candidate reached the threshold
    Matched {
        /// Listing snapshot of the candidate
        record: PullRequestRecord,
        /// Its score against the source
        score: SimilarityScore,
    },
    /// Something could not be fetched; already a terminal outcome
    Failed(MergeOutcome),
}

/// Everything learned before any mutation
#[derive(Debug, Clone)]
pub struct Discovery {
    /// Source PR snapshot (with changed files)
    pub source: PullRequestRecord,
    /// Tool that authored the source PR
    pub tool: AutomationTool,
    /// Matches and fetch failures in scan order
    pub entries: Vec<DiscoveryEntry>,
    /// Repositories searched
    pub repositories_scanned: usize,
    /// Candidates scored
    pub candidates_evaluated: usize,
}

impl Discovery {
    /// Matched candidates with their scores
    pub fn matches(&self) -> impl Iterator<Item = (&PullRequestRecord, &SimilarityScore)> {
        self.entries.iter().filter_map(|entry| match entry {
            DiscoveryEntry::Matched { record, score } => Some((record, score)),
            DiscoveryEntry::Failed(_) => None,
        })
    }

    /// Number of matched candidates
    pub fn match_count(&self) -> usize {
        self.matches().count()
    }

    /// Fetch failures recorded during discovery
    pub fn failures(&self) -> impl Iterator<Item = &MergeOutcome> {
        self.entries.iter().filter_map(|entry| match entry {
            DiscoveryEntry::Failed(outcome) => Some(outcome),
            DiscoveryEntry::Matched { .. } => None,
        })
    }
}

/// Read-only half of a run.
///
/// Fails when the source PR cannot be fetched or was not authored by a known
/// automation tool, and on any fatal error (such as a rejected token) raised
/// while scanning. Everything else becomes a `Failed` entry and discovery
/// continues.
pub async fn discover(
    platform: &dyn PlatformService,
    source_key: &PrKey,
    config: &MergeConfig,
    progress: &dyn ProgressCallback,
) -> Result<Discovery> {
    progress.on_phase("Fetching source PR").await;
    let source = platform.get_pull_request(source_key).await?;
    let tool = AutomationTool::require_for_source(&source)?;
    let files = platform.get_changed_files(source_key).await?;
    let source = source.with_changed_files(files);
    info!(source = %source_key, %tool, files = source.changed_files.len(), "source PR accepted");

    progress.on_phase("Scanning organization").await;
    let mut entries = Vec::new();
    let repos = match scan_organization(platform, &source_key.repo).await {
        Ok(repos) => repos,
        Err(e) if e.is_fatal() => return Err(e),
        Err(e) => {
            entries.push(DiscoveryEntry::Failed(MergeOutcome::organization_failed(
                source_key.repo.owner.clone(),
                format!("failed to list repositories: {e}"),
            )));
            Vec::new()
        }
    };
    progress
        .on_message(&format!("Searching {} repositories", repos.len()))
        .await;

    progress.on_phase("Fetching candidates").await;
    let filter = CandidateFilter {
        tool,
        source_title: &source.title,
        config,
    };
    let fetched = fetch_candidates(platform, &repos, filter).await;

    let mut candidates_evaluated = 0;
    for repo in fetched {
        let candidates = match repo.result {
            Ok(candidates) => candidates,
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                entries.push(DiscoveryEntry::Failed(MergeOutcome::repository_failed(
                    repo.repo,
                    format!("failed to list pull requests: {e}"),
                )));
                continue;
            }
        };

        for candidate in candidates {
            match candidate {
                CandidateFetch::Failed { key, reason } => {
                    entries.push(DiscoveryEntry::Failed(MergeOutcome::for_pr(
                        key,
                        OutcomeStatus::Failed,
                        reason,
                    )));
                }
                CandidateFetch::Ready(record) => {
                    if record.key == *source_key {
                        continue;
                    }
                    candidates_evaluated += 1;
                    let score = score_candidate(&source, &record, config.weights);
                    debug!(
                        candidate = %record.key,
                        title = score.title_score,
                        files = score.file_score,
                        author = score.author_matches,
                        confidence = score.confidence,
                        "scored candidate"
                    );
                    if score.is_match(config.threshold) {
                        entries.push(DiscoveryEntry::Matched { record, score });
                    }
                }
            }
        }
    }

    info!(
        repositories = repos.len(),
        evaluated = candidates_evaluated,
        entries = entries.len(),
        "discovery complete"
    );

    Ok(Discovery {
        source,
        tool,
        entries,
        repositories_scanned: repos.len(),
        candidates_evaluated,
    })
}

/// Mutating half of a run.
///
/// Matches are driven in discovery order, one at a time. The source PR goes
/// last and only when at least one candidate matched; with no matches it is
/// left untouched, and only reported when it is already merged. Never fails;
/// every problem is an outcome in the report.
pub async fn execute_run(
    discovery: &Discovery,
    platform: &dyn PlatformService,
    config: &MergeConfig,
    progress: &dyn ProgressCallback,
    cancel: &CancellationToken,
) -> RunReport {
    let mut aggregator = ResultAggregator::new(config.dry_run);
    aggregator.record_evaluated(discovery.candidates_evaluated);
    let orchestrator = MergeOrchestrator::new(platform, config, progress, cancel);

    progress.on_phase("Merging").await;
    for entry in &discovery.entries {
        let outcome = match entry {
            DiscoveryEntry::Failed(outcome) => outcome.clone(),
            DiscoveryEntry::Matched { record, score } => {
                let target = OutcomeTarget::PullRequest {
                    key: record.key.clone(),
                };
                if aggregator.has_outcome(&target) {
                    continue;
                }
                aggregator.record_match();
                drive_or_cancel(&orchestrator, &record.key, config, cancel)
                    .await
                    .with_confidence(score.confidence)
            }
        };
        if aggregator.record(outcome.clone()) {
            progress.on_outcome(&outcome).await;
        }
    }

    let source = &discovery.source;
    if aggregator.report().counts.matched > 0 {
        let outcome = drive_or_cancel(&orchestrator, &source.key, config, cancel)
            .await
            .as_source();
        if aggregator.record(outcome.clone()) {
            progress.on_outcome(&outcome).await;
        }
    } else if source.state == PrState::Merged {
        // Nothing left open from an earlier run; report the merged source
        let outcome = MergeOutcome::for_pr(
            source.key.clone(),
            OutcomeStatus::AlreadyMerged,
            reasons::ALREADY_MERGED,
        )
        .as_source()
        .simulated(config.dry_run);
        if aggregator.record(outcome.clone()) {
            progress.on_outcome(&outcome).await;
        }
    } else {
        progress
            .on_message("No similar PRs found; source PR left untouched")
            .await;
    }

    let report = aggregator.finish();
    info!(
        matched = report.counts.matched,
        merged = report.counts.merged,
        already_merged = report.counts.already_merged,
        skipped = report.counts.skipped,
        failed = report.counts.failed,
        dry_run = report.dry_run,
        "run complete"
    );
    report
}

/// Discover and execute in one go
pub async fn run(
    platform: &dyn PlatformService,
    source_key: &PrKey,
    config: &MergeConfig,
    progress: &dyn ProgressCallback,
    cancel: &CancellationToken,
) -> Result<RunReport> {
    config.validate()?;
    let discovery = discover(platform, source_key, config, progress).await?;
    Ok(execute_run(&discovery, platform, config, progress, cancel).await)
}

async fn drive_or_cancel(
    orchestrator: &MergeOrchestrator<'_>,
    key: &PrKey,
    config: &MergeConfig,
    cancel: &CancellationToken,
) -> MergeOutcome {
    if cancel.is_cancelled() {
        return MergeOutcome::for_pr(key.clone(), OutcomeStatus::Skipped, reasons::CANCELLED)
            .simulated(config.dry_run);
    }
    orchestrator.drive(key).await
}
