//! Merge execution - effectful operations
//!
//! Drives one PR from discovery to a terminal outcome:
//! `Discovered → Validated → {Skipped | Stale → Updated | Approved} → {Merged | Failed}`.
//! GitHub computes mergeability and applies branch updates in the
//! background, so both are polled before the next transition.
//! Every platform error becomes a `Failed` outcome; nothing here aborts the run.

use crate::cancel::CancellationToken;
use crate::config::MergeConfig;
use crate::error::{Error, Result};
use crate::merge::plan::{Assessment, MergeConfidence, assess, reasons};
use crate::platform::PlatformService;
use crate::progress::ProgressCallback;
use crate::report::{MergeOutcome, OutcomeStatus};
use crate::types::{MergeableState, PrKey, PullRequestRecord};
use std::time::Duration;
use tokio_retry::RetryIf;
use tokio_retry::strategy::ExponentialBackoff;
use tracing::{debug, info, warn};

/// Fetches per poll, the first one immediate
const POLL_ATTEMPTS: usize = 5;

/// Cap on a single poll delay
const MAX_POLL_DELAY: Duration = Duration::from_secs(8);

/// Why a poll attempt did not produce a settled snapshot
enum PollError {
    Fetch(Error),
    Unsettled(PullRequestRecord),
}

/// Per-PR merge state machine
pub struct MergeOrchestrator<'a> {
    platform: &'a dyn PlatformService,
    config: &'a MergeConfig,
    progress: &'a dyn ProgressCallback,
    cancel: &'a CancellationToken,
}

impl<'a> MergeOrchestrator<'a> {
    /// Create an orchestrator for one run
    pub const fn new(
        platform: &'a dyn PlatformService,
        config: &'a MergeConfig,
        progress: &'a dyn ProgressCallback,
        cancel: &'a CancellationToken,
    ) -> Self {
        Self {
            platform,
            config,
            progress,
            cancel,
        }
    }

    /// Drive a PR to its terminal outcome.
    ///
    /// A fresh snapshot is fetched first; the listing snapshot used for
    /// matching carries no mergeability. Under dry run all read-only steps
    /// run normally and mutating calls are replaced by "would" messages.
    pub async fn drive(&self, key: &PrKey) -> MergeOutcome {
        let outcome = self.run_state_machine(key).await;
        info!(
            pr = %key,
            status = %outcome.status,
            reason = %outcome.reason,
            simulated = self.config.dry_run,
            "PR reached terminal state"
        );
        outcome.simulated(self.config.dry_run)
    }

    async fn run_state_machine(&self, key: &PrKey) -> MergeOutcome {
        let mut snapshot = match self.platform.get_pull_request(key).await {
            Ok(pr) => pr,
            Err(e) => return failed(key, format!("failed to fetch PR: {e}")),
        };
        let mut branch_updated = false;
        let mut rechecked = false;

        loop {
            let assessment = assess(&snapshot, self.config, branch_updated);
            debug!(pr = %key, %assessment, "assessed PR");

            match assessment {
                Assessment::AlreadyMerged => {
                    return MergeOutcome::for_pr(
                        key.clone(),
                        OutcomeStatus::AlreadyMerged,
                        reasons::ALREADY_MERGED,
                    );
                }
                Assessment::Skip(reason) => {
                    return MergeOutcome::for_pr(key.clone(), OutcomeStatus::Skipped, reason);
                }
                Assessment::StillBehind => return failed(key, reasons::STILL_BEHIND),
                Assessment::Ready(confidence) => {
                    return self.approve_and_merge(&snapshot, &confidence).await;
                }
                Assessment::Pending => {
                    if rechecked {
                        return MergeOutcome::for_pr(
                            key.clone(),
                            OutcomeStatus::Skipped,
                            reasons::MERGEABILITY_UNKNOWN,
                        );
                    }
                    rechecked = true;

                    let settled = |pr: &PullRequestRecord| {
                        pr.mergeable_state != MergeableState::Unknown
                    };
                    snapshot = match self.poll(key, &settled).await {
                        Ok(pr) => pr,
                        Err(e) => return failed(key, format!("failed to re-check PR: {e}")),
                    };
                }
                Assessment::Stale => {
                    if self.cancel.is_cancelled() {
                        return skipped_cancelled(key);
                    }

                    if self.config.dry_run {
                        self.progress
                            .on_message(&format!("Would update branch of {key}"))
                            .await;
                        let simulated =
                            MergeConfidence::Uncertain("branch update simulated".to_string());
                        return self.approve_and_merge(&snapshot, &simulated).await;
                    }

                    self.progress
                        .on_message(&format!("Updating branch of {key}"))
                        .await;
                    let expected_head = snapshot.head_sha.clone();
                    if let Err(e) = self.platform.update_branch(key, &expected_head).await {
                        return failed(key, format!("branch update failed: {e}"));
                    }
                    branch_updated = true;

                    // The update is applied asynchronously; wait for the new head
                    let moved = |pr: &PullRequestRecord| pr.head_sha != expected_head;
                    snapshot = match self.poll(key, &moved).await {
                        Ok(pr) => pr,
                        Err(e) => {
                            return failed(key, format!("failed to re-fetch PR after update: {e}"));
                        }
                    };
                    if snapshot.head_sha == expected_head {
                        return failed(key, reasons::UPDATE_NOT_APPLIED);
                    }
                    debug!(pr = %key, head = %snapshot.head_sha, "branch updated");
                    // New head, so mergeability is computed afresh
                    rechecked = false;
                }
            }
        }
    }

    /// Re-fetch a PR until `settled` holds or the poll budget runs out.
    ///
    /// Returns the last snapshot either way; only a fetch error is an `Err`.
    async fn poll(
        &self,
        key: &PrKey,
        settled: &(dyn Fn(&PullRequestRecord) -> bool + Sync),
    ) -> Result<PullRequestRecord> {
        let polled = RetryIf::spawn(
            self.poll_strategy(),
            || async {
                let pr = self
                    .platform
                    .get_pull_request(key)
                    .await
                    .map_err(PollError::Fetch)?;
                if settled(&pr) {
                    Ok(pr)
                } else {
                    debug!(pr = %key, mergeable = %pr.mergeable_state, "PR not settled yet");
                    Err(PollError::Unsettled(pr))
                }
            },
            |e: &PollError| matches!(e, PollError::Unsettled(_)),
        )
        .await;

        match polled {
            Ok(pr) | Err(PollError::Unsettled(pr)) => Ok(pr),
            Err(PollError::Fetch(e)) => Err(e),
        }
    }

    /// `poll_interval`, doubling, for `POLL_ATTEMPTS` re-fetches
    fn poll_strategy(&self) -> impl Iterator<Item = Duration> {
        let half = u64::try_from(self.config.poll_interval.as_millis() / 2).unwrap_or(u64::MAX);
        ExponentialBackoff::from_millis(2)
            .factor(half)
            .max_delay(MAX_POLL_DELAY)
            .take(POLL_ATTEMPTS - 1)
    }

    async fn approve_and_merge(
        &self,
        pr: &PullRequestRecord,
        confidence: &MergeConfidence,
    ) -> MergeOutcome {
        let key = &pr.key;
        let method = self.config.merge_method;

        if self.cancel.is_cancelled() {
            return skipped_cancelled(key);
        }

        if self.config.dry_run {
            self.progress
                .on_message(&format!("Would approve and merge {key}: {}", pr.title))
                .await;
            return MergeOutcome::for_pr(
                key.clone(),
                OutcomeStatus::Merged,
                format!("would approve and merge ({method})"),
            );
        }

        self.progress
            .on_message(&format!("Approving {key}: {}", pr.title))
            .await;
        if let Err(e) = self
            .platform
            .create_approval_review(key, &self.config.approval_message)
            .await
        {
            return failed(key, format!("approval failed: {e}"));
        }

        if self.cancel.is_cancelled() {
            return MergeOutcome::for_pr(
                key.clone(),
                OutcomeStatus::Skipped,
                format!("{} after approval", reasons::CANCELLED),
            );
        }

        self.progress
            .on_message(&format!("Merging {key} ({method})"))
            .await;
        match self.platform.merge_pull_request(key, method).await {
            Ok(result) if result.merged => {
                let sha = result.sha.as_deref().unwrap_or("(no sha)");
                MergeOutcome::for_pr(
                    key.clone(),
                    OutcomeStatus::Merged,
                    format!("merged ({method}) {sha}"),
                )
            }
            Ok(result) => {
                let message = result
                    .message
                    .unwrap_or_else(|| "platform did not merge the PR".to_string());
                failed(key, with_uncertainty(message, confidence))
            }
            Err(e) => failed(key, with_uncertainty(format!("merge failed: {e}"), confidence)),
        }
    }
}

fn failed(key: &PrKey, reason: impl Into<String>) -> MergeOutcome {
    let reason = reason.into();
    warn!(pr = %key, %reason, "PR failed");
    MergeOutcome::for_pr(key.clone(), OutcomeStatus::Failed, reason)
}

fn skipped_cancelled(key: &PrKey) -> MergeOutcome {
    MergeOutcome::for_pr(key.clone(), OutcomeStatus::Skipped, reasons::CANCELLED)
}

fn with_uncertainty(message: String, confidence: &MergeConfidence) -> String {
    match confidence {
        MergeConfidence::Certain => message,
        MergeConfidence::Uncertain(why) => format!("{message} ({why})"),
    }
}
