//! Candidate fetching
//!
//! Read-only, so repositories are fetched with bounded concurrency. Results
//! come back in repository order regardless of completion order.

use crate::automation::AutomationTool;
use crate::config::MergeConfig;
use crate::error::Result;
use crate::platform::PlatformService;
use crate::similarity::title_can_match;
use crate::types::{PrKey, PullRequestRecord, RepoId};
use futures::stream::{self, StreamExt};
use tracing::{debug, warn};

/// One open PR as seen by the fetcher
#[derive(Debug, Clone)]
pub enum CandidateFetch {
    /// Snapshot ready for scoring
    Ready(PullRequestRecord),
    /// PR was listed but its details could not be fetched
    Failed {
        /// PR key
        key: PrKey,
        /// Why
        reason: String,
    },
}

/// All candidates found in one repository
#[derive(Debug)]
pub struct RepositoryCandidates {
    /// Repository
    pub repo: RepoId,
    /// Candidates, or the fetch error for the whole repository
    pub result: Result<Vec<CandidateFetch>>,
}

/// What a candidate is compared against
#[derive(Debug, Clone, Copy)]
pub struct CandidateFilter<'a> {
    /// Tool that authored the source PR
    pub tool: AutomationTool,
    /// Source PR title
    pub source_title: &'a str,
    /// Run configuration (weights, threshold, concurrency)
    pub config: &'a MergeConfig,
}

impl CandidateFilter<'_> {
    /// Whether the changed files of `pr` are worth fetching
    fn needs_files(&self, pr: &PullRequestRecord) -> bool {
        AutomationTool::for_pull_request(pr) == Some(self.tool)
            && title_can_match(
                self.source_title,
                &pr.title,
                self.config.weights,
                self.config.threshold,
            )
    }
}

/// Fetch open PRs for every repository.
///
/// Changed files are only fetched for PRs authored by the source tool whose
/// title leaves them a chance to reach the threshold. Any other PR can never
/// match and keeps an empty file set.
pub async fn fetch_candidates(
    platform: &dyn PlatformService,
    repos: &[RepoId],
    filter: CandidateFilter<'_>,
) -> Vec<RepositoryCandidates> {
    stream::iter(repos.iter().cloned())
        .map(move |repo| async move {
            let result = fetch_repository(platform, &repo, filter).await;
            if let Err(ref e) = result {
                warn!(%repo, error = %e, "failed to fetch candidates");
            }
            RepositoryCandidates { repo, result }
        })
        .buffered(filter.config.fetch_concurrency.max(1))
        .collect()
        .await
}

async fn fetch_repository(
    platform: &dyn PlatformService,
    repo: &RepoId,
    filter: CandidateFilter<'_>,
) -> Result<Vec<CandidateFetch>> {
    let mut prs = platform.list_open_pull_requests(repo).await?;
    prs.sort_by_key(|pr| pr.key.number);

    let mut candidates = Vec::with_capacity(prs.len());
    for pr in prs {
        if !filter.needs_files(&pr) {
            debug!(pr = %pr.key, "skipping changed files");
            candidates.push(CandidateFetch::Ready(pr));
            continue;
        }

        match platform.get_changed_files(&pr.key).await {
            Ok(files) => candidates.push(CandidateFetch::Ready(pr.with_changed_files(files))),
            Err(e) => {
                warn!(pr = %pr.key, error = %e, "failed to fetch changed files");
                candidates.push(CandidateFetch::Failed {
                    key: pr.key,
                    reason: format!("failed to fetch changed files: {e}"),
                });
            }
        }
    }

    debug!(%repo, count = candidates.len(), "fetched candidates");
    Ok(candidates)
}
