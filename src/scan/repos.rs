//! Organization scanning

use crate::error::Result;
use crate::platform::PlatformService;
use crate::types::RepoId;
use tracing::debug;

/// List the repositories to search for candidates.
///
/// The source repository and archived repositories are excluded. The result
/// is sorted by name (case-insensitive, ties broken by exact name) so that
/// every run visits repositories in the same order.
pub async fn scan_organization(
    platform: &dyn PlatformService,
    source_repo: &RepoId,
) -> Result<Vec<RepoId>> {
    let org = &source_repo.owner;
    let listed = platform.list_organization_repositories(org).await?;
    let total = listed.len();

    let mut repos: Vec<RepoId> = listed
        .into_iter()
        .filter(|r| !r.archived)
        .map(|r| r.id)
        .filter(|id| !id.same_as(source_repo))
        .collect();

    repos.sort_by(|a, b| {
        a.name
            .to_lowercase()
            .cmp(&b.name.to_lowercase())
            .then_with(|| a.name.cmp(&b.name))
    });
    repos.dedup_by(|a, b| a.same_as(b));

    debug!(
        org = %org,
        total,
        scanned = repos.len(),
        "organization scan complete"
    );
    Ok(repos)
}
