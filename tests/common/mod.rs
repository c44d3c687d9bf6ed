//! Shared test fixtures

#![allow(dead_code)]

pub mod mock_platform;

pub use mock_platform::MockPlatformService;

use dependamerge::types::{MergeableState, PlatformConfig, PrKey, PrState, PullRequestRecord};

/// Organization used by most fixtures
pub const ORG: &str = "acme";

/// Dependabot's GitHub App login
pub const DEPENDABOT: &str = "dependabot[bot]";

/// github.com configuration
pub fn github_config() -> PlatformConfig {
    PlatformConfig::for_host(None)
}

/// Mock preloaded with github.com configuration
pub fn mock() -> MockPlatformService {
    MockPlatformService::with_config(github_config())
}

/// Open, mergeable PR in `ORG/repo`
pub fn make_pr(
    repo: &str,
    number: u64,
    title: &str,
    author: &str,
    files: &[&str],
) -> PullRequestRecord {
    PullRequestRecord {
        key: PrKey::new(ORG, repo, number),
        title: title.to_string(),
        author: author.to_string(),
        head_sha: format!("head_{repo}_{number}"),
        base_sha: format!("base_{repo}"),
        head_ref: format!("dependabot/pip/{repo}-{number}"),
        base_ref: "main".to_string(),
        changed_files: files.iter().map(ToString::to_string).collect(),
        is_draft: false,
        state: PrState::Open,
        mergeable_state: MergeableState::Mergeable,
        html_url: format!("https://github.com/{ORG}/{repo}/pull/{number}"),
    }
}

/// Dependabot PR bumping `requests`
pub fn requests_bump(repo: &str, number: u64, to: &str) -> PullRequestRecord {
    make_pr(
        repo,
        number,
        &format!("Bump requests from 2.28.0 to {to}"),
        DEPENDABOT,
        &["requirements.txt"],
    )
}

/// Same PR with a different mergeable state
pub fn with_state(record: &PullRequestRecord, state: MergeableState) -> PullRequestRecord {
    PullRequestRecord {
        mergeable_state: state,
        ..record.clone()
    }
}
