//! Automation tool identity
//!
//! Classifies PR authors against the fixed set of maintenance bots we are
//! willing to act on. Matching is exact after stripping the GitHub App
//! decorations (`[bot]` suffix, `app/` prefix); there is no fuzzy matching.

use crate::error::{Error, Result};
use crate::types::PullRequestRecord;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Known automation tools
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AutomationTool {
    /// GitHub Dependabot
    Dependabot,
    /// pre-commit.ci autoupdate
    PreCommitCi,
    /// Mend Renovate
    Renovate,
    /// GitHub Actions bot
    GitHubActions,
    /// all-contributors bot
    AllContributors,
}

impl AutomationTool {
    /// Every tool we recognize
    pub const ALL: [Self; 5] = [
        Self::Dependabot,
        Self::PreCommitCi,
        Self::Renovate,
        Self::GitHubActions,
        Self::AllContributors,
    ];

    /// Account base names this tool publishes under
    const fn account_names(self) -> &'static [&'static str] {
        match self {
            Self::Dependabot => &["dependabot", "dependabot-preview"],
            Self::PreCommitCi => &["pre-commit-ci"],
            Self::Renovate => &["renovate", "renovate-bot"],
            Self::GitHubActions => &["github-actions"],
            Self::AllContributors => &["allcontributors", "all-contributors"],
        }
    }

    /// Human-readable tool name
    pub const fn name(self) -> &'static str {
        match self {
            Self::Dependabot => "dependabot",
            Self::PreCommitCi => "pre-commit.ci",
            Self::Renovate => "renovate",
            Self::GitHubActions => "github-actions-bot",
            Self::AllContributors => "allcontributors-bot",
        }
    }

    /// Classify an author login, `None` if it is not a known tool
    pub fn from_login(login: &str) -> Option<Self> {
        let login = login.trim().to_ascii_lowercase();
        let base = login.strip_prefix("app/").unwrap_or(&login);
        let base = base.strip_suffix("[bot]").unwrap_or(base);

        Self::ALL
            .into_iter()
            .find(|tool| tool.account_names().contains(&base))
    }

    /// Classify the author of a PR
    pub fn for_pull_request(pr: &PullRequestRecord) -> Option<Self> {
        Self::from_login(&pr.author)
    }

    /// The run gate: the source PR must come from a known tool
    pub fn require_for_source(pr: &PullRequestRecord) -> Result<Self> {
        Self::for_pull_request(pr).ok_or_else(|| Error::NotAutomation {
            pr: pr.key.clone(),
            author: pr.author.clone(),
        })
    }
}

impl fmt::Display for AutomationTool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
