//! GitHub platform service implementation

use crate::error::{Error, Result};
use crate::platform::PlatformService;
use crate::types::{
    MergeMethod, MergeResult, MergeableState, PlatformConfig, PrKey, PrState, PullRequestRecord,
    RepoId, RepositorySummary,
};
use async_trait::async_trait;
use octocrab::Octocrab;
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::Deserialize;
use std::collections::BTreeSet;
use std::time::Duration;
use tokio_retry::RetryIf;
use tokio_retry::strategy::ExponentialBackoff;
use tracing::{debug, warn};

/// Page size for list endpoints
const PER_PAGE: u8 = 100;

/// Attempts for read-only calls (first try included)
const READ_ATTEMPTS: usize = 3;

// Raw REST payloads. Only the fields we use are declared.

#[derive(Deserialize)]
struct ApiUser {
    login: String,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    message: Option<String>,
}

#[derive(Deserialize)]
struct ApiGitRef {
    #[serde(rename = "ref")]
    ref_name: String,
    sha: String,
}

#[derive(Deserialize)]
struct ApiPullRequest {
    number: u64,
    title: Option<String>,
    user: Option<ApiUser>,
    state: String,
    #[serde(default)]
    merged: Option<bool>,
    #[serde(default)]
    merged_at: Option<String>,
    #[serde(default)]
    draft: Option<bool>,
    #[serde(default)]
    mergeable: Option<bool>,
    #[serde(default)]
    mergeable_state: Option<String>,
    head: ApiGitRef,
    base: ApiGitRef,
    #[serde(default)]
    html_url: Option<String>,
}

impl ApiPullRequest {
    fn into_record(self, repo: &RepoId) -> PullRequestRecord {
        let merged = self.merged.unwrap_or(false) || self.merged_at.is_some();
        let state = match self.state.as_str() {
            _ if merged => PrState::Merged,
            "open" => PrState::Open,
            _ => PrState::Closed,
        };

        PullRequestRecord {
            key: PrKey {
                repo: repo.clone(),
                number: self.number,
            },
            title: self.title.unwrap_or_default(),
            author: self.user.map(|u| u.login).unwrap_or_default(),
            head_sha: self.head.sha,
            base_sha: self.base.sha,
            head_ref: self.head.ref_name,
            base_ref: self.base.ref_name,
            changed_files: BTreeSet::new(),
            is_draft: self.draft.unwrap_or(false),
            state,
            mergeable_state: MergeableState::from_github(
                self.mergeable_state.as_deref(),
                self.mergeable,
            ),
            html_url: self.html_url.unwrap_or_default(),
        }
    }
}

/// GitHub service using octocrab
pub struct GitHubService {
    client: Octocrab,
    config: PlatformConfig,
    /// Token for raw HTTP requests
    token: String,
    /// HTTP client for endpoints octocrab does not model the way we need
    http_client: Client,
}

impl GitHubService {
    /// Create a new GitHub service for github.com or an Enterprise host
    pub fn new(token: &str, host: Option<String>) -> Result<Self> {
        Self::with_config(token, PlatformConfig::for_host(host))
    }

    /// Create a service against an explicit API base URL
    pub fn with_config(token: &str, config: PlatformConfig) -> Result<Self> {
        let client = Octocrab::builder()
            .personal_token(token.to_string())
            .base_uri(config.api_base.as_str())
            .map_err(|e| Error::GitHubApi(e.to_string()))?
            .build()
            .map_err(|e| Error::GitHubApi(e.to_string()))?;

        let http_client = Client::builder()
            .user_agent("dependamerge")
            .build()
            .map_err(|e| Error::GitHubApi(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            config,
            token: token.to_string(),
            http_client,
        })
    }

    fn raw(&self, method: Method, path: &str) -> RequestBuilder {
        self.http_client
            .request(method, format!("{}{path}", self.config.api_base))
            .header("Authorization", format!("Bearer {}", self.token))
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", "2022-11-28")
    }

    /// Turn a non-success response into an error carrying GitHub's message
    async fn api_error(response: reqwest::Response, action: &str) -> Error {
        let status = response.status();
        let message = response
            .json::<ApiErrorBody>()
            .await
            .ok()
            .and_then(|b| b.message)
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown").to_string());

        if status == StatusCode::UNAUTHORIZED {
            return Error::Auth(message);
        }
        if status.is_server_error() {
            return Error::Unavailable(format!("{action} failed ({status}): {message}"));
        }
        Error::GitHubApi(format!("{action} failed ({status}): {message}"))
    }

    fn read_strategy() -> impl Iterator<Item = Duration> {
        ExponentialBackoff::from_millis(100)
            .max_delay(Duration::from_secs(5))
            .take(READ_ATTEMPTS - 1)
    }
}

/// Helper to convert an octocrab PR (list payload) to our record
fn record_from_octocrab(
    repo: &RepoId,
    pr: &octocrab::models::pulls::PullRequest,
) -> PullRequestRecord {
    let state = match pr.state {
        Some(octocrab::models::IssueState::Open) => PrState::Open,
        _ if pr.merged_at.is_some() => PrState::Merged,
        // IssueState is non-exhaustive, so use wildcard for Closed and any future variants
        Some(_) | None => PrState::Closed,
    };

    PullRequestRecord {
        key: PrKey {
            repo: repo.clone(),
            number: pr.number,
        },
        title: pr.title.as_deref().unwrap_or_default().to_string(),
        author: pr
            .user
            .as_ref()
            .map(|u| u.login.clone())
            .unwrap_or_default(),
        head_sha: pr.head.sha.clone(),
        base_sha: pr.base.sha.clone(),
        head_ref: pr.head.ref_field.clone(),
        base_ref: pr.base.ref_field.clone(),
        changed_files: BTreeSet::new(),
        is_draft: pr.draft.unwrap_or(false),
        state,
        mergeable_state: MergeableState::Unknown,
        html_url: pr
            .html_url
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_default(),
    }
}

#[async_trait]
impl PlatformService for GitHubService {
    async fn current_user(&self) -> Result<String> {
        debug!("validating token");
        let response = self
            .raw(Method::GET, "/user")
            .send()
            .await
            .map_err(|e| Error::Auth(format!("could not reach GitHub: {e}")))?;

        if !response.status().is_success() {
            return Err(match Self::api_error(response, "token validation").await {
                Error::GitHubApi(msg) => Error::Auth(msg),
                other => other,
            });
        }

        let user: ApiUser = response.json().await?;
        debug!(login = %user.login, "token valid");
        Ok(user.login)
    }

    async fn list_organization_repositories(&self, org: &str) -> Result<Vec<RepositorySummary>> {
        debug!(org, "listing organization repositories");
        let repos = RetryIf::spawn(
            Self::read_strategy(),
            || async {
                let first = self
                    .client
                    .orgs(org)
                    .list_repos()
                    .per_page(PER_PAGE)
                    .send()
                    .await?;
                self.client.all_pages(first).await.map_err(Error::from)
            },
            Error::is_retryable,
        )
        .await?;

        let result: Vec<RepositorySummary> = repos
            .into_iter()
            .map(|r| RepositorySummary {
                id: RepoId::new(org, r.name),
                archived: r.archived.unwrap_or(false),
            })
            .collect();
        debug!(org, count = result.len(), "listed repositories");
        Ok(result)
    }

    async fn list_open_pull_requests(&self, repo: &RepoId) -> Result<Vec<PullRequestRecord>> {
        debug!(%repo, "listing open PRs");
        let prs = RetryIf::spawn(
            Self::read_strategy(),
            || async {
                let first = self
                    .client
                    .pulls(&repo.owner, &repo.name)
                    .list()
                    .state(octocrab::params::State::Open)
                    .per_page(PER_PAGE)
                    .send()
                    .await?;
                self.client.all_pages(first).await.map_err(Error::from)
            },
            Error::is_retryable,
        )
        .await?;

        let result: Vec<PullRequestRecord> =
            prs.iter().map(|pr| record_from_octocrab(repo, pr)).collect();
        debug!(%repo, count = result.len(), "listed open PRs");
        Ok(result)
    }

    async fn get_pull_request(&self, key: &PrKey) -> Result<PullRequestRecord> {
        debug!(pr = %key, "getting PR details");
        let path = format!(
            "/repos/{}/{}/pulls/{}",
            key.repo.owner, key.repo.name, key.number
        );

        let pr: ApiPullRequest = RetryIf::spawn(
            Self::read_strategy(),
            || async {
                let response = self.raw(Method::GET, &path).send().await?;
                if !response.status().is_success() {
                    return Err(Self::api_error(response, "fetching PR").await);
                }
                response.json::<ApiPullRequest>().await.map_err(Error::from)
            },
            Error::is_retryable,
        )
        .await?;

        let record = pr.into_record(&key.repo);
        debug!(
            pr = %key,
            state = %record.state,
            mergeable = %record.mergeable_state,
            head = %record.head_sha,
            "got PR details"
        );
        Ok(record)
    }

    async fn get_changed_files(&self, key: &PrKey) -> Result<BTreeSet<String>> {
        debug!(pr = %key, "listing changed files");
        let files = RetryIf::spawn(
            Self::read_strategy(),
            || async {
                let first = self
                    .client
                    .pulls(&key.repo.owner, &key.repo.name)
                    .list_files(key.number)
                    .await?;
                self.client.all_pages(first).await.map_err(Error::from)
            },
            Error::is_retryable,
        )
        .await?;

        let result: BTreeSet<String> = files.into_iter().map(|f| f.filename).collect();
        debug!(pr = %key, count = result.len(), "listed changed files");
        Ok(result)
    }

    async fn create_approval_review(&self, key: &PrKey, body: &str) -> Result<()> {
        debug!(pr = %key, "approving PR");
        let route = format!(
            "/repos/{}/{}/pulls/{}/reviews",
            key.repo.owner, key.repo.name, key.number
        );
        let _: serde_json::Value = self
            .client
            .post(
                route,
                Some(&serde_json::json!({
                    "event": "APPROVE",
                    "body": body,
                })),
            )
            .await?;
        debug!(pr = %key, "approved PR");
        Ok(())
    }

    async fn update_branch(&self, key: &PrKey, expected_head_sha: &str) -> Result<()> {
        debug!(pr = %key, expected_head_sha, "updating PR branch");
        let path = format!(
            "/repos/{}/{}/pulls/{}/update-branch",
            key.repo.owner, key.repo.name, key.number
        );

        let response = self
            .raw(Method::PUT, &path)
            .json(&serde_json::json!({ "expected_head_sha": expected_head_sha }))
            .send()
            .await?;

        if !response.status().is_success() {
            let err = Self::api_error(response, "updating branch").await;
            warn!(pr = %key, error = %err, "branch update rejected");
            return Err(err);
        }

        debug!(pr = %key, "branch update accepted");
        Ok(())
    }

    async fn merge_pull_request(&self, key: &PrKey, method: MergeMethod) -> Result<MergeResult> {
        debug!(pr = %key, %method, "merging PR");

        let octocrab_method = match method {
            MergeMethod::Squash => octocrab::params::pulls::MergeMethod::Squash,
            MergeMethod::Merge => octocrab::params::pulls::MergeMethod::Merge,
            MergeMethod::Rebase => octocrab::params::pulls::MergeMethod::Rebase,
        };

        let result = self
            .client
            .pulls(&key.repo.owner, &key.repo.name)
            .merge(key.number)
            .method(octocrab_method)
            .send()
            .await
            .map_err(|e| Error::GitHubApi(format!("Merge failed: {e}")))?;

        let merge_result = MergeResult {
            merged: result.merged,
            sha: result.sha,
            message: result.message,
        };

        debug!(
            pr = %key,
            merged = merge_result.merged,
            sha = ?merge_result.sha,
            "merge complete"
        );
        Ok(merge_result)
    }

    fn config(&self) -> &PlatformConfig {
        &self.config
    }
}
