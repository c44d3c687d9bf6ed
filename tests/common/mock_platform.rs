//! Mock platform service for testing
//!
//! These are test utilities - not all may be used in every test binary.

#![allow(dead_code)]

use async_trait::async_trait;
use dependamerge::error::{Error, Result};
use dependamerge::platform::PlatformService;
use dependamerge::types::{
    MergeMethod, MergeResult, MergeableState, PlatformConfig, PrKey, PrState, PullRequestRecord,
    RepoId, RepositorySummary,
};
use std::collections::{BTreeSet, HashMap};
use std::sync::Mutex;

/// Call record for `create_approval_review`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApproveCall {
    pub key: PrKey,
    pub body: String,
}

/// Call record for `update_branch`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateBranchCall {
    pub key: PrKey,
    pub expected_head_sha: String,
}

/// Call record for `merge_pull_request`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergePrCall {
    pub key: PrKey,
    pub method: MergeMethod,
}

/// Simple mock platform service for testing
///
/// This manually implements `PlatformService` rather than using mockall,
/// so tests can script whole organizations.
///
/// Features:
/// - Organization/repository/PR fixtures
/// - Call tracking for verification
/// - Snapshot transitions after `update_branch` and `merge_pull_request`,
///   optionally lagging behind like GitHub's background jobs
/// - Error injection for failure path testing
pub struct MockPlatformService {
    config: PlatformConfig,
    user: Mutex<Option<String>>,
    repos: Mutex<HashMap<String, Vec<RepositorySummary>>>,
    open_prs: Mutex<HashMap<RepoId, Vec<PullRequestRecord>>>,
    details: Mutex<HashMap<PrKey, PullRequestRecord>>,
    after_update: Mutex<HashMap<PrKey, PullRequestRecord>>,
    update_lag: Mutex<HashMap<PrKey, usize>>,
    pending_updates: Mutex<HashMap<PrKey, (usize, PullRequestRecord)>>,
    mergeability_lag: Mutex<HashMap<PrKey, usize>>,
    merge_responses: Mutex<HashMap<PrKey, MergeResult>>,
    // Call tracking
    list_repos_calls: Mutex<Vec<String>>,
    list_prs_calls: Mutex<Vec<RepoId>>,
    get_pr_calls: Mutex<Vec<PrKey>>,
    changed_files_calls: Mutex<Vec<PrKey>>,
    approve_calls: Mutex<Vec<ApproveCall>>,
    update_branch_calls: Mutex<Vec<UpdateBranchCall>>,
    merge_calls: Mutex<Vec<MergePrCall>>,
    // Error injection
    error_on_list_repos: Mutex<Option<String>>,
    error_on_list_prs: Mutex<HashMap<RepoId, String>>,
    unauthorized_list_prs: Mutex<BTreeSet<RepoId>>,
    error_on_get_pr: Mutex<HashMap<PrKey, String>>,
    error_on_changed_files: Mutex<HashMap<PrKey, String>>,
    error_on_approve: Mutex<HashMap<PrKey, String>>,
    error_on_update_branch: Mutex<Option<String>>,
    error_on_merge: Mutex<HashMap<PrKey, String>>,
}

impl MockPlatformService {
    /// Create a new mock with the given config
    pub fn with_config(config: PlatformConfig) -> Self {
        Self {
            config,
            user: Mutex::new(Some("octocat".to_string())),
            repos: Mutex::new(HashMap::new()),
            open_prs: Mutex::new(HashMap::new()),
            details: Mutex::new(HashMap::new()),
            after_update: Mutex::new(HashMap::new()),
            update_lag: Mutex::new(HashMap::new()),
            pending_updates: Mutex::new(HashMap::new()),
            mergeability_lag: Mutex::new(HashMap::new()),
            merge_responses: Mutex::new(HashMap::new()),
            list_repos_calls: Mutex::new(Vec::new()),
            list_prs_calls: Mutex::new(Vec::new()),
            get_pr_calls: Mutex::new(Vec::new()),
            changed_files_calls: Mutex::new(Vec::new()),
            approve_calls: Mutex::new(Vec::new()),
            update_branch_calls: Mutex::new(Vec::new()),
            merge_calls: Mutex::new(Vec::new()),
            error_on_list_repos: Mutex::new(None),
            error_on_list_prs: Mutex::new(HashMap::new()),
            unauthorized_list_prs: Mutex::new(BTreeSet::new()),
            error_on_get_pr: Mutex::new(HashMap::new()),
            error_on_changed_files: Mutex::new(HashMap::new()),
            error_on_approve: Mutex::new(HashMap::new()),
            error_on_update_branch: Mutex::new(None),
            error_on_merge: Mutex::new(HashMap::new()),
        }
    }

    // === Fixture setup ===

    /// Add a repository to an organization
    pub fn add_repo(&self, org: &str, name: &str) {
        self.add_repo_with_archived(org, name, false);
    }

    /// Add an archived repository to an organization
    pub fn add_archived_repo(&self, org: &str, name: &str) {
        self.add_repo_with_archived(org, name, true);
    }

    fn add_repo_with_archived(&self, org: &str, name: &str, archived: bool) {
        self.repos
            .lock()
            .unwrap()
            .entry(org.to_string())
            .or_default()
            .push(RepositorySummary {
                id: RepoId::new(org, name),
                archived,
            });
    }

    /// Add an open PR.
    ///
    /// The listing copy has no changed files and unknown mergeability, like
    /// the real list endpoint. `get_pull_request` returns the full record
    /// (minus files) and `get_changed_files` returns its file set.
    pub fn add_pr(&self, record: PullRequestRecord) {
        let listing = PullRequestRecord {
            changed_files: BTreeSet::new(),
            mergeable_state: MergeableState::Unknown,
            ..record.clone()
        };
        self.open_prs
            .lock()
            .unwrap()
            .entry(record.key.repo.clone())
            .or_default()
            .push(listing);
        self.details
            .lock()
            .unwrap()
            .insert(record.key.clone(), record);
    }

    /// Replace the detail snapshot returned by `get_pull_request`
    pub fn set_pr_details(&self, record: PullRequestRecord) {
        self.details
            .lock()
            .unwrap()
            .insert(record.key.clone(), record);
    }

    /// Snapshot to serve once `update_branch` succeeds for this PR
    pub fn set_after_update(&self, record: PullRequestRecord) {
        self.after_update
            .lock()
            .unwrap()
            .insert(record.key.clone(), record);
    }

    /// Keep serving the pre-update snapshot for this many `get_pull_request`
    /// calls after `update_branch` succeeds
    pub fn set_update_lag(&self, key: &PrKey, stale_fetches: usize) {
        self.update_lag
            .lock()
            .unwrap()
            .insert(key.clone(), stale_fetches);
    }

    /// Report unknown mergeability for the next `fetches` calls to
    /// `get_pull_request` on this PR
    pub fn set_mergeability_lag(&self, key: &PrKey, fetches: usize) {
        self.mergeability_lag
            .lock()
            .unwrap()
            .insert(key.clone(), fetches);
    }

    /// Set the response for `merge_pull_request` for a specific PR
    pub fn set_merge_response(&self, key: &PrKey, result: MergeResult) {
        self.merge_responses
            .lock()
            .unwrap()
            .insert(key.clone(), result);
    }

    /// Make `current_user` reject the token
    pub fn reject_token(&self) {
        *self.user.lock().unwrap() = None;
    }

    // === Error injection methods ===

    /// Make `list_organization_repositories` return an error
    pub fn fail_list_repos(&self, msg: &str) {
        *self.error_on_list_repos.lock().unwrap() = Some(msg.to_string());
    }

    /// Make `list_open_pull_requests` fail for one repository
    pub fn fail_list_prs(&self, repo: &RepoId, msg: &str) {
        self.error_on_list_prs
            .lock()
            .unwrap()
            .insert(repo.clone(), msg.to_string());
    }

    /// Make `list_open_pull_requests` reject the token for one repository
    pub fn fail_list_prs_unauthorized(&self, repo: &RepoId) {
        self.unauthorized_list_prs
            .lock()
            .unwrap()
            .insert(repo.clone());
    }

    /// Make `get_pull_request` fail for one PR
    pub fn fail_get_pr(&self, key: &PrKey, msg: &str) {
        self.error_on_get_pr
            .lock()
            .unwrap()
            .insert(key.clone(), msg.to_string());
    }

    /// Make `get_changed_files` fail for one PR
    pub fn fail_changed_files(&self, key: &PrKey, msg: &str) {
        self.error_on_changed_files
            .lock()
            .unwrap()
            .insert(key.clone(), msg.to_string());
    }

    /// Make `create_approval_review` fail for one PR
    pub fn fail_approve(&self, key: &PrKey, msg: &str) {
        self.error_on_approve
            .lock()
            .unwrap()
            .insert(key.clone(), msg.to_string());
    }

    /// Make every `update_branch` call fail
    pub fn fail_update_branch(&self, msg: &str) {
        *self.error_on_update_branch.lock().unwrap() = Some(msg.to_string());
    }

    /// Make `merge_pull_request` return an error for one PR
    pub fn fail_merge(&self, key: &PrKey, msg: &str) {
        self.error_on_merge
            .lock()
            .unwrap()
            .insert(key.clone(), msg.to_string());
    }

    // === Call verification methods ===

    /// Organizations listed
    pub fn get_list_repos_calls(&self) -> Vec<String> {
        self.list_repos_calls.lock().unwrap().clone()
    }

    /// Repositories whose PRs were listed
    pub fn get_list_prs_calls(&self) -> Vec<RepoId> {
        self.list_prs_calls.lock().unwrap().clone()
    }

    /// PRs fetched individually
    pub fn get_pr_calls(&self) -> Vec<PrKey> {
        self.get_pr_calls.lock().unwrap().clone()
    }

    /// Number of times one PR was fetched individually
    pub fn get_pr_call_count(&self, key: &PrKey) -> usize {
        self.get_pr_calls().iter().filter(|k| *k == key).count()
    }

    /// PRs whose changed files were fetched
    pub fn get_changed_files_calls(&self) -> Vec<PrKey> {
        self.changed_files_calls.lock().unwrap().clone()
    }

    /// All `create_approval_review` calls
    pub fn get_approve_calls(&self) -> Vec<ApproveCall> {
        self.approve_calls.lock().unwrap().clone()
    }

    /// All `update_branch` calls
    pub fn get_update_branch_calls(&self) -> Vec<UpdateBranchCall> {
        self.update_branch_calls.lock().unwrap().clone()
    }

    /// All `merge_pull_request` calls
    pub fn get_merge_calls(&self) -> Vec<MergePrCall> {
        self.merge_calls.lock().unwrap().clone()
    }

    /// Number of mutating calls issued (approve + update + merge)
    pub fn mutating_call_count(&self) -> usize {
        self.get_approve_calls().len()
            + self.get_update_branch_calls().len()
            + self.get_merge_calls().len()
    }

    /// Assert that no mutating call was issued
    pub fn assert_no_mutations(&self) {
        assert_eq!(
            self.mutating_call_count(),
            0,
            "Expected no mutating calls but got approve={:?} update={:?} merge={:?}",
            self.get_approve_calls(),
            self.get_update_branch_calls(),
            self.get_merge_calls()
        );
    }

    /// Assert the exact order in which PRs were merged
    pub fn assert_merged_in_order(&self, expected: &[&PrKey]) {
        let merged: Vec<PrKey> = self.get_merge_calls().into_iter().map(|c| c.key).collect();
        let expected: Vec<PrKey> = expected.iter().map(|k| (*k).clone()).collect();
        assert_eq!(merged, expected, "Unexpected merge order");
    }

    /// Assert each PR was approved before it was merged, exactly once
    pub fn assert_approved_once(&self, key: &PrKey) {
        let approvals = self
            .get_approve_calls()
            .iter()
            .filter(|c| &c.key == key)
            .count();
        assert_eq!(approvals, 1, "Expected one approval for {key}");
    }
}

#[async_trait]
impl PlatformService for MockPlatformService {
    async fn current_user(&self) -> Result<String> {
        self.user
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| Error::Auth("Bad credentials".to_string()))
    }

    async fn list_organization_repositories(&self, org: &str) -> Result<Vec<RepositorySummary>> {
        self.list_repos_calls.lock().unwrap().push(org.to_string());
        if let Some(msg) = self.error_on_list_repos.lock().unwrap().clone() {
            return Err(Error::Platform(msg));
        }
        Ok(self
            .repos
            .lock()
            .unwrap()
            .get(org)
            .cloned()
            .unwrap_or_default())
    }

    async fn list_open_pull_requests(&self, repo: &RepoId) -> Result<Vec<PullRequestRecord>> {
        self.list_prs_calls.lock().unwrap().push(repo.clone());
        if let Some(msg) = self.error_on_list_prs.lock().unwrap().get(repo) {
            return Err(Error::Platform(msg.clone()));
        }
        if self.unauthorized_list_prs.lock().unwrap().contains(repo) {
            return Err(Error::Auth("Bad credentials".to_string()));
        }

        // Like the real endpoint, merged or closed PRs drop out of the listing
        let details = self.details.lock().unwrap();
        Ok(self
            .open_prs
            .lock()
            .unwrap()
            .get(repo)
            .cloned()
            .unwrap_or_default()
            .into_iter()
            .filter(|pr| {
                details
                    .get(&pr.key)
                    .is_none_or(|detail| detail.state == PrState::Open)
            })
            .collect())
    }

    async fn get_pull_request(&self, key: &PrKey) -> Result<PullRequestRecord> {
        self.get_pr_calls.lock().unwrap().push(key.clone());
        if let Some(msg) = self.error_on_get_pr.lock().unwrap().get(key) {
            return Err(Error::Platform(msg.clone()));
        }

        let landed = {
            let mut pending = self.pending_updates.lock().unwrap();
            let ready = match pending.get_mut(key) {
                Some((stale_fetches, _)) if *stale_fetches > 0 => {
                    *stale_fetches -= 1;
                    false
                }
                Some(_) => true,
                None => false,
            };
            if ready {
                pending.remove(key).map(|(_, record)| record)
            } else {
                None
            }
        };
        if let Some(record) = landed {
            self.details.lock().unwrap().insert(key.clone(), record);
        }

        let mut record = self
            .details
            .lock()
            .unwrap()
            .get(key)
            .map(|r| PullRequestRecord {
                changed_files: BTreeSet::new(),
                ..r.clone()
            })
            .ok_or_else(|| Error::Platform(format!("{key} not found")))?;

        if let Some(fetches) = self.mergeability_lag.lock().unwrap().get_mut(key) {
            if *fetches > 0 {
                *fetches -= 1;
                record.mergeable_state = MergeableState::Unknown;
            }
        }
        Ok(record)
    }

    async fn get_changed_files(&self, key: &PrKey) -> Result<BTreeSet<String>> {
        self.changed_files_calls.lock().unwrap().push(key.clone());
        if let Some(msg) = self.error_on_changed_files.lock().unwrap().get(key) {
            return Err(Error::Platform(msg.clone()));
        }
        Ok(self
            .details
            .lock()
            .unwrap()
            .get(key)
            .map(|r| r.changed_files.clone())
            .unwrap_or_default())
    }

    async fn create_approval_review(&self, key: &PrKey, body: &str) -> Result<()> {
        self.approve_calls.lock().unwrap().push(ApproveCall {
            key: key.clone(),
            body: body.to_string(),
        });
        if let Some(msg) = self.error_on_approve.lock().unwrap().get(key) {
            return Err(Error::Platform(msg.clone()));
        }
        Ok(())
    }

    async fn update_branch(&self, key: &PrKey, expected_head_sha: &str) -> Result<()> {
        self.update_branch_calls
            .lock()
            .unwrap()
            .push(UpdateBranchCall {
                key: key.clone(),
                expected_head_sha: expected_head_sha.to_string(),
            });
        if let Some(msg) = self.error_on_update_branch.lock().unwrap().clone() {
            return Err(Error::Platform(msg));
        }
        if let Some(updated) = self.after_update.lock().unwrap().remove(key) {
            let lag = self.update_lag.lock().unwrap().get(key).copied().unwrap_or(0);
            self.pending_updates
                .lock()
                .unwrap()
                .insert(key.clone(), (lag, updated));
        }
        Ok(())
    }

    async fn merge_pull_request(&self, key: &PrKey, method: MergeMethod) -> Result<MergeResult> {
        self.merge_calls.lock().unwrap().push(MergePrCall {
            key: key.clone(),
            method,
        });
        if let Some(msg) = self.error_on_merge.lock().unwrap().get(key) {
            return Err(Error::Platform(msg.clone()));
        }

        let result = self
            .merge_responses
            .lock()
            .unwrap()
            .get(key)
            .cloned()
            .unwrap_or_else(|| MergeResult {
                merged: true,
                sha: Some(format!("merged_sha_{}", key.number)),
                message: None,
            });

        if result.merged {
            if let Some(record) = self.details.lock().unwrap().get_mut(key) {
                record.state = PrState::Merged;
            }
        }
        Ok(result)
    }

    fn config(&self) -> &PlatformConfig {
        &self.config
    }
}
