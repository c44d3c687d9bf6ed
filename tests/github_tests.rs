//! GitHub client tests against a local mock HTTP server

use dependamerge::error::Error;
use dependamerge::platform::{GitHubService, PlatformService};
use dependamerge::types::{MergeMethod, MergeableState, PlatformConfig, PrKey, PrState};
use mockito::{Matcher, Server};
use serde_json::json;

const TOKEN: &str = "t0k3n";

fn service(server: &Server) -> GitHubService {
    GitHubService::with_config(
        TOKEN,
        PlatformConfig {
            host: None,
            api_base: server.url(),
        },
    )
    .expect("service builds")
}

fn pull_body(state: &str, merged: bool, mergeable_state: &str) -> serde_json::Value {
    json!({
        "number": 7,
        "title": "Bump requests from 2.28.0 to 2.28.1",
        "user": { "login": "dependabot[bot]" },
        "state": state,
        "merged": merged,
        "draft": false,
        "mergeable": true,
        "mergeable_state": mergeable_state,
        "head": { "ref": "dependabot/pip/requests-2.28.1", "sha": "abc123" },
        "base": { "ref": "main", "sha": "def456" },
        "html_url": "https://github.com/acme/api/pull/7"
    })
}

#[tokio::test]
async fn test_get_pull_request_maps_detail_payload() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/repos/acme/api/pulls/7")
        .match_header("authorization", format!("Bearer {TOKEN}").as_str())
        .match_header("x-github-api-version", "2022-11-28")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(pull_body("open", false, "behind").to_string())
        .create_async()
        .await;

    let pr = service(&server)
        .get_pull_request(&PrKey::new("acme", "api", 7))
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(pr.key, PrKey::new("acme", "api", 7));
    assert_eq!(pr.author, "dependabot[bot]");
    assert_eq!(pr.state, PrState::Open);
    assert_eq!(pr.mergeable_state, MergeableState::Behind);
    assert_eq!(pr.head_sha, "abc123");
    assert_eq!(pr.base_ref, "main");
    assert!(pr.changed_files.is_empty());
}

#[tokio::test]
async fn test_get_pull_request_reports_merged() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/repos/acme/api/pulls/7")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(pull_body("closed", true, "unknown").to_string())
        .create_async()
        .await;

    let pr = service(&server)
        .get_pull_request(&PrKey::new("acme", "api", 7))
        .await
        .unwrap();

    assert_eq!(pr.state, PrState::Merged);
}

#[tokio::test]
async fn test_get_pull_request_retries_server_errors() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/repos/acme/api/pulls/7")
        .with_status(502)
        .with_header("content-type", "application/json")
        .with_body(json!({ "message": "Server Error" }).to_string())
        .expect(3)
        .create_async()
        .await;

    let err = service(&server)
        .get_pull_request(&PrKey::new("acme", "api", 7))
        .await
        .unwrap_err();

    mock.assert_async().await;
    assert!(matches!(err, Error::Unavailable(ref msg) if msg.contains("Server Error")));
    assert!(!err.is_fatal());
}

#[tokio::test]
async fn test_get_pull_request_not_found_is_not_retried() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/repos/acme/api/pulls/7")
        .with_status(404)
        .with_header("content-type", "application/json")
        .with_body(json!({ "message": "Not Found" }).to_string())
        .expect(1)
        .create_async()
        .await;

    let err = service(&server)
        .get_pull_request(&PrKey::new("acme", "api", 7))
        .await
        .unwrap_err();

    mock.assert_async().await;
    assert!(matches!(err, Error::GitHubApi(ref msg) if msg.contains("Not Found")));
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn test_get_pull_request_recovers_after_server_error() {
    let mut server = Server::new_async().await;
    let failing = server
        .mock("GET", "/repos/acme/api/pulls/7")
        .with_status(503)
        .expect(1)
        .create_async()
        .await;

    let client = service(&server);
    let fetch = tokio::spawn(async move {
        client.get_pull_request(&PrKey::new("acme", "api", 7)).await
    });

    // first attempt fails; serve the PR for the retry
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    failing.remove_async().await;
    server
        .mock("GET", "/repos/acme/api/pulls/7")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(pull_body("open", false, "clean").to_string())
        .create_async()
        .await;

    let pr = fetch.await.unwrap().unwrap();
    assert_eq!(pr.mergeable_state, MergeableState::Mergeable);
}

#[tokio::test]
async fn test_current_user_returns_login() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/user")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({ "login": "octocat" }).to_string())
        .create_async()
        .await;

    let login = service(&server).current_user().await.unwrap();
    assert_eq!(login, "octocat");
}

#[tokio::test]
async fn test_current_user_rejected_token_is_auth_error() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/user")
        .with_status(401)
        .with_header("content-type", "application/json")
        .with_body(json!({ "message": "Bad credentials" }).to_string())
        .create_async()
        .await;

    let err = service(&server).current_user().await.unwrap_err();
    assert!(matches!(err, Error::Auth(ref msg) if msg.contains("Bad credentials")));
    assert!(err.is_fatal());
}

#[tokio::test]
async fn test_update_branch_sends_expected_head() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("PUT", "/repos/acme/api/pulls/7/update-branch")
        .match_body(Matcher::Json(json!({ "expected_head_sha": "abc123" })))
        .with_status(202)
        .with_header("content-type", "application/json")
        .with_body(json!({ "message": "Updating pull request branch." }).to_string())
        .create_async()
        .await;

    service(&server)
        .update_branch(&PrKey::new("acme", "api", 7), "abc123")
        .await
        .unwrap();

    mock.assert_async().await;
}

#[tokio::test]
async fn test_update_branch_is_not_retried() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("PUT", "/repos/acme/api/pulls/7/update-branch")
        .with_status(422)
        .with_header("content-type", "application/json")
        .with_body(
            json!({ "message": "expected head sha didn't match current head ref." }).to_string(),
        )
        .expect(1)
        .create_async()
        .await;

    let err = service(&server)
        .update_branch(&PrKey::new("acme", "api", 7), "stale")
        .await
        .unwrap_err();

    mock.assert_async().await;
    assert!(matches!(err, Error::GitHubApi(ref msg) if msg.contains("expected head sha")));
}

#[tokio::test]
async fn test_create_approval_review() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/repos/acme/api/pulls/7/reviews")
        .match_body(Matcher::PartialJson(json!({
            "event": "APPROVE",
            "body": "Auto-approved by dependamerge"
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({ "id": 1, "state": "APPROVED" }).to_string())
        .create_async()
        .await;

    service(&server)
        .create_approval_review(&PrKey::new("acme", "api", 7), "Auto-approved by dependamerge")
        .await
        .unwrap();

    mock.assert_async().await;
}

#[tokio::test]
async fn test_merge_pull_request() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("PUT", "/repos/acme/api/pulls/7/merge")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "sha": "fff000",
                "merged": true,
                "message": "Pull Request successfully merged"
            })
            .to_string(),
        )
        .create_async()
        .await;

    let result = service(&server)
        .merge_pull_request(&PrKey::new("acme", "api", 7), MergeMethod::Squash)
        .await
        .unwrap();

    mock.assert_async().await;
    assert!(result.merged);
    assert_eq!(result.sha.as_deref(), Some("fff000"));
}

#[tokio::test]
async fn test_enterprise_host_api_base() {
    let service = GitHubService::new(TOKEN, Some("git.example.com".to_string())).unwrap();
    assert_eq!(service.config().api_base, "https://git.example.com/api/v3");
    assert_eq!(service.config().host.as_deref(), Some("git.example.com"));
}
