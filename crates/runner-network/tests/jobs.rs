//! Job polling and job state reporting against a fake coordinator.

use mockito::{Matcher, Server, ServerGuard};
use runner_network::{
    ClientConfig, CoordinatorClient, JobPoll, JobState, Network, RunnerConfig, RunnerCredentials,
    UpdateState,
};
use serde_json::json;
use std::time::Duration;

const UNREACHABLE_URL: &str = "http://127.0.0.1:1";

fn client() -> CoordinatorClient {
    CoordinatorClient::new(
        ClientConfig::new("ci/api/v1").with_connect_timeout(Duration::from_secs(2)),
    )
}

fn runner(url: &str, token: &str) -> RunnerConfig {
    RunnerConfig::new(RunnerCredentials::new(url, token))
}

async fn poll_server() -> ServerGuard {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/ci/api/v1/jobs/register")
        .match_header("accept", "application/json")
        .match_body(Matcher::PartialJson(json!({"token": "valid"})))
        .with_status(201)
        .with_header("content-type", "application/json")
        .with_body(r#"{"id": 10, "token": "job-token", "name": "build", "ref": "main"}"#)
        .create_async()
        .await;
    server
        .mock("POST", "/ci/api/v1/jobs/register")
        .match_body(Matcher::PartialJson(json!({"token": "no-jobs"})))
        .with_status(404)
        .create_async()
        .await;
    server
        .mock("POST", "/ci/api/v1/jobs/register")
        .match_body(Matcher::PartialJson(json!({"token": "invalid"})))
        .with_status(403)
        .create_async()
        .await;
    server
        .mock("POST", "/ci/api/v1/jobs/register")
        .match_body(Matcher::PartialJson(json!({"token": "garbled"})))
        .with_status(201)
        .with_header("content-type", "application/json")
        .with_body("{not json")
        .create_async()
        .await;
    server
}

/// Test: a job in the response body is handed out and the runner is healthy
#[tokio::test]
async fn test_poll_job_received() {
    let server = poll_server().await;
    let client = client();

    let poll = client.poll_job(&runner(&server.url(), "valid")).await;
    assert!(poll.is_healthy());
    let job = poll.into_job().expect("job expected");
    assert_eq!(job.id, 10);
    assert_eq!(job.token, "job-token");
    assert_eq!(job.ref_name, "main");
}

/// Test: no job available is a normal, healthy empty poll
#[tokio::test]
async fn test_poll_job_empty() {
    let server = poll_server().await;
    let poll = client().poll_job(&runner(&server.url(), "no-jobs")).await;
    assert_eq!(poll, JobPoll::Empty);
    assert!(poll.is_healthy(), "If no jobs, runner is healthy");
}

/// Test: a rejected token makes the runner unhealthy
#[tokio::test]
async fn test_poll_job_forbidden() {
    let server = poll_server().await;
    let poll = client().poll_job(&runner(&server.url(), "invalid")).await;
    assert_eq!(poll, JobPoll::Unhealthy, "If token is invalid, the runner is unhealthy");
}

/// Test: unexpected status and unparseable bodies are unhealthy
#[tokio::test]
async fn test_poll_job_unexpected_responses() {
    let server = poll_server().await;
    let client = client();

    // No mock matches this token, mockito answers 501
    let poll = client.poll_job(&runner(&server.url(), "other")).await;
    assert_eq!(poll, JobPoll::Unhealthy);

    let poll = client.poll_job(&runner(&server.url(), "garbled")).await;
    assert_eq!(poll, JobPoll::Unhealthy);
}

/// Test: broken URL and unreachable server are unhealthy
#[tokio::test]
async fn test_poll_job_without_server() {
    let client = client();

    let poll = client.poll_job(&runner("broken", "valid")).await;
    assert_eq!(poll, JobPoll::Unhealthy);
    assert!(client.cache().is_empty().await);

    let poll = client.poll_job(&runner(UNREACHABLE_URL, "valid")).await;
    assert_eq!(poll, JobPoll::Unhealthy);
}

/// Test: the poll request reuses one handle per server
#[tokio::test]
async fn test_repeated_polls_share_handle() {
    let server = poll_server().await;
    let client = client();
    let config = runner(&server.url(), "no-jobs");

    for _ in 0..3 {
        assert_eq!(client.poll_job(&config).await, JobPoll::Empty);
    }
    assert_eq!(client.cache().len().await, 1);
}

async fn update_server() -> ServerGuard {
    let mut server = Server::new_async().await;
    let body = |state: &str| {
        Matcher::Json(json!({"token": "token", "state": state, "trace": "trace"}))
    };

    server
        .mock("PUT", "/ci/api/v1/jobs/10")
        .match_body(body("running"))
        .with_status(200)
        .create_async()
        .await;
    server
        .mock("PUT", "/ci/api/v1/jobs/10")
        .match_body(body("failed"))
        .with_status(403)
        .create_async()
        .await;
    server
        .mock("PUT", "/ci/api/v1/jobs/10")
        .match_body(body("canceled"))
        .with_status(400)
        .create_async()
        .await;
    server
        .mock("PUT", "/ci/api/v1/jobs/4")
        .with_status(404)
        .create_async()
        .await;
    server
}

/// Test: job state update outcomes
#[tokio::test]
async fn test_update_job() {
    let server = update_server().await;
    let client = client();
    let config = runner(&server.url(), "token");
    let trace = Some("trace");

    let state = client.update_job(&config, 10, JobState::Running, trace).await;
    assert_eq!(state, UpdateState::Succeeded, "Update should continue when running");

    let state = client.update_job(&config, 10, JobState::Failed, trace).await;
    assert_eq!(state, UpdateState::Abort, "Update should abort when forbidden");

    let state = client.update_job(&config, 10, JobState::Canceled, trace).await;
    assert_eq!(state, UpdateState::Failed, "Update should fail for a rejected request");

    let state = client.update_job(&config, 4, JobState::Success, trace).await;
    assert_eq!(state, UpdateState::Abort, "Update should abort for unknown job");
}

/// Test: update without trace omits the field
#[tokio::test]
async fn test_update_job_without_trace() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("PUT", "/ci/api/v1/jobs/7")
        .match_body(Matcher::Json(json!({"token": "token", "state": "success"})))
        .with_status(200)
        .expect(1)
        .create_async()
        .await;

    let state = client()
        .update_job(&runner(&server.url(), "token"), 7, JobState::Success, None)
        .await;
    assert_eq!(state, UpdateState::Succeeded);
    mock.assert_async().await;
}

/// Test: broken URL aborts, unreachable server fails
#[tokio::test]
async fn test_update_job_without_server() {
    let client = client();

    let state = client
        .update_job(&runner("broken", "token"), 4, JobState::Running, Some("trace"))
        .await;
    assert_eq!(state, UpdateState::Abort);

    let state = client
        .update_job(&runner(UNREACHABLE_URL, "token"), 4, JobState::Running, Some("trace"))
        .await;
    assert_eq!(state, UpdateState::Failed);
}
