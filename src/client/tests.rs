#![allow(clippy::unwrap_used, clippy::expect_used)]

use super::*;
use crate::config::PollConfig;
use crate::error::{DownloadError, Error, PollError, SubmissionError};
use crate::test_helpers::*;
use crate::types::{DateRange, ExportJob, ExportRequest, JobState, ResultChunk};
use serde_json::json;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn group() -> Scope {
    Scope::Group("grp-1".to_string())
}

fn request() -> ExportRequest {
    ExportRequest::new(group(), DateRange::parse("2025-01-01", "2025-12-31").unwrap())
}

fn job() -> ExportJob {
    ExportJob::new(ExportJobId::new("job-1"))
}

async fn client(server: &MockServer) -> ExportClient {
    ExportClient::new(&api_config(&server.uri())).unwrap()
}

// --- endpoints ---

#[tokio::test]
async fn endpoints_follow_scope_kind_and_carry_version() {
    let server = MockServer::start().await;
    let client = client(&server).await;
    let job_id = ExportJobId::new("j 1");

    let url = client.export_url(&Scope::Org("o-1".into())).unwrap();
    assert_eq!(url.path(), "/rest/orgs/o-1/export");
    assert_eq!(url.query(), Some("version=2024-10-15"));

    let url = client.status_url(&group(), &job_id).unwrap();
    assert_eq!(url.path(), "/rest/groups/grp-1/jobs/export/j%201");

    let url = client.results_url(&group(), &job_id).unwrap();
    assert_eq!(url.path(), "/rest/groups/grp-1/export/j%201");
}

#[test]
fn client_rejects_unusable_base_url() {
    let err = ExportClient::new(&api_config("not a url")).unwrap_err();
    assert!(matches!(err, Error::Validation { .. }));
    let err = ExportClient::new(&api_config("mailto:someone@example.com")).unwrap_err();
    assert!(matches!(err, Error::Validation { .. }));
}

// --- submission ---

#[tokio::test]
async fn submit_sends_normalized_range_and_returns_job_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/groups/grp-1/export"))
        .and(query_param("version", VERSION))
        .and(header("authorization", "token test-token"))
        .and(body_partial_json(json!({
            "data": {
                "type": "resource",
                "attributes": {
                    "dataset": "issues",
                    "formats": ["csv"],
                    "url_expiration_seconds": 3600,
                    "filters": { "introduced": {
                        "from": "2025-01-01T00:00:00Z",
                        "to": "2025-12-31T23:59:59Z"
                    } }
                }
            }
        })))
        .respond_with(ResponseTemplate::new(202).set_body_json(created_body("job-42")))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server).await;
    let job = JobSubmitter::new(&client).submit(&request()).await.unwrap();
    assert_eq!(job.id().as_str(), "job-42");
    assert_eq!(job.state(), None);
}

#[tokio::test]
async fn submit_non_accepted_status_is_rejection_with_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401).set_body_string("bad token"))
        .mount(&server)
        .await;

    let client = client(&server).await;
    let err = JobSubmitter::new(&client).submit(&request()).await.unwrap_err();
    match err {
        Error::Submission(SubmissionError::Rejected { status, body }) => {
            assert_eq!(status, 401);
            assert_eq!(body, "bad token");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn submit_ok_but_not_accepted_is_still_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(created_body("job-1")))
        .mount(&server)
        .await;

    let client = client(&server).await;
    let err = JobSubmitter::new(&client).submit(&request()).await.unwrap_err();
    assert!(matches!(
        err,
        Error::Submission(SubmissionError::Rejected { status: 200, .. })
    ));
}

#[tokio::test]
async fn submit_accepted_without_id_is_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(202).set_body_json(json!({ "data": { "type": "resource" } })))
        .mount(&server)
        .await;

    let client = client(&server).await;
    let err = JobSubmitter::new(&client).submit(&request()).await.unwrap_err();
    assert!(matches!(
        err,
        Error::Submission(SubmissionError::MalformedResponse { .. })
    ));
}

// --- polling ---

async fn mount_statuses(server: &MockServer, sequence: &[Option<&str>]) {
    for status in sequence {
        Mock::given(method("GET"))
            .and(path("/rest/groups/grp-1/jobs/export/job-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(status_body(*status)))
            .up_to_n_times(1)
            .mount(server)
            .await;
    }
}

#[tokio::test]
async fn pending_twice_then_finished_sleeps_twice() {
    let server = MockServer::start().await;
    mount_statuses(&server, &[Some("PENDING"), Some("PENDING"), Some("FINISHED")]).await;

    let client = client(&server).await;
    let scope = group();
    let config = PollConfig::default();
    let sleeper = RecordingSleeper::default();
    let mut job = job();

    let mut poller = JobStatusPoller::new(&client, &scope, &config, &sleeper);
    let attempts = poller.wait_until_ready(&mut job).await.unwrap();

    assert_eq!(attempts, 3);
    assert_eq!(sleeper.calls(), vec![Duration::from_secs(1); 2]);
    assert_eq!(poller.waited(), Duration::from_secs(2));
    assert_eq!(job.state(), Some(&JobState::Finished));
}

#[tokio::test]
async fn started_and_absent_status_count_as_ready() {
    for status in [Some("STARTED"), None] {
        let server = MockServer::start().await;
        mount_statuses(&server, &[status]).await;

        let client = client(&server).await;
        let scope = group();
        let config = PollConfig::default();
        let sleeper = RecordingSleeper::default();
        let mut job = job();

        let mut poller = JobStatusPoller::new(&client, &scope, &config, &sleeper);
        assert_eq!(poller.wait_until_ready(&mut job).await.unwrap(), 1);
        assert!(sleeper.calls().is_empty());
    }
}

#[tokio::test]
async fn error_status_is_fatal() {
    let server = MockServer::start().await;
    mount_statuses(&server, &[Some("PENDING"), Some("ERROR")]).await;

    let client = client(&server).await;
    let scope = group();
    let config = PollConfig::default();
    let sleeper = RecordingSleeper::default();
    let mut job = job();

    let mut poller = JobStatusPoller::new(&client, &scope, &config, &sleeper);
    let err = poller.wait_until_ready(&mut job).await.unwrap_err();
    match err {
        Error::Poll(PollError::JobFailed { status, .. }) => assert_eq!(status, "ERROR"),
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(sleeper.calls().len(), 1);
    assert_eq!(job.state(), Some(&JobState::Error));
}

#[tokio::test]
async fn non_200_status_check_is_fatal() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404).set_body_string("no such job"))
        .mount(&server)
        .await;

    let client = client(&server).await;
    let scope = group();
    let config = PollConfig::default();
    let sleeper = RecordingSleeper::default();
    let mut job = job();

    let mut poller = JobStatusPoller::new(&client, &scope, &config, &sleeper);
    let err = poller.wait_until_ready(&mut job).await.unwrap_err();
    assert!(matches!(
        err,
        Error::Poll(PollError::HttpStatus { status: 404, .. })
    ));
}

#[tokio::test]
async fn max_wait_bounds_polling() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(status_body(Some("PENDING"))))
        .mount(&server)
        .await;

    let client = client(&server).await;
    let scope = group();
    let config = PollConfig {
        interval: Duration::from_secs(1),
        max_wait: Some(Duration::from_secs(3)),
    };
    let sleeper = RecordingSleeper::default();
    let mut job = job();

    let mut poller = JobStatusPoller::new(&client, &scope, &config, &sleeper);
    let err = poller.wait_until_ready(&mut job).await.unwrap_err();
    assert!(matches!(
        err,
        Error::Poll(PollError::TimedOut { waited_secs: 3, .. })
    ));
    assert_eq!(sleeper.calls().len(), 3);
}

#[tokio::test]
async fn empty_listing_is_refetched_until_finished() {
    let server = MockServer::start().await;
    mount_statuses(&server, &[Some("STARTED")]).await;
    Mock::given(method("GET"))
        .and(path("/rest/groups/grp-1/export/job-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(listing_body(&[], "STARTED")))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    let chunk_url = format!("{}/chunks/1.csv", server.uri());
    Mock::given(method("GET"))
        .and(path("/rest/groups/grp-1/export/job-1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(listing_body(&[chunk_url.clone()], "FINISHED")),
        )
        .mount(&server)
        .await;

    let client = client(&server).await;
    let scope = group();
    let config = PollConfig::default();
    let sleeper = RecordingSleeper::default();
    let mut job = job();

    let mut poller = JobStatusPoller::new(&client, &scope, &config, &sleeper);
    let results = poller.wait_for_results(&mut job).await.unwrap();

    assert_eq!(sleeper.calls().len(), 1);
    assert_eq!(results.chunks.len(), 1);
    assert_eq!(results.chunks[0].url.as_deref(), Some(chunk_url.as_str()));
    assert_eq!(results.row_count, 1);
    assert_eq!(results.raw["data"]["id"], "job-1");
    assert_eq!(job.state(), Some(&JobState::Finished));
}

#[tokio::test]
async fn finished_listing_with_no_results_is_an_empty_export() {
    let server = MockServer::start().await;
    mount_statuses(&server, &[Some("FINISHED")]).await;
    Mock::given(method("GET"))
        .and(path("/rest/groups/grp-1/export/job-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(listing_body(&[], "FINISHED")))
        .mount(&server)
        .await;

    let client = client(&server).await;
    let scope = group();
    let config = PollConfig::default();
    let sleeper = RecordingSleeper::default();
    let mut job = job();

    let mut poller = JobStatusPoller::new(&client, &scope, &config, &sleeper);
    let results = poller.wait_for_results(&mut job).await.unwrap();
    assert!(results.chunks.is_empty());
    assert!(sleeper.calls().is_empty());
}

// --- downloads ---

#[tokio::test]
async fn chunks_are_fetched_in_order_and_failures_skipped() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/chunks/1.csv"))
        .respond_with(ResponseTemplate::new(200).set_body_string("A,B\n1,2\n"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/chunks/2.csv"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/chunks/3.csv"))
        .respond_with(ResponseTemplate::new(200).set_body_string("A,B\n3,4\n"))
        .mount(&server)
        .await;

    let chunks: Vec<ResultChunk> = (1..=3)
        .map(|i| ResultChunk {
            url: Some(format!("{}/chunks/{i}.csv", server.uri())),
            file_size: 8,
            row_count: Some(1),
        })
        .chain(std::iter::once(ResultChunk::default()))
        .collect();

    let dir = TempDir::new().unwrap();
    let client = client(&server).await;
    let downloader = ResultDownloader::new(&client).saving_to(dir.path());

    let mut seen = Vec::new();
    let fetched = downloader
        .fetch_each(&chunks, |outcome| seen.push(outcome))
        .await;

    assert_eq!(fetched, 2);
    assert_eq!(seen.len(), 4);
    assert_eq!(seen[0].as_ref().unwrap().data, b"A,B\n1,2\n");
    assert!(matches!(
        seen[1],
        Err(DownloadError::HttpStatus {
            index: 2,
            status: 403
        })
    ));
    assert_eq!(seen[2].as_ref().unwrap().index, 3);
    assert!(matches!(seen[3], Err(DownloadError::MissingUrl { index: 4 })));

    assert_eq!(
        std::fs::read(dir.path().join("csv_1.csv")).unwrap(),
        b"A,B\n1,2\n"
    );
    assert!(!dir.path().join("csv_2.csv").exists());
    assert!(dir.path().join("csv_3.csv").exists());
}

#[tokio::test]
async fn chunk_download_sends_no_credential() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/signed"))
        .and(header("authorization", "token test-token"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/signed"))
        .respond_with(ResponseTemplate::new(200).set_body_string("X\n"))
        .mount(&server)
        .await;

    let client = client(&server).await;
    let chunk = ResultChunk {
        url: Some(format!("{}/signed", server.uri())),
        ..ResultChunk::default()
    };
    let downloaded = ResultDownloader::new(&client).fetch(1, &chunk).await.unwrap();
    assert_eq!(downloaded.data, b"X\n");
    assert_eq!(downloaded.path, None);
}
