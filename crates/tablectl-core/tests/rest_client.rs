//! REST client behaviour against a mock warehouse API

use std::time::Duration;

use serde_json::{Value, json};
use tablectl_core::{
    Context, CopySpec, CoreError, JobRef, JobState, PollOptions, ServiceError, TableRef,
    WarehouseClient, WriteDisposition, copy_table_and_wait,
};
use wiremock::matchers::{bearer_token, body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PROJECT: &str = "test-project";

fn client(server: &MockServer) -> WarehouseClient {
    WarehouseClient::builder()
        .project_id(PROJECT)
        .api_url(server.uri())
        .access_token("test-token")
        .location("US")
        .build()
        .unwrap()
}

fn job_body(job_id: &str, status: Value) -> Value {
    json!({
        "kind": "bigquery#job",
        "jobReference": {"projectId": PROJECT, "jobId": job_id, "location": "US"},
        "status": status,
        "statistics": {"creationTime": "1700000000000"}
    })
}

fn fast() -> PollOptions {
    PollOptions::new(Duration::from_millis(5), Some(Duration::from_secs(5)))
}

fn copy_spec() -> CopySpec {
    CopySpec::new(TableRef::new("d", "tableA"), TableRef::new("d", "tableB"))
        .write_disposition(WriteDisposition::Truncate)
}

async fn mount_insert(server: &MockServer, response: ResponseTemplate) {
    Mock::given(method("POST"))
        .and(path(format!("/projects/{PROJECT}/jobs")))
        .respond_with(response)
        .mount(server)
        .await;
}

#[tokio::test]
async fn copy_submits_then_polls_to_done() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(format!("/projects/{PROJECT}/jobs")))
        .and(bearer_token("test-token"))
        .and(body_partial_json(json!({
            "jobReference": {"projectId": PROJECT, "location": "US"},
            "configuration": {"copy": {
                "sourceTable": {"projectId": PROJECT, "datasetId": "d", "tableId": "tableA"},
                "destinationTable": {"projectId": PROJECT, "datasetId": "d", "tableId": "tableB"},
                "writeDisposition": "WRITE_TRUNCATE"
            }}
        })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(job_body("j1", json!({"state": "PENDING"}))),
        )
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("/projects/{PROJECT}/jobs/j1")))
        .and(query_param("location", "US"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(job_body("j1", json!({"state": "RUNNING"}))),
        )
        .up_to_n_times(2)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("/projects/{PROJECT}/jobs/j1")))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(job_body("j1", json!({"state": "DONE"}))),
        )
        .mount(&server)
        .await;

    let result = copy_table_and_wait(
        &client(&server),
        &Context::background(),
        &copy_spec(),
        &fast(),
        None,
    )
    .await
    .unwrap();

    assert_eq!(result.job_id.as_str(), "j1");
    assert_eq!(result.status.state, JobState::Done);
    assert!(result.status.err().is_none());
}

#[tokio::test]
async fn failed_job_reports_error_result() {
    let server = MockServer::start().await;
    mount_insert(
        &server,
        ResponseTemplate::new(200).set_body_json(job_body("j1", json!({"state": "RUNNING"}))),
    )
    .await;

    Mock::given(method("GET"))
        .and(path(format!("/projects/{PROJECT}/jobs/j1")))
        .respond_with(ResponseTemplate::new(200).set_body_json(job_body(
            "j1",
            json!({
                "state": "DONE",
                "errorResult": {"reason": "accessDenied", "message": "permission denied"},
                "errors": [{"reason": "accessDenied", "message": "permission denied"}]
            }),
        )))
        .mount(&server)
        .await;

    let err = copy_table_and_wait(
        &client(&server),
        &Context::background(),
        &copy_spec(),
        &fast(),
        None,
    )
    .await
    .unwrap_err();

    match err {
        CoreError::JobFailed { job_id, error } => {
            assert_eq!(job_id.as_str(), "j1");
            assert_eq!(error.reason, "accessDenied");
            assert_eq!(error.message, "permission denied");
        }
        other => panic!("expected JobFailed, got {other:?}"),
    }
}

#[tokio::test]
async fn forbidden_insert_is_a_submission_error() {
    let server = MockServer::start().await;
    mount_insert(
        &server,
        ResponseTemplate::new(403).set_body_json(json!({
            "error": {
                "code": 403,
                "message": "Access Denied: Dataset test-project:d",
                "status": "PERMISSION_DENIED"
            }
        })),
    )
    .await;

    let err = copy_table_and_wait(
        &client(&server),
        &Context::background(),
        &copy_spec(),
        &fast(),
        None,
    )
    .await
    .unwrap_err();

    assert!(matches!(err, CoreError::Submission(ServiceError::Forbidden { .. })));
    assert!(err.to_string().contains("PERMISSION_DENIED"));
}

#[tokio::test]
async fn server_error_while_polling_is_a_poll_error() {
    let server = MockServer::start().await;
    mount_insert(
        &server,
        ResponseTemplate::new(200).set_body_json(job_body("j1", json!({"state": "PENDING"}))),
    )
    .await;

    Mock::given(method("GET"))
        .and(path(format!("/projects/{PROJECT}/jobs/j1")))
        .respond_with(ResponseTemplate::new(500).set_body_string("backend error"))
        .mount(&server)
        .await;

    let err = copy_table_and_wait(
        &client(&server),
        &Context::background(),
        &copy_spec(),
        &fast(),
        None,
    )
    .await
    .unwrap_err();

    assert!(err.is_transport());
    assert!(err.is_server_error());
    assert!(matches!(
        err,
        CoreError::Poll { source: ServiceError::Server { code: 500, .. }, .. }
    ));
}

#[tokio::test]
async fn undecodable_job_body_is_a_poll_error() {
    let server = MockServer::start().await;
    mount_insert(
        &server,
        ResponseTemplate::new(200).set_body_json(job_body("j1", json!({"state": "PENDING"}))),
    )
    .await;

    Mock::given(method("GET"))
        .and(path(format!("/projects/{PROJECT}/jobs/j1")))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let err = copy_table_and_wait(
        &client(&server),
        &Context::background(),
        &copy_spec(),
        &fast(),
        None,
    )
    .await
    .unwrap_err();

    assert!(matches!(
        err,
        CoreError::Poll { source: ServiceError::Decode(_), .. }
    ));
}

#[tokio::test]
async fn slow_response_gives_way_to_context_deadline() {
    let server = MockServer::start().await;
    mount_insert(
        &server,
        ResponseTemplate::new(200)
            .set_body_json(job_body("j1", json!({"state": "PENDING"})))
            .set_delay(Duration::from_secs(5)),
    )
    .await;

    let ctx = Context::background().with_timeout(Duration::from_millis(50));
    let err = copy_table_and_wait(&client(&server), &ctx, &copy_spec(), &fast(), None)
        .await
        .unwrap_err();

    assert!(matches!(err, CoreError::DeadlineExceeded));
}

#[tokio::test]
async fn get_job_returns_creation_time() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/projects/{PROJECT}/jobs/j9")))
        .and(query_param("location", "EU"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(job_body("j9", json!({"state": "RUNNING"}))),
        )
        .mount(&server)
        .await;

    let job = client(&server)
        .get_job(
            &Context::background(),
            &JobRef::new(PROJECT, "j9").location("EU"),
        )
        .await
        .unwrap();

    assert_eq!(job.status.state, JobState::Running);
    assert_eq!(job.created_at.unwrap().timestamp(), 1_700_000_000);
}

#[tokio::test]
async fn get_missing_job_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/projects/{PROJECT}/jobs/nope")))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": {"code": 404, "message": "Not found: Job test-project:nope", "status": "NOT_FOUND"}
        })))
        .mount(&server)
        .await;

    let err = client(&server)
        .get_job(&Context::background(), &JobRef::new(PROJECT, "nope"))
        .await
        .unwrap_err();

    assert!(err.is_not_found());
}

#[tokio::test]
async fn create_dataset_sends_reference_and_location() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("/projects/{PROJECT}/datasets")))
        .and(body_partial_json(json!({
            "datasetReference": {"projectId": PROJECT, "datasetId": "sales"},
            "location": "US"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "datasetReference": {"projectId": PROJECT, "datasetId": "sales"},
            "location": "US"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let dataset = client(&server)
        .create_dataset(&Context::background(), "sales")
        .await
        .unwrap();

    assert_eq!(dataset.dataset_id, "sales");
    assert_eq!(dataset.location.as_deref(), Some("US"));
}

#[tokio::test]
async fn create_existing_dataset_is_a_conflict() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("/projects/{PROJECT}/datasets")))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "error": {"code": 409, "message": "Already Exists: Dataset test-project:sales", "status": "ALREADY_EXISTS"}
        })))
        .mount(&server)
        .await;

    let err = client(&server)
        .create_dataset(&Context::background(), "sales")
        .await
        .unwrap_err();

    assert!(matches!(err, CoreError::Service(ServiceError::Conflict { .. })));
}

#[tokio::test]
async fn invalid_dataset_id_is_rejected_locally() {
    let server = MockServer::start().await;

    let err = client(&server)
        .create_dataset(&Context::background(), "bad-name!")
        .await
        .unwrap_err();

    assert!(err.is_bad_request());
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn list_datasets_follows_page_tokens() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(format!("/projects/{PROJECT}/datasets")))
        .and(query_param("pageToken", "page-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "datasets": [
                {"datasetReference": {"projectId": PROJECT, "datasetId": "c"}}
            ]
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("/projects/{PROJECT}/datasets")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "datasets": [
                {"datasetReference": {"projectId": PROJECT, "datasetId": "a"}, "location": "US"},
                {"datasetReference": {"projectId": PROJECT, "datasetId": "b"}, "friendlyName": "Bee"}
            ],
            "nextPageToken": "page-2"
        })))
        .mount(&server)
        .await;

    let datasets = client(&server)
        .list_datasets(&Context::background())
        .await
        .unwrap();

    let ids: Vec<_> = datasets.iter().map(|d| d.dataset_id.as_str()).collect();
    assert_eq!(ids, vec!["a", "b", "c"]);
    assert_eq!(datasets[1].friendly_name.as_deref(), Some("Bee"));
}

#[tokio::test]
async fn list_datasets_stops_on_repeated_page_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/projects/{PROJECT}/datasets")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "datasets": [{"datasetReference": {"projectId": PROJECT, "datasetId": "a"}}],
            "nextPageToken": "same-token"
        })))
        .expect(2)
        .mount(&server)
        .await;

    let datasets = client(&server)
        .list_datasets(&Context::background())
        .await
        .unwrap();
    assert_eq!(datasets.len(), 2);
}

#[tokio::test]
async fn list_datasets_empty_project() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/projects/{PROJECT}/datasets")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"kind": "bigquery#datasetList"})))
        .mount(&server)
        .await;

    let datasets = client(&server)
        .list_datasets(&Context::background())
        .await
        .unwrap();
    assert!(datasets.is_empty());
}

#[tokio::test]
async fn delete_table_resolves_default_project() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path(format!("/projects/{PROJECT}/datasets/d/tables/tableB")))
        .and(bearer_token("test-token"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    client(&server)
        .delete_table(&Context::background(), &TableRef::new("d", "tableB"))
        .await
        .unwrap();
}

#[tokio::test]
async fn delete_missing_table_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/projects/other/datasets/d/tables/gone"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": {"code": 404, "message": "Not found: Table other:d.gone", "status": "NOT_FOUND"}
        })))
        .mount(&server)
        .await;

    let err = client(&server)
        .delete_table(
            &Context::background(),
            &TableRef::parse("other:d.gone").unwrap(),
        )
        .await
        .unwrap_err();

    assert!(err.is_not_found());
}
