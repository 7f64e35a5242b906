//! End-to-end `table copy` and `job` commands against a mock warehouse API

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::{Value, json};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PROJECT: &str = "test-project";

fn job_body(job_id: &str, status: Value) -> Value {
    json!({
        "jobReference": {"projectId": PROJECT, "jobId": job_id, "location": "US"},
        "status": status
    })
}

/// Writes a profile pointing at `server` and returns the holding directory
fn config_for(server: &MockServer) -> TempDir {
    let dir = TempDir::new().unwrap();
    let config = format!(
        r#"default_profile = "mock"

[profiles.mock]
project_id = "{PROJECT}"
api_url = "{}"
access_token = "test-token"
location = "US"

[profiles.mock.poll]
interval_secs = 1
timeout_secs = 30
"#,
        server.uri()
    );
    std::fs::write(dir.path().join("config.toml"), config).unwrap();
    dir
}

fn tablectl(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("tablectl").unwrap();
    cmd.env_remove("TABLECTL_PROFILE")
        .env_remove("TABLECTL_ACCESS_TOKEN")
        .arg("--config-file")
        .arg(dir.path().join("config.toml"));
    cmd
}

async fn mount_insert(server: &MockServer, job_id: &str) {
    Mock::given(method("POST"))
        .and(path(format!("/projects/{PROJECT}/jobs")))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(job_body(job_id, json!({"state": "PENDING"}))),
        )
        .expect(1)
        .mount(server)
        .await;
}

async fn mount_status(server: &MockServer, job_id: &str, status: Value) {
    Mock::given(method("GET"))
        .and(path(format!("/projects/{PROJECT}/jobs/{job_id}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(job_body(job_id, status)))
        .mount(server)
        .await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_copy_wait_prints_result_json() {
    let server = MockServer::start().await;
    mount_insert(&server, "job_ok").await;
    mount_status(&server, "job_ok", json!({"state": "DONE"})).await;
    let dir = config_for(&server);

    tablectl(&dir)
        .args([
            "table",
            "copy",
            "sales.orders",
            "sales.orders_backup",
            "--write-disposition",
            "truncate",
            "--wait",
            "-o",
            "json",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"jobId\": \"job_ok\""))
        .stdout(predicate::str::contains("WRITE_TRUNCATE"))
        .stdout(predicate::str::contains("\"state\": \"DONE\""));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_copy_without_wait_prints_hint() {
    let server = MockServer::start().await;
    mount_insert(&server, "job_async").await;
    let dir = config_for(&server);

    tablectl(&dir)
        .args(["table", "copy", "sales.orders", "sales.orders_copy"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Copy job job_async submitted"))
        .stdout(predicate::str::contains("tablectl job wait job_async"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_copy_wait_reports_job_failure() {
    let server = MockServer::start().await;
    mount_insert(&server, "job_bad").await;
    mount_status(
        &server,
        "job_bad",
        json!({
            "state": "DONE",
            "errorResult": {"reason": "accessDenied", "message": "permission denied"}
        }),
    )
    .await;
    let dir = config_for(&server);

    tablectl(&dir)
        .args(["table", "copy", "sales.orders", "sales.orders_backup", "--wait"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Job job_bad failed"))
        .stderr(predicate::str::contains("permission denied"))
        .stderr(predicate::str::contains("tablectl job get job_bad"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_insert_rejected_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("/projects/{PROJECT}/jobs")))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": {"code": 401, "message": "Request had invalid authentication credentials.", "status": "UNAUTHENTICATED"}
        })))
        .mount(&server)
        .await;
    let dir = config_for(&server);

    tablectl(&dir)
        .args(["table", "copy", "sales.orders", "sales.orders_backup", "--wait"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Authentication failed"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_job_get_table_output() {
    let server = MockServer::start().await;
    mount_status(&server, "job_ok", json!({"state": "RUNNING"})).await;
    let dir = config_for(&server);

    tablectl(&dir)
        .args(["job", "get", "job_ok"])
        .assert()
        .success()
        .stdout(predicate::str::contains("job_ok"))
        .stdout(predicate::str::contains("RUNNING"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_copy_without_wait_reports_failed_insert() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("/projects/{PROJECT}/jobs")))
        .respond_with(ResponseTemplate::new(200).set_body_json(job_body(
            "job_done_bad",
            json!({
                "state": "DONE",
                "errorResult": {"reason": "notFound", "message": "Not found: Table test-project:sales.orders"}
            }),
        )))
        .expect(1)
        .mount(&server)
        .await;
    let dir = config_for(&server);

    tablectl(&dir)
        .args(["table", "copy", "sales.orders", "sales.orders_copy"])
        .assert()
        .failure()
        .code(1)
        .stdout(predicate::str::contains("submitted").not())
        .stderr(predicate::str::contains("Job job_done_bad failed"))
        .stderr(predicate::str::contains("notFound"));
}
