//! CLI smoke tests against a mock media server.

use std::io::Write;

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Clears ambient ROADIE_* variables so host configuration cannot
/// leak into the test.
fn rdcli() -> Command {
    let mut cmd = Command::cargo_bin("rdcli").unwrap();
    for name in [
        "ROADIE_SERVER_URL",
        "ROADIE_LOGIN_PROVIDED",
        "ROADIE_LOGIN_NAME",
        "ROADIE_LOGIN_PASSWORD",
        "ROADIE_WORKFLOW_ID",
        "ROADIE_SERIES_ID",
    ] {
        cmd.env_remove(name);
    }
    cmd
}

#[test]
fn prints_help() {
    rdcli()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("status"))
        .stdout(predicate::str::contains("upload"));
}

#[test]
fn status_without_server_is_unconfigured_and_fails() {
    let config = tempfile::NamedTempFile::new().unwrap();

    rdcli()
        .arg("--config")
        .arg(config.path())
        .arg("status")
        .assert()
        .failure()
        .stdout(predicate::str::contains("unconfigured"));
}

#[tokio::test(flavor = "multi_thread")]
async fn status_reports_logged_in() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/info/me.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "user": {"username": "jane"},
            "userRole": "ROLE_USER_JANE",
        })))
        .mount(&server)
        .await;

    let uri = server.uri();
    tokio::task::spawn_blocking(move || {
        rdcli()
            .env("ROADIE_SERVER_URL", &uri)
            .env("ROADIE_LOGIN_NAME", "jane")
            .env("ROADIE_LOGIN_PASSWORD", "secret")
            .arg("status")
            .assert()
            .success()
            .stdout(predicate::str::contains("logged_in"))
            .stdout(predicate::str::contains("jane"));
    })
    .await
    .unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn uploads_a_recording_end_to_end() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/info/me.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "user": {"username": "jane"},
            "userRole": "ROLE_USER_JANE",
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/ingest/createMediaPackage"))
        .respond_with(ResponseTemplate::new(200).set_body_string("mp-1"))
        .expect(1)
        .mount(&server)
        .await;
    for endpoint in ["/ingest/addDCCatalog", "/ingest/addAttachment", "/ingest/addTrack"] {
        Mock::given(method("POST"))
            .and(path(endpoint))
            .respond_with(ResponseTemplate::new(200).set_body_string("mp-next"))
            .expect(1)
            .mount(&server)
            .await;
    }
    Mock::given(method("POST"))
        .and(path("/ingest/ingest"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let mut media = tempfile::Builder::new().suffix(".webm").tempfile().unwrap();
    media.write_all(b"fake media bytes").unwrap();

    let uri = server.uri();
    let media_path = media.path().to_path_buf();
    tokio::task::spawn_blocking(move || {
        rdcli()
            .env("ROADIE_SERVER_URL", &uri)
            .env("ROADIE_LOGIN_NAME", "jane")
            .env("ROADIE_LOGIN_PASSWORD", "secret")
            .arg("upload")
            .arg("--title")
            .arg("Tuesday lecture")
            .arg("--creator")
            .arg("Jane")
            .arg("--display")
            .arg(&media_path)
            .assert()
            .success()
            .stdout(predicate::str::contains("upload complete"));
    })
    .await
    .unwrap();
}

#[test]
fn upload_without_recordings_fails_fast() {
    let config = tempfile::NamedTempFile::new().unwrap();

    rdcli()
        .arg("--config")
        .arg(config.path())
        .arg("upload")
        .arg("--title")
        .arg("t")
        .arg("--creator")
        .arg("c")
        .assert()
        .failure()
        .stderr(predicate::str::contains("no recordings"));
}
