//! # CLI Command Tests
//!
//! Runs the `medibot` binary against a mock server, inside a temporary working
//! directory so the session and log files never leak between tests.

use assert_cmd::prelude::*;
use httpmock::prelude::*;
use predicates::prelude::*;
use serde_json::json;
use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::{tempdir, TempDir};

fn medibot(dir: &Path, server: &str) -> Command {
    let mut cmd = Command::cargo_bin("medibot").unwrap();
    cmd.current_dir(dir)
        .env_remove("MEDIBOT_SESSION_FILE")
        .env_remove("MEDIBOT_CHAT_URL")
        .env("MEDIBOT_SERVER_URL", server)
        .arg("--no-open");
    cmd
}

fn fixture_pdf(dir: &TempDir) -> std::path::PathBuf {
    let path = dir.path().join("rx.pdf");
    fs::write(&path, b"%PDF-1.4\n% fake body\n%%EOF").unwrap();
    path
}

fn record_json(email: &str) -> serde_json::Value {
    json!({
        "id": "b7d0c1de-0000-4000-8000-000000000001",
        "userEmail": email,
        "filePath": "uploads/1700000000000-rx.pdf",
        "extractedText": "Amoxicillin 500mg",
        "createdAt": "2024-05-01T12:00:00.000Z"
    })
}

#[test]
fn test_login_then_logout() {
    let dir = tempdir().unwrap();

    medibot(dir.path(), "http://127.0.0.1:9")
        .args(["login", "--email", "pat@example.com"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Signed in as pat@example.com"));
    let stored = fs::read_to_string(dir.path().join(".medibot_session.json")).unwrap();
    assert!(stored.contains("pat@example.com"));

    medibot(dir.path(), "http://127.0.0.1:9")
        .arg("logout")
        .assert()
        .success()
        .stdout(predicate::str::contains("Signed out"));
    assert!(!dir.path().join(".medibot_session.json").exists());

    medibot(dir.path(), "http://127.0.0.1:9")
        .arg("logout")
        .assert()
        .success()
        .stdout(predicate::str::contains("No active session"));
}

#[test]
fn test_upload_success_sends_email_and_redirects() {
    let dir = tempdir().unwrap();
    let server = MockServer::start();
    let upload_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/medical/upload-prescription")
            .body_contains("pat@example.com")
            .body_contains("name=\"prescription\"")
            .body_contains("application/pdf");
        then.status(200).json_body(json!({
            "message": "Prescription uploaded successfully!",
            "data": record_json("pat@example.com")
        }));
    });
    let pdf = fixture_pdf(&dir);

    medibot(dir.path(), &server.base_url())
        .args(["login", "--email", "pat@example.com"])
        .assert()
        .success();

    medibot(dir.path(), &server.base_url())
        .arg("upload")
        .arg(&pdf)
        .assert()
        .success()
        .stdout(predicate::str::contains("Prescription uploaded successfully!"))
        .stdout(predicate::str::contains("Redirecting to chat..."))
        .stdout(predicate::str::contains("http://localhost:3000/chat"));

    upload_mock.assert();
}

#[test]
fn test_upload_rejects_non_pdf_without_calling_server() {
    let dir = tempdir().unwrap();
    let server = MockServer::start();
    let upload_mock = server.mock(|when, then| {
        when.method(POST).path("/medical/upload-prescription");
        then.status(200);
    });
    let image = dir.path().join("photo.png");
    fs::write(&image, [0x89, b'P', b'N', b'G']).unwrap();

    medibot(dir.path(), &server.base_url())
        .arg("upload")
        .arg(&image)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Please select a PDF file"));

    upload_mock.assert_hits(0);
}

#[test]
fn test_upload_shows_server_error_message() {
    let dir = tempdir().unwrap();
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/medical/upload-prescription");
        then.status(400)
            .json_body(json!({ "error": "Only PDF files are accepted" }));
    });
    let pdf = fixture_pdf(&dir);

    medibot(dir.path(), &server.base_url())
        .arg("upload")
        .arg(&pdf)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Only PDF files are accepted"));
}

#[test]
fn test_upload_without_error_body_uses_generic_message() {
    let dir = tempdir().unwrap();
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/medical/upload-prescription");
        then.status(500).body("boom");
    });
    let pdf = fixture_pdf(&dir);

    medibot(dir.path(), &server.base_url())
        .arg("upload")
        .arg(&pdf)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to upload prescription"));
}

#[test]
fn test_upload_unreachable_server() {
    let dir = tempdir().unwrap();
    let pdf = fixture_pdf(&dir);

    medibot(dir.path(), "http://127.0.0.1:9")
        .arg("upload")
        .arg(&pdf)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Server error. Please try again later."));
}

#[test]
fn test_skip_goes_straight_to_chat() {
    let dir = tempdir().unwrap();

    medibot(dir.path(), "http://127.0.0.1:9")
        .args(["--chat-url", "http://chat.local/start", "skip"])
        .assert()
        .success()
        .stdout(predicate::str::contains("http://chat.local/start"));
}

#[test]
fn test_summarize_prints_summary() {
    let dir = tempdir().unwrap();
    let server = MockServer::start();
    let summary_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/medical/summarize")
            .json_body_partial(r#"{"userEmail": "pat@example.com"}"#);
        then.status(200)
            .json_body(json!({ "summary": "Patient reports a mild headache." }));
    });
    let transcript = dir.path().join("chat.txt");
    fs::write(&transcript, "user: I have a headache\nbot: Since when?").unwrap();

    medibot(dir.path(), &server.base_url())
        .arg("summarize")
        .arg("--file")
        .arg(&transcript)
        .args(["--email", "pat@example.com"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Patient reports a mild headache."));

    summary_mock.assert();
}

#[test]
fn test_prescriptions_lists_records() {
    let dir = tempdir().unwrap();
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET)
            .path("/medical/prescriptions")
            .query_param("userEmail", "pat@example.com");
        then.status(200)
            .json_body(json!([record_json("pat@example.com")]));
    });

    medibot(dir.path(), &server.base_url())
        .args(["prescriptions", "--email", "pat@example.com"])
        .assert()
        .success()
        .stdout(predicate::str::contains("uploads/1700000000000-rx.pdf"));
}

#[test]
fn test_prescriptions_requires_sign_in() {
    let dir = tempdir().unwrap();

    medibot(dir.path(), "http://127.0.0.1:9")
        .arg("prescriptions")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Not signed in"));
}
