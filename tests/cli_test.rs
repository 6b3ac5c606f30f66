use assert_cmd::cargo_bin;
use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::path::Path;
use std::process::Command;
use tempfile::tempdir;

/// A command isolated from the caller's environment and `.env` file.
fn tutorbook(dir: &Path) -> Command {
    let mut cmd = Command::new(cargo_bin!("tutorbook"));
    cmd.current_dir(dir)
        .env_remove("TUTORBOOK_API_BASE")
        .env_remove("TUTORBOOK_CREDENTIALS")
        .env_remove("TUTORBOOK_RETURN_URL")
        .env_remove("TUTORBOOK_PASSWORD")
        .env_remove("RUST_LOG")
        .args(["--api-base", "http://127.0.0.1:9/api", "--timeout-secs", "2"]);
    cmd
}

fn write_credentials(dir: &Path) {
    let session = serde_json::json!({
        "token": "jwt-1",
        "user": {"id": 5, "name": "Sam", "email": "sam@example.com", "role": "student"}
    });
    std::fs::create_dir_all(dir.join(".tutorbook")).unwrap();
    std::fs::write(
        dir.join(".tutorbook/credentials.json"),
        serde_json::to_vec(&session).unwrap(),
    )
    .unwrap();
}

#[test]
fn test_help_lists_commands() {
    let dir = tempdir().unwrap();
    tutorbook(dir.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("login"))
        .stdout(predicate::str::contains("tutors"))
        .stdout(predicate::str::contains("book"));
}

#[test]
fn test_invalid_duration_is_rejected_before_any_request() {
    let dir = tempdir().unwrap();
    tutorbook(dir.path())
        .args([
            "book",
            "1",
            "--subject",
            "Math",
            "--date",
            "2030-01-01",
            "--time",
            "14:00",
            "--duration",
            "45",
            "--payment-method",
            "pm_card_visa",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "duration must be 30, 60, 90 or 120 minutes, got 45",
        ))
        .stderr(predicate::str::contains("Network error").not());
}

#[test]
fn test_bad_time_is_a_usage_error() {
    let dir = tempdir().unwrap();
    tutorbook(dir.path())
        .args([
            "book",
            "1",
            "--subject",
            "Math",
            "--date",
            "2030-01-01",
            "--time",
            "2pm",
            "--payment-method",
            "pm_card_visa",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("expected HH:MM"));
}

#[test]
fn test_whoami_reads_saved_login() {
    let dir = tempdir().unwrap();
    tutorbook(dir.path())
        .arg("whoami")
        .assert()
        .success()
        .stdout(predicate::str::contains("Not logged in"));

    write_credentials(dir.path());
    tutorbook(dir.path())
        .arg("whoami")
        .assert()
        .success()
        .stdout(predicate::str::contains("Sam (Student) <sam@example.com>"));
}

#[test]
fn test_directory_requires_login() {
    let dir = tempdir().unwrap();
    tutorbook(dir.path())
        .arg("tutors")
        .assert()
        .failure()
        .stderr(predicate::str::contains("You are not logged in"));
}

#[test]
fn test_unreachable_server_is_reported() {
    let dir = tempdir().unwrap();
    write_credentials(dir.path());
    tutorbook(dir.path())
        .arg("tutors")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Network error occurred"));
}

#[test]
fn test_logout_removes_saved_login() {
    let dir = tempdir().unwrap();
    write_credentials(dir.path());
    tutorbook(dir.path())
        .arg("logout")
        .assert()
        .success()
        .stdout(predicate::str::contains("Logged out successfully"));
    assert!(!dir.path().join(".tutorbook/credentials.json").exists());
}

#[cfg(not(feature = "storage-rocksdb"))]
#[test]
fn test_db_path_without_feature_falls_back() {
    let dir = tempdir().unwrap();
    tutorbook(dir.path())
        .args(["--db-path", "creds.db", "whoami"])
        .assert()
        .success()
        .stderr(predicate::str::contains(
            "'storage-rocksdb' feature is not enabled",
        ))
        .stdout(predicate::str::contains("Not logged in"));
}
