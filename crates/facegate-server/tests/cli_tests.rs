//! Tests for the `facegate` binary's startup behavior

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn facegate() -> Command {
    let mut cmd = Command::cargo_bin("facegate").unwrap();
    cmd.env_remove("FACEGATE_PORT")
        .env_remove("FACEGATE_DATABASE")
        .env("LOG_OUTPUT", "console");
    cmd
}

#[test]
fn test_missing_arguments_is_usage_error() {
    facegate()
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn test_non_numeric_port_is_usage_error() {
    let dir = TempDir::new().unwrap();
    facegate()
        .arg("eighty")
        .arg(dir.path().join("access.db"))
        .assert()
        .failure()
        .code(2);
}

#[test]
fn test_unopenable_database_is_fatal() {
    let dir = TempDir::new().unwrap();

    // A directory cannot be opened as a database file
    facegate()
        .arg("--host")
        .arg("127.0.0.1")
        .arg("1")
        .arg(dir.path())
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Cannot open audit store"));
}

#[test]
fn test_invalid_settings_are_reported() {
    let dir = TempDir::new().unwrap();

    facegate()
        .env("LOG_LEVEL", "loud")
        .env("FACEGATE_MAX_CONNECTIONS", "plenty")
        .arg("--host")
        .arg("127.0.0.1")
        .arg("1")
        .arg(dir.path())
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Warning: ignoring LOG_* settings"))
        .stdout(predicate::str::contains("FACEGATE_MAX_CONNECTIONS"));
}

#[test]
fn test_zero_port_is_fatal() {
    let dir = TempDir::new().unwrap();

    facegate()
        .arg("0")
        .arg(dir.path().join("access.db"))
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("port must be greater than 0"));
}

#[test]
fn test_port_in_use_is_fatal() {
    let dir = TempDir::new().unwrap();
    let taken = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = taken.local_addr().unwrap().port();

    facegate()
        .arg("--host")
        .arg("127.0.0.1")
        .arg(port.to_string())
        .arg(dir.path().join("access.db"))
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Failed to bind"));
}

#[test]
fn test_help_lists_arguments() {
    facegate()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("<PORT>"))
        .stdout(predicate::str::contains("<DATABASE>"))
        .stdout(predicate::str::contains("--recognizer"));
}
