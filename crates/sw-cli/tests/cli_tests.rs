//! Runs the `sw` binary against a project in a temporary directory.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

fn sw(project: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_sw"))
        .arg("--project-dir")
        .arg(project)
        .args(args)
        .env_remove("STEPWISE_DATABASE")
        .output()
        .expect("failed to run sw")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn project() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("stepwise.yml"),
        "migrations_dir: sql\ndatabase:\n  type: duckdb\n  path: app.duckdb\n",
    )
    .unwrap();
    fs::create_dir_all(dir.path().join("sql")).unwrap();
    fs::write(
        dir.path().join("sql/0001-users.sql"),
        "-- Users\nCREATE TABLE users (id INTEGER);",
    )
    .unwrap();
    dir
}

#[test]
fn test_migrate_then_status() {
    let dir = project();

    let migrate = sw(dir.path(), &["migrate"]);
    assert!(migrate.status.success(), "{:?}", migrate);
    assert!(stdout(&migrate).contains("Applied: 1-master"));

    let status = sw(dir.path(), &["status", "--output", "json"]);
    assert!(status.status.success());
    let rows: serde_json::Value = serde_json::from_slice(&status.stdout).unwrap();
    assert_eq!(rows[0]["id"], "1-master");
    assert_eq!(rows[0]["state"], "applied");

    let again = sw(dir.path(), &["migrate"]);
    assert!(again.status.success());
    assert!(stdout(&again).contains("up to date"));
}

#[test]
fn test_list_json_without_database() {
    let dir = project();

    let output = sw(dir.path(), &["list", "-o", "json"]);

    assert!(output.status.success());
    let rows: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(rows[0]["id"], "1-master");
    assert_eq!(rows[0]["batches"], 1);
    assert!(!dir.path().join("app.duckdb").exists());
}

#[test]
fn test_failing_migration_exits_non_zero() {
    let dir = project();
    fs::write(dir.path().join("sql/0002.sql"), "SELEC broken;").unwrap();

    let output = sw(dir.path(), &["migrate"]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("2-master"), "{stderr}");
}

#[test]
fn test_new_creates_file() {
    let dir = project();

    let output = sw(dir.path(), &["new", "add posts"]);

    assert!(output.status.success());
    assert!(dir.path().join("sql/0002-add-posts.sql").exists());
}
