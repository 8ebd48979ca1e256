use super::*;
use crate::cli::MigrateArgs;
use crate::commands::migrate;
use std::fs;
use tempfile::tempdir;

fn global(project_dir: &std::path::Path) -> GlobalArgs {
    GlobalArgs {
        verbose: false,
        project_dir: project_dir.to_path_buf(),
        config: None,
        database: None,
    }
}

#[test]
fn test_status_after_partial_apply() {
    let dir = tempdir().unwrap();
    let migrations = dir.path().join("migrations");
    fs::create_dir_all(&migrations).unwrap();
    fs::write(migrations.join("0001.sql"), "CREATE TABLE a (id INTEGER);").unwrap();
    migrate::run(&MigrateArgs { timeout: None }, &global(dir.path())).unwrap();
    fs::write(
        migrations.join("0002.sql"),
        "-- Second\n-- hints: no-transaction\nCREATE TABLE b (id INTEGER);",
    )
    .unwrap();

    let all = StatusArgs {
        output: OutputFormat::Json,
        pending: false,
    };
    let rows = collect(&all, &global(dir.path())).unwrap();

    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].id, "1-master");
    assert_eq!(rows[0].state, MigrationState::Applied);
    assert_eq!(rows[1].state, MigrationState::Pending);
    assert!(rows[1].no_transaction);
    assert_eq!(rows[1].description, "Second");

    let pending_only = StatusArgs {
        output: OutputFormat::Table,
        pending: true,
    };
    let rows = collect(&pending_only, &global(dir.path())).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].id, "2-master");
}

#[test]
fn test_status_row_serializes_lowercase_state() {
    let row = StatusRow {
        id: "1-master".to_string(),
        state: MigrationState::Pending,
        no_transaction: false,
        description: String::new(),
        origin: "migrations/0001.sql".to_string(),
    };

    let json = serde_json::to_value(&row).unwrap();
    assert_eq!(json["state"], "pending");
    assert_eq!(json["id"], "1-master");
}
