//! End-to-end runs: migration files on disk applied to DuckDB.

use std::fs;
use std::path::Path;
use sw_core::{DeclaredMigration, DeclaredMigrations, FileTreeSource, LedgerTable};
use sw_db::{Backend, DuckDbBackend, SessionMode};
use sw_engine::{EngineError, Migrator, MigratorOptions};
use tempfile::TempDir;

fn write(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

fn ledger_ids(db: &DuckDbBackend) -> Vec<String> {
    let mut stmt = db
        .connection()
        .prepare(r#"SELECT "Id" FROM __stepwise_ledger ORDER BY "Time", "Id""#)
        .unwrap();
    let ids = stmt
        .query_map([], |row| row.get::<_, String>(0))
        .unwrap()
        .collect::<Result<Vec<_>, _>>()
        .unwrap();
    ids
}

fn has_table(db: &DuckDbBackend, name: &str) -> bool {
    let mut session = db.open_session(SessionMode::AutoCommit).unwrap();
    session.table_names().unwrap().contains(name)
}

fn project() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "0001-create-users.sql",
        "-- Creates the users table\n\
         -- hints: some-hint\n\
         CREATE TABLE users (id INTEGER, name VARCHAR);\n\
         go\n\
         INSERT INTO users VALUES (1, 'root');",
    );
    write(
        dir.path(),
        "0002.sql",
        "ALTER TABLE users ADD COLUMN email VARCHAR;",
    );
    write(
        dir.path(),
        "featureA/0002-orders.sql",
        "-- Orders for feature A\nCREATE TABLE orders (id INTEGER, user_id INTEGER);",
    );
    dir
}

#[test]
fn test_file_tree_applied_to_duckdb() {
    let dir = project();
    let db = DuckDbBackend::in_memory().unwrap();
    let migrator = Migrator::new(&db, MigratorOptions::default());

    let report = migrator.migrate(&FileTreeSource::new(dir.path())).unwrap();

    let applied: Vec<&str> = report.applied.iter().map(|id| id.as_str()).collect();
    assert_eq!(applied, vec!["1-master", "2-featureA", "2-master"]);
    assert!(has_table(&db, "users"));
    assert!(has_table(&db, "orders"));

    let mut ids = ledger_ids(&db);
    ids.sort();
    assert_eq!(ids, vec!["1-master", "2-featureA", "2-master"]);

    let description: String = db
        .connection()
        .query_row(
            r#"SELECT "Description" FROM __stepwise_ledger WHERE "Id" = '1-master'"#,
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(description, "Creates the users table");
}

#[test]
fn test_second_run_applies_nothing() {
    let dir = project();
    let db = DuckDbBackend::in_memory().unwrap();
    let migrator = Migrator::new(&db, MigratorOptions::default());
    let source = FileTreeSource::new(dir.path());

    migrator.migrate(&source).unwrap();
    let report = migrator.migrate(&source).unwrap();

    assert!(report.is_up_to_date());
    assert_eq!(report.already_applied, 3);
    assert_eq!(ledger_ids(&db).len(), 3);
}

#[test]
fn test_failed_run_leaves_database_untouched() {
    let dir = project();
    write(dir.path(), "0003.sql", "ALTER TABLE missing ADD COLUMN x INT;");
    let db = DuckDbBackend::in_memory().unwrap();

    let err = Migrator::new(&db, MigratorOptions::default())
        .migrate(&FileTreeSource::new(dir.path()))
        .unwrap_err();

    match &err {
        EngineError::Apply { id, batch, .. } => {
            assert_eq!(id, "3-master");
            assert!(batch.contains("ALTER TABLE missing"));
        }
        other => panic!("expected Apply, got {other:?}"),
    }
    assert!(!has_table(&db, "users"));
    assert!(!has_table(&db, "orders"));
    assert!(ledger_ids(&db).is_empty());
}

#[test]
fn test_no_transaction_migration_kept_after_failure() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "0001.sql",
        "-- hints: no-transaction\nCREATE TABLE audit (id INTEGER);",
    );
    write(dir.path(), "0002.sql", "SELEC broken;");
    let db = DuckDbBackend::in_memory().unwrap();

    let err = Migrator::new(&db, MigratorOptions::default())
        .migrate(&FileTreeSource::new(dir.path()))
        .unwrap_err();

    assert_eq!(err.migration_id().unwrap(), "2-master");
    assert!(has_table(&db, "audit"));
    assert_eq!(ledger_ids(&db), vec!["1-master"]);
}

#[test]
fn test_transactional_migration_builds_on_no_transaction_migration() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "0001.sql",
        "-- hints: no-transaction\nCREATE TABLE x (id INTEGER);",
    );
    write(dir.path(), "0002.sql", "ALTER TABLE x ADD COLUMN c INTEGER;");
    let db = DuckDbBackend::in_memory().unwrap();

    let report = Migrator::new(&db, MigratorOptions::default())
        .migrate(&FileTreeSource::new(dir.path()))
        .unwrap();

    let applied: Vec<&str> = report.applied.iter().map(|id| id.as_str()).collect();
    assert_eq!(applied, vec!["1-master", "2-master"]);
    let columns: i64 = db
        .connection()
        .query_row(
            "SELECT count(*) FROM information_schema.columns WHERE table_name = 'x'",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(columns, 2);
    assert_eq!(ledger_ids(&db).len(), 2);
}

#[test]
fn test_status_reports_pending_after_partial_run() {
    let dir = project();
    let db = DuckDbBackend::in_memory().unwrap();
    let migrator = Migrator::new(&db, MigratorOptions::default());

    let before = migrator.status(&FileTreeSource::new(dir.path())).unwrap();
    assert!(before.iter().all(|s| !s.applied));

    migrator.migrate(&FileTreeSource::new(dir.path())).unwrap();
    write(dir.path(), "0004.sql", "CREATE TABLE later (id INTEGER);");

    let after = migrator.status(&FileTreeSource::new(dir.path())).unwrap();
    let pending: Vec<&str> = after
        .iter()
        .filter(|s| !s.applied)
        .map(|s| s.id.as_str())
        .collect();
    assert_eq!(pending, vec!["4-master"]);
}

static DECLARED: &[DeclaredMigration] = &[
    DeclaredMigration {
        sequence_number: 2,
        branch: None,
        description: "Add index",
        hints: &[],
        sql: "CREATE INDEX idx_items_id ON items (id);",
    },
    DeclaredMigration {
        sequence_number: 1,
        branch: None,
        description: "Create items",
        hints: &["Seed-Data"],
        sql: "CREATE TABLE items (id INTEGER);",
    },
];

#[test]
fn test_declared_migrations_into_file_database() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("app.duckdb");
    let table = LedgerTable::new("app_migrations").unwrap();
    let options = MigratorOptions {
        ledger_table: table.clone(),
        ..MigratorOptions::default()
    };

    {
        let db = DuckDbBackend::from_path(&path).unwrap();
        let report = Migrator::new(&db, options.clone())
            .migrate(&DeclaredMigrations::new(DECLARED))
            .unwrap();
        assert_eq!(report.applied.len(), 2);
    }

    let db = DuckDbBackend::from_path(&path).unwrap();
    assert!(has_table(&db, "items"));
    let report = Migrator::new(&db, options)
        .migrate(&DeclaredMigrations::new(DECLARED))
        .unwrap();
    assert!(report.is_up_to_date());
}
