use super::*;
use std::fs;
use tempfile::tempdir;

#[test]
fn test_parse_empty_config_uses_defaults() {
    let config = Config::from_yaml("{}").unwrap();
    assert_eq!(config.migrations_dir, "migrations");
    assert_eq!(config.ledger_table.as_str(), "__stepwise_ledger");
    assert_eq!(config.command_timeout(), Duration::from_secs(600));
    assert_eq!(config.batch_separator, "go");
    assert_eq!(config.comment_marker, "--");
    assert_eq!(config.database.db_type, DbType::DuckDb);
    assert_eq!(config.database.path, "stepwise.duckdb");
}

#[test]
fn test_parse_full_config() {
    let yaml = r##"
migrations_dir: db/changes
ledger_table: SchemaLedger
command_timeout_secs: 30
batch_separator: GO
comment_marker: "#"
database:
  type: duckdb
  path: ":memory:"
"##;
    let config = Config::from_yaml(yaml).unwrap();
    assert_eq!(config.migrations_dir, "db/changes");
    assert_eq!(config.ledger_table.as_str(), "SchemaLedger");
    assert_eq!(config.command_timeout_secs, 30);
    assert_eq!(config.batch_separator, "GO");
    assert_eq!(config.comment_marker, "#");
    assert_eq!(config.database.path, ":memory:");
}

#[test]
fn test_unknown_field_rejected() {
    let err = Config::from_yaml("migration_dir: typo").unwrap_err();
    assert!(matches!(err, CoreError::YamlParse(_)));
}

#[test]
fn test_invalid_ledger_table_rejected() {
    assert!(Config::from_yaml("ledger_table: \"drop table; --\"").is_err());
}

#[test]
fn test_zero_timeout_rejected() {
    let err = Config::from_yaml("command_timeout_secs: 0").unwrap_err();
    assert!(matches!(err, CoreError::ConfigInvalid { .. }));
}

#[test]
fn test_separator_with_whitespace_rejected() {
    let err = Config::from_yaml("batch_separator: \"go on\"").unwrap_err();
    assert!(matches!(err, CoreError::ConfigInvalid { .. }));
}

#[test]
fn test_load_from_dir_prefers_yml() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("stepwise.yml"), "migrations_dir: a").unwrap();
    fs::write(dir.path().join("stepwise.yaml"), "migrations_dir: b").unwrap();

    let config = Config::load_from_dir(dir.path()).unwrap();
    assert_eq!(config.migrations_dir, "a");
}

#[test]
fn test_load_from_dir_accepts_yaml_extension() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("stepwise.yaml"), "migrations_dir: b").unwrap();

    let config = Config::load_from_dir(dir.path()).unwrap();
    assert_eq!(config.migrations_dir, "b");
}

#[test]
fn test_load_from_dir_missing() {
    let dir = tempdir().unwrap();
    let err = Config::load_from_dir(dir.path()).unwrap_err();
    assert!(matches!(err, CoreError::ConfigNotFound { .. }));
}

#[test]
fn test_paths_resolved_against_root() {
    let config = Config::from_yaml("database:\n  path: data/app.duckdb").unwrap();
    let root = std::path::PathBuf::from("/srv/app");
    assert_eq!(config.migrations_dir_absolute(&root), root.join("migrations"));
    assert_eq!(
        config.database_path_absolute(&root),
        root.join("data/app.duckdb").display().to_string()
    );

    let memory = Config::from_yaml("database:\n  path: \":memory:\"").unwrap();
    assert_eq!(memory.database_path_absolute(&root), ":memory:");
}
