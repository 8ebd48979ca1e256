use super::*;
use sw_core::{MigrationSet, MigrationSource};
use tempfile::tempdir;

fn global(project_dir: &Path) -> GlobalArgs {
    GlobalArgs {
        verbose: false,
        project_dir: project_dir.to_path_buf(),
        config: None,
        database: None,
    }
}

fn new_args(name: &str, branch: Option<&str>) -> NewArgs {
    NewArgs {
        name: name.to_string(),
        branch: branch.map(String::from),
    }
}

#[test]
fn test_first_migration_is_discoverable() {
    let dir = tempdir().unwrap();

    let path = create(&new_args("Add users table", None), &global(dir.path())).unwrap();

    assert_eq!(
        path,
        dir.path().join("migrations").join("0001-add-users-table.sql")
    );
    let source = sw_core::FileTreeSource::new(dir.path().join("migrations"));
    let set = MigrationSet::collect(source.migrations()).unwrap();
    let migration = set.get("1-master").unwrap();
    assert_eq!(migration.description(), "Add users table");
    assert!(migration.hints().is_empty());
}

#[test]
fn test_number_follows_highest_in_tree() {
    let dir = tempdir().unwrap();
    let migrations = dir.path().join("migrations");
    fs::create_dir_all(migrations.join("billing")).unwrap();
    fs::write(migrations.join("0003.sql"), "select 1").unwrap();
    fs::write(migrations.join("billing/0007_invoices.sql"), "select 1").unwrap();
    fs::write(migrations.join("notes.sql"), "ignored").unwrap();

    let path = create(&new_args("next", None), &global(dir.path())).unwrap();

    assert_eq!(path, migrations.join("0008-next.sql"));
}

#[test]
fn test_branch_subdirectory() {
    let dir = tempdir().unwrap();

    let path = create(
        &new_args("orders", Some("featureA")),
        &global(dir.path()),
    )
    .unwrap();
    assert_eq!(
        path,
        dir.path().join("migrations/featureA/0001-orders.sql")
    );

    let master = create(&new_args("x", Some("master")), &global(dir.path())).unwrap();
    assert_eq!(master, dir.path().join("migrations/0002-x.sql"));
}

#[test]
fn test_rejects_bad_names() {
    let dir = tempdir().unwrap();

    assert!(create(&new_args("  !!  ", None), &global(dir.path())).is_err());
    assert!(create(&new_args("ok", Some("../escape")), &global(dir.path())).is_err());
    assert!(create(&new_args("ok", Some("")), &global(dir.path())).is_err());
}

#[test]
fn test_slugify() {
    assert_eq!(slugify("Add Users"), "add-users");
    assert_eq!(slugify("  rename   col__x! "), "rename-col-x");
    assert_eq!(slugify("v2.1 fix"), "v2-1-fix");
    assert_eq!(slugify("***"), "");
}

#[test]
fn test_untouched_template_is_not_applied() {
    let dir = tempdir().unwrap();
    let path = create(&new_args("Add index", None), &global(dir.path())).unwrap();
    let source = sw_core::FileTreeSource::new(dir.path().join("migrations"));

    let err = sw_engine::load_migrations(&source, "go").unwrap_err();
    assert!(matches!(err, sw_engine::EngineError::EmptyMigration { .. }));

    let edited = format!("{}CREATE INDEX idx ON t (id);\n", fs::read_to_string(&path).unwrap());
    fs::write(&path, edited).unwrap();
    let set = sw_engine::load_migrations(&source, "go").unwrap();
    assert_eq!(set.len(), 1);
}
