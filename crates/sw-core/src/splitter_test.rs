use super::*;

#[test]
fn test_two_batches() {
    let batches = split_batches(
        "create table T (id int)\ngo\nalter table T add c int",
        DEFAULT_BATCH_SEPARATOR,
    );
    assert_eq!(
        batches,
        vec!["create table T (id int)", "alter table T add c int"]
    );
}

#[test]
fn test_no_separator_is_single_batch() {
    let sql = "create table a (id int);\ncreate table b (id int);";
    assert_eq!(split_batches(sql, DEFAULT_BATCH_SEPARATOR), vec![sql]);
}

#[test]
fn test_separator_is_case_insensitive_and_trimmed() {
    let batches = split_batches("select 1\n  GO  \nselect 2\r\nGo\r\nselect 3", "go");
    assert_eq!(batches, vec!["select 1", "select 2", "select 3"]);
}

#[test]
fn test_separator_inside_line_does_not_split() {
    let sql = "insert into t values ('go')\n-- go on\nselect 'go'";
    assert_eq!(split_batches(sql, "go"), vec![sql]);
}

#[test]
fn test_empty_batches_dropped() {
    let batches = split_batches("go\nselect 1\ngo\n\ngo\nselect 2\ngo\n", "go");
    assert_eq!(batches, vec!["select 1", "select 2"]);
}

#[test]
fn test_only_separators_yields_nothing() {
    assert!(split_batches("go\nGO\n", "go").is_empty());
}

#[test]
fn test_custom_separator() {
    let batches = split_batches("select 1\n/\nselect 2", "/");
    assert_eq!(batches, vec!["select 1", "select 2"]);
}
