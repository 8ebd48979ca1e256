//! Statement splitter for migration bodies.

/// Conventional batch separator (`GO` in SQL Server tooling).
pub const DEFAULT_BATCH_SEPARATOR: &str = "go";

/// Split `sql` into batches on lines equal to `separator`.
///
/// A line matches when its trimmed content equals the separator ignoring
/// ASCII case. Separator lines are never part of a batch and whitespace-only
/// batches are dropped, so the result is empty only when the body holds
/// nothing but separators.
pub fn split_batches<'a>(sql: &'a str, separator: &str) -> Vec<&'a str> {
    let mut batches = Vec::new();
    let mut batch_start = 0;
    let mut offset = 0;

    for raw in sql.split_inclusive('\n') {
        if raw.trim().eq_ignore_ascii_case(separator) {
            push_batch(&mut batches, &sql[batch_start..offset]);
            batch_start = offset + raw.len();
        }
        offset += raw.len();
    }
    push_batch(&mut batches, &sql[batch_start..]);

    batches
}

fn push_batch<'a>(batches: &mut Vec<&'a str>, text: &'a str) {
    let trimmed = text.trim();
    if !trimmed.is_empty() {
        batches.push(trimmed);
    }
}

#[cfg(test)]
#[path = "splitter_test.rs"]
mod tests;
