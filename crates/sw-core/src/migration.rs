//! Normalized migration model.
//!
//! A [`Migration`] is rebuilt from its source on every run and never mutated
//! afterwards. [`MigrationSet`] is the validated, totally ordered collection
//! the engine applies.

use crate::error::{CoreError, CoreResult};
use crate::identifier::string_identifier;
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::path::PathBuf;

/// Branch used when a source does not name one.
pub const DEFAULT_BRANCH: &str = "master";

/// Hint that runs a migration outside the shared transaction.
pub const NO_TRANSACTION_HINT: &str = "no-transaction";

/// Maximum number of SQL characters shown by `Display`.
const MAX_DISPLAY_SQL: usize = 80;

string_identifier! {
    /// Unique migration identity, `"{sequence_number}-{branch}"`.
    ///
    /// Used both as the ledger key and for duplicate detection.
    pub struct MigrationId;
}

impl MigrationId {
    /// Build the id for a sequence number on a branch.
    pub fn from_parts(sequence_number: u32, branch: &BranchName) -> Self {
        Self(format!("{sequence_number}-{branch}"))
    }
}

string_identifier! {
    /// Named line of development that lets migrations share a sequence number.
    pub struct BranchName;
}

impl BranchName {
    /// The default `master` branch.
    pub fn master() -> Self {
        Self(DEFAULT_BRANCH.to_string())
    }
}

impl Default for BranchName {
    fn default() -> Self {
        Self::master()
    }
}

/// Set of lowercase hint tokens attached to a migration.
///
/// Tokens are trimmed and lowercased on insert; empty tokens are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Hints(BTreeSet<String>);

impl Hints {
    /// Create an empty hint set
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a token, returning `true` if it was not present yet.
    pub fn insert(&mut self, hint: &str) -> bool {
        let normalized = hint.trim().to_lowercase();
        if normalized.is_empty() {
            return false;
        }
        self.0.insert(normalized)
    }

    /// Case-insensitive membership test
    pub fn contains(&self, hint: &str) -> bool {
        self.0.contains(&hint.trim().to_lowercase())
    }

    /// Whether the migration opts out of the shared transaction.
    pub fn is_no_transaction(&self) -> bool {
        self.0.contains(NO_TRANSACTION_HINT)
    }

    /// Iterate tokens in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'a> FromIterator<&'a str> for Hints {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        let mut hints = Hints::new();
        for hint in iter {
            hints.insert(hint);
        }
        hints
    }
}

impl fmt::Display for Hints {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined: Vec<&str> = self.iter().collect();
        f.write_str(&joined.join(", "))
    }
}

/// Where a migration came from. Only used in diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MigrationOrigin {
    /// A `.sql` file found by file-tree discovery
    File(PathBuf),
    /// A statically registered declaration
    Declared(String),
}

impl fmt::Display for MigrationOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MigrationOrigin::File(path) => write!(f, "{}", path.display()),
            MigrationOrigin::Declared(name) => write!(f, "declared migration {name}"),
        }
    }
}

/// One uniquely identified, ordered unit of schema change.
#[derive(Debug, Clone)]
pub struct Migration {
    id: MigrationId,
    sequence_number: u32,
    branch: BranchName,
    description: String,
    hints: Hints,
    sql: String,
    origin: MigrationOrigin,
}

impl Migration {
    /// Build a migration, rejecting an empty SQL body.
    pub fn new(
        sequence_number: u32,
        branch: BranchName,
        description: impl Into<String>,
        hints: Hints,
        sql: impl Into<String>,
        origin: MigrationOrigin,
    ) -> CoreResult<Self> {
        let sql = sql.into().trim().to_string();
        if sql.is_empty() {
            return Err(CoreError::EmptySql {
                source_name: origin.to_string(),
            });
        }
        Ok(Self {
            id: MigrationId::from_parts(sequence_number, &branch),
            sequence_number,
            branch,
            description: description.into(),
            hints,
            sql,
            origin,
        })
    }

    pub fn id(&self) -> &MigrationId {
        &self.id
    }

    pub fn sequence_number(&self) -> u32 {
        self.sequence_number
    }

    pub fn branch(&self) -> &BranchName {
        &self.branch
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn hints(&self) -> &Hints {
        &self.hints
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn origin(&self) -> &MigrationOrigin {
        &self.origin
    }

    /// Whether this migration must run outside the shared transaction
    pub fn is_no_transaction(&self) -> bool {
        self.hints.is_no_transaction()
    }

    /// Apply-order key: sequence number, then branch name.
    pub fn sort_key(&self) -> (u32, &str) {
        (self.sequence_number, self.branch.as_str())
    }
}

impl fmt::Display for Migration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.sql.chars().count() > MAX_DISPLAY_SQL {
            let head: String = self.sql.chars().take(MAX_DISPLAY_SQL).collect();
            write!(f, "{}: {}...", self.id, head)
        } else {
            write!(f, "{}: {}", self.id, self.sql)
        }
    }
}

/// Validated migrations in apply order.
///
/// Construction fails on a duplicate id; the remaining migrations are sorted
/// by [`Migration::sort_key`].
#[derive(Debug, Clone, Default)]
pub struct MigrationSet {
    migrations: Vec<Migration>,
}

impl MigrationSet {
    /// Validate and order an already realized list of migrations.
    pub fn new(mut migrations: Vec<Migration>) -> CoreResult<Self> {
        {
            let mut seen: HashMap<&str, &MigrationOrigin> =
                HashMap::with_capacity(migrations.len());
            for migration in &migrations {
                if let Some(first) = seen.insert(migration.id.as_str(), &migration.origin) {
                    return Err(CoreError::DuplicateId {
                        id: migration.id.to_string(),
                        first: first.to_string(),
                        second: migration.origin.to_string(),
                    });
                }
            }
        }

        migrations.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
        Ok(Self { migrations })
    }

    /// Drain a discovery sequence, stopping at the first error.
    pub fn collect<I>(sources: I) -> CoreResult<Self>
    where
        I: IntoIterator<Item = CoreResult<Migration>>,
    {
        let migrations = sources.into_iter().collect::<CoreResult<Vec<_>>>()?;
        Self::new(migrations)
    }

    pub fn len(&self) -> usize {
        self.migrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.migrations.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Migration> {
        self.migrations.iter()
    }

    /// Look a migration up by id
    pub fn get(&self, id: &str) -> Option<&Migration> {
        self.migrations.iter().find(|m| m.id == id)
    }

    pub fn as_slice(&self) -> &[Migration] {
        &self.migrations
    }

    pub fn into_vec(self) -> Vec<Migration> {
        self.migrations
    }
}

impl<'a> IntoIterator for &'a MigrationSet {
    type Item = &'a Migration;
    type IntoIter = std::slice::Iter<'a, Migration>;

    fn into_iter(self) -> Self::IntoIter {
        self.migrations.iter()
    }
}

#[cfg(test)]
#[path = "migration_test.rs"]
mod tests;
