//! Ledger rows.

use chrono::{DateTime, Utc};
use sw_core::{Actor, Migration};

/// Column names of the ledger table, in insert order.
pub const LEDGER_COLUMNS: &[&str] = &[
    "Id",
    "Sql",
    "Description",
    "Time",
    "UserName",
    "UserDomainName",
    "MachineName",
];

/// One applied migration as persisted in the ledger. Write-once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerEntry {
    /// Migration id (`"{sequence}-{branch}"`)
    pub id: String,
    /// SQL that was executed, kept for auditing
    pub sql: String,
    pub description: String,
    /// When the migration was applied
    pub time: DateTime<Utc>,
    pub actor: Actor,
}

impl LedgerEntry {
    /// Build the ledger row for `migration` applied by `actor` at `time`
    pub fn for_migration(migration: &Migration, actor: &Actor, time: DateTime<Utc>) -> Self {
        Self {
            id: migration.id().to_string(),
            sql: migration.sql().to_string(),
            description: migration.description().to_string(),
            time,
            actor: actor.clone(),
        }
    }
}
