//! Run results.

use std::time::Duration;
use sw_core::MigrationId;

/// Outcome of a successful [`Migrator::migrate`](crate::Migrator::migrate) run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationReport {
    /// Ids applied by this run, in apply order
    pub applied: Vec<MigrationId>,
    /// Discovered migrations already present in the ledger
    pub already_applied: usize,
    /// Wall-clock time of the run
    pub duration: Duration,
}

impl MigrationReport {
    /// True when the run found nothing to apply
    pub fn is_up_to_date(&self) -> bool {
        self.applied.is_empty()
    }

    /// Total number of discovered migrations
    pub fn total(&self) -> usize {
        self.applied.len() + self.already_applied
    }
}

/// Ledger state of one discovered migration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationStatus {
    pub id: MigrationId,
    pub description: String,
    /// Where the migration came from (file path or declaration)
    pub origin: String,
    pub applied: bool,
    pub no_transaction: bool,
}
