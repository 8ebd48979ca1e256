//! Backend capability traits
//!
//! The engine only ever talks to a database through [`Backend`] and
//! [`Session`]; any driver implementing both is usable without engine
//! changes.

use crate::error::DbResult;
use crate::ledger::LedgerEntry;
use std::collections::HashSet;
use std::time::Duration;
use sw_core::LedgerTable;

/// How a session relates to transactions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionMode {
    /// One serializable transaction, committed only by [`Session::commit`]
    Exclusive,
    /// Every statement commits on its own
    AutoCommit,
}

impl std::fmt::Display for SessionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionMode::Exclusive => write!(f, "exclusive"),
            SessionMode::AutoCommit => write!(f, "auto-commit"),
        }
    }
}

/// A database the engine can open sessions against.
pub trait Backend {
    /// Open a connection, beginning a transaction for [`SessionMode::Exclusive`].
    fn open_session(&self, mode: SessionMode) -> DbResult<Box<dyn Session + '_>>;

    /// Database type identifier for logging
    fn db_type(&self) -> &'static str;
}

/// Exclusively owned handle to one database connection.
///
/// Dropping a session without calling [`commit`](Session::commit) rolls back
/// its transaction and releases the connection.
pub trait Session {
    /// Mode this session was opened with
    fn mode(&self) -> SessionMode;

    /// Names of the user tables visible to this session
    fn table_names(&mut self) -> DbResult<HashSet<String>>;

    /// Create the ledger table if it does not exist yet.
    ///
    /// Must be idempotent and enforce uniqueness of the `Id` column.
    fn ensure_ledger_table(&mut self, table: &LedgerTable) -> DbResult<()>;

    /// Ids of all migrations recorded in the ledger
    fn applied_ids(&mut self, table: &LedgerTable) -> DbResult<HashSet<String>>;

    /// Execute one batch; backend errors are returned as-is.
    fn execute(&mut self, batch: &str, timeout: Duration) -> DbResult<()>;

    /// Insert one ledger row using bound parameters
    fn log_applied(&mut self, table: &LedgerTable, entry: &LedgerEntry) -> DbResult<()>;

    /// Commit and release the session. A no-op commit for auto-commit sessions.
    fn commit(self: Box<Self>) -> DbResult<()>;
}
