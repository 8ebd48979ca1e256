//! Error types for sw-db

use std::time::Duration;
use thiserror::Error;

/// Database operation errors
#[derive(Error, Debug)]
pub enum DbError {
    /// Connection error (D001)
    #[error("[D001] Database connection failed: {0}")]
    ConnectionError(String),

    /// Statement execution error (D002)
    #[error("[D002] SQL execution failed: {0}")]
    ExecutionError(String),

    /// Serialization failure or lock held by a concurrent run (D003)
    #[error("[D003] Concurrent run conflict, retry later: {0}")]
    Conflict(String),

    /// Statement ran past its timeout (D004)
    #[error("[D004] Statement exceeded its timeout of {}s (ran {:.1}s)", .limit.as_secs(), .elapsed.as_secs_f64())]
    Timeout { elapsed: Duration, limit: Duration },

    /// Transaction management error (D005)
    #[error("[D005] Transaction failed: {0}")]
    TransactionError(String),

    /// Ledger table missing or ledger write rejected (D006)
    #[error("[D006] Ledger error: {0}")]
    LedgerError(String),

    /// Mutex poisoned (D007)
    #[error("[D007] Database mutex poisoned: {0}")]
    MutexPoisoned(String),
}

impl DbError {
    /// Whether the failure came from a concurrent run and the whole run may be retried
    pub fn is_conflict(&self) -> bool {
        matches!(self, DbError::Conflict(_))
    }
}

/// Result type alias for DbError
pub type DbResult<T> = Result<T, DbError>;

impl From<duckdb::Error> for DbError {
    fn from(err: duckdb::Error) -> Self {
        let msg = err.to_string();
        if is_conflict_message(&msg) {
            DbError::Conflict(msg)
        } else {
            DbError::ExecutionError(msg)
        }
    }
}

/// duckdb::Error has no structured variant for transaction conflicts; these
/// are the messages DuckDB raises for them.
fn is_conflict_message(msg: &str) -> bool {
    msg.contains("TransactionContext Error")
        || msg.contains("write-write conflict")
        || msg.contains("Conflict on ")
        || msg.contains("Could not set lock")
}
