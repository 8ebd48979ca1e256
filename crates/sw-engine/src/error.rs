//! Error types for sw-engine

use sw_core::{CoreError, MigrationId};
use sw_db::DbError;
use thiserror::Error;

/// Migration run errors
#[derive(Error, Debug)]
pub enum EngineError {
    /// Discovery or validation failed before any connection was opened (G001)
    #[error("[G001] Migration discovery failed: {0}")]
    Discovery(#[from] CoreError),

    /// Opening, reading or releasing a session failed (G002)
    #[error("[G002] Database session failed: {0}")]
    Session(#[from] DbError),

    /// Migration body holds nothing but batch separators and comments (G003)
    #[error("[G003] Migration {id} has no executable batch")]
    EmptyMigration { id: MigrationId },

    /// A batch failed; the run was rolled back (G004)
    #[error("[G004] Migration {id} failed executing batch:\n{batch}\n{source}")]
    Apply {
        id: MigrationId,
        batch: String,
        source: DbError,
    },

    /// The ledger row could not be written; the run was rolled back (G005)
    #[error("[G005] Failed to record migration {id} in the ledger: {source}")]
    Record { id: MigrationId, source: DbError },

    /// Final commit rejected; none of the transactional migrations were applied (G006)
    #[error("[G006] Commit failed: {0}")]
    Commit(#[source] DbError),
}

impl EngineError {
    /// Whether the run failed because of a concurrent run and may be retried as a whole
    pub fn is_retryable(&self) -> bool {
        match self {
            EngineError::Session(e) | EngineError::Commit(e) => e.is_conflict(),
            EngineError::Apply { source, .. } | EngineError::Record { source, .. } => {
                source.is_conflict()
            }
            EngineError::Discovery(_) | EngineError::EmptyMigration { .. } => false,
        }
    }

    /// Id of the migration the failure belongs to, if any
    pub fn migration_id(&self) -> Option<&MigrationId> {
        match self {
            EngineError::EmptyMigration { id }
            | EngineError::Apply { id, .. }
            | EngineError::Record { id, .. } => Some(id),
            _ => None,
        }
    }
}

/// Result type alias for EngineError
pub type EngineResult<T> = Result<T, EngineError>;
