//! Error types for sw-core

use thiserror::Error;

/// Core error type for Stepwise
#[derive(Error, Debug)]
pub enum CoreError {
    /// S001: Configuration file not found
    #[error("[S001] Config file not found: {path}")]
    ConfigNotFound { path: String },

    /// S002: Invalid configuration value
    #[error("[S002] Invalid config: {message}")]
    ConfigInvalid { message: String },

    /// S003: Migrations directory not found
    #[error("[S003] Migrations directory not found: {path}")]
    MigrationsDirNotFound { path: String },

    /// S004: Migration source name does not encode a sequence number
    #[error("[S004] Malformed migration name '{source_name}': {reason}")]
    MalformedName { source_name: String, reason: String },

    /// S005: Migration has no SQL once the comment block is removed
    #[error("[S005] Migration '{source_name}' contains no SQL")]
    EmptySql { source_name: String },

    /// S006: Two sources produced the same migration id
    #[error("[S006] Duplicate migration id '{id}' in {first} and {second}")]
    DuplicateId {
        id: String,
        first: String,
        second: String,
    },

    /// S007: Invalid ledger table name
    #[error("[S007] Invalid ledger table name '{name}': {reason}")]
    InvalidLedgerTable { name: String, reason: String },

    /// S008: IO error with file path context
    #[error("[S008] Failed to read '{path}': {source}")]
    IoWithPath {
        path: String,
        source: std::io::Error,
    },

    /// S009: IO error
    #[error("[S009] IO error: {0}")]
    Io(#[from] std::io::Error),

    /// S010: YAML parse error
    #[error("[S010] Config parse error: {0}")]
    YamlParse(#[from] serde_yaml::Error),
}

/// Result type alias for CoreError
pub type CoreResult<T> = Result<T, CoreError>;
