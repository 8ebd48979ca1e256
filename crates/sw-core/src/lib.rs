//! sw-core - Core library for Stepwise
//!
//! This crate provides the migration model, the source parser and statement
//! splitter, discovery providers, configuration parsing and the actor
//! identity shared by all Stepwise components.

pub mod actor;
pub mod config;
pub mod discovery;
pub mod error;
mod identifier;
pub mod ledger_table;
pub mod migration;
pub mod parser;
pub mod splitter;

pub use actor::Actor;
pub use config::{Config, DatabaseConfig, DbType};
pub use discovery::{DeclaredMigration, DeclaredMigrations, FileTreeSource, MigrationSource};
pub use error::{CoreError, CoreResult};
pub use ledger_table::LedgerTable;
pub use migration::{
    BranchName, Hints, Migration, MigrationId, MigrationOrigin, MigrationSet, DEFAULT_BRANCH,
    NO_TRANSACTION_HINT,
};
pub use parser::{parse_source, ParsedSource};
pub use splitter::split_batches;
