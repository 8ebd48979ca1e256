//! sw-db - Database abstraction layer for Stepwise
//!
//! This crate provides the `Backend` and `Session` traits the engine runs
//! migrations through, the ledger row type, and implementations for DuckDB
//! and an in-memory reference backend.

pub mod duckdb;
pub mod error;
pub mod ledger;
pub mod memory;
pub mod traits;

pub use duckdb::{DuckDbBackend, DuckDbSession};
pub use error::{DbError, DbResult};
pub use ledger::{LedgerEntry, LEDGER_COLUMNS};
pub use memory::{ExecutedStatement, MemoryBackend, MemorySession};
pub use traits::{Backend, Session, SessionMode};
