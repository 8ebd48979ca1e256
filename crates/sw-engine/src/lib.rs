//! sw-engine - Migration engine for Stepwise
//!
//! [`Migrator`] reconciles the migrations discovered by a
//! [`MigrationSource`](sw_core::MigrationSource) with the ledger of a
//! [`Backend`](sw_db::Backend) and applies the pending ones in order.

pub mod error;
pub mod migrator;
pub mod report;

pub use error::{EngineError, EngineResult};
pub use migrator::{load_migrations, Migrator, MigratorOptions};
pub use report::{MigrationReport, MigrationStatus};
