//! Migration engine.
//!
//! A run moves through discovery, validation, session setup, reconciliation
//! against the ledger and apply. Discovery and validation finish before any
//! connection is opened. Everything applied inside the exclusive session
//! commits or rolls back as a unit; `no-transaction` migrations run in their
//! own auto-commit session and stay applied even if a later migration fails.

use crate::error::{EngineError, EngineResult};
use crate::report::{MigrationReport, MigrationStatus};
use chrono::Utc;
use std::collections::HashSet;
use std::time::{Duration, Instant};
use sw_core::parser::DEFAULT_COMMENT_MARKER;
use sw_core::splitter::DEFAULT_BATCH_SEPARATOR;
use sw_core::{
    split_batches, Actor, Config, LedgerTable, Migration, MigrationSet, MigrationSource,
};
use sw_db::{Backend, LedgerEntry, Session, SessionMode};

/// Settings of a [`Migrator`].
#[derive(Debug, Clone)]
pub struct MigratorOptions {
    pub ledger_table: LedgerTable,
    /// Limit for every executed batch
    pub command_timeout: Duration,
    pub batch_separator: String,
    /// Identity written to every ledger row
    pub actor: Actor,
}

impl Default for MigratorOptions {
    fn default() -> Self {
        Self {
            ledger_table: LedgerTable::default(),
            command_timeout: Duration::from_secs(sw_core::config::DEFAULT_COMMAND_TIMEOUT_SECS),
            batch_separator: DEFAULT_BATCH_SEPARATOR.to_string(),
            actor: Actor::default(),
        }
    }
}

impl MigratorOptions {
    /// Options from project configuration and a resolved actor
    pub fn from_config(config: &Config, actor: Actor) -> Self {
        Self {
            ledger_table: config.ledger_table.clone(),
            command_timeout: config.command_timeout(),
            batch_separator: config.batch_separator.clone(),
            actor,
        }
    }
}

/// Consume `source` once and validate the result.
///
/// Rejects duplicate ids and migrations without an executable batch, i.e.
/// whose body is only separators and `--` comments. The returned set is
/// sorted by sequence number, then branch.
pub fn load_migrations(
    source: &dyn MigrationSource,
    batch_separator: &str,
) -> EngineResult<MigrationSet> {
    let migrations = MigrationSet::collect(source.migrations())?;
    for migration in &migrations {
        let batches = split_batches(migration.sql(), batch_separator);
        if !batches.iter().any(|batch| is_executable(batch)) {
            return Err(EngineError::EmptyMigration {
                id: migration.id().clone(),
            });
        }
    }
    Ok(migrations)
}

fn is_executable(batch: &str) -> bool {
    batch
        .lines()
        .map(str::trim)
        .any(|line| !line.is_empty() && !line.starts_with(DEFAULT_COMMENT_MARKER))
}

/// Applies migrations to one backend.
pub struct Migrator<'a> {
    backend: &'a dyn Backend,
    options: MigratorOptions,
}

impl<'a> Migrator<'a> {
    pub fn new(backend: &'a dyn Backend, options: MigratorOptions) -> Self {
        Self { backend, options }
    }

    pub fn options(&self) -> &MigratorOptions {
        &self.options
    }

    /// Apply every pending migration of `source`.
    pub fn migrate(&self, source: &dyn MigrationSource) -> EngineResult<MigrationReport> {
        let started = Instant::now();
        log::info!("Discovering migrations from {}", source.describe());
        let migrations = load_migrations(source, &self.options.batch_separator)?;
        log::debug!("Validated {} migrations", migrations.len());

        self.bootstrap_ledger()?;

        let table = &self.options.ledger_table;
        let mut session = self.backend.open_session(SessionMode::Exclusive)?;
        session.ensure_ledger_table(table)?;
        let applied_ids = session.applied_ids(table)?;

        let pending: Vec<&Migration> = migrations
            .iter()
            .filter(|m| !applied_ids.contains(m.id().as_str()))
            .collect();
        let already_applied = migrations.len() - pending.len();

        if pending.is_empty() {
            session.commit()?;
            log::info!("Database is up to date ({already_applied} migrations already applied)");
            return Ok(MigrationReport {
                applied: Vec::new(),
                already_applied,
                duration: started.elapsed(),
            });
        }
        log::info!(
            "{} pending migrations, {already_applied} already applied",
            pending.len()
        );

        let mut applied = Vec::with_capacity(pending.len());
        for migration in pending {
            if let Err(e) = self.apply_one(&mut *session, migration) {
                log::warn!("Rolling back run: {e}");
                drop(session);
                return Err(e);
            }
            applied.push(migration.id().clone());
        }

        session.commit().map_err(EngineError::Commit)?;

        let duration = started.elapsed();
        log::info!(
            "Applied {} migrations in {:.2}s",
            applied.len(),
            duration.as_secs_f64()
        );
        Ok(MigrationReport {
            applied,
            already_applied,
            duration,
        })
    }

    /// Report each migration of `source` as applied or pending.
    ///
    /// Read-only: the ledger table is not created and nothing is committed.
    pub fn status(&self, source: &dyn MigrationSource) -> EngineResult<Vec<MigrationStatus>> {
        let migrations = load_migrations(source, &self.options.batch_separator)?;

        let table = &self.options.ledger_table;
        let mut session = self.backend.open_session(SessionMode::Exclusive)?;
        let has_ledger = session
            .table_names()?
            .iter()
            .any(|name| name.eq_ignore_ascii_case(table.as_str()));
        let applied_ids = if has_ledger {
            session.applied_ids(table)?
        } else {
            log::debug!("Ledger table {table} does not exist yet");
            HashSet::new()
        };
        drop(session);

        Ok(migrations
            .iter()
            .map(|m| MigrationStatus {
                id: m.id().clone(),
                description: m.description().to_string(),
                origin: m.origin().to_string(),
                applied: applied_ids.contains(m.id().as_str()),
                no_transaction: m.is_no_transaction(),
            })
            .collect())
    }

    /// Create the ledger table outside the run transaction so that
    /// auto-commit sessions opened during the run can write to it.
    fn bootstrap_ledger(&self) -> EngineResult<()> {
        let mut session = self.backend.open_session(SessionMode::AutoCommit)?;
        session.ensure_ledger_table(&self.options.ledger_table)?;
        session.commit()?;
        Ok(())
    }

    fn apply_one(&self, run_session: &mut dyn Session, migration: &Migration) -> EngineResult<()> {
        if !migration.is_no_transaction() {
            return self.execute_and_record(run_session, migration);
        }

        log::info!("{} runs outside the run transaction", migration.id());
        let mut session = self.backend.open_session(SessionMode::AutoCommit)?;
        self.execute_and_record(&mut *session, migration)?;
        session.commit()?;
        Ok(())
    }

    fn execute_and_record(
        &self,
        session: &mut dyn Session,
        migration: &Migration,
    ) -> EngineResult<()> {
        log::info!("Applying {migration}");
        let batches = split_batches(migration.sql(), &self.options.batch_separator);
        for (i, batch) in batches.iter().enumerate() {
            log::debug!(
                "Executing batch {}/{} of {}",
                i + 1,
                batches.len(),
                migration.id()
            );
            session
                .execute(batch, self.options.command_timeout)
                .map_err(|source| EngineError::Apply {
                    id: migration.id().clone(),
                    batch: (*batch).to_string(),
                    source,
                })?;
        }

        let entry = LedgerEntry::for_migration(migration, &self.options.actor, Utc::now());
        session
            .log_applied(&self.options.ledger_table, &entry)
            .map_err(|source| EngineError::Record {
                id: migration.id().clone(),
                source,
            })
    }
}

#[cfg(test)]
#[path = "migrator_test.rs"]
mod tests;
