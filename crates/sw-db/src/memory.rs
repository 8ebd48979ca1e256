//! In-memory reference backend.
//!
//! Implements the session contract without a real database: exclusive
//! sessions stage their changes in a journal that only reaches the shared
//! state on commit, and only one exclusive session may be open at a time.
//! Like a DuckDB transaction, an exclusive session snapshots the committed
//! state at its first write and reads that snapshot from then on.
//! `CREATE TABLE` / `DROP TABLE` statements are recognised so that
//! [`Session::table_names`] reflects executed DDL; every other statement is
//! recorded and otherwise ignored.

use crate::error::{DbError, DbResult};
use crate::ledger::LedgerEntry;
use crate::traits::{Backend, Session, SessionMode};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use sw_core::LedgerTable;

/// A batch passed to [`Session::execute`], successful or not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutedStatement {
    pub sql: String,
    pub timeout: Duration,
    pub mode: SessionMode,
}

#[derive(Debug, Clone, Default)]
struct MemoryState {
    tables: BTreeSet<String>,
    ledgers: HashMap<String, Vec<LedgerEntry>>,
}

#[derive(Debug, Clone)]
enum Change {
    CreateTable { name: String, if_not_exists: bool },
    DropTable { name: String, if_exists: bool },
    CreateLedger(String),
    Append(String, LedgerEntry),
}

impl MemoryState {
    fn has_table(&self, name: &str) -> bool {
        self.tables.iter().any(|t| t.eq_ignore_ascii_case(name))
    }

    fn apply(&mut self, change: &Change) -> DbResult<()> {
        match change {
            Change::CreateTable {
                name,
                if_not_exists,
            } => {
                if self.has_table(name) {
                    if *if_not_exists {
                        return Ok(());
                    }
                    return Err(DbError::ExecutionError(format!(
                        "table {name} already exists"
                    )));
                }
                self.tables.insert(name.clone());
            }
            Change::DropTable { name, if_exists } => {
                if !self.has_table(name) {
                    if *if_exists {
                        return Ok(());
                    }
                    return Err(DbError::ExecutionError(format!("table {name} does not exist")));
                }
                self.tables.retain(|t| !t.eq_ignore_ascii_case(name));
                self.ledgers.remove(name);
            }
            Change::CreateLedger(name) => {
                if !self.has_table(name) {
                    self.tables.insert(name.clone());
                }
                self.ledgers.entry(name.clone()).or_default();
            }
            Change::Append(table, entry) => {
                let ledger = self.ledgers.get_mut(table).ok_or_else(|| {
                    DbError::LedgerError(format!("ledger table {table} does not exist"))
                })?;
                if ledger.iter().any(|e| e.id == entry.id) {
                    return Err(DbError::LedgerError(format!(
                        "duplicate key {} in {table}",
                        entry.id
                    )));
                }
                ledger.push(entry.clone());
            }
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
struct Shared {
    state: MemoryState,
    executed: Vec<ExecutedStatement>,
    failure_patterns: Vec<String>,
    exclusive_open: bool,
}

/// In-memory implementation of [`Backend`].
#[derive(Debug, Default)]
pub struct MemoryBackend {
    shared: Mutex<Shared>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> DbResult<MutexGuard<'_, Shared>> {
        self.shared
            .lock()
            .map_err(|e| DbError::MutexPoisoned(e.to_string()))
    }

    /// Make every batch containing `pattern` fail with an execution error.
    pub fn fail_on(&self, pattern: impl Into<String>) -> DbResult<()> {
        self.lock()?.failure_patterns.push(pattern.into());
        Ok(())
    }

    /// Committed table names
    pub fn table_names(&self) -> DbResult<BTreeSet<String>> {
        Ok(self.lock()?.state.tables.clone())
    }

    /// Committed ledger rows of `table`, in insert order
    pub fn ledger(&self, table: &LedgerTable) -> DbResult<Vec<LedgerEntry>> {
        Ok(self
            .lock()?
            .state
            .ledgers
            .get(table.as_str())
            .cloned()
            .unwrap_or_default())
    }

    /// Every batch passed to `execute` across all sessions, in call order
    pub fn executed(&self) -> DbResult<Vec<ExecutedStatement>> {
        Ok(self.lock()?.executed.clone())
    }

    /// Whether an exclusive session is currently open
    pub fn is_locked(&self) -> DbResult<bool> {
        Ok(self.lock()?.exclusive_open)
    }
}

impl Backend for MemoryBackend {
    fn open_session(&self, mode: SessionMode) -> DbResult<Box<dyn Session + '_>> {
        if mode == SessionMode::Exclusive {
            let mut shared = self.lock()?;
            if shared.exclusive_open {
                return Err(DbError::Conflict(
                    "another exclusive session holds the database lock".to_string(),
                ));
            }
            shared.exclusive_open = true;
        }
        log::debug!("Opened {mode} in-memory session");
        Ok(Box::new(MemorySession {
            backend: self,
            mode,
            snapshot: None,
            journal: Vec::new(),
            released: false,
        }))
    }

    fn db_type(&self) -> &'static str {
        "memory"
    }
}

/// Session of a [`MemoryBackend`]
pub struct MemorySession<'a> {
    backend: &'a MemoryBackend,
    mode: SessionMode,
    /// Committed state as of the first staged write
    snapshot: Option<MemoryState>,
    journal: Vec<Change>,
    released: bool,
}

impl MemorySession<'_> {
    /// Snapshot (or latest committed state before the first write) with this
    /// session's staged changes applied on top.
    fn view(&self) -> DbResult<MemoryState> {
        let mut state = match &self.snapshot {
            Some(snapshot) => snapshot.clone(),
            None => self.backend.lock()?.state.clone(),
        };
        for change in &self.journal {
            state.apply(change)?;
        }
        Ok(state)
    }

    /// Validate `change` against the current view, then stage or apply it.
    fn record(&mut self, change: Change) -> DbResult<()> {
        match self.mode {
            SessionMode::Exclusive => {
                if self.snapshot.is_none() {
                    self.snapshot = Some(self.backend.lock()?.state.clone());
                }
                self.view()?.apply(&change)?;
                self.journal.push(change);
            }
            SessionMode::AutoCommit => {
                self.backend.lock()?.state.apply(&change)?;
            }
        }
        Ok(())
    }
}

impl Session for MemorySession<'_> {
    fn mode(&self) -> SessionMode {
        self.mode
    }

    fn table_names(&mut self) -> DbResult<HashSet<String>> {
        Ok(self.view()?.tables.into_iter().collect())
    }

    fn ensure_ledger_table(&mut self, table: &LedgerTable) -> DbResult<()> {
        if self.view()?.ledgers.contains_key(table.as_str()) {
            return Ok(());
        }
        self.record(Change::CreateLedger(table.to_string()))
    }

    fn applied_ids(&mut self, table: &LedgerTable) -> DbResult<HashSet<String>> {
        let view = self.view()?;
        let ledger = view.ledgers.get(table.as_str()).ok_or_else(|| {
            DbError::LedgerError(format!("ledger table {table} does not exist"))
        })?;
        Ok(ledger.iter().map(|e| e.id.clone()).collect())
    }

    fn execute(&mut self, batch: &str, timeout: Duration) -> DbResult<()> {
        let failure = {
            let mut shared = self.backend.lock()?;
            shared.executed.push(ExecutedStatement {
                sql: batch.to_string(),
                timeout,
                mode: self.mode,
            });
            shared
                .failure_patterns
                .iter()
                .find(|p| batch.contains(p.as_str()))
                .cloned()
        };
        if let Some(pattern) = failure {
            return Err(DbError::ExecutionError(format!(
                "simulated failure on '{pattern}'"
            )));
        }

        for change in ddl_changes(batch) {
            self.record(change)?;
        }
        Ok(())
    }

    fn log_applied(&mut self, table: &LedgerTable, entry: &LedgerEntry) -> DbResult<()> {
        self.record(Change::Append(table.to_string(), entry.clone()))
    }

    fn commit(mut self: Box<Self>) -> DbResult<()> {
        if self.mode == SessionMode::AutoCommit {
            return Ok(());
        }
        let mut shared = self.backend.lock()?;
        let mut next = shared.state.clone();
        for change in &self.journal {
            next.apply(change)
                .map_err(|e| DbError::Conflict(format!("commit rejected: {e}")))?;
        }
        shared.state = next;
        shared.exclusive_open = false;
        drop(shared);

        self.released = true;
        log::debug!("Committed {} staged changes", self.journal.len());
        Ok(())
    }
}

impl Drop for MemorySession<'_> {
    fn drop(&mut self) {
        if self.released || self.mode == SessionMode::AutoCommit {
            return;
        }
        match self.backend.shared.lock() {
            Ok(mut shared) => {
                shared.exclusive_open = false;
                if !self.journal.is_empty() {
                    log::debug!("Discarded {} staged changes", self.journal.len());
                }
            }
            Err(e) => log::warn!("Could not release in-memory session lock: {e}"),
        }
    }
}

/// Table-level DDL effects of a batch.
fn ddl_changes(batch: &str) -> Vec<Change> {
    batch
        .split(';')
        .filter_map(|statement| {
            let tokens: Vec<String> = statement
                .split_whitespace()
                .map(str::to_lowercase)
                .collect();
            let words: Vec<&str> = tokens.iter().map(String::as_str).collect();
            let raw: Vec<&str> = statement.split_whitespace().collect();
            match words.as_slice() {
                ["create", "table", "if", "not", "exists", ..] => {
                    raw.get(5).map(|name| Change::CreateTable {
                        name: table_name(name),
                        if_not_exists: true,
                    })
                }
                ["create", "table", ..] => raw.get(2).map(|name| Change::CreateTable {
                    name: table_name(name),
                    if_not_exists: false,
                }),
                ["drop", "table", "if", "exists", ..] => {
                    raw.get(4).map(|name| Change::DropTable {
                        name: table_name(name),
                        if_exists: true,
                    })
                }
                ["drop", "table", ..] => raw.get(2).map(|name| Change::DropTable {
                    name: table_name(name),
                    if_exists: false,
                }),
                _ => None,
            }
        })
        .filter(|change| match change {
            Change::CreateTable { name, .. } | Change::DropTable { name, .. } => !name.is_empty(),
            _ => true,
        })
        .collect()
}

/// Strip a column list and identifier quoting from a table token.
fn table_name(token: &str) -> String {
    let name = token.split('(').next().unwrap_or(token);
    name.trim_matches(|c| matches!(c, '"' | '`' | '[' | ']'))
        .to_string()
}

#[cfg(test)]
#[path = "memory_test.rs"]
mod tests;
