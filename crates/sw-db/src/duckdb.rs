//! DuckDB database backend implementation

use crate::error::{DbError, DbResult};
use crate::ledger::{LedgerEntry, LEDGER_COLUMNS};
use crate::traits::{Backend, Session, SessionMode};
use duckdb::Connection;
use std::collections::HashSet;
use std::path::Path;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};
use sw_core::LedgerTable;

/// Timestamp format bound for the ledger `Time` column.
const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// DuckDB database backend
///
/// Holds the root connection; every session works on its own clone of it,
/// so sessions of one backend share the same database instance.
pub struct DuckDbBackend {
    conn: Connection,
}

impl DuckDbBackend {
    /// Create a new in-memory DuckDB database
    pub fn in_memory() -> DbResult<Self> {
        let conn =
            Connection::open_in_memory().map_err(|e| DbError::ConnectionError(e.to_string()))?;
        Ok(Self { conn })
    }

    /// Open (or create) a DuckDB database file
    pub fn from_path(path: &Path) -> DbResult<Self> {
        let conn = Connection::open(path)
            .map_err(|e| DbError::ConnectionError(format!("{e}: {}", path.display())))?;
        Ok(Self { conn })
    }

    /// Create from path string (handles :memory: special case)
    pub fn new(path: &str) -> DbResult<Self> {
        if path == ":memory:" {
            Self::in_memory()
        } else {
            Self::from_path(Path::new(path))
        }
    }

    /// Borrow the root connection, outside of any session.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

impl Backend for DuckDbBackend {
    fn open_session(&self, mode: SessionMode) -> DbResult<Box<dyn Session + '_>> {
        let conn = self
            .conn
            .try_clone()
            .map_err(|e| DbError::ConnectionError(e.to_string()))?;
        log::debug!("Opened {mode} DuckDB session");
        Ok(Box::new(DuckDbSession {
            conn,
            mode,
            in_transaction: false,
        }))
    }

    fn db_type(&self) -> &'static str {
        "duckdb"
    }
}

/// One DuckDB connection, optionally inside a `BEGIN` / `COMMIT` transaction.
///
/// An exclusive session starts its transaction at its first write. Reads
/// before that point, and the snapshot the transaction takes, see everything
/// other sessions committed up to then. DuckDB transactions are snapshot
/// isolated; a write that conflicts with a concurrent transaction fails
/// instead of being merged.
pub struct DuckDbSession {
    conn: Connection,
    mode: SessionMode,
    in_transaction: bool,
}

impl DuckDbSession {
    /// Open the run transaction of an exclusive session if not yet open.
    fn begin_write(&mut self) -> DbResult<()> {
        if self.mode != SessionMode::Exclusive || self.in_transaction {
            return Ok(());
        }
        self.conn
            .execute_batch("BEGIN TRANSACTION")
            .map_err(|e| match DbError::from(e) {
                DbError::Conflict(msg) => DbError::Conflict(msg),
                other => DbError::TransactionError(format!("BEGIN failed: {other}")),
            })?;
        self.in_transaction = true;
        log::debug!("Started DuckDB transaction");
        Ok(())
    }

    fn has_table(&self, table: &LedgerTable) -> DbResult<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT count(*) FROM information_schema.tables WHERE lower(table_name) = lower(?)",
            [table.as_str()],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }
}

/// Interrupts the connection's running statement once `limit` passes.
struct Watchdog {
    disarm: mpsc::Sender<()>,
    fired: thread::JoinHandle<bool>,
}

impl Watchdog {
    fn arm(conn: &Connection, limit: Duration) -> Self {
        let handle = conn.interrupt_handle();
        let (disarm, armed) = mpsc::channel::<()>();
        let fired = thread::spawn(move || match armed.recv_timeout(limit) {
            Err(RecvTimeoutError::Timeout) => {
                handle.interrupt();
                true
            }
            Ok(()) | Err(RecvTimeoutError::Disconnected) => false,
        });
        Self { disarm, fired }
    }

    /// Stop the timer; true when it already interrupted the statement.
    fn disarm(self) -> bool {
        let _ = self.disarm.send(());
        self.fired.join().unwrap_or(false)
    }
}

impl Session for DuckDbSession {
    fn mode(&self) -> SessionMode {
        self.mode
    }

    fn table_names(&mut self) -> DbResult<HashSet<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT table_name FROM information_schema.tables \
             WHERE table_schema NOT IN ('information_schema', 'pg_catalog')",
        )?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<HashSet<_>, _>>()?;
        Ok(names)
    }

    fn ensure_ledger_table(&mut self, table: &LedgerTable) -> DbResult<()> {
        if self.has_table(table)? {
            return Ok(());
        }
        self.begin_write()?;
        let sql = format!(
            r#"CREATE TABLE IF NOT EXISTS "{table}" (
                "Id" VARCHAR NOT NULL UNIQUE,
                "Sql" VARCHAR NOT NULL,
                "Description" VARCHAR NOT NULL,
                "Time" TIMESTAMP NOT NULL,
                "UserName" VARCHAR NOT NULL,
                "UserDomainName" VARCHAR NOT NULL,
                "MachineName" VARCHAR NOT NULL
            )"#
        );
        self.conn.execute_batch(&sql).map_err(|e| {
            DbError::LedgerError(format!("failed to create ledger table {table}: {e}"))
        })
    }

    fn applied_ids(&mut self, table: &LedgerTable) -> DbResult<HashSet<String>> {
        let mut stmt = self
            .conn
            .prepare(&format!(r#"SELECT "Id" FROM "{table}""#))
            .map_err(|e| DbError::LedgerError(format!("failed to read ledger {table}: {e}")))?;
        let ids = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<HashSet<_>, _>>()?;
        Ok(ids)
    }

    fn execute(&mut self, batch: &str, timeout: Duration) -> DbResult<()> {
        self.begin_write()?;
        let started = Instant::now();
        let watchdog = Watchdog::arm(&self.conn, timeout);
        let result = self.conn.execute_batch(batch);
        let interrupted = watchdog.disarm();
        let elapsed = started.elapsed();

        match result {
            Err(_) if interrupted => {
                log::warn!("Interrupted statement after {:.1}s", elapsed.as_secs_f64());
                Err(DbError::Timeout {
                    elapsed,
                    limit: timeout,
                })
            }
            Err(e) => Err(e.into()),
            Ok(()) if interrupted || elapsed > timeout => Err(DbError::Timeout {
                elapsed,
                limit: timeout,
            }),
            Ok(()) => Ok(()),
        }
    }

    fn log_applied(&mut self, table: &LedgerTable, entry: &LedgerEntry) -> DbResult<()> {
        self.begin_write()?;
        let columns = LEDGER_COLUMNS
            .iter()
            .map(|c| format!("\"{c}\""))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            r#"INSERT INTO "{table}" ({columns}) VALUES (?, ?, ?, CAST(? AS TIMESTAMP), ?, ?, ?)"#
        );
        let time = entry.time.format(TIME_FORMAT).to_string();

        self.conn
            .execute(
                &sql,
                duckdb::params![
                    entry.id,
                    entry.sql,
                    entry.description,
                    time,
                    entry.actor.user_name,
                    entry.actor.user_domain,
                    entry.actor.machine_name,
                ],
            )
            .map_err(|e| match DbError::from(e) {
                DbError::Conflict(msg) => DbError::Conflict(msg),
                other => DbError::LedgerError(format!("failed to record {}: {other}", entry.id)),
            })?;
        Ok(())
    }

    fn commit(mut self: Box<Self>) -> DbResult<()> {
        if !self.in_transaction {
            return Ok(());
        }
        // Cleared before COMMIT so Drop never issues a second ROLLBACK.
        self.in_transaction = false;

        if let Err(commit_err) = self.conn.execute_batch("COMMIT") {
            let _ = self.conn.execute_batch("ROLLBACK");
            return Err(match DbError::from(commit_err) {
                DbError::Conflict(msg) => DbError::Conflict(msg),
                other => DbError::TransactionError(format!("COMMIT failed: {other}")),
            });
        }
        log::debug!("Committed DuckDB session");
        Ok(())
    }
}

impl Drop for DuckDbSession {
    fn drop(&mut self) {
        if !self.in_transaction {
            return;
        }
        match self.conn.execute_batch("ROLLBACK") {
            Ok(()) => log::debug!("Rolled back DuckDB session"),
            Err(e) => log::warn!("ROLLBACK failed while releasing DuckDB session: {e}"),
        }
    }
}

#[cfg(test)]
#[path = "duckdb_test.rs"]
mod tests;
