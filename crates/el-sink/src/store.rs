//! SQLite-backed error store.

use el_core::{Sink, SinkError};
use rusqlite::{params, Connection, TransactionBehavior};
use std::path::Path;
use std::time::Duration;

const CREATE_TABLE_SQL: &str = "CREATE TABLE IF NOT EXISTS logs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    message TEXT,
    created_at VARCHAR(128)
)";

const INSERT_SQL: &str = "INSERT INTO logs VALUES (NULL, ?1, DATETIME('now', 'localtime'))";

/// How long a writer waits on another connection's lock before failing.
pub const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Inserts one `logs` row per record.
///
/// Every call opens and closes its own connection, concurrent writers are
/// serialized by SQLite's locking.
#[derive(Debug, Default, Clone, Copy)]
pub struct StoreSink;

impl StoreSink {
    fn insert(target: &Path, text: &str) -> Result<i64, rusqlite::Error> {
        let mut conn = Connection::open(target)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;

        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        tx.execute(CREATE_TABLE_SQL, [])?;
        tx.execute(INSERT_SQL, params![text])?;
        let id = tx.last_insert_rowid();
        tx.commit()?;

        conn.close().map_err(|(_, e)| e)?;
        Ok(id)
    }
}

impl Sink for StoreSink {
    fn record(&self, target: &Path, text: &str) -> Result<(), SinkError> {
        let id = Self::insert(target, text).map_err(|e| SinkError::Store {
            path: target.to_path_buf(),
            message: e.to_string(),
        })?;
        tracing::debug!(path = %target.display(), id, bytes = text.len(), "error row inserted");
        Ok(())
    }
}
