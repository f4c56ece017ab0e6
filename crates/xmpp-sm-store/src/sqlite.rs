//! SQLite implementation of the persistence traits.
//!
//! Each account owns one row holding its latest CBOR-encoded snapshot.
//! rusqlite runs with bundled SQLite, wrapped in async via
//! tokio::spawn_blocking.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};

use xmpp_sm_core::Snapshot;

use crate::error::{Result, StoreError};
use crate::migration;
use crate::traits::{Persister, SnapshotSource};

/// SQLite-backed snapshot store scoped to one account.
///
/// Thread-safe via internal Mutex. All operations use spawn_blocking
/// to avoid blocking the async runtime.
pub struct SqlitePersister {
    conn: Arc<Mutex<Connection>>,
    account: String,
}

impl SqlitePersister {
    /// Open a SQLite database at the given path for `account`.
    ///
    /// Creates the file, along with any missing parent directories, and
    /// runs migrations if it doesn't exist.
    pub fn open(path: impl AsRef<Path>, account: impl Into<String>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut conn = Connection::open(path)?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            account: account.into(),
        })
    }

    /// Open an in-memory SQLite database.
    ///
    /// Useful for testing.
    pub fn open_memory(account: impl Into<String>) -> Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            account: account.into(),
        })
    }

    /// Another handle on the same database, scoped to a different account.
    pub fn for_account(&self, account: impl Into<String>) -> Self {
        Self {
            conn: Arc::clone(&self.conn),
            account: account.into(),
        }
    }

    /// The account whose snapshot this handle reads and writes.
    pub fn account(&self) -> &str {
        &self.account
    }

    /// How many times this account's snapshot has been written.
    pub async fn write_seq(&self) -> Result<u64> {
        let account = self.account.clone();
        self.run_blocking(move |conn| {
            let seq: Option<i64> = conn
                .query_row(
                    "SELECT write_seq FROM sm_snapshots WHERE account = ?1",
                    params![account],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(seq.unwrap_or(0) as u64)
        })
        .await
    }

    /// Forget this account's snapshot.
    pub async fn clear(&self) -> Result<()> {
        let account = self.account.clone();
        self.run_blocking(move |conn| {
            conn.execute(
                "DELETE FROM sm_snapshots WHERE account = ?1",
                params![account],
            )?;
            Ok(())
        })
        .await
    }

    /// Run a blocking closure against the connection on the blocking pool.
    async fn run_blocking<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);

        tokio::task::spawn_blocking(move || {
            let conn = conn.lock().map_err(|e| {
                StoreError::Database(rusqlite::Error::SqliteFailure(
                    rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_LOCKED),
                    Some(format!("mutex poisoned: {}", e)),
                ))
            })?;
            f(&conn)
        })
        .await
        .map_err(|e| {
            StoreError::Database(rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_ERROR),
                Some(format!("spawn_blocking failed: {}", e)),
            ))
        })?
    }
}

#[async_trait]
impl Persister for SqlitePersister {
    async fn persist(&self, snapshot: &Snapshot) -> Result<()> {
        let encoded = snapshot.to_cbor()?;
        let account = self.account.clone();
        let session_id = snapshot.id.as_ref().map(|id| id.as_str().to_owned());
        let handled = i64::from(snapshot.handled);
        let last_ack = i64::from(snapshot.last_ack);
        let unacked_count = snapshot.unacked.len() as i64;

        self.run_blocking(move |conn| {
            conn.execute(
                "INSERT INTO sm_snapshots (
                    account, session_id, handled, last_ack, unacked_count,
                    snapshot, write_seq, written_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, 1, ?7)
                ON CONFLICT(account) DO UPDATE SET
                    session_id = excluded.session_id,
                    handled = excluded.handled,
                    last_ack = excluded.last_ack,
                    unacked_count = excluded.unacked_count,
                    snapshot = excluded.snapshot,
                    write_seq = sm_snapshots.write_seq + 1,
                    written_at = excluded.written_at",
                params![
                    account,
                    session_id,
                    handled,
                    last_ack,
                    unacked_count,
                    encoded,
                    now_millis(),
                ],
            )?;
            Ok(())
        })
        .await
    }
}

#[async_trait]
impl SnapshotSource for SqlitePersister {
    async fn latest(&self) -> Result<Option<Snapshot>> {
        let account = self.account.clone();

        let encoded: Option<Vec<u8>> = self
            .run_blocking(move |conn| {
                conn.query_row(
                    "SELECT snapshot FROM sm_snapshots WHERE account = ?1",
                    params![account],
                    |row| row.get(0),
                )
                .optional()
                .map_err(StoreError::from)
            })
            .await?;

        match encoded {
            Some(bytes) => {
                let snapshot = Snapshot::from_cbor(&bytes).map_err(|e| {
                    tracing::warn!(account = %self.account, "unreadable snapshot: {}", e);
                    StoreError::InvalidData(format!("snapshot for {}: {}", self.account, e))
                })?;
                Ok(Some(snapshot))
            }
            None => Ok(None),
        }
    }
}

/// Get current time in milliseconds.
fn now_millis() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}
