#![forbid(unsafe_code)]

mod config;
mod jobs;
mod support;
mod workers;

pub mod error;
pub mod types;

use error::StoreError;
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use std::time::Duration;

const DB_FILENAME: &str = "queue.db";

// Matches the busy handling the pollers rely on: a contended write waits for
// the lock instead of failing immediately, and anything slower than this is
// surfaced as a busy error the caller may retry.
const BUSY_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug)]
pub struct SqliteStore {
    storage_dir: PathBuf,
    conn: Connection,
}

impl SqliteStore {
    /// Open (creating if needed) the store under `storage_dir`. Schema
    /// creation is idempotent, so opening doubles as `init`.
    pub fn open(storage_dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let storage_dir = storage_dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&storage_dir)?;
        let conn = Connection::open(storage_dir.join(DB_FILENAME))?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        // WAL lets readers proceed while a writer holds the lock. The pragma
        // reports the resulting mode as a row, so run it as a query.
        conn.query_row("PRAGMA journal_mode=WAL", [], |_| Ok(()))?;
        let store = Self { storage_dir, conn };
        store.migrate()?;
        Ok(store)
    }

    pub fn storage_dir(&self) -> &Path {
        &self.storage_dir
    }

    pub fn db_path(&self) -> PathBuf {
        self.storage_dir.join(DB_FILENAME)
    }

    fn migrate(&self) -> Result<(), StoreError> {
        support::migrate_sqlite_schema(&self.conn)
    }
}
