#![forbid(unsafe_code)]

use super::SqliteStore;
use super::error::StoreError;
use super::types::WorkerRow;
use rusqlite::params;

fn normalize_worker_id(raw: &str) -> Result<String, StoreError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(StoreError::InvalidInput("worker id must not be empty"));
    }
    Ok(raw.to_string())
}

impl SqliteStore {
    /// Record a worker as live. Re-registering the same id refreshes
    /// `started_at`; a pid can only be reused after the old process is gone.
    pub fn register_worker(&mut self, worker_id: &str, now: i64) -> Result<(), StoreError> {
        let worker_id = normalize_worker_id(worker_id)?;
        self.conn.execute(
            "INSERT OR REPLACE INTO workers(worker_id, started_at) VALUES (?1, ?2)",
            params![worker_id, now],
        )?;
        Ok(())
    }

    pub fn unregister_worker(&mut self, worker_id: &str) -> Result<(), StoreError> {
        let worker_id = normalize_worker_id(worker_id)?;
        self.conn
            .execute("DELETE FROM workers WHERE worker_id=?1", params![worker_id])?;
        Ok(())
    }

    pub fn list_workers(&self) -> Result<Vec<WorkerRow>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT worker_id, started_at FROM workers ORDER BY started_at ASC, worker_id ASC")?;
        let rows = stmt.query_map([], |row| {
            Ok(WorkerRow {
                worker_id: row.get(0)?,
                started_at: row.get(1)?,
            })
        })?;

        let mut workers = Vec::<WorkerRow>::new();
        for row in rows {
            workers.push(row?);
        }
        Ok(workers)
    }
}
