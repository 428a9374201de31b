#![forbid(unsafe_code)]

use super::super::error::StoreError;
use qc_core::config::ConfigKey;
use rusqlite::{Connection, params};

const SCHEMA_SQL: &str = r#"

        CREATE TABLE IF NOT EXISTS jobs (
          id TEXT PRIMARY KEY,
          command TEXT NOT NULL,
          state TEXT NOT NULL DEFAULT 'pending',
          attempts INTEGER NOT NULL DEFAULT 0,
          max_retries INTEGER NOT NULL DEFAULT 3,
          next_run_at INTEGER NOT NULL,
          last_error TEXT,
          owner TEXT,
          created_at INTEGER NOT NULL,
          updated_at INTEGER NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_jobs_pending_next_run
          ON jobs(state, next_run_at);

        CREATE TABLE IF NOT EXISTS config (
          key TEXT PRIMARY KEY,
          value TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS workers (
          worker_id TEXT PRIMARY KEY,
          started_at INTEGER NOT NULL
        );
"#;

pub(in crate::store) fn migrate_sqlite_schema(conn: &Connection) -> Result<(), StoreError> {
    conn.execute_batch(SCHEMA_SQL)?;

    for key in ConfigKey::ALL {
        conn.execute(
            "INSERT OR IGNORE INTO config(key, value) VALUES (?1, ?2)",
            params![key.as_str(), key.default_value()],
        )?;
    }

    Ok(())
}
