#![forbid(unsafe_code)]

use super::SqliteStore;
use super::error::StoreError;
use super::types::{FinalizeFailureRequest, InsertJobRequest, JobRow, StateCounts};
use qc_core::job::JobState;
use qc_core::retry::RetryDecision;
use rusqlite::{OptionalExtension, TransactionBehavior, params};
use std::collections::HashSet;

const MAX_JOB_ID_LEN: usize = 200;
const MAX_LAST_ERROR_LEN: usize = 500;

const SELECT_JOB_BY_ID: &str = r#"
    SELECT id, command, state, attempts, max_retries, next_run_at, last_error, owner, created_at, updated_at
    FROM jobs
    WHERE id=?1
"#;

fn normalize_job_id(raw: &str) -> Result<String, StoreError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(StoreError::InvalidInput("job id must not be empty"));
    }
    if raw.len() > MAX_JOB_ID_LEN {
        return Err(StoreError::InvalidInput("job id is too long"));
    }
    Ok(raw.to_string())
}

fn normalize_command(raw: &str) -> Result<String, StoreError> {
    if raw.trim().is_empty() {
        return Err(StoreError::InvalidInput("command must not be empty"));
    }
    Ok(raw.to_string())
}

fn normalize_worker_id(raw: &str) -> Result<String, StoreError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(StoreError::InvalidInput("worker id must not be empty"));
    }
    Ok(raw.to_string())
}

fn truncate_error(raw: &str) -> String {
    raw.trim().chars().take(MAX_LAST_ERROR_LEN).collect()
}

fn read_job_row(row: &rusqlite::Row<'_>) -> Result<JobRow, rusqlite::Error> {
    let state_raw: String = row.get(2)?;
    let state = JobState::parse(&state_raw).map_err(|err| {
        rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, Box::new(err))
    })?;
    Ok(JobRow {
        id: row.get(0)?,
        command: row.get(1)?,
        state,
        attempts: row.get(3)?,
        max_retries: row.get(4)?,
        next_run_at: row.get(5)?,
        last_error: row.get(6)?,
        owner: row.get(7)?,
        created_at: row.get(8)?,
        updated_at: row.get(9)?,
    })
}

impl SqliteStore {
    pub fn insert_job(&mut self, request: InsertJobRequest) -> Result<JobRow, StoreError> {
        let id = normalize_job_id(&request.id)?;
        let command = normalize_command(&request.command)?;
        let now = request.now;

        // Immediate, so the existence check and the insert see the same
        // table: two concurrent enqueues of one id serialize here and the
        // loser reports the duplicate instead of tripping the primary key.
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let exists: Option<i64> = tx
            .query_row("SELECT 1 FROM jobs WHERE id=?1", params![id], |row| {
                row.get(0)
            })
            .optional()?;
        if exists.is_some() {
            return Err(StoreError::DuplicateId { id });
        }

        tx.execute(
            r#"
            INSERT INTO jobs(id, command, state, attempts, max_retries, next_run_at, created_at, updated_at)
            VALUES (?1, ?2, 'pending', 0, ?3, ?4, ?4, ?4)
            "#,
            params![id, command, request.max_retries, now],
        )?;

        let job = tx.query_row(SELECT_JOB_BY_ID, params![id], read_job_row)?;
        tx.commit()?;
        Ok(job)
    }

    /// Atomically claim the next eligible job for `worker_id`, or return
    /// `None` when nothing is runnable.
    ///
    /// The select and the state flip happen under one immediate write
    /// transaction, so two concurrent claimers serialize on the write lock
    /// and can never walk away with the same row: the loser re-runs its
    /// select against the updated table.
    pub fn claim_next(&mut self, worker_id: &str, now: i64) -> Result<Option<JobRow>, StoreError> {
        let worker_id = normalize_worker_id(worker_id)?;

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let candidate: Option<String> = tx
            .query_row(
                r#"
                SELECT id FROM jobs
                WHERE state='pending' AND next_run_at<=?1
                ORDER BY next_run_at ASC, created_at ASC, id ASC
                LIMIT 1
                "#,
                params![now],
                |row| row.get(0),
            )
            .optional()?;
        let Some(id) = candidate else {
            return Ok(None);
        };

        let changed = tx.execute(
            r#"
            UPDATE jobs
            SET state='processing', owner=?2, updated_at=?3
            WHERE id=?1 AND state='pending'
            "#,
            params![id, worker_id, now],
        )?;
        if changed != 1 {
            return Ok(None);
        }

        let job = tx.query_row(SELECT_JOB_BY_ID, params![id], read_job_row)?;
        tx.commit()?;
        Ok(Some(job))
    }

    pub fn finalize_success(&mut self, id: &str, now: i64) -> Result<JobRow, StoreError> {
        let id = normalize_job_id(id)?;

        let tx = self.conn.transaction()?;
        require_processing(&tx, &id)?;

        tx.execute(
            r#"
            UPDATE jobs
            SET state='completed', owner=NULL, attempts=attempts+1, updated_at=?2
            WHERE id=?1
            "#,
            params![id, now],
        )?;

        let job = tx.query_row(SELECT_JOB_BY_ID, params![id], read_job_row)?;
        tx.commit()?;
        Ok(job)
    }

    pub fn finalize_failure(
        &mut self,
        request: FinalizeFailureRequest,
    ) -> Result<JobRow, StoreError> {
        let id = normalize_job_id(&request.id)?;
        let error = truncate_error(&request.error);
        let now = request.now;

        let tx = self.conn.transaction()?;
        require_processing(&tx, &id)?;

        match request.decision {
            RetryDecision::Retry { delay_seconds } => {
                let next_run_at = now.saturating_add(delay_seconds.min(i64::MAX as u64) as i64);
                tx.execute(
                    r#"
                    UPDATE jobs
                    SET state='pending', owner=NULL, attempts=attempts+1,
                        next_run_at=?2, last_error=?3, updated_at=?4
                    WHERE id=?1
                    "#,
                    params![id, next_run_at, error, now],
                )?;
            }
            RetryDecision::Dead => {
                tx.execute(
                    r#"
                    UPDATE jobs
                    SET state='dead', owner=NULL, attempts=attempts+1,
                        next_run_at=?2, last_error=?3, updated_at=?2
                    WHERE id=?1
                    "#,
                    params![id, now, error],
                )?;
            }
        }

        let job = tx.query_row(SELECT_JOB_BY_ID, params![id], read_job_row)?;
        tx.commit()?;
        Ok(job)
    }

    pub fn find_job(&self, id: &str) -> Result<Option<JobRow>, StoreError> {
        let id = normalize_job_id(id)?;
        Ok(self
            .conn
            .query_row(SELECT_JOB_BY_ID, params![id], read_job_row)
            .optional()?)
    }

    pub fn list_jobs(&self, state: Option<JobState>) -> Result<Vec<JobRow>, StoreError> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, command, state, attempts, max_retries, next_run_at, last_error, owner, created_at, updated_at
            FROM jobs
            WHERE (?1 IS NULL OR state=?1)
            ORDER BY created_at ASC, id ASC
            "#,
        )?;
        let rows = stmt.query_map(params![state.map(JobState::as_str)], read_job_row)?;

        let mut jobs = Vec::<JobRow>::new();
        for row in rows {
            jobs.push(row?);
        }
        Ok(jobs)
    }

    pub fn count_by_state(&self) -> Result<StateCounts, StoreError> {
        let mut counts = StateCounts::default();
        let mut stmt = self
            .conn
            .prepare("SELECT state, COUNT(*) FROM jobs GROUP BY state")?;
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            let state_raw: String = row.get(0)?;
            let count: i64 = row.get(1)?;
            let count = count.max(0) as u64;
            match JobState::parse(&state_raw) {
                Ok(JobState::Pending) => counts.pending = count,
                Ok(JobState::Processing) => counts.processing = count,
                Ok(JobState::Completed) => counts.completed = count,
                Ok(JobState::Dead) => counts.dead = count,
                Err(_) => {}
            }
        }
        Ok(counts)
    }

    /// Move a dead job back to the pending queue with a clean slate.
    pub fn dlq_retry(&mut self, id: &str, now: i64) -> Result<JobRow, StoreError> {
        let id = normalize_job_id(id)?;

        let tx = self.conn.transaction()?;

        let state: Option<String> = tx
            .query_row("SELECT state FROM jobs WHERE id=?1", params![id], |row| {
                row.get(0)
            })
            .optional()?;
        let Some(state) = state else {
            return Err(StoreError::NotFound { id });
        };
        if state != JobState::Dead.as_str() {
            return Err(StoreError::NotInDlq { id, state });
        }

        tx.execute(
            r#"
            UPDATE jobs
            SET state='pending', attempts=0, owner=NULL,
                next_run_at=?2, last_error=NULL, updated_at=?2
            WHERE id=?1 AND state='dead'
            "#,
            params![id, now],
        )?;

        let job = tx.query_row(SELECT_JOB_BY_ID, params![id], read_job_row)?;
        tx.commit()?;
        Ok(job)
    }

    /// Reset jobs stranded in `processing` by workers that died without
    /// finalizing. Attempts are preserved.
    ///
    /// `file_backed` holds the worker ids whose pid files still name a live
    /// process; the pid file is the authoritative liveness signal. Worker
    /// rows without a backing file are stale (e.g. the worker was killed
    /// outright) and are swept here, then any `processing` job whose owner
    /// is no longer live goes back to `pending`.
    ///
    /// Runs in a single immediate transaction and is idempotent; every
    /// worker performs this pass once at startup.
    pub fn reclaim_orphans(
        &mut self,
        now: i64,
        file_backed: &[String],
    ) -> Result<Vec<String>, StoreError> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let live: HashSet<&str> = file_backed.iter().map(String::as_str).collect();

        let mut stale_rows = Vec::<String>::new();
        {
            let mut stmt = tx.prepare("SELECT worker_id FROM workers")?;
            let mut rows = stmt.query([])?;
            while let Some(row) = rows.next()? {
                let worker_id: String = row.get(0)?;
                if !live.contains(worker_id.as_str()) {
                    stale_rows.push(worker_id);
                }
            }
        }
        for worker_id in &stale_rows {
            tx.execute("DELETE FROM workers WHERE worker_id=?1", params![worker_id])?;
        }

        let mut orphaned = Vec::<String>::new();
        {
            let mut stmt = tx.prepare("SELECT id, owner FROM jobs WHERE state='processing'")?;
            let mut rows = stmt.query([])?;
            while let Some(row) = rows.next()? {
                let id: String = row.get(0)?;
                let owner: Option<String> = row.get(1)?;
                let alive = owner.as_deref().is_some_and(|owner| live.contains(owner));
                if !alive {
                    orphaned.push(id);
                }
            }
        }

        for id in &orphaned {
            tx.execute(
                r#"
                UPDATE jobs
                SET state='pending', owner=NULL, updated_at=?2
                WHERE id=?1 AND state='processing'
                "#,
                params![id, now],
            )?;
        }

        tx.commit()?;
        Ok(orphaned)
    }
}

fn require_processing(tx: &rusqlite::Transaction<'_>, id: &str) -> Result<(), StoreError> {
    let state: Option<String> = tx
        .query_row("SELECT state FROM jobs WHERE id=?1", params![id], |row| {
            row.get(0)
        })
        .optional()?;
    match state {
        None => Err(StoreError::NotFound { id: id.to_string() }),
        Some(state) if state != JobState::Processing.as_str() => Err(StoreError::NotProcessing {
            id: id.to_string(),
            state,
        }),
        Some(_) => Ok(()),
    }
}
