#![forbid(unsafe_code)]

use crate::executor;
use crate::{WorkerError, now_ts};
use qc_core::retry;
use qc_storage::{FinalizeFailureRequest, JobRow, SqliteStore};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

// The store already waits on its busy timeout; these retries only cover the
// case where that expires under sustained contention.
const BUSY_RETRY_SLEEP: Duration = Duration::from_millis(50);
const FINALIZE_BUSY_RETRIES: u32 = 20;

// Idle sleeps are chunked so a termination request is noticed promptly even
// mid-interval.
const SLEEP_SLICE: Duration = Duration::from_millis(100);

pub struct WorkerRuntime {
    store: SqliteStore,
    worker_id: String,
    poll_interval: Duration,
    shutdown: Arc<AtomicBool>,
}

impl WorkerRuntime {
    pub fn new(
        store: SqliteStore,
        worker_id: String,
        poll_interval: Duration,
        shutdown: Arc<AtomicBool>,
    ) -> Self {
        Self {
            store,
            worker_id,
            poll_interval,
            shutdown,
        }
    }

    pub fn worker_id(&self) -> &str {
        &self.worker_id
    }

    pub fn store_mut(&mut self) -> &mut SqliteStore {
        &mut self.store
    }

    /// Poll until a graceful stop is requested. A job claimed before the
    /// request was observed is still executed and finalized; the in-flight
    /// command is never interrupted.
    pub fn run(&mut self) -> Result<(), WorkerError> {
        while !self.shutdown.load(Ordering::SeqCst) {
            let claimed = self.claim()?;
            let Some(job) = claimed else {
                self.idle_sleep();
                continue;
            };
            self.process(job)?;
        }
        Ok(())
    }

    /// One poll pass: claim at most one job and run it. Returns whether a
    /// job was processed.
    pub fn run_once(&mut self) -> Result<bool, WorkerError> {
        match self.claim()? {
            Some(job) => {
                self.process(job)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn claim(&mut self) -> Result<Option<JobRow>, WorkerError> {
        match self.store.claim_next(&self.worker_id, now_ts()) {
            Ok(job) => Ok(job),
            // Contended write lock: behave as if the queue was empty and let
            // the next poll try again.
            Err(err) if err.is_busy() => {
                std::thread::sleep(BUSY_RETRY_SLEEP);
                Ok(None)
            }
            Err(err) => Err(err.into()),
        }
    }

    fn process(&mut self, job: JobRow) -> Result<(), WorkerError> {
        println!(
            "processing job {} (attempt {})",
            job.id,
            job.attempts + 1
        );

        match executor::run_shell(&job.command) {
            Ok(output) if output.success() => {
                self.finalize_success(&job)?;
                println!("job {} completed", job.id);
            }
            Ok(output) => {
                self.finalize_failure(&job, output.error_summary())?;
            }
            // Infrastructure failure launching the command is still a failure
            // outcome for the job, never fatal for the worker.
            Err(err) => {
                self.finalize_failure(&job, err.to_string())?;
            }
        }
        Ok(())
    }

    fn finalize_success(&mut self, job: &JobRow) -> Result<(), WorkerError> {
        with_busy_retry(|| self.store.finalize_success(&job.id, now_ts()))?;
        Ok(())
    }

    fn finalize_failure(&mut self, job: &JobRow, error: String) -> Result<(), WorkerError> {
        let backoff_base = self.store.backoff_base_seconds()?;
        let attempts_so_far = job.attempts + 1;
        let decision = retry::after_failure(attempts_so_far, job.max_retries, backoff_base);

        let updated = with_busy_retry(|| {
            self.store.finalize_failure(FinalizeFailureRequest {
                id: job.id.clone(),
                error: error.clone(),
                decision,
                now: now_ts(),
            })
        })?;

        match decision {
            retry::RetryDecision::Retry { delay_seconds } => {
                println!(
                    "job {} failed (attempt {attempts_so_far}), retrying in {delay_seconds}s: {error}",
                    job.id
                );
            }
            retry::RetryDecision::Dead => {
                println!(
                    "job {} moved to dead letter queue after {} attempts: {error}",
                    job.id, updated.attempts
                );
            }
        }
        Ok(())
    }

    fn idle_sleep(&self) {
        let mut remaining = self.poll_interval;
        while !remaining.is_zero() {
            if self.shutdown.load(Ordering::SeqCst) {
                return;
            }
            let slice = remaining.min(SLEEP_SLICE);
            std::thread::sleep(slice);
            remaining -= slice;
        }
    }
}

fn with_busy_retry<T>(
    mut op: impl FnMut() -> Result<T, qc_storage::StoreError>,
) -> Result<T, qc_storage::StoreError> {
    let mut attempts = 0u32;
    loop {
        match op() {
            Err(err) if err.is_busy() && attempts < FINALIZE_BUSY_RETRIES => {
                attempts += 1;
                std::thread::sleep(BUSY_RETRY_SLEEP);
            }
            other => return other,
        }
    }
}
