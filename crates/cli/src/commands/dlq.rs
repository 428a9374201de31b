#![forbid(unsafe_code)]

use crate::error::CliError;
use crate::now_ts;
use crate::output;
use qc_core::job::JobState;
use qc_storage::SqliteStore;
use std::path::Path;

pub fn list(storage_dir: &Path) -> Result<(), CliError> {
    let store = SqliteStore::open(storage_dir)?;
    let jobs = store.list_jobs(Some(JobState::Dead))?;
    if jobs.is_empty() {
        println!("dead letter queue is empty.");
        return Ok(());
    }
    println!("--- dead letter queue ({}) ---", jobs.len());
    output::print_jobs(&jobs);
    Ok(())
}

pub fn retry(storage_dir: &Path, id: &str) -> Result<(), CliError> {
    let mut store = SqliteStore::open(storage_dir)?;
    let job = store.dlq_retry(id, now_ts())?;
    println!("job '{}' moved from dead letter queue to pending", job.id);
    Ok(())
}
