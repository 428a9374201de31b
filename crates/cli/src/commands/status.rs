#![forbid(unsafe_code)]

use crate::error::CliError;
use crate::supervisor;
use qc_storage::SqliteStore;
use std::path::Path;

pub fn run(storage_dir: &Path) -> Result<(), CliError> {
    let store = SqliteStore::open(storage_dir)?;
    let counts = store.count_by_state()?;
    let active_workers = supervisor::active_worker_count(storage_dir)?;

    println!("--- queue status ---");
    println!("active workers: {active_workers}");
    println!("pending:        {}", counts.pending);
    println!("processing:     {}", counts.processing);
    println!("completed:      {}", counts.completed);
    println!("dead (dlq):     {}", counts.dead);
    Ok(())
}
