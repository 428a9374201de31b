#![forbid(unsafe_code)]

use crate::error::CliError;
use crate::output;
use qc_core::job::JobState;
use qc_storage::SqliteStore;
use std::path::Path;

pub fn run(storage_dir: &Path, state: Option<&str>) -> Result<(), CliError> {
    let store = SqliteStore::open(storage_dir)?;

    match state {
        Some(raw) => {
            let state = JobState::parse(raw)?;
            let jobs = store.list_jobs(Some(state))?;
            output::print_jobs(&jobs);
        }
        None => {
            println!("listing all jobs (use --state to filter):");
            for state in JobState::ALL {
                let jobs = store.list_jobs(Some(state))?;
                if jobs.is_empty() {
                    continue;
                }
                println!();
                println!("--- {} ({}) ---", state, jobs.len());
                output::print_jobs(&jobs);
            }
        }
    }
    Ok(())
}
