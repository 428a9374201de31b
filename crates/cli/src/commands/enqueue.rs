#![forbid(unsafe_code)]

use crate::error::CliError;
use crate::now_ts;
use qc_core::spec::JobSpec;
use qc_storage::{InsertJobRequest, SqliteStore};
use std::path::Path;

pub fn run(storage_dir: &Path, raw: &str) -> Result<(), CliError> {
    let spec = JobSpec::parse(raw)?;

    let mut store = SqliteStore::open(storage_dir)?;
    let max_retries = match spec.max_retries {
        Some(value) => value,
        None => store.max_retries()?,
    };
    let id = match spec.id {
        Some(id) => id.trim().to_string(),
        None => uuid::Uuid::new_v4().to_string(),
    };

    let job = store.insert_job(InsertJobRequest {
        id,
        command: spec.command,
        max_retries,
        now: now_ts(),
    })?;
    println!("job enqueued with id: {}", job.id);
    Ok(())
}
