#![forbid(unsafe_code)]

use crate::error::CliError;
use crate::supervisor;
use std::path::Path;

pub fn start(storage_dir: &Path, count: u32) -> Result<(), CliError> {
    let pids = supervisor::start_workers(storage_dir, count)?;
    println!("started {} worker(s)", pids.len());
    println!("they run in the background; use 'queuectl worker stop' to stop them.");
    Ok(())
}

pub fn stop(storage_dir: &Path) -> Result<(), CliError> {
    let stopped = supervisor::stop_workers(storage_dir)?;
    if stopped.is_empty() {
        println!("no active workers found.");
    } else {
        println!("all {} worker(s) stopped gracefully.", stopped.len());
    }
    Ok(())
}
