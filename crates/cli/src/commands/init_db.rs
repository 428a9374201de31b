#![forbid(unsafe_code)]

use crate::error::CliError;
use qc_storage::SqliteStore;
use std::path::Path;

pub fn run(storage_dir: &Path) -> Result<(), CliError> {
    let store = SqliteStore::open(storage_dir)?;
    println!("database initialized at: {}", store.db_path().display());
    Ok(())
}
