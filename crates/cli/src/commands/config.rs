#![forbid(unsafe_code)]

use crate::error::CliError;
use qc_core::config::ConfigKey;
use qc_storage::SqliteStore;
use std::path::Path;

pub fn get(storage_dir: &Path, key: &str) -> Result<(), CliError> {
    let Some(key) = ConfigKey::parse(key) else {
        return Err(CliError::BadInput(format!("unknown config key: {key}")));
    };
    let store = SqliteStore::open(storage_dir)?;
    let value = store.get_config(key)?;
    println!("{key} = {value}");
    Ok(())
}

pub fn set(storage_dir: &Path, key: &str, value: &str) -> Result<(), CliError> {
    if ConfigKey::parse(key).is_none() {
        return Err(CliError::BadInput(format!("unknown config key: {key}")));
    }
    let mut store = SqliteStore::open(storage_dir)?;
    store.set_config(key, value)?;
    println!("config updated: {key} = {value}");
    Ok(())
}
