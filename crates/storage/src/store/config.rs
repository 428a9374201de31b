#![forbid(unsafe_code)]

use super::SqliteStore;
use super::error::StoreError;
use qc_core::config::ConfigKey;
use rusqlite::{OptionalExtension, params};

fn validate_value(key: ConfigKey, value: &str) -> Result<(), StoreError> {
    let value = value.trim();
    match key {
        ConfigKey::MaxRetries => {
            value.parse::<u32>().map_err(|_| {
                StoreError::BadConfig(format!(
                    "{key} must be a non-negative integer, got '{value}'"
                ))
            })?;
        }
        ConfigKey::BackoffBaseSeconds | ConfigKey::PollIntervalSeconds => {
            let parsed = value.parse::<u64>().map_err(|_| {
                StoreError::BadConfig(format!("{key} must be a positive integer, got '{value}'"))
            })?;
            if parsed == 0 {
                return Err(StoreError::BadConfig(format!(
                    "{key} must be a positive integer, got '{value}'"
                )));
            }
        }
    }
    Ok(())
}

impl SqliteStore {
    pub fn get_config(&self, key: ConfigKey) -> Result<String, StoreError> {
        let stored: Option<String> = self
            .conn
            .query_row(
                "SELECT value FROM config WHERE key=?1",
                params![key.as_str()],
                |row| row.get(0),
            )
            .optional()?;
        Ok(stored.unwrap_or_else(|| key.default_value().to_string()))
    }

    pub fn set_config(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        let Some(key) = ConfigKey::parse(key) else {
            return Err(StoreError::BadConfig(format!("unknown config key: {key}")));
        };
        validate_value(key, value)?;

        self.conn.execute(
            "INSERT OR REPLACE INTO config(key, value) VALUES (?1, ?2)",
            params![key.as_str(), value.trim()],
        )?;
        Ok(())
    }

    pub fn max_retries(&self) -> Result<u32, StoreError> {
        let raw = self.get_config(ConfigKey::MaxRetries)?;
        raw.parse::<u32>()
            .map_err(|_| StoreError::BadConfig(format!("stored max_retries is invalid: '{raw}'")))
    }

    pub fn backoff_base_seconds(&self) -> Result<u64, StoreError> {
        let raw = self.get_config(ConfigKey::BackoffBaseSeconds)?;
        raw.parse::<u64>().map_err(|_| {
            StoreError::BadConfig(format!("stored backoff_base_seconds is invalid: '{raw}'"))
        })
    }

    pub fn poll_interval_seconds(&self) -> Result<u64, StoreError> {
        let raw = self.get_config(ConfigKey::PollIntervalSeconds)?;
        raw.parse::<u64>().map_err(|_| {
            StoreError::BadConfig(format!("stored poll_interval_seconds is invalid: '{raw}'"))
        })
    }
}
