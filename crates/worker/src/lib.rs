#![forbid(unsafe_code)]
//! Worker process runtime: the poll/claim/execute/finalize loop, the shell
//! command executor, and the pid-file protocol the supervisor uses to find
//! and signal live workers.

pub mod executor;
pub mod pidfile;
pub mod runtime;

use qc_storage::StoreError;

#[derive(Debug)]
pub enum WorkerError {
    Store(StoreError),
    Io(std::io::Error),
}

impl std::fmt::Display for WorkerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Store(err) => write!(f, "store: {err}"),
            Self::Io(err) => write!(f, "io: {err}"),
        }
    }
}

impl std::error::Error for WorkerError {}

impl From<StoreError> for WorkerError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

impl From<std::io::Error> for WorkerError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

/// Unix seconds. Timestamps throughout the queue are second-granularity.
pub fn now_ts() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
        .min(i64::MAX as u64) as i64
}
