#![forbid(unsafe_code)]

use rusqlite::ErrorCode;

#[derive(Debug)]
pub enum StoreError {
    Io(std::io::Error),
    Sql(rusqlite::Error),
    InvalidInput(&'static str),
    DuplicateId {
        id: String,
    },
    NotFound {
        id: String,
    },
    NotInDlq {
        id: String,
        state: String,
    },
    NotProcessing {
        id: String,
        state: String,
    },
    BadConfig(String),
}

impl StoreError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Io(_) | Self::Sql(_) => "INTERNAL",
            Self::InvalidInput(_) => "INVALID_INPUT",
            Self::DuplicateId { .. } => "DUPLICATE_ID",
            Self::NotFound { .. } => "NOT_FOUND",
            Self::NotInDlq { .. } => "NOT_IN_DLQ",
            Self::NotProcessing { .. } => "NOT_PROCESSING",
            Self::BadConfig(_) => "BAD_CONFIG",
        }
    }

    /// Write-lock contention. Callers holding a polling loop treat this as
    /// "try again after a short sleep", not as a fatal store failure.
    pub fn is_busy(&self) -> bool {
        match self {
            Self::Sql(rusqlite::Error::SqliteFailure(err, _)) => matches!(
                err.code,
                ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked
            ),
            _ => false,
        }
    }
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "io: {err}"),
            Self::Sql(err) => write!(f, "sqlite: {err}"),
            Self::InvalidInput(message) => write!(f, "invalid input: {message}"),
            Self::DuplicateId { id } => write!(f, "a job with id '{id}' already exists"),
            Self::NotFound { id } => write!(f, "job not found: {id}"),
            Self::NotInDlq { id, state } => {
                write!(f, "job '{id}' is not in the dead letter queue (state={state})")
            }
            Self::NotProcessing { id, state } => {
                write!(f, "job '{id}' is not processing (state={state})")
            }
            Self::BadConfig(message) => write!(f, "bad config: {message}"),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<std::io::Error> for StoreError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sql(value)
    }
}
