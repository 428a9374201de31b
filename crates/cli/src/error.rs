#![forbid(unsafe_code)]

use qc_storage::StoreError;

#[derive(Debug)]
pub enum CliError {
    Store(StoreError),
    BadInput(String),
    Spawn(String),
    Io(std::io::Error),
    StopTimeout { stuck: Vec<u32> },
}

impl CliError {
    /// 2 is a usage/input problem the caller can fix by editing the
    /// invocation; 1 is an operational failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::BadInput(_) => 2,
            _ => 1,
        }
    }
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Store(err) => write!(f, "{err}"),
            Self::BadInput(message) => write!(f, "{message}"),
            Self::Spawn(message) => write!(f, "{message}"),
            Self::Io(err) => write!(f, "io: {err}"),
            Self::StopTimeout { stuck } => {
                let pids = stuck
                    .iter()
                    .map(|pid| pid.to_string())
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(f, "workers did not stop within the deadline: pids {pids}")
            }
        }
    }
}

impl std::error::Error for CliError {}

impl From<StoreError> for CliError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

impl From<std::io::Error> for CliError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<qc_core::spec::SpecError> for CliError {
    fn from(value: qc_core::spec::SpecError) -> Self {
        Self::BadInput(value.to_string())
    }
}

impl From<qc_core::job::UnknownState> for CliError {
    fn from(value: qc_core::job::UnknownState) -> Self {
        Self::BadInput(value.to_string())
    }
}
