#![forbid(unsafe_code)]

pub mod job {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub enum JobState {
        Pending,
        Processing,
        Completed,
        Dead,
    }

    impl JobState {
        pub const ALL: [JobState; 4] = [
            JobState::Pending,
            JobState::Processing,
            JobState::Completed,
            JobState::Dead,
        ];

        pub fn as_str(self) -> &'static str {
            match self {
                JobState::Pending => "pending",
                JobState::Processing => "processing",
                JobState::Completed => "completed",
                JobState::Dead => "dead",
            }
        }

        pub fn parse(raw: &str) -> Result<Self, UnknownState> {
            match raw.trim().to_ascii_lowercase().as_str() {
                "pending" => Ok(JobState::Pending),
                "processing" => Ok(JobState::Processing),
                "completed" => Ok(JobState::Completed),
                "dead" => Ok(JobState::Dead),
                other => Err(UnknownState(other.to_string())),
            }
        }
    }

    impl std::fmt::Display for JobState {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str(self.as_str())
        }
    }

    #[derive(Clone, Debug, PartialEq, Eq)]
    pub struct UnknownState(pub String);

    impl std::fmt::Display for UnknownState {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(
                f,
                "unknown job state: {} (expected pending|processing|completed|dead)",
                self.0
            )
        }
    }

    impl std::error::Error for UnknownState {}
}

pub mod spec {
    use serde::Deserialize;

    const MAX_ID_LEN: usize = 200;

    /// Enqueue payload. The schema is fixed: anything beyond `id`, `command`,
    /// and `max_retries` is rejected so downstream code only ever sees a
    /// validated value.
    #[derive(Clone, Debug, Deserialize)]
    #[serde(deny_unknown_fields)]
    pub struct JobSpec {
        #[serde(default)]
        pub id: Option<String>,
        pub command: String,
        #[serde(default)]
        pub max_retries: Option<u32>,
    }

    impl JobSpec {
        pub fn parse(raw: &str) -> Result<Self, SpecError> {
            let spec: JobSpec = serde_json::from_str(raw)
                .map_err(|err| SpecError::BadInput(err.to_string()))?;
            if spec.command.trim().is_empty() {
                return Err(SpecError::BadInput(
                    "'command' must not be empty".to_string(),
                ));
            }
            if let Some(id) = spec.id.as_deref() {
                let id = id.trim();
                if id.is_empty() {
                    return Err(SpecError::BadInput("'id' must not be empty".to_string()));
                }
                if id.len() > MAX_ID_LEN {
                    return Err(SpecError::BadInput("'id' is too long".to_string()));
                }
            }
            Ok(spec)
        }
    }

    #[derive(Clone, Debug, PartialEq, Eq)]
    pub enum SpecError {
        BadInput(String),
    }

    impl std::fmt::Display for SpecError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            match self {
                Self::BadInput(message) => write!(f, "invalid job spec: {message}"),
            }
        }
    }

    impl std::error::Error for SpecError {}
}

pub mod retry {
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub enum RetryDecision {
        Retry { delay_seconds: u64 },
        Dead,
    }

    /// Decide what happens to a job after a failed attempt.
    ///
    /// `attempts_so_far` counts completed attempts including the one that
    /// just failed, so the first failure yields a delay of `base^1`. A job
    /// is permitted `max_retries + 1` attempts in total.
    pub fn after_failure(
        attempts_so_far: u32,
        max_retries: u32,
        backoff_base_seconds: u64,
    ) -> RetryDecision {
        if attempts_so_far > max_retries {
            RetryDecision::Dead
        } else {
            RetryDecision::Retry {
                delay_seconds: backoff_base_seconds.saturating_pow(attempts_so_far),
            }
        }
    }
}

pub mod config {
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub enum ConfigKey {
        MaxRetries,
        BackoffBaseSeconds,
        PollIntervalSeconds,
    }

    impl ConfigKey {
        pub const ALL: [ConfigKey; 3] = [
            ConfigKey::MaxRetries,
            ConfigKey::BackoffBaseSeconds,
            ConfigKey::PollIntervalSeconds,
        ];

        pub fn as_str(self) -> &'static str {
            match self {
                ConfigKey::MaxRetries => "max_retries",
                ConfigKey::BackoffBaseSeconds => "backoff_base_seconds",
                ConfigKey::PollIntervalSeconds => "poll_interval_seconds",
            }
        }

        pub fn parse(raw: &str) -> Option<Self> {
            match raw.trim() {
                "max_retries" => Some(ConfigKey::MaxRetries),
                "backoff_base_seconds" => Some(ConfigKey::BackoffBaseSeconds),
                "poll_interval_seconds" => Some(ConfigKey::PollIntervalSeconds),
                _ => None,
            }
        }

        pub fn default_value(self) -> &'static str {
            match self {
                ConfigKey::MaxRetries => "3",
                ConfigKey::BackoffBaseSeconds => "2",
                ConfigKey::PollIntervalSeconds => "1",
            }
        }
    }

    impl std::fmt::Display for ConfigKey {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str(self.as_str())
        }
    }
}
