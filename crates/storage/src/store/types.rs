#![forbid(unsafe_code)]

use qc_core::job::JobState;

#[derive(Clone, Debug)]
pub struct JobRow {
    pub id: String,
    pub command: String,
    pub state: JobState,
    pub attempts: u32,
    pub max_retries: u32,
    pub next_run_at: i64,
    pub last_error: Option<String>,
    pub owner: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Clone, Debug)]
pub struct InsertJobRequest {
    pub id: String,
    pub command: String,
    pub max_retries: u32,
    pub now: i64,
}

#[derive(Clone, Debug)]
pub struct FinalizeFailureRequest {
    pub id: String,
    pub error: String,
    pub decision: qc_core::retry::RetryDecision,
    pub now: i64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StateCounts {
    pub pending: u64,
    pub processing: u64,
    pub completed: u64,
    pub dead: u64,
}

impl StateCounts {
    pub fn get(&self, state: JobState) -> u64 {
        match state {
            JobState::Pending => self.pending,
            JobState::Processing => self.processing,
            JobState::Completed => self.completed,
            JobState::Dead => self.dead,
        }
    }

    pub fn total(&self) -> u64 {
        self.pending + self.processing + self.completed + self.dead
    }
}

#[derive(Clone, Debug)]
pub struct WorkerRow {
    pub worker_id: String,
    pub started_at: i64,
}
