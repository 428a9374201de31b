#![forbid(unsafe_code)]

use qc_storage::JobRow;
use serde_json::{Value, json};

/// Render a job the way the wire format defines it: every field, timestamps
/// as integer seconds.
pub fn job_json(job: &JobRow) -> Value {
    json!({
        "id": job.id,
        "command": job.command,
        "state": job.state.as_str(),
        "attempts": job.attempts,
        "max_retries": job.max_retries,
        "next_run_at": job.next_run_at,
        "last_error": job.last_error,
        "owner": job.owner,
        "created_at": job.created_at,
        "updated_at": job.updated_at,
    })
}

pub fn print_jobs(jobs: &[JobRow]) {
    for job in jobs {
        let rendered = serde_json::to_string_pretty(&job_json(job))
            .unwrap_or_else(|_| "{}".to_string());
        println!("{rendered}");
    }
}
