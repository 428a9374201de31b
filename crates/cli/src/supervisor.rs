#![forbid(unsafe_code)]
//! Worker process supervision. The supervisor is transient: it spawns
//! detached workers or signals the live ones, then exits. Liveness is read
//! from the pid files, never guessed.

use crate::error::CliError;
use nix::sys::signal::{Signal, kill};
use nix::unistd::Pid;
use qc_worker::pidfile;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

const WORKER_BIN: &str = "queuectl-worker";
const WORKER_LOG: &str = "worker.log";
const STOP_DEADLINE: Duration = Duration::from_secs(30);
const STOP_POLL: Duration = Duration::from_millis(500);

/// The worker binary ships next to `queuectl`; fall back to PATH lookup when
/// the sibling is missing (e.g. split installs).
fn worker_bin() -> PathBuf {
    let cli_bin = std::env::current_exe().unwrap_or_else(|_| PathBuf::from("queuectl"));
    cli_bin
        .parent()
        .map(|dir| dir.join(WORKER_BIN))
        .filter(|p| p.exists())
        .unwrap_or_else(|| PathBuf::from(WORKER_BIN))
}

/// Spawn `count` detached workers. Their stdio is appended to the shared
/// worker log so the CLI can return immediately without orphaning output.
pub fn start_workers(storage_dir: &Path, count: u32) -> Result<Vec<u32>, CliError> {
    std::fs::create_dir_all(storage_dir)?;
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(storage_dir.join(WORKER_LOG))?;

    let worker_bin = worker_bin();
    let mut pids = Vec::<u32>::new();
    for _ in 0..count {
        let child = Command::new(&worker_bin)
            .arg("--storage-dir")
            .arg(storage_dir)
            .stdin(Stdio::null())
            .stdout(log_file.try_clone()?)
            .stderr(log_file.try_clone()?)
            .spawn()
            .map_err(|err| {
                CliError::Spawn(format!(
                    "failed to spawn worker ({}): {err}",
                    worker_bin.display()
                ))
            })?;
        pids.push(child.id());
    }
    Ok(pids)
}

/// Politely stop every live worker and wait (bounded) for their pid files
/// to disappear. Returns the stopped pids; workers that outlive the
/// deadline surface as `StopTimeout`.
pub fn stop_workers(storage_dir: &Path) -> Result<Vec<u32>, CliError> {
    let workers_dir = pidfile::workers_dir(storage_dir);
    let pids = pidfile::live_worker_pids(&workers_dir)?;
    if pids.is_empty() {
        return Ok(pids);
    }

    for pid in &pids {
        let _ = kill(Pid::from_raw(*pid as i32), Signal::SIGTERM);
    }

    let deadline = Instant::now() + STOP_DEADLINE;
    loop {
        let remaining = pidfile::live_worker_pids(&workers_dir)?;
        if remaining.is_empty() {
            return Ok(pids);
        }
        if Instant::now() >= deadline {
            return Err(CliError::StopTimeout { stuck: remaining });
        }
        std::thread::sleep(STOP_POLL);
    }
}

/// Count of workers whose pid file names a live process. Stale files are
/// cleaned up by the scan itself.
pub fn active_worker_count(storage_dir: &Path) -> Result<usize, CliError> {
    let workers_dir = pidfile::workers_dir(storage_dir);
    Ok(pidfile::live_worker_pids(&workers_dir)?.len())
}
