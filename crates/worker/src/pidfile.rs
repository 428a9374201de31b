#![forbid(unsafe_code)]
//! Process-identity files: `<storage_dir>/workers/worker.<pid>.pid`.
//!
//! The pid file is the supervisor's liveness signal and, together with the
//! worker table, feeds orphan recovery. A file whose process is gone is
//! stale and removed whenever it is observed.

use nix::sys::signal::{Signal, kill};
use nix::unistd::Pid;
use std::path::{Path, PathBuf};

pub const WORKERS_DIRNAME: &str = "workers";

pub fn workers_dir(storage_dir: &Path) -> PathBuf {
    storage_dir.join(WORKERS_DIRNAME)
}

pub fn pid_file_path(workers_dir: &Path, pid: u32) -> PathBuf {
    workers_dir.join(format!("worker.{pid}.pid"))
}

fn parse_pid_file_name(name: &str) -> Option<u32> {
    let rest = name.strip_prefix("worker.")?;
    let digits = rest.strip_suffix(".pid")?;
    digits.parse::<u32>().ok()
}

/// Signal-0 probe. EPERM still means "something is running there".
pub fn process_alive(pid: u32) -> bool {
    let Ok(pid) = i32::try_from(pid) else {
        return false;
    };
    match kill(Pid::from_raw(pid), None::<Signal>) {
        Ok(()) => true,
        Err(nix::errno::Errno::EPERM) => true,
        Err(_) => false,
    }
}

/// Pids of workers whose identity file names a live process. Stale files
/// (process gone, or an unparseable name) are unlinked as a side effect.
pub fn live_worker_pids(workers_dir: &Path) -> std::io::Result<Vec<u32>> {
    let mut pids = Vec::<u32>::new();
    let entries = match std::fs::read_dir(workers_dir) {
        Ok(entries) => entries,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(pids),
        Err(err) => return Err(err),
    };

    for entry in entries {
        let entry = entry?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        match parse_pid_file_name(name) {
            Some(pid) if process_alive(pid) => pids.push(pid),
            Some(_) | None => {
                let _ = std::fs::remove_file(entry.path());
            }
        }
    }

    pids.sort_unstable();
    Ok(pids)
}

/// RAII handle for this worker's own identity file. Dropping it removes the
/// file, which covers every orderly exit path including the signal-driven
/// one (the handler only sets a flag; the loop unwinds normally).
#[derive(Debug)]
pub struct PidFile {
    path: PathBuf,
}

impl PidFile {
    pub fn create(workers_dir: &Path, pid: u32) -> std::io::Result<Self> {
        std::fs::create_dir_all(workers_dir)?;
        let path = pid_file_path(workers_dir, pid);
        std::fs::write(&path, pid.to_string())?;
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for PidFile {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}
