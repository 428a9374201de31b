#![forbid(unsafe_code)]

use qc_storage::SqliteStore;
use qc_worker::pidfile::{self, PidFile};
use qc_worker::runtime::WorkerRuntime;
use qc_worker::{WorkerError, now_ts};
use signal_hook::consts::{SIGINT, SIGTERM};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::time::Duration;

#[derive(Debug)]
struct WorkerConfig {
    storage_dir: PathBuf,
    poll_s: Option<u64>,
    once: bool,
}

fn usage() -> &'static str {
    "queuectl-worker — job queue worker process\n\n\
USAGE:\n\
  queuectl-worker [--storage-dir DIR] [--poll-s S] [--once]\n\n\
NOTES:\n\
  - claims jobs from the shared store and executes them via `sh -c`.\n\
  - SIGTERM requests a graceful stop; an in-flight job is finished first.\n\
  - `--poll-s` overrides the stored poll_interval_seconds.\n\
  - `--once` runs a single poll/execute pass (smoke test).\n"
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn default_storage_dir() -> PathBuf {
    dirs::home_dir()
        .map(|home| home.join(".queuectl"))
        .unwrap_or_else(|| PathBuf::from(".queuectl"))
}

fn parse_args() -> Result<WorkerConfig, String> {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    if args.iter().any(|a| a == "-h" || a == "--help") {
        print!("{}", usage());
        std::process::exit(0);
    }

    let mut storage_dir: Option<PathBuf> = env_var("QUEUECTL_STORAGE_DIR").map(PathBuf::from);
    let mut poll_s: Option<u64> = env_var("QUEUECTL_POLL_S").and_then(|v| v.parse().ok());
    let mut once = false;

    let mut i = 0usize;
    while i < args.len() {
        let a = args[i].as_str();
        match a {
            "--storage-dir" => {
                i += 1;
                let v = args.get(i).ok_or("--storage-dir requires DIR")?;
                storage_dir = Some(PathBuf::from(v));
            }
            "--poll-s" => {
                i += 1;
                let v = args.get(i).ok_or("--poll-s requires S")?;
                let parsed = v
                    .parse::<u64>()
                    .map_err(|_| "--poll-s must be an integer (seconds)")?;
                if parsed == 0 {
                    return Err("--poll-s must be positive".to_string());
                }
                poll_s = Some(parsed);
            }
            "--once" => once = true,
            other => return Err(format!("Unknown arg: {other}\n\n{}", usage())),
        }
        i += 1;
    }

    Ok(WorkerConfig {
        storage_dir: storage_dir.unwrap_or_else(default_storage_dir),
        poll_s,
        once,
    })
}

fn run(cfg: WorkerConfig) -> Result<(), WorkerError> {
    let shutdown = Arc::new(AtomicBool::new(false));
    signal_hook::flag::register(SIGTERM, Arc::clone(&shutdown))?;
    // The interactive interrupt is ignored; stop requests arrive as SIGTERM.
    signal_hook::flag::register(SIGINT, Arc::new(AtomicBool::new(false)))?;

    let mut store = SqliteStore::open(&cfg.storage_dir)?;
    let pid = std::process::id();
    let worker_id = pid.to_string();
    let poll_interval = match cfg.poll_s {
        Some(seconds) => Duration::from_secs(seconds),
        None => Duration::from_secs(store.poll_interval_seconds()?),
    };

    // Pid file first, then the table row: the file is the authoritative
    // liveness signal, and a row without one is swept as stale.
    let workers_dir = pidfile::workers_dir(&cfg.storage_dir);
    let _pid_file = PidFile::create(&workers_dir, pid)?;
    store.register_worker(&worker_id, now_ts())?;

    // Repair jobs stranded by workers that died without finalizing. The pid
    // files we just scanned are the file-backed half of the liveness check.
    let file_backed: Vec<String> = pidfile::live_worker_pids(&workers_dir)?
        .into_iter()
        .map(|pid| pid.to_string())
        .collect();
    let reclaimed = store.reclaim_orphans(now_ts(), &file_backed)?;
    if !reclaimed.is_empty() {
        println!(
            "reclaimed {} orphaned job(s): {}",
            reclaimed.len(),
            reclaimed.join(", ")
        );
    }

    println!("worker started (pid {pid})");
    let mut runtime = WorkerRuntime::new(store, worker_id.clone(), poll_interval, shutdown);
    let result = if cfg.once {
        runtime.run_once().map(|_| ())
    } else {
        runtime.run()
    };

    if let Err(err) = runtime.store_mut().unregister_worker(&worker_id) {
        eprintln!("failed to unregister worker {worker_id}: {err}");
    }
    println!("worker stopped (pid {pid})");
    result
}

fn main() {
    let cfg = match parse_args() {
        Ok(cfg) => cfg,
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(2);
        }
    };

    if let Err(err) = run(cfg) {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
