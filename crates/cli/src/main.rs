#![forbid(unsafe_code)]

mod commands;
mod error;
mod output;
mod supervisor;

use error::CliError;
use std::path::{Path, PathBuf};

fn usage() -> &'static str {
    "queuectl — persistent background job queue\n\n\
USAGE:\n\
  queuectl [--storage-dir DIR] <command> [args]\n\n\
COMMANDS:\n\
  init-db                     initialize the job store\n\
  enqueue <json>              add a job, e.g. '{\"id\":\"job1\",\"command\":\"echo hi\"}'\n\
  list [--state STATE]        list jobs, optionally filtered by state\n\
  status                      job state counts and active worker count\n\
  dlq list                    list jobs in the dead letter queue\n\
  dlq retry <id>              move a dead job back to the pending queue\n\
  config get <key>            read a config value\n\
  config set <key> <value>    store a config value\n\
  worker start [--count N]    spawn worker processes (default 1)\n\
  worker stop                 stop all workers gracefully\n\n\
NOTES:\n\
  - the store lives in ~/.queuectl by default; override with\n\
    --storage-dir or QUEUECTL_STORAGE_DIR.\n\
  - config keys: max_retries, backoff_base_seconds, poll_interval_seconds.\n"
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

/// Unix seconds. Timestamps throughout the queue are second-granularity.
pub(crate) fn now_ts() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
        .min(i64::MAX as u64) as i64
}

fn usage_error(message: String) -> ! {
    eprintln!("{message}\n\n{}", usage());
    std::process::exit(2);
}

fn dispatch(storage_dir: &Path, command: &str, rest: &[String]) -> Result<(), CliError> {
    match command {
        "init-db" => {
            expect_no_args("init-db", rest);
            commands::init_db::run(storage_dir)
        }
        "enqueue" => {
            let [raw] = rest else {
                usage_error("enqueue requires exactly one JSON argument".to_string());
            };
            commands::enqueue::run(storage_dir, raw)
        }
        "list" => {
            let mut state: Option<&str> = None;
            let mut i = 0usize;
            while i < rest.len() {
                match rest[i].as_str() {
                    "--state" => {
                        i += 1;
                        let Some(value) = rest.get(i) else {
                            usage_error("--state requires a value".to_string());
                        };
                        state = Some(value.as_str());
                    }
                    other => usage_error(format!("Unknown arg: {other}")),
                }
                i += 1;
            }
            commands::list::run(storage_dir, state)
        }
        "status" => {
            expect_no_args("status", rest);
            commands::status::run(storage_dir)
        }
        "dlq" => match rest.first().map(String::as_str) {
            Some("list") => {
                expect_no_args("dlq list", &rest[1..]);
                commands::dlq::list(storage_dir)
            }
            Some("retry") => {
                let [id] = &rest[1..] else {
                    usage_error("dlq retry requires exactly one job id".to_string());
                };
                commands::dlq::retry(storage_dir, id)
            }
            _ => usage_error("dlq requires a subcommand: list | retry <id>".to_string()),
        },
        "config" => match rest.first().map(String::as_str) {
            Some("get") => {
                let [key] = &rest[1..] else {
                    usage_error("config get requires exactly one key".to_string());
                };
                commands::config::get(storage_dir, key)
            }
            Some("set") => {
                let [key, value] = &rest[1..] else {
                    usage_error("config set requires a key and a value".to_string());
                };
                commands::config::set(storage_dir, key, value)
            }
            _ => usage_error(
                "config requires a subcommand: get <key> | set <key> <value>".to_string(),
            ),
        },
        "worker" => match rest.first().map(String::as_str) {
            Some("start") => {
                let mut count: u32 = 1;
                let mut i = 1usize;
                while i < rest.len() {
                    match rest[i].as_str() {
                        "--count" => {
                            i += 1;
                            let Some(value) = rest.get(i) else {
                                usage_error("--count requires N".to_string());
                            };
                            count = match value.parse::<u32>() {
                                Ok(parsed) if parsed >= 1 => parsed,
                                _ => usage_error(
                                    "--count must be a positive integer".to_string(),
                                ),
                            };
                        }
                        other => usage_error(format!("Unknown arg: {other}")),
                    }
                    i += 1;
                }
                commands::worker::start(storage_dir, count)
            }
            Some("stop") => {
                expect_no_args("worker stop", &rest[1..]);
                commands::worker::stop(storage_dir)
            }
            _ => usage_error("worker requires a subcommand: start [--count N] | stop".to_string()),
        },
        other => usage_error(format!("Unknown command: {other}")),
    }
}

fn expect_no_args(command: &str, rest: &[String]) {
    if let Some(extra) = rest.first() {
        usage_error(format!("{command} takes no arguments (got '{extra}')"));
    }
}

fn main() {
    let mut args = std::env::args().skip(1).collect::<Vec<_>>();
    if args.iter().any(|a| a == "-h" || a == "--help") {
        print!("{}", usage());
        return;
    }

    let mut storage_dir: Option<PathBuf> = env_var("QUEUECTL_STORAGE_DIR").map(PathBuf::from);
    while args.first().map(String::as_str) == Some("--storage-dir") {
        args.remove(0);
        if args.is_empty() {
            usage_error("--storage-dir requires DIR".to_string());
        }
        storage_dir = Some(PathBuf::from(args.remove(0)));
    }
    let storage_dir = storage_dir.unwrap_or_else(default_storage_dir);

    let Some(command) = args.first().cloned() else {
        usage_error("no command given".to_string());
    };

    if let Err(err) = dispatch(&storage_dir, &command, &args[1..]) {
        eprintln!("error: {err}");
        std::process::exit(err.exit_code());
    }
}
