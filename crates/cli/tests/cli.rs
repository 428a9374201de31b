#![forbid(unsafe_code)]

use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::time::{Duration, Instant};

fn temp_dir(test_name: &str) -> PathBuf {
    let base = std::env::temp_dir();
    let pid = std::process::id();
    let nonce = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let dir = base.join(format!("qc_cli_{test_name}_{pid}_{nonce}"));
    std::fs::create_dir_all(&dir).expect("create temp dir");
    dir
}

fn queuectl(storage_dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_queuectl"))
        .arg("--storage-dir")
        .arg(storage_dir)
        .args(args)
        .output()
        .expect("run queuectl")
}

/// The worker binary is built into the same target directory as the CLI.
fn worker_bin() -> PathBuf {
    Path::new(env!("CARGO_BIN_EXE_queuectl"))
        .parent()
        .expect("target dir")
        .join("queuectl-worker")
}

fn run_worker_once(storage_dir: &Path) {
    let status = Command::new(worker_bin())
        .arg("--storage-dir")
        .arg(storage_dir)
        .arg("--once")
        .status()
        .expect("run queuectl-worker --once");
    assert!(status.success(), "worker --once failed");
}

/// Stops any workers left behind when a test panics mid-flight.
struct StopWorkersOnDrop {
    dir: PathBuf,
}

impl Drop for StopWorkersOnDrop {
    fn drop(&mut self) {
        let _ = queuectl(&self.dir, &["worker", "stop"]);
    }
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn init_db_is_idempotent() {
    let dir = temp_dir("init_db_idempotent");

    let first = queuectl(&dir, &["init-db"]);
    assert!(first.status.success(), "{}", stderr(&first));
    assert!(stdout(&first).contains("queue.db"));

    let second = queuectl(&dir, &["init-db"]);
    assert!(second.status.success(), "{}", stderr(&second));
}

#[test]
fn enqueue_then_list_shows_the_pending_job() {
    let dir = temp_dir("enqueue_then_list");

    let out = queuectl(&dir, &["enqueue", r#"{"id":"job-1","command":"echo hi"}"#]);
    assert!(out.status.success(), "{}", stderr(&out));
    assert!(stdout(&out).contains("job-1"));

    let out = queuectl(&dir, &["list", "--state", "pending"]);
    assert!(out.status.success());
    assert!(stdout(&out).contains("\"job-1\""));
    assert!(stdout(&out).contains("\"echo hi\""));

    let out = queuectl(&dir, &["list", "--state", "completed"]);
    assert!(out.status.success());
    assert!(!stdout(&out).contains("job-1"));
}

#[test]
fn enqueue_rejects_duplicates_and_bad_input() {
    let dir = temp_dir("enqueue_rejects");

    let out = queuectl(&dir, &["enqueue", r#"{"id":"job-1","command":"true"}"#]);
    assert!(out.status.success(), "{}", stderr(&out));

    let dup = queuectl(&dir, &["enqueue", r#"{"id":"job-1","command":"true"}"#]);
    assert!(!dup.status.success());
    assert!(stderr(&dup).contains("already exists"));

    let bad_json = queuectl(&dir, &["enqueue", "not json"]);
    assert_eq!(bad_json.status.code(), Some(2));

    let missing_command = queuectl(&dir, &["enqueue", r#"{"id":"job-2"}"#]);
    assert_eq!(missing_command.status.code(), Some(2));

    let unknown_field = queuectl(&dir, &["enqueue", r#"{"command":"true","nice":1}"#]);
    assert_eq!(unknown_field.status.code(), Some(2));
}

#[test]
fn list_rejects_unknown_state() {
    let dir = temp_dir("list_rejects_state");
    let out = queuectl(&dir, &["list", "--state", "sideways"]);
    assert_eq!(out.status.code(), Some(2));
    assert!(stderr(&out).contains("unknown job state"));
}

#[test]
fn worker_once_completes_an_echo_job() {
    let dir = temp_dir("worker_once_completes");

    let out = queuectl(&dir, &["enqueue", r#"{"id":"job-ok","command":"echo hi"}"#]);
    assert!(out.status.success(), "{}", stderr(&out));

    run_worker_once(&dir);

    let out = queuectl(&dir, &["list", "--state", "completed"]);
    assert!(stdout(&out).contains("\"job-ok\""));
    assert!(stdout(&out).contains("\"attempts\": 1"));
}

#[test]
fn failing_job_lands_in_dlq_and_can_be_retried() {
    let dir = temp_dir("failing_job_dlq");

    let out = queuectl(
        &dir,
        &["enqueue", r#"{"id":"job-dead","command":"(exit 1)","max_retries":0}"#],
    );
    assert!(out.status.success(), "{}", stderr(&out));

    run_worker_once(&dir);

    let out = queuectl(&dir, &["dlq", "list"]);
    assert!(out.status.success());
    assert!(stdout(&out).contains("\"job-dead\""));

    let out = queuectl(&dir, &["dlq", "retry", "job-dead"]);
    assert!(out.status.success(), "{}", stderr(&out));

    let out = queuectl(&dir, &["list", "--state", "pending"]);
    assert!(stdout(&out).contains("\"job-dead\""));
    assert!(stdout(&out).contains("\"attempts\": 0"));

    let unknown = queuectl(&dir, &["dlq", "retry", "ghost"]);
    assert!(!unknown.status.success());
    assert!(stderr(&unknown).contains("not found"));

    let not_dead = queuectl(&dir, &["dlq", "retry", "job-dead"]);
    assert!(!not_dead.status.success());
    assert!(stderr(&not_dead).contains("not in the dead letter queue"));
}

#[test]
fn config_get_and_set_round_trip() {
    let dir = temp_dir("config_round_trip");

    let out = queuectl(&dir, &["config", "get", "max_retries"]);
    assert!(out.status.success());
    assert!(stdout(&out).contains("max_retries = 3"));

    let out = queuectl(&dir, &["config", "set", "max_retries", "5"]);
    assert!(out.status.success(), "{}", stderr(&out));

    let out = queuectl(&dir, &["config", "get", "max_retries"]);
    assert!(stdout(&out).contains("max_retries = 5"));

    let bad = queuectl(&dir, &["config", "set", "backoff_base_seconds", "0"]);
    assert!(!bad.status.success());

    let unknown = queuectl(&dir, &["config", "get", "shoe_size"]);
    assert_eq!(unknown.status.code(), Some(2));

    // Unknown keys are the same usage error on both subcommands.
    let unknown_set = queuectl(&dir, &["config", "set", "shoe_size", "9"]);
    assert_eq!(unknown_set.status.code(), Some(2));
}

#[test]
fn status_reports_counts() {
    let dir = temp_dir("status_reports");

    queuectl(&dir, &["enqueue", r#"{"id":"job-1","command":"echo hi"}"#]);
    queuectl(&dir, &["enqueue", r#"{"id":"job-2","command":"echo hi"}"#]);

    let out = queuectl(&dir, &["status"]);
    assert!(out.status.success(), "{}", stderr(&out));
    let text = stdout(&out);
    assert!(text.contains("active workers: 0"));
    assert!(text.contains("pending:        2"));
}

#[test]
fn worker_start_then_stop_round_trips() {
    let dir = temp_dir("worker_start_stop");
    let _guard = StopWorkersOnDrop { dir: dir.clone() };

    let out = queuectl(&dir, &["worker", "start", "--count", "2"]);
    assert!(out.status.success(), "{}", stderr(&out));
    assert!(stdout(&out).contains("started 2 worker(s)"));

    // Wait for both pid files to appear.
    let workers_dir = dir.join("workers");
    let deadline = Instant::now() + Duration::from_secs(10);
    loop {
        let count = std::fs::read_dir(&workers_dir)
            .map(|entries| entries.count())
            .unwrap_or(0);
        if count >= 2 {
            break;
        }
        assert!(Instant::now() < deadline, "workers never wrote pid files");
        std::thread::sleep(Duration::from_millis(100));
    }

    let out = queuectl(&dir, &["status"]);
    assert!(stdout(&out).contains("active workers: 2"));

    let out = queuectl(&dir, &["worker", "stop"]);
    assert!(out.status.success(), "{}", stderr(&out));
    assert!(stdout(&out).contains("stopped gracefully"));

    let out = queuectl(&dir, &["status"]);
    assert!(stdout(&out).contains("active workers: 0"));
}

#[test]
fn workers_drain_the_queue_behind_the_supervisor() {
    let dir = temp_dir("workers_drain_queue");
    let _guard = StopWorkersOnDrop { dir: dir.clone() };

    for i in 0..6 {
        let spec = format!(r#"{{"id":"job-{i}","command":"true"}}"#);
        let out = queuectl(&dir, &["enqueue", &spec]);
        assert!(out.status.success(), "{}", stderr(&out));
    }

    let out = queuectl(&dir, &["worker", "start", "--count", "2"]);
    assert!(out.status.success(), "{}", stderr(&out));

    let deadline = Instant::now() + Duration::from_secs(20);
    loop {
        let out = queuectl(&dir, &["status"]);
        if stdout(&out).contains("completed:      6") {
            break;
        }
        assert!(Instant::now() < deadline, "queue never drained");
        std::thread::sleep(Duration::from_millis(250));
    }

    let out = queuectl(&dir, &["worker", "stop"]);
    assert!(out.status.success(), "{}", stderr(&out));
}
