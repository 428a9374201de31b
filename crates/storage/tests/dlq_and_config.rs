#![forbid(unsafe_code)]

use qc_core::config::ConfigKey;
use qc_core::job::JobState;
use qc_core::retry::RetryDecision;
use qc_storage::{FinalizeFailureRequest, InsertJobRequest, SqliteStore, StoreError};
use std::path::PathBuf;

fn temp_dir(test_name: &str) -> PathBuf {
    let base = std::env::temp_dir();
    let pid = std::process::id();
    let nonce = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let dir = base.join(format!("qc_storage_{test_name}_{pid}_{nonce}"));
    std::fs::create_dir_all(&dir).expect("create temp dir");
    dir
}

fn bury_job(store: &mut SqliteStore, id: &str, now: i64) {
    store
        .insert_job(InsertJobRequest {
            id: id.to_string(),
            command: "(exit 1)".to_string(),
            max_retries: 0,
            now,
        })
        .expect("insert job");
    store.claim_next("1", now).expect("claim").expect("job");
    store
        .finalize_failure(FinalizeFailureRequest {
            id: id.to_string(),
            error: "exit status 1".to_string(),
            decision: RetryDecision::Dead,
            now,
        })
        .expect("finalize to dead");
}

#[test]
fn dlq_retry_resets_a_dead_job() {
    let dir = temp_dir("dlq_retry_resets");
    let mut store = SqliteStore::open(&dir).expect("open store");

    bury_job(&mut store, "job-1", 100);
    let dead = store.find_job("job-1").expect("find").expect("exists");
    assert_eq!(dead.state, JobState::Dead);
    assert_eq!(dead.attempts, 1);
    assert!(dead.last_error.is_some());

    let revived = store.dlq_retry("job-1", 200).expect("dlq retry");
    assert_eq!(revived.state, JobState::Pending);
    assert_eq!(revived.attempts, 0);
    assert_eq!(revived.last_error, None);
    assert_eq!(revived.owner, None);
    assert_eq!(revived.next_run_at, 200);
}

#[test]
fn dlq_retry_rejects_non_dead_jobs() {
    let dir = temp_dir("dlq_retry_rejects");
    let mut store = SqliteStore::open(&dir).expect("open store");

    store
        .insert_job(InsertJobRequest {
            id: "job-1".to_string(),
            command: "echo hi".to_string(),
            max_retries: 3,
            now: 100,
        })
        .expect("insert job");

    let err = store.dlq_retry("job-1", 200).expect_err("pending is not dlq");
    match err {
        StoreError::NotInDlq { id, state } => {
            assert_eq!(id, "job-1");
            assert_eq!(state, "pending");
        }
        other => panic!("expected NotInDlq, got {other:?}"),
    }

    let err = store.dlq_retry("ghost", 200).expect_err("unknown id");
    assert!(matches!(err, StoreError::NotFound { .. }));
}

#[test]
fn config_defaults_are_seeded() {
    let dir = temp_dir("config_defaults");
    let store = SqliteStore::open(&dir).expect("open store");

    assert_eq!(store.max_retries().expect("max_retries"), 3);
    assert_eq!(store.backoff_base_seconds().expect("backoff"), 2);
    assert_eq!(store.poll_interval_seconds().expect("poll"), 1);
}

#[test]
fn config_set_round_trips_and_validates() {
    let dir = temp_dir("config_set_round_trips");
    let mut store = SqliteStore::open(&dir).expect("open store");

    store.set_config("max_retries", "5").expect("set max_retries");
    assert_eq!(store.max_retries().expect("max_retries"), 5);
    assert_eq!(
        store.get_config(ConfigKey::MaxRetries).expect("raw"),
        "5"
    );

    store
        .set_config("backoff_base_seconds", "10")
        .expect("set backoff");
    assert_eq!(store.backoff_base_seconds().expect("backoff"), 10);

    let err = store
        .set_config("backoff_base_seconds", "0")
        .expect_err("zero backoff base");
    assert!(matches!(err, StoreError::BadConfig(_)));

    let err = store
        .set_config("max_retries", "many")
        .expect_err("non-numeric");
    assert!(matches!(err, StoreError::BadConfig(_)));

    let err = store
        .set_config("poll_interval_seconds", "-1")
        .expect_err("negative interval");
    assert!(matches!(err, StoreError::BadConfig(_)));

    let err = store.set_config("nice_try", "1").expect_err("unknown key");
    assert!(matches!(err, StoreError::BadConfig(_)));
}
