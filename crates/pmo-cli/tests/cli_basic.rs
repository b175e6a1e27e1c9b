//! Basic CLI E2E tests.
//!
//! Each test points PMO_DATA_DIR at its own temp directory, so the shell
//! state and session store start empty.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn pmo(data_dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("pmo").unwrap();
    cmd.env("PMO_DATA_DIR", data_dir.path())
        .env_remove("PMO_ENV")
        .env_remove("RUST_LOG");
    cmd
}

/// Run a command that must succeed and parse its stdout as one JSON value.
fn run_json(data_dir: &TempDir, args: &[&str]) -> serde_json::Value {
    let output = pmo(data_dir).args(args).assert().success().get_output().stdout.clone();
    serde_json::from_slice(&output).expect("stdout is a single JSON document")
}

#[test]
fn test_status_on_fresh_install() {
    let dir = TempDir::new().unwrap();
    let status = run_json(&dir, &["timer", "status"]);
    assert_eq!(status["phase"], "idle");
    assert_eq!(status["seconds"], 1500);
    assert_eq!(status["task"], "");
    assert!(dir.path().join("pmo.db").exists());
}

#[test]
fn test_task_set_and_get() {
    let dir = TempDir::new().unwrap();
    let event = run_json(&dir, &["task", "set", "Write report"]);
    assert_eq!(event["type"], "task_changed");

    let task = run_json(&dir, &["task", "get"]);
    assert_eq!(task["task"], "Write report");
}

#[test]
fn test_write_report_scenario() {
    let dir = TempDir::new().unwrap();
    run_json(&dir, &["task", "set", "Write report"]);

    let started = run_json(&dir, &["timer", "start", "--duration", "1500"]);
    assert_eq!(started["type"], "timer_started");
    assert_eq!(started["duration_secs"], 1500);

    let paused = run_json(&dir, &["timer", "pause"]);
    assert_eq!(paused["type"], "timer_paused");

    let resumed = run_json(&dir, &["timer", "start", "--duration", "900"]);
    assert_eq!(resumed["type"], "timer_resumed");
    assert_eq!(
        resumed["remaining_secs"],
        paused["remaining_secs"],
        "resume keeps the paused progress"
    );

    // A second start is a no-op and reports the full state.
    let snapshot = run_json(&dir, &["timer", "start", "--duration", "900"]);
    assert_eq!(snapshot["type"], "state_snapshot");
    assert_eq!(snapshot["phase"], "running");
    assert_eq!(snapshot["configured_secs"], 1500);
}

#[test]
fn test_noop_commands_print_snapshot() {
    let dir = TempDir::new().unwrap();
    let paused = run_json(&dir, &["timer", "pause"]);
    assert_eq!(paused["type"], "state_snapshot");
    assert_eq!(paused["phase"], "idle");

    run_json(&dir, &["timer", "start"]);
    let again = run_json(&dir, &["timer", "start", "--duration", "60"]);
    assert_eq!(again["type"], "state_snapshot");
    assert_eq!(again["configured_secs"], 1500);
}

#[test]
fn test_start_uses_configured_focus_duration() {
    let dir = TempDir::new().unwrap();
    pmo(&dir)
        .args(["config", "set", "timer.focus_duration", "50"])
        .assert()
        .success()
        .stdout(predicate::str::contains("ok"));

    let started = run_json(&dir, &["timer", "start"]);
    assert_eq!(started["duration_secs"], 3000);
}

#[test]
fn test_reset_clears_task_and_rearms() {
    let dir = TempDir::new().unwrap();
    run_json(&dir, &["task", "set", "Short"]);
    run_json(&dir, &["timer", "start", "--duration", "600"]);

    let reset = run_json(&dir, &["timer", "reset"]);
    assert_eq!(reset["type"], "timer_reset");
    assert_eq!(reset["configured_secs"], 600);

    let status = run_json(&dir, &["timer", "status"]);
    assert_eq!(status["phase"], "idle");
    assert_eq!(status["seconds"], 600);
    assert_eq!(status["task"], "");

    let history = run_json(&dir, &["history", "recent"]);
    assert_eq!(history.as_array().unwrap().len(), 0);
}

#[test]
fn test_session_complete_records_history() {
    let dir = TempDir::new().unwrap();
    run_json(&dir, &["task", "set", "Deep work"]);
    run_json(&dir, &["timer", "start", "--duration", "1500"]);

    pmo(&dir)
        .args(["session", "complete"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"session_saved\""))
        .stdout(predicate::str::contains("\"timer_reset\""));

    let history = run_json(&dir, &["history", "recent", "--limit", "5"]);
    let sessions = history.as_array().unwrap();
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0]["task_name"], "Deep work");
    assert_eq!(sessions[0]["is_completed"], true);

    let today = run_json(&dir, &["history", "date"]);
    assert_eq!(today.as_array().unwrap().len(), 1);
}

#[test]
fn test_session_complete_without_start_fails() {
    let dir = TempDir::new().unwrap();
    pmo(&dir)
        .args(["session", "complete"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no session in progress"));
}

#[test]
fn test_history_date_without_sessions_is_empty() {
    let dir = TempDir::new().unwrap();
    let sessions = run_json(&dir, &["history", "date", "2020-01-01"]);
    assert_eq!(sessions, serde_json::json!([]));
}

#[test]
fn test_history_date_rejects_bad_date() {
    let dir = TempDir::new().unwrap();
    pmo(&dir).args(["history", "date", "yesterday"]).assert().failure();
}

#[test]
fn test_config_get_list_reset() {
    let dir = TempDir::new().unwrap();
    pmo(&dir)
        .args(["config", "get", "history.recent_limit"])
        .assert()
        .success()
        .stdout("50\n");

    pmo(&dir)
        .args(["config", "get", "nope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown key"));

    pmo(&dir)
        .args(["config", "set", "history.recent_limit", "many"])
        .assert()
        .failure();

    let list = run_json(&dir, &["config", "list"]);
    assert_eq!(list["timer"]["focus_duration"], 25);

    pmo(&dir).args(["config", "reset"]).assert().success();
    assert!(dir.path().join("config.toml").exists());
}

#[test]
fn test_unusable_data_dir_is_fatal() {
    let dir = TempDir::new().unwrap();
    let blocker = dir.path().join("blocker");
    std::fs::write(&blocker, b"file").unwrap();

    Command::cargo_bin("pmo")
        .unwrap()
        .env("PMO_DATA_DIR", blocker.join("data"))
        .args(["timer", "status"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("error:"));
}
