//! Integration tests that run the compiled `kwiz-sync` binary.

use assert_cmd::Command;
use kwiz_test_utils::SyncSandbox;
use kwiz_test_utils::fixtures::{sample_question, sample_snapshot};
use predicates::prelude::*;
use serde_json::Value;

/// A `kwiz-sync` command pointed at the sandbox files
fn kwiz(sandbox: &SyncSandbox) -> Command {
    let mut cmd = Command::cargo_bin("kwiz-sync").expect("Failed to find kwiz-sync binary");
    cmd.env_remove("RUST_LOG")
        .env("KWIZ_SYNC_ADMIN", sandbox.admin_path())
        .env("KWIZ_SYNC_FRONTEND", sandbox.frontend_path())
        .env("KWIZ_SYNC_HISTORY", sandbox.history_path())
        .env("NO_COLOR", "1");
    cmd
}

/// Admin has one more question than frontend
fn sandbox_with_new_question() -> SyncSandbox {
    let sandbox = SyncSandbox::new();
    let mut admin = sample_snapshot();
    admin.quiz.questions.push(sample_question("q6"));
    sandbox.write_admin(&admin);
    sandbox.write_frontend(&sample_snapshot());
    sandbox
}

// ============================================================================
// Basics
// ============================================================================

#[test]
fn test_help_lists_commands() {
    Command::cargo_bin("kwiz-sync")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("preview"))
        .stdout(predicate::str::contains("rollback"));
}

#[test]
fn test_no_command_shows_hint() {
    let sandbox = SyncSandbox::new();
    kwiz(&sandbox)
        .assert()
        .success()
        .stdout(predicate::str::contains("kwiz-sync --help"));
}

#[test]
fn test_unknown_operation_fails() {
    let sandbox = SyncSandbox::new();
    kwiz(&sandbox)
        .args(["preview", "sideways"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("sideways"));
}

// ============================================================================
// Preview and sync
// ============================================================================

#[test]
fn test_preview_shows_added_question() {
    let sandbox = sandbox_with_new_question();
    kwiz(&sandbox)
        .args(["preview", "push"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Adding 1 new question"));

    assert_eq!(sandbox.read_frontend(), sample_snapshot());
}

#[test]
fn test_preview_json_is_machine_readable() {
    let sandbox = sandbox_with_new_question();
    let output = kwiz(&sandbox)
        .args(["preview", "push", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let preview: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(preview["operation"]["type"], "push");
    assert_eq!(preview["summary"]["totalChanges"], 1);
    assert_eq!(preview["operation"]["changes"][0]["action"], "add");
}

#[test]
fn test_dry_run_writes_nothing() {
    let sandbox = sandbox_with_new_question();
    kwiz(&sandbox)
        .args(["sync", "push", "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Dry run"));

    assert_eq!(sandbox.read_frontend().quiz.questions.len(), 5);
    assert!(!sandbox.history_path().exists());
}

#[test]
fn test_sync_push_then_undo() {
    let sandbox = sandbox_with_new_question();

    kwiz(&sandbox)
        .args(["sync", "push"])
        .assert()
        .success()
        .stdout(predicate::str::contains("OK"));
    assert_eq!(sandbox.read_frontend().quiz.questions.len(), 6);

    kwiz(&sandbox)
        .args(["history", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"completed\""));

    kwiz(&sandbox).arg("undo").assert().success();
    assert_eq!(sandbox.read_frontend(), sample_snapshot());

    kwiz(&sandbox)
        .arg("undo")
        .assert()
        .failure()
        .stderr(predicate::str::contains("No sync operations to undo"));
}

#[test]
fn test_smart_conflict_needs_resolve_flag() {
    let sandbox = SyncSandbox::new();
    sandbox.write_admin(&sample_snapshot());
    sandbox.write_frontend(&sample_snapshot());
    kwiz(&sandbox).args(["sync", "push"]).assert().success();

    let mut admin = sample_snapshot();
    admin.rewards.coin_values.correct = 20;
    let mut frontend = sample_snapshot();
    frontend.rewards.coin_values.correct = 30;
    sandbox.write_admin(&admin);
    sandbox.write_frontend(&frontend);

    kwiz(&sandbox)
        .args(["sync", "smart"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("rewards.coinValues.correct"));
    assert_eq!(sandbox.read_admin().rewards.coin_values.correct, 20);

    kwiz(&sandbox)
        .args(["sync", "smart", "--resolve", "rewards.coinValues.correct=admin"])
        .assert()
        .success();
    assert_eq!(sandbox.read_frontend().rewards.coin_values.correct, 20);
    assert_eq!(sandbox.read_admin().rewards.coin_values.correct, 20);
}

// ============================================================================
// Rollback and status
// ============================================================================

#[test]
fn test_rollback_rejects_bad_and_unknown_ids() {
    let sandbox = sandbox_with_new_question();

    kwiz(&sandbox)
        .args(["rollback", "not-a-uuid"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid rollback point id"));

    kwiz(&sandbox)
        .args(["rollback", "00000000-0000-4000-8000-000000000000"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Not found"));

    assert_eq!(sandbox.read_frontend(), sample_snapshot());
}

#[test]
fn test_rollback_to_point_from_history() {
    let sandbox = sandbox_with_new_question();
    kwiz(&sandbox).args(["sync", "reset"]).assert().success();

    let output = kwiz(&sandbox).args(["history", "--json"]).output().unwrap();
    let operations: Value = serde_json::from_slice(&output.stdout).unwrap();
    let point_id = operations[0]["rollbackPointIds"][0].as_str().unwrap().to_string();

    kwiz(&sandbox)
        .args(["rollback", &point_id])
        .assert()
        .success()
        .stdout(predicate::str::contains("Restored frontend store"));
    assert_eq!(sandbox.read_frontend(), sample_snapshot());
}

#[test]
fn test_status_json_reports_counts() {
    let sandbox = sandbox_with_new_question();
    kwiz(&sandbox).args(["sync", "push"]).assert().success();

    let output = kwiz(&sandbox).args(["status", "--json"]).output().unwrap();
    assert!(output.status.success());

    let status: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(status["operationCount"], 1);
    assert_eq!(status["rollbackPointCount"], 1);
    assert_eq!(status["hasAncestor"], true);
}

#[test]
fn test_config_file_caps_history() {
    let sandbox = sandbox_with_new_question();
    let config = sandbox.root().join("kwiz.toml");
    std::fs::write(&config, "[retention]\nmax_operations = 1\n").unwrap();

    kwiz(&sandbox).args(["sync", "push"]).assert().success();
    kwiz(&sandbox)
        .args(["sync", "pull", "--config"])
        .arg(&config)
        .assert()
        .success();

    let output = kwiz(&sandbox).args(["history", "--json"]).output().unwrap();
    let operations: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(operations.as_array().map(Vec::len), Some(1));
    assert_eq!(operations[0]["type"], "pull");
}
