use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;

const SNAPSHOT: &str = r#"{
    "market_id": "m-1",
    "statement": "Remote work improves productivity",
    "total_stake": 5000000,
    "opinions": [
        {"id": "a", "staker": "staker-a", "stake": 1000000, "opinion_score": 80, "market_prediction": 70},
        {"id": "b", "staker": "staker-b", "stake": 2000000, "opinion_score": 40, "market_prediction": 50},
        {"id": "c", "staker": "staker-c", "stake": 2000000, "opinion_score": 60, "market_prediction": 55}
    ]
}"#;

fn crowdsettle() -> Command {
    let mut cmd = Command::cargo_bin("crowdsettle").expect("binary built");
    cmd.env_remove("ANTHROPIC_API_KEY")
        .env_remove("OPENAI_API_KEY")
        .env_remove("RUST_LOG");
    cmd
}

fn write_config(dir: &Path, extra: &str) -> PathBuf {
    let db = dir.join("crowdsettle.db");
    let contents = format!("database = {:?}\n{extra}", db.display().to_string());
    let path = dir.join("config.toml");
    fs::write(&path, contents).expect("write temp config");
    path
}

#[test]
fn check_config_accepts_valid_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(dir.path(), "");

    crowdsettle()
        .current_dir(dir.path())
        .args(["check", "config", "--config"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration file is valid"))
        .stdout(predicate::str::contains("ANTHROPIC_API_KEY is not set"));
}

#[test]
fn check_config_returns_nonzero_on_invalid_value() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(dir.path(), "[settlement]\nworkers = 0\n");

    crowdsettle()
        .current_dir(dir.path())
        .args(["check", "config", "--config"])
        .arg(&path)
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("invalid value for workers"));
}

#[test]
fn score_prints_report_with_jackpot() {
    let dir = tempfile::tempdir().unwrap();
    let snapshot = dir.path().join("market.json");
    fs::write(&snapshot, SNAPSHOT).unwrap();

    crowdsettle()
        .arg("score")
        .arg(&snapshot)
        .args(["--ai-score", "60", "--seed", "3"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Settlement report for market m-1"))
        .stdout(predicate::str::contains("crowd score 56.00"))
        .stdout(predicate::str::contains("2.291074"));
}

#[test]
fn score_json_output_is_machine_readable() {
    let dir = tempfile::tempdir().unwrap();
    let snapshot = dir.path().join("market.json");
    fs::write(&snapshot, SNAPSHOT).unwrap();

    let output = crowdsettle()
        .args(["--json", "score"])
        .arg(&snapshot)
        .args(["--ai-score", "60", "--seed", "3"])
        .output()
        .unwrap();

    assert!(output.status.success());
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["market_id"], "m-1");
    assert_eq!(report["crowd_score"], 5600);
    assert_eq!(report["rows"][0]["opinion"], "c");
    assert_eq!(report["rows"][0]["total"], 2_291_074);
}

#[test]
fn score_rejects_invalid_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let snapshot = dir.path().join("market.json");
    fs::write(&snapshot, r#"{"market_id": "m", "statement": "  ", "opinions": []}"#).unwrap();

    crowdsettle()
        .arg("score")
        .arg(&snapshot)
        .assert()
        .failure()
        .stderr(predicate::str::contains("statement cannot be empty"));
}

#[test]
fn jobs_failed_on_fresh_database_is_empty() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(dir.path(), "");

    crowdsettle()
        .args(["jobs", "failed", "--config"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("No failed jobs"));
}

#[test]
fn jobs_enqueue_unknown_market_fails() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(dir.path(), "");

    crowdsettle()
        .args(["jobs", "enqueue", "missing", "--config"])
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("market not found: missing"));
}

#[test]
fn jobs_retry_unknown_job_fails() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(dir.path(), "");

    crowdsettle()
        .args(["jobs", "retry", "nope", "--config"])
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed job not found: nope"));
}
