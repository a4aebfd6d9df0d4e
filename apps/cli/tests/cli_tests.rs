//! CLI 端到端测试

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;

fn cli() -> Command {
    Command::cargo_bin("mecanum-cli").unwrap()
}

#[test]
fn test_config_show_prints_defaults() {
    cli()
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("mode = \"restricted\""))
        .stdout(predicate::str::contains("period_ms = 10"));
}

#[test]
fn test_config_show_with_mode() {
    cli()
        .args(["config", "show", "--mode", "GUEST"])
        .assert()
        .success()
        .stdout(predicate::str::contains("mode = \"guest\""));
}

#[test]
fn test_unknown_mode_rejected() {
    cli()
        .args(["config", "show", "--mode", "turbo"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid teleop mode"));
}

#[test]
fn test_config_init_then_check() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.toml");

    cli().args(["config", "init"]).arg(&path).assert().success();
    assert!(path.exists());

    // 不覆盖已存在的文件
    cli().args(["config", "init"]).arg(&path).assert().failure();

    cli()
        .arg("check")
        .arg("--config")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Config OK"));
}

#[test]
fn test_check_rejects_invalid_config() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.toml");
    fs::write(&path, "period_ms = 0\n").unwrap();

    cli()
        .arg("check")
        .arg("--config")
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("period_ms"));
}

#[test]
fn test_check_requires_an_input() {
    cli().arg("check").assert().failure();
}

#[test]
fn test_auto_dry_run_lists_schedule() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("plan.toml");
    fs::write(
        &path,
        r#"
[[actions]]
device = "drive"
y = 1.0
duration = 0.5

[[actions]]
device = "lift"
speed = 1.0
duration = 0.3
"#,
    )
    .unwrap();

    cli()
        .arg("auto")
        .arg(&path)
        .arg("--dry-run")
        .assert()
        .success()
        .stdout(predicate::str::contains("2 actions"))
        .stdout(predicate::str::contains("lift  speed=+1.00"))
        .stdout(predicate::str::contains("Dry run"));
}

#[test]
fn test_auto_executes_plan() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("plan.json");
    fs::write(
        &path,
        r#"{"actions": [{"device": "lift", "speed": -0.5, "duration": 0.05}]}"#,
    )
    .unwrap();

    cli()
        .arg("auto")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("actions: 1"))
        .stdout(predicate::str::contains("lift commands: 2"));
}

#[test]
fn test_auto_rejects_negative_duration() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("plan.toml");
    fs::write(
        &path,
        "[[actions]]\ndevice = \"lift\"\nspeed = 1.0\nduration = -1.0\n",
    )
    .unwrap();

    cli()
        .arg("auto")
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid action #0"));
}

#[test]
fn test_teleop_runs_for_duration() {
    cli()
        .args(["teleop", "--mode", "standard", "--seconds", "0.2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("mode=standard"))
        .stdout(predicate::str::contains("Session summary"));
}

#[test]
fn test_check_rejects_nan_plan_scale() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("plan.toml");
    fs::write(
        &path,
        "scale = nan\n\n[[actions]]\ndevice = \"drive\"\ny = 1.0\nduration = 0.1\n",
    )
    .unwrap();

    cli()
        .arg("check")
        .arg("--plan")
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("plan scale must be finite"));

    cli()
        .arg("auto")
        .arg(&path)
        .assert()
        .failure()
        .stdout(predicate::str::contains("drive commands").not());
}
