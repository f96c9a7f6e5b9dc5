//! CLI integration tests
//!
//! Tests the fleetrun CLI using assert_cmd. Nothing here needs a reachable
//! SSH server: failures are provoked against a closed local port.

use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;

fn fleetrun() -> Command {
    let mut cmd = Command::cargo_bin("fleetrun")
        .expect("Failed to locate fleetrun binary - ensure it's built before running tests");
    cmd.env_remove("FLEETRUN_CONFIG").env_remove("RUST_LOG");
    cmd
}

fn write_config(dir: &Path, body: &str) -> std::path::PathBuf {
    let path = dir.join("config.toml");
    std::fs::write(&path, body).unwrap();
    path
}

const CLOSED_PORT_FLEET: &str = r#"
[execution]
connect_timeout = 5

[[hosts]]
name = "closed"
address = "127.0.0.1"
port = 1
username = "nobody"
password = "irrelevant"
"#;

#[test]
fn test_cli_help() {
    fleetrun()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("fleetrun"))
        .stdout(predicate::str::contains("fleet of hosts"));
}

#[test]
fn test_cli_version() {
    fleetrun()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("fleetrun"));
}

#[test]
fn test_cli_run_help() {
    fleetrun()
        .args(["run", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--stop-on-error"))
        .stdout(predicate::str::contains("--no-stop-on-error"))
        .stdout(predicate::str::contains("--host"));
}

#[test]
fn test_cli_run_requires_command() {
    fleetrun().arg("run").assert().failure();
}

#[test]
fn test_cli_unknown_command() {
    fleetrun()
        .arg("nonexistent-command")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unrecognized subcommand"));
}

#[test]
fn test_cli_missing_config() {
    fleetrun()
        .args(["--config", "/nonexistent/fleetrun.toml", "hosts"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load config"));
}

#[test]
fn test_cli_config_path() {
    fleetrun()
        .args(["--config", "/tmp/custom-fleet.toml", "config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("/tmp/custom-fleet.toml"));
}

#[test]
fn test_cli_config_init_then_show() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fleet").join("config.toml");

    fleetrun()
        .arg("--config")
        .arg(&path)
        .args(["config", "init"])
        .assert()
        .success();
    assert!(path.exists());

    fleetrun()
        .arg("--config")
        .arg(&path)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("max_concurrency"));
}

#[test]
fn test_cli_config_from_env() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(dir.path(), CLOSED_PORT_FLEET);

    fleetrun()
        .env("FLEETRUN_CONFIG", &path)
        .arg("hosts")
        .assert()
        .success()
        .stdout(predicate::str::contains("closed"));
}

#[test]
fn test_cli_hosts_table() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(
        dir.path(),
        r#"
[credentials]
default_username = "deploy"

[[hosts]]
name = "web-1"
address = "10.0.0.5"
tags = ["web"]

[[hosts]]
name = "db-1"
port = 2222
"#,
    );

    fleetrun()
        .arg("--config")
        .arg(&path)
        .arg("hosts")
        .assert()
        .success()
        .stdout(predicate::str::contains("web-1"))
        .stdout(predicate::str::contains("10.0.0.5:22"))
        .stdout(predicate::str::contains("db-1:2222"))
        .stdout(predicate::str::contains("(deploy)"));
}

#[test]
fn test_cli_run_empty_inventory() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(dir.path(), "");

    fleetrun()
        .arg("--config")
        .arg(&path)
        .args(["run", "uptime"])
        .assert()
        .success()
        .stderr(predicate::str::contains("No hosts"));
}

#[test]
fn test_cli_run_unknown_host() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(dir.path(), CLOSED_PORT_FLEET);

    fleetrun()
        .arg("--config")
        .arg(&path)
        .args(["run", "uptime", "--host", "ghost"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown host: ghost"));
}

#[test]
fn test_cli_run_unreachable_host() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(dir.path(), CLOSED_PORT_FLEET);

    fleetrun()
        .arg("--config")
        .arg(&path)
        .args(["run", "uptime"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("closed: Error: network error"));
}

#[test]
fn test_cli_run_json() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(dir.path(), CLOSED_PORT_FLEET);

    let output = fleetrun()
        .arg("--config")
        .arg(&path)
        .args(["run", "uptime", "--json"])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["closed"]["executed"], false);
    assert_eq!(json["closed"]["error"]["kind"], "network");
}

#[test]
fn test_cli_ensure_dir_unreachable_host() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(dir.path(), CLOSED_PORT_FLEET);

    fleetrun()
        .arg("--config")
        .arg(&path)
        .args(["ensure-dir", "/srv/app"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("closed: Error: network error"));
}
