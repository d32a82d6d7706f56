// file: tests/cli.rs
// version: 1.0.0
// guid: 6f1d8b3a-2c47-4e90-9a5b-7e3c0d12f8b6

//! Binary-level checks that never reach the host

use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;
use tempfile::Builder;

fn agent() -> Command {
    let mut cmd = Command::cargo_bin("ubuntu-harden-agent").unwrap();
    cmd.env_remove("HARDEN_USER")
        .env_remove("HARDEN_SSH_PORT")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_help_lists_flags() {
    agent()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--port"))
        .stdout(predicate::str::contains("--user"))
        .stdout(predicate::str::contains("--dry-run"))
        .stdout(predicate::str::contains("--no-reboot"));
}

#[test]
fn test_reserved_port_exits_1() {
    agent()
        .args(["-p", "443"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("[ERROR]"))
        .stderr(predicate::str::contains("reserved"));
}

#[test]
fn test_port_from_environment() {
    agent()
        .env("HARDEN_SSH_PORT", "3306")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("reserved"));
}

#[test]
fn test_non_numeric_port_exits_1() {
    agent()
        .args(["--port", "ssh"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Invalid port"));
}

#[test]
fn test_invalid_username_exits_1() {
    agent()
        .args(["-u", "Bad User"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Invalid username"));
}

#[test]
fn test_missing_config_file_exits_1() {
    agent()
        .args(["-c", "/nonexistent/harden.toml"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Failed to read config file"));
}

#[test]
fn test_config_reserved_ports_apply() {
    let mut file = Builder::new().suffix(".toml").tempfile().unwrap();
    writeln!(file, "reserved_ports = [8888]").unwrap();

    agent()
        .arg("-c")
        .arg(file.path())
        .args(["-p", "8888"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("reserved"));
}

#[test]
fn test_verbose_and_quiet_conflict() {
    agent().args(["-v", "-q"]).assert().failure();
}
