//! CLI integration tests.

use std::io::Write;

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::NamedTempFile;

fn guardian() -> Command {
    let mut cmd = cargo_bin_cmd!("guardian");
    cmd.env_remove("GUARDIAN_SYMBOL")
        .env_remove("GUARDIAN_LOG_LEVEL");
    cmd
}

fn config_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("create temp config");
    file.write_all(contents.as_bytes()).expect("write temp config");
    file
}

#[test]
fn test_help() {
    guardian()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("guardian"))
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("check"));
}

#[test]
fn test_version() {
    guardian()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("guardian"));
}

#[test]
fn test_check_valid_config() {
    let file = config_file(
        r#"
[guardian]
symbol = "BTCUSDT"
open_order_resync_ticks = 0

[guardian.trailing]
activation_pct = "0.05"
"#,
    );

    guardian()
        .args(["check", "--config"])
        .arg(file.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration file is valid"))
        .stdout(predicate::str::contains("Symbol: BTCUSDT"))
        .stdout(predicate::str::contains("Open order resync: disabled"));
}

#[test]
fn test_check_reports_missing_symbol() {
    let file = config_file("[guardian]\n");

    guardian()
        .args(["check", "--config"])
        .arg(file.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error:"))
        .stderr(predicate::str::contains("symbol"));
}

#[test]
fn test_check_symbol_from_environment() {
    let file = config_file("[guardian]\n");

    guardian()
        .env("GUARDIAN_SYMBOL", "ETHUSDT")
        .args(["check", "--config"])
        .arg(file.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Symbol: ETHUSDT"));
}

#[test]
fn test_check_missing_file() {
    guardian()
        .args(["check", "--config", "/nonexistent/guardian.toml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error:"));
}
