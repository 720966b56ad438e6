#![allow(deprecated)] // cargo_bin is deprecated in newer assert_cmd releases

use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;
use tempfile::NamedTempFile;

fn config_file(suffix: &str, content: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
    write!(file, "{}", content).unwrap();
    file
}

const APP_CONFIG: &str = r#"{
  "config_cloudlaunch": {
    "rootStorageType": "volume",
    "rootStorageSize": "40",
    "firewall": [{
      "securityGroup": "App",
      "rules": [
        {"protocol": "tcp", "from": "22", "to": "22", "cidr": "0.0.0.0/0"},
        {"protocol": "tcp", "from": "http", "to": "80", "cidr": "0.0.0.0/0"}
      ]
    }]
  }
}"#;

/// Help lists every subcommand
#[test]
fn test_cli_help() {
    let mut cmd = Command::cargo_bin("cloudlaunch").unwrap();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Launch virtual machines"))
        .stdout(predicate::str::contains("validate"))
        .stdout(predicate::str::contains("dry-run"))
        .stdout(predicate::str::contains("version"));
}

#[test]
fn test_cli_version() {
    let mut cmd = Command::cargo_bin("cloudlaunch").unwrap();
    cmd.arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains("cloudlaunch"));
}

#[test]
fn test_validate_shows_resolved_settings() {
    let file = config_file(".json", APP_CONFIG);

    let mut cmd = Command::cargo_bin("cloudlaunch").unwrap();
    cmd.arg("validate")
        .arg(file.path())
        .env_remove("CLOUDLAUNCH_KEY_PAIR")
        .assert()
        .success()
        .stdout(predicate::str::contains("volume (40 GB)"))
        .stdout(predicate::str::contains("cloudlaunch_key_pair"))
        .stdout(predicate::str::contains("App"))
        .stdout(predicate::str::contains("1 rule(s) will be skipped"));
}

#[test]
fn test_validate_yaml_config() {
    let file = config_file(
        ".yaml",
        "config_cloudlaunch:\n  keyPair: team-key\n  skipFloatingIP: true\n",
    );

    let mut cmd = Command::cargo_bin("cloudlaunch").unwrap();
    cmd.arg("validate")
        .arg(file.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("team-key"))
        .stdout(predicate::str::contains("skipped"));
}

#[test]
fn test_validate_missing_file_fails() {
    let mut cmd = Command::cargo_bin("cloudlaunch").unwrap();
    cmd.arg("validate")
        .arg("/nonexistent/app.json")
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to load"));
}

/// A dry run prints progress and ends with the result envelope
#[test]
fn test_dry_run_prints_result_envelope() {
    let file = config_file(".json", APP_CONFIG);

    let mut cmd = Command::cargo_bin("cloudlaunch").unwrap();
    cmd.arg("dry-run")
        .arg(file.path())
        .args(["--image", "img-ubuntu", "--name", "galaxy"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[RESOLVING_KEYPAIR]"))
        .stdout(predicate::str::contains("[DONE]"))
        .stdout(predicate::str::contains("\"cloudLaunch\""))
        .stdout(predicate::str::contains("\"applicationURL\": \"http://203.0.113.1/\""))
        .stdout(predicate::str::contains("rule #1 skipped"));
}

#[test]
fn test_dry_run_requires_image() {
    let file = config_file(".json", "{}");

    let mut cmd = Command::cargo_bin("cloudlaunch").unwrap();
    cmd.arg("dry-run")
        .arg(file.path())
        .env_remove("CLOUDLAUNCH_IMAGE")
        .assert()
        .failure();
}

#[test]
fn test_invalid_command() {
    let mut cmd = Command::cargo_bin("cloudlaunch").unwrap();
    cmd.arg("invalid-command").assert().failure();
}
