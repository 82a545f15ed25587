//! CLI integration tests for mysql-migrate.
//!
//! These tests verify command-line argument parsing, help output,
//! and exit codes for error conditions that need no database.

use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;

/// Get a command for the mysql-migrate binary.
fn cmd() -> Command {
    Command::cargo_bin("mysql-migrate").unwrap()
}

/// Write a config file pointing at ports nothing listens on.
fn unreachable_config(dir: &tempfile::TempDir, extra: &str) -> std::path::PathBuf {
    let path = dir.path().join("config.yaml");
    let log = dir.path().join("migration.log");
    let mut file = std::fs::File::create(&path).unwrap();
    write!(
        file,
        r#"
source:
  host: 127.0.0.1
  port: 1
  username: root
  database: lms
destination:
  host: 127.0.0.1
  port: 2
  username: root
  database: lms
migration:
  connect_timeout_secs: 2
  log_file: {}
{}
"#,
        log.display(),
        extra
    )
    .unwrap();
    path
}

// =============================================================================
// Help and Version Tests
// =============================================================================

#[test]
fn test_help_shows_all_commands() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("validate"))
        .stdout(predicate::str::contains("health-check"));
}

#[test]
fn test_run_subcommand_help() {
    cmd()
        .args(["run", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--dry-run"))
        .stdout(predicate::str::contains("--batch-size"));
}

#[test]
fn test_version_flag() {
    cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("mysql-migrate"));
}

// =============================================================================
// Global Flags Tests
// =============================================================================

#[test]
fn test_global_flags_exist() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--output-json"))
        .stdout(predicate::str::contains("--log-file"))
        .stdout(predicate::str::contains("--skip-table"));
}

#[test]
fn test_verbosity_flag_exists() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--verbosity"))
        .stdout(predicate::str::contains("[default: info]"));
}

// =============================================================================
// Exit Code Tests - Config Errors
// =============================================================================

#[test]
fn test_missing_config_exits_with_code_7() {
    // Missing file is an IO error (code 7), not config error (code 1)
    cmd()
        .args(["--config", "nonexistent_config_file.yaml", "health-check"])
        .assert()
        .code(7);
}

#[test]
fn test_invalid_yaml_exits_with_code_1() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "invalid: yaml: content: [").unwrap();

    cmd()
        .args(["--config", file.path().to_str().unwrap(), "health-check"])
        .assert()
        .code(1);
}

#[test]
fn test_empty_config_exits_with_code_1() {
    let file = tempfile::NamedTempFile::new().unwrap();

    cmd()
        .args(["--config", file.path().to_str().unwrap(), "health-check"])
        .assert()
        .code(1);
}

#[test]
fn test_missing_required_fields_exits_with_code_1() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "source:").unwrap();
    writeln!(file, "  host: localhost").unwrap();

    cmd()
        .args(["--config", file.path().to_str().unwrap(), "health-check"])
        .assert()
        .code(1);
}

#[test]
fn test_zero_batch_size_override_exits_with_code_1() {
    let dir = tempfile::tempdir().unwrap();
    let config = unreachable_config(&dir, "");

    let config = config.to_str().unwrap();

    cmd()
        .args(["--config", config, "run", "--batch-size", "0"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("batch_size"));
}

// =============================================================================
// Exit Code Tests - Connection Errors (Exit Code 2)
// =============================================================================

#[test]
fn test_unreachable_source_exits_with_code_2() {
    let dir = tempfile::tempdir().unwrap();
    let config = unreachable_config(&dir, "");

    cmd()
        .args(["--config", config.to_str().unwrap(), "run"])
        .assert()
        .code(2)
        .stdout(predicate::str::contains("Fatal:"));

    // Fatal line also lands in the log file, timestamped
    let log = std::fs::read_to_string(dir.path().join("migration.log")).unwrap();
    let fatal = |line: &str| line.starts_with('[') && line.contains("Fatal:");
    assert!(log.lines().any(fatal));
}

#[test]
fn test_log_file_override() {
    let dir = tempfile::tempdir().unwrap();
    let config = unreachable_config(&dir, "");
    let override_log = dir.path().join("override.log");

    cmd()
        .args([
            "--config",
            config.to_str().unwrap(),
            "--log-file",
            override_log.to_str().unwrap(),
            "validate",
        ])
        .assert()
        .code(2);

    assert!(override_log.exists());
    assert!(!dir.path().join("migration.log").exists());
}

#[test]
fn test_health_check_reports_unhealthy() {
    let dir = tempfile::tempdir().unwrap();
    let config = unreachable_config(&dir, "");

    cmd()
        .args(["--config", config.to_str().unwrap(), "health-check"])
        .assert()
        .code(2)
        .stdout(predicate::str::contains("UNHEALTHY"));
}

#[test]
fn test_health_check_json_output() {
    let dir = tempfile::tempdir().unwrap();
    let config = unreachable_config(&dir, "");

    let config = config.to_str().unwrap();

    cmd()
        .args(["--config", config, "--output-json", "health-check"])
        .assert()
        .code(2)
        .stdout(predicate::str::contains("\"healthy\": false"));
}

// =============================================================================
// Subcommand Existence Tests
// =============================================================================

#[test]
fn test_health_check_command_exists() {
    cmd()
        .args(["health-check", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Test database connections"));
}

#[test]
fn test_validate_command_exists() {
    cmd()
        .args(["validate", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Validate row counts"));
}

// =============================================================================
// Config Path Tests
// =============================================================================

#[test]
fn test_config_default_path() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("[default: config.yaml]"));
}

#[test]
fn test_short_config_flag() {
    cmd()
        .args(["-c", "some_config.yaml", "--help"])
        .assert()
        .success();
}

// =============================================================================
// No Subcommand Tests
// =============================================================================

#[test]
fn test_no_subcommand_shows_help() {
    cmd()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage:"));
}
