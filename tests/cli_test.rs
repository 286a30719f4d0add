//! Integration tests for the command-line surface.
// The cargo_bin function is marked deprecated in favor of cargo_bin! macro,
// but both work correctly. Suppressing until assert_cmd stabilizes the new API.
#![allow(deprecated)]

use assert_cmd::cargo::cargo_bin;
use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn securecheck() -> Command {
    let mut cmd = Command::new(cargo_bin("securecheck"));
    cmd.env_remove("SECURECHECK_CONFIG")
        .env_remove("SECURECHECK_QUERY_TIMEOUT_SECS")
        .env_remove("SECURECHECK_DEADLINE_SECS");
    cmd
}

#[test]
fn cli_shows_help() -> Result<(), Box<dyn std::error::Error>> {
    securecheck()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--exit-code"))
        .stdout(predicate::str::contains("--schema"));
    Ok(())
}

#[test]
fn cli_shows_version() -> Result<(), Box<dyn std::error::Error>> {
    securecheck()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
    Ok(())
}

#[test]
fn cli_prints_schema() -> Result<(), Box<dyn std::error::Error>> {
    let output = securecheck().arg("--schema").output()?;
    assert!(output.status.success());
    let schema: serde_json::Value = serde_json::from_slice(&output.stdout)?;
    assert_eq!(schema["title"], "Report");
    Ok(())
}

#[test]
fn cli_generates_bash_completions() -> Result<(), Box<dyn std::error::Error>> {
    securecheck()
        .args(["--completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("securecheck"))
        .stdout(predicate::str::contains("complete"));
    Ok(())
}

#[test]
fn cli_rejects_conflicting_formats() -> Result<(), Box<dyn std::error::Error>> {
    securecheck().args(["--json", "--summary"]).assert().failure();
    Ok(())
}

#[test]
fn cli_missing_config_file_fails() -> Result<(), Box<dyn std::error::Error>> {
    securecheck()
        .args(["--config", "/nonexistent/securecheck.yml", "--summary"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Configuration not found"));
    Ok(())
}

#[test]
fn cli_invalid_config_value_fails() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    let path = temp.path().join("securecheck.yml");
    fs::write(&path, "deadline_secs: 0\n")?;
    securecheck()
        .arg("--config")
        .arg(&path)
        .assert()
        .code(2)
        .stderr(predicate::str::contains("deadline_secs"));
    Ok(())
}

// Without the Windows tools every probe degrades; the verdict is still
// produced and TPM is the first failing gate.
#[test]
fn cli_summary_without_platform_tools() -> Result<(), Box<dyn std::error::Error>> {
    securecheck()
        .args(["--summary", "--no-color", "--timeout", "2", "--deadline", "20"])
        .env("WINDIR", "/nonexistent-windows")
        .assert()
        .success()
        .stdout(predicate::str::contains("NOT READY - failing check: TPM 2.0"));
    Ok(())
}

#[test]
fn cli_exit_code_flag_reports_not_ready() -> Result<(), Box<dyn std::error::Error>> {
    securecheck()
        .args(["--summary", "--exit-code", "--timeout", "2", "--deadline", "20"])
        .env("WINDIR", "/nonexistent-windows")
        .assert()
        .code(1);
    Ok(())
}

#[test]
fn cli_json_output_parses() -> Result<(), Box<dyn std::error::Error>> {
    let output = securecheck()
        .args(["--json", "--timeout", "2", "--deadline", "20"])
        .env("WINDIR", "/nonexistent-windows")
        .output()?;
    assert!(output.status.success());
    let report: serde_json::Value = serde_json::from_slice(&output.stdout)?;
    assert_eq!(report["ready"], false);
    assert_eq!(report["checks"]["TPM2"], false);
    Ok(())
}
