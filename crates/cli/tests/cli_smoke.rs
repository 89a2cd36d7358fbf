//! CLI smoke tests for depforge.
//!
//! These tests verify argument handling and early failure paths; they
//! never reach a real external build.

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use tempfile::TempDir;

fn depforge_cmd() -> Command {
  cargo_bin_cmd!("depforge")
}

#[test]
fn help_flag_works() {
  depforge_cmd()
    .arg("--help")
    .assert()
    .success()
    .stdout(predicate::str::contains("Usage"));
}

#[test]
fn version_flag_works() {
  depforge_cmd()
    .arg("--version")
    .assert()
    .success()
    .stdout(predicate::str::contains("depforge"));
}

#[test]
fn rejects_unknown_architecture() {
  depforge_cmd()
    .args(["--platform", "arm64"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("unknown architecture"));
}

#[test]
fn rejects_unknown_configuration() {
  depforge_cmd()
    .args(["--config", "Profile"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("unknown configuration"));
}

#[test]
fn missing_project_root_is_reported() {
  depforge_cmd()
    .args(["--root", "/nonexistent/depforge-root"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("project root not found"));
}

#[test]
fn empty_project_reports_the_missing_source_tree() {
  let temp = TempDir::new().unwrap();
  depforge_cmd()
    .arg("--root")
    .arg(temp.path())
    .assert()
    .failure()
    .stderr(predicate::str::contains("source tree not found"));
}
