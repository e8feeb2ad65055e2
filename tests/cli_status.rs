//! CLI tests for `siteforge status` and `siteforge reset`.
//!
//! Spawns the siteforge binary and verifies output and exit codes against
//! seeded progress files.

use std::process::Command;

use siteforge::exit_codes;
use siteforge::io::init::ForgePaths;
use siteforge::io::progress::ProgressStore;
use siteforge::registry::StepRegistry;

#[test]
fn status_on_fresh_directory_reports_step_zero() {
    let temp = tempfile::tempdir().expect("tempdir");

    let output = Command::new(env!("CARGO_BIN_EXE_siteforge"))
        .current_dir(temp.path())
        .arg("status")
        .output()
        .expect("siteforge status");

    assert_eq!(output.status.code(), Some(exit_codes::OK));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("progress: 0 /"), "stdout: {stdout}");
    assert!(stdout.contains("feature step 0"), "stdout: {stdout}");
}

#[test]
fn status_after_registry_exhaustion_reports_maintenance() {
    let temp = tempfile::tempdir().expect("tempdir");
    let paths = ForgePaths::new(temp.path());
    let registry_size = StepRegistry::builtin().len() as u64;
    ProgressStore::new(&paths.progress_path)
        .save(registry_size)
        .expect("seed progress");

    let output = Command::new(env!("CARGO_BIN_EXE_siteforge"))
        .current_dir(temp.path())
        .arg("status")
        .output()
        .expect("siteforge status");

    assert_eq!(output.status.code(), Some(exit_codes::OK));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("maintenance v1"), "stdout: {stdout}");
}

#[test]
fn status_json_is_machine_readable() {
    let temp = tempfile::tempdir().expect("tempdir");
    let paths = ForgePaths::new(temp.path());
    ProgressStore::new(&paths.progress_path)
        .save(2)
        .expect("seed progress");

    let output = Command::new(env!("CARGO_BIN_EXE_siteforge"))
        .current_dir(temp.path())
        .args(["status", "--json"])
        .output()
        .expect("siteforge status --json");

    assert_eq!(output.status.code(), Some(exit_codes::OK));
    let payload: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("parse json");
    assert_eq!(payload["progress"], 2);
    assert_eq!(payload["phase"], "feature step");
}

#[test]
fn reset_removes_the_progress_file() {
    let temp = tempfile::tempdir().expect("tempdir");
    let paths = ForgePaths::new(temp.path());
    let store = ProgressStore::new(&paths.progress_path);
    store.save(5).expect("seed progress");

    let status = Command::new(env!("CARGO_BIN_EXE_siteforge"))
        .current_dir(temp.path())
        .arg("reset")
        .status()
        .expect("siteforge reset");

    assert_eq!(status.code(), Some(exit_codes::OK));
    assert!(!paths.progress_path.exists());
    assert_eq!(store.load(), 0);
}
