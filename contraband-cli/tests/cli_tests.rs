//! End-to-end tests for the `contraband` binary.
//!
//! Each test runs the compiled binary in a temporary working directory so that
//! no stray `contraband.toml` is picked up.

use std::fs;
use std::io::Write;
use std::path::Path;
use std::process::{Command, Output};

use tempfile::TempDir;

fn contraband(cwd: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_contraband"))
        .args(args)
        .args(["--log-level", "error"])
        .current_dir(cwd)
        .env_remove("RUST_LOG")
        .env("NO_COLOR", "1")
        .output()
        .expect("should run contraband binary")
}

fn write_zip(path: &Path, entries: &[(&str, &[u8])]) {
    let mut writer = zip::ZipWriter::new(fs::File::create(path).expect("create zip"));
    let options = zip::write::SimpleFileOptions::default();
    for (name, data) in entries {
        writer.start_file(*name, options).expect("start file");
        writer.write_all(data).expect("write entry");
    }
    writer.finish().expect("finish zip");
}

#[test]
fn test_scan_clean_tree_exits_zero() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let target = temp_dir.path().join("project");
    fs::create_dir(&target).expect("mkdir");
    fs::write(target.join("main.rs"), "fn main() {}").expect("write");

    let output = contraband(temp_dir.path(), &["scan", "project"]);

    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("No issues found."), "stdout: {stdout}");
}

#[test]
fn test_scan_zip_issue_exits_four_with_json_report() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let target = temp_dir.path().join("release");
    fs::create_dir(&target).expect("mkdir");
    write_zip(&target.join("bundle.zip"), &[("notes.txt", b"my password123")]);

    let output = contraband(temp_dir.path(), &["scan", "release", "--output", "json"]);

    assert_eq!(output.status.code(), Some(4));
    let report: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("stdout should be JSON");
    let issues = report["issues"].as_array().expect("issues array");
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0]["check"], "credentials");
    assert_eq!(issues[0]["location"], "notes.txt");
    assert_eq!(issues[0]["archive"], "bundle.zip");
    assert_eq!(issues[0]["matched"][0], "password");
    assert_eq!(report["entries_scanned"], 1);
}

#[test]
fn test_scan_no_fail_exits_zero_with_issues() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let target = temp_dir.path().join("keys");
    fs::create_dir(&target).expect("mkdir");
    fs::write(target.join("server.pem"), "-----BEGIN CERTIFICATE-----").expect("write");

    let output = contraband(temp_dir.path(), &["scan", "keys", "--no-fail"]);

    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("[key-material] server.pem"), "stdout: {stdout}");
}

#[test]
fn test_scan_missing_target_exits_three() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let output = contraband(temp_dir.path(), &["scan", "does-not-exist"]);
    assert_eq!(output.status.code(), Some(3));
}

#[test]
fn test_scan_empty_directory_exits_three() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    fs::create_dir(temp_dir.path().join("empty")).expect("mkdir");
    let output = contraband(temp_dir.path(), &["scan", "empty"]);
    assert_eq!(output.status.code(), Some(3));
}

#[test]
fn test_scan_invalid_worker_override_exits_two() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    fs::write(temp_dir.path().join("a.txt"), "text").expect("write");
    let output = contraband(temp_dir.path(), &["scan", "a.txt", "-j", "0"]);
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_scan_uses_config_file_checks() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let config = r#"
[[checks.content]]
name = "internal-hosts"
reason = "internal hostnames must not ship"
keywords = ["corp.internal"]
scope = "repository"
"#;
    fs::write(temp_dir.path().join("contraband.toml"), config).expect("write config");
    let target = temp_dir.path().join("src");
    fs::create_dir(&target).expect("mkdir");
    fs::write(target.join("a.cfg"), "host = db.corp.internal").expect("write");
    fs::write(target.join("b.cfg"), "host = cache.corp.internal").expect("write");

    let output = contraband(temp_dir.path(), &["scan", "src", "--output", "json"]);

    assert_eq!(output.status.code(), Some(4));
    let report: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("stdout should be JSON");
    let issues = report["issues"].as_array().expect("issues array");
    assert_eq!(issues.len(), 1, "repository checks aggregate into one issue");
    assert_eq!(issues[0]["source"], "repository");
    assert_eq!(issues[0]["message"], "internal hostnames must not ship");
}

#[test]
fn test_config_validate_valid_file() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let config_path = temp_dir.path().join("contraband.toml");
    fs::write(&config_path, "[pool]\nworker_count = 2\n").expect("write config");

    let output = contraband(temp_dir.path(), &["config", "validate"]);

    assert_eq!(output.status.code(), Some(0));
    assert!(String::from_utf8_lossy(&output.stdout).contains("valid"));
}

#[test]
fn test_config_validate_malformed_toml_exits_two() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let config_path = temp_dir.path().join("bad.toml");
    fs::write(&config_path, "[general\nlog_level = \"info\"\n").expect("write config");

    let output = contraband(
        temp_dir.path(),
        &["config", "validate", "--config", "bad.toml", "--output", "json"],
    );

    assert_eq!(output.status.code(), Some(2));
    let report: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("stdout should be JSON");
    assert_eq!(report["valid"], false);
    assert!(!report["errors"].as_array().expect("errors").is_empty());
}

#[test]
fn test_config_validate_missing_explicit_file_exits_two() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let output = contraband(
        temp_dir.path(),
        &["config", "validate", "--config", "missing.toml"],
    );
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_config_show_section_defaults() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let output = contraband(temp_dir.path(), &["config", "show", "--section", "pool"]);

    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("(defaults)"));
    assert!(stdout.contains("worker_count = 4"));
    assert!(stdout.contains("queue_policy = \"block\""));
}

#[test]
fn test_config_show_unknown_section_exits_one() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let output = contraband(temp_dir.path(), &["config", "show", "--section", "network"]);
    assert_eq!(output.status.code(), Some(1));
}
