// crates/release-gate-cli/tests/cli_commands.rs
// ============================================================================
// Module: CLI Command Tests
// Description: Integration tests running the release-gate binary.
// Purpose: Ensure commands report success and fail closed on errors.
// Dependencies: release-gate-cli binary, serde_json, tempfile
// ============================================================================

//! ## Overview
//! Runs the CLI binary end to end: config and policy validation, attestation
//! creation, and deployment evaluation against bundles created by the CLI
//! itself.
//!
//! Security posture: CLI inputs are untrusted; failures must exit non-zero.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::process::Command;
use std::process::Output;

use serde_json::Value;
use serde_json::json;
use tempfile::TempDir;

// ============================================================================
// SECTION: Helpers
// ============================================================================

const RELEASER: &str = "https://releaser.example/workflow@refs/heads/main";
const DIGEST: &str = "sha256:abc123";

fn release_gate_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_release-gate"))
}

fn run(args: &[&str]) -> Output {
    Command::new(release_gate_bin()).args(args).output().expect("run release-gate")
}

/// Writes a config, organization policy, one project, and a bundle directory.
fn workspace(audit: &str) -> (TempDir, PathBuf) {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    let organization = json!({
        "format": 1,
        "roots": { "release": [ { "id": RELEASER } ] },
        "build": { "min_slsa_level": 2 }
    });
    fs::write(root.join("org.json"), organization.to_string()).unwrap();
    fs::create_dir_all(root.join("projects")).unwrap();
    fs::create_dir_all(root.join("bundles")).unwrap();
    let project = json!({
        "format": 1,
        "principal": { "uri": "k8s_sa://deployer@web" },
        "packages": [ { "name": "registry/web" } ]
    });
    fs::write(root.join("projects").join("web.json"), project.to_string()).unwrap();
    let config = format!(
        "[policy]\norganization = \"org.json\"\nprojects_dir = \"projects\"\n\n[verifier]\n\
         bundles_dir = \"bundles\"\n\n{audit}"
    );
    let path = root.join("release-gate.toml");
    fs::write(&path, config).unwrap();
    (dir, path)
}

fn create_attestation(extra: &[&str]) -> Output {
    let mut args = vec![
        "attestation",
        "create",
        "--name",
        "registry/web",
        "--digest",
        DIGEST,
        "--author-id",
        RELEASER,
    ];
    args.extend_from_slice(extra);
    run(&args)
}

fn write_bundle(root: &Path, statement: &[u8]) {
    let statement: Value = serde_json::from_slice(statement).unwrap();
    let bundle = json!({ "signer_identity": RELEASER, "statement": statement });
    fs::write(root.join("bundles").join("abc123.json"), bundle.to_string()).unwrap();
}

fn evaluate(config: &Path, policy_id: &str) -> Output {
    run(&[
        "deployment",
        "evaluate",
        "--config",
        config.to_str().unwrap(),
        "--policy-id",
        policy_id,
        "--package",
        "registry/web",
        "--digest",
        DIGEST,
    ])
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[test]
fn version_flag_prints_package_version() {
    let output = run(&["--version"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.trim(), format!("release-gate {}", env!("CARGO_PKG_VERSION")));
}

#[test]
fn config_validate_accepts_valid_config() {
    let (_dir, config) = workspace("");
    let output = run(&["config", "validate", "--config", config.to_str().unwrap()]);
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("Config valid."));
}

#[test]
fn config_validate_rejects_missing_file() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("absent.toml");
    let output = run(&["config", "validate", "--config", missing.to_str().unwrap()]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Failed to load config"));
}

#[test]
fn policy_validate_reports_counts() {
    let (_dir, config) = workspace("");
    let output = run(&["policy", "validate", "--config", config.to_str().unwrap()]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("release_roots=1, policy_ids=1, min_build_level=2"), "{stdout}");
}

#[test]
fn attestation_create_prints_canonical_statement() {
    let output = create_attestation(&["--decision", "allow", "--build-level", "3", "--safe-mode"]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let statement: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(statement["_type"], "https://in-toto.io/Statement/v1");
    assert_eq!(statement["subject"][0]["digest"]["sha256"], "abc123");
    assert_eq!(statement["predicate"]["releaseResult"], "ALLOW");
}

#[test]
fn attestation_create_rejects_level_on_deny() {
    let output = create_attestation(&["--decision", "deny", "--build-level", "1"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("DENY"));
}

#[test]
fn attestation_create_hashes_artifact_files() {
    let dir = TempDir::new().unwrap();
    let artifact = dir.path().join("artifact.bin");
    fs::write(&artifact, "hello").unwrap();
    let output = run(&[
        "attestation",
        "create",
        "--name",
        "registry/web",
        "--file",
        artifact.to_str().unwrap(),
        "--author-id",
        RELEASER,
        "--decision",
        "allow",
    ]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let statement: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(
        statement["subject"][0]["digest"]["sha256"],
        "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
    );
}

#[test]
fn attestation_create_rejects_malformed_digest() {
    let output = run(&[
        "attestation",
        "create",
        "--name",
        "registry/web",
        "--digest",
        "abc123",
        "--author-id",
        RELEASER,
        "--decision",
        "allow",
    ]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Invalid digest"));
}

#[test]
fn deployment_evaluate_allows_attested_release_and_audits() {
    let (dir, config) = workspace("[audit]\nsink = \"file\"\npath = \"audit.log\"\n");
    let statement = create_attestation(&["--decision", "allow", "--build-level", "3"]);
    assert!(statement.status.success());
    write_bundle(dir.path(), &statement.stdout);

    let output = evaluate(&config, "web");
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let protection: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(protection["policy_id"], "web");
    assert_eq!(protection["principal"], "k8s_sa://deployer@web");
    assert_eq!(protection["build_level"], 2);
    assert_eq!(protection["environment"], Value::Null);

    let log = fs::read_to_string(dir.path().join("audit.log")).unwrap();
    let event: Value = serde_json::from_str(log.lines().next().unwrap()).unwrap();
    assert_eq!(event["event"], "deployment_evaluation");
    assert_eq!(event["outcome"], "allow");
}

#[test]
fn deployment_evaluate_denies_insufficient_level() {
    let (dir, config) = workspace("");
    let statement = create_attestation(&["--decision", "allow", "--build-level", "1"]);
    write_bundle(dir.path(), &statement.stdout);

    let output = evaluate(&config, "web");
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Deployment denied"));
}

#[test]
fn deployment_evaluate_fails_closed_without_bundle() {
    let (_dir, config) = workspace("");
    let output = evaluate(&config, "web");
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("no signed attestation"));
}

#[test]
fn deployment_evaluate_audits_unknown_policy_ids() {
    let (dir, config) = workspace("[audit]\nsink = \"file\"\npath = \"audit.log\"\n");
    let output = evaluate(&config, "payments");
    assert!(!output.status.success());

    let log = fs::read_to_string(dir.path().join("audit.log")).unwrap();
    let event: Value = serde_json::from_str(log.lines().next().unwrap()).unwrap();
    assert_eq!(event["outcome"], "deny");
    assert_eq!(event["error_kind"], "not_found");
}
