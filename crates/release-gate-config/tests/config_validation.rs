// crates/release-gate-config/tests/config_validation.rs
// ============================================================================
// Module: Config Validation Tests
// Description: Field-level validation of release-gate.toml sections.
// Purpose: Ensure invalid configuration fails closed with clear messages.
// Dependencies: release-gate-config, toml
// ============================================================================

//! Config validation tests for release-gate-config.

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

mod common;

use common::TestResult;
use common::assert_invalid;
use common::config_from_toml;
use common::minimal_config;
use release_gate_config::AuditSinkKind;
use release_gate_config::MAX_POLICY_DOCUMENT_BYTES;
use release_gate_core::MAX_DOCUMENT_BYTES;

#[test]
fn minimal_config_applies_defaults() -> TestResult {
    let config = minimal_config().map_err(|err| err.to_string())?;
    config.validate().map_err(|err| err.to_string())?;
    assert_eq!(config.policy.max_document_bytes, MAX_DOCUMENT_BYTES);
    assert_eq!(config.audit.sink, AuditSinkKind::None);
    assert_eq!(config.verifier.bundles_dir, None);
    Ok(())
}

#[test]
fn policy_section_is_required() {
    assert!(config_from_toml("").is_err());
}

#[test]
fn unknown_fields_are_rejected() {
    let result = config_from_toml(
        r#"
[policy]
organization = "org.json"
projects_dir = "projects"
orgnization = "typo.json"
"#,
    );
    assert!(result.is_err());
}

#[test]
fn blank_policy_paths_are_rejected() -> TestResult {
    let mut config = minimal_config().map_err(|err| err.to_string())?;
    config.policy.organization = "  ".to_string();
    assert_invalid(config.validate(), "policy.organization must be non-empty")?;

    let mut config = minimal_config().map_err(|err| err.to_string())?;
    config.policy.projects_dir = String::new();
    assert_invalid(config.validate(), "policy.projects_dir must be non-empty")
}

#[test]
fn document_limit_must_be_positive_and_bounded() -> TestResult {
    let mut config = minimal_config().map_err(|err| err.to_string())?;
    config.policy.max_document_bytes = 0;
    assert_invalid(config.validate(), "greater than zero")?;

    config.policy.max_document_bytes = MAX_POLICY_DOCUMENT_BYTES + 1;
    assert_invalid(config.validate(), "policy.max_document_bytes exceeds")?;

    config.policy.max_document_bytes = MAX_POLICY_DOCUMENT_BYTES;
    config.validate().map_err(|err| err.to_string())
}

#[test]
fn file_audit_sink_requires_path() -> TestResult {
    let config = config_from_toml(
        r#"
[policy]
organization = "org.json"
projects_dir = "projects"

[audit]
sink = "file"
"#,
    )
    .map_err(|err| err.to_string())?;
    assert_invalid(config.validate(), "audit.path is required")
}

#[test]
fn audit_path_is_rejected_for_other_sinks() -> TestResult {
    let config = config_from_toml(
        r#"
[policy]
organization = "org.json"
projects_dir = "projects"

[audit]
sink = "stderr"
path = "audit.log"
"#,
    )
    .map_err(|err| err.to_string())?;
    assert_invalid(config.validate(), "only valid for the file sink")
}

#[test]
fn unknown_audit_sink_fails_to_parse() {
    let result = config_from_toml(
        r#"
[policy]
organization = "org.json"
projects_dir = "projects"

[audit]
sink = "syslog"
"#,
    );
    assert!(result.is_err());
}

#[test]
fn bundles_dir_is_validated_when_present() -> TestResult {
    let mut config = minimal_config().map_err(|err| err.to_string())?;
    config.verifier.bundles_dir = Some(" ".to_string());
    assert_invalid(config.validate(), "verifier.bundles_dir must be non-empty")?;

    config.verifier.bundles_dir = Some(format!("bundles/{}", "b".repeat(256)));
    assert_invalid(config.validate(), "verifier.bundles_dir path component too long")
}
