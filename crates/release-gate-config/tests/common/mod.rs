// crates/release-gate-config/tests/common/mod.rs
// =============================================================================
// Module: Config Test Helpers
// Description: Shared helpers for config validation tests.
// Purpose: Reduce duplication across integration tests for release-gate-config.
// =============================================================================

#![allow(dead_code, reason = "Test helpers are selectively used across suites.")]

use std::fs;
use std::path::Path;

use release_gate_config::ConfigError;
use release_gate_config::ReleaseGateConfig;
use serde_json::json;

/// Releaser identity accepted by the fixture organization policy.
pub const RELEASER: &str = "https://releaser.example/workflow@refs/heads/main";

/// Result type for tests that report failures as strings.
pub type TestResult = Result<(), String>;

/// Parses a TOML string into a `ReleaseGateConfig` for tests.
pub fn config_from_toml(toml_str: &str) -> Result<ReleaseGateConfig, toml::de::Error> {
    toml::from_str(toml_str)
}

/// Returns a minimal valid config.
pub fn minimal_config() -> Result<ReleaseGateConfig, toml::de::Error> {
    config_from_toml(
        r#"
[policy]
organization = "org.json"
projects_dir = "projects"
"#,
    )
}

/// Asserts that validation failed with a message containing `needle`.
pub fn assert_invalid(result: Result<(), ConfigError>, needle: &str) -> TestResult {
    match result {
        Err(error) => {
            let message = error.to_string();
            if message.contains(needle) {
                Ok(())
            } else {
                Err(format!("error '{message}' did not contain '{needle}'"))
            }
        }
        Ok(()) => Err(format!("expected invalid config containing '{needle}'")),
    }
}

/// Writes an organization document and the given project documents under
/// `root`, returning nothing; projects land in `root/projects/<id>.json`.
pub fn write_policy_tree(root: &Path, projects: &[(&str, serde_json::Value)]) {
    let organization = json!({
        "format": 1,
        "roots": { "release": [ { "id": RELEASER } ] },
        "build": { "min_slsa_level": 2 }
    });
    fs::write(root.join("org.json"), organization.to_string()).unwrap();
    let dir = root.join("projects");
    fs::create_dir_all(&dir).unwrap();
    for (id, document) in projects {
        fs::write(dir.join(format!("{id}.json")), document.to_string()).unwrap();
    }
}

/// Returns a project document protecting a single package.
pub fn project(package: &str) -> serde_json::Value {
    json!({
        "format": 1,
        "principal": { "uri": "k8s_sa://deployer@project" },
        "packages": [ { "name": package } ]
    })
}
