// crates/release-gate-config/src/config.rs
// ============================================================================
// Module: Release Gate Configuration
// Description: Configuration loading and validation for Release Gate.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: release-gate-core, serde, toml
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size and path limits.
//! Missing or invalid configuration fails closed. Relative paths inside the
//! file resolve against the directory containing the config file.
//! Security posture: config inputs are untrusted.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::fs;
use std::fs::File;
use std::path::Path;
use std::path::PathBuf;

use release_gate_core::AuditSink;
use release_gate_core::DeploymentPolicy;
use release_gate_core::MAX_DOCUMENT_BYTES;
use release_gate_core::PolicyError;
use release_gate_core::PolicyValidator;
use release_gate_core::runtime::FileAuditSink;
use release_gate_core::runtime::NoopAuditSink;
use release_gate_core::runtime::StderrAuditSink;
use serde::Deserialize;
use thiserror::Error;

use crate::source::DirectoryDocumentIterator;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
const DEFAULT_CONFIG_NAME: &str = "release-gate.toml";
/// Environment variable used to override the config path.
pub(crate) const CONFIG_ENV_VAR: &str = "RELEASE_GATE_CONFIG";
/// Maximum configuration file size in bytes.
pub(crate) const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
pub(crate) const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
pub(crate) const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Upper bound accepted for `policy.max_document_bytes`.
pub const MAX_POLICY_DOCUMENT_BYTES: usize = 16 * 1024 * 1024;

// ============================================================================
// SECTION: Configuration Model
// ============================================================================

/// Top-level Release Gate configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReleaseGateConfig {
    /// Policy document locations and limits.
    pub policy: PolicyConfig,
    /// Release attestation source settings.
    #[serde(default)]
    pub verifier: VerifierConfig,
    /// Evaluation audit settings.
    #[serde(default)]
    pub audit: AuditConfig,
    /// Directory relative paths resolve against (set by [`Self::load`]).
    #[serde(skip)]
    pub base_dir: Option<PathBuf>,
}

impl ReleaseGateConfig {
    /// Loads configuration from disk using the default resolution rules.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let resolved = resolve_path(path)?;
        validate_path(&resolved)?;
        let bytes = fs::read(&resolved).map_err(|err| ConfigError::Io(err.to_string()))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        let mut config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.base_dir = resolved.parent().map(Path::to_path_buf);
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.policy.validate()?;
        self.verifier.validate()?;
        self.audit.validate()
    }

    /// Resolves a configured path against the config file directory.
    #[must_use]
    pub fn resolve(&self, value: &str) -> PathBuf {
        let path = Path::new(value.trim());
        match &self.base_dir {
            Some(base) if path.is_relative() => base.join(path),
            _ => path.to_path_buf(),
        }
    }

    /// Returns the resolved organization policy path.
    #[must_use]
    pub fn organization_path(&self) -> PathBuf {
        self.resolve(&self.policy.organization)
    }

    /// Returns the resolved project policy directory.
    #[must_use]
    pub fn projects_dir(&self) -> PathBuf {
        self.resolve(&self.policy.projects_dir)
    }

    /// Returns the resolved attestation bundle directory, when configured.
    #[must_use]
    pub fn bundles_dir(&self) -> Option<PathBuf> {
        self.verifier.bundles_dir.as_deref().map(|value| self.resolve(value))
    }

    /// Builds the deployment policy from the configured documents.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError`] when a document cannot be read or is invalid.
    pub fn load_deployment_policy(
        &self,
        validator: Option<&dyn PolicyValidator>,
    ) -> Result<DeploymentPolicy, PolicyError> {
        let organization_path = self.organization_path();
        let organization = File::open(&organization_path).map_err(|err| {
            PolicyError::Internal(format!(
                "failed to open organization policy {}: {err}",
                organization_path.display()
            ))
        })?;
        let projects = DirectoryDocumentIterator::new(&self.projects_dir())?;
        DeploymentPolicy::with_limit(
            organization,
            projects,
            validator,
            self.policy.max_document_bytes,
        )
    }

    /// Builds the configured audit sink.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] when the audit file cannot be opened.
    pub fn build_audit_sink(&self) -> Result<Box<dyn AuditSink>, ConfigError> {
        match self.audit.sink {
            AuditSinkKind::None => Ok(Box::new(NoopAuditSink)),
            AuditSinkKind::Stderr => Ok(Box::new(StderrAuditSink)),
            AuditSinkKind::File => {
                let Some(path) = self.audit.path.as_deref() else {
                    return Err(ConfigError::Invalid(
                        "audit.path is required for the file sink".to_string(),
                    ));
                };
                let sink = FileAuditSink::new(&self.resolve(path))
                    .map_err(|err| ConfigError::Io(err.to_string()))?;
                Ok(Box::new(sink))
            }
        }
    }
}

/// Policy document configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PolicyConfig {
    /// Path to the organization policy document.
    pub organization: String,
    /// Directory holding one `*.json` project document per policy id.
    pub projects_dir: String,
    /// Maximum size of any single policy document.
    #[serde(default = "default_max_document_bytes")]
    pub max_document_bytes: usize,
}

impl PolicyConfig {
    /// Validates policy configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        validate_path_string("policy.organization", &self.organization)?;
        validate_path_string("policy.projects_dir", &self.projects_dir)?;
        if self.max_document_bytes == 0 {
            return Err(ConfigError::Invalid(
                "policy.max_document_bytes must be greater than zero".to_string(),
            ));
        }
        if self.max_document_bytes > MAX_POLICY_DOCUMENT_BYTES {
            return Err(ConfigError::Invalid(format!(
                "policy.max_document_bytes exceeds {MAX_POLICY_DOCUMENT_BYTES}"
            )));
        }
        Ok(())
    }
}

/// Default per-document size limit.
const fn default_max_document_bytes() -> usize {
    MAX_DOCUMENT_BYTES
}

/// Release attestation source configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VerifierConfig {
    /// Directory of pre-verified attestation bundles, keyed by sha256 digest.
    #[serde(default)]
    pub bundles_dir: Option<String>,
}

impl VerifierConfig {
    /// Validates verifier configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(dir) = &self.bundles_dir {
            validate_path_string("verifier.bundles_dir", dir)?;
        }
        Ok(())
    }
}

/// Audit sink selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditSinkKind {
    /// Discard audit events.
    #[default]
    None,
    /// JSON lines on stderr.
    Stderr,
    /// JSON lines appended to `audit.path`.
    File,
}

/// Evaluation audit configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuditConfig {
    /// Sink receiving one event per deployment evaluation.
    #[serde(default)]
    pub sink: AuditSinkKind,
    /// Audit log path for the file sink.
    #[serde(default)]
    pub path: Option<String>,
}

impl AuditConfig {
    /// Validates audit configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        match (self.sink, &self.path) {
            (AuditSinkKind::File, Some(path)) => validate_path_string("audit.path", path),
            (AuditSinkKind::File, None) => Err(ConfigError::Invalid(
                "audit.path is required for the file sink".to_string(),
            )),
            (_, Some(_)) => Err(ConfigError::Invalid(
                "audit.path is only valid for the file sink".to_string(),
            )),
            (_, None) => Ok(()),
        }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration loading or validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves the config path from CLI or environment defaults.
fn resolve_path(path: Option<&Path>) -> Result<PathBuf, ConfigError> {
    if let Some(path) = path {
        return Ok(path.to_path_buf());
    }
    if let Ok(env_path) = env::var(CONFIG_ENV_VAR) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok(PathBuf::from(env_path));
    }
    Ok(PathBuf::from(DEFAULT_CONFIG_NAME))
}

/// Validates the resolved path against security limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

/// Validates a path string against length constraints.
fn validate_path_string(field: &str, value: &str) -> Result<(), ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if trimmed.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} exceeds max length")));
    }
    for component in Path::new(trimmed).components() {
        if component.as_os_str().len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid(format!("{field} path component too long")));
        }
    }
    Ok(())
}

// ============================================================================
// SECTION: Tests
// ============================================================================
