// crates/release-gate-core/src/attestation/mod.rs
// ============================================================================
// Module: Release Attestation Model
// Description: in-toto statement schema for release/deploy decisions.
// Purpose: Share one statement model between creation and verification.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! A release attestation is an in-toto v1 statement whose predicate records
//! who decided (author), when, the decision (`ALLOW`/`DENY`), and the trust
//! properties backing it (build level, per-dependency properties, and a
//! snapshot of the policies evaluated).
//!
//! The statement is built by [`creation::Creation`] and consumed read-only by
//! [`verification::Verification`]. Neither view mutates a statement after it
//! leaves the builder.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod creation;
pub mod verification;

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::core::DigestSet;
use crate::core::PolicyError;
use crate::core::validate_artifact_name;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// in-toto statement type URI.
pub const STATEMENT_TYPE: &str = "https://in-toto.io/Statement/v1";
/// Release attestation predicate type URI.
pub const RELEASE_PREDICATE_TYPE: &str = "https://slsa.dev/release_attestation/v1";
/// Release property key carrying the SLSA build level.
pub const BUILD_LEVEL_PROPERTY: &str = "slsa.dev/build/level";
/// Subject annotation carrying the target environment label.
pub const ENVIRONMENT_ANNOTATION: &str = "environment";
/// Subject annotation reserved for artifact versions.
pub const VERSION_ANNOTATION: &str = "version";
/// Highest SLSA build level an attestation can record.
pub const MAX_BUILD_LEVEL: u8 = 4;
/// Lowest build level that is meaningful as a minimum requirement.
pub const MIN_REQUIRED_BUILD_LEVEL: u8 = 1;

// ============================================================================
// SECTION: Statement
// ============================================================================

/// Free-form property bag keyed by property name.
pub type Properties = BTreeMap<String, Value>;

/// Snapshot of the policies an attestation decision was made under.
pub type PolicySnapshot = BTreeMap<String, PolicyReference>;

/// Release attestation statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReleaseStatement {
    /// Statement type URI.
    #[serde(rename = "_type")]
    pub statement_type: String,
    /// Predicate type URI.
    #[serde(rename = "predicateType")]
    pub predicate_type: String,
    /// Attested artifacts.
    pub subject: Vec<Subject>,
    /// Release decision predicate.
    pub predicate: ReleasePredicate,
}

/// Attested artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subject {
    /// Artifact name (no tag or digest).
    pub name: String,
    /// Artifact digests.
    pub digest: DigestSet,
    /// Subject annotations (`environment`, reserved `version`).
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, Value>,
}

impl Subject {
    /// Creates a subject without annotations.
    #[must_use]
    pub fn new(name: impl Into<String>, digest: DigestSet) -> Self {
        Self {
            name: name.into(),
            digest,
            annotations: BTreeMap::new(),
        }
    }

    /// Validates the subject structure.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError::InvalidInput`] when the name is empty, padded,
    /// or already encodes a tag or digest.
    pub fn validate(&self) -> Result<(), PolicyError> {
        validate_artifact_name(&self.name).map_err(|err| err.with_context("subject"))?;
        if self.name.trim() != self.name {
            return Err(PolicyError::InvalidInput(format!(
                "subject name \"{}\" has surrounding whitespace",
                self.name
            )));
        }
        Ok(())
    }

    /// Returns the environment annotation, if any.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError::InvalidInput`] when the annotation is not a string.
    pub fn environment(&self) -> Result<Option<&str>, PolicyError> {
        match self.annotations.get(ENVIRONMENT_ANNOTATION) {
            None => Ok(None),
            Some(Value::String(env)) => Ok(Some(env.as_str())),
            Some(_) => Err(PolicyError::InvalidInput(
                "environment annotation is not a string".to_string(),
            )),
        }
    }
}

/// Attestation author.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    /// Author identity.
    pub id: String,
    /// Author version.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

/// Release decision recorded in the predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReleaseDecision {
    /// Release permitted.
    #[serde(rename = "ALLOW")]
    Allow,
    /// Release denied.
    #[serde(rename = "DENY")]
    Deny,
}

impl fmt::Display for ReleaseDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Allow => f.write_str("ALLOW"),
            Self::Deny => f.write_str("DENY"),
        }
    }
}

/// Reference to a policy document evaluated for a decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyReference {
    /// Policy location.
    pub uri: String,
    /// Policy content digests.
    pub digest: DigestSet,
}

/// Release decision predicate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReleasePredicate {
    /// Decision author.
    pub author: Author,
    /// RFC 3339 creation time.
    pub creation_time: String,
    /// Policies evaluated for the decision.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub policy: PolicySnapshot,
    /// Decision outcome.
    pub release_result: ReleaseDecision,
    /// Trust properties of the release.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub release_properties: Properties,
    /// Trust properties per dependency.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub dependency_properties: BTreeMap<String, Properties>,
}

impl ReleasePredicate {
    /// Returns the recorded build level, if any.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError::InvalidInput`] when the property is not an
    /// integer in `[0, 4]`.
    pub fn build_level(&self) -> Result<Option<u8>, PolicyError> {
        let Some(value) = self.release_properties.get(BUILD_LEVEL_PROPERTY) else {
            return Ok(None);
        };
        let level = value
            .as_u64()
            .and_then(|level| u8::try_from(level).ok())
            .filter(|level| *level <= MAX_BUILD_LEVEL)
            .ok_or_else(|| {
                PolicyError::InvalidInput(format!(
                    "{BUILD_LEVEL_PROPERTY} ({value}) is not a level between 0 and \
                     {MAX_BUILD_LEVEL}"
                ))
            })?;
        Ok(Some(level))
    }
}
