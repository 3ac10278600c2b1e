// crates/release-gate-core/src/attestation/creation.rs
// ============================================================================
// Module: Release Attestation Creation
// Description: Builder for well-formed, optionally frozen release statements.
// Purpose: Produce canonical statement bytes ready for an external signer.
// Dependencies: serde_jcs, serde_json, time
// ============================================================================

//! ## Overview
//! [`Creation::new`] builds the base statement and then applies an ordered
//! list of [`CreationOption`] values. The first failing option aborts
//! construction and the partial statement is dropped.
//!
//! ## Invariants
//! - The builder has two states, mutable and frozen. [`CreationOption::SafeMode`]
//!   moves it to frozen and there is no way back.
//! - While frozen, options editing trust-relevant fields (environment, build
//!   level) are rejected centrally before they run.
//! - Build levels can only be recorded on `ALLOW` decisions.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde_json::Value;
use time::OffsetDateTime;

use crate::attestation::Author;
use crate::attestation::BUILD_LEVEL_PROPERTY;
use crate::attestation::ENVIRONMENT_ANNOTATION;
use crate::attestation::MAX_BUILD_LEVEL;
use crate::attestation::PolicySnapshot;
use crate::attestation::RELEASE_PREDICATE_TYPE;
use crate::attestation::ReleaseDecision;
use crate::attestation::ReleasePredicate;
use crate::attestation::ReleaseStatement;
use crate::attestation::STATEMENT_TYPE;
use crate::attestation::Subject;
use crate::core::PolicyError;
use crate::core::time::format_rfc3339;
use crate::core::time::now_rfc3339;

// ============================================================================
// SECTION: Options
// ============================================================================

/// Recognized mutations applied to a statement under construction.
#[derive(Debug, Clone, PartialEq)]
pub enum CreationOption {
    /// Sets the author version.
    AuthorVersion(String),
    /// Annotates the subject with a target environment.
    Environment(String),
    /// Embeds a snapshot of the evaluated policies.
    Policy(PolicySnapshot),
    /// Records the SLSA build level (`ALLOW` only, `[0, 4]`).
    SlsaBuildLevel(u8),
    /// Overrides the wall-clock creation time.
    CreationTime(OffsetDateTime),
    /// Freezes trust-relevant fields.
    SafeMode,
}

impl CreationOption {
    /// Returns the trust-relevant field this option edits, if any.
    const fn frozen_field(&self) -> Option<&'static str> {
        match self {
            Self::Environment(_) => Some("environment"),
            Self::SlsaBuildLevel(_) => Some("SLSA build level"),
            Self::AuthorVersion(_)
            | Self::Policy(_)
            | Self::CreationTime(_)
            | Self::SafeMode => None,
        }
    }
}

/// Builder lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lifecycle {
    /// All fields may be edited.
    Mutable,
    /// Trust-relevant fields are locked.
    Frozen,
}

// ============================================================================
// SECTION: Creation
// ============================================================================

/// Release attestation under construction.
#[derive(Debug, Clone)]
pub struct Creation {
    /// Statement being built.
    statement: ReleaseStatement,
    /// Current lifecycle state.
    lifecycle: Lifecycle,
}

impl Creation {
    /// Builds a statement for `subject` and applies `options` in order.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError::InvalidInput`] when the subject or author is
    /// malformed or any option is rejected.
    pub fn new(
        subject: Subject,
        author_id: impl Into<String>,
        decision: ReleaseDecision,
        options: impl IntoIterator<Item = CreationOption>,
    ) -> Result<Self, PolicyError> {
        subject.validate()?;
        let author_id = author_id.into();
        if author_id.trim().is_empty() {
            return Err(PolicyError::InvalidInput("author id is empty".to_string()));
        }
        let mut creation = Self {
            statement: ReleaseStatement {
                statement_type: STATEMENT_TYPE.to_string(),
                predicate_type: RELEASE_PREDICATE_TYPE.to_string(),
                subject: vec![subject],
                predicate: ReleasePredicate {
                    author: Author {
                        id: author_id,
                        version: None,
                    },
                    creation_time: now_rfc3339()?,
                    policy: PolicySnapshot::new(),
                    release_result: decision,
                    release_properties: crate::attestation::Properties::new(),
                    dependency_properties: std::collections::BTreeMap::new(),
                },
            },
            lifecycle: Lifecycle::Mutable,
        };
        for option in options {
            creation.apply(option)?;
        }
        Ok(creation)
    }

    /// Returns the statement built so far.
    #[must_use]
    pub const fn statement(&self) -> &ReleaseStatement {
        &self.statement
    }

    /// Returns true once safe mode has frozen trust-relevant fields.
    #[must_use]
    pub fn is_safe_mode(&self) -> bool {
        self.lifecycle == Lifecycle::Frozen
    }

    /// Serializes the statement as RFC 8785 canonical JSON.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError::Internal`] when serialization fails.
    pub fn to_bytes(&self) -> Result<Vec<u8>, PolicyError> {
        serde_jcs::to_vec(&self.statement)
            .map_err(|err| PolicyError::Internal(format!("failed to serialize attestation: {err}")))
    }

    /// Applies a single option, enforcing the lifecycle.
    fn apply(&mut self, option: CreationOption) -> Result<(), PolicyError> {
        if self.lifecycle == Lifecycle::Frozen
            && let Some(field) = option.frozen_field()
        {
            return Err(PolicyError::InvalidInput(format!(
                "safe mode enabled, cannot edit {field}"
            )));
        }
        match option {
            CreationOption::AuthorVersion(version) => {
                self.statement.predicate.author.version = Some(version);
            }
            CreationOption::Environment(environment) => self.set_environment(environment)?,
            CreationOption::Policy(policy) => self.statement.predicate.policy = policy,
            CreationOption::SlsaBuildLevel(level) => self.set_build_level(level)?,
            CreationOption::CreationTime(time) => {
                self.statement.predicate.creation_time = format_rfc3339(time)?;
            }
            CreationOption::SafeMode => self.lifecycle = Lifecycle::Frozen,
        }
        Ok(())
    }

    /// Annotates the single subject with an environment label.
    fn set_environment(&mut self, environment: String) -> Result<(), PolicyError> {
        if environment.trim().is_empty() {
            return Err(PolicyError::InvalidInput("environment is empty".to_string()));
        }
        let subject = self
            .statement
            .subject
            .first_mut()
            .ok_or_else(|| PolicyError::Internal("statement has no subject".to_string()))?;
        subject.annotations.insert(ENVIRONMENT_ANNOTATION.to_string(), Value::String(environment));
        Ok(())
    }

    /// Records the build level for an `ALLOW` decision.
    fn set_build_level(&mut self, level: u8) -> Result<(), PolicyError> {
        let decision = self.statement.predicate.release_result;
        if decision != ReleaseDecision::Allow {
            return Err(PolicyError::InvalidInput(format!(
                "level cannot be set for {decision} result"
            )));
        }
        if level > MAX_BUILD_LEVEL {
            return Err(PolicyError::InvalidInput(format!(
                "level ({level}) is too large, maximum is {MAX_BUILD_LEVEL}"
            )));
        }
        self.statement
            .predicate
            .release_properties
            .insert(BUILD_LEVEL_PROPERTY.to_string(), Value::from(level));
        Ok(())
    }
}
