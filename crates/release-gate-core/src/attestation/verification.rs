// crates/release-gate-core/src/attestation/verification.rs
// ============================================================================
// Module: Release Attestation Verification
// Description: Read-only checks of a parsed release statement.
// Purpose: Decide whether an authenticated attestation satisfies policy.
// Dependencies: serde_json, time
// ============================================================================

//! ## Overview
//! A [`Verification`] wraps a statement parsed from bytes returned by a
//! signature verifier. [`Verification::verify`] always checks the statement
//! header, subject binding, authorship, decision, and creation time, then
//! applies the caller's [`VerificationCheck`] list.
//!
//! Security posture: statement bytes are untrusted until every check passes.
//! Without an environment check the statement must not be scoped to any
//! environment, so an environment-scoped release never satisfies an
//! unscoped request.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Read;

use crate::attestation::RELEASE_PREDICATE_TYPE;
use crate::attestation::ReleaseDecision;
use crate::attestation::ReleaseStatement;
use crate::attestation::STATEMENT_TYPE;
use crate::attestation::Subject;
use crate::core::DigestSet;
use crate::core::PolicyError;
use crate::core::document::MAX_DOCUMENT_BYTES;
use crate::core::document::read_with_limit;
use crate::core::time::parse_rfc3339;

// ============================================================================
// SECTION: Checks
// ============================================================================

/// Policy requirements checked against a parsed attestation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationCheck {
    /// Recorded build level must be at least the value.
    BuildLevelAtLeast(u8),
    /// Recorded build level must equal the value.
    BuildLevelExactly(u8),
    /// Subject must be annotated with this environment.
    Environment(String),
    /// Author version must equal the value.
    AuthorVersion(String),
}

// ============================================================================
// SECTION: Verification
// ============================================================================

/// Parsed release attestation bound to one evaluation.
#[derive(Debug, Clone)]
pub struct Verification {
    /// Statement under verification.
    statement: ReleaseStatement,
}

impl Verification {
    /// Parses statement bytes.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError::Verification`] when the bytes are not a
    /// release statement.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, PolicyError> {
        let statement: ReleaseStatement = serde_json::from_slice(bytes).map_err(|err| {
            PolicyError::Verification(format!("attestation is not a release statement: {err}"))
        })?;
        Ok(Self {
            statement,
        })
    }

    /// Reads and parses a statement, bounded by the default document limit.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError::InvalidInput`] when the stream is too large and
    /// [`PolicyError::Verification`] when it does not parse.
    pub fn from_reader(reader: impl Read) -> Result<Self, PolicyError> {
        let bytes = read_with_limit(reader, MAX_DOCUMENT_BYTES)?;
        Self::from_bytes(&bytes)
    }

    /// Returns the parsed statement.
    #[must_use]
    pub const fn statement(&self) -> &ReleaseStatement {
        &self.statement
    }

    /// Verifies the statement for `name`/`digests` signed by `signer`.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError::InvalidInput`] for conflicting checks and
    /// [`PolicyError::Verification`] when any check fails.
    pub fn verify(
        &self,
        signer: &str,
        digests: &DigestSet,
        name: &str,
        checks: &[VerificationCheck],
    ) -> Result<(), PolicyError> {
        let requested_environment = requested_environment(checks)?;
        let subject = self.verify_header(name, digests)?;
        self.verify_predicate(signer)?;

        let environment = subject.environment().map_err(into_verification)?;
        match (requested_environment, environment) {
            (None, Some(found)) => {
                return Err(PolicyError::Verification(format!(
                    "attestation is scoped to environment {found} but no environment was requested"
                )));
            }
            (Some(wanted), None) => {
                return Err(PolicyError::Verification(format!(
                    "attestation has no environment, expected {wanted}"
                )));
            }
            (Some(wanted), Some(found)) if wanted != found => {
                return Err(PolicyError::Verification(format!(
                    "attestation environment {found} does not match {wanted}"
                )));
            }
            _ => {}
        }

        for check in checks {
            self.apply_check(check)?;
        }
        Ok(())
    }

    /// Checks statement/predicate types and the subject binding.
    fn verify_header(&self, name: &str, digests: &DigestSet) -> Result<&Subject, PolicyError> {
        let statement = &self.statement;
        if statement.statement_type != STATEMENT_TYPE {
            return Err(PolicyError::Verification(format!(
                "statement type {} is not {STATEMENT_TYPE}",
                statement.statement_type
            )));
        }
        if statement.predicate_type != RELEASE_PREDICATE_TYPE {
            return Err(PolicyError::Verification(format!(
                "predicate type {} is not {RELEASE_PREDICATE_TYPE}",
                statement.predicate_type
            )));
        }
        let [subject] = statement.subject.as_slice() else {
            return Err(PolicyError::Verification(format!(
                "attestation has {} subjects, expected 1",
                statement.subject.len()
            )));
        };
        if subject.name != name {
            return Err(PolicyError::Verification(format!(
                "subject name {} does not match {name}",
                subject.name
            )));
        }
        if !digests.is_covered_by(&subject.digest) {
            return Err(PolicyError::Verification(format!(
                "subject digests {} do not match {digests}",
                subject.digest
            )));
        }
        Ok(subject)
    }

    /// Checks authorship, decision, and creation time.
    fn verify_predicate(&self, signer: &str) -> Result<(), PolicyError> {
        let predicate = &self.statement.predicate;
        if predicate.author.id != signer {
            return Err(PolicyError::Verification(format!(
                "author {} is not the signer {signer}",
                predicate.author.id
            )));
        }
        if predicate.release_result != ReleaseDecision::Allow {
            return Err(PolicyError::Verification(format!(
                "release result is {}",
                predicate.release_result
            )));
        }
        parse_rfc3339(&predicate.creation_time).map_err(into_verification)?;
        Ok(())
    }

    /// Applies a single non-environment check.
    fn apply_check(&self, check: &VerificationCheck) -> Result<(), PolicyError> {
        let predicate = &self.statement.predicate;
        match check {
            VerificationCheck::BuildLevelAtLeast(minimum) => {
                let level = self.recorded_level()?;
                if level < *minimum {
                    return Err(PolicyError::Verification(format!(
                        "build level {level} is below required {minimum}"
                    )));
                }
            }
            VerificationCheck::BuildLevelExactly(expected) => {
                let level = self.recorded_level()?;
                if level != *expected {
                    return Err(PolicyError::Verification(format!(
                        "build level {level} is not {expected}"
                    )));
                }
            }
            VerificationCheck::AuthorVersion(expected) => {
                if predicate.author.version.as_deref() != Some(expected.as_str()) {
                    return Err(PolicyError::Verification(format!(
                        "author version does not match {expected}"
                    )));
                }
            }
            VerificationCheck::Environment(_) => {}
        }
        Ok(())
    }

    /// Returns the recorded build level, failing when absent or malformed.
    fn recorded_level(&self) -> Result<u8, PolicyError> {
        self.statement
            .predicate
            .build_level()
            .map_err(into_verification)?
            .ok_or_else(|| PolicyError::Verification("attestation has no build level".to_string()))
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Returns the single environment requested by `checks`.
fn requested_environment(checks: &[VerificationCheck]) -> Result<Option<&str>, PolicyError> {
    let mut requested: Option<&str> = None;
    for check in checks {
        if let VerificationCheck::Environment(environment) = check {
            match requested {
                Some(previous) if previous != environment.as_str() => {
                    return Err(PolicyError::InvalidInput(format!(
                        "conflicting environment checks {previous} and {environment}"
                    )));
                }
                _ => requested = Some(environment.as_str()),
            }
        }
    }
    Ok(requested)
}

/// Reclassifies a malformed-statement error as a verification failure.
fn into_verification(error: PolicyError) -> PolicyError {
    match error {
        PolicyError::InvalidInput(message) => PolicyError::Verification(message),
        other => other,
    }
}
