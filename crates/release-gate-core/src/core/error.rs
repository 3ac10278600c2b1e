// crates/release-gate-core/src/core/error.rs
// ============================================================================
// Module: Release Gate Errors
// Description: Typed failure kinds surfaced by policy evaluation and attestations.
// Purpose: Give callers a stable error taxonomy with identifying context.
// Dependencies: thiserror
// ============================================================================

//! ## Overview
//! Every fallible core operation returns [`PolicyError`]. Each variant maps to
//! one of four [`ErrorKind`] values so gates can distinguish caller bugs
//! (`InvalidInput`), missing policy entries (`NotFound`), legitimate deny
//! outcomes (`Verification`), and faults (`Internal`).
//!
//! Lower layers annotate errors through [`PolicyError::with_context`] instead
//! of discarding them; the kind never changes while context is added.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use thiserror::Error;

// ============================================================================
// SECTION: Error Kinds
// ============================================================================

/// Stable classification of a [`PolicyError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed request or configuration; not retryable.
    InvalidInput,
    /// Referenced policy id or package policy is absent.
    NotFound,
    /// Attestation, signature, or environment checks failed.
    Verification,
    /// Serialization failure or unexpected invariant violation.
    Internal,
}

impl ErrorKind {
    /// Returns the snake-case label used in audit records.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InvalidInput => "invalid_input",
            Self::NotFound => "not_found",
            Self::Verification => "verification",
            Self::Internal => "internal",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Policy Error
// ============================================================================

/// Errors raised by policy construction, evaluation, and attestation handling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyError {
    /// Malformed request or configuration.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// Referenced policy entry does not exist.
    #[error("not found: {0}")]
    NotFound(String),
    /// Attestation or signature checks failed.
    #[error("verification failed: {0}")]
    Verification(String),
    /// Unexpected internal failure.
    #[error("internal error: {0}")]
    Internal(String),
    /// Every candidate (environment or releaser root) was attempted and failed.
    #[error("verification failed for {subject}: {}", render_failures(.failures))]
    CandidatesExhausted {
        /// Artifact or policy entry the candidates were tried for.
        subject: String,
        /// Per-candidate failures in attempt order.
        failures: Vec<CandidateFailure>,
    },
}

impl PolicyError {
    /// Returns the stable kind of the error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidInput(_) => ErrorKind::InvalidInput,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Verification(_) | Self::CandidatesExhausted { .. } => ErrorKind::Verification,
            Self::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Prefixes the error message with identifying context, preserving the kind.
    #[must_use]
    pub fn with_context(self, context: impl fmt::Display) -> Self {
        match self {
            Self::InvalidInput(message) => Self::InvalidInput(format!("{context}: {message}")),
            Self::NotFound(message) => Self::NotFound(format!("{context}: {message}")),
            Self::Verification(message) => Self::Verification(format!("{context}: {message}")),
            Self::Internal(message) => Self::Internal(format!("{context}: {message}")),
            Self::CandidatesExhausted {
                subject,
                failures,
            } => Self::CandidatesExhausted {
                subject: format!("{context}: {subject}"),
                failures,
            },
        }
    }

    /// Returns the per-candidate failures when every candidate failed.
    #[must_use]
    pub fn candidate_failures(&self) -> &[CandidateFailure] {
        match self {
            Self::CandidatesExhausted {
                failures, ..
            } => failures,
            _ => &[],
        }
    }
}

/// A single failed candidate inside [`PolicyError::CandidatesExhausted`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateFailure {
    /// Candidate label (environment name or releaser identity).
    pub candidate: String,
    /// Failure observed for the candidate.
    pub error: PolicyError,
}

impl CandidateFailure {
    /// Creates a new candidate failure record.
    #[must_use]
    pub fn new(candidate: impl Into<String>, error: PolicyError) -> Self {
        Self {
            candidate: candidate.into(),
            error,
        }
    }
}

/// Joins candidate failures into a single human-readable message.
fn render_failures(failures: &[CandidateFailure]) -> String {
    failures
        .iter()
        .map(|failure| format!("[{}] {}", failure.candidate, failure.error))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Collapses accumulated candidate failures into one error.
///
/// Returns [`PolicyError::Internal`] when no candidate was attempted, which
/// indicates a caller bug rather than a deny outcome.
#[must_use]
pub fn exhausted(subject: impl Into<String>, failures: Vec<CandidateFailure>) -> PolicyError {
    let subject = subject.into();
    if failures.is_empty() {
        return PolicyError::Internal(format!("{subject}: no candidates were attempted"));
    }
    PolicyError::CandidatesExhausted {
        subject,
        failures,
    }
}
