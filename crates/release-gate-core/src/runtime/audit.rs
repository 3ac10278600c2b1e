// crates/release-gate-core/src/runtime/audit.rs
// ============================================================================
// Module: Release Gate Audit Logging
// Description: Structured audit events for gate evaluations.
// Purpose: Emit JSON-line decision records without a logging framework.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! Every evaluation performed through a gate produces one
//! [`EvaluationAuditEvent`]. Sinks serialize events as single JSON lines so
//! deployments can route them to their preferred logging pipeline. Sink
//! failures never change an evaluation outcome.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use serde::Serialize;

use crate::core::ErrorKind;
use crate::core::PolicyId;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Evaluation outcome recorded in audit events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditOutcome {
    /// The artifact satisfied the policy.
    Allow,
    /// The artifact was rejected or evaluation failed.
    Deny,
}

/// Deployment evaluation audit event payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EvaluationAuditEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Policy identifier requested.
    pub policy_id: PolicyId,
    /// Package name requested.
    pub package: String,
    /// Canonical digest rendering of the evaluated artifact.
    pub digests: String,
    /// Evaluation outcome.
    pub outcome: AuditOutcome,
    /// Error kind when the evaluation failed.
    pub error_kind: Option<&'static str>,
    /// Error message when the evaluation failed.
    pub error: Option<String>,
    /// Matched environment on success.
    pub environment: Option<String>,
    /// Enforced build level on success.
    pub build_level: Option<u8>,
}

/// Inputs required to construct an evaluation audit event.
pub struct EvaluationAuditEventParams {
    /// Policy identifier requested.
    pub policy_id: PolicyId,
    /// Package name requested.
    pub package: String,
    /// Canonical digest rendering.
    pub digests: String,
    /// Error kind and message when the evaluation failed.
    pub failure: Option<(ErrorKind, String)>,
    /// Matched environment on success.
    pub environment: Option<String>,
    /// Enforced build level on success.
    pub build_level: Option<u8>,
}

impl EvaluationAuditEvent {
    /// Creates a new audit event with a consistent timestamp.
    #[must_use]
    pub fn new(params: EvaluationAuditEventParams) -> Self {
        let timestamp_ms =
            SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis();
        let (outcome, error_kind, error) = match params.failure {
            None => (AuditOutcome::Allow, None, None),
            Some((kind, message)) => (AuditOutcome::Deny, Some(kind.as_str()), Some(message)),
        };
        Self {
            event: "deployment_evaluation",
            timestamp_ms,
            policy_id: params.policy_id,
            package: params.package,
            digests: params.digests,
            outcome,
            error_kind,
            error,
            environment: params.environment,
            build_level: params.build_level,
        }
    }
}

// ============================================================================
// SECTION: Trait
// ============================================================================

/// Audit sink for evaluation events.
pub trait AuditSink: Send + Sync {
    /// Record an audit event.
    fn record(&self, event: &EvaluationAuditEvent);
}

/// Audit sink that logs JSON lines to stderr.
pub struct StderrAuditSink;

impl AuditSink for StderrAuditSink {
    fn record(&self, event: &EvaluationAuditEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            let _ = writeln!(std::io::stderr(), "{payload}");
        }
    }
}

/// Audit sink that logs JSON lines to a file.
pub struct FileAuditSink {
    /// File handle used for append-only logging.
    file: Mutex<std::fs::File>,
}

impl FileAuditSink {
    /// Opens the audit log file in append mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub fn new(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }
}

impl AuditSink for FileAuditSink {
    fn record(&self, event: &EvaluationAuditEvent) {
        if let Ok(payload) = serde_json::to_string(event)
            && let Ok(mut file) = self.file.lock()
        {
            let _ = writeln!(file, "{payload}");
            let _ = file.flush();
        }
    }
}

/// No-op audit sink.
pub struct NoopAuditSink;

impl AuditSink for NoopAuditSink {
    fn record(&self, _event: &EvaluationAuditEvent) {}
}
