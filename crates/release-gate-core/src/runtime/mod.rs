// crates/release-gate-core/src/runtime/mod.rs
// ============================================================================
// Module: Release Gate Runtime
// Description: Release verification, audited gates, and audit sinks.
// Purpose: Run policy evaluations against real capabilities.
// Dependencies: crate::{attestation, core, interfaces, policy}
// ============================================================================

//! ## Overview
//! Runtime modules connect the pure policy layer to external capabilities:
//! [`ReleaseVerifier`] adapts a signature capability into release
//! verification and [`DeploymentGate`] audits each deployment decision.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod audit;
pub mod gate;
pub mod release_verifier;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use audit::AuditOutcome;
pub use audit::AuditSink;
pub use audit::EvaluationAuditEvent;
pub use audit::EvaluationAuditEventParams;
pub use audit::FileAuditSink;
pub use audit::NoopAuditSink;
pub use audit::StderrAuditSink;
pub use gate::DeploymentGate;
pub use release_verifier::ReleaseVerifier;
