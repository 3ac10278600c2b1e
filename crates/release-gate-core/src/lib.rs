// crates/release-gate-core/src/lib.rs
// ============================================================================
// Module: Release Gate Core Library
// Description: Public API surface for the Release Gate core.
// Purpose: Expose trust types, attestations, policies, and runtime helpers.
// Dependencies: crate::{attestation, core, interfaces, policy, runtime}
// ============================================================================

//! ## Overview
//! Release Gate core decides whether a content-addressed artifact may be
//! published or deployed. Decisions compose an organization policy with
//! per-project rules and consult signed release or build attestations
//! through capability traits; the core never performs signature
//! cryptography itself.
//!
//! Security posture: policy documents, attestation bytes, and request
//! inputs are untrusted and every check fails closed.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod attestation;
pub mod core;
pub mod interfaces;
pub mod policy;
pub mod runtime;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use core::*;

pub use attestation::ReleaseDecision;
pub use attestation::ReleaseStatement;
pub use attestation::Subject;
pub use attestation::creation::Creation;
pub use attestation::creation::CreationOption;
pub use attestation::verification::Verification;
pub use attestation::verification::VerificationCheck;
pub use interfaces::BuildAttestationVerifier;
pub use interfaces::PackageDescriptor;
pub use interfaces::PackageHelper;
pub use interfaces::PolicyValidator;
pub use interfaces::ReleaseAttestationVerifier;
pub use interfaces::ReleaseVerifierConfig;
pub use interfaces::SignatureError;
pub use interfaces::SignatureVerifier;
pub use interfaces::SignedAttestation;
pub use interfaces::ValidationPackage;
pub use policy::DeploymentPolicy;
pub use policy::OrganizationPolicy;
pub use policy::PolicyEvaluationResult;
pub use policy::ProjectPolicy;
pub use policy::Protection;
pub use policy::PublishPolicy;
pub use policy::PublishRequest;
pub use runtime::AuditSink;
pub use runtime::DeploymentGate;
pub use runtime::ReleaseVerifier;
