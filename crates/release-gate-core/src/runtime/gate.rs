// crates/release-gate-core/src/runtime/gate.rs
// ============================================================================
// Module: Deployment Gate
// Description: Audited deployment policy evaluation.
// Purpose: Pair a deployment policy with a verifier and an audit sink.
// Dependencies: crate::{core, interfaces, policy}
// ============================================================================

//! ## Overview
//! [`DeploymentPolicy::evaluate`] is pure apart from the verifier call. The
//! gate is the one place where evaluations leave a trace: every call records
//! exactly one [`EvaluationAuditEvent`], allowed or denied, and then returns
//! the policy's result unchanged.

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::core::DigestSet;
use crate::core::PolicyError;
use crate::core::PolicyId;
use crate::interfaces::ReleaseAttestationVerifier;
use crate::policy::DeploymentPolicy;
use crate::policy::Protection;
use crate::runtime::audit::AuditSink;
use crate::runtime::audit::EvaluationAuditEvent;
use crate::runtime::audit::EvaluationAuditEventParams;

// ============================================================================
// SECTION: Deployment Gate
// ============================================================================

/// Deployment policy evaluator that audits every decision.
pub struct DeploymentGate<V> {
    /// Composed deployment policy.
    policy: DeploymentPolicy,
    /// Release attestation verifier.
    verifier: V,
    /// Audit sink receiving one event per evaluation.
    audit: Box<dyn AuditSink>,
}

impl<V: ReleaseAttestationVerifier> DeploymentGate<V> {
    /// Creates a gate over `policy`, `verifier`, and `audit`.
    #[must_use]
    pub fn new(policy: DeploymentPolicy, verifier: V, audit: Box<dyn AuditSink>) -> Self {
        Self {
            policy,
            verifier,
            audit,
        }
    }

    /// Returns the composed policy.
    #[must_use]
    pub const fn policy(&self) -> &DeploymentPolicy {
        &self.policy
    }

    /// Evaluates a deployment request and records the outcome.
    ///
    /// # Errors
    ///
    /// Returns the policy evaluation error unchanged.
    pub fn evaluate(
        &self,
        digests: &DigestSet,
        package_name: &str,
        policy_id: &PolicyId,
    ) -> Result<Protection, PolicyError> {
        let result = self.policy.evaluate(digests, package_name, policy_id, &self.verifier);
        let (failure, environment, build_level) = match &result {
            Ok(protection) => (None, protection.environment.clone(), Some(protection.build_level)),
            Err(err) => (Some((err.kind(), err.to_string())), None, None),
        };
        self.audit.record(&EvaluationAuditEvent::new(EvaluationAuditEventParams {
            policy_id: policy_id.clone(),
            package: package_name.to_string(),
            digests: digests.to_string(),
            failure,
            environment,
            build_level,
        }));
        result
    }
}
