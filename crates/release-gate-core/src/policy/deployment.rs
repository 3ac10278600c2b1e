// crates/release-gate-core/src/policy/deployment.rs
// ============================================================================
// Module: Deployment Policy
// Description: Top-level composition of organization and project policies.
// Purpose: Answer whether an artifact may be deployed under a policy id.
// Dependencies: crate::core, crate::interfaces
// ============================================================================

//! ## Overview
//! [`DeploymentPolicy`] owns one [`OrganizationPolicy`] and one
//! [`ProjectPolicy`] for its lifetime. Both are immutable after construction,
//! so concurrent evaluations need no locking.
//!
//! Evaluation is two-phase and fail-fast: the organization gate runs first
//! and any violation aborts before project rules or the verifier are touched.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Read;

use crate::core::DigestSet;
use crate::core::MAX_DOCUMENT_BYTES;
use crate::core::NamedDocument;
use crate::core::PolicyError;
use crate::core::PolicyId;
use crate::interfaces::PolicyValidator;
use crate::interfaces::ReleaseAttestationVerifier;
use crate::policy::organization::OrganizationPolicy;
use crate::policy::project::ProjectPolicy;
use crate::policy::project::Protection;

// ============================================================================
// SECTION: Deployment Policy
// ============================================================================

/// Organization and project policies composed for deployment decisions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentPolicy {
    /// Global constraints.
    organization: OrganizationPolicy,
    /// Per-policy-id rules.
    projects: ProjectPolicy,
}

impl DeploymentPolicy {
    /// Builds a policy from an organization document and project documents,
    /// reading each document with the default size limit.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError`] when any document is invalid.
    pub fn new<I>(
        organization: impl Read,
        projects: I,
        validator: Option<&dyn PolicyValidator>,
    ) -> Result<Self, PolicyError>
    where
        I: IntoIterator<Item = Result<NamedDocument, PolicyError>>,
    {
        Self::with_limit(organization, projects, validator, MAX_DOCUMENT_BYTES)
    }

    /// Builds a policy with an explicit per-document size limit.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError`] when any document is invalid.
    pub fn with_limit<I>(
        organization: impl Read,
        projects: I,
        validator: Option<&dyn PolicyValidator>,
        max_document_bytes: usize,
    ) -> Result<Self, PolicyError>
    where
        I: IntoIterator<Item = Result<NamedDocument, PolicyError>>,
    {
        let organization = OrganizationPolicy::from_reader(organization, max_document_bytes)?;
        let projects = ProjectPolicy::new(projects, &organization, validator, max_document_bytes)?;
        Ok(Self {
            organization,
            projects,
        })
    }

    /// Returns the organization policy.
    #[must_use]
    pub const fn organization(&self) -> &OrganizationPolicy {
        &self.organization
    }

    /// Returns the project policies.
    #[must_use]
    pub const fn projects(&self) -> &ProjectPolicy {
        &self.projects
    }

    /// Evaluates whether `package_name`/`digests` may be deployed under
    /// `policy_id`, using `verifier` for release attestations.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError::InvalidInput`] for a blank policy id or an
    /// unaddressable artifact, [`PolicyError::NotFound`] for an unknown
    /// policy id or package, and the verifier's failure otherwise.
    pub fn evaluate(
        &self,
        digests: &DigestSet,
        package_name: &str,
        policy_id: &PolicyId,
        verifier: &dyn ReleaseAttestationVerifier,
    ) -> Result<Protection, PolicyError> {
        if policy_id.is_blank() {
            return Err(PolicyError::InvalidInput("policy id is empty".to_string()));
        }
        let entry = self
            .projects
            .get(policy_id)
            .ok_or_else(|| PolicyError::NotFound(format!("policy id {policy_id}")))?;
        self.organization
            .evaluate(digests, package_name)
            .map_err(|err| err.with_context(format!("policy {policy_id}")))?;
        entry.evaluate(policy_id, digests, package_name, &self.organization, verifier)
    }
}
