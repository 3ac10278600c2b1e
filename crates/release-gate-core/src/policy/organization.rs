// crates/release-gate-core/src/policy/organization.rs
// ============================================================================
// Module: Organization Policy
// Description: Global releaser trust roots and build-level floor.
// Purpose: Gate every deployment evaluation before project rules apply.
// Dependencies: serde, crate::core
// ============================================================================

//! ## Overview
//! The organization policy is loaded once from a single document and shared
//! read-only by every evaluation. It holds the accepted releaser identities
//! and the minimum build level every project inherits.
//!
//! ## Invariants
//! - At least one releaser root is configured and roots are unique.
//! - The build-level floor is in `[1, 4]`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Read;

use serde::Deserialize;

use crate::core::ArtifactReference;
use crate::core::DigestSet;
use crate::core::PolicyError;
use crate::core::ReleaserIdentity;
use crate::core::document::ensure_format;
use crate::core::document::parse_json_document;
use crate::interfaces::validate_required_level;

// ============================================================================
// SECTION: Document Model
// ============================================================================

/// Wire form of the deployment organization document.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct OrganizationDocument {
    /// Document format version.
    format: u32,
    /// Trust roots.
    roots: RootsDocument,
    /// Global build requirements.
    build: BuildFloorDocument,
}

/// Releaser trust roots.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RootsDocument {
    /// Accepted releaser identities.
    release: Vec<ReleaserIdentity>,
}

/// Global build-level floor.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct BuildFloorDocument {
    /// Minimum build level for every package.
    min_slsa_level: u8,
}

// ============================================================================
// SECTION: Organization Policy
// ============================================================================

/// Organization-wide deployment constraints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrganizationPolicy {
    /// Accepted releaser identities in document order.
    releasers: Vec<ReleaserIdentity>,
    /// Global minimum build level.
    min_build_level: u8,
}

impl OrganizationPolicy {
    /// Creates a validated organization policy.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError::InvalidInput`] when roots are empty or duplicated
    /// or the floor is out of range.
    pub fn new(releasers: Vec<ReleaserIdentity>, min_build_level: u8) -> Result<Self, PolicyError> {
        if releasers.is_empty() {
            return Err(PolicyError::InvalidInput("no releaser roots configured".to_string()));
        }
        for (index, releaser) in releasers.iter().enumerate() {
            if releasers[.. index].contains(releaser) {
                return Err(PolicyError::InvalidInput(format!(
                    "releaser root {releaser} listed twice"
                )));
            }
        }
        validate_required_level(min_build_level)
            .map_err(|err| err.with_context("organization min_slsa_level"))?;
        Ok(Self {
            releasers,
            min_build_level,
        })
    }

    /// Reads and validates an organization document.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError::InvalidInput`] when the document is oversized,
    /// malformed, or fails validation.
    pub fn from_reader(reader: impl Read, max_bytes: usize) -> Result<Self, PolicyError> {
        let document: OrganizationDocument = parse_json_document(reader, max_bytes)
            .map_err(|err| err.with_context("organization policy"))?;
        ensure_format(document.format).map_err(|err| err.with_context("organization policy"))?;
        Self::new(document.roots.release, document.build.min_slsa_level)
            .map_err(|err| err.with_context("organization policy"))
    }

    /// Returns the accepted releaser identities in document order.
    #[must_use]
    pub fn releasers(&self) -> &[ReleaserIdentity] {
        &self.releasers
    }

    /// Returns the global minimum build level.
    #[must_use]
    pub const fn min_build_level(&self) -> u8 {
        self.min_build_level
    }

    /// Returns true when `identity` is no wider than some organization root.
    #[must_use]
    pub fn accepts(&self, identity: &ReleaserIdentity) -> bool {
        self.releasers.iter().any(|root| identity.is_covered_by(root))
    }

    /// Checks global constraints for an evaluation request.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError::InvalidInput`] when the artifact is not
    /// addressable by a `sha256`-pinned reference.
    pub fn evaluate(&self, digests: &DigestSet, package_name: &str) -> Result<(), PolicyError> {
        ArtifactReference::new(package_name, digests)?;
        Ok(())
    }
}
