// crates/release-gate-core/src/interfaces/mod.rs
// ============================================================================
// Module: Release Gate Interfaces
// Description: Capability contracts consumed by policy evaluation.
// Purpose: Keep signature cryptography and registry lookups outside the core.
// Dependencies: crate::core, serde, thiserror
// ============================================================================

//! ## Overview
//! The core never verifies signatures or resolves registries itself. Policy
//! evaluation calls the capabilities below, supplied per call by the host:
//! a [`SignatureVerifier`] authenticates a signer and returns raw attestation
//! bytes, [`ReleaseAttestationVerifier`] and [`BuildAttestationVerifier`]
//! answer the deployment and publish flows, [`PackageHelper`] translates
//! package names, and [`PolicyValidator`] vets package entries at load time.
//!
//! Security posture: implementations consume untrusted inputs and must fail
//! closed; an `Ok` result is treated as an authenticated trust claim.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::attestation::MAX_BUILD_LEVEL;
use crate::attestation::MIN_REQUIRED_BUILD_LEVEL;
use crate::core::ArtifactReference;
use crate::core::DigestSet;
use crate::core::PolicyError;
use crate::core::ReleaserIdentity;

// ============================================================================
// SECTION: Signature Verifier
// ============================================================================

/// Signature verification errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignatureError {
    /// No signed attestation exists for the reference.
    #[error("no signed attestation: {0}")]
    Missing(String),
    /// A signature exists but was rejected.
    #[error("signature rejected: {0}")]
    Rejected(String),
    /// The verifier backend could not be reached or failed.
    #[error("signature verifier unavailable: {0}")]
    Unavailable(String),
}

/// Authenticated attestation returned by a [`SignatureVerifier`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedAttestation {
    /// Identity that signed the attestation, as authenticated by the verifier.
    pub signer_identity: String,
    /// Raw statement bytes covered by the signature.
    pub payload: Vec<u8>,
}

/// Authenticates release attestations for canonical artifact references.
pub trait SignatureVerifier {
    /// Verifies a signature over the attestation for `reference`, accepting
    /// only signers matched by `releaser`.
    ///
    /// # Errors
    ///
    /// Returns [`SignatureError`] when no acceptable signature is found.
    fn verify_signature(
        &self,
        reference: &ArtifactReference,
        releaser: &ReleaserIdentity,
    ) -> Result<SignedAttestation, SignatureError>;
}

// ============================================================================
// SECTION: Release Attestation Verifier
// ============================================================================

/// Trust constraints for one release attestation verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseVerifierConfig {
    /// Accepted releaser identity.
    pub releaser: ReleaserIdentity,
    /// Minimum build level the release must attest.
    pub build_level: u8,
}

impl ReleaseVerifierConfig {
    /// Creates a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError::InvalidInput`] when the releaser identity is
    /// blank or the build level is outside `[1, 4]`.
    pub fn new(releaser: ReleaserIdentity, build_level: u8) -> Result<Self, PolicyError> {
        let config = Self {
            releaser,
            build_level,
        };
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration before any verification I/O.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError::InvalidInput`] when the releaser identity is
    /// blank or the build level is outside `[1, 4]`.
    pub fn validate(&self) -> Result<(), PolicyError> {
        self.releaser.validate()?;
        validate_required_level(self.build_level)
    }
}

/// Validates a minimum build-level requirement.
///
/// # Errors
///
/// Returns [`PolicyError::InvalidInput`] when `level` is outside `[1, 4]`.
pub fn validate_required_level(level: u8) -> Result<(), PolicyError> {
    if !(MIN_REQUIRED_BUILD_LEVEL ..= MAX_BUILD_LEVEL).contains(&level) {
        return Err(PolicyError::InvalidInput(format!(
            "build level ({level}) must be between {MIN_REQUIRED_BUILD_LEVEL} and \
             {MAX_BUILD_LEVEL}"
        )));
    }
    Ok(())
}

/// Verifies release attestations for the deployment flow.
pub trait ReleaseAttestationVerifier {
    /// Verifies that `name`/`digests` was released under `config`, scoped to
    /// one of `environments` (tried in order) or unscoped when empty.
    ///
    /// Returns the matched environment, or `None` for unscoped releases.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError`] when the release cannot be verified.
    fn verify_release_attestation(
        &self,
        digests: &DigestSet,
        name: &str,
        environments: &[String],
        config: &ReleaseVerifierConfig,
    ) -> Result<Option<String>, PolicyError>;
}

// ============================================================================
// SECTION: Build Attestation Verifier
// ============================================================================

/// Verifies build provenance for the publish flow.
pub trait BuildAttestationVerifier {
    /// Verifies that `name`/`digests` was built by `builder_id` from `source_uri`.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError`] when provenance cannot be verified.
    fn verify_build_attestation(
        &self,
        digests: &DigestSet,
        name: &str,
        builder_id: &str,
        source_uri: &str,
    ) -> Result<(), PolicyError>;
}

// ============================================================================
// SECTION: Package Helper
// ============================================================================

/// Registry coordinates for a policy package name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageDescriptor {
    /// Package ecosystem (for example `container`).
    pub ecosystem: String,
    /// Registry hosting the package.
    pub registry: String,
    /// Package name within the registry.
    pub name: String,
}

/// Translates policy package names to registry coordinates.
pub trait PackageHelper {
    /// Returns the descriptor for `package_name`.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError`] when the name cannot be translated.
    fn package_descriptor(&self, package_name: &str) -> Result<PackageDescriptor, PolicyError>;
}

// ============================================================================
// SECTION: Policy Validator
// ============================================================================

/// Package entry presented to a [`PolicyValidator`] at load time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationPackage {
    /// Package name.
    pub name: String,
    /// Declared environments, empty when unscoped.
    pub environments: Vec<String>,
}

/// Host-specific validation of package policy entries.
pub trait PolicyValidator {
    /// Validates a package entry.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError`] when the entry is not acceptable.
    fn validate_package(&self, package: &ValidationPackage) -> Result<(), PolicyError>;
}
