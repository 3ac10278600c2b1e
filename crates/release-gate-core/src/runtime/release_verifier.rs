// crates/release-gate-core/src/runtime/release_verifier.rs
// ============================================================================
// Module: Release Verifier
// Description: Release attestation verification over a signature capability.
// Purpose: Bind signed release statements to policy build-level and scope.
// Dependencies: crate::attestation, crate::interfaces
// ============================================================================

//! ## Overview
//! [`ReleaseVerifier`] implements [`ReleaseAttestationVerifier`] on top of any
//! [`SignatureVerifier`]. It validates the configuration and the artifact
//! name before any I/O, fetches the signed statement once, then tries the
//! candidate environments in caller order. The first environment that
//! verifies wins; when none does, every attempt is reported.

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::attestation::verification::Verification;
use crate::attestation::verification::VerificationCheck;
use crate::core::ArtifactReference;
use crate::core::CandidateFailure;
use crate::core::DigestSet;
use crate::core::PolicyError;
use crate::core::error::exhausted;
use crate::interfaces::ReleaseAttestationVerifier;
use crate::interfaces::ReleaseVerifierConfig;
use crate::interfaces::SignatureVerifier;

// ============================================================================
// SECTION: Release Verifier
// ============================================================================

/// Release attestation verifier backed by a signature capability.
#[derive(Debug, Clone)]
pub struct ReleaseVerifier<S> {
    /// Signature verification capability.
    signatures: S,
}

impl<S: SignatureVerifier> ReleaseVerifier<S> {
    /// Creates a verifier over `signatures`.
    #[must_use]
    pub const fn new(signatures: S) -> Self {
        Self {
            signatures,
        }
    }

    /// Authenticates and parses the release statement for `reference`.
    fn fetch(
        &self,
        reference: &ArtifactReference,
        config: &ReleaseVerifierConfig,
    ) -> Result<(String, Verification), PolicyError> {
        let signed = self.signatures.verify_signature(reference, &config.releaser).map_err(
            |err| {
                PolicyError::Verification(format!(
                    "{reference}: releaser {}: {err}",
                    config.releaser
                ))
            },
        )?;
        if !config.releaser.matches(&signed.signer_identity) {
            return Err(PolicyError::Verification(format!(
                "{reference}: signer {} is not accepted by releaser {}",
                signed.signer_identity, config.releaser
            )));
        }
        let verification =
            Verification::from_bytes(&signed.payload).map_err(|err| err.with_context(reference))?;
        Ok((signed.signer_identity, verification))
    }
}

impl<S: SignatureVerifier> ReleaseAttestationVerifier for ReleaseVerifier<S> {
    fn verify_release_attestation(
        &self,
        digests: &DigestSet,
        name: &str,
        environments: &[String],
        config: &ReleaseVerifierConfig,
    ) -> Result<Option<String>, PolicyError> {
        config.validate()?;
        let reference = ArtifactReference::new(name, digests)?;
        let (signer, verification) = self.fetch(&reference, config)?;
        let level = VerificationCheck::BuildLevelAtLeast(config.build_level);

        if environments.is_empty() {
            verification
                .verify(&signer, digests, name, &[level])
                .map_err(|err| err.with_context(&reference))?;
            return Ok(None);
        }

        let mut failures = Vec::with_capacity(environments.len());
        for environment in environments {
            let checks = [level.clone(), VerificationCheck::Environment(environment.clone())];
            match verification.verify(&signer, digests, name, &checks) {
                Ok(()) => return Ok(Some(environment.clone())),
                Err(err) => failures.push(CandidateFailure::new(environment.as_str(), err)),
            }
        }
        Err(exhausted(reference.to_string(), failures))
    }
}
