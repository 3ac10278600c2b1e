// crates/release-gate-cli/src/bundle.rs
// ============================================================================
// Module: Attestation Bundle Directory
// Description: Signature capability backed by pre-verified bundle files.
// Purpose: Let the CLI evaluate deployments without signature cryptography.
// Dependencies: release-gate-core, serde, serde_json
// ============================================================================

//! ## Overview
//! An external signature verifier writes one bundle per artifact to
//! `<dir>/<sha256-hex>.json`:
//!
//! ```json
//! { "signer_identity": "https://releaser.example/workflow", "statement": { ... } }
//! ```
//!
//! [`BundleDirectoryVerifier`] serves those bundles through the
//! [`SignatureVerifier`] capability. The bundle signer must match the
//! requested releaser; the statement itself is checked by the release
//! verifier like any other payload.
//!
//! Security posture: bundle files are untrusted and size-limited. The file
//! name is derived from a validated hex digest, never from caller text.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::File;
use std::io::ErrorKind;
use std::path::PathBuf;

use release_gate_core::ArtifactReference;
use release_gate_core::ReleaserIdentity;
use release_gate_core::SignatureError;
use release_gate_core::SignatureVerifier;
use release_gate_core::SignedAttestation;
use release_gate_core::core::document::read_with_limit;
use serde::Deserialize;
use serde_json::Value;

// ============================================================================
// SECTION: Types
// ============================================================================

/// On-disk bundle produced by an external signature verifier.
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct BundleFile {
    /// Identity that signed the statement.
    signer_identity: String,
    /// Verified in-toto statement.
    statement: Value,
}

/// Signature capability reading pre-verified bundles from a directory.
#[derive(Debug, Clone)]
pub struct BundleDirectoryVerifier {
    /// Bundle directory.
    dir: PathBuf,
    /// Maximum bundle size in bytes.
    max_bytes: usize,
}

impl BundleDirectoryVerifier {
    /// Creates a verifier over `dir` with a per-bundle size limit.
    #[must_use]
    pub const fn new(dir: PathBuf, max_bytes: usize) -> Self {
        Self {
            dir,
            max_bytes,
        }
    }
}

impl SignatureVerifier for BundleDirectoryVerifier {
    fn verify_signature(
        &self,
        reference: &ArtifactReference,
        releaser: &ReleaserIdentity,
    ) -> Result<SignedAttestation, SignatureError> {
        let path = self.dir.join(format!("{}.json", reference.sha256()));
        let file = File::open(&path).map_err(|err| {
            if err.kind() == ErrorKind::NotFound {
                SignatureError::Missing(reference.to_string())
            } else {
                SignatureError::Unavailable(format!("{}: {err}", path.display()))
            }
        })?;
        let bytes = read_with_limit(file, self.max_bytes)
            .map_err(|err| SignatureError::Unavailable(format!("{}: {err}", path.display())))?;
        let bundle: BundleFile = serde_json::from_slice(&bytes).map_err(|err| {
            SignatureError::Rejected(format!("malformed bundle {}: {err}", path.display()))
        })?;
        if !releaser.matches(&bundle.signer_identity) {
            return Err(SignatureError::Rejected(format!(
                "signer {} is not {releaser}",
                bundle.signer_identity
            )));
        }
        let payload = serde_json::to_vec(&bundle.statement)
            .map_err(|err| SignatureError::Unavailable(err.to_string()))?;
        Ok(SignedAttestation {
            signer_identity: bundle.signer_identity,
            payload,
        })
    }
}
