// crates/release-gate-cli/src/tests/bundle.rs
// ============================================================================
// Module: Bundle Directory Tests
// Description: Unit tests for the bundle-backed signature capability.
// Purpose: Ensure lookup by digest, signer matching, and size limits.
// Dependencies: release-gate-cli bundle module, tempfile
// ============================================================================

//! ## Overview
//! Exercises [`BundleDirectoryVerifier`] against bundles on disk.

use std::fs;

use release_gate_core::ArtifactReference;
use release_gate_core::DigestSet;
use release_gate_core::ReleaserIdentity;
use release_gate_core::SignatureError;
use release_gate_core::SignatureVerifier;
use serde_json::json;
use tempfile::TempDir;

use crate::bundle::BundleDirectoryVerifier;

const SIGNER: &str = "https://releaser.example/workflow@refs/heads/main";

fn reference() -> ArtifactReference {
    ArtifactReference::new("registry/app", &DigestSet::sha256("abc123").unwrap()).unwrap()
}

fn write_bundle(dir: &TempDir, signer: &str) {
    let bundle = json!({ "signer_identity": signer, "statement": { "_type": "stub" } });
    fs::write(dir.path().join("abc123.json"), bundle.to_string()).unwrap();
}

#[test]
fn bundle_is_served_for_matching_releaser() {
    let dir = TempDir::new().unwrap();
    write_bundle(&dir, SIGNER);
    let verifier = BundleDirectoryVerifier::new(dir.path().to_path_buf(), 4096);
    let signed =
        verifier.verify_signature(&reference(), &ReleaserIdentity::exact(SIGNER).unwrap()).unwrap();
    assert_eq!(signed.signer_identity, SIGNER);
    let payload: serde_json::Value = serde_json::from_slice(&signed.payload).unwrap();
    assert_eq!(payload["_type"], "stub");
}

#[test]
fn other_signers_are_rejected() {
    let dir = TempDir::new().unwrap();
    write_bundle(&dir, "https://mallory.example/workflow");
    let verifier = BundleDirectoryVerifier::new(dir.path().to_path_buf(), 4096);
    let err = verifier
        .verify_signature(&reference(), &ReleaserIdentity::exact(SIGNER).unwrap())
        .unwrap_err();
    assert!(matches!(err, SignatureError::Rejected(_)));
}

#[test]
fn missing_bundle_is_reported_with_reference() {
    let dir = TempDir::new().unwrap();
    let verifier = BundleDirectoryVerifier::new(dir.path().to_path_buf(), 4096);
    let err = verifier
        .verify_signature(&reference(), &ReleaserIdentity::exact(SIGNER).unwrap())
        .unwrap_err();
    assert!(matches!(err, SignatureError::Missing(ref message)
        if message == "registry/app@sha256:abc123"));
}

#[test]
fn oversized_and_malformed_bundles_fail() {
    let dir = TempDir::new().unwrap();
    write_bundle(&dir, SIGNER);
    let releaser = ReleaserIdentity::exact(SIGNER).unwrap();
    let small = BundleDirectoryVerifier::new(dir.path().to_path_buf(), 16);
    assert!(matches!(
        small.verify_signature(&reference(), &releaser).unwrap_err(),
        SignatureError::Unavailable(_)
    ));

    fs::write(dir.path().join("abc123.json"), "{\"signer_identity\": 7}").unwrap();
    let verifier = BundleDirectoryVerifier::new(dir.path().to_path_buf(), 4096);
    assert!(matches!(
        verifier.verify_signature(&reference(), &releaser).unwrap_err(),
        SignatureError::Rejected(_)
    ));
}
