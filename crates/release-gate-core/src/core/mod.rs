// crates/release-gate-core/src/core/mod.rs
// ============================================================================
// Module: Release Gate Core Types
// Description: Digests, identifiers, identities, errors, and document sources.
// Purpose: Provide the validated value types shared by every evaluation flow.
// Dependencies: regex, serde, sha2, time
// ============================================================================

//! ## Overview
//! Core types are the leaves of the engine: every evaluation request is
//! expressed in terms of a [`DigestSet`], an artifact name, and a
//! [`PolicyId`]; every failure is a [`PolicyError`].

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod digest;
pub mod document;
pub mod error;
pub mod identifiers;
pub mod identity;
pub mod time;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use digest::ArtifactReference;
pub use digest::DigestSet;
pub use digest::SHA256;
pub use digest::validate_artifact_name;
pub use document::BytesDocumentIterator;
pub use document::DocumentIds;
pub use document::MAX_DOCUMENT_BYTES;
pub use document::NamedDocument;
pub use error::CandidateFailure;
pub use error::ErrorKind;
pub use error::PolicyError;
pub use identifiers::PolicyId;
pub use identifiers::SHARED_POLICY_ID;
pub use identity::ReleaserIdentity;
