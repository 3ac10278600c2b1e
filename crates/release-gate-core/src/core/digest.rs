// crates/release-gate-core/src/core/digest.rs
// ============================================================================
// Module: Release Gate Digests
// Description: Validated digest sets and canonical artifact references.
// Purpose: Identify artifacts by content and derive unambiguous references.
// Dependencies: serde, sha2
// ============================================================================

//! ## Overview
//! A [`DigestSet`] maps hash algorithm names to hex digests. It is
//! validated on construction and on deserialization, and is immutable
//! afterwards. [`ArtifactReference`] derives the canonical `name@sha256:hex`
//! form; callers never supply a pre-qualified reference.
//!
//! Security posture: artifact names that already carry a tag or digest are
//! rejected so a reference cannot be spoofed by embedding a second digest.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fmt;
use std::io;
use std::io::Read;

use serde::Deserialize;
use serde::Serialize;
use sha2::Digest;
use sha2::Sha256;

use crate::core::error::PolicyError;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Algorithm name for SHA-256 digests.
pub const SHA256: &str = "sha256";

// ============================================================================
// SECTION: Digest Set
// ============================================================================

/// Validated mapping of hash algorithm name to hex digest.
///
/// # Invariants
/// - At least one entry is present.
/// - Algorithm names are non-empty.
/// - Digest values are non-empty ASCII hex.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<String, String>", into = "BTreeMap<String, String>")]
pub struct DigestSet(BTreeMap<String, String>);

impl DigestSet {
    /// Builds a digest set from algorithm/value pairs.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError::InvalidInput`] when the set is empty or malformed.
    pub fn new<I, K, V>(entries: I) -> Result<Self, PolicyError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut map = BTreeMap::new();
        for (algorithm, value) in entries {
            let algorithm = algorithm.into();
            if map.insert(algorithm.clone(), value.into()).is_some() {
                return Err(PolicyError::InvalidInput(format!(
                    "digest algorithm {algorithm} listed twice"
                )));
            }
        }
        Self::try_from(map)
    }

    /// Builds a single-entry `sha256` digest set from a hex value.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError::InvalidInput`] when the value is not hex.
    pub fn sha256(value: impl Into<String>) -> Result<Self, PolicyError> {
        Self::new([(SHA256, value.into())])
    }

    /// Computes the `sha256` digest set of raw bytes.
    #[must_use]
    pub fn of_bytes(bytes: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(bytes);
        let digest = hasher.finalize();
        Self(BTreeMap::from([(SHA256.to_string(), hex_encode(&digest))]))
    }

    /// Computes the `sha256` digest set of a stream without buffering it.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error when `reader` fails.
    pub fn of_reader(mut reader: impl Read) -> io::Result<Self> {
        let mut hasher = Sha256::new();
        io::copy(&mut reader, &mut hasher)?;
        let digest = hasher.finalize();
        Ok(Self(BTreeMap::from([(SHA256.to_string(), hex_encode(&digest))])))
    }

    /// Returns the digest recorded for `algorithm`.
    #[must_use]
    pub fn get(&self, algorithm: &str) -> Option<&str> {
        self.0.get(algorithm).map(String::as_str)
    }

    /// Returns the digest for `algorithm`, failing when absent.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError::InvalidInput`] when the algorithm is missing.
    pub fn require(&self, algorithm: &str) -> Result<&str, PolicyError> {
        self.get(algorithm).ok_or_else(|| {
            PolicyError::InvalidInput(format!("digest set {self} has no {algorithm} entry"))
        })
    }

    /// Iterates algorithm/value pairs in algorithm order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(algorithm, value)| (algorithm.as_str(), value.as_str()))
    }

    /// Returns true when every entry of `self` is present and equal in `other`.
    #[must_use]
    pub fn is_covered_by(&self, other: &Self) -> bool {
        self.iter().all(|(algorithm, value)| other.get(algorithm) == Some(value))
    }
}

impl TryFrom<BTreeMap<String, String>> for DigestSet {
    type Error = PolicyError;

    fn try_from(map: BTreeMap<String, String>) -> Result<Self, Self::Error> {
        if map.is_empty() {
            return Err(PolicyError::InvalidInput("digest set is empty".to_string()));
        }
        for (algorithm, value) in &map {
            if algorithm.trim().is_empty() {
                return Err(PolicyError::InvalidInput(
                    "digest algorithm name is empty".to_string(),
                ));
            }
            if value.is_empty() {
                return Err(PolicyError::InvalidInput(format!(
                    "digest value for {algorithm} is empty"
                )));
            }
            if !value.bytes().all(|byte| byte.is_ascii_hexdigit()) {
                return Err(PolicyError::InvalidInput(format!(
                    "digest value for {algorithm} is not hex"
                )));
            }
        }
        Ok(Self(map))
    }
}

impl From<DigestSet> for BTreeMap<String, String> {
    fn from(value: DigestSet) -> Self {
        value.0
    }
}

impl fmt::Display for DigestSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered = self
            .iter()
            .map(|(algorithm, value)| format!("{algorithm}:{value}"))
            .collect::<Vec<_>>()
            .join(",");
        write!(f, "{{{rendered}}}")
    }
}

// ============================================================================
// SECTION: Artifact Reference
// ============================================================================

/// Canonical, digest-pinned artifact reference (`name@sha256:hex`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArtifactReference {
    /// Artifact name without tag or digest.
    name: String,
    /// SHA-256 hex digest pinned by the reference.
    sha256: String,
}

impl ArtifactReference {
    /// Derives the canonical reference for `name` pinned to the `sha256` digest.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError::InvalidInput`] when the name is not addressable or
    /// the digest set lacks a `sha256` entry.
    pub fn new(name: &str, digests: &DigestSet) -> Result<Self, PolicyError> {
        validate_artifact_name(name)?;
        let sha256 = digests.require(SHA256)?;
        Ok(Self {
            name: name.to_string(),
            sha256: sha256.to_string(),
        })
    }

    /// Returns the artifact name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the pinned SHA-256 digest.
    #[must_use]
    pub fn sha256(&self) -> &str {
        &self.sha256
    }
}

impl fmt::Display for ArtifactReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{SHA256}:{}", self.name, self.sha256)
    }
}

/// Validates that an artifact name does not already encode a tag or digest.
///
/// # Errors
///
/// Returns [`PolicyError::InvalidInput`] for empty names or names containing
/// `:` or `@`.
pub fn validate_artifact_name(name: &str) -> Result<(), PolicyError> {
    if name.trim().is_empty() {
        return Err(PolicyError::InvalidInput("artifact name is empty".to_string()));
    }
    if name.contains(':') || name.contains('@') {
        return Err(PolicyError::InvalidInput(format!(
            "artifact name \"{name}\" must not contain a tag or digest"
        )));
    }
    Ok(())
}

// ============================================================================
// SECTION: Hex Encoding
// ============================================================================

/// Encodes bytes as a lowercase hex string.
fn hex_encode(bytes: &[u8]) -> String {
    const HEX: &[u8; 16] = b"0123456789abcdef";
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        out.push(HEX[(byte >> 4) as usize] as char);
        out.push(HEX[(byte & 0x0f) as usize] as char);
    }
    out
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(
        clippy::unwrap_used,
        clippy::expect_used,
        reason = "Test-only assertions are permitted."
    )]

    use super::*;

    #[test]
    fn of_bytes_matches_known_sha256() {
        let digests = DigestSet::of_bytes(b"abc");
        assert_eq!(
            digests.get(SHA256),
            Some("ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad")
        );
    }

    #[test]
    fn of_reader_streams_to_the_same_digest() {
        let payload = vec![7u8; 20_000];
        let streamed = DigestSet::of_reader(payload.as_slice()).unwrap();
        assert_eq!(streamed, DigestSet::of_bytes(&payload));
    }

    #[test]
    fn rejects_non_hex_and_empty_values() {
        assert!(DigestSet::sha256("not-hex").is_err());
        assert!(DigestSet::sha256("").is_err());
        assert!(DigestSet::new(Vec::<(String, String)>::new()).is_err());
    }

    #[test]
    fn deserialization_validates_entries() {
        let err = serde_json::from_str::<DigestSet>(r#"{"sha256": ""}"#);
        assert!(err.is_err());
        let ok: DigestSet = serde_json::from_str(r#"{"sha256": "abc123"}"#).unwrap();
        assert_eq!(ok.get(SHA256), Some("abc123"));
    }
}
