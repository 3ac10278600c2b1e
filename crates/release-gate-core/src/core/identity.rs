// crates/release-gate-core/src/core/identity.rs
// ============================================================================
// Module: Releaser Identity Patterns
// Description: Literal or regex patterns naming accepted signer identities.
// Purpose: Express trust roots for releasers and builders.
// Dependencies: regex, serde
// ============================================================================

//! ## Overview
//! A [`ReleaserIdentity`] is either a literal identity or a regular
//! expression. Policy documents spell it as `{"id": ...}` or
//! `{"id_regex": ...}`; exactly one must be present.
//!
//! ## Invariants
//! - Regex patterns are compiled once and always match the whole identity.
//! - Literal identities are non-empty.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use regex::Regex;
use serde::Deserialize;
use serde::Serialize;

use crate::core::error::PolicyError;

// ============================================================================
// SECTION: Identity Pattern
// ============================================================================

/// Accepted signer identity: a literal id or an anchored regex.
#[derive(Debug, Clone)]
pub enum ReleaserIdentity {
    /// Exact identity match.
    Exact(String),
    /// Whole-string regex match.
    Pattern(IdentityPattern),
}

/// Compiled regex identity pattern that keeps its source text.
#[derive(Debug, Clone)]
pub struct IdentityPattern {
    /// Pattern as written in the policy.
    source: String,
    /// Anchored compiled pattern.
    compiled: Regex,
}

impl IdentityPattern {
    /// Returns the pattern as written in the policy.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }
}

impl ReleaserIdentity {
    /// Creates a literal identity.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError::InvalidInput`] when the identity is empty.
    pub fn exact(id: impl Into<String>) -> Result<Self, PolicyError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(PolicyError::InvalidInput("releaser id is empty".to_string()));
        }
        Ok(Self::Exact(id))
    }

    /// Compiles a regex identity pattern anchored to the whole identity.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError::InvalidInput`] when the pattern is empty or invalid.
    pub fn pattern(source: impl Into<String>) -> Result<Self, PolicyError> {
        let source = source.into();
        if source.trim().is_empty() {
            return Err(PolicyError::InvalidInput("releaser id regex is empty".to_string()));
        }
        let compiled = Regex::new(&format!("^(?:{source})$")).map_err(|err| {
            PolicyError::InvalidInput(format!("releaser id regex ({source}) is invalid: {err}"))
        })?;
        Ok(Self::Pattern(IdentityPattern {
            source,
            compiled,
        }))
    }

    /// Checks that the identity is well-formed.
    ///
    /// Regex identities are validated when compiled; a literal built
    /// directly from the [`ReleaserIdentity::Exact`] variant is checked here.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError::InvalidInput`] when a literal identity is blank.
    pub fn validate(&self) -> Result<(), PolicyError> {
        match self {
            Self::Exact(id) if id.trim().is_empty() => {
                Err(PolicyError::InvalidInput("releaser id is empty".to_string()))
            }
            Self::Exact(_) | Self::Pattern(_) => Ok(()),
        }
    }

    /// Returns true when `identity` is accepted by this pattern.
    #[must_use]
    pub fn matches(&self, identity: &str) -> bool {
        match self {
            Self::Exact(id) => id == identity,
            Self::Pattern(pattern) => pattern.compiled.is_match(identity),
        }
    }

    /// Returns true when `self` is at least as narrow as `root`.
    ///
    /// A literal identity is covered when `root` accepts it; a regex is only
    /// covered by a textually identical regex root.
    #[must_use]
    pub fn is_covered_by(&self, root: &Self) -> bool {
        match self {
            Self::Exact(id) => root.matches(id),
            Self::Pattern(pattern) => match root {
                Self::Pattern(other) => pattern.source == other.source,
                Self::Exact(_) => false,
            },
        }
    }
}

impl PartialEq for ReleaserIdentity {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Exact(left), Self::Exact(right)) => left == right,
            (Self::Pattern(left), Self::Pattern(right)) => left.source == right.source,
            _ => false,
        }
    }
}

impl Eq for ReleaserIdentity {}

impl fmt::Display for ReleaserIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(id) => write!(f, "id={id}"),
            Self::Pattern(pattern) => write!(f, "id_regex={}", pattern.source),
        }
    }
}

// ============================================================================
// SECTION: Serde
// ============================================================================

/// Wire form of a [`ReleaserIdentity`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IdentityDocument {
    /// Literal identity.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Regex identity.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_regex: Option<String>,
}

impl TryFrom<IdentityDocument> for ReleaserIdentity {
    type Error = PolicyError;

    fn try_from(value: IdentityDocument) -> Result<Self, Self::Error> {
        match (value.id, value.id_regex) {
            (Some(id), None) => Self::exact(id),
            (None, Some(source)) => Self::pattern(source),
            (Some(_), Some(_)) => Err(PolicyError::InvalidInput(
                "only one of id or id_regex may be set".to_string(),
            )),
            (None, None) => {
                Err(PolicyError::InvalidInput("one of id or id_regex must be set".to_string()))
            }
        }
    }
}

impl From<ReleaserIdentity> for IdentityDocument {
    fn from(value: ReleaserIdentity) -> Self {
        match value {
            ReleaserIdentity::Exact(id) => Self {
                id: Some(id),
                id_regex: None,
            },
            ReleaserIdentity::Pattern(pattern) => Self {
                id: None,
                id_regex: Some(pattern.source),
            },
        }
    }
}

impl Serialize for ReleaserIdentity {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        IdentityDocument::from(self.clone()).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ReleaserIdentity {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let document = IdentityDocument::deserialize(deserializer)?;
        Self::try_from(document).map_err(serde::de::Error::custom)
    }
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
    fn regex_patterns_match_whole_identity() {
        let identity = ReleaserIdentity::pattern("https://ci\\.example/.*").unwrap();
        assert!(identity.matches("https://ci.example/release.yml"));
        assert!(!identity.matches("evil https://ci.example/release.yml"));
    }

    #[test]
    fn exact_override_is_covered_by_matching_regex_root() {
        let root = ReleaserIdentity::pattern("https://ci\\.example/.*").unwrap();
        let narrow = ReleaserIdentity::exact("https://ci.example/release.yml").unwrap();
        let wide = ReleaserIdentity::pattern(".*").unwrap();
        assert!(narrow.is_covered_by(&root));
        assert!(!wide.is_covered_by(&root));
    }

    #[test]
    fn blank_literal_identities_fail_validation() {
        assert!(ReleaserIdentity::Exact(String::new()).validate().is_err());
        assert!(ReleaserIdentity::Exact("  ".to_string()).validate().is_err());
        let literal = ReleaserIdentity::exact("https://ci.example/release.yml").unwrap();
        assert!(literal.validate().is_ok());
        assert!(ReleaserIdentity::pattern("https://ci\\.example/.*").unwrap().validate().is_ok());
    }

    #[test]
    fn document_requires_exactly_one_field() {
        assert!(serde_json::from_str::<ReleaserIdentity>(r#"{}"#).is_err());
        assert!(serde_json::from_str::<ReleaserIdentity>(r#"{"id":"a","id_regex":"b"}"#).is_err());
        assert!(serde_json::from_str::<ReleaserIdentity>(r#"{"id_regex":"("}"#).is_err());
    }
}
