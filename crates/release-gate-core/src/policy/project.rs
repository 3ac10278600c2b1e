// crates/release-gate-core/src/policy/project.rs
// ============================================================================
// Module: Project Policy
// Description: Per-policy-id package rules layered on the organization policy.
// Purpose: Resolve package constraints and drive release verification.
// Dependencies: serde, crate::core, crate::interfaces
// ============================================================================

//! ## Overview
//! A [`ProjectPolicy`] maps policy ids to [`ProjectEntry`] values, one per
//! document read from a policy document iterator. Each entry lists the
//! packages it protects with their build-level requirement, accepted
//! environments, and an optional releaser override.
//!
//! ## Invariants
//! - Policy ids are unique; a duplicate id fails construction.
//! - Projects only tighten organization constraints: the effective build
//!   level is the larger of both, and a releaser override must be covered by
//!   an organization root.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use serde::Deserialize;
use serde::Serialize;

use crate::core::CandidateFailure;
use crate::core::DigestSet;
use crate::core::ErrorKind;
use crate::core::NamedDocument;
use crate::core::PolicyError;
use crate::core::PolicyId;
use crate::core::ReleaserIdentity;
use crate::core::document::ensure_format;
use crate::core::document::parse_json_document;
use crate::core::error::exhausted;
use crate::core::validate_artifact_name;
use crate::interfaces::PolicyValidator;
use crate::interfaces::ReleaseAttestationVerifier;
use crate::interfaces::ReleaseVerifierConfig;
use crate::interfaces::ValidationPackage;
use crate::interfaces::validate_required_level;
use crate::policy::organization::OrganizationPolicy;

// ============================================================================
// SECTION: Document Model
// ============================================================================

/// Wire form of a deployment project document.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ProjectDocument {
    /// Document format version.
    format: u32,
    /// Deploying principal protected by this policy.
    #[serde(default)]
    principal: Option<PrincipalDocument>,
    /// Protected packages.
    packages: Vec<PackageDocument>,
}

/// Deploying principal.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct PrincipalDocument {
    /// Principal URI.
    uri: String,
}

/// Package rule.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct PackageDocument {
    /// Package name.
    name: String,
    /// Build requirements.
    #[serde(default)]
    build: Option<BuildRequirementDocument>,
    /// Accepted environments.
    #[serde(default)]
    environment: Option<EnvironmentDocument>,
    /// Releaser override.
    #[serde(default)]
    releaser: Option<ReleaserIdentity>,
}

/// Package build requirements.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct BuildRequirementDocument {
    /// Required build level.
    require_slsa_level: u8,
}

/// Accepted environment labels.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct EnvironmentDocument {
    /// Labels any of which satisfies the policy.
    pub(crate) any_of: Vec<String>,
}

/// Validates an environment list: non-empty, unique, non-blank labels.
pub(crate) fn validate_environments(environments: &[String]) -> Result<(), PolicyError> {
    if environments.is_empty() {
        return Err(PolicyError::InvalidInput("environment any_of is empty".to_string()));
    }
    let mut seen = BTreeSet::new();
    for environment in environments {
        if environment.trim().is_empty() {
            return Err(PolicyError::InvalidInput("environment label is empty".to_string()));
        }
        if !seen.insert(environment.as_str()) {
            return Err(PolicyError::InvalidInput(format!(
                "environment {environment} listed twice"
            )));
        }
    }
    Ok(())
}

// ============================================================================
// SECTION: Package Policy
// ============================================================================

/// Deployment rules for one package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackagePolicy {
    /// Package name.
    pub name: String,
    /// Required build level, when stricter than the organization floor.
    pub build_level: Option<u8>,
    /// Accepted environments in document order, empty when unscoped.
    pub environments: Vec<String>,
    /// Releaser override narrowing the organization roots.
    pub releaser: Option<ReleaserIdentity>,
}

impl PackagePolicy {
    /// Converts and validates a package document.
    fn from_document(
        document: PackageDocument,
        organization: &OrganizationPolicy,
    ) -> Result<Self, PolicyError> {
        validate_artifact_name(&document.name)?;
        let build_level = match document.build {
            Some(build) => {
                validate_required_level(build.require_slsa_level)?;
                Some(build.require_slsa_level)
            }
            None => None,
        };
        let environments = match document.environment {
            Some(environment) => {
                validate_environments(&environment.any_of)?;
                environment.any_of
            }
            None => Vec::new(),
        };
        if let Some(releaser) = &document.releaser
            && !organization.accepts(releaser)
        {
            return Err(PolicyError::InvalidInput(format!(
                "releaser {releaser} is not covered by any organization root"
            )));
        }
        Ok(Self {
            name: document.name,
            build_level,
            environments,
            releaser: document.releaser,
        })
    }

    /// Returns the build level enforced for this package.
    #[must_use]
    pub fn effective_build_level(&self, organization: &OrganizationPolicy) -> u8 {
        self.build_level.map_or(organization.min_build_level(), |level| {
            level.max(organization.min_build_level())
        })
    }
}

// ============================================================================
// SECTION: Protection
// ============================================================================

/// Result descriptor of a successful deployment evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Protection {
    /// Policy id evaluated.
    pub policy_id: PolicyId,
    /// Package name evaluated.
    pub package: String,
    /// Deploying principal declared by the project, if any.
    pub principal: Option<String>,
    /// Minimum build level enforced for the package; the attestation met
    /// or exceeded it.
    pub build_level: u8,
    /// Matched environment, `None` for unscoped releases.
    pub environment: Option<String>,
    /// Releaser identity that verified.
    pub releaser: ReleaserIdentity,
    /// Evaluated digests.
    pub digests: DigestSet,
}

// ============================================================================
// SECTION: Project Entry
// ============================================================================

/// Rules registered under one policy id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectEntry {
    /// Deploying principal.
    principal: Option<String>,
    /// Package rules keyed by package name.
    packages: BTreeMap<String, PackagePolicy>,
}

impl ProjectEntry {
    /// Returns the deploying principal, if declared.
    #[must_use]
    pub fn principal(&self) -> Option<&str> {
        self.principal.as_deref()
    }

    /// Returns the rules for `package_name`.
    #[must_use]
    pub fn package(&self, package_name: &str) -> Option<&PackagePolicy> {
        self.packages.get(package_name)
    }

    /// Iterates package rules in name order.
    pub fn packages(&self) -> impl Iterator<Item = &PackagePolicy> {
        self.packages.values()
    }

    /// Evaluates `package_name` against this entry.
    ///
    /// Releaser candidates are the package override or, without one, the
    /// organization roots in document order. The first candidate whose
    /// release verifies wins.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError::NotFound`] when the package is not protected by
    /// this entry, and the verifier's error (aggregated across candidates)
    /// when no candidate verifies.
    pub fn evaluate(
        &self,
        policy_id: &PolicyId,
        digests: &DigestSet,
        package_name: &str,
        organization: &OrganizationPolicy,
        verifier: &dyn ReleaseAttestationVerifier,
    ) -> Result<Protection, PolicyError> {
        let package = self.package(package_name).ok_or_else(|| {
            PolicyError::NotFound(format!("policy {policy_id} has no package {package_name}"))
        })?;
        let build_level = package.effective_build_level(organization);
        let candidates: Vec<&ReleaserIdentity> = package
            .releaser
            .as_ref()
            .map_or_else(|| organization.releasers().iter().collect(), |releaser| vec![releaser]);

        let mut failures = Vec::with_capacity(candidates.len());
        for releaser in candidates {
            let config = ReleaseVerifierConfig::new(releaser.clone(), build_level)?;
            match verifier.verify_release_attestation(
                digests,
                package_name,
                &package.environments,
                &config,
            ) {
                Ok(environment) => {
                    check_matched_environment(package, environment.as_deref())?;
                    return Ok(Protection {
                        policy_id: policy_id.clone(),
                        package: package_name.to_string(),
                        principal: self.principal.clone(),
                        build_level,
                        environment,
                        releaser: config.releaser,
                        digests: digests.clone(),
                    });
                }
                Err(err) if err.kind() == ErrorKind::InvalidInput => {
                    return Err(err.with_context(format!("policy {policy_id}")));
                }
                Err(err) => failures.push(CandidateFailure::new(releaser.to_string(), err)),
            }
        }
        Err(exhausted(format!("policy {policy_id} package {package_name}"), failures))
    }
}

/// Ensures a verifier-reported environment is one the package accepts.
fn check_matched_environment(
    package: &PackagePolicy,
    environment: Option<&str>,
) -> Result<(), PolicyError> {
    match environment {
        None if package.environments.is_empty() => Ok(()),
        Some(found) if package.environments.iter().any(|env| env == found) => Ok(()),
        None => Err(PolicyError::Verification(format!(
            "package {} requires an environment but the release is unscoped",
            package.name
        ))),
        Some(found) => Err(PolicyError::Verification(format!(
            "package {} does not accept environment {found}",
            package.name
        ))),
    }
}

// ============================================================================
// SECTION: Project Policy
// ============================================================================

/// Project entries keyed by policy id.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProjectPolicy {
    /// Entries keyed by policy id.
    entries: BTreeMap<PolicyId, ProjectEntry>,
}

impl ProjectPolicy {
    /// Builds project policies from a single-pass document source.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError::InvalidInput`] for malformed documents, duplicate
    /// ids, or rejected packages; source errors abort construction unchanged.
    pub fn new<I>(
        documents: I,
        organization: &OrganizationPolicy,
        validator: Option<&dyn PolicyValidator>,
        max_bytes: usize,
    ) -> Result<Self, PolicyError>
    where
        I: IntoIterator<Item = Result<NamedDocument, PolicyError>>,
    {
        let mut entries = BTreeMap::new();
        for document in documents {
            let NamedDocument {
                id,
                content,
            } = document?;
            if id.is_blank() {
                return Err(PolicyError::InvalidInput("policy id is empty".to_string()));
            }
            if entries.contains_key(&id) {
                return Err(PolicyError::InvalidInput(format!("policy id {id} listed twice")));
            }
            let entry = parse_entry(content, organization, validator, max_bytes)
                .map_err(|err| err.with_context(format!("project policy {id}")))?;
            entries.insert(id, entry);
        }
        Ok(Self {
            entries,
        })
    }

    /// Returns the entry registered under `policy_id`.
    #[must_use]
    pub fn get(&self, policy_id: &PolicyId) -> Option<&ProjectEntry> {
        self.entries.get(policy_id)
    }

    /// Iterates policy ids in sorted order.
    pub fn policy_ids(&self) -> impl Iterator<Item = &PolicyId> {
        self.entries.keys()
    }

    /// Returns the number of policy ids.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true when no project documents were loaded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Parses and validates one project document.
fn parse_entry(
    content: impl std::io::Read,
    organization: &OrganizationPolicy,
    validator: Option<&dyn PolicyValidator>,
    max_bytes: usize,
) -> Result<ProjectEntry, PolicyError> {
    let document: ProjectDocument = parse_json_document(content, max_bytes)?;
    ensure_format(document.format)?;
    if document.packages.is_empty() {
        return Err(PolicyError::InvalidInput("no packages listed".to_string()));
    }
    let principal = match document.principal {
        Some(principal) if principal.uri.trim().is_empty() => {
            return Err(PolicyError::InvalidInput("principal uri is empty".to_string()));
        }
        Some(principal) => Some(principal.uri),
        None => None,
    };
    let mut packages = BTreeMap::new();
    for package in document.packages {
        let package = PackagePolicy::from_document(package, organization)?;
        if let Some(validator) = validator {
            validator
                .validate_package(&ValidationPackage {
                    name: package.name.clone(),
                    environments: package.environments.clone(),
                })
                .map_err(|err| err.with_context(format!("package {}", package.name)))?;
        }
        if packages.contains_key(&package.name) {
            return Err(PolicyError::InvalidInput(format!(
                "package {} listed twice",
                package.name
            )));
        }
        packages.insert(package.name.clone(), package);
    }
    Ok(ProjectEntry {
        principal,
        packages,
    })
}
