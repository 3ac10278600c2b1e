// crates/release-gate-core/src/policy/publish.rs
// ============================================================================
// Module: Publish Policy
// Description: Build-provenance policy deciding whether a package may publish.
// Purpose: Evaluate builder trust roots and emit release attestations.
// Dependencies: serde, crate::attestation, crate::core, crate::interfaces
// ============================================================================

//! ## Overview
//! The publish flow mirrors the deployment flow one step earlier in the
//! supply chain. The organization document lists trusted builders with the
//! highest level each can attest; each project document protects one package
//! built from one repository. A successful evaluation yields the achieved
//! build level, and [`PolicyEvaluationResult::attestation`] turns any result
//! (success or failure) into a release attestation ready for signing.
//!
//! ## Invariants
//! - Results freeze trust fields before applying caller options, so callers
//!   can annotate an attestation but never alter its level or environment.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::io::Read;

use serde::Deserialize;

use crate::attestation::ReleaseDecision;
use crate::attestation::Subject;
use crate::attestation::creation::Creation;
use crate::attestation::creation::CreationOption;
use crate::core::CandidateFailure;
use crate::core::DigestSet;
use crate::core::ErrorKind;
use crate::core::MAX_DOCUMENT_BYTES;
use crate::core::NamedDocument;
use crate::core::PolicyError;
use crate::core::document::ensure_format;
use crate::core::document::parse_json_document;
use crate::core::error::exhausted;
use crate::interfaces::BuildAttestationVerifier;
use crate::interfaces::PackageDescriptor;
use crate::interfaces::PackageHelper;
use crate::interfaces::PolicyValidator;
use crate::interfaces::ValidationPackage;
use crate::interfaces::validate_required_level;
use crate::policy::project::EnvironmentDocument;
use crate::policy::project::validate_environments;

// ============================================================================
// SECTION: Document Model
// ============================================================================

/// Wire form of the publish organization document.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct PublishOrganizationDocument {
    /// Document format version.
    format: u32,
    /// Trust roots.
    roots: PublishRootsDocument,
}

/// Builder trust roots.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct PublishRootsDocument {
    /// Trusted builders.
    build: Vec<BuilderRootDocument>,
}

/// Trusted builder.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct BuilderRootDocument {
    /// Builder identity.
    id: String,
    /// Highest build level the builder can attest.
    slsa_level: u8,
}

/// Wire form of a publish project document.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct PublishProjectDocument {
    /// Document format version.
    format: u32,
    /// Protected package.
    package: PublishPackageDocument,
    /// Build requirements.
    build: PublishBuildDocument,
}

/// Protected package.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct PublishPackageDocument {
    /// Policy package name.
    name: String,
    /// Accepted environments.
    #[serde(default)]
    environment: Option<EnvironmentDocument>,
}

/// Publish build requirements.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct PublishBuildDocument {
    /// Required build level.
    require_slsa_level: u8,
    /// Source repository.
    repository: RepositoryDocument,
}

/// Source repository.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RepositoryDocument {
    /// Repository URI.
    uri: String,
}

// ============================================================================
// SECTION: Organization
// ============================================================================

/// Trusted builder and the highest level it can attest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuilderRoot {
    /// Builder identity.
    pub id: String,
    /// Highest attestable build level.
    pub build_level: u8,
}

/// Organization-wide publish constraints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishOrganizationPolicy {
    /// Trusted builders in document order.
    roots: Vec<BuilderRoot>,
}

impl PublishOrganizationPolicy {
    /// Reads and validates a publish organization document.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError::InvalidInput`] for malformed documents, empty or
    /// duplicate builder ids, and out-of-range levels.
    pub fn from_reader(reader: impl Read, max_bytes: usize) -> Result<Self, PolicyError> {
        let context = "publish organization policy";
        let document: PublishOrganizationDocument =
            parse_json_document(reader, max_bytes).map_err(|err| err.with_context(context))?;
        ensure_format(document.format).map_err(|err| err.with_context(context))?;
        if document.roots.build.is_empty() {
            return Err(PolicyError::InvalidInput("no builder roots configured".to_string())
                .with_context(context));
        }
        let mut seen = BTreeSet::new();
        let mut roots = Vec::with_capacity(document.roots.build.len());
        for root in document.roots.build {
            if root.id.trim().is_empty() {
                return Err(PolicyError::InvalidInput("builder id is empty".to_string())
                    .with_context(context));
            }
            if !seen.insert(root.id.clone()) {
                return Err(PolicyError::InvalidInput(format!("builder {} listed twice", root.id))
                    .with_context(context));
            }
            validate_required_level(root.slsa_level)
                .map_err(|err| err.with_context(format!("{context}: builder {}", root.id)))?;
            roots.push(BuilderRoot {
                id: root.id,
                build_level: root.slsa_level,
            });
        }
        Ok(Self {
            roots,
        })
    }

    /// Returns the trusted builders in document order.
    #[must_use]
    pub fn roots(&self) -> &[BuilderRoot] {
        &self.roots
    }

    /// Returns the highest level any builder can attest.
    #[must_use]
    pub fn max_build_level(&self) -> u8 {
        self.roots.iter().map(|root| root.build_level).max().unwrap_or_default()
    }

    /// Checks global constraints for a publish request.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError::InvalidInput`] when the package name is blank.
    pub fn evaluate(&self, _digests: &DigestSet, package_name: &str) -> Result<(), PolicyError> {
        if package_name.trim().is_empty() {
            return Err(PolicyError::InvalidInput("policy package name is empty".to_string()));
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Project
// ============================================================================

/// Caller-supplied publish request options.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublishRequest {
    /// Target environment, required when the package declares environments.
    pub environment: Option<String>,
}

/// Publish rules for one package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishProject {
    /// Policy package name.
    pub name: String,
    /// Accepted environments, empty when unscoped.
    pub environments: Vec<String>,
    /// Required build level.
    pub build_level: u8,
    /// Source repository URI.
    pub repository_uri: String,
}

impl PublishProject {
    /// Converts and validates a project document.
    fn from_document(
        document: PublishProjectDocument,
        organization: &PublishOrganizationPolicy,
    ) -> Result<Self, PolicyError> {
        let PublishProjectDocument {
            format,
            package,
            build,
        } = document;
        ensure_format(format)?;
        if package.name.trim().is_empty() {
            return Err(PolicyError::InvalidInput("package name is empty".to_string()));
        }
        let environments = match package.environment {
            Some(environment) => {
                validate_environments(&environment.any_of)?;
                environment.any_of
            }
            None => Vec::new(),
        };
        validate_required_level(build.require_slsa_level)?;
        if build.require_slsa_level > organization.max_build_level() {
            return Err(PolicyError::InvalidInput(format!(
                "required build level {} exceeds every builder root",
                build.require_slsa_level
            )));
        }
        if build.repository.uri.trim().is_empty() {
            return Err(PolicyError::InvalidInput("repository uri is empty".to_string()));
        }
        Ok(Self {
            name: package.name,
            environments,
            build_level: build.require_slsa_level,
            repository_uri: build.repository.uri,
        })
    }

    /// Evaluates the package and returns the achieved build level.
    fn evaluate(
        &self,
        digests: &DigestSet,
        request: &PublishRequest,
        organization: &PublishOrganizationPolicy,
        verifier: &dyn BuildAttestationVerifier,
    ) -> Result<u8, PolicyError> {
        match (&request.environment, self.environments.is_empty()) {
            (None, false) => {
                return Err(PolicyError::InvalidInput(format!(
                    "package {} requires one of environments {}",
                    self.name,
                    self.environments.join(",")
                )));
            }
            (Some(environment), true) => {
                return Err(PolicyError::InvalidInput(format!(
                    "package {} is not scoped to environments, got {environment}",
                    self.name
                )));
            }
            (Some(environment), false) if !self.environments.contains(environment) => {
                return Err(PolicyError::InvalidInput(format!(
                    "package {} does not accept environment {environment}",
                    self.name
                )));
            }
            _ => {}
        }

        let mut failures = Vec::new();
        let eligible =
            organization.roots().iter().filter(|root| root.build_level >= self.build_level);
        for root in eligible {
            match verifier.verify_build_attestation(
                digests,
                &self.name,
                &root.id,
                &self.repository_uri,
            ) {
                Ok(()) => return Ok(root.build_level),
                Err(err) if err.kind() == ErrorKind::InvalidInput => return Err(err),
                Err(err) => failures.push(CandidateFailure::new(root.id.as_str(), err)),
            }
        }
        if failures.is_empty() {
            return Err(PolicyError::Verification(format!(
                "no builder root can attest build level {}",
                self.build_level
            )));
        }
        Err(exhausted(format!("package {}", self.name), failures))
    }
}

// ============================================================================
// SECTION: Publish Policy
// ============================================================================

/// Organization and project policies composed for publish decisions.
pub struct PublishPolicy<H> {
    /// Global constraints.
    organization: PublishOrganizationPolicy,
    /// Package rules keyed by policy package name.
    projects: BTreeMap<String, PublishProject>,
    /// Package name translation capability.
    package_helper: H,
}

impl<H: PackageHelper> PublishPolicy<H> {
    /// Builds a publish policy with the default per-document size limit.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError`] when any document or package is rejected.
    pub fn new<I>(
        organization: impl Read,
        projects: I,
        package_helper: H,
        validator: Option<&dyn PolicyValidator>,
    ) -> Result<Self, PolicyError>
    where
        I: IntoIterator<Item = Result<NamedDocument, PolicyError>>,
    {
        Self::with_limit(organization, projects, package_helper, validator, MAX_DOCUMENT_BYTES)
    }

    /// Builds a publish policy with an explicit per-document size limit.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError`] when any document or package is rejected.
    pub fn with_limit<I>(
        organization: impl Read,
        projects: I,
        package_helper: H,
        validator: Option<&dyn PolicyValidator>,
        max_document_bytes: usize,
    ) -> Result<Self, PolicyError>
    where
        I: IntoIterator<Item = Result<NamedDocument, PolicyError>>,
    {
        let organization =
            PublishOrganizationPolicy::from_reader(organization, max_document_bytes)?;
        let mut packages = BTreeMap::new();
        for document in projects {
            let NamedDocument {
                id,
                content,
            } = document?;
            let context = format!("publish project policy {id}");
            let parsed: PublishProjectDocument = parse_json_document(content, max_document_bytes)
                .map_err(|err| err.with_context(&context))?;
            let project = PublishProject::from_document(parsed, &organization)
                .map_err(|err| err.with_context(&context))?;
            if let Some(validator) = validator {
                validator
                    .validate_package(&ValidationPackage {
                        name: project.name.clone(),
                        environments: project.environments.clone(),
                    })
                    .map_err(|err| err.with_context(&context))?;
            }
            if packages.contains_key(&project.name) {
                return Err(PolicyError::InvalidInput(format!(
                    "package {} listed twice",
                    project.name
                ))
                .with_context(&context));
            }
            packages.insert(project.name.clone(), project);
        }
        Ok(Self {
            organization,
            projects: packages,
            package_helper,
        })
    }

    /// Returns the organization policy.
    #[must_use]
    pub const fn organization(&self) -> &PublishOrganizationPolicy {
        &self.organization
    }

    /// Returns the rules for `package_name`.
    #[must_use]
    pub fn project(&self, package_name: &str) -> Option<&PublishProject> {
        self.projects.get(package_name)
    }

    /// Evaluates whether `policy_package_name`/`digests` may be published.
    ///
    /// The result always carries the request; failures are recorded in it
    /// rather than returned, so a denial can still be attested.
    pub fn evaluate(
        &self,
        digests: &DigestSet,
        policy_package_name: &str,
        request: &PublishRequest,
        verifier: &dyn BuildAttestationVerifier,
    ) -> PolicyEvaluationResult {
        let outcome = self.evaluate_inner(digests, policy_package_name, request, verifier);
        PolicyEvaluationResult {
            digests: digests.clone(),
            package_name: policy_package_name.to_string(),
            environment: request.environment.clone(),
            outcome,
        }
    }

    /// Runs both policy phases and translates the package name.
    fn evaluate_inner(
        &self,
        digests: &DigestSet,
        policy_package_name: &str,
        request: &PublishRequest,
        verifier: &dyn BuildAttestationVerifier,
    ) -> Result<PublishOutcome, PolicyError> {
        self.organization.evaluate(digests, policy_package_name)?;
        let project = self.projects.get(policy_package_name).ok_or_else(|| {
            PolicyError::NotFound(format!("package {policy_package_name}"))
        })?;
        let build_level = project.evaluate(digests, request, &self.organization, verifier)?;
        let package = self.package_helper.package_descriptor(policy_package_name)?;
        Ok(PublishOutcome {
            build_level,
            package,
        })
    }
}

// ============================================================================
// SECTION: Evaluation Result
// ============================================================================

/// Successful publish evaluation details.
#[derive(Debug, Clone, PartialEq, Eq)]
struct PublishOutcome {
    /// Achieved build level.
    build_level: u8,
    /// Translated package coordinates.
    package: PackageDescriptor,
}

/// Outcome of one publish evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyEvaluationResult {
    /// Evaluated digests.
    digests: DigestSet,
    /// Policy package name requested.
    package_name: String,
    /// Requested environment.
    environment: Option<String>,
    /// Evaluation outcome.
    outcome: Result<PublishOutcome, PolicyError>,
}

impl PolicyEvaluationResult {
    /// Returns the evaluation error, if the evaluation failed.
    #[must_use]
    pub fn error(&self) -> Option<&PolicyError> {
        self.outcome.as_ref().err()
    }

    /// Returns the achieved build level on success.
    #[must_use]
    pub fn build_level(&self) -> Option<u8> {
        self.outcome.as_ref().ok().map(|outcome| outcome.build_level)
    }

    /// Returns the translated package coordinates on success.
    #[must_use]
    pub fn package(&self) -> Option<&PackageDescriptor> {
        self.outcome.as_ref().ok().map(|outcome| &outcome.package)
    }

    /// Returns the evaluated digests.
    #[must_use]
    pub const fn digests(&self) -> &DigestSet {
        &self.digests
    }

    /// Returns the requested environment.
    #[must_use]
    pub fn environment(&self) -> Option<&str> {
        self.environment.as_deref()
    }

    /// Creates a release attestation recording this result.
    ///
    /// Success yields an `ALLOW` attestation carrying the build level;
    /// failure yields `DENY`. The environment is recorded either way. Safe
    /// mode is enabled before `options` are applied.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError::InvalidInput`] when `author_id` is blank or an
    /// option edits a frozen field.
    pub fn attestation(
        &self,
        author_id: &str,
        options: impl IntoIterator<Item = CreationOption>,
    ) -> Result<Creation, PolicyError> {
        let (name, decision, mut trust) = match &self.outcome {
            Ok(outcome) => (
                outcome.package.name.clone(),
                ReleaseDecision::Allow,
                vec![CreationOption::SlsaBuildLevel(outcome.build_level)],
            ),
            Err(_) => (self.package_name.clone(), ReleaseDecision::Deny, Vec::new()),
        };
        if let Some(environment) = &self.environment {
            trust.push(CreationOption::Environment(environment.clone()));
        }
        trust.push(CreationOption::SafeMode);
        Creation::new(
            Subject::new(name, self.digests.clone()),
            author_id,
            decision,
            trust.into_iter().chain(options),
        )
    }
}
