// crates/release-gate-core/tests/publish_policy.rs
// ============================================================================
// Module: Publish Policy Tests
// Description: Build-provenance policy evaluation and result attestations.
// Purpose: Ensure builder selection, environment rules, and frozen results.
// Dependencies: release-gate-core, serde_json
// ============================================================================

//! Publish policy tests.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use std::cell::RefCell;

use release_gate_core::BuildAttestationVerifier;
use release_gate_core::BytesDocumentIterator;
use release_gate_core::CreationOption;
use release_gate_core::DigestSet;
use release_gate_core::DocumentIds;
use release_gate_core::ErrorKind;
use release_gate_core::NamedDocument;
use release_gate_core::PackageDescriptor;
use release_gate_core::PackageHelper;
use release_gate_core::PolicyError;
use release_gate_core::PublishPolicy;
use release_gate_core::PublishRequest;
use release_gate_core::ReleaseDecision;
use serde_json::json;

const BUILDER_L2: &str = "https://builders.example/generic@v1";
const BUILDER_L3: &str = "https://builders.example/hermetic@v1";
const REPOSITORY: &str = "https://git.example/org/app";

struct ContainerPackages;

impl PackageHelper for ContainerPackages {
    fn package_descriptor(&self, package_name: &str) -> Result<PackageDescriptor, PolicyError> {
        Ok(PackageDescriptor {
            ecosystem: "container".to_string(),
            registry: "registry.example".to_string(),
            name: format!("registry.example/{package_name}"),
        })
    }
}

/// Build verifier accepting exactly one builder and recording every call.
struct OneBuilder {
    accepted: &'static str,
    calls: RefCell<Vec<String>>,
}

impl OneBuilder {
    fn new(accepted: &'static str) -> Self {
        Self {
            accepted,
            calls: RefCell::new(Vec::new()),
        }
    }
}

impl BuildAttestationVerifier for OneBuilder {
    fn verify_build_attestation(
        &self,
        _digests: &DigestSet,
        _name: &str,
        builder_id: &str,
        source_uri: &str,
    ) -> Result<(), PolicyError> {
        self.calls.borrow_mut().push(builder_id.to_string());
        if builder_id == self.accepted && source_uri == REPOSITORY {
            Ok(())
        } else {
            Err(PolicyError::Verification(format!("no provenance from {builder_id}")))
        }
    }
}

fn publish_policy(
    project: &serde_json::Value,
) -> Result<PublishPolicy<ContainerPackages>, PolicyError> {
    publish_policy_with(&[project.clone()])
}

fn publish_policy_with(
    projects: &[serde_json::Value],
) -> Result<PublishPolicy<ContainerPackages>, PolicyError> {
    let organization = serde_json::to_vec(&json!({
        "format": 1,
        "roots": { "build": [
            { "id": BUILDER_L2, "slsa_level": 2 },
            { "id": BUILDER_L3, "slsa_level": 3 }
        ] }
    }))
    .unwrap();
    PublishPolicy::new(
        organization.as_slice(),
        BytesDocumentIterator::new(
            projects.iter().map(|project| serde_json::to_vec(project).unwrap()).collect(),
            DocumentIds::Unique,
        ),
        ContainerPackages,
        None,
    )
}

fn app_project(level: u8, environments: Option<&[&str]>) -> serde_json::Value {
    let mut package = json!({ "name": "org/app" });
    if let Some(environments) = environments {
        package["environment"] = json!({ "any_of": environments });
    }
    json!({
        "format": 1,
        "package": package,
        "build": { "require_slsa_level": level, "repository": { "uri": REPOSITORY } }
    })
}

fn digests() -> DigestSet {
    DigestSet::sha256("abc123").unwrap()
}

#[test]
fn only_builders_meeting_the_level_are_tried() {
    let policy = publish_policy(&app_project(3, None)).unwrap();
    let verifier = OneBuilder::new(BUILDER_L3);
    let result = policy.evaluate(&digests(), "org/app", &PublishRequest::default(), &verifier);
    assert_eq!(result.error(), None);
    assert_eq!(result.build_level(), Some(3));
    assert_eq!(result.package().unwrap().name, "registry.example/org/app");
    assert_eq!(*verifier.calls.borrow(), vec![BUILDER_L3.to_string()]);
}

#[test]
fn first_verifying_builder_determines_the_level() {
    let policy = publish_policy(&app_project(2, None)).unwrap();
    let verifier = OneBuilder::new(BUILDER_L2);
    let result = policy.evaluate(&digests(), "org/app", &PublishRequest::default(), &verifier);
    assert_eq!(result.build_level(), Some(2));
    assert_eq!(verifier.calls.borrow().len(), 1);
}

#[test]
fn failing_builders_are_aggregated() {
    let policy = publish_policy(&app_project(2, None)).unwrap();
    let verifier = OneBuilder::new("https://builders.example/unknown");
    let result = policy.evaluate(&digests(), "org/app", &PublishRequest::default(), &verifier);
    let err = result.error().unwrap();
    assert_eq!(err.kind(), ErrorKind::Verification);
    assert_eq!(err.candidate_failures().len(), 2);
    assert_eq!(result.build_level(), None);
}

#[test]
fn environment_requests_must_match_declarations() {
    let scoped = publish_policy(&app_project(2, Some(&["prod", "staging"]))).unwrap();
    let unscoped = publish_policy(&app_project(2, None)).unwrap();
    let verifier = OneBuilder::new(BUILDER_L2);
    let request = |environment: Option<&str>| PublishRequest {
        environment: environment.map(ToString::to_string),
    };

    let ok = scoped.evaluate(&digests(), "org/app", &request(Some("staging")), &verifier);
    assert_eq!(ok.error(), None);
    assert_eq!(ok.environment(), Some("staging"));

    for (policy, environment) in
        [(&scoped, None), (&scoped, Some("dev")), (&unscoped, Some("prod"))]
    {
        let result = policy.evaluate(&digests(), "org/app", &request(environment), &verifier);
        assert_eq!(result.error().unwrap().kind(), ErrorKind::InvalidInput);
    }
}

#[test]
fn unknown_packages_are_not_found() {
    let policy = publish_policy(&app_project(2, None)).unwrap();
    let verifier = OneBuilder::new(BUILDER_L2);
    let result = policy.evaluate(&digests(), "org/other", &PublishRequest::default(), &verifier);
    assert_eq!(result.error().unwrap().kind(), ErrorKind::NotFound);
    assert!(verifier.calls.borrow().is_empty());
}

#[test]
fn every_project_document_is_loaded() {
    let mut web = app_project(2, None);
    web["package"]["name"] = json!("org/web");
    let policy = publish_policy_with(&[app_project(3, None), web]).unwrap();
    assert_eq!(policy.project("org/app").unwrap().build_level, 3);
    assert_eq!(policy.project("org/web").unwrap().build_level, 2);

    let verifier = OneBuilder::new(BUILDER_L2);
    let result = policy.evaluate(&digests(), "org/web", &PublishRequest::default(), &verifier);
    assert_eq!(result.build_level(), Some(2));
}

#[test]
fn duplicate_packages_and_source_errors_abort_load() {
    let err = publish_policy_with(&[app_project(2, None), app_project(3, None)]).err().unwrap();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
    assert!(err.to_string().contains("listed twice"));

    let organization = serde_json::to_vec(&json!({
        "format": 1,
        "roots": { "build": [ { "id": BUILDER_L2, "slsa_level": 2 } ] }
    }))
    .unwrap();
    let documents: Vec<Result<NamedDocument, PolicyError>> =
        vec![Err(PolicyError::Internal("listing failed".to_string()))];
    let err = PublishPolicy::new(organization.as_slice(), documents, ContainerPackages, None)
        .err()
        .unwrap();
    assert_eq!(err.kind(), ErrorKind::Internal);
}

#[test]
fn unreachable_required_level_is_rejected_at_load() {
    let err = publish_policy(&app_project(4, None)).err().unwrap();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
}

#[test]
fn successful_results_attest_allow_with_frozen_trust_fields() {
    let policy = publish_policy(&app_project(2, Some(&["prod"]))).unwrap();
    let verifier = OneBuilder::new(BUILDER_L3);
    let request = PublishRequest {
        environment: Some("prod".to_string()),
    };
    let result = policy.evaluate(&digests(), "org/app", &request, &verifier);
    let creation = result
        .attestation("https://publisher.example", vec![CreationOption::AuthorVersion("v1".into())])
        .unwrap();
    assert!(creation.is_safe_mode());
    let statement = creation.statement();
    assert_eq!(statement.predicate.release_result, ReleaseDecision::Allow);
    assert_eq!(statement.predicate.build_level().unwrap(), Some(3));
    assert_eq!(statement.subject[0].name, "registry.example/org/app");
    assert_eq!(statement.subject[0].environment().unwrap(), Some("prod"));

    let err = result
        .attestation("https://publisher.example", vec![CreationOption::SlsaBuildLevel(4)])
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
}

#[test]
fn failed_results_attest_deny_without_level() {
    let policy = publish_policy(&app_project(2, None)).unwrap();
    let verifier = OneBuilder::new("https://builders.example/unknown");
    let result = policy.evaluate(&digests(), "org/app", &PublishRequest::default(), &verifier);
    let creation = result.attestation("https://publisher.example", Vec::new()).unwrap();
    let predicate = &creation.statement().predicate;
    assert_eq!(predicate.release_result, ReleaseDecision::Deny);
    assert_eq!(predicate.build_level().unwrap(), None);
    assert_eq!(creation.statement().subject[0].name, "org/app");
}
