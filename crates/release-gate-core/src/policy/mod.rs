// crates/release-gate-core/src/policy/mod.rs
// ============================================================================
// Module: Release Gate Policies
// Description: Organization, project, deployment, and publish policies.
// Purpose: Compose declarative trust rules into pass/fail evaluations.
// Dependencies: crate::core, crate::interfaces
// ============================================================================

//! ## Overview
//! Policies are built once from documents and evaluated many times. The
//! organization layer always runs first; project layers only tighten it.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod deployment;
pub mod organization;
pub mod project;
pub mod publish;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use deployment::DeploymentPolicy;
pub use organization::OrganizationPolicy;
pub use project::PackagePolicy;
pub use project::ProjectEntry;
pub use project::ProjectPolicy;
pub use project::Protection;
pub use publish::BuilderRoot;
pub use publish::PolicyEvaluationResult;
pub use publish::PublishOrganizationPolicy;
pub use publish::PublishPolicy;
pub use publish::PublishProject;
pub use publish::PublishRequest;
