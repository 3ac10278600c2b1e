// crates/release-gate-config/src/lib.rs
// ============================================================================
// Module: Release Gate Config Library
// Description: Canonical config model, validation, and document sources.
// Purpose: Single source of truth for release-gate.toml semantics.
// Dependencies: release-gate-core, serde, toml
// ============================================================================

//! ## Overview
//! `release-gate-config` defines the configuration model for Release Gate
//! hosts. It provides strict, fail-closed validation and turns a validated
//! configuration into a deployment policy and an audit sink.
//!
//! Security posture: config inputs and policy directories are untrusted.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;
pub mod source;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
pub use source::*;
