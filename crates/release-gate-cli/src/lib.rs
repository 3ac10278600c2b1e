// crates/release-gate-cli/src/lib.rs
// ============================================================================
// Module: Release Gate CLI Library
// Description: Shared helpers for the Release Gate command-line interface.
// Purpose: Provide reusable components (i18n, bundles) for the binary and tests.
// Dependencies: release-gate-core, serde_json
// ============================================================================

//! ## Overview
//! This library module houses shared CLI utilities: the message catalog used
//! for every user-facing string and the directory-backed signature capability
//! used by `deployment evaluate`. The binary entry point (`src/main.rs`)
//! imports these helpers to keep all output consistent.
//!
//! Security posture: CLI inputs and bundle files are untrusted and must be
//! validated.

// ============================================================================
// SECTION: Modules
// ============================================================================

/// Pre-verified attestation bundles read from a directory.
pub mod bundle;
/// Internationalization helpers and message catalog.
pub mod i18n;

#[cfg(test)]
mod tests;
