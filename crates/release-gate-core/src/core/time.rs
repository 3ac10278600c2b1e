// crates/release-gate-core/src/core/time.rs
// ============================================================================
// Module: Release Gate Time Model
// Description: RFC 3339 creation timestamps for attestations.
// Purpose: Format and parse attestation creation times consistently.
// Dependencies: time
// ============================================================================

//! ## Overview
//! Attestation creation times are RFC 3339 strings in UTC. Creation reads the
//! wall clock only when the caller does not supply an explicit time.

// ============================================================================
// SECTION: Imports
// ============================================================================

use time::OffsetDateTime;
use time::UtcOffset;
use time::format_description::well_known::Rfc3339;

use crate::core::error::PolicyError;

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Formats a timestamp as an RFC 3339 UTC string.
///
/// # Errors
///
/// Returns [`PolicyError::Internal`] when the timestamp cannot be formatted.
pub fn format_rfc3339(value: OffsetDateTime) -> Result<String, PolicyError> {
    value
        .to_offset(UtcOffset::UTC)
        .format(&Rfc3339)
        .map_err(|err| PolicyError::Internal(format!("failed to format creation time: {err}")))
}

/// Returns the current wall-clock time as an RFC 3339 UTC string.
///
/// # Errors
///
/// Returns [`PolicyError::Internal`] when the timestamp cannot be formatted.
pub fn now_rfc3339() -> Result<String, PolicyError> {
    format_rfc3339(OffsetDateTime::now_utc())
}

/// Parses an RFC 3339 timestamp.
///
/// # Errors
///
/// Returns [`PolicyError::InvalidInput`] when the value is not RFC 3339.
pub fn parse_rfc3339(value: &str) -> Result<OffsetDateTime, PolicyError> {
    OffsetDateTime::parse(value, &Rfc3339).map_err(|err| {
        PolicyError::InvalidInput(format!("creation time ({value}) is not RFC 3339: {err}"))
    })
}
