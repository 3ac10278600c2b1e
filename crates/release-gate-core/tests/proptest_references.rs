// crates/release-gate-core/tests/proptest_references.rs
// ============================================================================
// Module: Reference and Level Property-Based Tests
// Description: Property tests for artifact addressing and level bounds.
// Purpose: Detect addressing ambiguities and range errors across wide inputs.
// ============================================================================

//! Property-based tests for canonical references and build-level ranges.

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
    reason = "Test-only assertions and helpers are permitted."
)]

use proptest::prelude::*;
use release_gate_core::ArtifactReference;
use release_gate_core::Creation;
use release_gate_core::CreationOption;
use release_gate_core::DigestSet;
use release_gate_core::ErrorKind;
use release_gate_core::ReleaseDecision;
use release_gate_core::ReleaseVerifierConfig;
use release_gate_core::ReleaserIdentity;
use release_gate_core::Subject;

fn creation_with_level(decision: ReleaseDecision, level: u8) -> Result<Creation, ErrorKind> {
    Creation::new(
        Subject::new("registry/app", DigestSet::sha256("abc").unwrap()),
        "author",
        decision,
        vec![CreationOption::SlsaBuildLevel(level)],
    )
    .map_err(|err| err.kind())
}

proptest! {
    #[test]
    fn canonical_reference_is_name_at_sha256(
        name in "[a-z0-9][a-z0-9./_-]{0,40}",
        hex in "[0-9a-f]{1,64}",
    ) {
        let digests = DigestSet::sha256(hex.clone()).unwrap();
        let reference = ArtifactReference::new(&name, &digests).unwrap();
        prop_assert_eq!(reference.to_string(), format!("{name}@sha256:{hex}"));
    }

    #[test]
    fn qualified_names_are_always_rejected(
        prefix in "[a-z0-9/]{0,16}",
        separator in prop_oneof![Just(':'), Just('@')],
        suffix in "[a-z0-9]{0,16}",
    ) {
        let name = format!("{prefix}{separator}{suffix}");
        let digests = DigestSet::sha256("abc123").unwrap();
        let err = ArtifactReference::new(&name, &digests).unwrap_err();
        prop_assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[test]
    fn verifier_config_accepts_only_levels_one_to_four(level in any::<u8>()) {
        let releaser = ReleaserIdentity::exact("https://releaser.example").unwrap();
        let accepted = ReleaseVerifierConfig::new(releaser, level).is_ok();
        prop_assert_eq!(accepted, (1 ..= 4).contains(&level));
    }

    #[test]
    fn creation_accepts_levels_zero_to_four_only_on_allow(level in any::<u8>()) {
        let allow = creation_with_level(ReleaseDecision::Allow, level);
        prop_assert_eq!(allow.is_ok(), level <= 4);
        if level > 4 {
            prop_assert_eq!(allow.err(), Some(ErrorKind::InvalidInput));
        }
        let deny = creation_with_level(ReleaseDecision::Deny, level);
        prop_assert_eq!(deny.err(), Some(ErrorKind::InvalidInput));
    }
}
