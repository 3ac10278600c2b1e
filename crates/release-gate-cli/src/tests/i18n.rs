// crates/release-gate-cli/src/tests/i18n.rs
// ============================================================================
// Module: CLI i18n Tests
// Description: Unit tests for the message catalog and translation.
// Purpose: Ensure catalog keys are unique and placeholders substitute.
// Dependencies: release-gate-cli i18n module
// ============================================================================

//! ## Overview
//! Verifies the CLI message catalog is well formed and that translation
//! substitutes named placeholders.

use std::collections::BTreeSet;

use crate::i18n::CATALOG_ITEMS;
use crate::i18n::MessageArg;
use crate::i18n::translate;

#[test]
fn catalog_keys_are_unique() {
    let keys: BTreeSet<&str> = CATALOG_ITEMS.iter().map(|(key, _)| *key).collect();
    assert_eq!(keys.len(), CATALOG_ITEMS.len());
}

#[test]
fn translate_substitutes_placeholders() {
    let output = translate(
        "input.read_failed",
        vec![
            MessageArg::new("kind", "artifact"),
            MessageArg::new("path", "/tmp/app.tar"),
            MessageArg::new("error", "denied"),
        ],
    );
    assert_eq!(output, "Failed to read artifact at /tmp/app.tar: denied");
}

#[test]
fn unknown_keys_fall_back_to_the_key() {
    assert_eq!(translate("missing.key", Vec::new()), "missing.key");
}

#[test]
fn macro_formats_display_values() {
    let output = crate::t!("policy.validate.ok", roots = 2, policies = 3, level = 1);
    assert_eq!(output, "Policy valid (release_roots=2, policy_ids=3, min_build_level=1).");
}
