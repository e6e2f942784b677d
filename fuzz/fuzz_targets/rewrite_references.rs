//! Fuzz harness for merge-time id rewriting
//!
//! Rewrites arbitrary text against a fixed remap. An empty remap must leave
//! the text untouched.
//! Target: `caseport_merge::rewrite_references`

#![no_main]

use caseport_ids::CanonicalId;
use caseport_merge::{IdRemap, rewrite_references};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(input) = std::str::from_utf8(data) else {
        return;
    };

    assert_eq!(rewrite_references(input, &IdRemap::default()), input);

    let mut remap = IdRemap::default();
    remap
        .sections
        .insert(CanonicalId::from_u128(1), CanonicalId::from_u128(2));
    remap
        .attributes
        .insert(CanonicalId::from_u128(3), CanonicalId::from_u128(4));
    let _ = rewrite_references(input, &remap);
});
