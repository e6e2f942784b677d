//! Fuzz harness for attachment file names
//!
//! Stored names never contain path separators and never collide.
//! Target: `caseport_sanitize`

#![no_main]

use caseport_sanitize::{UniqueNames, sanitize_filename};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(input) = std::str::from_utf8(data) else {
        return;
    };

    let clean = sanitize_filename(input);
    assert!(!clean.contains('/') && !clean.contains('\\'));

    let mut names = UniqueNames::new();
    let first = names.reserve(input);
    let second = names.reserve(input);
    assert_ne!(first, second);
});
