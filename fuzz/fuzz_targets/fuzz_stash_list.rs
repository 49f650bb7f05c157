//! Fuzz target for `git stash list` parsing.
//!
//! Tests that arbitrary command output never panics the parser and that
//! every parsed entry names a stash reference.

#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let output = String::from_utf8_lossy(data);
    for entry in peergit_git::parse_stash_list(&output) {
        assert!(entry.reference.starts_with("stash@{"));
    }
});
