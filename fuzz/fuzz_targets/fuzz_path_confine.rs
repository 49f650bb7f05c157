//! Fuzz target for path confinement.
//!
//! Any path that is accepted must stay under the repository root.

#![no_main]

use libfuzzer_sys::fuzz_target;
use std::path::Path;

fuzz_target!(|data: &[u8]| {
    let Ok(relative) = std::str::from_utf8(data) else {
        return;
    };

    let root = Path::new("/srv/repos/web");
    if let Ok(confined) = peergit_daemon::confine(root, relative) {
        assert!(confined.absolute.starts_with(root), "{relative:?} escaped to {:?}", confined.absolute);
        assert!(!confined.git_path().split('/').any(|part| part == ".."));
    }
});
