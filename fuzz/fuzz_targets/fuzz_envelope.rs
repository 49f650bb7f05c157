//! Fuzz target for envelope decoding.
//!
//! Tests that a frame from an untrusted peer never panics the decoder, and
//! that every request payload parser copes with whatever payload arrives.

#![no_main]

use libfuzzer_sys::fuzz_target;
use peergit_protocol::{
    codec, CommitRequest, DiffRequest, Envelope, LinkRepoRequest, ReadFileRequest, RenameFileRequest,
    SwitchBranchRequest, WriteFileRequest,
};

fuzz_target!(|data: &[u8]| {
    let Ok(envelope) = codec::decode::<Envelope>(data) else {
        return;
    };

    let _ = envelope.request_kind();
    let _ = envelope.parse_payload::<ReadFileRequest>();
    let _ = envelope.parse_payload::<WriteFileRequest>();
    let _ = envelope.parse_payload::<RenameFileRequest>();
    let _ = envelope.parse_payload::<LinkRepoRequest>();
    let _ = envelope.parse_payload::<SwitchBranchRequest>();
    let _ = envelope.parse_payload::<CommitRequest>();
    let _ = envelope.parse_payload::<DiffRequest>();

    // Anything that decoded must encode again.
    codec::encode(&envelope).expect("decoded envelope re-encodes");
});
