#![no_main]

use dnfs_proto::payloads::{FileMetadata, ReqFileOp, ResFileContent};
use libfuzzer_sys::fuzz_target;

// Decoders must never panic on malformed input, only return a decode error.
fuzz_target!(|data: &[u8]| {
    let _ = ReqFileOp::decode(data);
    let _ = FileMetadata::decode(data);
    let _ = ResFileContent::decode(data);
});
