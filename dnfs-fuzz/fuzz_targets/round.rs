#![no_main]

use dnfs_proto::payloads::ReqFileOp;
use libfuzzer_sys::fuzz_target;

// Any ReqFileOp that successfully encodes (fields within their fixed-width
// bounds) must decode back to an identical value.
fuzz_target!(|req: ReqFileOp| {
    let Ok(encoded) = req.encode() else { return };
    let decoded = ReqFileOp::decode(&encoded).expect("round-trip decode must succeed");
    assert_eq!(decoded, req);
});
