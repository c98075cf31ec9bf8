#![no_main]

use dnfs_proto::message::MsgHeader;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() < 8 {
        return;
    }
    let mut header = [0u8; 8];
    header.copy_from_slice(&data[..8]);
    let _ = MsgHeader::decode(&header);
});
