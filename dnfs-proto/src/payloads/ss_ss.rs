use std::io::Cursor;

use crate::constants::{MAX_FILENAME, MAX_USERNAME};
use crate::primitive::*;
use crate::Result;

/// `MSG_S2S_REPLICATE_FILE` header. The file's `file_size` bytes follow
/// immediately on the wire as a raw trailer, not as a second framed
/// message (§4.2, "SS<->SS ring replication") — callers read/write that
/// trailer directly on the connection after this header round-trips.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReqReplicate {
    pub filename: String,
    pub owner: String,
    pub file_size: u64,
}

impl ReqReplicate {
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(MAX_FILENAME + MAX_USERNAME + 8);
        put_fixed_str(&mut out, &self.filename, MAX_FILENAME)?;
        put_fixed_str(&mut out, &self.owner, MAX_USERNAME)?;
        put_u64(&mut out, self.file_size);
        Ok(out)
    }

    pub fn decode(buf: &[u8]) -> Result<Self> {
        let mut cur = Cursor::new(buf);
        let filename = get_fixed_str(&mut cur, MAX_FILENAME)?;
        let owner = get_fixed_str(&mut cur, MAX_USERNAME)?;
        let file_size = get_u64(&mut cur)?;
        Ok(Self { filename, owner, file_size })
    }
}

/// `MSG_S2S_DELETE_FILE` payload: tells a backup to drop its replica.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReqReplicaDelete {
    pub filename: String,
}

impl ReqReplicaDelete {
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(MAX_FILENAME);
        put_fixed_str(&mut out, &self.filename, MAX_FILENAME)?;
        Ok(out)
    }

    pub fn decode(buf: &[u8]) -> Result<Self> {
        let mut cur = Cursor::new(buf);
        Ok(Self { filename: get_fixed_str(&mut cur, MAX_FILENAME)? })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replicate_header_round_trips() {
        let req = ReqReplicate { filename: "a.txt".into(), owner: "bob".into(), file_size: 4096 };
        let encoded = req.encode().unwrap();
        assert_eq!(ReqReplicate::decode(&encoded).unwrap(), req);
    }
}
