use std::io::Cursor;

use crate::constants::{MAX_FILENAME, MAX_PAYLOAD, MAX_USERNAME};
use crate::primitive::*;
use crate::Result;

/// A human-readable failure payload (§7: up to [`MAX_PAYLOAD`] bytes).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResError {
    pub msg: String,
}

impl ResError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self { msg: msg.into() }
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(MAX_PAYLOAD);
        put_fixed_str(&mut out, &self.msg, MAX_PAYLOAD)?;
        Ok(out)
    }

    pub fn decode(buf: &[u8]) -> Result<Self> {
        let mut cur = Cursor::new(buf);
        Ok(Self { msg: get_fixed_str(&mut cur, MAX_PAYLOAD)? })
    }
}

/// A human-readable success payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResSuccess {
    pub msg: String,
}

impl ResSuccess {
    pub fn new(msg: impl Into<String>) -> Self {
        Self { msg: msg.into() }
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(MAX_PAYLOAD);
        put_fixed_str(&mut out, &self.msg, MAX_PAYLOAD)?;
        Ok(out)
    }

    pub fn decode(buf: &[u8]) -> Result<Self> {
        let mut cur = Cursor::new(buf);
        Ok(Self { msg: get_fixed_str(&mut cur, MAX_PAYLOAD)? })
    }
}

/// `{username, filename}`, the common shape of most Client<->NS and
/// NS<->SS file operation requests.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
pub struct ReqFileOp {
    pub username: String,
    pub filename: String,
}

impl ReqFileOp {
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(MAX_USERNAME + MAX_FILENAME);
        put_fixed_str(&mut out, &self.username, MAX_USERNAME)?;
        put_fixed_str(&mut out, &self.filename, MAX_FILENAME)?;
        Ok(out)
    }

    pub fn decode(buf: &[u8]) -> Result<Self> {
        let mut cur = Cursor::new(buf);
        Ok(Self {
            username: get_fixed_str(&mut cur, MAX_USERNAME)?,
            filename: get_fixed_str(&mut cur, MAX_FILENAME)?,
        })
    }
}

/// Per-file metadata record (§3 "File metadata", §4.3 atomic snapshot
/// record layout).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileMetadata {
    pub filename: String,
    pub owner: String,
    pub size_bytes: u64,
    pub word_count: u64,
    pub char_count: u64,
    pub last_modified: i64,
    pub last_access: i64,
    pub is_backup: bool,
}

impl FileMetadata {
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(MAX_FILENAME + MAX_USERNAME + 8 * 4 + 1);
        put_fixed_str(&mut out, &self.filename, MAX_FILENAME)?;
        put_fixed_str(&mut out, &self.owner, MAX_USERNAME)?;
        put_u64(&mut out, self.size_bytes);
        put_u64(&mut out, self.word_count);
        put_u64(&mut out, self.char_count);
        put_i64(&mut out, self.last_modified);
        put_i64(&mut out, self.last_access);
        put_bool(&mut out, self.is_backup);
        Ok(out)
    }

    pub fn decode_from(cur: &mut Cursor<&[u8]>) -> Result<Self> {
        Ok(Self {
            filename: get_fixed_str(cur, MAX_FILENAME)?,
            owner: get_fixed_str(cur, MAX_USERNAME)?,
            size_bytes: get_u64(cur)?,
            word_count: get_u64(cur)?,
            char_count: get_u64(cur)?,
            last_modified: get_i64(cur)?,
            last_access: get_i64(cur)?,
            is_backup: get_bool(cur)?,
        })
    }

    pub fn decode(buf: &[u8]) -> Result<Self> {
        let mut cur = Cursor::new(buf);
        Self::decode_from(&mut cur)
    }

    /// Encoded size in bytes of one record, for sizing buffers that hold
    /// a list of records (§4.3, [`super::Req_FileList`]-style payloads).
    pub const ENCODED_LEN: usize = MAX_FILENAME + MAX_USERNAME + 8 * 5 + 1;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_metadata_round_trips() {
        let meta = FileMetadata {
            filename: "notes.txt".into(),
            owner: "alice".into(),
            size_bytes: 17,
            word_count: 3,
            char_count: 17,
            last_modified: 1_700_000_000,
            last_access: 1_700_000_100,
            is_backup: true,
        };
        let encoded = meta.encode().unwrap();
        assert_eq!(encoded.len(), FileMetadata::ENCODED_LEN);
        assert_eq!(FileMetadata::decode(&encoded).unwrap(), meta);
    }
}
