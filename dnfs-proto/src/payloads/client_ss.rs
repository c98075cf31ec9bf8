use std::io::{Cursor, Read};

use crate::constants::{MAX_FILENAME, MAX_PAYLOAD};
use crate::primitive::*;
use crate::Result;

/// `MSG_C2S_WRITE` payload: opens a WRITE transaction on `filename` at
/// `sentence_num` (§4.3).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReqWriteTransaction {
    pub filename: String,
    pub sentence_num: i32,
}

impl ReqWriteTransaction {
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(MAX_FILENAME + 4);
        put_fixed_str(&mut out, &self.filename, MAX_FILENAME)?;
        put_i32(&mut out, self.sentence_num);
        Ok(out)
    }

    pub fn decode(buf: &[u8]) -> Result<Self> {
        let mut cur = Cursor::new(buf);
        let filename = get_fixed_str(&mut cur, MAX_FILENAME)?;
        let sentence_num = get_i32(&mut cur)?;
        Ok(Self { filename, sentence_num })
    }
}

/// Maximum bytes of `content` in one [`ReqWriteData`] message.
pub const MAX_WRITE_DATA_CONTENT: usize = MAX_PAYLOAD - 4;

/// `MSG_C2S_WRITE_DATA` payload: one word-splice instruction within an
/// open WRITE transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReqWriteData {
    pub word_index: i32,
    pub content: String,
}

impl ReqWriteData {
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(4 + MAX_WRITE_DATA_CONTENT);
        put_i32(&mut out, self.word_index);
        put_fixed_str(&mut out, &self.content, MAX_WRITE_DATA_CONTENT)?;
        Ok(out)
    }

    pub fn decode(buf: &[u8]) -> Result<Self> {
        let mut cur = Cursor::new(buf);
        let word_index = get_i32(&mut cur)?;
        let content = get_fixed_str(&mut cur, MAX_WRITE_DATA_CONTENT)?;
        Ok(Self { word_index, content })
    }
}

/// `MSG_S2C_READ_CONTENT` / VIEWCHECKPOINT chunk payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResFileContent {
    pub data: Vec<u8>,
    pub is_final_chunk: bool,
}

impl ResFileContent {
    pub fn encode(&self) -> Result<Vec<u8>> {
        if self.data.len() > MAX_PAYLOAD {
            return Err(crate::Error::StringTooLong { max: MAX_PAYLOAD, got: self.data.len() });
        }
        let mut out = Vec::with_capacity(4 + MAX_PAYLOAD + 1);
        put_u32(&mut out, self.data.len() as u32);
        let mut padded = self.data.clone();
        padded.resize(MAX_PAYLOAD, 0);
        out.extend_from_slice(&padded);
        put_bool(&mut out, self.is_final_chunk);
        Ok(out)
    }

    pub fn decode(buf: &[u8]) -> Result<Self> {
        let mut cur = Cursor::new(buf);
        let data_len = get_u32(&mut cur)? as usize;
        if data_len > MAX_PAYLOAD {
            return Err(crate::Error::BadPayloadLength { expected: MAX_PAYLOAD, got: data_len });
        }
        let mut full = vec![0u8; MAX_PAYLOAD];
        cur.read_exact(&mut full)?;
        let is_final_chunk = get_bool(&mut cur)?;
        full.truncate(data_len);
        Ok(Self { data: full, is_final_chunk })
    }
}

/// `MSG_S2C_WRITE_OK` payload: how many words the working sentence
/// currently holds, so the client knows the valid `word_index` range
/// for the `WRITE_DATA` messages that follow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResWriteOk {
    pub num_words: u32,
}

impl ResWriteOk {
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(4);
        put_u32(&mut out, self.num_words);
        out
    }

    pub fn decode(buf: &[u8]) -> Result<Self> {
        let mut cur = Cursor::new(buf);
        Ok(Self { num_words: get_u32(&mut cur)? })
    }
}

/// `MSG_S2C_STREAM_WORD` payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResStreamWord {
    pub word: String,
}

const STREAM_WORD_WIDTH: usize = 256;

impl ResStreamWord {
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(STREAM_WORD_WIDTH);
        put_fixed_str(&mut out, &self.word, STREAM_WORD_WIDTH)?;
        Ok(out)
    }

    pub fn decode(buf: &[u8]) -> Result<Self> {
        let mut cur = Cursor::new(buf);
        Ok(Self { word: get_fixed_str(&mut cur, STREAM_WORD_WIDTH)? })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_ok_round_trips() {
        let res = ResWriteOk { num_words: 7 };
        assert_eq!(ResWriteOk::decode(&res.encode()).unwrap(), res);
    }

    #[test]
    fn file_content_round_trips_including_length() {
        let res = ResFileContent { data: b"hello".to_vec(), is_final_chunk: false };
        let encoded = res.encode().unwrap();
        assert_eq!(encoded.len(), 4 + MAX_PAYLOAD + 1);
        assert_eq!(ResFileContent::decode(&encoded).unwrap(), res);
    }

    #[test]
    fn empty_final_chunk_round_trips() {
        let res = ResFileContent { data: Vec::new(), is_final_chunk: true };
        let encoded = res.encode().unwrap();
        let decoded = ResFileContent::decode(&encoded).unwrap();
        assert_eq!(decoded.data.len(), 0);
        assert!(decoded.is_final_chunk);
    }
}
