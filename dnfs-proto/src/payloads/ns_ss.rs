use std::io::{Cursor, Read};

use crate::constants::MAX_PAYLOAD;
use crate::payloads::common::FileMetadata;
use crate::primitive::*;
use crate::Result;

/// `MSG_S2N_REGISTER` payload. Carries the registering SS's listening
/// endpoints and its current file metadata snapshot, so the NS learns
/// `file_count` for placement without a follow-up round trip (§4.2,
/// "Supplemented features").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReqSsRegister {
    pub ip: std::net::Ipv4Addr,
    pub client_port: u16,
    pub replication_port: u16,
    pub files: Vec<FileMetadata>,
}

impl ReqSsRegister {
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(24 + self.files.len() * FileMetadata::ENCODED_LEN);
        out.extend_from_slice(&self.ip.octets());
        out.resize(out.len() + 12, 0);
        put_i32(&mut out, self.client_port as i32);
        put_i32(&mut out, self.replication_port as i32);
        put_u32(&mut out, self.files.len() as u32);
        for meta in &self.files {
            out.extend_from_slice(&meta.encode()?);
        }
        Ok(out)
    }

    pub fn decode(buf: &[u8]) -> Result<Self> {
        let mut cur = Cursor::new(buf);
        let mut ip_buf = [0u8; 16];
        cur.read_exact(&mut ip_buf)?;
        let ip = std::net::Ipv4Addr::new(ip_buf[0], ip_buf[1], ip_buf[2], ip_buf[3]);
        let client_port = get_i32(&mut cur)? as u16;
        let replication_port = get_i32(&mut cur)? as u16;
        let count = get_u32(&mut cur)? as usize;
        let mut files = Vec::with_capacity(count);
        for _ in 0..count {
            files.push(FileMetadata::decode_from(&mut cur)?);
        }
        Ok(Self { ip, client_port, replication_port, files })
    }
}

/// `MSG_N2S_REGISTER_ACK` payload (§4.4 recovery states 2 and 3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResSsRegisterAck {
    pub new_ss_id: i32,
    pub must_recover: bool,
    /// The id of the SS holding this SS's replicas, or `None` if it is
    /// the only node (or has no backup yet).
    pub backup_of_ss_id: Option<i32>,
    pub backup_ss_ip: std::net::Ipv4Addr,
    pub backup_ss_port: u16,
}

impl ResSsRegisterAck {
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(32);
        put_i32(&mut out, self.new_ss_id);
        put_bool(&mut out, self.must_recover);
        out.resize(out.len() + 3, 0);
        put_i32(&mut out, self.backup_of_ss_id.unwrap_or(-1));
        out.extend_from_slice(&self.backup_ss_ip.octets());
        out.resize(out.len() + 12, 0);
        put_i32(&mut out, self.backup_ss_port as i32);
        out
    }

    pub fn decode(buf: &[u8]) -> Result<Self> {
        let mut cur = Cursor::new(buf);
        let new_ss_id = get_i32(&mut cur)?;
        let must_recover = get_bool(&mut cur)?;
        let mut pad = [0u8; 3];
        cur.read_exact(&mut pad)?;
        let raw_backup = get_i32(&mut cur)?;
        let mut ip_buf = [0u8; 16];
        cur.read_exact(&mut ip_buf)?;
        let backup_ss_ip = std::net::Ipv4Addr::new(ip_buf[0], ip_buf[1], ip_buf[2], ip_buf[3]);
        let backup_ss_port = get_i32(&mut cur)? as u16;
        Ok(Self {
            new_ss_id,
            must_recover,
            backup_of_ss_id: if raw_backup < 0 { None } else { Some(raw_backup) },
            backup_ss_ip,
            backup_ss_port,
        })
    }
}

/// `MSG_N2S_EXEC_GET_CONTENT` / `MSG_S2N_EXEC_CONTENT` payload: the
/// text content of an EXEC script, bounded by [`MAX_PAYLOAD`] (§4.3).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResExecContent {
    pub content: String,
}

impl ResExecContent {
    pub fn encode(&self) -> Result<Vec<u8>> {
        if self.content.len() >= MAX_PAYLOAD {
            return Err(crate::Error::StringTooLong { max: MAX_PAYLOAD, got: self.content.len() });
        }
        let mut out = Vec::with_capacity(MAX_PAYLOAD);
        put_fixed_str(&mut out, &self.content, MAX_PAYLOAD)?;
        Ok(out)
    }

    pub fn decode(buf: &[u8]) -> Result<Self> {
        let mut cur = Cursor::new(buf);
        Ok(Self { content: get_fixed_str(&mut cur, MAX_PAYLOAD)? })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_ack_round_trips_with_no_backup() {
        let ack = ResSsRegisterAck {
            new_ss_id: 3,
            must_recover: true,
            backup_of_ss_id: None,
            backup_ss_ip: std::net::Ipv4Addr::UNSPECIFIED,
            backup_ss_port: 0,
        };
        let encoded = ack.encode();
        assert_eq!(ResSsRegisterAck::decode(&encoded).unwrap(), ack);
    }

    #[test]
    fn register_round_trips_with_file_list() {
        let req = ReqSsRegister {
            ip: std::net::Ipv4Addr::new(127, 0, 0, 1),
            client_port: 9001,
            replication_port: 9002,
            files: vec![FileMetadata {
                filename: "a.txt".into(),
                owner: "bob".into(),
                size_bytes: 1,
                word_count: 1,
                char_count: 1,
                last_modified: 0,
                last_access: 0,
                is_backup: false,
            }],
        };
        let encoded = req.encode().unwrap();
        assert_eq!(ReqSsRegister::decode(&encoded).unwrap(), req);
    }
}
