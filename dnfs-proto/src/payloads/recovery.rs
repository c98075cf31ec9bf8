use std::io::{Cursor, Read};

use crate::primitive::*;
use crate::Result;

/// An `(ss_id, ip, port)` triple, the common shape of the NS<->SS
/// recovery-coordination messages (§4.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SsEndpoint {
    pub ss_id: i32,
    pub ip: std::net::Ipv4Addr,
    pub port: u16,
}

impl SsEndpoint {
    fn encode_into(&self, out: &mut Vec<u8>) {
        put_i32(out, self.ss_id);
        out.extend_from_slice(&self.ip.octets());
        out.resize(out.len() + 12, 0);
        put_i32(out, self.port as i32);
    }

    fn decode_from(cur: &mut Cursor<&[u8]>) -> Result<Self> {
        let ss_id = get_i32(cur)?;
        let mut ip_buf = [0u8; 16];
        cur.read_exact(&mut ip_buf)?;
        let ip = std::net::Ipv4Addr::new(ip_buf[0], ip_buf[1], ip_buf[2], ip_buf[3]);
        let port = get_i32(cur)? as u16;
        Ok(Self { ss_id, ip, port })
    }
}

/// `MSG_N2S_SYNC_FROM_BACKUP`: tells a freshly-recovered primary where
/// to pull its data from (recovery state 2, §4.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReqSyncFromBackup {
    pub target: SsEndpoint,
}

impl ReqSyncFromBackup {
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(24);
        self.target.encode_into(&mut out);
        out
    }

    pub fn decode(buf: &[u8]) -> Result<Self> {
        let mut cur = Cursor::new(buf);
        Ok(Self { target: SsEndpoint::decode_from(&mut cur)? })
    }
}

/// `MSG_N2S_SYNC_TO_PRIMARY`: tells a freshly-recovered backup where its
/// primary now lives (recovery state 3, §4.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReqSyncToPrimary {
    pub primary: SsEndpoint,
}

impl ReqSyncToPrimary {
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(24);
        self.primary.encode_into(&mut out);
        out
    }

    pub fn decode(buf: &[u8]) -> Result<Self> {
        let mut cur = Cursor::new(buf);
        Ok(Self { primary: SsEndpoint::decode_from(&mut cur)? })
    }
}

/// `MSG_N2S_RE_REPLICATE_ALL`: tells a surviving primary to push a full
/// copy of every owned file to a new backup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReqReReplicateAll {
    pub new_backup: SsEndpoint,
}

impl ReqReReplicateAll {
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(24);
        self.new_backup.encode_into(&mut out);
        out
    }

    pub fn decode(buf: &[u8]) -> Result<Self> {
        let mut cur = Cursor::new(buf);
        Ok(Self { new_backup: SsEndpoint::decode_from(&mut cur)? })
    }
}

/// `MSG_N2S_UPDATE_BACKUP`: updates an SS's notion of which node holds
/// its replicas. `backup` is `None` when the ring has shrunk to one
/// live node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReqUpdateBackup {
    pub backup: Option<SsEndpoint>,
}

impl ReqUpdateBackup {
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(24);
        match self.backup {
            Some(ep) => ep.encode_into(&mut out),
            None => SsEndpoint { ss_id: -1, ip: std::net::Ipv4Addr::UNSPECIFIED, port: 0 }
                .encode_into(&mut out),
        }
        out
    }

    pub fn decode(buf: &[u8]) -> Result<Self> {
        let mut cur = Cursor::new(buf);
        let ep = SsEndpoint::decode_from(&mut cur)?;
        Ok(Self { backup: if ep.ss_id < 0 { None } else { Some(ep) } })
    }
}

/// `MSG_S2S_START_RECOVERY`: kicks off the recovery handshake between
/// two ring neighbors (§4.4, recovery state 1).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReqStartRecovery {
    pub ss_id: i32,
    pub is_primary_recovery: bool,
}

impl ReqStartRecovery {
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(8);
        put_i32(&mut out, self.ss_id);
        put_bool(&mut out, self.is_primary_recovery);
        out
    }

    pub fn decode(buf: &[u8]) -> Result<Self> {
        let mut cur = Cursor::new(buf);
        let ss_id = get_i32(&mut cur)?;
        let is_primary_recovery = get_bool(&mut cur)?;
        Ok(Self { ss_id, is_primary_recovery })
    }
}

/// `MSG_S2S_FILE_LIST` header: announces how many
/// [`crate::payloads::FileMetadata`] records follow as a raw trailer
/// (mirrors [`super::ReqReplicate`]'s header-then-trailer shape).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReqFileList {
    pub file_count: u32,
}

impl ReqFileList {
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(4);
        put_u32(&mut out, self.file_count);
        out
    }

    pub fn decode(buf: &[u8]) -> Result<Self> {
        let mut cur = Cursor::new(buf);
        Ok(Self { file_count: get_u32(&mut cur)? })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_backup_round_trips_none() {
        let req = ReqUpdateBackup { backup: None };
        let encoded = req.encode();
        assert_eq!(ReqUpdateBackup::decode(&encoded).unwrap(), req);
    }

    #[test]
    fn update_backup_round_trips_some() {
        let ep = SsEndpoint { ss_id: 2, ip: std::net::Ipv4Addr::new(10, 0, 0, 5), port: 9100 };
        let req = ReqUpdateBackup { backup: Some(ep) };
        let encoded = req.encode();
        assert_eq!(ReqUpdateBackup::decode(&encoded).unwrap(), req);
    }

    #[test]
    fn start_recovery_round_trips() {
        let req = ReqStartRecovery { ss_id: 1, is_primary_recovery: true };
        let encoded = req.encode();
        assert_eq!(ReqStartRecovery::decode(&encoded).unwrap(), req);
    }
}
