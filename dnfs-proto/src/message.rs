//! Message type discriminants and the fixed 8-byte header (§4.1).

use num_derive::{FromPrimitive, ToPrimitive};
use num_traits::{FromPrimitive, ToPrimitive};

/// Size in bytes of an encoded [`MsgHeader`]: `u32` type + `u32` length.
pub const HEADER_LEN: usize = 8;

/// Discriminant for every message class in §4.1. Order matches the
/// original `protocol.h` enum so the numeric values read the same way
/// across implementations of this protocol.
#[derive(Debug, Copy, Clone, PartialEq, Eq, FromPrimitive, ToPrimitive)]
#[repr(u32)]
pub enum MsgType {
    // --- Client <-> Name Server ---
    Login = 0,
    LoginOk,
    LoginFail,

    View,
    ViewRes,

    Create,
    Delete,
    Info,
    InfoRes,

    ReadReq,
    StreamReq,
    WriteReq,
    SsLoc,

    UndoReq,
    CheckpointReq,

    ListUsers,
    ListUsersRes,

    AccessAdd,
    AccessRem,

    ExecReq,
    ExecRes,

    FolderCmd,

    ReqAccess,
    ReqAccessOk,
    ViewReqAccess,
    ViewReqAccessRes,
    GrantReqAccess,

    GenericOk,
    GenericFail,

    // --- Storage Server <-> Name Server ---
    Register,
    RegisterAck,
    Heartbeat,

    CreateFile,
    DeleteFile,
    GetInfo,
    ExecGetContent,

    AckOk,
    AckFail,
    ExecContent,
    FileInfoRes,

    // --- Client <-> Storage Server ---
    Read,
    Stream,
    Write,
    WriteData,
    WriteEtirw,
    Undo,
    CheckpointOp,

    ReadContent,
    StreamWord,
    StreamEnd,
    WriteLocked,
    WriteOk,
    SsGenericOk,
    SsGenericFail,
    FileNotFound,

    // --- SS <-> SS (replication) ---
    ReplicateFile,
    SsDeleteFile,
    SsAck,

    // --- NS -> SS (recovery control) ---
    SyncFromBackup,
    SyncToPrimary,
    ReReplicateAll,
    UpdateBackup,

    // --- SS <-> SS (direct recovery connection) ---
    StartRecovery,
    FileList,
    RecoveryComplete,
}

impl MsgType {
    /// Decodes a wire discriminant into a [`MsgType`].
    pub fn from_u32(code: u32) -> Option<Self> {
        FromPrimitive::from_u32(code)
    }

    /// Encodes this variant as its wire discriminant.
    pub fn to_u32(self) -> u32 {
        ToPrimitive::to_u32(&self).expect("all MsgType variants fit in u32")
    }
}

/// Fixed message header: `{msg_type: u32, payload_len: u32}`, little-endian.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct MsgHeader {
    pub msg_type: MsgType,
    pub payload_len: u32,
}

impl MsgHeader {
    pub fn new(msg_type: MsgType, payload_len: u32) -> Self {
        Self { msg_type, payload_len }
    }

    pub fn encode(&self) -> [u8; HEADER_LEN] {
        let mut buf = [0u8; HEADER_LEN];
        buf[0..4].copy_from_slice(&self.msg_type.to_u32().to_le_bytes());
        buf[4..8].copy_from_slice(&self.payload_len.to_le_bytes());
        buf
    }

    pub fn decode(buf: &[u8; HEADER_LEN]) -> crate::Result<Self> {
        let code = u32::from_le_bytes(buf[0..4].try_into().unwrap());
        let payload_len = u32::from_le_bytes(buf[4..8].try_into().unwrap());
        let msg_type = MsgType::from_u32(code).ok_or(crate::Error::UnknownMsgType(code))?;
        Ok(Self { msg_type, payload_len })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_round_trips() {
        let header = MsgHeader::new(MsgType::WriteLocked, 42);
        let encoded = header.encode();
        assert_eq!(MsgHeader::decode(&encoded).unwrap(), header);
    }

    #[test]
    fn unknown_discriminant_is_rejected() {
        let mut buf = [0u8; HEADER_LEN];
        buf[0..4].copy_from_slice(&9999u32.to_le_bytes());
        assert!(matches!(MsgHeader::decode(&buf), Err(crate::Error::UnknownMsgType(9999))));
    }
}
