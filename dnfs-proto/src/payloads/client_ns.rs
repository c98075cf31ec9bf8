use std::io::Cursor;

use crate::constants::{MAX_PATH, MAX_PAYLOAD, MAX_TAG, MAX_USERNAME};
use crate::primitive::*;
use crate::Result;

/// `MSG_C2N_LOGIN` payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReqLogin {
    pub username: String,
}

impl ReqLogin {
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(MAX_USERNAME);
        put_fixed_str(&mut out, &self.username, MAX_USERNAME)?;
        Ok(out)
    }

    pub fn decode(buf: &[u8]) -> Result<Self> {
        let mut cur = Cursor::new(buf);
        Ok(Self { username: get_fixed_str(&mut cur, MAX_USERNAME)? })
    }
}

/// View flags accepted by `VIEW`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct ViewFlags {
    /// `-a`: include files shared with the caller, not just owned ones.
    pub all: bool,
    /// `-l`: include size and owner in the listing.
    pub long: bool,
}

impl ViewFlags {
    pub fn parse(flag: &str) -> Self {
        match flag {
            "-a" => ViewFlags { all: true, long: false },
            "-l" => ViewFlags { all: false, long: true },
            "-al" | "-la" => ViewFlags { all: true, long: true },
            _ => ViewFlags::default(),
        }
    }

    pub fn as_str(self) -> &'static str {
        match (self.all, self.long) {
            (true, true) => "-al",
            (true, false) => "-a",
            (false, true) => "-l",
            (false, false) => "",
        }
    }
}

/// `MSG_C2N_VIEW` payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReqView {
    pub flags: ViewFlags,
}

impl ReqView {
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(4);
        put_fixed_str(&mut out, self.flags.as_str(), 4)?;
        Ok(out)
    }

    pub fn decode(buf: &[u8]) -> Result<Self> {
        let mut cur = Cursor::new(buf);
        let flag = get_fixed_str(&mut cur, 4)?;
        Ok(Self { flags: ViewFlags::parse(&flag) })
    }
}

/// One row of a `VIEW`/`LIST_USERS` listing rendered into a text blob
/// (the NS formats these; the client prints them verbatim, per §6/§7).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextBlob {
    pub data: String,
}

impl TextBlob {
    pub fn new(data: impl Into<String>) -> Self {
        Self { data: data.into() }
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(MAX_PAYLOAD);
        put_fixed_str(&mut out, &self.data, MAX_PAYLOAD)?;
        Ok(out)
    }

    pub fn decode(buf: &[u8]) -> Result<Self> {
        let mut cur = Cursor::new(buf);
        Ok(Self { data: get_fixed_str(&mut cur, MAX_PAYLOAD)? })
    }
}

/// Permission flag carried by ACCESS_ADD/GRANTACCESS (§6: `-R` or `-W`).
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PermFlag {
    Read,
    ReadWrite,
}

impl PermFlag {
    pub fn from_cli_flag(flag: &str) -> Option<Self> {
        match flag {
            "-R" => Some(PermFlag::Read),
            "-W" => Some(PermFlag::ReadWrite),
            _ => None,
        }
    }

    fn as_byte(self) -> u8 {
        match self {
            PermFlag::Read => b'R',
            PermFlag::ReadWrite => b'W',
        }
    }

    fn from_byte(b: u8) -> Result<Self> {
        match b {
            b'R' => Ok(PermFlag::Read),
            b'W' => Ok(PermFlag::ReadWrite),
            _ => Err(crate::Error::InvalidUtf8),
        }
    }
}

/// `MSG_C2N_ACCESS_ADD` / `MSG_C2N_ACCESS_REM` / `MSG_C2N_GRANT_REQ_ACCESS` payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReqAccess {
    pub username: String,
    pub filename: String,
    pub target_user: String,
    pub perm_flag: PermFlag,
}

impl ReqAccess {
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(MAX_USERNAME * 2 + MAX_USERNAME + 1);
        put_fixed_str(&mut out, &self.username, MAX_USERNAME)?;
        put_fixed_str(&mut out, &self.filename, MAX_USERNAME)?;
        put_fixed_str(&mut out, &self.target_user, MAX_USERNAME)?;
        out.push(self.perm_flag.as_byte());
        Ok(out)
    }

    pub fn decode(buf: &[u8]) -> Result<Self> {
        let mut cur = Cursor::new(buf);
        let username = get_fixed_str(&mut cur, MAX_USERNAME)?;
        let filename = get_fixed_str(&mut cur, MAX_USERNAME)?;
        let target_user = get_fixed_str(&mut cur, MAX_USERNAME)?;
        let mut byte = [0u8; 1];
        std::io::Read::read_exact(&mut cur, &mut byte)?;
        Ok(Self { username, filename, target_user, perm_flag: PermFlag::from_byte(byte[0])? })
    }
}

/// `MSG_C2N_FOLDER_CMD` payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReqFolder {
    pub command: String,
    pub arg1: String,
    pub arg2: String,
    /// `-c` on `OPEN`.
    pub create_if_missing: bool,
}

impl ReqFolder {
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(32 + MAX_PATH * 2 + 4);
        put_fixed_str(&mut out, &self.command, 32)?;
        put_fixed_str(&mut out, &self.arg1, MAX_PATH)?;
        put_fixed_str(&mut out, &self.arg2, MAX_PATH)?;
        put_fixed_str(&mut out, if self.create_if_missing { "-c" } else { "" }, 4)?;
        Ok(out)
    }

    pub fn decode(buf: &[u8]) -> Result<Self> {
        let mut cur = Cursor::new(buf);
        let command = get_fixed_str(&mut cur, 32)?;
        let arg1 = get_fixed_str(&mut cur, MAX_PATH)?;
        let arg2 = get_fixed_str(&mut cur, MAX_PATH)?;
        let flags = get_fixed_str(&mut cur, 4)?;
        Ok(Self { command, arg1, arg2, create_if_missing: flags == "-c" })
    }
}

/// `MSG_C2N_CHECKPOINT_REQ` / `MSG_C2S_CHECKPOINT_OP` payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReqCheckpoint {
    pub command: CheckpointCommand,
    pub filename: String,
    pub tag: String,
}

/// Checkpoint sub-operation (§4.3).
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum CheckpointCommand {
    Checkpoint,
    Revert,
    ViewCheckpoint,
    ListCheckpoints,
}

impl CheckpointCommand {
    fn as_str(self) -> &'static str {
        match self {
            CheckpointCommand::Checkpoint => "CHECKPOINT",
            CheckpointCommand::Revert => "REVERT",
            CheckpointCommand::ViewCheckpoint => "VIEWCHECKPOINT",
            CheckpointCommand::ListCheckpoints => "LISTCHECKPOINTS",
        }
    }

    fn parse(s: &str) -> Result<Self> {
        match s {
            "CHECKPOINT" => Ok(CheckpointCommand::Checkpoint),
            "REVERT" => Ok(CheckpointCommand::Revert),
            "VIEWCHECKPOINT" => Ok(CheckpointCommand::ViewCheckpoint),
            "LISTCHECKPOINTS" => Ok(CheckpointCommand::ListCheckpoints),
            _ => Err(crate::Error::InvalidUtf8),
        }
    }
}

impl ReqCheckpoint {
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(32 + MAX_USERNAME + MAX_TAG);
        put_fixed_str(&mut out, self.command.as_str(), 32)?;
        put_fixed_str(&mut out, &self.filename, MAX_USERNAME)?;
        put_fixed_str(&mut out, &self.tag, MAX_TAG)?;
        Ok(out)
    }

    pub fn decode(buf: &[u8]) -> Result<Self> {
        let mut cur = Cursor::new(buf);
        let command = CheckpointCommand::parse(&get_fixed_str(&mut cur, 32)?)?;
        let filename = get_fixed_str(&mut cur, MAX_USERNAME)?;
        let tag = get_fixed_str(&mut cur, MAX_TAG)?;
        Ok(Self { command, filename, tag })
    }
}

/// `MSG_N2C_SS_LOC` payload: where the client should connect for file data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResSsLocation {
    pub ip: std::net::Ipv4Addr,
    pub port: u16,
}

impl ResSsLocation {
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(20);
        out.extend_from_slice(&self.ip.octets());
        out.resize(16, 0);
        put_i32(&mut out, self.port as i32);
        out
    }

    pub fn decode(buf: &[u8]) -> Result<Self> {
        let mut cur = Cursor::new(buf);
        let mut ip_buf = [0u8; 16];
        std::io::Read::read_exact(&mut cur, &mut ip_buf)?;
        let ip = std::net::Ipv4Addr::new(ip_buf[0], ip_buf[1], ip_buf[2], ip_buf[3]);
        let port = get_i32(&mut cur)? as u16;
        Ok(Self { ip, port })
    }
}
