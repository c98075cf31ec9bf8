/// Errors surfaced by the Name Server's internal modules.
///
/// Connection handlers translate these into a protocol response
/// (`GENERIC_FAIL` with [`Error::to_string`] as the message, or one of the
/// specialised codes noted per variant) and never let them escape past the
/// handler that produced them.
#[derive(Debug)]
pub enum Error {
    /// A second LOGIN was attempted for an already-active username.
    AlreadyLoggedIn(String),
    /// The requester lacks the permission required for the operation.
    AccessDenied,
    /// No file map entry exists for this (owner, filename), and no global
    /// owner could be found either.
    FileNotFound,
    /// CREATE was issued for a (owner, filename) pair that already exists.
    FileAlreadyExists,
    /// No online Storage Server could be selected, or a resolved SS (and
    /// its backup) are both offline.
    NoStorageServerAvailable,
    /// The access or file-map table reached its load-factor bound.
    TableFull,
    /// Folder-tree operation named the reserved root name.
    ReservedName,
    /// Folder-tree operation found a name already present among siblings.
    NameCollision,
    /// MOVE targeted a folder that does not exist under the session root.
    FolderNotFound,
    /// OPEN named a missing folder without the `-c` flag.
    FolderMissingNoCreate,
    /// UPMOVE was issued while already at the session root.
    AlreadyAtRoot,
    /// A Storage Server rejected or failed to answer a control message.
    StorageServer(String),
    /// Underlying I/O failure (socket, persisted file).
    Io(std::io::Error),
    /// Wire protocol framing/codec failure.
    Proto(dnfs_proto::Error),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::AlreadyLoggedIn(user) => write!(f, "user '{user}' is already logged in"),
            Error::AccessDenied => write!(f, "Access Denied"),
            Error::FileNotFound => write!(f, "File not found"),
            Error::FileAlreadyExists => write!(f, "you already have a file with this name"),
            Error::NoStorageServerAvailable => {
                write!(f, "file not found or storage server offline")
            }
            Error::TableFull => write!(f, "table too full"),
            Error::ReservedName => write!(f, "ROOT is a reserved folder name"),
            Error::NameCollision => write!(f, "a folder with that name already exists here"),
            Error::FolderNotFound => write!(f, "folder not found"),
            Error::FolderMissingNoCreate => write!(f, "folder not found (use -c)"),
            Error::AlreadyAtRoot => write!(f, "already at root"),
            Error::StorageServer(msg) => write!(f, "{msg}"),
            Error::Io(err) => write!(f, "{err}"),
            Error::Proto(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<dnfs_proto::Error> for Error {
    fn from(err: dnfs_proto::Error) -> Self {
        Error::Proto(err)
    }
}

/// Result alias used throughout this crate.
pub type Result<T> = std::result::Result<T, Error>;
