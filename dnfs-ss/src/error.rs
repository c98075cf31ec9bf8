/// Errors raised by the Storage Server's file engine and connection
/// handlers.
#[derive(Debug)]
pub enum Error {
    /// A sentence/word index fell outside the file's current bounds.
    InvalidIndex,
    /// The target sentence is already locked by another in-flight WRITE.
    WriteLocked,
    /// The requested file does not exist on this SS.
    FileNotFound,
    /// A WRITE, CHECKPOINT or DELETE named a file that already has one.
    FileAlreadyExists,
    /// DELETE was attempted while a swapfile indicates an in-flight WRITE.
    WriteInProgress,
    /// UNDO was attempted with no undo slot recorded for the file.
    NoUndoHistory,
    /// The metadata table reached its fixed outer-bucket capacity.
    TableFull,
    /// Underlying filesystem I/O failure.
    Io(std::io::Error),
    /// Wire protocol framing/decoding failure.
    Proto(dnfs_proto::Error),
    /// A peer (NS, another SS) replied with an unexpected message.
    UnexpectedReply(String),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::InvalidIndex => write!(f, "index out of range"),
            Error::WriteLocked => write!(f, "sentence is locked by another writer"),
            Error::FileNotFound => write!(f, "file not found"),
            Error::FileAlreadyExists => write!(f, "file already exists"),
            Error::WriteInProgress => write!(f, "a write transaction is in progress on this file"),
            Error::NoUndoHistory => write!(f, "no undo history"),
            Error::TableFull => write!(f, "metadata table too full"),
            Error::Io(err) => write!(f, "I/O error: {err}"),
            Error::Proto(err) => write!(f, "protocol error: {err}"),
            Error::UnexpectedReply(msg) => write!(f, "unexpected reply: {msg}"),
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

pub type Result<T> = std::result::Result<T, Error>;
