/// Errors surfaced by the client's command loop.
#[derive(Debug)]
pub enum Error {
    /// The Name Server or a Storage Server answered with `*_FAIL`.
    Remote(String),
    /// A peer replied with a message type this command did not expect.
    UnexpectedReply(String),
    /// The typed command does not match any known command name or arity.
    BadCommand(String),
    /// Underlying I/O failure (socket, stdin).
    Io(std::io::Error),
    /// Wire protocol framing/codec failure.
    Proto(dnfs_proto::Error),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Remote(msg) => write!(f, "{msg}"),
            Error::UnexpectedReply(msg) => write!(f, "unexpected reply: {msg}"),
            Error::BadCommand(msg) => write!(f, "{msg}"),
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

pub type Result<T> = std::result::Result<T, Error>;
