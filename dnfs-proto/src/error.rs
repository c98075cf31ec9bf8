/// Errors raised while framing or decoding a wire message.
#[derive(Debug)]
pub enum Error {
    /// The peer closed the connection (a zero-length read) mid-message.
    ConnectionClosed,
    /// Underlying socket I/O failure.
    Io(std::io::Error),
    /// `payload_len` did not match what the message type expects, or
    /// exceeded [`crate::constants::MAX_PAYLOAD`] where that applies.
    BadPayloadLength { expected: usize, got: usize },
    /// The `msg_type` discriminant in a header did not match any
    /// known [`crate::MsgType`] variant.
    UnknownMsgType(u32),
    /// A fixed-width string field had no interior or trailing NUL.
    UnterminatedString,
    /// A fixed-width string field was not valid UTF-8.
    InvalidUtf8,
    /// A string was too long to fit in its fixed-width field.
    StringTooLong { max: usize, got: usize },
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::UnexpectedEof {
            Error::ConnectionClosed
        } else {
            Error::Io(err)
        }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::ConnectionClosed => write!(f, "peer closed the connection"),
            Error::Io(err) => write!(f, "I/O error: {err}"),
            Error::BadPayloadLength { expected, got } => {
                write!(f, "bad payload length: expected {expected}, got {got}")
            }
            Error::UnknownMsgType(code) => write!(f, "unknown message type {code}"),
            Error::UnterminatedString => write!(f, "fixed-width string field is not NUL-terminated"),
            Error::InvalidUtf8 => write!(f, "fixed-width string field is not valid UTF-8"),
            Error::StringTooLong { max, got } => {
                write!(f, "string of {got} bytes does not fit in a {max}-byte field")
            }
        }
    }
}

impl std::error::Error for Error {}
