//! Blocking-style full-length read/write framing over an async stream.
//!
//! §4.1: "Readers and writers use blocking full‑length reads; short reads
//! are errors. A connection that returns 0 bytes is treated as graceful
//! peer close." `AsyncReadExt::read_exact` gives exactly that contract:
//! it either fills the buffer or returns `UnexpectedEof`, which
//! [`crate::Error::from`] maps to [`crate::Error::ConnectionClosed`].

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::message::{MsgHeader, HEADER_LEN};
use crate::{MsgType, Result};

/// Reads one full message: header plus exactly `payload_len` bytes.
///
/// `max_payload` bounds the accepted `payload_len` to guard against a
/// corrupt or hostile header requesting an unbounded allocation; pass
/// [`crate::constants::MAX_PAYLOAD`] for chunked-content messages or a
/// generous fixed-payload bound (the largest payload struct) otherwise.
pub async fn read_message<R: AsyncRead + Unpin>(
    reader: &mut R,
    max_payload: usize,
) -> Result<(MsgType, Vec<u8>)> {
    let mut header_buf = [0u8; HEADER_LEN];
    reader.read_exact(&mut header_buf).await?;
    let header = MsgHeader::decode(&header_buf)?;

    let len = header.payload_len as usize;
    if len > max_payload {
        return Err(crate::Error::BadPayloadLength { expected: max_payload, got: len });
    }

    let mut payload = vec![0u8; len];
    if len > 0 {
        reader.read_exact(&mut payload).await?;
    }
    Ok((header.msg_type, payload))
}

/// Writes one full message: header followed by `payload`.
pub async fn write_message<W: AsyncWrite + Unpin>(
    writer: &mut W,
    msg_type: MsgType,
    payload: &[u8],
) -> Result<()> {
    let header = MsgHeader::new(msg_type, payload.len() as u32);
    writer.write_all(&header.encode()).await?;
    if !payload.is_empty() {
        writer.write_all(payload).await?;
    }
    writer.flush().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[tokio::test]
    async fn round_trips_a_message() {
        let mut buf = Vec::new();
        write_message(&mut buf, MsgType::GenericOk, b"hello").await.unwrap();

        let mut cursor = Cursor::new(buf);
        let (msg_type, payload) = read_message(&mut cursor, 4096).await.unwrap();
        assert_eq!(msg_type, MsgType::GenericOk);
        assert_eq!(payload, b"hello");
    }

    #[tokio::test]
    async fn empty_read_is_connection_closed() {
        let mut cursor = Cursor::new(Vec::<u8>::new());
        let err = read_message(&mut cursor, 4096).await.unwrap_err();
        assert!(matches!(err, crate::Error::ConnectionClosed));
    }

    #[tokio::test]
    async fn oversized_payload_is_rejected() {
        let mut buf = Vec::new();
        write_message(&mut buf, MsgType::GenericOk, &vec![0u8; 100]).await.unwrap();
        let mut cursor = Cursor::new(buf);
        let err = read_message(&mut cursor, 10).await.unwrap_err();
        assert!(matches!(err, crate::Error::BadPayloadLength { expected: 10, got: 100 }));
    }
}
