//! Chunked READ and paced STREAM (§4.3): both hold a coarse read lock
//! for their entire transfer so concurrent writers never tear a reader's
//! view of the file.

use tokio::io::AsyncWrite;
use tokio::time::{sleep, Duration};

use dnfs_proto::constants::{MAX_PAYLOAD, STREAM_WORD_PACING_MS};
use dnfs_proto::payloads::{ResFileContent, ResStreamWord};
use dnfs_proto::{write_message, MsgType};

use crate::error::{Error, Result};
use crate::locks::FileLockMap;
use crate::metadata::MetadataTable;
use crate::paths::SsRoot;

/// Streams `files/F` as `MAX_PAYLOAD`-sized [`ResFileContent`] chunks,
/// ending with an empty final chunk if the file is empty. Updates the
/// metadata table's access time once complete.
pub async fn read_chunked<W: AsyncWrite + Unpin>(
    writer: &mut W,
    root: &SsRoot,
    locks: &FileLockMap,
    meta: &MetadataTable,
    filename: &str,
    now: i64,
) -> Result<()> {
    let _read_guard = locks.read(filename).await;
    let content = tokio::fs::read(root.file_path(filename)).await.map_err(|_| Error::FileNotFound)?;

    if content.is_empty() {
        let chunk = ResFileContent { data: Vec::new(), is_final_chunk: true };
        write_message(writer, MsgType::ReadContent, &chunk.encode()?).await?;
    } else {
        let mut offset = 0;
        while offset < content.len() {
            let end = (offset + MAX_PAYLOAD).min(content.len());
            let is_final_chunk = end == content.len();
            let chunk = ResFileContent { data: content[offset..end].to_vec(), is_final_chunk };
            write_message(writer, MsgType::ReadContent, &chunk.encode()?).await?;
            offset = end;
        }
    }

    meta.update_access_time(filename, now);
    Ok(())
}

/// Streams `files/F`'s whitespace-separated tokens one at a time with a
/// fixed pacing, ending with `STREAM_END`.
pub async fn stream_words<W: AsyncWrite + Unpin>(
    writer: &mut W,
    root: &SsRoot,
    locks: &FileLockMap,
    filename: &str,
) -> Result<()> {
    let _read_guard = locks.read(filename).await;
    let content =
        tokio::fs::read_to_string(root.file_path(filename)).await.map_err(|_| Error::FileNotFound)?;

    for word in content.split_whitespace() {
        let msg = ResStreamWord { word: word.to_string() };
        write_message(writer, MsgType::StreamWord, &msg.encode()?).await?;
        sleep(Duration::from_millis(STREAM_WORD_PACING_MS)).await;
    }
    write_message(writer, MsgType::StreamEnd, &[]).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn read_chunked_on_empty_file_sends_one_final_chunk() {
        let dir = tempfile::tempdir().unwrap();
        let root = SsRoot::new(dir.path(), 1);
        root.ensure_dirs().await.unwrap();
        tokio::fs::write(root.file_path("a.txt"), b"").await.unwrap();
        let locks = FileLockMap::new();
        let meta = MetadataTable::load(dir.path()).await;

        let mut buf = Vec::new();
        read_chunked(&mut buf, &root, &locks, &meta, "a.txt", 42).await.unwrap();

        let (msg_type, payload) =
            dnfs_proto::read_message(&mut std::io::Cursor::new(buf), MAX_PAYLOAD + 8).await.unwrap();
        assert_eq!(msg_type, MsgType::ReadContent);
        let chunk = ResFileContent::decode(&payload).unwrap();
        assert!(chunk.is_final_chunk);
        assert!(chunk.data.is_empty());
    }

    #[tokio::test]
    async fn read_chunked_splits_large_file_into_multiple_chunks() {
        let dir = tempfile::tempdir().unwrap();
        let root = SsRoot::new(dir.path(), 1);
        root.ensure_dirs().await.unwrap();
        let big = vec![b'x'; MAX_PAYLOAD + 10];
        tokio::fs::write(root.file_path("a.txt"), &big).await.unwrap();
        let locks = FileLockMap::new();
        let meta = MetadataTable::load(dir.path()).await;

        let mut buf = Vec::new();
        read_chunked(&mut buf, &root, &locks, &meta, "a.txt", 0).await.unwrap();

        let mut cursor = std::io::Cursor::new(buf);
        let (_, first) = dnfs_proto::read_message(&mut cursor, MAX_PAYLOAD + 8).await.unwrap();
        let first_chunk = ResFileContent::decode(&first).unwrap();
        assert!(!first_chunk.is_final_chunk);
        assert_eq!(first_chunk.data.len(), MAX_PAYLOAD);

        let (_, second) = dnfs_proto::read_message(&mut cursor, MAX_PAYLOAD + 8).await.unwrap();
        let second_chunk = ResFileContent::decode(&second).unwrap();
        assert!(second_chunk.is_final_chunk);
        assert_eq!(second_chunk.data.len(), 10);
    }
}
