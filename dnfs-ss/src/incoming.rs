//! Receiver side of ring replication (§4.4): `REPLICATE_FILE` overwrites
//! `files/filename` and upserts metadata with `is_backup=true`;
//! `DELETE_FILE` drops both.

use tokio::io::AsyncReadExt;
use tokio::net::TcpStream;

use dnfs_proto::payloads::{FileMetadata, ReqReplicaDelete, ReqReplicate};
use dnfs_proto::{write_message, MsgType};

use crate::error::Result;
use crate::metadata::MetadataTable;
use crate::paths::SsRoot;

/// `first_payload` is the already-read `REPLICATE_FILE` header; the
/// file bytes follow as a raw trailer on `socket`.
pub async fn handle_replicate_file(
    socket: &mut TcpStream,
    first_payload: &[u8],
    root: &SsRoot,
    meta: &MetadataTable,
    now: i64,
) -> Result<()> {
    let header = ReqReplicate::decode(first_payload)?;
    let mut bytes = vec![0u8; header.file_size as usize];
    socket.read_exact(&mut bytes).await?;
    tokio::fs::write(root.file_path(&header.filename), &bytes).await?;

    let word_count: u64 = crate::text::split_sentences(&String::from_utf8_lossy(&bytes))
        .iter()
        .map(|s| crate::text::split_words(s).len() as u64)
        .sum();
    meta.insert(FileMetadata {
        filename: header.filename,
        owner: header.owner,
        size_bytes: header.file_size,
        word_count,
        char_count: bytes.len() as u64,
        last_modified: now,
        last_access: now,
        is_backup: true,
    })?;

    write_message(socket, MsgType::SsAck, &[]).await?;
    Ok(())
}

pub async fn handle_replica_delete(
    socket: &mut TcpStream,
    first_payload: &[u8],
    root: &SsRoot,
    meta: &MetadataTable,
) -> Result<()> {
    let req = ReqReplicaDelete::decode(first_payload)?;
    let _ = tokio::fs::remove_file(root.file_path(&req.filename)).await;
    meta.remove(&req.filename);
    write_message(socket, MsgType::SsAck, &[]).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn replicate_file_writes_bytes_and_marks_backup() {
        let dir = tempfile::tempdir().unwrap();
        let root = SsRoot::new(dir.path(), 1);
        root.ensure_dirs().await.unwrap();
        let meta = MetadataTable::load(dir.path()).await;

        let listener = TcpListener::bind(("127.0.0.1", 0)).await.unwrap();
        let addr = listener.local_addr().unwrap();

        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let (msg_type, payload) = dnfs_proto::read_message(&mut socket, 4096).await.unwrap();
            assert_eq!(msg_type, MsgType::ReplicateFile);
            handle_replicate_file(&mut socket, &payload, &root, &meta, 1).await.unwrap();
            meta
        });

        let mut client = TcpStream::connect(addr).await.unwrap();
        let header = ReqReplicate { filename: "a.txt".into(), owner: "bob".into(), file_size: 3 };
        write_message(&mut client, MsgType::ReplicateFile, &header.encode().unwrap()).await.unwrap();
        tokio::io::AsyncWriteExt::write_all(&mut client, b"hi.").await.unwrap();
        let (msg_type, _) = dnfs_proto::read_message(&mut client, 4096).await.unwrap();
        assert_eq!(msg_type, MsgType::SsAck);

        let meta = server.await.unwrap();
        assert!(meta.get("a.txt").unwrap().is_backup);
    }
}
