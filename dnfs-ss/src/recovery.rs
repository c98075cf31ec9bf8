//! SS side of the recovery handshake (§4.4, states 4-5): a backup
//! holder pushes a full file set to a freshly reconnected primary over
//! a dedicated connection to that primary's replication port.
//!
//! Backup-restoring (state 5) needs no separate handshake: it reuses
//! the normal replication worker, see [`crate::repl::apply_backup_update`].

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use dnfs_proto::constants::MAX_PAYLOAD;
use dnfs_proto::payloads::{FileMetadata, ReqFileList, ReqReplicate, ReqStartRecovery, SsEndpoint};
use dnfs_proto::{read_message, write_message, MsgType};

use crate::error::{Error, Result};
use crate::locks::FileLockMap;
use crate::metadata::MetadataTable;
use crate::paths::SsRoot;

/// Holder side: connects to `primary`'s replication port and pushes
/// every locally-held file for that primary (recovery state 4). Each
/// file's transfer is guarded by that file's coarse read lock, so a
/// concurrent WRITE/UNDO/DELETE against it is serialized against the
/// copy rather than racing it.
pub async fn push_all_files(
    primary: SsEndpoint,
    root: &SsRoot,
    meta: &MetadataTable,
    locks: &FileLockMap,
) -> Result<()> {
    let mut socket = TcpStream::connect((primary.ip, primary.port)).await?;

    let files = meta.all();
    write_message(
        &mut socket,
        MsgType::StartRecovery,
        &ReqStartRecovery { ss_id: primary.ss_id, is_primary_recovery: true }.encode(),
    )
    .await?;
    write_message(&mut socket, MsgType::FileList, &ReqFileList { file_count: files.len() as u32 }.encode())
        .await?;
    for file_meta in &files {
        socket.write_all(&file_meta.encode()?).await?;
    }

    for file_meta in &files {
        let bytes = {
            let _guard = locks.read(&file_meta.filename).await;
            tokio::fs::read(root.file_path(&file_meta.filename)).await?
        };
        let header = ReqReplicate {
            filename: file_meta.filename.clone(),
            owner: file_meta.owner.clone(),
            file_size: bytes.len() as u64,
        };
        write_message(&mut socket, MsgType::ReplicateFile, &header.encode()?).await?;
        socket.write_all(&bytes).await?;
        let (msg_type, _) = read_message(&mut socket, MAX_PAYLOAD).await?;
        if msg_type != MsgType::SsAck {
            return Err(Error::UnexpectedReply("backup push not acked".to_string()));
        }
    }

    write_message(&mut socket, MsgType::RecoveryComplete, &[]).await?;
    Ok(())
}

/// Primary side: accepted on the replication port when the first
/// message is `START_RECOVERY`. Drops the primary's stale files and
/// metadata, then applies the incoming stream with `is_backup=false`.
/// Each incoming file is written under that file's coarse write lock.
pub async fn receive_recovery_stream(
    mut socket: TcpStream,
    first_payload: &[u8],
    root: &SsRoot,
    meta: &MetadataTable,
    locks: &FileLockMap,
) -> Result<()> {
    let _start = ReqStartRecovery::decode(first_payload)?;

    let (msg_type, payload) = read_message(&mut socket, MAX_PAYLOAD).await?;
    if msg_type != MsgType::FileList {
        return Err(Error::UnexpectedReply("expected FILE_LIST after START_RECOVERY".to_string()));
    }
    let file_list = ReqFileList::decode(&payload)?;

    let mut records = Vec::with_capacity(file_list.file_count as usize);
    for _ in 0..file_list.file_count {
        let mut buf = vec![0u8; FileMetadata::ENCODED_LEN];
        socket.read_exact(&mut buf).await?;
        records.push(FileMetadata::decode(&buf)?);
    }

    for stale in meta.all() {
        let _ = tokio::fs::remove_file(root.file_path(&stale.filename)).await;
        meta.remove(&stale.filename);
    }

    for mut record in records {
        let (msg_type, payload) = read_message(&mut socket, MAX_PAYLOAD).await?;
        if msg_type != MsgType::ReplicateFile {
            return Err(Error::UnexpectedReply("expected REPLICATE_FILE in recovery stream".to_string()));
        }
        let header = ReqReplicate::decode(&payload)?;
        let mut bytes = vec![0u8; header.file_size as usize];
        socket.read_exact(&mut bytes).await?;
        {
            let _guard = locks.write(&header.filename).await;
            tokio::fs::write(root.file_path(&header.filename), &bytes).await?;
        }

        record.is_backup = false;
        record.size_bytes = header.file_size;
        meta.insert(record)?;
        write_message(&mut socket, MsgType::SsAck, &[]).await?;
    }

    let (msg_type, _) = read_message(&mut socket, MAX_PAYLOAD).await?;
    if msg_type != MsgType::RecoveryComplete {
        return Err(Error::UnexpectedReply("expected RECOVERY_COMPLETE to close recovery stream".to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn push_and_receive_round_trip_one_file() {
        let source_dir = tempfile::tempdir().unwrap();
        let source_root = SsRoot::new(source_dir.path(), 1);
        source_root.ensure_dirs().await.unwrap();
        tokio::fs::write(source_root.file_path("a.txt"), "hello.").await.unwrap();
        let source_meta = MetadataTable::load(source_dir.path()).await;
        source_meta
            .insert(FileMetadata {
                filename: "a.txt".into(),
                owner: "bob".into(),
                size_bytes: 6,
                word_count: 2,
                char_count: 6,
                last_modified: 0,
                last_access: 0,
                is_backup: true,
            })
            .unwrap();

        let dest_dir = tempfile::tempdir().unwrap();
        let dest_root = SsRoot::new(dest_dir.path(), 2);
        dest_root.ensure_dirs().await.unwrap();
        let dest_meta = MetadataTable::load(dest_dir.path()).await;
        let source_locks = FileLockMap::new();
        let dest_locks = FileLockMap::new();

        let listener = TcpListener::bind(("127.0.0.1", 0)).await.unwrap();
        let addr = listener.local_addr().unwrap();

        let receiver = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let (msg_type, payload) = read_message(&mut socket, MAX_PAYLOAD).await.unwrap();
            assert_eq!(msg_type, MsgType::StartRecovery);
            receive_recovery_stream(socket, &payload, &dest_root, &dest_meta, &dest_locks).await.unwrap();
        });

        let primary_target =
            SsEndpoint { ss_id: 2, ip: std::net::Ipv4Addr::new(127, 0, 0, 1), port: addr.port() };
        push_all_files(primary_target, &source_root, &source_meta, &source_locks).await.unwrap();
        receiver.await.unwrap();

        let content = tokio::fs::read_to_string(dest_root.file_path("a.txt")).await.unwrap();
        assert_eq!(content, "hello.");
        assert!(!dest_meta.get("a.txt").unwrap().is_backup);
    }
}
