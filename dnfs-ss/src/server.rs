//! Connection handling: client/NS acceptor, replication acceptor, the
//! control connection to the Name Server, and the periodic metadata
//! checkpointer (§5's five long-lived SS threads, reinterpreted as
//! async tasks).

use std::net::Ipv4Addr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use dnfs_proto::constants::MAX_PAYLOAD;
use dnfs_proto::payloads::*;
use dnfs_proto::{read_message, write_message, MsgType};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::locks::FileLockMap;
use crate::metadata::MetadataTable;
use crate::paths::SsRoot;
use crate::repl::{apply_backup_update, BackupConfig, ReplJob, ReplicationHandle};

/// All shared Storage Server state. Every field that the replication
/// worker also needs a handle to is its own `Arc` so that worker can be
/// spawned independently of the outer `Arc<SsState>`.
pub struct SsState {
    pub ss_id: i32,
    pub root: Arc<SsRoot>,
    pub meta: Arc<MetadataTable>,
    pub locks: Arc<FileLockMap>,
    pub backup: Arc<BackupConfig>,
    pub repl: ReplicationHandle,
    pub config: Config,
}

/// Scans `data_dir` for a previously-used `ss_data_<id>` directory so a
/// restarting SS can report its existing files in REGISTER before the NS
/// has handed back an id (§4.2, "Supplemented features"). Picks the
/// highest id found; a fresh SS with no prior data returns `None`.
pub async fn discover_existing_root(data_dir: &str) -> Option<(i32, Vec<FileMetadata>)> {
    let mut entries = tokio::fs::read_dir(data_dir).await.ok()?;
    let mut best: Option<i32> = None;
    while let Ok(Some(entry)) = entries.next_entry().await {
        let name = entry.file_name().to_string_lossy().into_owned();
        if let Some(id_str) = name.strip_prefix("ss_data_") {
            if let Ok(id) = id_str.parse::<i32>() {
                if best.is_none_or(|current| id > current) {
                    best = Some(id);
                }
            }
        }
    }
    let id = best?;
    let root = SsRoot::new(data_dir, id);
    let meta = MetadataTable::load(root.base()).await;
    Some((id, meta.all()))
}

fn now() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

/// Accepts connections on the client port forever: the NS's short-lived
/// CREATE_FILE/DELETE_FILE/GET_INFO/EXEC_GET_CONTENT requests and direct
/// client operations share this port (§5).
pub async fn run_client_acceptor(state: Arc<SsState>, listener: TcpListener) -> std::io::Result<()> {
    loop {
        let (socket, peer) = listener.accept().await?;
        socket.set_nodelay(true)?;
        let state = Arc::clone(&state);
        tokio::spawn(async move {
            if let Err(err) = handle_client_connection(state, socket).await {
                warn!(%peer, %err, "client connection ended with error");
            }
        });
    }
}

/// Accepts connections on the replication port forever: incoming
/// REPLICATE_FILE/DELETE_FILE pushes from a peer's replication worker,
/// and START_RECOVERY pushes from a backup holder (§4.4).
pub async fn run_replication_acceptor(state: Arc<SsState>, listener: TcpListener) -> std::io::Result<()> {
    loop {
        let (socket, peer) = listener.accept().await?;
        socket.set_nodelay(true)?;
        let state = Arc::clone(&state);
        tokio::spawn(async move {
            if let Err(err) = handle_replication_connection(state, socket).await {
                warn!(%peer, %err, "replication connection ended with error");
            }
        });
    }
}

/// Saves `metadata.db` every `metadata_checkpoint_secs` (§4.3).
pub async fn run_metadata_checkpointer(state: Arc<SsState>) {
    let mut ticker = tokio::time::interval(Duration::from_secs(state.config.metadata_checkpoint_secs));
    loop {
        ticker.tick().await;
        if let Err(err) = state.meta.save().await {
            error!(%err, "periodic metadata checkpoint failed");
        }
    }
}

async fn handle_client_connection(state: Arc<SsState>, mut socket: TcpStream) -> Result<()> {
    loop {
        let (msg_type, payload) = match read_message(&mut socket, MAX_PAYLOAD).await {
            Ok(pair) => pair,
            Err(dnfs_proto::Error::ConnectionClosed) => return Ok(()),
            Err(err) => return Err(err.into()),
        };

        match msg_type {
            MsgType::Read => {
                let req = ReqFileOp::decode(&payload)?;
                if let Err(err) =
                    crate::readstream::read_chunked(&mut socket, &state.root, &state.locks, &state.meta, &req.filename, now()).await
                {
                    write_fail(&mut socket, err).await?;
                }
            }
            MsgType::Stream => {
                let req = ReqFileOp::decode(&payload)?;
                if let Err(err) =
                    crate::readstream::stream_words(&mut socket, &state.root, &state.locks, &req.filename).await
                {
                    write_fail(&mut socket, err).await?;
                }
            }
            MsgType::Write => {
                handle_write_transaction(&state, &mut socket, &payload).await?;
            }
            MsgType::Undo => {
                let req = ReqFileOp::decode(&payload)?;
                match crate::undo::undo(&state.root, &state.locks, &req.filename).await {
                    Ok((size, words, chars)) => {
                        state.meta.update_content_counts(&req.filename, size, words, chars, now());
                        let _ = state.meta.save().await;
                        state.repl.enqueue(ReplJob::Update { filename: req.filename });
                        write_message(&mut socket, MsgType::SsGenericOk, &ResSuccess::new("undone").encode()?)
                            .await?;
                    }
                    Err(err) => write_fail(&mut socket, err).await?,
                }
            }
            MsgType::CheckpointOp => {
                handle_checkpoint_op(&state, &mut socket, &payload).await?;
            }
            MsgType::CreateFile => {
                let req = ReqFileOp::decode(&payload)?;
                let reply = handle_create_file(&state, &req).await;
                reply_ack(&mut socket, reply).await?;
            }
            MsgType::DeleteFile => {
                let req = ReqFileOp::decode(&payload)?;
                let result = crate::delete::delete(&state.root, &state.locks, &state.meta, &req.filename).await;
                if result.is_ok() {
                    state.repl.enqueue(ReplJob::Delete { filename: req.filename.clone() });
                    let _ = state.meta.save().await;
                }
                reply_ack(&mut socket, result).await?;
            }
            MsgType::GetInfo => {
                let req = ReqFileOp::decode(&payload)?;
                match state.meta.get(&req.filename) {
                    Some(meta) => write_message(&mut socket, MsgType::FileInfoRes, &meta.encode()?).await?,
                    None => write_fail(&mut socket, Error::FileNotFound).await?,
                }
            }
            MsgType::ExecGetContent => {
                let req = ReqFileOp::decode(&payload)?;
                match crate::exec::get_content(&state.root, &state.locks, &req.filename).await {
                    Ok(content) => {
                        let res = ResExecContent { content };
                        write_message(&mut socket, MsgType::ExecContent, &res.encode()?).await?;
                    }
                    Err(err) => write_fail(&mut socket, err).await?,
                }
            }
            other => {
                warn!(?other, "unexpected message on client/NS port");
                write_fail(&mut socket, Error::UnexpectedReply(format!("{other:?}"))).await?;
            }
        }
    }
}

async fn handle_create_file(state: &SsState, req: &ReqFileOp) -> Result<()> {
    if state.meta.contains(&req.filename) {
        return Err(Error::FileAlreadyExists);
    }
    tokio::fs::write(state.root.file_path(&req.filename), b"").await?;
    state.meta.insert(FileMetadata {
        filename: req.filename.clone(),
        owner: req.username.clone(),
        size_bytes: 0,
        word_count: 0,
        char_count: 0,
        last_modified: now(),
        last_access: now(),
        is_backup: false,
    })?;
    state.meta.save().await?;
    Ok(())
}

/// Drives the WRITE sub-protocol for one transaction: WRITE_OK/
/// WRITE_LOCKED, a stream of WRITE_DATA messages, then WRITE_ETIRW (or
/// disconnect) to close input collection (§4.3).
async fn handle_write_transaction(state: &SsState, socket: &mut TcpStream, payload: &[u8]) -> Result<()> {
    let req = ReqWriteTransaction::decode(payload)?;
    let mut session = match crate::write::begin(&state.root, &state.locks, &req.filename, req.sentence_num).await
    {
        Ok(session) => session,
        Err(Error::WriteLocked) => {
            write_message(socket, MsgType::WriteLocked, &[]).await?;
            return Ok(());
        }
        Err(err) => {
            write_fail(socket, err).await?;
            return Ok(());
        }
    };

    let ack = ResWriteOk { num_words: session.num_words() as u32 };
    write_message(socket, MsgType::WriteOk, &ack.encode()).await?;

    loop {
        let (msg_type, payload) = match read_message(socket, MAX_PAYLOAD).await {
            Ok(pair) => pair,
            Err(dnfs_proto::Error::ConnectionClosed) => {
                session.abort(&state.root).await;
                return Ok(());
            }
            Err(err) => {
                session.abort(&state.root).await;
                return Err(err.into());
            }
        };

        match msg_type {
            MsgType::WriteData => {
                let data = ReqWriteData::decode(&payload)?;
                match session.splice(data.word_index, &data.content) {
                    Ok(()) => write_message(socket, MsgType::SsGenericOk, &[]).await?,
                    Err(err) => write_fail(socket, err).await?,
                }
            }
            MsgType::WriteEtirw => break,
            other => {
                session.abort(&state.root).await;
                return Err(Error::UnexpectedReply(format!("expected WRITE_DATA/WRITE_ETIRW, got {other:?}")));
            }
        }
    }

    let filename = req.filename.clone();
    match session.commit(&state.root, &state.locks).await {
        Ok((size, words, chars)) => {
            state.meta.update_content_counts(&filename, size, words, chars, now());
            let _ = state.meta.save().await;
            state.repl.enqueue(ReplJob::Update { filename });
            write_message(socket, MsgType::SsGenericOk, &ResSuccess::new("committed").encode()?).await?;
        }
        Err(err) => write_fail(socket, err).await?,
    }
    Ok(())
}

async fn handle_checkpoint_op(state: &SsState, socket: &mut TcpStream, payload: &[u8]) -> Result<()> {
    let req = ReqCheckpoint::decode(payload)?;
    match req.command {
        CheckpointCommand::Checkpoint => {
            let result = crate::checkpoint::create(&state.root, &state.locks, &req.filename, &req.tag).await;
            reply_ack(socket, result).await?;
        }
        CheckpointCommand::Revert => {
            match crate::checkpoint::revert(&state.root, &state.locks, &req.filename, &req.tag).await {
                Ok((size, words, chars)) => {
                    state.meta.update_content_counts(&req.filename, size, words, chars, now());
                    let _ = state.meta.save().await;
                    state.repl.enqueue(ReplJob::Update { filename: req.filename.clone() });
                    write_message(socket, MsgType::SsGenericOk, &ResSuccess::new("reverted").encode()?).await?;
                }
                Err(err) => write_fail(socket, err).await?,
            }
        }
        CheckpointCommand::ViewCheckpoint => {
            match crate::checkpoint::read_content(&state.root, &state.locks, &req.filename, &req.tag).await {
                Ok(content) => {
                    let chunk = ResFileContent { data: content, is_final_chunk: true };
                    write_message(socket, MsgType::ReadContent, &chunk.encode()?).await?;
                }
                Err(err) => write_fail(socket, err).await?,
            }
        }
        CheckpointCommand::ListCheckpoints => match crate::checkpoint::list(&state.root, &req.filename).await {
            Ok(entries) => {
                let text = entries
                    .iter()
                    .map(|c| format!("{} {} {}", c.tag, c.size_bytes, c.modified))
                    .collect::<Vec<_>>()
                    .join("\n");
                write_message(socket, MsgType::GenericOk, &TextBlob::new(text).encode()?).await?;
            }
            Err(err) => write_fail(socket, err).await?,
        },
    }
    Ok(())
}

async fn handle_replication_connection(state: Arc<SsState>, mut socket: TcpStream) -> Result<()> {
    let (msg_type, payload) = read_message(&mut socket, MAX_PAYLOAD).await?;
    match msg_type {
        MsgType::ReplicateFile => {
            crate::incoming::handle_replicate_file(&mut socket, &payload, &state.root, &state.meta, now()).await?;
            let _ = state.meta.save().await;
        }
        MsgType::SsDeleteFile => {
            crate::incoming::handle_replica_delete(&mut socket, &payload, &state.root, &state.meta).await?;
            let _ = state.meta.save().await;
        }
        MsgType::StartRecovery => {
            crate::recovery::receive_recovery_stream(socket, &payload, &state.root, &state.meta, &state.locks)
                .await?;
            let _ = state.meta.save().await;
        }
        other => {
            warn!(?other, "unexpected message on replication port");
        }
    }
    Ok(())
}

async fn write_fail<W: tokio::io::AsyncWrite + Unpin>(writer: &mut W, err: Error) -> Result<()> {
    write_message(writer, MsgType::SsGenericFail, &ResError::new(err.to_string()).encode()?).await?;
    Ok(())
}

async fn reply_ack<W: tokio::io::AsyncWrite + Unpin>(writer: &mut W, result: Result<()>) -> Result<()> {
    match result {
        Ok(()) => write_message(writer, MsgType::AckOk, &ResSuccess::new("ok").encode()?).await?,
        Err(err) => write_message(writer, MsgType::AckFail, &ResError::new(err.to_string()).encode()?).await?,
    }
    Ok(())
}

/// Registers with the NS, then runs the long-lived control connection:
/// periodic HEARTBEAT out, and UPDATE_BACKUP/RE_REPLICATE_ALL/
/// SYNC_TO_PRIMARY/SYNC_FROM_BACKUP pushes in (§4.4). Returns the
/// assigned ss id and whether this SS must recover.
pub async fn register_with_ns(
    config: &Config,
    advertise_ip: Ipv4Addr,
    existing_files: Vec<FileMetadata>,
) -> Result<(TcpStream, ResSsRegisterAck)> {
    let mut socket = TcpStream::connect((config.ns_host.as_str(), config.ns_control_port)).await?;
    let req = ReqSsRegister {
        ip: advertise_ip,
        client_port: config.client_port,
        replication_port: config.replication_port,
        files: existing_files,
    };
    write_message(&mut socket, MsgType::Register, &req.encode()?).await?;
    let (msg_type, payload) = read_message(&mut socket, MAX_PAYLOAD).await?;
    if msg_type != MsgType::RegisterAck {
        return Err(Error::UnexpectedReply("expected REGISTER_ACK".to_string()));
    }
    Ok((socket, ResSsRegisterAck::decode(&payload)?))
}

/// Drives the established control connection: spawns a heartbeat timer
/// feeding the write half, and dispatches control pushes read off the
/// read half until the connection closes.
pub async fn run_control_connection(state: Arc<SsState>, socket: TcpStream, ack: ResSsRegisterAck) {
    let (mut read_half, mut write_half) = socket.into_split();
    let (tx, mut rx) = mpsc::unbounded_channel::<MsgType>();

    if let Some(backup_id) = ack.backup_of_ss_id {
        let target = SsEndpoint { ss_id: backup_id, ip: ack.backup_ss_ip, port: ack.backup_ss_port };
        apply_backup_update(&state.backup, &state.repl, &state.meta, Some(target)).await;
    }

    let heartbeat_interval = Duration::from_secs(state.config.heartbeat_interval_secs);
    let heartbeat_tx = tx.clone();
    let heartbeat_task = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(heartbeat_interval);
        loop {
            ticker.tick().await;
            if heartbeat_tx.send(MsgType::Heartbeat).is_err() {
                break;
            }
        }
    });

    let writer_task = tokio::spawn(async move {
        while let Some(msg_type) = rx.recv().await {
            if let Err(err) = write_message(&mut write_half, msg_type, &[]).await {
                error!(%err, "failed writing to NS control connection");
                break;
            }
        }
    });

    if ack.must_recover {
        info!(ss_id = ack.new_ss_id, "awaiting recovery sync from assigned backup holder");
    }

    loop {
        match read_message(&mut read_half, MAX_PAYLOAD).await {
            Ok((MsgType::UpdateBackup, payload)) => {
                if let Ok(req) = ReqUpdateBackup::decode(&payload) {
                    apply_backup_update(&state.backup, &state.repl, &state.meta, req.backup).await;
                }
            }
            Ok((MsgType::ReReplicateAll, payload)) => {
                if let Ok(req) = ReqReReplicateAll::decode(&payload) {
                    apply_backup_update(&state.backup, &state.repl, &state.meta, Some(req.new_backup)).await;
                }
            }
            Ok((MsgType::SyncToPrimary, payload)) => {
                if let Ok(req) = ReqSyncToPrimary::decode(&payload) {
                    let state = Arc::clone(&state);
                    let tx = tx.clone();
                    tokio::spawn(async move {
                        match crate::recovery::push_all_files(req.primary, &state.root, &state.meta, &state.locks)
                            .await
                        {
                            Ok(()) => {
                                let _ = tx.send(MsgType::RecoveryComplete);
                            }
                            Err(err) => error!(%err, "recovery push to primary failed"),
                        }
                    });
                }
            }
            Ok((MsgType::SyncFromBackup, _)) => {
                info!("notified that recovery data will arrive on the replication port");
            }
            Ok((other, _)) => warn!(?other, "unexpected message on NS control connection"),
            Err(dnfs_proto::Error::ConnectionClosed) => break,
            Err(err) => {
                error!(%err, "NS control connection read failed");
                break;
            }
        }
    }

    heartbeat_task.abort();
    writer_task.abort();
}
