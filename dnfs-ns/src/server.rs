//! Connection handling: client acceptor, SS control acceptor, heartbeat
//! monitor, and the per-connection dispatch loops (§4.1, §5, §6).
//!
//! Mirrors the teacher's per-connection task-pipeline shape at the level
//! of "split the socket, spawn a writer fed by a channel, loop reads on
//! the read half" without literally reusing its (incomplete) read/vfs/
//! write task split, since the NS's per-connection protocol is request/
//! response rather than a single RPC dispatch surface.

use std::net::Ipv4Addr;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::AsyncWrite;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use dnfs_proto::constants::{MAX_PAYLOAD, NS_CLIENT_PORT};
use dnfs_proto::payloads::*;
use dnfs_proto::{read_message, write_message, MsgType};

use crate::access::{AccessRequestList, AccessTable, Perm};
use crate::cache::LruCache;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::filemap::{FileMap, FileRecord};
use crate::folders::FolderTree;
use crate::recovery::dispatch_register_outcome;
use crate::sslist::{ControlPush, SsEndpoint, SsList};
use crate::users::UserRegistry;

/// All shared Name Server state, behind `Arc` so every connection task
/// can hold a cheap handle to it.
pub struct NsState {
    pub users: UserRegistry,
    pub access: AccessTable,
    pub requests: AccessRequestList,
    pub files: FileMap,
    pub ss_list: SsList,
    /// `owner:filename` -> resolved primary ss id (§4.2, §4.5).
    pub cache: LruCache<String, i32>,
    pub config: Config,
}

impl NsState {
    pub async fn load(config: Config) -> Result<Self> {
        Ok(Self {
            users: UserRegistry::load(&config.users_db_path).await?,
            access: AccessTable::load(&config.permission_db_dir).await?,
            requests: AccessRequestList::new(),
            files: FileMap::new(),
            ss_list: SsList::new(),
            cache: LruCache::new(config.cache_capacity),
            config,
        })
    }
}

/// Accepts Client connections forever, one task per connection.
pub async fn run_client_acceptor(state: Arc<NsState>, listener: TcpListener) -> std::io::Result<()> {
    loop {
        let (socket, peer) = listener.accept().await?;
        socket.set_nodelay(true)?;
        info!(%peer, "client connected");
        let state = Arc::clone(&state);
        tokio::spawn(async move {
            if let Err(err) = handle_client_connection(state, socket).await {
                warn!(%peer, %err, "client connection ended with error");
            }
        });
    }
}

/// Accepts Storage Server control connections forever.
pub async fn run_ss_acceptor(state: Arc<NsState>, listener: TcpListener) -> std::io::Result<()> {
    loop {
        let (socket, peer) = listener.accept().await?;
        socket.set_nodelay(true)?;
        info!(%peer, "storage server control connection opened");
        let state = Arc::clone(&state);
        tokio::spawn(async move {
            if let Err(err) = handle_ss_control_connection(state, socket, peer.ip()).await {
                warn!(%peer, %err, "storage server control connection ended with error");
            }
        });
    }
}

/// Wakes every [`dnfs_proto::constants::HEARTBEAT_TIMEOUT_SECS`] and marks
/// stale Storage Servers offline (§4.2's heartbeat monitor thread).
pub async fn run_heartbeat_monitor(state: Arc<NsState>) {
    let timeout = Duration::from_secs(state.config.heartbeat_timeout_secs);
    loop {
        tokio::time::sleep(timeout).await;
        let (offline, pushes) = state.ss_list.sweep_stale(timeout).await;
        for ss_id in offline {
            warn!(ss_id, "storage server heartbeat timed out; marked offline");
        }
        for (target, tx, push) in pushes {
            if tx.send(push).is_err() {
                warn!(ss_id = target, "dropped ring-change push to dead control channel");
            }
        }
    }
}

struct Session {
    username: Option<String>,
    folder: FolderTree,
}

async fn handle_client_connection(state: Arc<NsState>, mut socket: TcpStream) -> Result<()> {
    let mut session = Session { username: None, folder: FolderTree::new() };

    loop {
        let (msg_type, payload) = match read_message(&mut socket, MAX_PAYLOAD).await {
            Ok(m) => m,
            Err(dnfs_proto::Error::ConnectionClosed) => break,
            Err(err) => return Err(err.into()),
        };

        let (reply_type, reply_payload) =
            dispatch_client_message(&state, &mut session, msg_type, &payload).await;
        write_message(&mut socket, reply_type, &reply_payload).await?;
    }

    if let Some(username) = &session.username {
        state.users.logout(username).await?;
        info!(username, "client disconnected, session ended");
    }
    Ok(())
}

/// Dispatches one Client<->NS request to its handler, translating any
/// [`Error`] into a `GENERIC_FAIL` (or a more specific failure code where
/// the protocol defines one).
async fn dispatch_client_message(
    state: &NsState,
    session: &mut Session,
    msg_type: MsgType,
    payload: &[u8],
) -> (MsgType, Vec<u8>) {
    let result = match msg_type {
        MsgType::Login => handle_login(state, session, payload).await,
        MsgType::View => handle_view(state, session, payload).await,
        MsgType::Create => handle_create(state, session, payload).await,
        MsgType::Delete => handle_delete(state, session, payload).await,
        MsgType::Info => handle_info(state, session, payload).await,
        MsgType::ReadReq => handle_resolve(state, session, payload, Perm::can_read).await,
        MsgType::StreamReq => handle_resolve(state, session, payload, Perm::can_read).await,
        MsgType::WriteReq => handle_resolve(state, session, payload, Perm::can_write).await,
        MsgType::UndoReq => handle_resolve(state, session, payload, Perm::can_write).await,
        MsgType::CheckpointReq => handle_checkpoint_resolve(state, session, payload).await,
        MsgType::ListUsers => handle_list_users(state).await,
        MsgType::AccessAdd => handle_access_add(state, session, payload).await,
        MsgType::AccessRem => handle_access_rem(state, session, payload).await,
        MsgType::ExecReq => handle_exec(state, session, payload).await,
        MsgType::FolderCmd => handle_folder_cmd(session, payload).await,
        MsgType::ReqAccess => handle_req_access(state, session, payload).await,
        MsgType::ViewReqAccess => handle_view_req_access(state, session).await,
        MsgType::GrantReqAccess => handle_grant_req_access(state, session, payload).await,
        other => Err(Error::StorageServer(format!("unexpected client message {other:?}"))),
    };

    match result {
        Ok(reply) => reply,
        Err(err) => (MsgType::GenericFail, ResError::new(err.to_string()).encode().unwrap_or_default()),
    }
}

fn require_login<'a>(session: &'a Session) -> Result<&'a str> {
    session.username.as_deref().ok_or(Error::AccessDenied)
}

async fn handle_login(
    state: &NsState,
    session: &mut Session,
    payload: &[u8],
) -> Result<(MsgType, Vec<u8>)> {
    let req = ReqLogin::decode(payload)?;
    match state.users.login(&req.username).await {
        Ok(()) => {
            session.username = Some(req.username);
            Ok((MsgType::LoginOk, ResSuccess::new("logged in").encode()?))
        }
        Err(err) => Ok((MsgType::LoginFail, ResError::new(err.to_string()).encode()?)),
    }
}

async fn handle_view(
    state: &NsState,
    session: &Session,
    payload: &[u8],
) -> Result<(MsgType, Vec<u8>)> {
    let username = require_login(session)?;
    let req = ReqView::decode(payload)?;

    let mut records: Vec<FileRecord> = state.files.owned_by(username);
    if req.flags.all {
        for filename in state.access.filenames_for(username).await {
            if let Some(record) = state.files.find_owner(&filename) {
                if record.owner != username && !records.iter().any(|r| r.filename == filename) {
                    records.push(record);
                }
            }
        }
    }

    records.sort_by(|a, b| a.filename.cmp(&b.filename));
    let lines: Vec<String> = records
        .iter()
        .map(|record| {
            if req.flags.long {
                format!("-> {} (owner={})", record.filename, record.owner)
            } else {
                format!("-> {}", record.filename)
            }
        })
        .collect();
    let text = lines.join("\n");
    Ok((MsgType::ViewRes, TextBlob::new(text).encode()?))
}

async fn handle_create(
    state: &NsState,
    session: &mut Session,
    payload: &[u8],
) -> Result<(MsgType, Vec<u8>)> {
    let username = require_login(session)?.to_string();
    let req = ReqFileOp::decode(payload)?;

    if state.files.search(&username, &req.filename).is_some() {
        return Err(Error::FileAlreadyExists);
    }

    let endpoint = state.ss_list.place().await?;
    let ack = ns_to_ss_request(
        endpoint,
        MsgType::CreateFile,
        &ReqFileOp { username: username.clone(), filename: req.filename.clone() }.encode()?,
    )
    .await?;
    if ack.0 != MsgType::AckOk {
        return Err(Error::StorageServer(ResError::decode(&ack.1)?.msg));
    }

    state.files.insert(FileRecord {
        owner: username.clone(),
        filename: req.filename.clone(),
        primary_ss_id: endpoint.ss_id,
        backup_ss_id: None,
    })?;
    state.access.grant(&username, &req.filename, Perm::OWNER_ALL).await?;
    session.folder.add_file_stub(&req.filename)?;
    Ok((MsgType::GenericOk, ResSuccess::new("created").encode()?))
}

async fn handle_delete(
    state: &NsState,
    session: &Session,
    payload: &[u8],
) -> Result<(MsgType, Vec<u8>)> {
    let username = require_login(session)?;
    let req = ReqFileOp::decode(payload)?;

    let record = state.files.search(username, &req.filename).ok_or(Error::FileNotFound)?;
    let perm = state.access.lookup(username, &req.filename).await;
    if !perm.is_owner() {
        return Err(Error::AccessDenied);
    }

    let endpoint = state
        .ss_list
        .endpoint_of(record.primary_ss_id)
        .await
        .map(|(ep, _)| ep)
        .ok_or(Error::NoStorageServerAvailable)?;
    let ack = ns_to_ss_request(
        endpoint,
        MsgType::DeleteFile,
        &ReqFileOp { username: username.to_string(), filename: req.filename.clone() }.encode()?,
    )
    .await?;
    if ack.0 != MsgType::AckOk {
        return Err(Error::StorageServer(ResError::decode(&ack.1)?.msg));
    }

    state.files.remove(username, &req.filename);
    state.access.revoke(username, &req.filename).await?;
    state.ss_list.decrement_file_count(record.primary_ss_id).await;
    state.cache.remove(&cache_key(username, &req.filename)).await;
    Ok((MsgType::GenericOk, ResSuccess::new("deleted").encode()?))
}

async fn handle_info(
    state: &NsState,
    session: &Session,
    payload: &[u8],
) -> Result<(MsgType, Vec<u8>)> {
    let username = require_login(session)?;
    let req = ReqFileOp::decode(payload)?;
    let perm = state.access.lookup(username, &req.filename).await;
    if !perm.can_write() {
        return Err(Error::AccessDenied);
    }
    let record = resolve_record(state, username, &req.filename)?;
    let endpoint = resolve_ss(state, &record).await?;

    let (reply_type, reply_payload) =
        ns_to_ss_request(endpoint, MsgType::GetInfo, &req.encode()?).await?;
    if reply_type != MsgType::FileInfoRes {
        return Err(Error::StorageServer(ResError::decode(&reply_payload)?.msg));
    }
    Ok((MsgType::InfoRes, reply_payload))
}

/// Shared resolution path for READ/STREAM/WRITE/UNDO: checks access,
/// consults the LRU cache, falls back to the file map, and returns
/// SS_LOC or a descriptive failure (§4.2's SS-resolution algorithm).
async fn handle_resolve(
    state: &NsState,
    session: &Session,
    payload: &[u8],
    required: fn(Perm) -> bool,
) -> Result<(MsgType, Vec<u8>)> {
    let username = require_login(session)?;
    let req = ReqFileOp::decode(payload)?;
    let perm = state.access.lookup(username, &req.filename).await;
    if !required(perm) {
        return Err(Error::AccessDenied);
    }
    let record = resolve_record(state, username, &req.filename)?;
    let endpoint = resolve_ss(state, &record).await?;
    Ok((
        MsgType::SsLoc,
        ResSsLocation { ip: endpoint.ip, port: endpoint.client_port }.encode(),
    ))
}

async fn handle_checkpoint_resolve(
    state: &NsState,
    session: &Session,
    payload: &[u8],
) -> Result<(MsgType, Vec<u8>)> {
    let username = require_login(session)?;
    let req = ReqCheckpoint::decode(payload)?;
    let perm = state.access.lookup(username, &req.filename).await;
    if !perm.can_read() {
        return Err(Error::AccessDenied);
    }
    let record = resolve_record(state, username, &req.filename)?;
    let endpoint = resolve_ss(state, &record).await?;
    Ok((
        MsgType::SsLoc,
        ResSsLocation { ip: endpoint.ip, port: endpoint.client_port }.encode(),
    ))
}

fn resolve_record(state: &NsState, username: &str, filename: &str) -> Result<FileRecord> {
    state
        .files
        .search(username, filename)
        .or_else(|| state.files.find_owner(filename))
        .ok_or(Error::FileNotFound)
}

/// SS resolution: cache first, then the file map, preferring the online
/// primary and falling back to the backup (§4.2).
async fn resolve_ss(state: &NsState, record: &FileRecord) -> Result<SsEndpoint> {
    let key = cache_key(&record.owner, &record.filename);
    if let Some(ss_id) = state.cache.get(&key).await {
        if let Some((endpoint, true)) = state.ss_list.endpoint_of(ss_id).await {
            return Ok(endpoint);
        }
    }

    if let Some((endpoint, true)) = state.ss_list.endpoint_of(record.primary_ss_id).await {
        state.cache.put(key, record.primary_ss_id).await;
        return Ok(endpoint);
    }
    if let Some(backup_id) = record.backup_ss_id {
        if let Some((endpoint, true)) = state.ss_list.endpoint_of(backup_id).await {
            warn!(
                primary = record.primary_ss_id,
                backup = backup_id,
                owner = record.owner,
                filename = record.filename,
                "primary is down; using backup"
            );
            return Ok(endpoint);
        }
    }
    Err(Error::NoStorageServerAvailable)
}

fn cache_key(owner: &str, filename: &str) -> String {
    format!("{owner}:{filename}")
}

async fn handle_list_users(state: &NsState) -> Result<(MsgType, Vec<u8>)> {
    let all = state.users.list_all().await;
    let text = all
        .iter()
        .map(|(name, active)| format!("{name} {}", if *active { "active" } else { "inactive" }))
        .collect::<Vec<_>>()
        .join("\n");
    Ok((MsgType::ListUsersRes, TextBlob::new(text).encode()?))
}

async fn handle_access_add(
    state: &NsState,
    session: &Session,
    payload: &[u8],
) -> Result<(MsgType, Vec<u8>)> {
    let username = require_login(session)?;
    let req = ReqAccess::decode(payload)?;
    let perm = state.access.lookup(username, &req.filename).await;
    if !perm.is_owner() {
        return Err(Error::AccessDenied);
    }
    let granted = match req.perm_flag {
        PermFlag::Read => Perm::read_only(),
        PermFlag::ReadWrite => Perm::read_write(),
    };
    state.access.grant(&req.target_user, &req.filename, granted).await?;
    state.requests.remove(&req.target_user, &req.filename).await;
    Ok((MsgType::GenericOk, ResSuccess::new("access granted").encode()?))
}

async fn handle_access_rem(
    state: &NsState,
    session: &Session,
    payload: &[u8],
) -> Result<(MsgType, Vec<u8>)> {
    let username = require_login(session)?;
    let req = ReqAccess::decode(payload)?;
    let perm = state.access.lookup(username, &req.filename).await;
    if !perm.is_owner() {
        return Err(Error::AccessDenied);
    }
    state.access.revoke(&req.target_user, &req.filename).await?;
    Ok((MsgType::GenericOk, ResSuccess::new("access removed").encode()?))
}

async fn handle_req_access(
    state: &NsState,
    session: &Session,
    payload: &[u8],
) -> Result<(MsgType, Vec<u8>)> {
    let username = require_login(session)?;
    let req = ReqFileOp::decode(payload)?;
    state.requests.add(username, &req.filename).await;
    Ok((MsgType::GenericOk, ResSuccess::new("request recorded").encode()?))
}

async fn handle_view_req_access(state: &NsState, session: &Session) -> Result<(MsgType, Vec<u8>)> {
    let username = require_login(session)?;
    let owned: Vec<String> = state.files.owned_by(username).into_iter().map(|r| r.filename).collect();
    let pending = state.requests.for_owned_files(&owned).await;
    let text = pending
        .iter()
        .map(|(requester, filename)| format!("{requester} wants {filename}"))
        .collect::<Vec<_>>()
        .join("\n");
    Ok((MsgType::ViewReqAccessRes, TextBlob::new(text).encode()?))
}

async fn handle_grant_req_access(
    state: &NsState,
    session: &Session,
    payload: &[u8],
) -> Result<(MsgType, Vec<u8>)> {
    handle_access_add(state, session, payload).await.map(|(_, body)| (MsgType::ReqAccessOk, body))
}

async fn handle_folder_cmd(session: &mut Session, payload: &[u8]) -> Result<(MsgType, Vec<u8>)> {
    let req = ReqFolder::decode(payload)?;
    match req.command.as_str() {
        "CREATEFOLDER" => {
            session.folder.create_folder(&req.arg1)?;
        }
        "VIEWFOLDER" => {
            let path = if req.arg1.is_empty() { None } else { Some(req.arg1.as_str()) };
            let names = session.folder.view_folder(path)?;
            return Ok((MsgType::GenericOk, TextBlob::new(names.join("\n")).encode()?));
        }
        "MOVE" => session.folder.move_file(&req.arg1, &req.arg2)?,
        "UPMOVE" => session.folder.upmove_file(&req.arg1)?,
        "OPEN" => session.folder.open(&req.arg1, req.create_if_missing)?,
        "OPENPARENT" => session.folder.up()?,
        other => return Err(Error::StorageServer(format!("unknown folder command {other}"))),
    }
    Ok((MsgType::GenericOk, ResSuccess::new("ok").encode()?))
}

/// EXEC: fetches file content from the owning SS and runs it with
/// `bash`, piping combined output back (§4.3's EXEC_GET_CONTENT, §9's
/// security-boundary note). Requires `r`.
async fn handle_exec(
    state: &NsState,
    session: &Session,
    payload: &[u8],
) -> Result<(MsgType, Vec<u8>)> {
    let username = require_login(session)?;
    let req = ReqFileOp::decode(payload)?;
    let perm = state.access.lookup(username, &req.filename).await;
    if !perm.can_read() {
        return Err(Error::AccessDenied);
    }
    let record = resolve_record(state, username, &req.filename)?;
    let endpoint = resolve_ss(state, &record).await?;

    let (reply_type, reply_payload) =
        ns_to_ss_request(endpoint, MsgType::ExecGetContent, &req.encode()?).await?;
    if reply_type != MsgType::ExecContent {
        return Err(Error::StorageServer(ResError::decode(&reply_payload)?.msg));
    }
    let content = ResExecContent::decode(&reply_payload)?.content;

    let script_path = std::env::temp_dir().join(format!("dnfs-exec-{}", uuid_like()));
    tokio::fs::write(&script_path, content).await?;
    let output = tokio::process::Command::new("bash").arg(&script_path).output().await?;
    let _ = tokio::fs::remove_file(&script_path).await;

    let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
    combined.push_str(&String::from_utf8_lossy(&output.stderr));
    Ok((MsgType::ExecRes, TextBlob::new(combined).encode()?))
}

fn uuid_like() -> u64 {
    // Not a real UUID: a process-unique-enough scratch-file suffix. Actual
    // randomness is unnecessary here since the file is removed immediately
    // after use and collisions only risk a transient EEXIST.
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0)
}

async fn handle_ss_control_connection(
    state: Arc<NsState>,
    socket: TcpStream,
    peer_ip: std::net::IpAddr,
) -> Result<()> {
    let (mut read_half, mut write_half) = socket.into_split();

    let (msg_type, payload) = read_message(&mut read_half, MAX_PAYLOAD).await?;
    if msg_type != MsgType::Register {
        return Err(Error::StorageServer("expected REGISTER as first message".to_string()));
    }
    let req = ReqSsRegister::decode(&payload)?;
    let ip = match peer_ip {
        std::net::IpAddr::V4(v4) => v4,
        std::net::IpAddr::V6(_) => req.ip,
    };

    let (control_tx, mut control_rx) = mpsc::unbounded_channel::<ControlPush>();
    let (outcome, ring_pushes) = state
        .ss_list
        .register(ip, req.client_port, req.replication_port, req.files.len() as u32, control_tx)
        .await;

    for meta in &req.files {
        state.files.insert(FileRecord {
            owner: meta.owner.clone(),
            filename: meta.filename.clone(),
            primary_ss_id: outcome.ss_id,
            backup_ss_id: outcome.backup_of.map(|ep| ep.ss_id),
        }).ok(); // pre-existing entries on reconnect are not an error
    }

    let ack = ResSsRegisterAck {
        new_ss_id: outcome.ss_id,
        must_recover: outcome.must_recover,
        backup_of_ss_id: outcome.backup_of.map(|ep| ep.ss_id),
        backup_ss_ip: outcome.backup_of.map(|ep| ep.ip).unwrap_or(Ipv4Addr::UNSPECIFIED),
        backup_ss_port: outcome.backup_of.map(|ep| ep.repl_port).unwrap_or(0),
    };
    write_message(&mut write_half, MsgType::RegisterAck, &ack.encode()).await?;

    info!(ss_id = outcome.ss_id, must_recover = outcome.must_recover, "storage server registered");
    dispatch_register_outcome(&state.ss_list, outcome.ss_id, &outcome, ring_pushes).await;

    let writer = tokio::spawn(async move {
        while let Some(push) = control_rx.recv().await {
            if let Err(err) = write_control_push(&mut write_half, push).await {
                error!(%err, "failed writing control push to storage server");
                break;
            }
        }
    });

    loop {
        match read_message(&mut read_half, MAX_PAYLOAD).await {
            Ok((MsgType::Heartbeat, _)) => state.ss_list.heartbeat(outcome.ss_id).await,
            Ok((MsgType::RecoveryComplete, _)) => state.ss_list.mark_synced(outcome.ss_id).await,
            Ok((other, _)) => warn!(?other, "unexpected message on SS control channel"),
            Err(dnfs_proto::Error::ConnectionClosed) => break,
            Err(err) => return Err(err.into()),
        }
    }

    writer.abort();
    Ok(())
}

fn to_proto_endpoint(ep: SsEndpoint) -> dnfs_proto::payloads::SsEndpoint {
    dnfs_proto::payloads::SsEndpoint { ss_id: ep.ss_id, ip: ep.ip, port: ep.repl_port }
}

async fn write_control_push<W: AsyncWrite + Unpin>(writer: &mut W, push: ControlPush) -> Result<()> {
    match push {
        ControlPush::UpdateBackup { backup } => {
            let req = ReqUpdateBackup { backup: backup.map(to_proto_endpoint) };
            write_message(writer, MsgType::UpdateBackup, &req.encode()).await?;
        }
        ControlPush::ReReplicateAll { new_backup } => {
            let req = ReqReReplicateAll { new_backup: to_proto_endpoint(new_backup) };
            write_message(writer, MsgType::ReReplicateAll, &req.encode()).await?;
        }
        ControlPush::SyncToPrimary { primary } => {
            let req = ReqSyncToPrimary { primary: to_proto_endpoint(primary) };
            write_message(writer, MsgType::SyncToPrimary, &req.encode()).await?;
        }
        ControlPush::SyncFromBackup { target } => {
            let req = ReqSyncFromBackup { target: to_proto_endpoint(target) };
            write_message(writer, MsgType::SyncFromBackup, &req.encode()).await?;
        }
    }
    Ok(())
}

/// Opens a short-lived connection to `endpoint`'s client port, sends one
/// request and reads one response (the NS->SS request/response messages
/// of §4.1: CREATE_FILE, DELETE_FILE, GET_INFO, EXEC_GET_CONTENT).
async fn ns_to_ss_request(
    endpoint: SsEndpoint,
    msg_type: MsgType,
    payload: &[u8],
) -> Result<(MsgType, Vec<u8>)> {
    let mut socket = TcpStream::connect((endpoint.ip, endpoint.client_port))
        .await
        .map_err(|err| Error::StorageServer(format!("could not reach storage server: {err}")))?;
    write_message(&mut socket, msg_type, payload).await?;
    Ok(read_message(&mut socket, MAX_PAYLOAD).await?)
}

/// Client-facing default port, re-exported for the binary's usage text.
pub const DEFAULT_CLIENT_PORT: u16 = NS_CLIENT_PORT;
