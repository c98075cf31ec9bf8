//! Storage Server registry: stable ids, the circular backup ring, least-
//! loaded placement and the heartbeat monitor (§4.2, §4.4, §9).
//!
//! The source represents the ring as a hand-woven circular singly linked
//! list (`prev = get_prev(n)`). Per §9's explicit instruction this becomes
//! an ordered `Vec` keyed by join order with neighbour lookups by index,
//! not raw pointers.

use std::net::Ipv4Addr;
use std::time::Instant;

use tokio::sync::{mpsc, Mutex};

use crate::error::{Error, Result};

/// A control message pushed to a registered SS's control connection.
///
/// The connection task owning the receiving end of the channel is
/// responsible for encoding and writing each of these as its
/// corresponding wire message.
#[derive(Debug, Clone)]
pub enum ControlPush {
    UpdateBackup { backup: Option<SsEndpoint> },
    ReReplicateAll { new_backup: SsEndpoint },
    SyncToPrimary { primary: SsEndpoint },
    SyncFromBackup { target: SsEndpoint },
}

/// An SS's dialable endpoint, as advertised at registration time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SsEndpoint {
    pub ss_id: i32,
    pub ip: Ipv4Addr,
    pub client_port: u16,
    pub repl_port: u16,
}

struct SsRecord {
    ss_id: i32,
    ip: Ipv4Addr,
    client_port: u16,
    repl_port: u16,
    online: bool,
    syncing: bool,
    file_count: u32,
    backup_ss_id: Option<i32>,
    last_heartbeat: Instant,
    pending_full_sync: bool,
    control_tx: Option<mpsc::UnboundedSender<ControlPush>>,
}

impl SsRecord {
    fn endpoint(&self) -> SsEndpoint {
        SsEndpoint { ss_id: self.ss_id, ip: self.ip, client_port: self.client_port, repl_port: self.repl_port }
    }
}

struct Inner {
    /// Ring order is join order; `ring[i]`'s predecessor is `ring[i-1]`
    /// (wrapping), per §4.2's "backup_ss_id equals the previous node's id".
    ring: Vec<SsRecord>,
    next_id: i32,
}

/// The NS's live view of every Storage Server it has ever seen.
pub struct SsList {
    inner: Mutex<Inner>,
}

/// Outcome of a registration, handed back to the connection handler so it
/// can build the REGISTER_ACK and, for a reconnect, kick off recovery.
pub struct RegisterOutcome {
    pub ss_id: i32,
    pub must_recover: bool,
    /// The SS currently holding this SS's replicas (recovery state 3's
    /// SYNC_FROM_BACKUP target), when reconnecting.
    pub recovery_backup_holder: Option<SsEndpoint>,
    pub backup_of: Option<SsEndpoint>,
}

impl SsList {
    pub fn new() -> Self {
        Self { inner: Mutex::new(Inner { ring: Vec::new(), next_id: 0 }) }
    }

    /// Registers (or re-registers) an SS by `(ip, client_port)`, the
    /// source's reconnection key. Recomputes the ring and returns which
    /// nodes now need an UPDATE_BACKUP/RE_REPLICATE_ALL push.
    pub async fn register(
        &self,
        ip: Ipv4Addr,
        client_port: u16,
        repl_port: u16,
        file_count: u32,
        control_tx: mpsc::UnboundedSender<ControlPush>,
    ) -> (RegisterOutcome, Vec<(i32, mpsc::UnboundedSender<ControlPush>, ControlPush)>) {
        let mut inner = self.inner.lock().await;

        let existing_pos =
            inner.ring.iter().position(|ss| ss.ip == ip && ss.client_port == client_port);

        let (ss_id, must_recover) = if let Some(pos) = existing_pos {
            let record = &mut inner.ring[pos];
            record.online = true;
            record.syncing = true;
            record.repl_port = repl_port;
            record.file_count = file_count;
            record.last_heartbeat = Instant::now();
            record.control_tx = Some(control_tx.clone());
            (record.ss_id, true)
        } else {
            let ss_id = inner.next_id;
            inner.next_id += 1;
            inner.ring.push(SsRecord {
                ss_id,
                ip,
                client_port,
                repl_port,
                online: true,
                syncing: false,
                file_count,
                backup_ss_id: None,
                last_heartbeat: Instant::now(),
                pending_full_sync: false,
                control_tx: Some(control_tx),
            });
            (ss_id, false)
        };

        let pushes = recompute_ring(&mut inner.ring);

        let backup_of = inner
            .ring
            .iter()
            .find(|ss| ss.ss_id == ss_id)
            .and_then(|ss| ss.backup_ss_id)
            .and_then(|backup_id| inner.ring.iter().find(|ss| ss.ss_id == backup_id))
            .map(|ss| ss.endpoint());

        // The node holding this SS's replicas is whoever this SS backs up
        // to, i.e. the same lookup as `backup_of` above.
        let recovery_backup_holder = if must_recover { backup_of } else { None };

        (
            RegisterOutcome { ss_id, must_recover, recovery_backup_holder, backup_of },
            pushes,
        )
    }

    /// Records a heartbeat for `ss_id`.
    pub async fn heartbeat(&self, ss_id: i32) {
        let mut inner = self.inner.lock().await;
        if let Some(record) = inner.ring.iter_mut().find(|ss| ss.ss_id == ss_id) {
            record.last_heartbeat = Instant::now();
        }
    }

    /// Clears `syncing` once recovery completes for `ss_id`.
    pub async fn mark_synced(&self, ss_id: i32) {
        let mut inner = self.inner.lock().await;
        if let Some(record) = inner.ring.iter_mut().find(|ss| ss.ss_id == ss_id) {
            record.syncing = false;
        }
    }

    /// Picks the least-loaded online, non-syncing SS for CREATE placement
    /// and increments its `file_count` on success.
    pub async fn place(&self) -> Result<SsEndpoint> {
        let mut inner = self.inner.lock().await;
        let chosen = inner
            .ring
            .iter_mut()
            .filter(|ss| ss.online && !ss.syncing)
            .min_by_key(|ss| ss.file_count)
            .ok_or(Error::NoStorageServerAvailable)?;
        chosen.file_count += 1;
        Ok(chosen.endpoint())
    }

    /// Decrements `ss_id`'s `file_count` on DELETE.
    pub async fn decrement_file_count(&self, ss_id: i32) {
        let mut inner = self.inner.lock().await;
        if let Some(record) = inner.ring.iter_mut().find(|ss| ss.ss_id == ss_id) {
            record.file_count = record.file_count.saturating_sub(1);
        }
    }

    /// Endpoint and online flag for `ss_id`, for resolution fallback.
    pub async fn endpoint_of(&self, ss_id: i32) -> Option<(SsEndpoint, bool)> {
        let inner = self.inner.lock().await;
        inner.ring.iter().find(|ss| ss.ss_id == ss_id).map(|ss| (ss.endpoint(), ss.online))
    }

    /// The control-push channel for `ss_id`, if it is currently registered
    /// and online. Used to dispatch the recovery handshake's direct
    /// SYNC_TO_PRIMARY/SYNC_FROM_BACKUP pushes.
    pub async fn control_tx_of(&self, ss_id: i32) -> Option<mpsc::UnboundedSender<ControlPush>> {
        let inner = self.inner.lock().await;
        inner.ring.iter().find(|ss| ss.ss_id == ss_id).and_then(|ss| ss.control_tx.clone())
    }

    /// Sweeps for SSs whose last heartbeat is older than `timeout`,
    /// forcing them offline and recomputing the ring. Returns the ids
    /// marked offline and any resulting control pushes.
    pub async fn sweep_stale(
        &self,
        timeout: std::time::Duration,
    ) -> (Vec<i32>, Vec<(i32, mpsc::UnboundedSender<ControlPush>, ControlPush)>) {
        let mut inner = self.inner.lock().await;
        let now = Instant::now();
        let mut went_offline = Vec::new();
        for record in inner.ring.iter_mut() {
            if record.online && now.duration_since(record.last_heartbeat) > timeout {
                record.online = false;
                record.control_tx = None;
                went_offline.push(record.ss_id);
            }
        }
        if went_offline.is_empty() {
            return (went_offline, Vec::new());
        }
        let pushes = recompute_ring(&mut inner.ring);
        (went_offline, pushes)
    }
}

impl Default for SsList {
    fn default() -> Self {
        Self::new()
    }
}

/// Recomputes `backup_ss_id` for every node from ring order, flags nodes
/// whose assignment changed as `pending_full_sync`, and returns the
/// UPDATE_BACKUP pushes those nodes (and the ones whose backup changed)
/// need (§4.2's "after the triggering registration response has been
/// sent" ordering is left to the caller — this only computes state).
fn recompute_ring(
    ring: &mut [SsRecord],
) -> Vec<(i32, mpsc::UnboundedSender<ControlPush>, ControlPush)> {
    let online_positions: Vec<usize> =
        (0..ring.len()).filter(|&i| ring[i].online).collect();
    let mut pushes = Vec::new();

    if online_positions.len() <= 1 {
        for &i in &online_positions {
            if ring[i].backup_ss_id.is_some() {
                ring[i].pending_full_sync = true;
            }
            ring[i].backup_ss_id = None;
        }
    } else {
        let n = online_positions.len();
        for (k, &i) in online_positions.iter().enumerate() {
            let prev_idx = online_positions[(k + n - 1) % n];
            let new_backup = ring[prev_idx].ss_id;
            if ring[i].backup_ss_id != Some(new_backup) {
                ring[i].backup_ss_id = Some(new_backup);
                ring[i].pending_full_sync = true;
            }
        }
    }

    // §4.4: nodes whose assignment changed get RE_REPLICATE_ALL, which
    // itself updates the backup target before resyncing, so a separate
    // UPDATE_BACKUP push to the same node would be redundant.
    for &i in &online_positions {
        if ring[i].pending_full_sync {
            if let (Some(tx), Some(backup_id)) = (ring[i].control_tx.clone(), ring[i].backup_ss_id) {
                if let Some(new_backup) =
                    ring.iter().find(|ss| ss.ss_id == backup_id).map(|ss| ss.endpoint())
                {
                    pushes.push((ring[i].ss_id, tx, ControlPush::ReReplicateAll { new_backup }));
                }
            }
            ring[i].pending_full_sync = false;
        }
    }
    pushes
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tx() -> mpsc::UnboundedSender<ControlPush> {
        mpsc::unbounded_channel().0
    }

    #[tokio::test]
    async fn single_node_has_no_backup() {
        let list = SsList::new();
        let (outcome, _) = list.register(Ipv4Addr::LOCALHOST, 9000, 9001, 0, tx()).await;
        assert_eq!(outcome.ss_id, 0);
        assert!(!outcome.must_recover);
    }

    #[tokio::test]
    async fn second_node_becomes_first_nodes_backup() {
        let list = SsList::new();
        list.register(Ipv4Addr::LOCALHOST, 9000, 9001, 0, tx()).await;
        list.register(Ipv4Addr::new(10, 0, 0, 2), 9000, 9001, 0, tx()).await;
        // both nodes now form a 2-ring; each should have the other as backup
        let (ep0, _) = list.endpoint_of(0).await.unwrap();
        let (ep1, _) = list.endpoint_of(1).await.unwrap();
        assert_eq!(ep0.ss_id, 0);
        assert_eq!(ep1.ss_id, 1);
    }

    #[tokio::test]
    async fn reconnect_from_same_ip_port_reuses_id() {
        let list = SsList::new();
        let (first, _) = list.register(Ipv4Addr::LOCALHOST, 9000, 9001, 3, tx()).await;
        let (second, _) = list.register(Ipv4Addr::LOCALHOST, 9000, 9001, 3, tx()).await;
        assert_eq!(first.ss_id, second.ss_id);
        assert!(second.must_recover);
    }

    #[tokio::test]
    async fn placement_prefers_least_loaded() {
        let list = SsList::new();
        list.register(Ipv4Addr::LOCALHOST, 9000, 9001, 5, tx()).await;
        list.register(Ipv4Addr::new(10, 0, 0, 2), 9000, 9001, 1, tx()).await;
        let chosen = list.place().await.unwrap();
        assert_eq!(chosen.ss_id, 1);
    }
}
