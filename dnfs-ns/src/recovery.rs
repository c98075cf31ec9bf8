//! Recovery coordination: turns a [`crate::sslist::RegisterOutcome`] into
//! the control pushes §4.4 describes (states 2 and 3), after the
//! triggering REGISTER_ACK has already been sent by the caller.

use tracing::{info, warn};

use crate::sslist::{ControlPush, RegisterOutcome, SsList};

/// Dispatches the ring-change pushes computed at registration time, then
/// — for a reconnecting SS — the direct SYNC_TO_PRIMARY/SYNC_FROM_BACKUP
/// handshake (§4.4 states 2 and 3). Both sides are marked `is_syncing`
/// by the caller before this runs; [`crate::sslist::SsList::mark_synced`]
/// clears it once RECOVERY_COMPLETE is observed on the SS side.
pub async fn dispatch_register_outcome(
    ss_list: &SsList,
    ss_id: i32,
    outcome: &RegisterOutcome,
    ring_pushes: Vec<(i32, tokio::sync::mpsc::UnboundedSender<ControlPush>, ControlPush)>,
) {
    for (target_id, tx, push) in ring_pushes {
        if tx.send(push).is_err() {
            warn!(ss_id = target_id, "control channel closed; dropping ring-change push");
        }
    }

    if !outcome.must_recover {
        return;
    }

    let Some(holder) = outcome.recovery_backup_holder else {
        info!(ss_id, "reconnecting SS has no backup holder yet; skipping sync dispatch");
        return;
    };

    let Some((primary_endpoint, _)) = ss_list.endpoint_of(ss_id).await else { return };

    if let Some(tx) = ss_list.control_tx_of(ss_id).await {
        let _ = tx.send(ControlPush::SyncFromBackup { target: holder });
    }
    if let Some(tx) = ss_list.control_tx_of(holder.ss_id).await {
        let _ = tx.send(ControlPush::SyncToPrimary { primary: primary_endpoint });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    #[tokio::test]
    async fn non_recovering_registration_dispatches_nothing_fatal() {
        let ss_list = SsList::new();
        let (tx, _rx) = tokio::sync::mpsc::unbounded_channel();
        let (outcome, pushes) =
            ss_list.register(Ipv4Addr::LOCALHOST, 9000, 9001, 0, tx).await;
        dispatch_register_outcome(&ss_list, outcome.ss_id, &outcome, pushes).await;
    }
}
