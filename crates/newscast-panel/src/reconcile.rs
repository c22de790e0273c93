//! Pure reconciliation of persisted and broadcast state into an affordance.

use newscast_bridge::{Broadcast, TabId};
use newscast_store::PersistedSnapshot;

use crate::affordance::Affordance;

/// The affordance to render when the panel opens on `focused`.
///
/// Playback flags are only trusted when the snapshot was written on behalf
/// of the focused tab; state of another tab never leaks into this one.
pub fn reconcile(snapshot: &PersistedSnapshot, focused: TabId) -> Affordance {
    if snapshot.active_tab_id != Some(focused) {
        return Affordance::Idle;
    }

    if snapshot.is_loading == Some(true) {
        Affordance::Loading
    } else if snapshot.is_playing == Some(true) {
        Affordance::Playing
    } else {
        Affordance::Idle
    }
}

/// The affordance a broadcast from the focused tab switches the panel to.
pub fn affordance_for(broadcast: &Broadcast) -> Affordance {
    match broadcast {
        Broadcast::Started => Affordance::Playing,
        Broadcast::Paused => Affordance::Paused,
        Broadcast::Completed => Affordance::Stopped,
        Broadcast::NeedsUserInteraction { message } => Affordance::NeedsInteraction {
            message: message.clone(),
        },
        Broadcast::Error { error } => Affordance::Failed {
            error: error.clone(),
        },
    }
}

/// What a broadcast from `tab` means for the persisted snapshot.
pub fn snapshot_for(tab: TabId, broadcast: &Broadcast) -> PersistedSnapshot {
    PersistedSnapshot::playback(tab, broadcast.is_playing(), false)
}
