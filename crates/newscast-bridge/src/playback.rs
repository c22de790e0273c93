use serde::{Deserialize, Serialize};

/// Phase of the playback state machine owned by a tab's media executor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum PlaybackState {
    /// Nothing was ever requested in this tab.
    #[default]
    Idle,
    /// A generation request is in flight or its result is being started.
    Loading,
    /// Audio is ready but the platform refused to start it without a user
    /// gesture.
    NeedsInteraction,
    Playing,
    Paused,
    /// Playback was halted or reached its end; the asset is still retained.
    Stopped,
    Error,
}

impl PlaybackState {
    pub fn is_playing(&self) -> bool {
        matches!(self, PlaybackState::Playing)
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, PlaybackState::Loading)
    }
}
