use newscast_bridge::{StyleId, TabId};
use serde::{Deserialize, Serialize};

/// Keys of the persisted snapshot, named as they are stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SnapshotKey {
    IsPlaying,
    IsLoading,
    ActiveTabId,
    SelectedStyle,
}

impl SnapshotKey {
    pub const ALL: [SnapshotKey; 4] = [
        SnapshotKey::IsPlaying,
        SnapshotKey::IsLoading,
        SnapshotKey::ActiveTabId,
        SnapshotKey::SelectedStyle,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SnapshotKey::IsPlaying => "isPlaying",
            SnapshotKey::IsLoading => "isLoading",
            SnapshotKey::ActiveTabId => "activeTabId",
            SnapshotKey::SelectedStyle => "selectedStyle",
        }
    }
}

/// A possibly partial view of the persisted playback snapshot.
///
/// Absent keys mean "not read" on the way out of the store and "leave
/// untouched" on the way in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedSnapshot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_playing: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_loading: Option<bool>,
    /// Tab whose executor produced the last playback write.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_tab_id: Option<TabId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_style: Option<StyleId>,
}

impl PersistedSnapshot {
    /// Playback flags of `tab`, leaving the style preference untouched.
    pub fn playback(tab: TabId, is_playing: bool, is_loading: bool) -> Self {
        Self {
            is_playing: Some(is_playing),
            is_loading: Some(is_loading),
            active_tab_id: Some(tab),
            selected_style: None,
        }
    }

    pub fn style(style: StyleId) -> Self {
        Self {
            selected_style: Some(style),
            ..Self::default()
        }
    }

    /// Overwrite every key present in `partial`; absent keys are kept.
    pub fn merge(&mut self, partial: PersistedSnapshot) {
        if let Some(value) = partial.is_playing {
            self.is_playing = Some(value);
        }
        if let Some(value) = partial.is_loading {
            self.is_loading = Some(value);
        }
        if let Some(value) = partial.active_tab_id {
            self.active_tab_id = Some(value);
        }
        if let Some(value) = partial.selected_style {
            self.selected_style = Some(value);
        }
    }

    /// Copy of this snapshot restricted to `keys`.
    pub fn select(&self, keys: &[SnapshotKey]) -> PersistedSnapshot {
        let mut selected = PersistedSnapshot::default();
        for key in keys {
            match key {
                SnapshotKey::IsPlaying => selected.is_playing = self.is_playing,
                SnapshotKey::IsLoading => selected.is_loading = self.is_loading,
                SnapshotKey::ActiveTabId => selected.active_tab_id = self.active_tab_id,
                SnapshotKey::SelectedStyle => selected.selected_style = self.selected_style,
            }
        }
        selected
    }

    /// Keys that carry a value.
    pub fn keys(&self) -> Vec<SnapshotKey> {
        SnapshotKey::ALL
            .into_iter()
            .filter(|key| match key {
                SnapshotKey::IsPlaying => self.is_playing.is_some(),
                SnapshotKey::IsLoading => self.is_loading.is_some(),
                SnapshotKey::ActiveTabId => self.active_tab_id.is_some(),
                SnapshotKey::SelectedStyle => self.selected_style.is_some(),
            })
            .collect()
    }
}
