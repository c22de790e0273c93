use std::sync::Arc;

use newscast_bridge::{StyleId, TabId};
use newscast_store::{
    FileStore, MemoryStore, PersistedSnapshot, SharedStore, SnapshotKey, StateStore,
};

#[tokio::test]
async fn unwritten_keys_read_back_empty() {
    let store = MemoryStore::new();
    let snapshot = store.get(&SnapshotKey::ALL).await.unwrap();
    assert_eq!(snapshot, PersistedSnapshot::default());
}

#[tokio::test]
async fn writers_of_different_keys_do_not_clobber_each_other() {
    let store: SharedStore = Arc::new(MemoryStore::new());

    store.set(PersistedSnapshot::style(StyleId::Funny)).await.unwrap();
    store
        .set(PersistedSnapshot::playback(TabId(3), true, false))
        .await
        .unwrap();

    let snapshot = store.get(&SnapshotKey::ALL).await.unwrap();
    assert_eq!(snapshot.selected_style, Some(StyleId::Funny));
    assert_eq!(snapshot.is_playing, Some(true));
    assert_eq!(snapshot.active_tab_id, Some(TabId(3)));
}

#[tokio::test]
async fn last_write_wins_per_key() {
    let store = MemoryStore::new();
    store
        .set(PersistedSnapshot::playback(TabId(1), true, false))
        .await
        .unwrap();
    store
        .set(PersistedSnapshot::playback(TabId(2), false, true))
        .await
        .unwrap();

    let snapshot = store
        .get(&[SnapshotKey::ActiveTabId, SnapshotKey::IsPlaying])
        .await
        .unwrap();
    assert_eq!(snapshot.active_tab_id, Some(TabId(2)));
    assert_eq!(snapshot.is_playing, Some(false));
    assert_eq!(snapshot.is_loading, None);
}

#[tokio::test]
async fn file_store_survives_reopening() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state").join("session.toml");

    {
        let store = FileStore::open(&path).await.unwrap();
        store.set(PersistedSnapshot::style(StyleId::Rap)).await.unwrap();
        store
            .set(PersistedSnapshot {
                is_loading: Some(true),
                active_tab_id: Some(TabId(12)),
                ..PersistedSnapshot::default()
            })
            .await
            .unwrap();
    }

    let reopened = FileStore::open(&path).await.unwrap();
    let snapshot = reopened.get(&SnapshotKey::ALL).await.unwrap();
    assert_eq!(snapshot.selected_style, Some(StyleId::Rap));
    assert_eq!(snapshot.is_loading, Some(true));
    assert_eq!(snapshot.active_tab_id, Some(TabId(12)));
    assert_eq!(snapshot.is_playing, None);
}

#[tokio::test]
async fn file_store_rejects_corrupt_files() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.toml");
    std::fs::write(&path, "selectedStyle = \"Opera\"\n").unwrap();

    assert!(FileStore::open(&path).await.is_err());
}

#[tokio::test]
async fn file_stores_sharing_a_path_keep_each_others_keys() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.toml");
    let panel = FileStore::open(&path).await.unwrap();
    let other_process = FileStore::open(&path).await.unwrap();

    panel.set(PersistedSnapshot::style(StyleId::Rap)).await.unwrap();
    other_process
        .set(PersistedSnapshot::playback(TabId(2), true, false))
        .await
        .unwrap();

    let expected = PersistedSnapshot {
        is_playing: Some(true),
        is_loading: Some(false),
        active_tab_id: Some(TabId(2)),
        selected_style: Some(StyleId::Rap),
    };
    assert_eq!(panel.get(&SnapshotKey::ALL).await.unwrap(), expected);
    let reopened = FileStore::open(&path).await.unwrap();
    assert_eq!(reopened.get(&SnapshotKey::ALL).await.unwrap(), expected);
}

#[tokio::test]
async fn file_store_leaves_no_staging_files() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.toml");
    let store = FileStore::open(&path).await.unwrap();
    store.set(PersistedSnapshot::style(StyleId::Casual)).await.unwrap();
    store.set(PersistedSnapshot::style(StyleId::Poetic)).await.unwrap();

    let entries: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|entry| entry.unwrap().file_name())
        .collect();
    assert_eq!(entries, vec![std::ffi::OsString::from("session.toml")]);
}

#[tokio::test]
async fn new_session_forgets_playback_but_keeps_style() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.toml");
    {
        let previous = FileStore::open(&path).await.unwrap();
        previous.set(PersistedSnapshot::style(StyleId::Funny)).await.unwrap();
        previous
            .set(PersistedSnapshot::playback(TabId(1), true, true))
            .await
            .unwrap();
    }

    let store = FileStore::open_session(&path).await.unwrap();
    let snapshot = store.get(&SnapshotKey::ALL).await.unwrap();
    assert_eq!(snapshot.is_playing, Some(false));
    assert_eq!(snapshot.is_loading, Some(false));
    assert_eq!(snapshot.selected_style, Some(StyleId::Funny));
}
