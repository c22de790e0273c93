use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::atomic::{AtomicU64, Ordering},
};

use tokio::{
    fs::{OpenOptions, create_dir_all, read_to_string, remove_file, rename},
    io::AsyncWriteExt,
    sync::Mutex,
};

use crate::{PersistedSnapshot, SnapshotKey, StateStore, StoreError};

static STAGING_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Store persisted as a TOML file that several processes may share.
///
/// The file is the only source of truth: reads go to disk, and a write
/// merges its keys into what is on disk at that moment, then atomically
/// replaces the file. Keys written by another process in between are kept.
/// Two processes writing at the very same instant may still lose one of the
/// two writes; the file itself is never left half written.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    /// Serializes writers of this process.
    writing: Mutex<()>,
}

impl FileStore {
    /// Opens the store at `path`, checking that an existing file is readable.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        log::info!("Using playback snapshot at {path:?}");

        let store = Self {
            path,
            writing: Mutex::new(()),
        };
        store.load().await?;
        Ok(store)
    }

    /// Opens the store for a new session.
    ///
    /// Playback flags are only meaningful while the session that wrote them
    /// runs, so they are reset; the style preference is kept.
    pub async fn open_session(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let store = Self::open(path).await?;
        store
            .set(PersistedSnapshot {
                is_playing: Some(false),
                is_loading: Some(false),
                ..PersistedSnapshot::default()
            })
            .await?;
        log::debug!("Cleared playback flags of the previous session");
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<PersistedSnapshot, StoreError> {
        match read_to_string(&self.path).await {
            Ok(contents) => Ok(toml::from_str(&contents)?),
            Err(error) if error.kind() == ErrorKind::NotFound => Ok(PersistedSnapshot::default()),
            Err(error) => Err(error.into()),
        }
    }

    async fn replace(&self, snapshot: &PersistedSnapshot) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            create_dir_all(parent).await?;
        }

        let contents = toml::to_string_pretty(snapshot)?;
        let staging = self.staging_path();
        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&staging)
            .await?;
        file.write_all(contents.as_bytes()).await?;
        file.sync_all().await?;
        drop(file);

        if let Err(error) = rename(&staging, &self.path).await {
            let _ = remove_file(&staging).await;
            return Err(error.into());
        }
        Ok(())
    }

    fn staging_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        let unique = STAGING_COUNTER.fetch_add(1, Ordering::Relaxed);
        name.push(format!(".{}-{unique}.tmp", std::process::id()));
        self.path.with_file_name(name)
    }
}

#[async_trait::async_trait]
impl StateStore for FileStore {
    async fn get(&self, keys: &[SnapshotKey]) -> Result<PersistedSnapshot, StoreError> {
        Ok(self.load().await?.select(keys))
    }

    async fn set(&self, partial: PersistedSnapshot) -> Result<(), StoreError> {
        let _writing = self.writing.lock().await;
        log::debug!("Storing {:?} to {:?}", partial.keys(), self.path);

        let mut snapshot = self.load().await?;
        snapshot.merge(partial);
        self.replace(&snapshot).await
    }
}
