use tokio::sync::RwLock;

use crate::{PersistedSnapshot, SnapshotKey, StateStore, StoreError};

/// Session-scoped store kept in memory only.
#[derive(Debug, Default)]
pub struct MemoryStore {
    snapshot: RwLock<PersistedSnapshot>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl StateStore for MemoryStore {
    async fn get(&self, keys: &[SnapshotKey]) -> Result<PersistedSnapshot, StoreError> {
        Ok(self.snapshot.read().await.select(keys))
    }

    async fn set(&self, partial: PersistedSnapshot) -> Result<(), StoreError> {
        log::debug!("Storing {:?}", partial.keys());
        self.snapshot.write().await.merge(partial);
        Ok(())
    }
}
