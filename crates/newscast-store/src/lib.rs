//! Durable playback snapshot shared by every execution context.
//!
//! The store is a plain key-value map with last-write-wins semantics per
//! key. Writers from different contexts never coordinate: every write
//! replaces the keys it carries and nothing else.

mod file;
mod memory;
pub mod snapshot;

use std::sync::Arc;

pub use crate::file::FileStore;
pub use crate::memory::MemoryStore;
pub use crate::snapshot::{PersistedSnapshot, SnapshotKey};

/// Errors that can occur while reading or writing a persisted snapshot.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// An I/O error occurred while reading or writing the snapshot file.
    #[error("failed to access snapshot file: {0}")]
    IoError(#[from] std::io::Error),
    /// The snapshot file contains invalid TOML or unknown values.
    #[error("failed to deserialize snapshot: {0}")]
    DeserializeError(#[from] toml::de::Error),
    #[error("failed to serialize snapshot: {0}")]
    SerializeError(#[from] toml::ser::Error),
}

/// Key-addressed access to the persisted snapshot.
#[async_trait::async_trait]
pub trait StateStore: Send + Sync {
    /// Read the requested keys. Keys never written come back empty.
    async fn get(&self, keys: &[SnapshotKey]) -> Result<PersistedSnapshot, StoreError>;

    /// Overwrite the keys present in `partial`, leaving the others untouched.
    async fn set(&self, partial: PersistedSnapshot) -> Result<(), StoreError>;
}

/// Store handle shared between the panel and whoever hosts it.
pub type SharedStore = Arc<dyn StateStore>;
