//! Playlist repository over the host settings store

use crate::error::Result;
use crate::models::PlaylistRecord;
use async_trait::async_trait;
use bridge_traits::storage::SettingsStore;
use std::sync::Arc;
use tracing::debug;

/// Settings key holding the serialized playlist list.
pub const PLAYLISTS_KEY: &str = "library.playlists";

/// Metadata-tier storage: the whole playlist list is read and written at once.
#[async_trait]
pub trait PlaylistRepository: Send + Sync {
    /// Load every playlist record in stored order. An absent document is an
    /// empty library.
    async fn load_all(&self) -> Result<Vec<PlaylistRecord>>;

    /// Replace the stored list.
    async fn save_all(&self, playlists: &[PlaylistRecord]) -> Result<()>;
}

/// Playlist records kept as a JSON document in a [`SettingsStore`].
pub struct SettingsPlaylistRepository {
    store: Arc<dyn SettingsStore>,
}

impl SettingsPlaylistRepository {
    pub fn new(store: Arc<dyn SettingsStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl PlaylistRepository for SettingsPlaylistRepository {
    async fn load_all(&self) -> Result<Vec<PlaylistRecord>> {
        match self.store.get_string(PLAYLISTS_KEY).await? {
            Some(json) => {
                let records: Vec<PlaylistRecord> = serde_json::from_str(&json)?;
                debug!(count = records.len(), "Loaded playlist records");
                Ok(records)
            }
            None => Ok(Vec::new()),
        }
    }

    async fn save_all(&self, playlists: &[PlaylistRecord]) -> Result<()> {
        let json = serde_json::to_string(playlists)?;
        self.store.set_string(PLAYLISTS_KEY, &json).await?;
        debug!(count = playlists.len(), "Saved playlist records");
        Ok(())
    }
}
