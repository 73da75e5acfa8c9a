//! Persisted shuffle and repeat preferences.

use crate::error::Result;
use crate::queue::RepeatMode;
use bridge_traits::storage::SettingsStore;
use std::sync::Arc;
use tracing::warn;

pub const SHUFFLE_KEY: &str = "playback.shuffle";
pub const REPEAT_KEY: &str = "playback.repeat";

/// Stored transport modes. Absent keys mean "off".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StoredModes {
    pub shuffled: bool,
    pub repeat: RepeatMode,
}

/// Reads and writes the user's transport modes in the host settings store.
#[derive(Clone)]
pub struct PlaybackPreferences {
    store: Arc<dyn SettingsStore>,
}

impl PlaybackPreferences {
    pub fn new(store: Arc<dyn SettingsStore>) -> Self {
        Self { store }
    }

    pub async fn load(&self) -> Result<StoredModes> {
        let shuffled = self.store.get_bool(SHUFFLE_KEY).await?.unwrap_or(false);
        let repeat = match self.store.get_string(REPEAT_KEY).await? {
            Some(raw) => RepeatMode::parse(&raw).unwrap_or_else(|| {
                warn!(value = %raw, "Ignoring unknown stored repeat mode");
                RepeatMode::None
            }),
            None => RepeatMode::None,
        };
        Ok(StoredModes { shuffled, repeat })
    }

    pub async fn save_shuffle(&self, shuffled: bool) -> Result<()> {
        self.store.set_bool(SHUFFLE_KEY, shuffled).await?;
        Ok(())
    }

    pub async fn save_repeat(&self, mode: RepeatMode) -> Result<()> {
        self.store.set_string(REPEAT_KEY, mode.as_str()).await?;
        Ok(())
    }
}

impl std::fmt::Debug for PlaybackPreferences {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackPreferences").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_desktop::SqliteSettingsStore;

    async fn preferences() -> (PlaybackPreferences, Arc<SqliteSettingsStore>) {
        let store = Arc::new(SqliteSettingsStore::in_memory().await.unwrap());
        (PlaybackPreferences::new(store.clone()), store)
    }

    #[tokio::test]
    async fn test_absent_keys_are_defaults() {
        let (prefs, _) = preferences().await;
        assert_eq!(prefs.load().await.unwrap(), StoredModes::default());
    }

    #[tokio::test]
    async fn test_round_trip() {
        let (prefs, _) = preferences().await;
        prefs.save_shuffle(true).await.unwrap();
        prefs.save_repeat(RepeatMode::Song).await.unwrap();

        let modes = prefs.load().await.unwrap();
        assert!(modes.shuffled);
        assert_eq!(modes.repeat, RepeatMode::Song);
    }

    #[tokio::test]
    async fn test_unknown_repeat_value_falls_back() {
        let (prefs, store) = preferences().await;
        store.set_string(REPEAT_KEY, "forever").await.unwrap();
        assert_eq!(prefs.load().await.unwrap().repeat, RepeatMode::None);
    }
}
