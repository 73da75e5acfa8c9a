//! Library access for queue construction.

use async_trait::async_trait;
use core_library::{LibraryStore, Song};

/// Songs the engine falls back to when `play_song` has neither a source
/// playlist nor an existing queue.
#[async_trait]
pub trait SongCatalog: Send + Sync {
    /// Every song in the library, de-duplicated by id.
    async fn all_songs(&self) -> Vec<Song>;
}

#[async_trait]
impl SongCatalog for LibraryStore {
    async fn all_songs(&self) -> Vec<Song> {
        LibraryStore::all_songs(self).await
    }
}

/// A fixed song list.
#[async_trait]
impl SongCatalog for Vec<Song> {
    async fn all_songs(&self) -> Vec<Song> {
        self.clone()
    }
}
