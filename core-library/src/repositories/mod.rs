//! # Repositories
//!
//! Storage access for the two library tiers.
//!
//! - [`SongBlobRepository`]: binary tier, one row per imported song keyed by
//!   song id (audio payload, cover, duration).
//! - [`ArtworkRepository`]: synthesized collages and user-chosen covers.
//! - [`PlaylistRepository`]: metadata tier, the playlist list with song stubs,
//!   kept as one JSON document in the host settings store.

pub mod artwork;
pub mod playlist;
pub mod song_blob;

pub use artwork::{ArtworkRepository, SqliteArtworkRepository};
pub use playlist::{PlaylistRepository, SettingsPlaylistRepository, PLAYLISTS_KEY};
pub use song_blob::{SongBlobRepository, SqliteSongBlobRepository};
