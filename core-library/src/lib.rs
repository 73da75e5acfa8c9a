//! # Library Management Module
//!
//! Durable playlist and song storage for the player core.
//!
//! ## Overview
//!
//! - **Metadata tier**: playlist records and song stubs, serialized as JSON in
//!   the host [`SettingsStore`](bridge_traits::storage::SettingsStore)
//! - **Binary tier**: audio payloads, song covers and playlist artwork in
//!   SQLite tables managed by `sqlx` migrations
//! - **[`LibraryStore`]**: the hydrated in-memory view, playlist CRUD, batch
//!   import with per-file skipping, collage regeneration and search
//!
//! Metadata enrichment and image rendering are plugged in through the
//! [`SongEnricher`] and [`CoverRenderer`] traits.

pub mod db;
pub mod error;
pub mod import;
pub mod models;
pub mod repositories;
pub mod store;

pub use error::{LibraryError, Result};
pub use import::{CoverRenderer, EnrichedSong, RenderedImage, SongEnricher};
pub use models::{
    Artwork, ArtworkId, CoverRef, ImportFile, Playlist, PlaylistId, PlaylistRecord, Song,
    SongBlob, SongId, SongStub, UNKNOWN_ALBUM, UNKNOWN_ARTIST, UNTITLED,
};
pub use store::{CoverImage, HydrationReport, ImportReport, LibraryStore, SkippedFile};
