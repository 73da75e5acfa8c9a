//! # Library Store
//!
//! In-memory view of the library backed by two durable tiers:
//!
//! - the **metadata tier** ([`PlaylistRepository`]): playlist records with
//!   song stubs,
//! - the **binary tier** ([`SongBlobRepository`], [`ArtworkRepository`]):
//!   audio payloads, song covers and playlist cover images.
//!
//! [`LibraryStore::hydrate`] joins the two at startup. Every mutation is
//! applied to a copy of the playlist list, persisted, and only then published
//! to readers, so a failed write leaves the in-memory library untouched.
//!
//! ## Import
//!
//! ```rust,ignore
//! let cancel = CancellationToken::new();
//! let report = store
//!     .add_files_to_playlist(playlist.id, files, &cancel)
//!     .await?;
//! println!("{} imported, {} skipped", report.imported.len(), report.skipped.len());
//! ```

use crate::error::{LibraryError, Result};
use crate::import::{CoverRenderer, RenderedImage, SongEnricher};
use crate::models::{
    validate_playlist_name, Artwork, ArtworkId, CoverRef, ImportFile, Playlist, PlaylistId,
    PlaylistRecord, Song, SongBlob, SongId,
};
use crate::repositories::{
    ArtworkRepository, PlaylistRepository, SettingsPlaylistRepository, SongBlobRepository,
    SqliteArtworkRepository, SqliteSongBlobRepository,
};
use bridge_traits::playback::{AudioSource, MetadataLoader};
use bridge_traits::storage::SettingsStore;
use bridge_traits::time::{Clock, SystemClock};
use bytes::Bytes;
use core_runtime::events::{CoreEvent, EnrichmentEvent, EventBus, LibraryEvent};
use core_runtime::logging::strip_path;
use sqlx::SqlitePool;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

/// Prefix of the generated name for playlists saved from the play queue.
pub const QUEUE_PLAYLIST_PREFIX: &str = "My Queue Playlist";

/// Collages use at most this many member covers.
pub const MAX_COLLAGE_TILES: usize = 4;

/// Result of [`LibraryStore::hydrate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HydrationReport {
    pub playlists: usize,
    pub songs: usize,
    /// Stubs whose binary entry was missing.
    pub dropped_songs: usize,
}

/// A file that was not imported, with the reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedFile {
    pub name: String,
    pub reason: String,
}

/// Result of [`LibraryStore::add_files_to_playlist`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportReport {
    pub imported: Vec<SongId>,
    pub skipped: Vec<SkippedFile>,
    pub cancelled: bool,
}

/// Resolved cover image bytes.
#[derive(Debug, Clone, PartialEq)]
pub struct CoverImage {
    pub data: Bytes,
    pub mime_type: String,
}

#[derive(Debug, Default)]
struct LibraryState {
    playlists: Vec<Playlist>,
    loading: bool,
}

/// Durable playlist and song storage with an in-memory hydrated view.
pub struct LibraryStore {
    song_blobs: Arc<dyn SongBlobRepository>,
    artworks: Arc<dyn ArtworkRepository>,
    records: Arc<dyn PlaylistRepository>,
    enricher: Arc<dyn SongEnricher>,
    covers: Arc<dyn CoverRenderer>,
    loader: Arc<dyn MetadataLoader>,
    clock: Arc<dyn Clock>,
    event_bus: Option<EventBus>,
    state: RwLock<LibraryState>,
}

impl LibraryStore {
    /// Create a store from explicit repositories and collaborators.
    pub fn new(
        song_blobs: Arc<dyn SongBlobRepository>,
        artworks: Arc<dyn ArtworkRepository>,
        records: Arc<dyn PlaylistRepository>,
        enricher: Arc<dyn SongEnricher>,
        covers: Arc<dyn CoverRenderer>,
        loader: Arc<dyn MetadataLoader>,
    ) -> Self {
        Self {
            song_blobs,
            artworks,
            records,
            enricher,
            covers,
            loader,
            clock: Arc::new(SystemClock),
            event_bus: None,
            state: RwLock::new(LibraryState::default()),
        }
    }

    /// Create a store over a migrated SQLite pool (binary tier) and a settings
    /// store (metadata tier).
    pub fn open(
        pool: SqlitePool,
        settings: Arc<dyn SettingsStore>,
        enricher: Arc<dyn SongEnricher>,
        covers: Arc<dyn CoverRenderer>,
        loader: Arc<dyn MetadataLoader>,
    ) -> Self {
        Self::new(
            Arc::new(SqliteSongBlobRepository::new(pool.clone())),
            Arc::new(SqliteArtworkRepository::new(pool)),
            Arc::new(SettingsPlaylistRepository::new(settings)),
            enricher,
            covers,
            loader,
        )
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_event_bus(mut self, event_bus: EventBus) -> Self {
        self.event_bus = Some(event_bus);
        self
    }

    fn emit(&self, event: CoreEvent) {
        if let Some(bus) = &self.event_bus {
            bus.emit(event).ok();
        }
    }

    fn emit_updated(&self, playlist_id: PlaylistId, change_type: &str) {
        self.emit(CoreEvent::Library(LibraryEvent::PlaylistUpdated {
            playlist_id: playlist_id.to_string(),
            change_type: change_type.to_string(),
        }));
    }

    // =========================================================================
    // Loading
    // =========================================================================

    /// Load every playlist and join its stubs with their binary entries.
    ///
    /// Stubs without a binary entry are dropped from the in-memory playlist
    /// and removed from the metadata tier by the next write. Any other storage
    /// failure aborts the load and leaves the library empty.
    #[instrument(skip(self))]
    pub async fn hydrate(&self) -> Result<HydrationReport> {
        self.state.write().await.loading = true;

        match self.load_playlists().await {
            Ok((playlists, report)) => {
                let mut state = self.state.write().await;
                state.playlists = playlists;
                state.loading = false;
                drop(state);

                info!(
                    playlists = report.playlists,
                    songs = report.songs,
                    dropped_songs = report.dropped_songs,
                    "Library hydrated"
                );
                self.emit(CoreEvent::Library(LibraryEvent::Hydrated {
                    playlist_count: report.playlists as u32,
                    song_count: report.songs as u32,
                    dropped_songs: report.dropped_songs as u32,
                }));
                Ok(report)
            }
            Err(e) => {
                let mut state = self.state.write().await;
                state.playlists.clear();
                state.loading = false;
                drop(state);

                warn!(error = %e, "Library failed to load");
                self.emit(CoreEvent::Library(LibraryEvent::LoadFailed {
                    message: e.to_string(),
                }));
                Err(LibraryError::StorageUnavailable(e.to_string()))
            }
        }
    }

    async fn load_playlists(&self) -> Result<(Vec<Playlist>, HydrationReport)> {
        let records = self.records.load_all().await?;
        let mut report = HydrationReport {
            playlists: records.len(),
            ..HydrationReport::default()
        };
        let mut playlists = Vec::with_capacity(records.len());

        for record in records {
            let mut songs = Vec::with_capacity(record.songs.len());
            for stub in &record.songs {
                match self.song_blobs.get(stub.id).await {
                    Ok(blob) => songs.push(Song::hydrate(stub, blob)),
                    Err(LibraryError::BlobMissing { song_id }) => {
                        warn!(
                            playlist_id = %record.id,
                            song_id = %song_id,
                            "Dropping song with missing audio"
                        );
                        report.dropped_songs += 1;
                    }
                    Err(e) => return Err(e),
                }
            }
            report.songs += songs.len();
            playlists.push(Playlist {
                id: record.id,
                name: record.name,
                cover: record.cover,
                songs,
            });
        }

        Ok((playlists, report))
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// All playlists in stored order.
    pub async fn playlists(&self) -> Vec<Playlist> {
        self.state.read().await.playlists.clone()
    }

    pub async fn playlist(&self, id: PlaylistId) -> Option<Playlist> {
        self.state
            .read()
            .await
            .playlists
            .iter()
            .find(|p| p.id == id)
            .cloned()
    }

    /// `true` while hydration or an import batch is running.
    pub async fn is_loading(&self) -> bool {
        self.state.read().await.loading
    }

    /// Every song across playlists, first occurrence wins.
    pub async fn all_songs(&self) -> Vec<Song> {
        let state = self.state.read().await;
        let mut seen = HashSet::new();
        state
            .playlists
            .iter()
            .flat_map(|p| p.songs.iter())
            .filter(|s| seen.insert(s.id))
            .cloned()
            .collect()
    }

    /// Unique songs whose title, artist or album contains `query`, ignoring
    /// case. A blank query matches nothing.
    pub async fn search(&self, query: &str) -> Vec<Song> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }
        self.all_songs()
            .await
            .into_iter()
            .filter(|s| s.matches(&needle))
            .collect()
    }

    /// Resolve a cover reference to image bytes, falling back to the rendered
    /// placeholder when the referenced art no longer exists.
    pub async fn cover_image(&self, cover: CoverRef) -> Result<CoverImage> {
        match cover {
            CoverRef::Song(song_id) => {
                if let Some(blob) = self.song_blobs.find_by_id(song_id).await? {
                    if let Some(data) = blob.cover {
                        return Ok(CoverImage {
                            data,
                            mime_type: blob
                                .cover_mime_type
                                .unwrap_or_else(|| "image/jpeg".to_string()),
                        });
                    }
                }
            }
            CoverRef::Collage(id) | CoverRef::Custom(id) => {
                if let Some(artwork) = self.artworks.find_by_id(id).await? {
                    return Ok(CoverImage {
                        data: artwork.data,
                        mime_type: artwork.mime_type,
                    });
                }
            }
            CoverRef::Placeholder => {}
        }

        let placeholder = self.covers.placeholder()?;
        Ok(CoverImage {
            data: placeholder.data,
            mime_type: placeholder.mime_type,
        })
    }

    // =========================================================================
    // Playlist CRUD
    // =========================================================================

    /// Create an empty playlist with the placeholder cover.
    #[instrument(skip(self))]
    pub async fn create_playlist(&self, name: &str) -> Result<Playlist> {
        let name = validate_playlist_name(name).map_err(|message| LibraryError::InvalidInput {
            field: "name".to_string(),
            message,
        })?;
        let playlist = Playlist::new(name);

        let mut state = self.state.write().await;
        let mut next = state.playlists.clone();
        next.push(playlist.clone());
        self.persist(&next).await?;
        state.playlists = next;
        drop(state);

        info!(playlist_id = %playlist.id, name = %playlist.name, "Playlist created");
        self.emit(CoreEvent::Library(LibraryEvent::PlaylistCreated {
            playlist_id: playlist.id.to_string(),
            name: playlist.name.clone(),
        }));
        Ok(playlist)
    }

    pub async fn rename_playlist(&self, id: PlaylistId, name: &str) -> Result<()> {
        let name = validate_playlist_name(name).map_err(|message| LibraryError::InvalidInput {
            field: "name".to_string(),
            message,
        })?;

        let mut state = self.state.write().await;
        let mut next = state.playlists.clone();
        let playlist = find_mut(&mut next, id)?;
        playlist.name = name;
        self.persist(&next).await?;
        state.playlists = next;
        drop(state);

        self.emit_updated(id, "renamed");
        Ok(())
    }

    /// Point the playlist at a different cover.
    ///
    /// Artwork owned by the replaced reference is deleted.
    pub async fn update_playlist_cover(&self, id: PlaylistId, cover: CoverRef) -> Result<()> {
        if let Some(artwork_id) = cover.owned_artwork() {
            if self.artworks.find_by_id(artwork_id).await?.is_none() {
                return Err(LibraryError::not_found("artwork", artwork_id));
            }
        }

        let mut state = self.state.write().await;
        let mut next = state.playlists.clone();
        let playlist = find_mut(&mut next, id)?;
        let previous = std::mem::replace(&mut playlist.cover, cover);
        self.persist(&next).await?;
        state.playlists = next;
        drop(state);

        if previous != cover {
            self.release_artwork(previous).await;
        }
        self.emit_updated(id, "cover_updated");
        Ok(())
    }

    /// Store a user-supplied image and make it the playlist cover.
    ///
    /// Custom covers are never replaced by collage regeneration.
    pub async fn set_custom_cover(&self, id: PlaylistId, data: Bytes) -> Result<CoverRef> {
        if self.playlist(id).await.is_none() {
            return Err(LibraryError::not_found("playlist", id));
        }

        let image = self.covers.inspect(&data)?;
        let artwork_id = self.store_artwork(image).await?;
        let cover = CoverRef::Custom(artwork_id);

        if let Err(e) = self.update_playlist_cover(id, cover).await {
            self.release_artwork(cover).await;
            return Err(e);
        }
        Ok(cover)
    }

    /// Remove a playlist record. Song blobs are kept; the playlist's own
    /// artwork is deleted.
    #[instrument(skip(self))]
    pub async fn delete_playlist(&self, id: PlaylistId) -> Result<()> {
        let mut state = self.state.write().await;
        let mut next = state.playlists.clone();
        let position = next
            .iter()
            .position(|p| p.id == id)
            .ok_or_else(|| LibraryError::not_found("playlist", id))?;
        let removed = next.remove(position);
        self.persist(&next).await?;
        state.playlists = next;
        drop(state);

        self.release_artwork(removed.cover).await;
        info!(playlist_id = %id, songs = removed.songs.len(), "Playlist deleted");
        self.emit(CoreEvent::Library(LibraryEvent::PlaylistDeleted {
            playlist_id: id.to_string(),
        }));
        Ok(())
    }

    // =========================================================================
    // Songs
    // =========================================================================

    /// Import `files` into a playlist.
    ///
    /// Files are processed one at a time: probe duration, enrich, write the
    /// binary entry. Files that cannot be imported are skipped with a reason.
    /// The playlist record changes once, after the whole batch. Cancelling
    /// `cancel` skips the files not yet started; songs already written are
    /// still added.
    #[instrument(skip(self, files, cancel), fields(playlist_id = %playlist_id, files = files.len()))]
    pub async fn add_files_to_playlist(
        &self,
        playlist_id: PlaylistId,
        files: Vec<ImportFile>,
        cancel: &CancellationToken,
    ) -> Result<ImportReport> {
        if self.playlist(playlist_id).await.is_none() {
            return Err(LibraryError::not_found("playlist", playlist_id));
        }

        self.state.write().await.loading = true;
        let mut report = ImportReport::default();
        let mut songs = Vec::new();

        for file in files {
            if cancel.is_cancelled() {
                report.cancelled = true;
                report.skipped.push(SkippedFile {
                    name: file.name,
                    reason: "import cancelled".to_string(),
                });
                continue;
            }

            match self.import_file(&file).await {
                Ok(song) => {
                    self.emit(CoreEvent::Library(LibraryEvent::SongImported {
                        song_id: song.id.to_string(),
                        playlist_id: playlist_id.to_string(),
                        title: song.title.clone(),
                        artist: song.artist.clone(),
                    }));
                    report.imported.push(song.id);
                    songs.push(song);
                }
                Err(reason) => {
                    let file_name = strip_path(&file.name);
                    warn!(file = %file_name, reason = %reason, "Skipping file");
                    self.emit(CoreEvent::Library(LibraryEvent::ImportSkipped {
                        file_name: file_name.to_string(),
                        reason: reason.clone(),
                    }));
                    report.skipped.push(SkippedFile {
                        name: file.name,
                        reason,
                    });
                }
            }
        }

        let result = self.append_songs(playlist_id, songs).await;
        self.state.write().await.loading = false;
        result?;

        info!(
            imported = report.imported.len(),
            skipped = report.skipped.len(),
            cancelled = report.cancelled,
            "Import finished"
        );
        self.emit(CoreEvent::Library(LibraryEvent::ImportCompleted {
            playlist_id: playlist_id.to_string(),
            imported: report.imported.len() as u32,
            skipped: report.skipped.len() as u32,
            cancelled: report.cancelled,
        }));
        Ok(report)
    }

    /// Store one file's binary entry. The error is the skip reason.
    async fn import_file(&self, file: &ImportFile) -> std::result::Result<Song, String> {
        if !file.is_audio() {
            return Err(format!("unsupported media type '{}'", file.mime_type));
        }
        if file.data.is_empty() {
            return Err("file is empty".to_string());
        }

        let duration = match self
            .loader
            .probe_duration(&file.data, &file.mime_type)
            .await
        {
            Ok(d) if d.is_finite() && d >= 0.0 => d,
            Ok(d) => {
                warn!(
                    file = %strip_path(&file.name),
                    duration = d,
                    "Probe returned invalid duration"
                );
                0.0
            }
            Err(e) => {
                warn!(file = %strip_path(&file.name), error = %e, "Failed to probe duration");
                0.0
            }
        };

        let mut enriched = self.enricher.enrich(file).await;
        if enriched.title.trim().is_empty() {
            enriched.title = file.fallback_title().to_string();
        }
        let blob = SongBlob {
            id: SongId::new(),
            audio: file.data.clone(),
            mime_type: file.mime_type.clone(),
            cover: enriched.cover,
            cover_mime_type: enriched.cover_mime_type,
            duration,
            title: enriched.title,
            artist: enriched.artist,
            album: enriched.album,
            created_at: self.clock.unix_timestamp(),
        };

        self.song_blobs
            .insert(&blob)
            .await
            .map_err(|e| format!("failed to store audio: {e}"))?;
        debug!(song_id = %blob.id, title = %blob.title, duration, "Stored song blob");

        let cover = if blob.cover.is_some() {
            CoverRef::Song(blob.id)
        } else {
            CoverRef::Placeholder
        };
        Ok(Song {
            id: blob.id,
            title: blob.title,
            artist: blob.artist,
            album: blob.album,
            duration: blob.duration,
            audio: AudioSource::MemoryBuffer { data: blob.audio },
            cover,
            cover_art: blob.cover,
            lyrics: None,
        })
    }

    async fn append_songs(&self, playlist_id: PlaylistId, songs: Vec<Song>) -> Result<()> {
        if songs.is_empty() {
            return Ok(());
        }

        let mut state = self.state.write().await;
        let mut next = state.playlists.clone();
        let playlist = match next.iter_mut().find(|p| p.id == playlist_id) {
            Some(p) => p,
            None => {
                warn!(
                    playlist_id = %playlist_id,
                    songs = songs.len(),
                    "Playlist deleted during import; stored songs are unreferenced"
                );
                return Err(LibraryError::not_found("playlist", playlist_id));
            }
        };
        playlist.songs.extend(songs);
        let replaced = self.refresh_cover(playlist).await;
        self.persist(&next).await?;
        state.playlists = next;
        drop(state);

        if let Some(old) = replaced {
            self.release_artwork(old).await;
        }
        self.emit_updated(playlist_id, "songs_added");
        Ok(())
    }

    /// Append an existing song (duplicates allowed) and refresh the cover.
    pub async fn add_song_to_existing_playlist(
        &self,
        playlist_id: PlaylistId,
        song: &Song,
    ) -> Result<()> {
        self.append_songs(playlist_id, vec![song.clone()]).await
    }

    /// Remove every occurrence of a song from a playlist. The blob is kept.
    pub async fn remove_song_from_playlist(
        &self,
        playlist_id: PlaylistId,
        song_id: SongId,
    ) -> Result<()> {
        let mut state = self.state.write().await;
        let mut next = state.playlists.clone();
        let playlist = find_mut(&mut next, playlist_id)?;
        let before = playlist.songs.len();
        playlist.songs.retain(|s| s.id != song_id);
        if playlist.songs.len() == before {
            return Err(LibraryError::not_found("song", song_id));
        }
        let replaced = self.refresh_cover(playlist).await;
        self.persist(&next).await?;
        state.playlists = next;
        drop(state);

        if let Some(old) = replaced {
            self.release_artwork(old).await;
        }
        self.emit_updated(playlist_id, "song_removed");
        Ok(())
    }

    /// Set lyrics on every occurrence of a song.
    pub async fn update_song_lyrics(&self, song_id: SongId, lyrics: &str) -> Result<()> {
        let mut state = self.state.write().await;
        let mut next = state.playlists.clone();
        let mut touched = Vec::new();
        for playlist in next.iter_mut() {
            let mut changed = false;
            for song in playlist.songs.iter_mut().filter(|s| s.id == song_id) {
                song.lyrics = Some(lyrics.to_string());
                changed = true;
            }
            if changed {
                touched.push(playlist.id);
            }
        }
        if touched.is_empty() {
            return Err(LibraryError::not_found("song", song_id));
        }
        self.persist(&next).await?;
        state.playlists = next;
        drop(state);

        for id in touched {
            self.emit_updated(id, "lyrics_updated");
        }
        Ok(())
    }

    /// Save `songs` (the active queue, in order) as a new playlist.
    ///
    /// Without a name the playlist is called `My Queue Playlist N`, where N is
    /// one more than the number of playlists already using that prefix. The
    /// cover is the first song's cover.
    pub async fn save_queue_as_playlist(
        &self,
        songs: Vec<Song>,
        name: Option<&str>,
    ) -> Result<Playlist> {
        let first = songs.first().ok_or_else(|| LibraryError::InvalidInput {
            field: "songs".to_string(),
            message: "Queue is empty".to_string(),
        })?;
        let cover = match first.cover {
            CoverRef::Song(id) => CoverRef::Song(id),
            _ => CoverRef::Placeholder,
        };

        let mut state = self.state.write().await;
        let name = match name {
            Some(n) => validate_playlist_name(n).map_err(|message| {
                LibraryError::InvalidInput {
                    field: "name".to_string(),
                    message,
                }
            })?,
            None => {
                let existing = state
                    .playlists
                    .iter()
                    .filter(|p| p.name.starts_with(QUEUE_PLAYLIST_PREFIX))
                    .count();
                format!("{} {}", QUEUE_PLAYLIST_PREFIX, existing + 1)
            }
        };

        let playlist = Playlist {
            id: PlaylistId::new(),
            name,
            cover,
            songs,
        };
        let mut next = state.playlists.clone();
        next.push(playlist.clone());
        self.persist(&next).await?;
        state.playlists = next;
        drop(state);

        info!(playlist_id = %playlist.id, songs = playlist.songs.len(), "Queue saved as playlist");
        self.emit(CoreEvent::Library(LibraryEvent::PlaylistCreated {
            playlist_id: playlist.id.to_string(),
            name: playlist.name.clone(),
        }));
        Ok(playlist)
    }

    // =========================================================================
    // Covers
    // =========================================================================

    /// Regenerate the collage when the playlist still shows the placeholder or
    /// is small. Returns the replaced cover when it owned artwork.
    async fn refresh_cover(&self, playlist: &mut Playlist) -> Option<CoverRef> {
        if matches!(playlist.cover, CoverRef::Custom(_)) {
            return None;
        }
        if !(playlist.cover.is_placeholder() || playlist.songs.len() <= MAX_COLLAGE_TILES) {
            return None;
        }

        let tiles = collage_tiles(&playlist.songs);
        if tiles.is_empty() && playlist.cover.is_placeholder() {
            return None;
        }
        let cover = if tiles.is_empty() {
            CoverRef::Placeholder
        } else {
            let rendered = match self.covers.render_collage(&tiles) {
                Ok(image) => image,
                Err(e) => {
                    warn!(playlist_id = %playlist.id, error = %e, "Collage rendering failed");
                    return None;
                }
            };
            match self.store_artwork(rendered).await {
                Ok(id) => CoverRef::Collage(id),
                Err(e) => {
                    warn!(playlist_id = %playlist.id, error = %e, "Failed to store collage");
                    return None;
                }
            }
        };

        debug!(playlist_id = %playlist.id, tiles = tiles.len(), "Playlist cover refreshed");
        self.emit(CoreEvent::Enrichment(EnrichmentEvent::CoverSynthesized {
            playlist_id: playlist.id.to_string(),
            tiles: tiles.len() as u32,
        }));

        let previous = std::mem::replace(&mut playlist.cover, cover);
        previous.owned_artwork().map(|_| previous)
    }

    async fn store_artwork(&self, image: RenderedImage) -> Result<ArtworkId> {
        let artwork = Artwork {
            id: ArtworkId::new(),
            data: image.data,
            mime_type: image.mime_type,
            width: image.width,
            height: image.height,
            created_at: self.clock.unix_timestamp(),
        };
        self.artworks.insert(&artwork).await?;
        Ok(artwork.id)
    }

    async fn release_artwork(&self, cover: CoverRef) {
        if let Some(id) = cover.owned_artwork() {
            if let Err(e) = self.artworks.delete(id).await {
                warn!(artwork_id = %id, error = %e, "Failed to delete replaced artwork");
            }
        }
    }

    async fn persist(&self, playlists: &[Playlist]) -> Result<()> {
        let records: Vec<PlaylistRecord> = playlists.iter().map(Playlist::record).collect();
        self.records.save_all(&records).await
    }
}

fn find_mut(playlists: &mut [Playlist], id: PlaylistId) -> Result<&mut Playlist> {
    playlists
        .iter_mut()
        .find(|p| p.id == id)
        .ok_or_else(|| LibraryError::not_found("playlist", id))
}

/// Up to four distinct song covers, in playlist order.
fn collage_tiles(songs: &[Song]) -> Vec<Bytes> {
    let mut seen = HashSet::new();
    let mut tiles = Vec::new();
    for song in songs {
        let Some(art) = &song.cover_art else {
            continue;
        };
        if seen.insert(art.clone()) {
            tiles.push(art.clone());
            if tiles.len() == MAX_COLLAGE_TILES {
                break;
            }
        }
    }
    tiles
}
