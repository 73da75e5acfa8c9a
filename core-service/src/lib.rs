//! Core service façade and bootstrap helpers.
//!
//! [`MusicSession`] wires host-provided bridges (HTTP, settings store, media
//! surface) into the library store, the enrichment pipeline, the playback
//! engine and the lyrics service, all sharing one event bus. There is no
//! global instance: a host creates a session at startup and keeps it.
//!
//! Desktop hosts can enable the `desktop-shims` feature and use
//! [`bootstrap_desktop`], which builds the HTTP client and settings store from
//! `bridge-desktop`.
//!
//! ```ignore
//! let config = CoreConfig::builder()
//!     .database_path(data_dir.join("library.db"))
//!     .lyrics_api_key(std::env::var("GEMINI_API_KEY").ok())
//!     .build()?;
//! let session = MusicSession::start(config, CoreDependencies::new(http, settings, surface)).await?;
//!
//! let playlist = session.library().create_playlist("Road trip").await?;
//! session.play_playlist(playlist.id, false).await?;
//! ```

pub mod error;

pub use error::{Result, ServiceError};

use std::sync::Arc;

use bridge_traits::{
    http::HttpClient,
    playback::{MediaSurface, MetadataLoader},
    storage::SettingsStore,
};
use core_library::db::{create_pool, DatabaseConfig};
use core_library::{ImportFile, ImportReport, LibraryStore, Playlist, PlaylistId, SongId};
use core_metadata::{
    CollageRenderer, EnrichmentPipeline, GeminiTextService, ITunesLookup, LoftyTagReader,
    LyricsQuery, LyricsService, TextOutcome,
};
use core_playback::{PlaybackEngine, PlaybackPreferences};
use core_runtime::config::CoreConfig;
use core_runtime::events::{CoreEvent, EventBus, Receiver};
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

/// Aggregated handle to the bridge implementations a session requires.
#[derive(Clone)]
pub struct CoreDependencies {
    pub http_client: Arc<dyn HttpClient>,
    pub settings_store: Arc<dyn SettingsStore>,
    pub media_surface: Arc<dyn MediaSurface>,
    pub metadata_loader: Arc<dyn MetadataLoader>,
}

impl CoreDependencies {
    /// Bundle explicit bridge handles. Durations are probed with the built-in
    /// tag reader unless [`with_metadata_loader`](Self::with_metadata_loader)
    /// replaces it.
    pub fn new(
        http_client: Arc<dyn HttpClient>,
        settings_store: Arc<dyn SettingsStore>,
        media_surface: Arc<dyn MediaSurface>,
    ) -> Self {
        Self {
            http_client,
            settings_store,
            media_surface,
            metadata_loader: Arc::new(LoftyTagReader::new()),
        }
    }

    pub fn with_metadata_loader(mut self, loader: Arc<dyn MetadataLoader>) -> Self {
        self.metadata_loader = loader;
        self
    }
}

/// One running player: library, playback and lyrics behind a single handle.
#[derive(Clone)]
pub struct MusicSession {
    config: Arc<CoreConfig>,
    library: Arc<LibraryStore>,
    playback: Arc<PlaybackEngine>,
    lyrics: Arc<LyricsService>,
    event_bus: EventBus,
}

impl MusicSession {
    /// Open storage, load the library and restore playback preferences.
    ///
    /// A library that fails to load leaves the session running with an empty
    /// library; a database that cannot be opened at all fails the start.
    #[instrument(skip(config, deps))]
    pub async fn start(config: CoreConfig, deps: CoreDependencies) -> Result<Self> {
        config.validate()?;
        let event_bus = EventBus::new(config.event_buffer_size);

        let db_config = match &config.database_path {
            Some(path) => DatabaseConfig::new(path.clone()),
            None => DatabaseConfig::in_memory(),
        };
        let pool = create_pool(db_config)
            .await
            .map_err(|e| ServiceError::InitializationFailed(e.to_string()))?;

        let tags = Arc::new(LoftyTagReader::new());
        let remote = Arc::new(ITunesLookup::new(deps.http_client.clone()));
        let pipeline = EnrichmentPipeline::from_config(&config, tags, remote)
            .with_event_bus(event_bus.clone());

        let library = Arc::new(
            LibraryStore::open(
                pool,
                deps.settings_store.clone(),
                Arc::new(pipeline),
                Arc::new(CollageRenderer::new()),
                deps.metadata_loader.clone(),
            )
            .with_event_bus(event_bus.clone()),
        );
        if let Err(e) = library.hydrate().await {
            warn!(error = %e, "Starting with an empty library");
        }

        let playback = Arc::new(
            PlaybackEngine::new(deps.media_surface.clone(), library.clone())
                .with_preferences(PlaybackPreferences::new(deps.settings_store.clone()))
                .with_event_bus(event_bus.clone()),
        );
        if let Err(e) = playback.restore_preferences().await {
            warn!(error = %e, "Could not restore playback preferences");
        }

        let provider = Arc::new(GeminiTextService::new(
            deps.http_client.clone(),
            config.lyrics.clone(),
        ));
        let lyrics = Arc::new(
            LyricsService::new(provider)
                .with_enabled(config.features.enable_lyrics)
                .with_lookup_timeout(config.lookup_timeout()),
        );

        info!(
            in_memory = config.database_path.is_none(),
            remote_lookup = config.features.enable_remote_lookup,
            lyrics = config.features.enable_lyrics,
            "Session started"
        );

        Ok(Self {
            config: Arc::new(config),
            library,
            playback,
            lyrics,
            event_bus,
        })
    }

    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    pub fn library(&self) -> &Arc<LibraryStore> {
        &self.library
    }

    pub fn playback(&self) -> &Arc<PlaybackEngine> {
        &self.playback
    }

    pub fn events(&self) -> &EventBus {
        &self.event_bus
    }

    pub fn subscribe(&self) -> Receiver<CoreEvent> {
        self.event_bus.subscribe()
    }

    // ========================================================================
    // Library + playback
    // ========================================================================

    /// Import `files` into a playlist. Cancelling `cancel` skips the files
    /// not yet processed.
    pub async fn import_files(
        &self,
        playlist_id: PlaylistId,
        files: Vec<ImportFile>,
        cancel: &CancellationToken,
    ) -> Result<ImportReport> {
        Ok(self
            .library
            .add_files_to_playlist(playlist_id, files, cancel)
            .await?)
    }

    /// Start a stored playlist from its first entry.
    pub async fn play_playlist(&self, playlist_id: PlaylistId, shuffle: bool) -> Result<()> {
        let playlist = self.find_playlist(playlist_id).await?;
        self.playback
            .start_playlist_playback(&playlist, shuffle)
            .await?;
        Ok(())
    }

    /// Play one song of a stored playlist, queueing the whole playlist.
    pub async fn play_from_playlist(&self, playlist_id: PlaylistId, song_id: SongId) -> Result<()> {
        let playlist = self.find_playlist(playlist_id).await?;
        let song = playlist
            .songs
            .iter()
            .find(|s| s.id == song_id)
            .ok_or_else(|| not_found("song", song_id))?;
        self.playback.play_song(song, Some(&playlist)).await?;
        Ok(())
    }

    /// Save the active queue ordering as a new playlist.
    pub async fn save_queue_as_playlist(&self, name: Option<&str>) -> Result<Playlist> {
        let songs = self
            .playback
            .snapshot()
            .await
            .active()
            .iter()
            .map(|e| e.song.clone())
            .collect();
        Ok(self.library.save_queue_as_playlist(songs, name).await?)
    }

    // ========================================================================
    // Lyrics
    // ========================================================================

    /// Lyrics for a library song, as shown to the user.
    ///
    /// Stored lyrics are returned as is. Otherwise they are requested from the
    /// provider and, when found, saved on the song.
    #[instrument(skip(self))]
    pub async fn lyrics_for(&self, song_id: SongId) -> Result<String> {
        let song = self
            .library
            .all_songs()
            .await
            .into_iter()
            .find(|s| s.id == song_id)
            .ok_or_else(|| not_found("song", song_id))?;

        if let Some(lyrics) = song.lyrics.as_deref().filter(|l| !l.trim().is_empty()) {
            return Ok(lyrics.to_string());
        }

        let query = LyricsQuery::new(&song.title, &song.artist).with_album(&song.album);
        let outcome = self.lyrics.fetch_lyrics(&query).await;
        if let TextOutcome::Found(text) = &outcome {
            if let Err(e) = self.library.update_song_lyrics(song_id, text).await {
                warn!(error = %e, "Failed to store fetched lyrics");
            }
        }
        Ok(outcome.lyrics_text().to_string())
    }

    /// Short artist biography, or a placeholder message.
    pub async fn biography_for(&self, artist: &str) -> String {
        self.lyrics
            .fetch_biography(artist)
            .await
            .biography_text()
            .to_string()
    }

    async fn find_playlist(&self, playlist_id: PlaylistId) -> Result<Playlist> {
        self.library
            .playlist(playlist_id)
            .await
            .ok_or_else(|| not_found("playlist", playlist_id))
    }
}

fn not_found(entity_type: &str, id: impl ToString) -> ServiceError {
    ServiceError::NotFound {
        entity_type: entity_type.to_string(),
        id: id.to_string(),
    }
}

/// Build a session with the desktop HTTP client and a SQLite settings store
/// at `settings_path`.
#[cfg(all(feature = "desktop-shims", not(target_arch = "wasm32")))]
pub async fn bootstrap_desktop(
    config: CoreConfig,
    settings_path: std::path::PathBuf,
    media_surface: Arc<dyn MediaSurface>,
) -> Result<MusicSession> {
    let http = bridge_desktop::ReqwestHttpClient::with_timeout(config.lookup_timeout())?;
    let settings = bridge_desktop::SqliteSettingsStore::new(settings_path).await?;
    let deps = CoreDependencies::new(Arc::new(http), Arc::new(settings), media_surface);
    MusicSession::start(config, deps).await
}
