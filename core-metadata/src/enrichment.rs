//! # Metadata Enrichment Pipeline
//!
//! Decides display metadata for a file at import time:
//!
//! 1. Read tags; absent fields default to `Unknown Artist`, `Unknown Album`
//!    and the file name without extension.
//! 2. If artist or album is still unknown and remote lookup is enabled, search
//!    with the cleaned title and fill only the missing fields. Without an
//!    embedded cover, the match's artwork is downloaded.
//!
//! Every remote call is bounded by the configured lookup timeout. Lookup
//! problems are logged and reported on the event bus; the import proceeds
//! with whatever was known.

use crate::error::{MetadataError, Result};
use crate::remote::{clean_search_title, RemoteMatch, RemoteMetadataLookup};
use crate::tags::{TagFields, TagReadOutcome, TagReader};
use async_trait::async_trait;
use core_library::{EnrichedSong, ImportFile, SongEnricher, UNKNOWN_ALBUM, UNKNOWN_ARTIST};
use core_runtime::config::CoreConfig;
use core_runtime::events::{CoreEvent, EnrichmentEvent, EventBus};
use core_runtime::logging::strip_path;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Import-time metadata enrichment.
pub struct EnrichmentPipeline {
    tags: Arc<dyn TagReader>,
    remote: Option<Arc<dyn RemoteMetadataLookup>>,
    lookup_timeout: Duration,
    event_bus: Option<EventBus>,
}

impl EnrichmentPipeline {
    /// Tag-only pipeline with the default lookup timeout.
    pub fn new(tags: Arc<dyn TagReader>) -> Self {
        Self {
            tags,
            remote: None,
            lookup_timeout: CoreConfig::default().lookup_timeout(),
            event_bus: None,
        }
    }

    /// Build from configuration. `remote` is ignored when remote lookup is
    /// disabled.
    pub fn from_config(
        config: &CoreConfig,
        tags: Arc<dyn TagReader>,
        remote: Arc<dyn RemoteMetadataLookup>,
    ) -> Self {
        let pipeline = Self::new(tags).with_lookup_timeout(config.lookup_timeout());
        if config.features.enable_remote_lookup {
            pipeline.with_remote_lookup(remote)
        } else {
            pipeline
        }
    }

    pub fn with_remote_lookup(mut self, remote: Arc<dyn RemoteMetadataLookup>) -> Self {
        self.remote = Some(remote);
        self
    }

    pub fn with_lookup_timeout(mut self, timeout: Duration) -> Self {
        self.lookup_timeout = timeout;
        self
    }

    pub fn with_event_bus(mut self, event_bus: EventBus) -> Self {
        self.event_bus = Some(event_bus);
        self
    }

    fn emit(&self, event: EnrichmentEvent) {
        if let Some(bus) = &self.event_bus {
            bus.emit(CoreEvent::Enrichment(event)).ok();
        }
    }

    async fn bounded<T, F>(&self, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        tokio::time::timeout(self.lookup_timeout, fut)
            .await
            .map_err(|_| MetadataError::LookupTimeout {
                timeout_ms: self.lookup_timeout.as_millis() as u64,
            })?
    }

    /// Derive metadata and cover for `file`.
    #[instrument(skip(self, file), fields(file = %strip_path(&file.name)))]
    pub async fn enrich_file(&self, file: &ImportFile) -> EnrichedSong {
        let fields = match self.tags.read(&file.data) {
            TagReadOutcome::Tags(fields) => fields,
            TagReadOutcome::Failed(reason) => {
                warn!(reason = %reason, "Could not read tags; using defaults");
                TagFields::default()
            }
        };

        let mut song = EnrichedSong {
            title: fields
                .title
                .unwrap_or_else(|| file.fallback_title().to_string()),
            artist: fields.artist.unwrap_or_else(|| UNKNOWN_ARTIST.to_string()),
            album: fields.album.unwrap_or_else(|| UNKNOWN_ALBUM.to_string()),
            cover: fields.cover,
            cover_mime_type: fields.cover_mime_type,
        };

        let incomplete = song.artist == UNKNOWN_ARTIST || song.album == UNKNOWN_ALBUM;
        if let (true, Some(remote)) = (incomplete, &self.remote) {
            self.fill_from_remote(remote.as_ref(), &mut song).await;
        }

        song
    }

    async fn fill_from_remote(&self, remote: &dyn RemoteMetadataLookup, song: &mut EnrichedSong) {
        let term = clean_search_title(&song.title);
        if term.is_empty() {
            return;
        }

        let found = match self.bounded(remote.search(&term)).await {
            Ok(Some(found)) => found,
            Ok(None) => {
                debug!(term = %term, "No remote match");
                return;
            }
            Err(e) => {
                warn!(term = %term, error = %e, "Remote lookup failed; keeping defaults");
                self.emit(EnrichmentEvent::LookupFailed {
                    title: song.title.clone(),
                    message: e.to_string(),
                });
                return;
            }
        };

        let RemoteMatch {
            artist,
            album,
            artwork_url,
        } = found;
        if song.artist == UNKNOWN_ARTIST {
            if let Some(artist) = artist {
                song.artist = artist;
            }
        }
        if song.album == UNKNOWN_ALBUM {
            if let Some(album) = album {
                song.album = album;
            }
        }

        match artwork_url {
            Some(url) if song.cover.is_none() => {
                match self.bounded(remote.fetch_artwork(&url)).await {
                    Ok(artwork) => {
                        song.cover = Some(artwork.data);
                        song.cover_mime_type = Some(artwork.mime_type);
                    }
                    Err(e) => warn!(url = %url, error = %e, "Remote artwork download failed"),
                }
            }
            _ => {}
        }

        info!(
            title = %song.title,
            artist = %song.artist,
            album = %song.album,
            "Metadata resolved remotely"
        );
        self.emit(EnrichmentEvent::MetadataResolved {
            title: song.title.clone(),
            artist: song.artist.clone(),
            album: song.album.clone(),
        });
    }
}

#[async_trait]
impl SongEnricher for EnrichmentPipeline {
    async fn enrich(&self, file: &ImportFile) -> EnrichedSong {
        self.enrich_file(file).await
    }
}
