//! # Event Bus System
//!
//! Typed events broadcast from the library store, the enrichment pipeline and
//! the playback engine, delivered through `tokio::sync::broadcast`.
//!
//! ## Overview
//!
//! - **Event Types**: one enum per domain, wrapped in [`CoreEvent`]
//! - **EventBus**: cloneable broadcast sender
//! - **EventStream**: receiver wrapper with optional filtering
//!
//! Emitting with no subscribers returns `Err(SendError)`; producers in this
//! workspace ignore that case with `.ok()`.
//!
//! ## Usage
//!
//! ```rust
//! use core_runtime::events::{CoreEvent, EventBus, LibraryEvent};
//!
//! let bus = EventBus::new(16);
//! let mut rx = bus.subscribe();
//!
//! bus.emit(CoreEvent::Library(LibraryEvent::PlaylistCreated {
//!     playlist_id: "p-1".to_string(),
//!     name: "Road trip".to_string(),
//! }))
//! .ok();
//!
//! assert!(rx.try_recv().is_ok());
//! ```
//!
//! Subscribers that fall behind by more than the buffer size get
//! `RecvError::Lagged(n)` and can keep reading; `RecvError::Closed` means every
//! sender was dropped.

use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::broadcast;

pub use tokio::sync::broadcast::error::{RecvError, SendError};
pub use tokio::sync::broadcast::Receiver;

/// Default buffer size for the event bus channel.
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 100;

// ============================================================================
// Core Event Types
// ============================================================================

/// Top-level event enum encompassing all event categories.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "payload")]
pub enum CoreEvent {
    /// Library store changes
    Library(LibraryEvent),
    /// Transport and queue changes
    Playback(PlaybackEvent),
    /// Metadata enrichment outcomes
    Enrichment(EnrichmentEvent),
}

impl CoreEvent {
    /// Returns a human-readable description of the event.
    pub fn description(&self) -> &str {
        match self {
            CoreEvent::Library(e) => e.description(),
            CoreEvent::Playback(e) => e.description(),
            CoreEvent::Enrichment(e) => e.description(),
        }
    }

    /// Returns the severity level of the event.
    pub fn severity(&self) -> EventSeverity {
        match self {
            CoreEvent::Playback(PlaybackEvent::Error { .. }) => EventSeverity::Error,
            CoreEvent::Library(LibraryEvent::LoadFailed { .. }) => EventSeverity::Error,
            CoreEvent::Library(LibraryEvent::ImportSkipped { .. }) => EventSeverity::Warning,
            CoreEvent::Library(LibraryEvent::Hydrated { dropped_songs, .. })
                if *dropped_songs > 0 =>
            {
                EventSeverity::Warning
            }
            CoreEvent::Enrichment(EnrichmentEvent::LookupFailed { .. }) => EventSeverity::Warning,
            CoreEvent::Library(LibraryEvent::Hydrated { .. }) => EventSeverity::Info,
            CoreEvent::Library(LibraryEvent::ImportCompleted { .. }) => EventSeverity::Info,
            _ => EventSeverity::Debug,
        }
    }
}

/// Event severity levels for filtering and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventSeverity {
    Debug,
    Info,
    Warning,
    Error,
}

// ============================================================================
// Library Events
// ============================================================================

/// Events related to playlists and stored songs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum LibraryEvent {
    /// Startup hydration finished.
    Hydrated {
        playlist_count: u32,
        song_count: u32,
        /// Stubs dropped because their blob was missing.
        dropped_songs: u32,
    },
    /// The store could not be opened; the library is empty.
    LoadFailed { message: String },
    PlaylistCreated { playlist_id: String, name: String },
    /// Playlist modified ("renamed", "songs_added", "song_removed", "cover_updated", "lyrics_updated").
    PlaylistUpdated {
        playlist_id: String,
        change_type: String,
    },
    PlaylistDeleted { playlist_id: String },
    /// One file of an import batch was stored.
    SongImported {
        song_id: String,
        playlist_id: String,
        title: String,
        artist: String,
    },
    /// One file of an import batch was skipped.
    ImportSkipped { file_name: String, reason: String },
    /// A batch finished (possibly cancelled part way).
    ImportCompleted {
        playlist_id: String,
        imported: u32,
        skipped: u32,
        cancelled: bool,
    },
}

impl LibraryEvent {
    fn description(&self) -> &str {
        match self {
            LibraryEvent::Hydrated { .. } => "Library loaded",
            LibraryEvent::LoadFailed { .. } => "Library failed to load",
            LibraryEvent::PlaylistCreated { .. } => "Playlist created",
            LibraryEvent::PlaylistUpdated { .. } => "Playlist updated",
            LibraryEvent::PlaylistDeleted { .. } => "Playlist deleted",
            LibraryEvent::SongImported { .. } => "Song imported",
            LibraryEvent::ImportSkipped { .. } => "File skipped during import",
            LibraryEvent::ImportCompleted { .. } => "Import finished",
        }
    }
}

// ============================================================================
// Playback Events
// ============================================================================

/// Events related to the play queue and transport.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum PlaybackEvent {
    /// A queue entry started playing.
    Started {
        song_id: String,
        queue_id: String,
        title: String,
    },
    Paused { song_id: String, position_ms: u64 },
    Resumed { song_id: String, position_ms: u64 },
    /// The queue ran out with repeat off.
    QueueExhausted,
    /// Queue contents changed (rebuilt, appended, entry removed).
    QueueChanged { length: u32 },
    /// Shuffle or repeat toggled.
    ModeChanged { shuffled: bool, repeat: String },
    /// The surface rejected a command.
    Error {
        song_id: Option<String>,
        message: String,
        recoverable: bool,
    },
}

impl PlaybackEvent {
    fn description(&self) -> &str {
        match self {
            PlaybackEvent::Started { .. } => "Playback started",
            PlaybackEvent::Paused { .. } => "Playback paused",
            PlaybackEvent::Resumed { .. } => "Playback resumed",
            PlaybackEvent::QueueExhausted => "Queue finished",
            PlaybackEvent::QueueChanged { .. } => "Queue changed",
            PlaybackEvent::ModeChanged { .. } => "Playback mode changed",
            PlaybackEvent::Error { .. } => "Playback error",
        }
    }
}

// ============================================================================
// Enrichment Events
// ============================================================================

/// Outcomes of metadata enrichment and cover synthesis.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum EnrichmentEvent {
    /// Remote lookup filled in missing fields.
    MetadataResolved {
        title: String,
        artist: String,
        album: String,
    },
    /// Remote lookup failed or timed out; defaults kept.
    LookupFailed { title: String, message: String },
    /// A playlist cover was regenerated.
    CoverSynthesized { playlist_id: String, tiles: u32 },
}

impl EnrichmentEvent {
    fn description(&self) -> &str {
        match self {
            EnrichmentEvent::MetadataResolved { .. } => "Metadata resolved remotely",
            EnrichmentEvent::LookupFailed { .. } => "Metadata lookup failed",
            EnrichmentEvent::CoverSynthesized { .. } => "Playlist cover regenerated",
        }
    }
}

// ============================================================================
// Event Bus
// ============================================================================

/// Central event bus for publishing and subscribing to events.
///
/// Cloning the bus clones the sender; every `subscribe()` creates an
/// independent receiver that only sees events emitted after it was created.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<CoreEvent>,
}

impl EventBus {
    /// Creates a new event bus buffering up to `capacity` events per subscriber.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publishes an event, returning how many subscribers received it.
    pub fn emit(&self, event: CoreEvent) -> Result<usize, SendError<CoreEvent>> {
        self.sender.send(event)
    }

    pub fn subscribe(&self) -> Receiver<CoreEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER_SIZE)
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

type EventFilter = Box<dyn Fn(&CoreEvent) -> bool + Send + Sync>;

/// Receiver wrapper that skips events rejected by a predicate.
///
/// ```rust
/// use core_runtime::events::{CoreEvent, EventBus, EventStream};
///
/// let bus = EventBus::default();
/// let playback_only = EventStream::new(bus.subscribe())
///     .filter(|event| matches!(event, CoreEvent::Playback(_)));
/// ```
pub struct EventStream {
    receiver: Receiver<CoreEvent>,
    filter: Option<EventFilter>,
}

impl EventStream {
    pub fn new(receiver: Receiver<CoreEvent>) -> Self {
        Self {
            receiver,
            filter: None,
        }
    }

    pub fn filter<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&CoreEvent) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Box::new(predicate));
        self
    }

    fn accepts(&self, event: &CoreEvent) -> bool {
        self.filter.as_ref().map_or(true, |f| f(event))
    }

    /// Receives the next event that passes the filter.
    pub async fn recv(&mut self) -> Result<CoreEvent, RecvError> {
        loop {
            let event = self.receiver.recv().await?;
            if self.accepts(&event) {
                return Ok(event);
            }
        }
    }

    /// Non-blocking receive; `None` when nothing matching is queued.
    pub fn try_recv(&mut self) -> Option<Result<CoreEvent, RecvError>> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) if self.accepts(&event) => return Some(Ok(event)),
                Ok(_) => continue,
                Err(broadcast::error::TryRecvError::Empty) => return None,
                Err(broadcast::error::TryRecvError::Lagged(n)) => {
                    return Some(Err(RecvError::Lagged(n)))
                }
                Err(broadcast::error::TryRecvError::Closed) => return Some(Err(RecvError::Closed)),
            }
        }
    }
}

impl fmt::Debug for EventStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventStream")
            .field("has_filter", &self.filter.is_some())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn created(name: &str) -> CoreEvent {
        CoreEvent::Library(LibraryEvent::PlaylistCreated {
            playlist_id: format!("id-{}", name),
            name: name.to_string(),
        })
    }

    #[tokio::test]
    async fn test_emit_without_subscribers_is_err() {
        let bus = EventBus::new(4);
        assert_eq!(bus.subscriber_count(), 0);
        assert!(bus.emit(created("a")).is_err());
    }

    #[tokio::test]
    async fn test_every_subscriber_receives() {
        let bus = EventBus::new(4);
        let mut a = bus.subscribe();
        let mut b = bus.subscribe();

        assert_eq!(bus.emit(created("a")).unwrap(), 2);
        assert_eq!(a.recv().await.unwrap(), created("a"));
        assert_eq!(b.recv().await.unwrap(), created("a"));
    }

    #[tokio::test]
    async fn test_stream_filter_skips_other_domains() {
        let bus = EventBus::new(8);
        let mut stream = EventStream::new(bus.subscribe())
            .filter(|event| matches!(event, CoreEvent::Playback(_)));

        bus.emit(created("ignored")).unwrap();
        bus.emit(CoreEvent::Playback(PlaybackEvent::QueueExhausted))
            .unwrap();

        assert_eq!(
            stream.recv().await.unwrap(),
            CoreEvent::Playback(PlaybackEvent::QueueExhausted)
        );
        assert!(stream.try_recv().is_none());
    }

    #[tokio::test]
    async fn test_lagged_subscriber() {
        let bus = EventBus::new(2);
        let mut rx = bus.subscribe();
        for i in 0..5 {
            bus.emit(created(&i.to_string())).unwrap();
        }

        assert!(matches!(rx.recv().await, Err(RecvError::Lagged(_))));
        assert!(rx.recv().await.is_ok());
    }

    #[test]
    fn test_severity() {
        let dropped = CoreEvent::Library(LibraryEvent::Hydrated {
            playlist_count: 1,
            song_count: 3,
            dropped_songs: 1,
        });
        let clean = CoreEvent::Library(LibraryEvent::Hydrated {
            playlist_count: 1,
            song_count: 3,
            dropped_songs: 0,
        });
        let error = CoreEvent::Playback(PlaybackEvent::Error {
            song_id: None,
            message: "device lost".to_string(),
            recoverable: true,
        });

        assert_eq!(dropped.severity(), EventSeverity::Warning);
        assert_eq!(clean.severity(), EventSeverity::Info);
        assert_eq!(error.severity(), EventSeverity::Error);
        assert_eq!(created("x").severity(), EventSeverity::Debug);
    }

    #[test]
    fn test_serialization_shape() {
        let json = serde_json::to_value(created("Mix")).unwrap();
        assert_eq!(json["type"], "Library");
        assert_eq!(json["payload"]["event"], "PlaylistCreated");
        assert_eq!(json["payload"]["name"], "Mix");
    }
}
