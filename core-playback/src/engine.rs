//! # Playback Engine
//!
//! Owns the play queue and transport state and drives a
//! [`MediaSurface`](bridge_traits::playback::MediaSurface).
//!
//! ## Overview
//!
//! Every operation takes the state lock, applies a transition on
//! [`PlaybackState`], then issues the matching surface commands while still
//! holding the lock, so commands reach the surface in the order the
//! operations were called. Surface events come back through
//! [`PlaybackEngine::handle_media_event`], which takes the same lock.
//!
//! When the surface rejects a command the engine logs it, marks playback as
//! stopped, emits `PlaybackEvent::Error` and returns
//! [`PlaybackError::Device`]. The queue is left untouched so the host can
//! retry.
//!
//! ## Usage
//!
//! ```ignore
//! let engine = PlaybackEngine::new(surface, Arc::new(store.clone()))
//!     .with_preferences(PlaybackPreferences::new(settings))
//!     .with_event_bus(bus);
//! engine.restore_preferences().await?;
//!
//! engine.play_song(&song, Some(&playlist)).await?;
//! engine.play_next().await?;
//! ```

use crate::catalog::SongCatalog;
use crate::error::{PlaybackError, Result};
use crate::preferences::PlaybackPreferences;
use crate::queue::{PlaybackState, QueueEntry, QueueId, Removal, RepeatMode, Step};
use crate::shuffle::{RandomShuffler, Shuffler};
use bridge_traits::error::BridgeError;
use bridge_traits::playback::{MediaEvent, MediaSurface};
use core_library::{Playlist, Song};
use core_runtime::events::{CoreEvent, EventBus, PlaybackEvent};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info, instrument, warn};

pub struct PlaybackEngine {
    state: Mutex<PlaybackState>,
    surface: Arc<dyn MediaSurface>,
    catalog: Arc<dyn SongCatalog>,
    shuffler: Arc<dyn Shuffler>,
    preferences: Option<PlaybackPreferences>,
    event_bus: Option<EventBus>,
}

impl PlaybackEngine {
    pub fn new(surface: Arc<dyn MediaSurface>, catalog: Arc<dyn SongCatalog>) -> Self {
        Self {
            state: Mutex::new(PlaybackState::new()),
            surface,
            catalog,
            shuffler: Arc::new(RandomShuffler::new()),
            preferences: None,
            event_bus: None,
        }
    }

    pub fn with_shuffler(mut self, shuffler: Arc<dyn Shuffler>) -> Self {
        self.shuffler = shuffler;
        self
    }

    /// Persist shuffle and repeat changes through `preferences`.
    pub fn with_preferences(mut self, preferences: PlaybackPreferences) -> Self {
        self.preferences = Some(preferences);
        self
    }

    pub fn with_event_bus(mut self, event_bus: EventBus) -> Self {
        self.event_bus = Some(event_bus);
        self
    }

    /// Apply the stored shuffle and repeat modes.
    pub async fn restore_preferences(&self) -> Result<()> {
        let Some(preferences) = &self.preferences else {
            return Ok(());
        };
        let modes = preferences.load().await?;

        let mut state = self.state.lock().await;
        state.set_shuffled(modes.shuffled, self.shuffler.as_ref());
        state.set_repeat_mode(modes.repeat);
        debug!(
            shuffled = modes.shuffled,
            repeat = modes.repeat.as_str(),
            "Restored playback modes"
        );
        Ok(())
    }

    // ========================================================================
    // Reads
    // ========================================================================

    /// A copy of the current state.
    pub async fn snapshot(&self) -> PlaybackState {
        self.state.lock().await.clone()
    }

    pub async fn current(&self) -> Option<QueueEntry> {
        self.state.lock().await.current().cloned()
    }

    // ========================================================================
    // Queue construction
    // ========================================================================

    /// Build a fresh queue and start `song`.
    ///
    /// The queue comes from `playlist` when given, else from the songs of the
    /// existing queue, else from the whole library. A song missing from that
    /// source is appended so the requested song always starts.
    #[instrument(skip(self, song, playlist), fields(song_id = %song.id))]
    pub async fn play_song(&self, song: &Song, playlist: Option<&Playlist>) -> Result<()> {
        let mut state = self.state.lock().await;

        let songs = match playlist {
            Some(playlist) => playlist.songs.clone(),
            None if !state.is_empty() => state.queue().iter().map(|e| e.song.clone()).collect(),
            None => self.catalog.all_songs().await,
        };
        state.load(songs, self.shuffler.as_ref());

        let index = match state.position_of_song(song.id) {
            Some(index) => index,
            None => {
                debug!("Requested song not in queue source, appending");
                state.append(song.clone());
                state.active().len() - 1
            }
        };
        state.select(index);
        self.emit_queue_changed(&state);

        self.start_current(&mut state).await
    }

    /// Replace the queue with `playlist` and start at the first entry of the
    /// chosen ordering. An empty playlist leaves everything as it was.
    #[instrument(skip(self, playlist), fields(playlist_id = %playlist.id))]
    pub async fn start_playlist_playback(&self, playlist: &Playlist, shuffle: bool) -> Result<()> {
        if playlist.songs.is_empty() {
            debug!("Ignoring empty playlist");
            return Ok(());
        }

        let mut state = self.state.lock().await;
        state.load(playlist.songs.clone(), self.shuffler.as_ref());
        state.set_shuffled(shuffle, self.shuffler.as_ref());
        state.select(0);

        self.save_shuffle(shuffle).await;
        self.emit_mode_changed(&state);
        self.emit_queue_changed(&state);

        self.start_current(&mut state).await
    }

    /// Append `song` to the tail of the queue without touching playback.
    pub async fn add_song_to_queue(&self, song: Song) -> QueueId {
        let mut state = self.state.lock().await;
        let song_id = song.id;
        let queue_id = state.append(song);
        debug!(song_id = %song_id, queue_id = %queue_id, "Queued song");
        self.emit_queue_changed(&state);
        queue_id
    }

    /// Remove one queue entry. Removing the current entry moves on to the
    /// entry that followed it.
    pub async fn remove_from_queue(&self, queue_id: QueueId) -> Result<()> {
        let mut state = self.state.lock().await;
        let was_playing = state.is_playing();

        let removal = state
            .remove(queue_id)
            .ok_or_else(|| PlaybackError::QueueEntryNotFound(queue_id.to_string()))?;
        debug!(queue_id = %queue_id, removal = ?removal, "Removed queue entry");
        self.emit_queue_changed(&state);

        match removal {
            Removal::Other => Ok(()),
            Removal::CurrentReplaced if was_playing => self.start_current(&mut state).await,
            Removal::CurrentReplaced => Ok(()),
            Removal::CurrentExhausted | Removal::Emptied => self.halt(&mut state).await,
        }
    }

    // ========================================================================
    // Transport
    // ========================================================================

    /// Advance to the next entry. Past the end this wraps with repeat
    /// `Playlist` and otherwise stops on the last entry.
    pub async fn play_next(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        self.advance(&mut state).await
    }

    /// Go back one entry, wrapping from the first to the last.
    pub async fn play_previous(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        match state.step_back() {
            Step::Moved(_) => self.start_current(&mut state).await,
            Step::Exhausted | Step::Empty => Ok(()),
        }
    }

    /// Pause or resume the current entry. Returns whether it is now playing;
    /// without a current entry nothing happens.
    pub async fn toggle_play_pause(&self) -> Result<bool> {
        let mut state = self.state.lock().await;
        let Some(entry) = state.current().cloned() else {
            return Ok(false);
        };
        let position_ms = (state.current_time() * 1000.0) as u64;

        if state.is_playing() {
            if let Err(e) = self.surface.pause().await {
                return Err(self.device_failure(&mut state, e));
            }
            state.set_playing(false);
            self.emit(PlaybackEvent::Paused {
                song_id: entry.song.id.to_string(),
                position_ms,
            });
            Ok(false)
        } else {
            if let Err(e) = self.surface.play(&entry.song.audio).await {
                return Err(self.device_failure(&mut state, e));
            }
            state.set_playing(true);
            self.emit(PlaybackEvent::Resumed {
                song_id: entry.song.id.to_string(),
                position_ms,
            });
            Ok(true)
        }
    }

    /// Move the playback position, clamped to `[0, duration]`.
    pub async fn seek(&self, time: f64) -> Result<f64> {
        let mut state = self.state.lock().await;
        let position = state.seek(time);
        if state.current().is_some() {
            if let Err(e) = self.surface.seek(position).await {
                return Err(self.device_failure(&mut state, e));
            }
        }
        Ok(position)
    }

    /// Set the output volume, clamped to `[0, 1]`.
    pub async fn set_volume(&self, volume: f32) -> Result<f32> {
        let mut state = self.state.lock().await;
        let volume = state.set_volume(volume);
        if let Err(e) = self.surface.set_volume(volume).await {
            return Err(self.device_failure(&mut state, e));
        }
        Ok(volume)
    }

    // ========================================================================
    // Modes
    // ========================================================================

    /// Flip shuffle, keeping the current entry current. Returns the new mode.
    pub async fn toggle_shuffle(&self) -> bool {
        let mut state = self.state.lock().await;
        let shuffled = !state.is_shuffled();
        state.set_shuffled(shuffled, self.shuffler.as_ref());
        info!(shuffled, "Shuffle toggled");

        self.save_shuffle(shuffled).await;
        self.emit_mode_changed(&state);
        shuffled
    }

    /// None → Playlist → Song → None. Returns the new mode.
    pub async fn toggle_repeat(&self) -> RepeatMode {
        let mut state = self.state.lock().await;
        let mode = state.cycle_repeat();
        info!(repeat = mode.as_str(), "Repeat mode changed");

        if let Some(preferences) = &self.preferences {
            if let Err(e) = preferences.save_repeat(mode).await {
                warn!(error = %e, "Failed to persist repeat mode");
            }
        }
        self.emit_mode_changed(&state);
        mode
    }

    // ========================================================================
    // Surface events
    // ========================================================================

    pub async fn handle_media_event(&self, event: MediaEvent) -> Result<()> {
        let mut state = self.state.lock().await;
        match event {
            MediaEvent::TimeUpdate(time) => {
                state.seek(time);
                Ok(())
            }
            MediaEvent::DurationKnown(duration) => {
                state.set_duration(duration);
                Ok(())
            }
            MediaEvent::Ended => self.song_ended(&mut state).await,
        }
    }

    async fn song_ended(&self, state: &mut PlaybackState) -> Result<()> {
        if state.repeat_mode() != RepeatMode::Song {
            return self.advance(state).await;
        }
        let Some(entry) = state.current().cloned() else {
            return Ok(());
        };

        state.seek(0.0);
        let restart = match self.surface.seek(0.0).await {
            Ok(()) => self.surface.play(&entry.song.audio).await,
            Err(e) => Err(e),
        };
        if let Err(e) = restart {
            return Err(self.device_failure(state, e));
        }
        state.set_playing(true);
        debug!(song_id = %entry.song.id, "Repeating song");
        self.emit_started(&entry);
        Ok(())
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    async fn advance(&self, state: &mut PlaybackState) -> Result<()> {
        match state.step_forward() {
            Step::Moved(_) => self.start_current(state).await,
            Step::Exhausted => {
                info!("Queue finished");
                self.emit(PlaybackEvent::QueueExhausted);
                self.halt(state).await
            }
            Step::Empty => Ok(()),
        }
    }

    /// Load the current entry on the surface and start it.
    async fn start_current(&self, state: &mut PlaybackState) -> Result<()> {
        let Some(entry) = state.current().cloned() else {
            state.set_playing(false);
            return Ok(());
        };

        let started = match self.surface.set_volume(state.volume()).await {
            Ok(()) => self.surface.play(&entry.song.audio).await,
            Err(e) => Err(e),
        };
        if let Err(e) = started {
            return Err(self.device_failure(state, e));
        }

        state.set_playing(true);
        info!(
            song_id = %entry.song.id,
            queue_id = %entry.queue_id,
            title = %entry.song.title,
            "Playing"
        );
        self.emit_started(&entry);
        Ok(())
    }

    /// Pause the surface after the state stopped playing.
    async fn halt(&self, state: &mut PlaybackState) -> Result<()> {
        state.set_playing(false);
        if let Err(e) = self.surface.pause().await {
            return Err(self.device_failure(state, e));
        }
        Ok(())
    }

    fn device_failure(&self, state: &mut PlaybackState, error: BridgeError) -> PlaybackError {
        let song_id = state.current().map(|e| e.song.id.to_string());
        state.set_playing(false);

        error!(error = %error, song_id = ?song_id, "Media surface rejected command");
        self.emit(PlaybackEvent::Error {
            song_id,
            message: error.to_string(),
            recoverable: true,
        });
        PlaybackError::Device(error.to_string())
    }

    async fn save_shuffle(&self, shuffled: bool) {
        if let Some(preferences) = &self.preferences {
            if let Err(e) = preferences.save_shuffle(shuffled).await {
                warn!(error = %e, "Failed to persist shuffle mode");
            }
        }
    }

    fn emit(&self, event: PlaybackEvent) {
        if let Some(bus) = &self.event_bus {
            bus.emit(CoreEvent::Playback(event)).ok();
        }
    }

    fn emit_started(&self, entry: &QueueEntry) {
        self.emit(PlaybackEvent::Started {
            song_id: entry.song.id.to_string(),
            queue_id: entry.queue_id.to_string(),
            title: entry.song.title.clone(),
        });
    }

    fn emit_queue_changed(&self, state: &PlaybackState) {
        self.emit(PlaybackEvent::QueueChanged {
            length: state.len() as u32,
        });
    }

    fn emit_mode_changed(&self, state: &PlaybackState) {
        self.emit(PlaybackEvent::ModeChanged {
            shuffled: state.is_shuffled(),
            repeat: state.repeat_mode().as_str().to_string(),
        });
    }
}

// ============================================================================
// Tests
// ============================================================================
