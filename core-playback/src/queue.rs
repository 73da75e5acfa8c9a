//! # Play Queue State
//!
//! [`PlaybackState`] holds the play queue, the optional shuffled ordering and
//! the transport fields. It has no I/O: the engine applies a transition here
//! and then tells the media surface what changed.
//!
//! ## Orderings
//!
//! `queue` is the insertion order. While shuffle is on, `shuffled_queue`
//! holds the same entries in a permuted order and is the *active* ordering;
//! `current_index` always points into the active ordering. Both orderings are
//! edited in lockstep, so they always hold the same set of queue ids.
//!
//! The current entry is never stored, only derived from the active ordering
//! and `current_index`.

use crate::shuffle::Shuffler;
use core_library::{Song, SongId};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;
use uuid::Uuid;

/// Volume a fresh session starts at.
pub const DEFAULT_VOLUME: f32 = 0.75;

// ============================================================================
// Queue entries
// ============================================================================

/// Identity of one insertion into the queue. The same song queued twice gets
/// two different ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QueueId(pub Uuid);

impl QueueId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for QueueId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for QueueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct QueueEntry {
    pub queue_id: QueueId,
    pub song: Song,
}

impl QueueEntry {
    pub fn new(song: Song) -> Self {
        Self {
            queue_id: QueueId::new(),
            song,
        }
    }
}

// ============================================================================
// Repeat mode
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepeatMode {
    #[default]
    None,
    /// Wrap to the first entry after the last one.
    Playlist,
    /// Restart the current entry when it ends.
    Song,
}

impl RepeatMode {
    /// None → Playlist → Song → None
    pub fn next(self) -> Self {
        match self {
            RepeatMode::None => RepeatMode::Playlist,
            RepeatMode::Playlist => RepeatMode::Song,
            RepeatMode::Song => RepeatMode::None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RepeatMode::None => "none",
            RepeatMode::Playlist => "playlist",
            RepeatMode::Song => "song",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" => Some(RepeatMode::None),
            "playlist" => Some(RepeatMode::Playlist),
            "song" => Some(RepeatMode::Song),
            _ => None,
        }
    }
}

// ============================================================================
// Transition outcomes
// ============================================================================

/// Result of moving forward or backward through the active ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// The entry at this index is now current and playing.
    Moved(usize),
    /// Ran past the end with repeat off; playback stopped on the last entry.
    Exhausted,
    /// Nothing queued.
    Empty,
}

/// What a removal did to the current entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Removal {
    /// Some other entry was removed; the current one is unchanged.
    Other,
    /// The current entry was removed and the following one took its place.
    CurrentReplaced,
    /// The current entry was the last one; playback stopped on the new last entry.
    CurrentExhausted,
    /// The queue is now empty.
    Emptied,
}

// ============================================================================
// State
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackState {
    queue: Vec<QueueEntry>,
    shuffled_queue: Option<Vec<QueueEntry>>,
    current_index: Option<usize>,
    is_playing: bool,
    current_time: f64,
    duration: f64,
    volume: f32,
    repeat_mode: RepeatMode,
}

impl Default for PlaybackState {
    fn default() -> Self {
        Self {
            queue: Vec::new(),
            shuffled_queue: None,
            current_index: None,
            is_playing: false,
            current_time: 0.0,
            duration: 0.0,
            volume: DEFAULT_VOLUME,
            repeat_mode: RepeatMode::None,
        }
    }
}

impl PlaybackState {
    pub fn new() -> Self {
        Self::default()
    }

    // ------------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------------

    /// Entries in insertion order.
    pub fn queue(&self) -> &[QueueEntry] {
        &self.queue
    }

    pub fn shuffled_queue(&self) -> Option<&[QueueEntry]> {
        self.shuffled_queue.as_deref()
    }

    /// The ordering `current_index` points into.
    pub fn active(&self) -> &[QueueEntry] {
        self.shuffled_queue.as_deref().unwrap_or(&self.queue)
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current_index
    }

    pub fn current(&self) -> Option<&QueueEntry> {
        self.current_index.and_then(|i| self.active().get(i))
    }

    pub fn is_playing(&self) -> bool {
        self.is_playing
    }

    pub fn is_shuffled(&self) -> bool {
        self.shuffled_queue.is_some()
    }

    pub fn current_time(&self) -> f64 {
        self.current_time
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn repeat_mode(&self) -> RepeatMode {
        self.repeat_mode
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Index in the active ordering of the first entry holding `song_id`.
    pub fn position_of_song(&self, song_id: SongId) -> Option<usize> {
        self.active().iter().position(|e| e.song.id == song_id)
    }

    // ------------------------------------------------------------------------
    // Queue construction
    // ------------------------------------------------------------------------

    /// Replace the queue with fresh entries for `songs`.
    ///
    /// Keeps the shuffle mode: when shuffled, a new permutation is drawn. No
    /// entry is selected afterwards.
    pub fn load(&mut self, songs: Vec<Song>, shuffler: &dyn Shuffler) {
        self.queue = songs.into_iter().map(QueueEntry::new).collect();
        if self.is_shuffled() {
            self.shuffled_queue = Some(self.permuted(shuffler));
        }
        self.current_index = None;
        self.is_playing = false;
        self.current_time = 0.0;
        self.duration = 0.0;
    }

    /// Make the entry at `index` of the active ordering current, rewinding
    /// the transport to its start.
    pub fn select(&mut self, index: usize) -> bool {
        let Some(duration) = self.active().get(index).map(|e| e.song.duration) else {
            return false;
        };
        self.duration = sanitize_duration(duration);
        self.current_index = Some(index);
        self.current_time = 0.0;
        true
    }

    /// Append a fresh entry to the tail of both orderings.
    ///
    /// With nothing selected the new entry becomes current, paused.
    pub fn append(&mut self, song: Song) -> QueueId {
        let entry = QueueEntry::new(song);
        let queue_id = entry.queue_id;
        if let Some(shuffled) = self.shuffled_queue.as_mut() {
            shuffled.push(entry.clone());
        }
        self.queue.push(entry);

        if self.current().is_none() {
            let last = self.active().len() - 1;
            self.select(last);
            self.is_playing = false;
        }
        queue_id
    }

    /// Remove the entry with `queue_id` from both orderings.
    ///
    /// Returns `None` when no such entry exists.
    pub fn remove(&mut self, queue_id: QueueId) -> Option<Removal> {
        let active_pos = self.active().iter().position(|e| e.queue_id == queue_id)?;

        self.queue.retain(|e| e.queue_id != queue_id);
        if let Some(shuffled) = self.shuffled_queue.as_mut() {
            shuffled.retain(|e| e.queue_id != queue_id);
        }

        let len = self.active().len();
        if len == 0 {
            self.current_index = None;
            self.is_playing = false;
            self.current_time = 0.0;
            self.duration = 0.0;
            return Some(Removal::Emptied);
        }

        let Some(current) = self.current_index else {
            return Some(Removal::Other);
        };

        if active_pos < current {
            self.current_index = Some(current - 1);
            return Some(Removal::Other);
        }
        if active_pos > current {
            return Some(Removal::Other);
        }

        if active_pos < len {
            self.select(active_pos);
            Some(Removal::CurrentReplaced)
        } else if self.repeat_mode == RepeatMode::Playlist {
            self.select(0);
            Some(Removal::CurrentReplaced)
        } else {
            self.select(len - 1);
            self.is_playing = false;
            Some(Removal::CurrentExhausted)
        }
    }

    // ------------------------------------------------------------------------
    // Navigation
    // ------------------------------------------------------------------------

    /// Move to the next entry of the active ordering.
    pub fn step_forward(&mut self) -> Step {
        let len = self.active().len();
        if len == 0 {
            return Step::Empty;
        }

        let mut next = self.current_index.map_or(0, |i| i + 1);
        if next >= len {
            if self.repeat_mode == RepeatMode::Playlist {
                next = 0;
            } else {
                self.is_playing = false;
                return Step::Exhausted;
            }
        }

        self.select(next);
        self.is_playing = true;
        Step::Moved(next)
    }

    /// Move to the previous entry, wrapping to the last one below the start.
    pub fn step_back(&mut self) -> Step {
        let len = self.active().len();
        if len == 0 {
            return Step::Empty;
        }

        let prev = match self.current_index {
            Some(i) if i > 0 && i <= len => i - 1,
            _ => len - 1,
        };
        self.select(prev);
        self.is_playing = true;
        Step::Moved(prev)
    }

    // ------------------------------------------------------------------------
    // Modes
    // ------------------------------------------------------------------------

    /// Turn shuffle on or off, keeping the current entry current.
    pub fn set_shuffled(&mut self, shuffled: bool, shuffler: &dyn Shuffler) {
        let current = self.current().map(|e| e.queue_id);

        self.shuffled_queue = if shuffled {
            Some(self.permuted(shuffler))
        } else {
            None
        };

        if let Some(queue_id) = current {
            self.current_index = self.active().iter().position(|e| e.queue_id == queue_id);
        }
    }

    /// Advance the repeat mode and return the new one.
    pub fn cycle_repeat(&mut self) -> RepeatMode {
        self.repeat_mode = self.repeat_mode.next();
        self.repeat_mode
    }

    pub fn set_repeat_mode(&mut self, mode: RepeatMode) {
        self.repeat_mode = mode;
    }

    // ------------------------------------------------------------------------
    // Transport
    // ------------------------------------------------------------------------

    /// Mark the transport playing or paused. Playing needs a current entry.
    pub fn set_playing(&mut self, playing: bool) -> bool {
        self.is_playing = playing && self.current().is_some();
        self.is_playing
    }

    /// Clamp `time` into `[0, duration]` and store it.
    pub fn seek(&mut self, time: f64) -> f64 {
        self.current_time = if time.is_nan() {
            0.0
        } else {
            time.clamp(0.0, self.duration)
        };
        self.current_time
    }

    /// Clamp `volume` into `[0, 1]` and store it. NaN leaves it unchanged.
    pub fn set_volume(&mut self, volume: f32) -> f32 {
        if !volume.is_nan() {
            self.volume = volume.clamp(0.0, 1.0);
        }
        self.volume
    }

    /// Duration reported by the surface; ignored unless finite and non-negative.
    pub fn set_duration(&mut self, duration: f64) {
        if duration.is_finite() && duration >= 0.0 {
            self.duration = duration;
            self.current_time = self.current_time.min(duration);
        }
    }

    fn permuted(&self, shuffler: &dyn Shuffler) -> Vec<QueueEntry> {
        let order = shuffler.permute(self.queue.len());
        if !is_permutation(&order, self.queue.len()) {
            warn!(
                len = self.queue.len(),
                returned = order.len(),
                "Shuffler returned an invalid permutation; keeping queue order"
            );
            return self.queue.clone();
        }
        order.into_iter().map(|i| self.queue[i].clone()).collect()
    }
}

/// `true` when `order` holds every index in `0..len` exactly once.
fn is_permutation(order: &[usize], len: usize) -> bool {
    if order.len() != len {
        return false;
    }
    let mut seen = vec![false; len];
    order
        .iter()
        .all(|&i| i < len && !std::mem::replace(&mut seen[i], true))
}

fn sanitize_duration(duration: f64) -> f64 {
    if duration.is_finite() && duration >= 0.0 {
        duration
    } else {
        0.0
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use bridge_traits::playback::AudioSource;
    use bytes::Bytes;
    use core_library::CoverRef;
    use std::collections::HashSet;

    /// Reverses the queue.
    pub(crate) struct Reverse;

    impl Shuffler for Reverse {
        fn permute(&self, len: usize) -> Vec<usize> {
            (0..len).rev().collect()
        }
    }

    /// Returns index 0 for every slot.
    struct Repeating;

    impl Shuffler for Repeating {
        fn permute(&self, len: usize) -> Vec<usize> {
            vec![0; len]
        }
    }

    pub(crate) fn song(title: &str) -> Song {
        Song {
            id: SongId::new(),
            title: title.to_string(),
            artist: "Artist".to_string(),
            album: "Album".to_string(),
            duration: 180.0,
            audio: AudioSource::MemoryBuffer {
                data: Bytes::copy_from_slice(title.as_bytes()),
            },
            cover: CoverRef::Placeholder,
            cover_art: None,
            lyrics: None,
        }
    }

    fn loaded(titles: &[&str]) -> PlaybackState {
        let mut state = PlaybackState::new();
        state.load(titles.iter().map(|t| song(t)).collect(), &Reverse);
        state
    }

    fn titles(entries: &[QueueEntry]) -> Vec<&str> {
        entries.iter().map(|e| e.song.title.as_str()).collect()
    }

    #[test]
    fn test_defaults() {
        let state = PlaybackState::new();
        assert_eq!(state.volume(), DEFAULT_VOLUME);
        assert_eq!(state.repeat_mode(), RepeatMode::None);
        assert!(state.current().is_none());
        assert!(!state.is_shuffled());
    }

    #[test]
    fn test_queue_ids_unique_for_repeated_song() {
        let s = song("a");
        let mut state = PlaybackState::new();
        state.load(vec![s.clone(), s.clone()], &Reverse);
        state.append(s);

        let ids: HashSet<_> = state.queue().iter().map(|e| e.queue_id).collect();
        assert_eq!(ids.len(), 3);
    }

    #[test]
    fn test_repeating_shuffler_keeps_every_entry() {
        let mut state = PlaybackState::new();
        state.load(vec![song("a"), song("b"), song("c")], &Repeating);
        state.set_shuffled(true, &Repeating);

        let active = state.shuffled_queue().unwrap();
        assert_eq!(titles(active), vec!["a", "b", "c"]);
        let ids: HashSet<_> = active.iter().map(|e| e.queue_id).collect();
        assert_eq!(ids.len(), 3);
    }

    #[test]
    fn test_is_permutation() {
        assert!(is_permutation(&[2, 0, 1], 3));
        assert!(is_permutation(&[], 0));
        assert!(!is_permutation(&[0, 0, 1], 3));
        assert!(!is_permutation(&[0, 1], 3));
        assert!(!is_permutation(&[0, 1, 3], 3));
    }

    #[test]
    fn test_step_forward_exhausts_without_repeat() {
        let mut state = loaded(&["a", "b", "c"]);
        state.select(2);
        state.set_playing(true);

        assert_eq!(state.step_forward(), Step::Exhausted);
        assert!(!state.is_playing());
        assert_eq!(state.current_index(), Some(2));
    }

    #[test]
    fn test_step_forward_wraps_with_playlist_repeat() {
        let mut state = loaded(&["a", "b"]);
        state.set_repeat_mode(RepeatMode::Playlist);
        state.select(1);

        assert_eq!(state.step_forward(), Step::Moved(0));
        assert!(state.is_playing());
    }

    #[test]
    fn test_step_back_wraps() {
        let mut state = loaded(&["a", "b", "c"]);
        state.select(0);
        assert_eq!(state.step_back(), Step::Moved(2));
        assert_eq!(state.step_back(), Step::Moved(1));

        let mut empty = PlaybackState::new();
        assert_eq!(empty.step_back(), Step::Empty);
        assert_eq!(empty.step_forward(), Step::Empty);
    }

    #[test]
    fn test_shuffle_keeps_current_and_membership() {
        let mut state = loaded(&["a", "b", "c", "d"]);
        state.select(1);
        let current = state.current().unwrap().queue_id;

        state.set_shuffled(true, &Reverse);
        assert_eq!(titles(state.active()), vec!["d", "c", "b", "a"]);
        assert_eq!(state.current().unwrap().queue_id, current);
        assert_eq!(state.current_index(), Some(2));

        state.set_shuffled(false, &Reverse);
        assert!(state.shuffled_queue().is_none());
        assert_eq!(titles(state.active()), vec!["a", "b", "c", "d"]);
        assert_eq!(state.current_index(), Some(1));
    }

    #[test]
    fn test_append_goes_to_tail_of_both_orderings() {
        let mut state = loaded(&["a", "b"]);
        state.set_shuffled(true, &Reverse);
        state.select(0);
        state.set_playing(true);

        state.append(song("z"));
        assert_eq!(titles(state.queue()), vec!["a", "b", "z"]);
        assert_eq!(titles(state.active()), vec!["b", "a", "z"]);
        assert_eq!(state.current_index(), Some(0));
        assert!(state.is_playing());
    }

    #[test]
    fn test_append_to_empty_selects_paused() {
        let mut state = PlaybackState::new();
        state.append(song("a"));
        assert_eq!(state.current_index(), Some(0));
        assert!(!state.is_playing());
    }

    #[test]
    fn test_remove_before_current_shifts_index() {
        let mut state = loaded(&["a", "b", "c"]);
        state.select(2);
        let first = state.queue()[0].queue_id;

        assert_eq!(state.remove(first), Some(Removal::Other));
        assert_eq!(state.current_index(), Some(1));
        assert_eq!(state.current().unwrap().song.title, "c");
    }

    #[test]
    fn test_remove_current_advances() {
        let mut state = loaded(&["a", "b", "c"]);
        state.select(1);
        state.set_playing(true);
        let current = state.current().unwrap().queue_id;

        assert_eq!(state.remove(current), Some(Removal::CurrentReplaced));
        assert_eq!(state.current().unwrap().song.title, "c");
        assert!(state.is_playing());
    }

    #[test]
    fn test_remove_last_current_stops() {
        let mut state = loaded(&["a", "b"]);
        state.select(1);
        state.set_playing(true);
        let current = state.current().unwrap().queue_id;

        assert_eq!(state.remove(current), Some(Removal::CurrentExhausted));
        assert_eq!(state.current().unwrap().song.title, "a");
        assert!(!state.is_playing());
    }

    #[test]
    fn test_remove_in_shuffled_keeps_lockstep() {
        let mut state = loaded(&["a", "b", "c"]);
        state.set_shuffled(true, &Reverse);
        let b = state.queue()[1].queue_id;

        state.remove(b);
        assert_eq!(titles(state.queue()), vec!["a", "c"]);
        assert_eq!(titles(state.active()), vec!["c", "a"]);

        let last = state.queue()[0].queue_id;
        let other = state.queue()[1].queue_id;
        state.remove(last);
        assert_eq!(state.remove(other), Some(Removal::Emptied));
        assert!(state.current().is_none());
        assert_eq!(state.remove(other), None);
    }

    #[test]
    fn test_clamps() {
        let mut state = loaded(&["a"]);
        state.select(0);

        assert_eq!(state.set_volume(2.0), 1.0);
        assert_eq!(state.set_volume(-1.0), 0.0);
        assert_eq!(state.set_volume(f32::NAN), 0.0);
        assert_eq!(state.seek(-5.0), 0.0);
        assert_eq!(state.seek(180.0 + 100.0), 180.0);
        assert_eq!(state.seek(f64::NAN), 0.0);

        state.set_duration(f64::INFINITY);
        assert_eq!(state.duration(), 180.0);
        state.seek(150.0);
        state.set_duration(120.0);
        assert_eq!(state.current_time(), 120.0);
    }

    #[test]
    fn test_repeat_cycle_and_parse() {
        let mut state = PlaybackState::new();
        assert_eq!(state.cycle_repeat(), RepeatMode::Playlist);
        assert_eq!(state.cycle_repeat(), RepeatMode::Song);
        assert_eq!(state.cycle_repeat(), RepeatMode::None);

        for mode in [RepeatMode::None, RepeatMode::Playlist, RepeatMode::Song] {
            assert_eq!(RepeatMode::parse(mode.as_str()), Some(mode));
        }
        assert_eq!(RepeatMode::parse(" Song "), Some(RepeatMode::Song));
        assert_eq!(RepeatMode::parse("all"), None);
    }

    #[test]
    fn test_set_playing_needs_current() {
        let mut state = PlaybackState::new();
        assert!(!state.set_playing(true));
    }
}
