//! # Playback Module
//!
//! Play queue, shuffle/repeat modes and transport control.
//!
//! ## Overview
//!
//! - [`PlaybackState`]: the queue, its shuffled ordering and transport fields
//! - [`PlaybackEngine`]: the only writer of that state; drives a host
//!   [`MediaSurface`](bridge_traits::playback::MediaSurface) and reacts to its
//!   events
//! - [`Shuffler`]: injectable permutation source
//! - [`PlaybackPreferences`]: shuffle and repeat persisted in the settings store

pub mod catalog;
pub mod engine;
pub mod error;
pub mod preferences;
pub mod queue;
pub mod shuffle;

pub use catalog::SongCatalog;
pub use engine::PlaybackEngine;
pub use error::{PlaybackError, Result};
pub use preferences::{PlaybackPreferences, StoredModes, REPEAT_KEY, SHUFFLE_KEY};
pub use queue::{
    PlaybackState, QueueEntry, QueueId, Removal, RepeatMode, Step, DEFAULT_VOLUME,
};
pub use shuffle::{RandomShuffler, Shuffler};
