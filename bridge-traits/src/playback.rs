//! Playback bridge traits.
//!
//! The engine treats the audio device as opaque: it issues transport commands
//! through [`MediaSurface`] and receives [`MediaEvent`]s back from the host.

use async_trait::async_trait;
use bytes::Bytes;
use std::path::PathBuf;

use crate::error::Result;

/// Playable reference handed to the surface.
#[derive(Debug, Clone, PartialEq)]
pub enum AudioSource {
    /// Local file accessible to the host runtime.
    LocalFile { path: PathBuf },
    /// In-memory audio buffer, typically the payload of a stored song blob.
    MemoryBuffer { data: Bytes },
}

impl AudioSource {
    /// Size of the payload when it is held in memory.
    pub fn buffered_len(&self) -> Option<usize> {
        match self {
            AudioSource::MemoryBuffer { data } => Some(data.len()),
            AudioSource::LocalFile { .. } => None,
        }
    }
}

/// Events a surface reports back while a source is loaded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MediaEvent {
    /// Playback position in seconds.
    TimeUpdate(f64),
    /// Total length of the loaded source in seconds.
    DurationKnown(f64),
    /// The loaded source played to its end.
    Ended,
}

/// Decode/output device driven by the playback engine.
///
/// Commands are fire-and-forget from the engine's point of view; an `Err`
/// means the device rejected the command and the engine halts playback.
#[async_trait]
pub trait MediaSurface: Send + Sync {
    /// Load `source` (if it differs from the current one) and start output.
    async fn play(&self, source: &AudioSource) -> Result<()>;

    /// Pause output, keeping the loaded source.
    async fn pause(&self) -> Result<()>;

    /// Move the playback position, in seconds.
    async fn seek(&self, position: f64) -> Result<()>;

    /// Set output gain in `[0.0, 1.0]`.
    async fn set_volume(&self, volume: f32) -> Result<()>;
}

/// Probes audio payloads before they are stored.
#[async_trait]
pub trait MetadataLoader: Send + Sync {
    /// Duration in seconds of the encoded audio in `data`.
    async fn probe_duration(&self, data: &Bytes, mime_type: &str) -> Result<f64>;
}
