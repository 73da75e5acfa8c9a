//! # Playback Error Types

use bridge_traits::error::BridgeError;
use thiserror::Error;

/// Errors that can occur during playback operations.
#[derive(Error, Debug)]
pub enum PlaybackError {
    // ========================================================================
    // Device Errors
    // ========================================================================
    /// The media surface rejected a transport command. Playback is halted and
    /// the queue is left as it was so the command can be retried.
    #[error("Audio device error: {0}")]
    Device(String),

    // ========================================================================
    // Queue Errors
    // ========================================================================
    /// No entry with this queue id exists in the queue.
    #[error("Queue entry not found: {0}")]
    QueueEntryNotFound(String),

    // ========================================================================
    // Generic Errors
    // ========================================================================
    #[error("Bridge error: {0}")]
    Bridge(#[from] BridgeError),
}

impl PlaybackError {
    /// Returns `true` if retrying the same command may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, PlaybackError::Device(_))
    }
}

/// Result type for playback operations.
pub type Result<T> = std::result::Result<T, PlaybackError>;
