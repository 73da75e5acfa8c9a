//! # Host Bridge Traits
//!
//! Capabilities the player core needs from its host but does not implement
//! itself.
//!
//! ## Overview
//!
//! The core owns queue state, the library and metadata enrichment. Everything
//! that touches a device, the network or a platform preference store is reached
//! through one of the traits in this crate so each host can plug in its own
//! adapter (see `bridge-desktop` for the desktop one).
//!
//! ## Traits
//!
//! ### Playback
//! - [`MediaSurface`](playback::MediaSurface) - Opaque decode/output device the engine commands
//! - [`MetadataLoader`](playback::MetadataLoader) - Duration probing before a blob is stored
//!
//! ### Networking & Storage
//! - [`HttpClient`](http::HttpClient) - Async HTTP for remote metadata and lyrics lookups
//! - [`SettingsStore`](storage::SettingsStore) - Key-value store backing the metadata tier
//!
//! ### Utilities
//! - [`Clock`](time::Clock) - Time source for deterministic testing
//! - [`LoggerSink`](time::LoggerSink) - Forward structured logs to host logging
//!
//! ## Error Handling
//!
//! All bridge traits use [`BridgeError`](error::BridgeError). Adapters convert
//! their platform errors into it and keep the message actionable.
//!
//! ## Example
//!
//! ```ignore
//! use bridge_traits::playback::{AudioSource, MediaSurface};
//!
//! async fn start(surface: &dyn MediaSurface, data: bytes::Bytes) -> bridge_traits::error::Result<()> {
//!     surface.play(&AudioSource::MemoryBuffer { data }).await?;
//!     surface.set_volume(0.75).await
//! }
//! ```

pub mod error;
pub mod http;
pub mod playback;
pub mod storage;
pub mod time;

pub use error::BridgeError;

// Re-export commonly used types
pub use http::{HttpClient, HttpMethod, HttpRequest, HttpResponse, RetryPolicy};
pub use playback::{AudioSource, MediaEvent, MediaSurface, MetadataLoader};
pub use storage::SettingsStore;
pub use time::{Clock, LogEntry, LogLevel, LoggerSink, SystemClock};
