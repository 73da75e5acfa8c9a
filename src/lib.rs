//! Workspace umbrella crate.
//!
//! Re-exports the session façade so host applications can depend on
//! `cadence-workspace` alone and reach the library, playback and metadata
//! crates through [`core_service`].

#[cfg(feature = "desktop-shims")]
pub use core_service::*;
