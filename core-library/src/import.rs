//! Import seams
//!
//! The store persists and organizes songs; deciding what a file *is* (tags,
//! remote lookups) and drawing cover images belong to collaborators plugged in
//! through these traits.

use crate::error::Result;
use crate::models::ImportFile;
use async_trait::async_trait;
use bytes::Bytes;

/// Display metadata and optional cover derived for one imported file.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedSong {
    pub title: String,
    pub artist: String,
    pub album: String,
    pub cover: Option<Bytes>,
    pub cover_mime_type: Option<String>,
}

/// Derives metadata for a file at import time.
///
/// Never fails: any lookup problem degrades to default values.
#[async_trait]
pub trait SongEnricher: Send + Sync {
    async fn enrich(&self, file: &ImportFile) -> EnrichedSong;
}

/// An encoded image ready to be stored.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedImage {
    pub data: Bytes,
    pub mime_type: String,
    pub width: u32,
    pub height: u32,
}

/// Draws playlist covers.
pub trait CoverRenderer: Send + Sync {
    /// Render a collage from one to four encoded cover images.
    fn render_collage(&self, covers: &[Bytes]) -> Result<RenderedImage>;

    /// The default cover shown when no real art exists.
    fn placeholder(&self) -> Result<RenderedImage>;

    /// Decode enough of `data` to report its format and dimensions.
    fn inspect(&self, data: &Bytes) -> Result<RenderedImage>;
}
