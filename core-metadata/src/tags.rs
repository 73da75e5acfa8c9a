//! # Tag Extraction
//!
//! Reads embedded title/artist/album and front-cover art from in-memory audio
//! payloads using the `lofty` crate (ID3v2, Vorbis Comments, MP4, RIFF INFO).
//!
//! A payload that cannot be parsed is not an error for the import: the reader
//! reports [`TagReadOutcome::Failed`] and the caller falls back to defaults.

use async_trait::async_trait;
use bridge_traits::error::{BridgeError, Result as BridgeResult};
use bridge_traits::playback::MetadataLoader;
use bytes::Bytes;
use lofty::config::ParseOptions;
use lofty::file::{AudioFile, TaggedFile, TaggedFileExt};
use lofty::picture::{MimeType, PictureType};
use lofty::probe::Probe;
use lofty::tag::{Accessor, Tag};
use std::io::Cursor;
use tracing::debug;

/// Fields found in a file's tags. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TagFields {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub cover: Option<Bytes>,
    pub cover_mime_type: Option<String>,
}

/// Result of reading tags from a payload.
#[derive(Debug, Clone, PartialEq)]
pub enum TagReadOutcome {
    Tags(TagFields),
    /// The payload could not be parsed; treated as all fields absent.
    Failed(String),
}

impl TagReadOutcome {
    pub fn into_fields(self) -> TagFields {
        match self {
            TagReadOutcome::Tags(fields) => fields,
            TagReadOutcome::Failed(_) => TagFields::default(),
        }
    }
}

/// Extracts tag fields from encoded audio.
pub trait TagReader: Send + Sync {
    fn read(&self, data: &Bytes) -> TagReadOutcome;
}

/// `lofty`-backed tag reader and duration probe.
#[derive(Debug, Clone, Copy)]
pub struct LoftyTagReader {
    parse_options: ParseOptions,
}

impl LoftyTagReader {
    pub fn new() -> Self {
        Self {
            parse_options: ParseOptions::new(),
        }
    }

    pub fn with_options(parse_options: ParseOptions) -> Self {
        Self { parse_options }
    }

    fn probe(&self, data: &[u8]) -> Result<TaggedFile, String> {
        Probe::new(Cursor::new(data))
            .options(self.parse_options)
            .guess_file_type()
            .map_err(|e| format!("Failed to probe file: {}", e))?
            .read()
            .map_err(|e| format!("Failed to parse file: {}", e))
    }

    fn fields_from_tag(tag: &Tag) -> TagFields {
        let (cover, cover_mime_type) = match Self::front_cover(tag) {
            Some((data, mime)) => (Some(data), Some(mime)),
            None => (None, None),
        };

        TagFields {
            title: tag.title().and_then(|s| non_blank(s.as_ref())),
            artist: tag.artist().and_then(|s| non_blank(s.as_ref())),
            album: tag.album().and_then(|s| non_blank(s.as_ref())),
            cover,
            cover_mime_type,
        }
    }

    /// Front cover if tagged as such, otherwise the first usable picture.
    fn front_cover(tag: &Tag) -> Option<(Bytes, String)> {
        let usable = |pic: &&lofty::picture::Picture| {
            !pic.data().is_empty() && pic.mime_type().and_then(mime_type_to_string).is_some()
        };

        let picture = tag
            .pictures()
            .iter()
            .filter(usable)
            .find(|pic| pic.pic_type() == PictureType::CoverFront)
            .or_else(|| tag.pictures().iter().find(usable))?;

        let mime = picture.mime_type().and_then(mime_type_to_string)?;
        Some((Bytes::copy_from_slice(picture.data()), mime))
    }
}

impl Default for LoftyTagReader {
    fn default() -> Self {
        Self::new()
    }
}

impl TagReader for LoftyTagReader {
    fn read(&self, data: &Bytes) -> TagReadOutcome {
        let tagged_file = match self.probe(data) {
            Ok(file) => file,
            Err(reason) => {
                debug!(reason = %reason, "Tag read failed");
                return TagReadOutcome::Failed(reason);
            }
        };

        let tag = tagged_file
            .primary_tag()
            .or_else(|| tagged_file.first_tag());

        match tag {
            Some(tag) => TagReadOutcome::Tags(Self::fields_from_tag(tag)),
            None => TagReadOutcome::Tags(TagFields::default()),
        }
    }
}

#[async_trait]
impl MetadataLoader for LoftyTagReader {
    async fn probe_duration(&self, data: &Bytes, _mime_type: &str) -> BridgeResult<f64> {
        let tagged_file = self.probe(data).map_err(BridgeError::OperationFailed)?;
        Ok(tagged_file.properties().duration().as_secs_f64())
    }
}

fn mime_type_to_string(mime_type: &MimeType) -> Option<String> {
    match mime_type {
        MimeType::Png => Some("image/png".to_string()),
        MimeType::Jpeg => Some("image/jpeg".to_string()),
        MimeType::Tiff => Some("image/tiff".to_string()),
        MimeType::Bmp => Some("image/bmp".to_string()),
        MimeType::Gif => Some("image/gif".to_string()),
        _ => None,
    }
}

fn non_blank(text: &str) -> Option<String> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
