//! Domain models for the music library
//!
//! Two shapes exist for most things: the persisted record (song stubs in the
//! metadata tier, [`SongBlob`] rows in the binary tier) and the hydrated value
//! the rest of the core works with ([`Song`], [`Playlist`]).

use bridge_traits::playback::AudioSource;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Artist used when neither tags nor a remote lookup supplied one.
pub const UNKNOWN_ARTIST: &str = "Unknown Artist";
/// Album used when neither tags nor a remote lookup supplied one.
pub const UNKNOWN_ALBUM: &str = "Unknown Album";
pub const UNTITLED: &str = "Untitled";

// =============================================================================
// ID Types
// =============================================================================

/// Unique identifier for a song; also the binary-tier key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SongId(pub Uuid);

impl SongId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_string(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl Default for SongId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SongId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a playlist
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlaylistId(pub Uuid);

impl PlaylistId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_string(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl Default for PlaylistId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PlaylistId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a stored artwork image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArtworkId(pub Uuid);

impl ArtworkId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_string(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl Default for ArtworkId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ArtworkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// Cover references
// =============================================================================

/// Where a song's or playlist's cover image comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum CoverRef {
    /// The rendered default icon; no real art anywhere in the chain.
    #[default]
    Placeholder,
    /// Art stored alongside the song in the binary tier (embedded or fetched).
    Song(SongId),
    /// A collage synthesized from member song covers.
    Collage(ArtworkId),
    /// An image the user chose for the playlist.
    Custom(ArtworkId),
}

impl CoverRef {
    pub fn is_placeholder(&self) -> bool {
        matches!(self, CoverRef::Placeholder)
    }

    /// Artwork rows owned by this reference, deleted when it is replaced.
    pub fn owned_artwork(&self) -> Option<ArtworkId> {
        match self {
            CoverRef::Collage(id) | CoverRef::Custom(id) => Some(*id),
            CoverRef::Placeholder | CoverRef::Song(_) => None,
        }
    }
}

// =============================================================================
// Songs
// =============================================================================

/// Metadata-tier record for one song inside a playlist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SongStub {
    pub id: SongId,
    pub title: String,
    pub artist: String,
    pub album: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lyrics: Option<String>,
}

/// Binary-tier record: audio payload, optional cover and the duration probed
/// at import time.
#[derive(Debug, Clone, PartialEq)]
pub struct SongBlob {
    pub id: SongId,
    pub audio: Bytes,
    pub mime_type: String,
    pub cover: Option<Bytes>,
    pub cover_mime_type: Option<String>,
    /// Seconds
    pub duration: f64,
    pub title: String,
    pub artist: String,
    pub album: String,
    pub created_at: i64,
}

impl SongBlob {
    pub fn validate(&self) -> Result<(), String> {
        if self.audio.is_empty() {
            return Err("Audio payload cannot be empty".to_string());
        }
        if !self.duration.is_finite() || self.duration < 0.0 {
            return Err(format!("Invalid duration: {}", self.duration));
        }
        if self.title.trim().is_empty() {
            return Err("Title cannot be empty".to_string());
        }
        Ok(())
    }
}

/// A playable song: a stub joined with its binary-tier entry.
#[derive(Debug, Clone, PartialEq)]
pub struct Song {
    pub id: SongId,
    pub title: String,
    pub artist: String,
    pub album: String,
    /// Seconds
    pub duration: f64,
    pub audio: AudioSource,
    pub cover: CoverRef,
    /// Cover image bytes when `cover` is `CoverRef::Song`.
    pub cover_art: Option<Bytes>,
    pub lyrics: Option<String>,
}

impl Song {
    /// Join a metadata stub with its binary entry. Display fields come from the
    /// stub, which is the record the user edits.
    pub fn hydrate(stub: &SongStub, blob: SongBlob) -> Self {
        let cover = if blob.cover.is_some() {
            CoverRef::Song(stub.id)
        } else {
            CoverRef::Placeholder
        };

        Self {
            id: stub.id,
            title: stub.title.clone(),
            artist: stub.artist.clone(),
            album: stub.album.clone(),
            duration: blob.duration,
            audio: AudioSource::MemoryBuffer { data: blob.audio },
            cover,
            cover_art: blob.cover,
            lyrics: stub.lyrics.clone(),
        }
    }

    pub fn stub(&self) -> SongStub {
        SongStub {
            id: self.id,
            title: self.title.clone(),
            artist: self.artist.clone(),
            album: self.album.clone(),
            lyrics: self.lyrics.clone(),
        }
    }

    /// Case-insensitive match on title, artist or album.
    pub fn matches(&self, needle_lower: &str) -> bool {
        self.title.to_lowercase().contains(needle_lower)
            || self.artist.to_lowercase().contains(needle_lower)
            || self.album.to_lowercase().contains(needle_lower)
    }
}

// =============================================================================
// Playlists
// =============================================================================

/// Metadata-tier record for one playlist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaylistRecord {
    pub id: PlaylistId,
    pub name: String,
    #[serde(default)]
    pub cover: CoverRef,
    #[serde(default)]
    pub songs: Vec<SongStub>,
}

/// A hydrated playlist with playable songs in playlist order.
#[derive(Debug, Clone, PartialEq)]
pub struct Playlist {
    pub id: PlaylistId,
    pub name: String,
    pub cover: CoverRef,
    pub songs: Vec<Song>,
}

impl Playlist {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: PlaylistId::new(),
            name: name.into(),
            cover: CoverRef::Placeholder,
            songs: Vec::new(),
        }
    }

    pub fn record(&self) -> PlaylistRecord {
        PlaylistRecord {
            id: self.id,
            name: self.name.clone(),
            cover: self.cover,
            songs: self.songs.iter().map(Song::stub).collect(),
        }
    }

    pub fn contains(&self, song_id: SongId) -> bool {
        self.songs.iter().any(|s| s.id == song_id)
    }
}

/// Validate a user-supplied playlist name, returning the trimmed form.
pub fn validate_playlist_name(name: &str) -> Result<String, String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err("Playlist name cannot be empty".to_string());
    }
    if trimmed.chars().count() > 200 {
        return Err("Playlist name cannot exceed 200 characters".to_string());
    }
    Ok(trimmed.to_string())
}

// =============================================================================
// Artwork
// =============================================================================

/// A stored cover image (collage or user upload).
#[derive(Debug, Clone, PartialEq)]
pub struct Artwork {
    pub id: ArtworkId,
    pub data: Bytes,
    pub mime_type: String,
    pub width: u32,
    pub height: u32,
    pub created_at: i64,
}

impl Artwork {
    pub fn validate(&self) -> Result<(), String> {
        if self.data.is_empty() {
            return Err("Artwork data cannot be empty".to_string());
        }
        if !self.mime_type.starts_with("image/") {
            return Err(format!("Invalid artwork MIME type: {}", self.mime_type));
        }
        if self.width == 0 || self.height == 0 {
            return Err("Artwork dimensions must be non-zero".to_string());
        }
        Ok(())
    }
}

// =============================================================================
// Import
// =============================================================================

/// A file handed to the library for import.
#[derive(Debug, Clone)]
pub struct ImportFile {
    /// Original file name, used for the fallback title
    pub name: String,
    pub mime_type: String,
    pub data: Bytes,
}

impl ImportFile {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, data: Bytes) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            data,
        }
    }

    pub fn is_audio(&self) -> bool {
        self.mime_type.starts_with("audio/")
    }

    /// File name without its final extension.
    pub fn stem(&self) -> &str {
        match self.name.rfind('.') {
            Some(pos) if pos > 0 => &self.name[..pos],
            _ => &self.name,
        }
    }

    /// Title used when tags have none: the stem, else the whole file name,
    /// else `Untitled`.
    pub fn fallback_title(&self) -> &str {
        [self.stem().trim(), self.name.trim()]
            .into_iter()
            .find(|t| !t.is_empty())
            .unwrap_or(UNTITLED)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blob(id: SongId, cover: Option<Bytes>) -> SongBlob {
        SongBlob {
            id,
            audio: Bytes::from_static(b"ID3"),
            mime_type: "audio/mpeg".to_string(),
            cover,
            cover_mime_type: None,
            duration: 181.5,
            title: "Blob title".to_string(),
            artist: "Blob artist".to_string(),
            album: "Blob album".to_string(),
            created_at: 0,
        }
    }

    #[test]
    fn test_import_file_stem() {
        let file = |name: &str| ImportFile::new(name, "audio/mpeg", Bytes::new());
        assert_eq!(file("Amazing Grace.mp3").stem(), "Amazing Grace");
        assert_eq!(file("archive.tar.gz").stem(), "archive.tar");
        assert_eq!(file("noext").stem(), "noext");
        assert_eq!(file(".hidden").stem(), ".hidden");
    }

    #[test]
    fn test_fallback_title() {
        let file = |name: &str| ImportFile::new(name, "audio/mpeg", Bytes::new());
        assert_eq!(file("Amazing Grace.mp3").fallback_title(), "Amazing Grace");
        assert_eq!(file("  .mp3").fallback_title(), ".mp3");
        assert_eq!(file("").fallback_title(), UNTITLED);
    }

    #[test]
    fn test_is_audio() {
        assert!(ImportFile::new("a.flac", "audio/flac", Bytes::new()).is_audio());
        assert!(!ImportFile::new("a.jpg", "image/jpeg", Bytes::new()).is_audio());
    }

    #[test]
    fn test_hydrate_prefers_stub_metadata() {
        let id = SongId::new();
        let stub = SongStub {
            id,
            title: "Stub title".to_string(),
            artist: "Stub artist".to_string(),
            album: "Stub album".to_string(),
            lyrics: Some("la la".to_string()),
        };

        let song = Song::hydrate(&stub, blob(id, Some(Bytes::from_static(b"png"))));
        assert_eq!(song.title, "Stub title");
        assert_eq!(song.duration, 181.5);
        assert_eq!(song.cover, CoverRef::Song(id));
        assert_eq!(song.lyrics.as_deref(), Some("la la"));

        let bare = Song::hydrate(&stub, blob(id, None));
        assert_eq!(bare.cover, CoverRef::Placeholder);
        assert_eq!(bare.stub(), stub);
    }

    #[test]
    fn test_song_blob_validation() {
        let mut b = blob(SongId::new(), None);
        assert!(b.validate().is_ok());
        b.duration = -1.0;
        assert!(b.validate().is_err());
        b.duration = f64::NAN;
        assert!(b.validate().is_err());
    }

    #[test]
    fn test_playlist_name_validation() {
        assert_eq!(validate_playlist_name("  Chill  ").unwrap(), "Chill");
        assert!(validate_playlist_name("   ").is_err());
        assert!(validate_playlist_name(&"x".repeat(201)).is_err());
    }

    #[test]
    fn test_playlist_record_json_shape() {
        let playlist = Playlist::new("Gospel");
        let json = serde_json::to_value(playlist.record()).unwrap();
        assert_eq!(json["name"], "Gospel");
        assert_eq!(json["cover"]["kind"], "placeholder");
        assert!(json["songs"].as_array().unwrap().is_empty());

        let parsed: PlaylistRecord = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, playlist.record());
    }

    #[test]
    fn test_cover_ref_owned_artwork() {
        let art = ArtworkId::new();
        assert_eq!(CoverRef::Collage(art).owned_artwork(), Some(art));
        assert_eq!(CoverRef::Song(SongId::new()).owned_artwork(), None);
        assert!(CoverRef::default().is_placeholder());
    }
}
