//! # Metadata Enrichment
//!
//! Import-time metadata for the library:
//!
//! - [`tags`]: embedded tag and cover extraction (`lofty`), also the duration
//!   probe used before a song is stored
//! - [`remote`]: best-match lookup for songs with unknown artist or album
//! - [`enrichment`]: the pipeline combining both, plugged into the library
//!   store as its [`SongEnricher`](core_library::SongEnricher)
//! - [`artwork`]: collage and placeholder cover rendering (`image`)
//! - [`lyrics`]: generated lyrics and artist biographies

pub mod artwork;
pub mod enrichment;
pub mod error;
pub mod lyrics;
pub mod remote;
pub mod tags;

pub use artwork::CollageRenderer;
pub use enrichment::EnrichmentPipeline;
pub use error::{MetadataError, Result};
pub use lyrics::{GeminiTextService, LyricsAndBioService, LyricsQuery, LyricsService, TextOutcome};
pub use remote::{ITunesLookup, RemoteArtwork, RemoteMatch, RemoteMetadataLookup};
pub use tags::{LoftyTagReader, TagFields, TagReadOutcome, TagReader};
