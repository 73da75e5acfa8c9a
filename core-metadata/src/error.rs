use bridge_traits::error::BridgeError;
use core_library::LibraryError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MetadataError {
    #[error("Failed to read tags: {0}")]
    TagRead(String),

    #[error("Remote lookup failed: {0}")]
    Lookup(String),

    #[error("Remote lookup timed out after {timeout_ms}ms")]
    LookupTimeout { timeout_ms: u64 },

    #[error("Artwork processing failed: {0}")]
    Artwork(String),

    #[error("Image processing error: {0}")]
    Image(#[from] image::ImageError),

    /// A text provider was called without an API key.
    #[error("Missing credentials: {0}")]
    MissingCredentials(String),

    #[error("Text provider error: {0}")]
    Provider(String),

    #[error("Bridge error: {0}")]
    Bridge(#[from] BridgeError),
}

impl From<MetadataError> for LibraryError {
    fn from(err: MetadataError) -> Self {
        LibraryError::Artwork(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, MetadataError>;
