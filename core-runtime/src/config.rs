//! # Core Configuration Module
//!
//! Tunables for a player session.
//!
//! ## Overview
//!
//! `CoreConfig` is plain data: host bridges (settings store, HTTP client,
//! media surface) are handed to `core_service::MusicSession` directly. The
//! config can be deserialized from a host settings file, every field has a
//! default, and [`CoreConfig::validate`] fails fast on values the core cannot
//! work with.
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::CoreConfig;
//! use std::time::Duration;
//!
//! let config = CoreConfig::builder()
//!     .database_path("/home/me/.local/share/cadence/library.db")
//!     .lookup_timeout(Duration::from_secs(5))
//!     .lyrics_api_key(std::env::var("GEMINI_API_KEY").ok())
//!     .build()?;
//! ```

use crate::error::{Error, Result};
use crate::events::DEFAULT_EVENT_BUFFER_SIZE;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Default upper bound for a single remote lookup.
pub const DEFAULT_LOOKUP_TIMEOUT_MS: u64 = 10_000;

/// Core configuration for a player session.
#[derive(Clone, Serialize, Deserialize, PartialEq)]
pub struct CoreConfig {
    /// SQLite file holding the binary tier; `None` keeps it in memory.
    #[serde(default)]
    pub database_path: Option<PathBuf>,

    /// Bound applied to every remote metadata, artwork and lyrics request.
    #[serde(default = "default_lookup_timeout_ms")]
    pub lookup_timeout_ms: u64,

    #[serde(default = "default_event_buffer_size")]
    pub event_buffer_size: usize,

    #[serde(default)]
    pub features: FeatureFlags,

    #[serde(default)]
    pub lyrics: LyricsApiConfig,
}

fn default_lookup_timeout_ms() -> u64 {
    DEFAULT_LOOKUP_TIMEOUT_MS
}

fn default_event_buffer_size() -> usize {
    DEFAULT_EVENT_BUFFER_SIZE
}

impl std::fmt::Debug for CoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreConfig")
            .field("database_path", &self.database_path)
            .field("lookup_timeout_ms", &self.lookup_timeout_ms)
            .field("event_buffer_size", &self.event_buffer_size)
            .field("features", &self.features)
            .field("lyrics", &self.lyrics)
            .finish()
    }
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            database_path: None,
            lookup_timeout_ms: DEFAULT_LOOKUP_TIMEOUT_MS,
            event_buffer_size: DEFAULT_EVENT_BUFFER_SIZE,
            features: FeatureFlags::default(),
            lyrics: LyricsApiConfig::default(),
        }
    }
}

/// Feature flags control optional functionality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureFlags {
    /// Query the remote catalogue when tags leave artist or album unknown
    #[serde(default = "enabled")]
    pub enable_remote_lookup: bool,

    /// Generate lyrics and artist biographies
    #[serde(default = "enabled")]
    pub enable_lyrics: bool,
}

fn enabled() -> bool {
    true
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            enable_remote_lookup: true,
            enable_lyrics: true,
        }
    }
}

/// Settings for the generative text provider behind lyrics and biographies.
///
/// A missing key is not a configuration error: the session still starts and
/// lyric requests answer with a "not configured" placeholder.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct LyricsApiConfig {
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,
}

fn default_model() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_endpoint() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_max_output_tokens() -> u32 {
    2048
}

impl Default for LyricsApiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_model(),
            endpoint: default_endpoint(),
            max_output_tokens: default_max_output_tokens(),
        }
    }
}

impl std::fmt::Debug for LyricsApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LyricsApiConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("model", &self.model)
            .field("endpoint", &self.endpoint)
            .field("max_output_tokens", &self.max_output_tokens)
            .finish()
    }
}

impl LyricsApiConfig {
    /// Checks if an API key is configured
    pub fn has_api_key(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.trim().is_empty())
    }

    pub fn validate(&self) -> Result<()> {
        if self.model.trim().is_empty() {
            return Err(Error::Config("Lyrics model cannot be empty".to_string()));
        }
        if !self.endpoint.starts_with("https://") && !self.endpoint.starts_with("http://") {
            return Err(Error::Config(format!(
                "Lyrics endpoint must be an http(s) URL, got '{}'",
                self.endpoint
            )));
        }
        if self.max_output_tokens == 0 {
            return Err(Error::Config(
                "Lyrics max_output_tokens must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

impl CoreConfig {
    pub fn builder() -> CoreConfigBuilder {
        CoreConfigBuilder::default()
    }

    /// Parse a JSON document, filling absent fields with defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| Error::Config(format!("Invalid configuration: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn lookup_timeout(&self) -> Duration {
        Duration::from_millis(self.lookup_timeout_ms)
    }

    /// Validates the configuration and returns an error if invalid.
    pub fn validate(&self) -> Result<()> {
        if let Some(path) = &self.database_path {
            if path.as_os_str().is_empty() {
                return Err(Error::Config("Database path cannot be empty".to_string()));
            }
        }

        if self.lookup_timeout_ms == 0 {
            return Err(Error::Config(
                "Lookup timeout must be greater than 0ms".to_string(),
            ));
        }
        if self.lookup_timeout_ms > 120_000 {
            return Err(Error::Config(
                "Lookup timeout exceeds maximum of 120 seconds".to_string(),
            ));
        }

        if self.event_buffer_size == 0 {
            return Err(Error::Config(
                "Event buffer size must be greater than 0".to_string(),
            ));
        }

        if self.features.enable_lyrics {
            self.lyrics.validate()?;
        }

        Ok(())
    }
}

/// Builder for [`CoreConfig`].
#[derive(Debug, Default)]
pub struct CoreConfigBuilder {
    config: CoreConfig,
}

impl CoreConfigBuilder {
    pub fn database_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.config.database_path = Some(path.into());
        self
    }

    /// Keep the binary tier in memory (tests, ephemeral sessions).
    pub fn in_memory(mut self) -> Self {
        self.config.database_path = None;
        self
    }

    pub fn lookup_timeout(mut self, timeout: Duration) -> Self {
        self.config.lookup_timeout_ms = timeout.as_millis() as u64;
        self
    }

    pub fn event_buffer_size(mut self, size: usize) -> Self {
        self.config.event_buffer_size = size;
        self
    }

    pub fn enable_remote_lookup(mut self, enabled: bool) -> Self {
        self.config.features.enable_remote_lookup = enabled;
        self
    }

    pub fn enable_lyrics(mut self, enabled: bool) -> Self {
        self.config.features.enable_lyrics = enabled;
        self
    }

    pub fn lyrics_api_key(mut self, key: Option<String>) -> Self {
        self.config.lyrics.api_key = key;
        self
    }

    pub fn lyrics_model(mut self, model: impl Into<String>) -> Self {
        self.config.lyrics.model = model.into();
        self
    }

    pub fn lyrics_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.config.lyrics.endpoint = endpoint.into();
        self
    }

    /// Validates and returns the configuration.
    pub fn build(self) -> Result<CoreConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
