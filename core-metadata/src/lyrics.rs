//! # Lyrics and Artist Biographies
//!
//! Text generated by a hosted language model through the [`HttpClient`]
//! bridge. [`GeminiTextService`] talks to the Gemini `generateContent` REST
//! endpoint; [`LyricsService`] turns raw provider results into the strings the
//! player shows.
//!
//! ## Outcomes
//!
//! | Situation | Lyrics | Biography |
//! |-----------|--------|-----------|
//! | text returned | cleaned text | text |
//! | empty answer | `Lyrics not found.` | `Couldn't fetch biography at this time` |
//! | no API key | `API Key not configured.` | `API Key not configured.` |
//! | provider error | `Could not fetch lyrics.` | `Couldn't fetch biography at this time` |

use crate::error::{MetadataError, Result};
use async_trait::async_trait;
use bridge_traits::http::{HttpClient, HttpRequest};
use core_library::{UNKNOWN_ALBUM, UNKNOWN_ARTIST};
use core_runtime::config::{CoreConfig, LyricsApiConfig};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

pub const LYRICS_NOT_FOUND: &str = "Lyrics not found.";
pub const API_KEY_NOT_CONFIGURED: &str = "API Key not configured.";
pub const LYRICS_UNAVAILABLE: &str = "Could not fetch lyrics.";
pub const BIOGRAPHY_UNAVAILABLE: &str = "Couldn't fetch biography at this time";

/// Song identity used to request lyrics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LyricsQuery {
    pub title: String,
    pub artist: String,
    pub album: Option<String>,
}

impl LyricsQuery {
    pub fn new(title: impl Into<String>, artist: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            artist: artist.into(),
            album: None,
        }
    }

    /// Attach the album unless it is the unknown placeholder.
    pub fn with_album(mut self, album: impl Into<String>) -> Self {
        let album = album.into();
        if !album.trim().is_empty() && album != UNKNOWN_ALBUM {
            self.album = Some(album);
        }
        self
    }
}

/// Provider of raw lyrics and biography text.
///
/// `Ok(None)` means the provider answered without usable text.
#[async_trait]
pub trait LyricsAndBioService: Send + Sync {
    /// # Errors
    /// `MetadataError::MissingCredentials` without an API key,
    /// `MetadataError::Provider` for transport or API failures.
    async fn lyrics(&self, query: &LyricsQuery) -> Result<Option<String>>;

    async fn biography(&self, artist: &str) -> Result<Option<String>>;
}

// =============================================================================
// Gemini provider
// =============================================================================

/// Gemini `generateContent` client
pub struct GeminiTextService {
    http_client: Arc<dyn HttpClient>,
    config: LyricsApiConfig,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: [Content<'a>; 1],
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: [Part<'a>; 1],
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

impl GeminiTextService {
    pub fn new(http_client: Arc<dyn HttpClient>, config: LyricsApiConfig) -> Self {
        Self {
            http_client,
            config,
        }
    }

    fn url(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.config.endpoint.trim_end_matches('/'),
            self.config.model
        )
    }

    async fn generate(&self, prompt: &str) -> Result<Option<String>> {
        let api_key = match self.config.api_key.as_deref().map(str::trim) {
            Some(key) if !key.is_empty() => key,
            _ => {
                return Err(MetadataError::MissingCredentials(
                    "lyrics API key not set".to_string(),
                ))
            }
        };

        let body = GenerateRequest {
            contents: [Content {
                parts: [Part { text: prompt }],
            }],
            generation_config: GenerationConfig {
                max_output_tokens: self.config.max_output_tokens,
            },
        };
        let request = HttpRequest::post(self.url())
            .header("x-goog-api-key", api_key)
            .json(&body)?;

        let response = self.http_client.execute(request).await?;
        if !response.is_success() {
            return Err(MetadataError::Provider(format!(
                "generateContent failed: HTTP {}",
                response.status
            )));
        }

        let parsed: GenerateResponse = response
            .json()
            .map_err(|e| MetadataError::Provider(format!("Parse error: {}", e)))?;

        let text: String = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        let text = text.trim();
        Ok((!text.is_empty()).then(|| text.to_string()))
    }
}

#[async_trait]
impl LyricsAndBioService for GeminiTextService {
    async fn lyrics(&self, query: &LyricsQuery) -> Result<Option<String>> {
        debug!(title = %query.title, "Requesting lyrics");
        self.generate(&lyrics_prompt(query)).await
    }

    async fn biography(&self, artist: &str) -> Result<Option<String>> {
        debug!(artist = %artist, "Requesting biography");
        self.generate(&biography_prompt(artist)).await
    }
}

/// Prompt asking for bare lyrics with no headers or commentary.
pub fn lyrics_prompt(query: &LyricsQuery) -> String {
    let artist = normalize_artist_name(&query.artist);
    let album = query
        .album
        .as_deref()
        .filter(|a| *a != UNKNOWN_ALBUM)
        .map(|a| format!(" from the album \"{}\"", a))
        .unwrap_or_default();

    format!(
        "Find the complete and accurate lyrics for the song titled \"{title}\" by the musical artist \"{artist}\"{album}.\n\
         \n\
         IMPORTANT INSTRUCTIONS:\n\
         1. Respond ONLY with the song's lyrics.\n\
         2. Do NOT include the song title, artist name, or any other headers in your response.\n\
         3. Do NOT include any conversational text like \"Here are the lyrics...\".\n\
         4. Do NOT include section markers like [Verse], [Chorus], [Bridge], etc.\n\
         5. Ensure line breaks are preserved for proper formatting.",
        title = query.title,
    )
}

pub fn biography_prompt(artist: &str) -> String {
    format!(
        "Write a short biography (two to three sentences) of the musical artist \"{}\". \
         Respond ONLY with the biography text, without headers or conversational text.",
        normalize_artist_name(artist)
    )
}

/// Primary artist of a credit: parenthetical notes and featured or
/// collaborating artists are dropped.
///
/// `"Aretha Franklin & James Cleveland (Live)"` becomes `"Aretha Franklin"`.
pub fn normalize_artist_name(artist: &str) -> String {
    const SEPARATORS: [&str; 6] = [" feat.", " ft. ", " & ", " with ", ",", " x "];

    let base = artist.split('(').next().unwrap_or(artist);
    let lowered = base.to_ascii_lowercase();
    let cut = SEPARATORS
        .iter()
        .filter_map(|sep| lowered.find(sep))
        .min()
        .unwrap_or(base.len());

    let name = base[..cut].trim();
    if name.is_empty() {
        UNKNOWN_ARTIST.to_string()
    } else {
        name.to_string()
    }
}

/// Drop a leading line that repeats the title or artist.
fn strip_echoed_heading(text: &str, title: &str, artist: &str) -> String {
    let text = text.trim();
    let mut lines = text.split('\n');
    let (Some(first), Some(_)) = (lines.next(), text.split('\n').nth(1)) else {
        return text.to_string();
    };

    let first = first.to_lowercase();
    let echoes = |needle: &str| {
        let needle = needle.trim().to_lowercase();
        !needle.is_empty() && first.contains(&needle)
    };

    if echoes(title) || echoes(artist) {
        lines.collect::<Vec<_>>().join("\n").trim().to_string()
    } else {
        text.to_string()
    }
}

// =============================================================================
// Service facade
// =============================================================================

/// Classified result of a lyrics or biography request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextOutcome {
    Found(String),
    NotFound,
    NotConfigured,
    Unavailable,
}

impl TextOutcome {
    pub fn is_found(&self) -> bool {
        matches!(self, TextOutcome::Found(_))
    }

    /// Text shown in the lyrics panel.
    pub fn lyrics_text(&self) -> &str {
        match self {
            TextOutcome::Found(text) => text,
            TextOutcome::NotFound => LYRICS_NOT_FOUND,
            TextOutcome::NotConfigured => API_KEY_NOT_CONFIGURED,
            TextOutcome::Unavailable => LYRICS_UNAVAILABLE,
        }
    }

    /// Text shown in the artist panel.
    pub fn biography_text(&self) -> &str {
        match self {
            TextOutcome::Found(text) => text,
            TextOutcome::NotConfigured => API_KEY_NOT_CONFIGURED,
            TextOutcome::NotFound | TextOutcome::Unavailable => BIOGRAPHY_UNAVAILABLE,
        }
    }
}

/// Lyrics and biography lookups with user-facing fallbacks.
///
/// Every provider call is bounded by the lookup timeout; a call that runs
/// past it is reported as [`TextOutcome::Unavailable`].
pub struct LyricsService {
    provider: Arc<dyn LyricsAndBioService>,
    enabled: bool,
    lookup_timeout: Duration,
}

impl LyricsService {
    pub fn new(provider: Arc<dyn LyricsAndBioService>) -> Self {
        Self {
            provider,
            enabled: true,
            lookup_timeout: CoreConfig::default().lookup_timeout(),
        }
    }

    /// Disabled services answer every request with `NotConfigured`.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn with_lookup_timeout(mut self, timeout: Duration) -> Self {
        self.lookup_timeout = timeout;
        self
    }

    async fn bounded<F>(&self, fut: F) -> Result<Option<String>>
    where
        F: Future<Output = Result<Option<String>>>,
    {
        tokio::time::timeout(self.lookup_timeout, fut)
            .await
            .map_err(|_| MetadataError::LookupTimeout {
                timeout_ms: self.lookup_timeout.as_millis() as u64,
            })?
    }

    pub async fn fetch_lyrics(&self, query: &LyricsQuery) -> TextOutcome {
        if !self.enabled {
            return TextOutcome::NotConfigured;
        }

        match self.bounded(self.provider.lyrics(query)).await {
            Ok(Some(text)) => {
                let artist = normalize_artist_name(&query.artist);
                let cleaned = strip_echoed_heading(&text, &query.title, &artist);
                if cleaned.is_empty() {
                    TextOutcome::NotFound
                } else {
                    TextOutcome::Found(cleaned)
                }
            }
            Ok(None) => TextOutcome::NotFound,
            Err(MetadataError::MissingCredentials(_)) => {
                warn!("Lyrics requested without an API key");
                TextOutcome::NotConfigured
            }
            Err(e) => {
                warn!(title = %query.title, error = %e, "Error fetching lyrics");
                TextOutcome::Unavailable
            }
        }
    }

    pub async fn fetch_biography(&self, artist: &str) -> TextOutcome {
        if !self.enabled {
            return TextOutcome::NotConfigured;
        }

        match self.bounded(self.provider.biography(artist)).await {
            Ok(Some(text)) => TextOutcome::Found(text.trim().to_string()),
            Ok(None) => TextOutcome::NotFound,
            Err(MetadataError::MissingCredentials(_)) => TextOutcome::NotConfigured,
            Err(e) => {
                warn!(artist = %artist, error = %e, "Error fetching biography");
                TextOutcome::Unavailable
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::error::Result as BridgeResult;
    use bridge_traits::http::HttpResponse;
    use bytes::Bytes;
    use std::collections::HashMap;
    use std::sync::Mutex;

    struct RecordingHttp {
        status: u16,
        body: String,
        requests: Mutex<Vec<HttpRequest>>,
    }

    impl RecordingHttp {
        fn new(status: u16, body: &str) -> Arc<Self> {
            Arc::new(Self {
                status,
                body: body.to_string(),
                requests: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl HttpClient for RecordingHttp {
        async fn execute(&self, request: HttpRequest) -> BridgeResult<HttpResponse> {
            self.requests.lock().unwrap().push(request);
            Ok(HttpResponse {
                status: self.status,
                headers: HashMap::new(),
                body: Bytes::from(self.body.clone()),
            })
        }
    }

    fn config_with_key() -> LyricsApiConfig {
        LyricsApiConfig {
            api_key: Some("test-key".to_string()),
            ..LyricsApiConfig::default()
        }
    }

    fn gemini_body(text: &str) -> String {
        serde_json::json!({
            "candidates": [{ "content": { "parts": [{ "text": text }] } }]
        })
        .to_string()
    }

    #[test]
    fn test_normalize_artist_name() {
        assert_eq!(normalize_artist_name("Aretha Franklin"), "Aretha Franklin");
        assert_eq!(
            normalize_artist_name("Aretha Franklin & James Cleveland"),
            "Aretha Franklin"
        );
        assert_eq!(normalize_artist_name("Drake feat. Rihanna"), "Drake");
        assert_eq!(normalize_artist_name("Artist FT. Guest"), "Artist");
        assert_eq!(normalize_artist_name("Calvin Harris, Dua Lipa"), "Calvin Harris");
        assert_eq!(normalize_artist_name("Duo X Friend"), "Duo");
        assert_eq!(normalize_artist_name("Band (Live) with Orchestra"), "Band");
        assert_eq!(normalize_artist_name("  "), UNKNOWN_ARTIST);
    }

    #[test]
    fn test_strip_echoed_heading() {
        assert_eq!(
            strip_echoed_heading("Amazing Grace - Aretha\nAmazing grace\nhow sweet", "Amazing Grace", "Aretha"),
            "Amazing grace\nhow sweet"
        );
        assert_eq!(
            strip_echoed_heading("Through many dangers\ntoils and snares", "Amazing Grace", "Aretha"),
            "Through many dangers\ntoils and snares"
        );
        // a single line is never stripped
        assert_eq!(
            strip_echoed_heading("Amazing Grace", "Amazing Grace", "Aretha"),
            "Amazing Grace"
        );
    }

    #[test]
    fn test_lyrics_prompt_album_handling() {
        let with_album = LyricsQuery::new("Respect", "Aretha Franklin feat. Someone")
            .with_album("I Never Loved a Man");
        let prompt = lyrics_prompt(&with_album);
        assert!(prompt.starts_with(
            "Find the complete and accurate lyrics for the song titled \"Respect\" by the musical artist \"Aretha Franklin\" from the album \"I Never Loved a Man\"."
        ));
        assert!(prompt.contains("5. Ensure line breaks are preserved"));

        let unknown = LyricsQuery::new("Respect", "Aretha Franklin").with_album(UNKNOWN_ALBUM);
        assert!(unknown.album.is_none());
        assert!(!lyrics_prompt(&unknown).contains("from the album"));
    }

    #[tokio::test]
    async fn test_gemini_request_shape() {
        let http = RecordingHttp::new(200, &gemini_body("line one\nline two"));
        let service = GeminiTextService::new(http.clone(), config_with_key());

        let text = service
            .lyrics(&LyricsQuery::new("Respect", "Aretha Franklin"))
            .await
            .unwrap();
        assert_eq!(text.as_deref(), Some("line one\nline two"));

        let requests = http.requests.lock().unwrap();
        let request = &requests[0];
        assert_eq!(
            request.url,
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-flash:generateContent"
        );
        assert_eq!(request.headers.get("x-goog-api-key").map(String::as_str), Some("test-key"));
        let body: serde_json::Value =
            serde_json::from_slice(request.body.as_ref().unwrap()).unwrap();
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 2048);
        assert!(body["contents"][0]["parts"][0]["text"]
            .as_str()
            .unwrap()
            .contains("\"Respect\""));
    }

    #[tokio::test]
    async fn test_missing_key_never_calls_provider() {
        let http = RecordingHttp::new(200, &gemini_body("unused"));
        let service = LyricsService::new(Arc::new(GeminiTextService::new(
            http.clone(),
            LyricsApiConfig::default(),
        )));

        let outcome = service
            .fetch_lyrics(&LyricsQuery::new("Respect", "Aretha Franklin"))
            .await;
        assert_eq!(outcome, TextOutcome::NotConfigured);
        assert_eq!(outcome.lyrics_text(), API_KEY_NOT_CONFIGURED);
        assert!(http.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_provider_error_placeholders() {
        let http = RecordingHttp::new(500, "{}");
        let service = LyricsService::new(Arc::new(GeminiTextService::new(http, config_with_key())));

        let lyrics = service
            .fetch_lyrics(&LyricsQuery::new("Respect", "Aretha Franklin"))
            .await;
        assert_eq!(lyrics.lyrics_text(), LYRICS_UNAVAILABLE);

        let bio = service.fetch_biography("Aretha Franklin").await;
        assert_eq!(bio.biography_text(), BIOGRAPHY_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_empty_answer_is_not_found() {
        let http = RecordingHttp::new(200, r#"{"candidates":[]}"#);
        let service = LyricsService::new(Arc::new(GeminiTextService::new(http, config_with_key())));

        let outcome = service
            .fetch_lyrics(&LyricsQuery::new("Respect", "Aretha Franklin"))
            .await;
        assert_eq!(outcome, TextOutcome::NotFound);
        assert_eq!(outcome.lyrics_text(), LYRICS_NOT_FOUND);
    }

    #[tokio::test]
    async fn test_fetch_lyrics_strips_heading() {
        let http = RecordingHttp::new(
            200,
            &gemini_body("Respect by Aretha Franklin\nWhat you want\nBaby, I got it"),
        );
        let service = LyricsService::new(Arc::new(GeminiTextService::new(http, config_with_key())));

        let outcome = service
            .fetch_lyrics(&LyricsQuery::new("Respect", "Aretha Franklin"))
            .await;
        assert_eq!(
            outcome,
            TextOutcome::Found("What you want\nBaby, I got it".to_string())
        );
    }

    struct StalledHttp;

    #[async_trait]
    impl HttpClient for StalledHttp {
        async fn execute(&self, _request: HttpRequest) -> BridgeResult<HttpResponse> {
            std::future::pending().await
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_stalled_provider_times_out() {
        let provider = GeminiTextService::new(Arc::new(StalledHttp), config_with_key());
        let service = LyricsService::new(Arc::new(provider))
            .with_lookup_timeout(Duration::from_millis(50));

        let lyrics = service
            .fetch_lyrics(&LyricsQuery::new("Respect", "Aretha Franklin"))
            .await;
        assert_eq!(lyrics, TextOutcome::Unavailable);
        assert_eq!(lyrics.lyrics_text(), LYRICS_UNAVAILABLE);

        let bio = service.fetch_biography("Aretha Franklin").await;
        assert_eq!(bio, TextOutcome::Unavailable);
        assert_eq!(bio.biography_text(), BIOGRAPHY_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_disabled_service() {
        let http = RecordingHttp::new(200, &gemini_body("text"));
        let service = LyricsService::new(Arc::new(GeminiTextService::new(
            http.clone(),
            config_with_key(),
        )))
        .with_enabled(false);

        assert_eq!(
            service.fetch_biography("Aretha Franklin").await,
            TextOutcome::NotConfigured
        );
        assert!(http.requests.lock().unwrap().is_empty());
    }
}
