//! # Remote Metadata Lookup
//!
//! Best-match artist/album/artwork search for songs whose tags left fields
//! unknown. The bundled implementation queries the iTunes Search API:
//!
//! - **Search**: `https://itunes.apple.com/search?term={term}&entity=song&limit=1`
//! - **Artwork**: `artworkUrl100` of the match, upgraded to 600x600
//!
//! ```ignore
//! let lookup = ITunesLookup::new(http_client);
//! if let Some(found) = lookup.search("Amazing Grace").await? {
//!     println!("{:?} / {:?}", found.artist, found.album);
//! }
//! ```

use crate::error::{MetadataError, Result};
use async_trait::async_trait;
use bridge_traits::http::{HttpClient, HttpRequest};
use bytes::Bytes;
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;

/// iTunes Search API base URL
const ITUNES_API_BASE: &str = "https://itunes.apple.com";

/// Best match returned by a remote lookup.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RemoteMatch {
    pub artist: Option<String>,
    pub album: Option<String>,
    pub artwork_url: Option<String>,
}

/// Downloaded cover image.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteArtwork {
    pub data: Bytes,
    pub mime_type: String,
}

/// Search service for missing song metadata.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RemoteMetadataLookup: Send + Sync {
    /// Best match for `term`, or `None` when nothing matched.
    async fn search(&self, term: &str) -> Result<Option<RemoteMatch>>;

    /// Download the image at `url`.
    async fn fetch_artwork(&self, url: &str) -> Result<RemoteArtwork>;
}

/// iTunes Search API client
pub struct ITunesLookup {
    http_client: Arc<dyn HttpClient>,
    base_url: String,
}

impl ITunesLookup {
    pub fn new(http_client: Arc<dyn HttpClient>) -> Self {
        Self {
            http_client,
            base_url: ITUNES_API_BASE.to_string(),
        }
    }

    /// Point the client at a different host (used by tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn search_url(&self, term: &str) -> String {
        format!(
            "{}/search?term={}&entity=song&limit=1",
            self.base_url,
            urlencoding::encode(term)
        )
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchResult>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchResult {
    artist_name: Option<String>,
    collection_name: Option<String>,
    artwork_url100: Option<String>,
}

#[async_trait]
impl RemoteMetadataLookup for ITunesLookup {
    async fn search(&self, term: &str) -> Result<Option<RemoteMatch>> {
        let url = self.search_url(term);
        debug!(term = %term, "Searching iTunes");

        let response = self.http_client.execute(HttpRequest::get(&url)).await?;
        if !response.is_success() {
            return Err(MetadataError::Lookup(format!(
                "iTunes API error: HTTP {}",
                response.status
            )));
        }

        let parsed: SearchResponse = response
            .json()
            .map_err(|e| MetadataError::Lookup(format!("Parse error: {}", e)))?;

        Ok(parsed.results.into_iter().next().map(|result| RemoteMatch {
            artist: result.artist_name.filter(|s| !s.trim().is_empty()),
            album: result.collection_name.filter(|s| !s.trim().is_empty()),
            artwork_url: result.artwork_url100.map(|u| u.replace("100x100", "600x600")),
        }))
    }

    async fn fetch_artwork(&self, url: &str) -> Result<RemoteArtwork> {
        let response = self.http_client.execute(HttpRequest::get(url)).await?;
        if !response.is_success() {
            return Err(MetadataError::Lookup(format!(
                "Artwork download failed: HTTP {}",
                response.status
            )));
        }
        if response.body.is_empty() {
            return Err(MetadataError::Lookup("Artwork download was empty".to_string()));
        }

        let mime_type = response
            .headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case("content-type"))
            .map(|(_, v)| v.split(';').next().unwrap_or(v).trim().to_string())
            .filter(|v| v.starts_with("image/"))
            .unwrap_or_else(|| "image/jpeg".to_string());

        Ok(RemoteArtwork {
            data: response.body,
            mime_type,
        })
    }
}

/// Strip featured-artist and remix annotations so the search matches the
/// base recording: `"Song (feat. X) (Club Mix)"` becomes `"Song"`.
pub fn clean_search_title(title: &str) -> String {
    let mut out = String::with_capacity(title.len());
    let mut rest = title;

    while let Some(open) = rest.find('(') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let Some(close) = after.find(')') else {
            out.push_str(&rest[open..]);
            rest = "";
            break;
        };

        let inner = after[..close].trim().to_lowercase();
        let annotation =
            inner.starts_with("feat.") || inner.starts_with("ft.") || inner.ends_with("mix");
        if !annotation {
            out.push_str(&rest[open..open + 1 + close + 1]);
        }
        rest = &after[close + 1..];
    }
    out.push_str(rest);

    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::error::Result as BridgeResult;
    use bridge_traits::http::HttpResponse;
    use std::collections::HashMap;
    use std::sync::Mutex;

    struct StubHttp {
        status: u16,
        body: &'static str,
        headers: HashMap<String, String>,
        urls: Mutex<Vec<String>>,
    }

    impl StubHttp {
        fn new(status: u16, body: &'static str) -> Self {
            Self {
                status,
                body,
                headers: HashMap::new(),
                urls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl HttpClient for StubHttp {
        async fn execute(&self, request: HttpRequest) -> BridgeResult<HttpResponse> {
            self.urls.lock().unwrap().push(request.url);
            Ok(HttpResponse {
                status: self.status,
                headers: self.headers.clone(),
                body: Bytes::from_static(self.body.as_bytes()),
            })
        }
    }

    #[test]
    fn test_clean_search_title() {
        assert_eq!(clean_search_title("Amazing Grace"), "Amazing Grace");
        assert_eq!(
            clean_search_title("Let It Go (feat. Someone) (Club Mix)"),
            "Let It Go"
        );
        assert_eq!(clean_search_title("Hold On (FT. Guest)"), "Hold On");
        assert_eq!(clean_search_title("Blue (Da Ba Dee) (Radio Remix)"), "Blue (Da Ba Dee)");
        assert_eq!(clean_search_title("Broken (feat. X"), "Broken (feat. X");
        assert_eq!(clean_search_title("  Spaced   Out  "), "Spaced Out");
    }

    #[tokio::test]
    async fn test_search_maps_first_result() {
        let http = Arc::new(StubHttp::new(
            200,
            r#"{"resultCount":1,"results":[{"artistName":"Aretha Franklin","collectionName":"Amazing Grace","artworkUrl100":"https://is1.example/img/100x100bb.jpg"}]}"#,
        ));
        let lookup = ITunesLookup::new(http.clone());

        let found = lookup.search("Amazing Grace").await.unwrap().unwrap();
        assert_eq!(found.artist.as_deref(), Some("Aretha Franklin"));
        assert_eq!(found.album.as_deref(), Some("Amazing Grace"));
        assert_eq!(
            found.artwork_url.as_deref(),
            Some("https://is1.example/img/600x600bb.jpg")
        );

        let urls = http.urls.lock().unwrap();
        assert_eq!(
            urls[0],
            "https://itunes.apple.com/search?term=Amazing%20Grace&entity=song&limit=1"
        );
    }

    #[tokio::test]
    async fn test_search_without_results() {
        let http = Arc::new(StubHttp::new(200, r#"{"resultCount":0,"results":[]}"#));
        let lookup = ITunesLookup::new(http);
        assert!(lookup.search("zzzz").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_search_http_error() {
        let http = Arc::new(StubHttp::new(503, ""));
        let lookup = ITunesLookup::new(http).with_base_url("http://localhost");
        assert!(matches!(
            lookup.search("x").await,
            Err(MetadataError::Lookup(_))
        ));
    }

    #[tokio::test]
    async fn test_fetch_artwork_content_type() {
        let mut stub = StubHttp::new(200, "\u{1}PNG");
        stub.headers
            .insert("Content-Type".to_string(), "image/png; charset=binary".to_string());
        let lookup = ITunesLookup::new(Arc::new(stub));

        let artwork = lookup.fetch_artwork("https://x/600x600.png").await.unwrap();
        assert_eq!(artwork.mime_type, "image/png");
        assert!(!artwork.data.is_empty());
    }
}
