//! Integration tests for logging system

use async_trait::async_trait;
use bridge_traits::error::Result as SinkResult;
use bridge_traits::time::{LogEntry, LogLevel, LoggerSink};
use core_runtime::logging::{init_logging, redact_if_sensitive, strip_path, LogFormat, LoggingConfig};
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct CollectingSink {
    entries: Mutex<Vec<LogEntry>>,
}

#[async_trait]
impl LoggerSink for CollectingSink {
    async fn log(&self, entry: LogEntry) -> SinkResult<()> {
        self.entries.lock().unwrap().push(entry);
        Ok(())
    }

    fn min_level(&self) -> LogLevel {
        LogLevel::Debug
    }
}

// Global subscriber can only be installed once per process, so a single
// test covers initialisation, filtering and the second-call error.
#[test]
fn test_init_logging_forwards_workspace_events() {
    let sink = Arc::new(CollectingSink::default());
    let config = LoggingConfig::default()
        .with_format(LogFormat::Compact)
        .with_level(LogLevel::Debug)
        .with_logger_sink(sink.clone());

    init_logging(config).unwrap();

    tracing::info!(target: "core_library", playlist_id = "p-1", "Playlist created");
    tracing::debug!(target: "core_playback", api_key = "AIza", "Surface ready");
    tracing::info!(target: "some_dependency", "Should be filtered out");

    {
        let entries = sink.entries.lock().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].message, "Playlist created");
        assert_eq!(entries[0].fields.get("playlist_id"), Some(&"p-1".to_string()));
        assert_eq!(entries[1].fields.get("api_key"), Some(&"[REDACTED]".to_string()));
    }

    assert!(init_logging(LoggingConfig::default()).is_err());
}

#[test]
fn test_redaction_of_credentials() {
    assert_eq!(redact_if_sensitive("api_key", "AIza-123"), "[REDACTED]");
    assert_eq!(redact_if_sensitive("Authorization", "Bearer x"), "[REDACTED]");
    assert_eq!(redact_if_sensitive("title", "Amazing Grace"), "Amazing Grace");
}

#[test]
fn test_path_stripping() {
    assert_eq!(strip_path("/home/user/music/song.mp3"), "song.mp3");
    assert_eq!(strip_path("D:\\data\\file.flac"), "file.flac");
    assert_eq!(strip_path(""), "");
}
