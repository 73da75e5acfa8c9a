//! Settings Storage using SQLite

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    storage::SettingsStore,
    time::{Clock, SystemClock},
};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions},
    Row,
};
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, error};

/// SQLite-backed settings store implementation
///
/// Every value is stored as text together with its type tag, so reading a
/// `bool` key as a string is reported as a mismatch rather than misparsed.
pub struct SqliteSettingsStore {
    pool: SqlitePool,
    clock: Arc<dyn Clock>,
}

impl SqliteSettingsStore {
    /// Create a new settings store with the given database path
    pub async fn new(db_path: PathBuf) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(BridgeError::Io)?;
        }

        // SQLite URLs want forward slashes
        let path_str = db_path.to_string_lossy().replace('\\', "/");
        let options = SqliteConnectOptions::from_str(&format!("sqlite://{}", path_str))
            .map_err(settings_error("Invalid database path"))?
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await
            .map_err(settings_error("Failed to connect to DB"))?;

        let store = Self::from_pool(pool).await?;
        debug!(path = ?db_path, "Initialized settings store");
        Ok(store)
    }

    /// Create an in-memory settings store (for testing)
    ///
    /// Limited to one connection: every new in-memory connection would open
    /// its own empty database.
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .map_err(settings_error("Failed to connect to DB"))?;

        Self::from_pool(pool).await
    }

    /// Replace the clock used for `updated_at`.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    async fn from_pool(pool: SqlitePool) -> Result<Self> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS settings (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                value_type TEXT NOT NULL,
                updated_at INTEGER NOT NULL
            )
            "#,
        )
        .execute(&pool)
        .await
        .map_err(settings_error("Failed to create table"))?;

        Ok(Self {
            pool,
            clock: Arc::new(SystemClock),
        })
    }

    /// Set a value with type information
    async fn set_value(&self, key: &str, value: &str, value_type: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO settings (key, value, value_type, updated_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                value_type = excluded.value_type,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(value_type)
        .bind(self.clock.unix_timestamp())
        .execute(&self.pool)
        .await
        .map_err(settings_error("Failed to set setting"))?;

        debug!(key = key, value_type = value_type, bytes = value.len(), "Stored setting");
        Ok(())
    }

    /// Get a value and verify its type
    async fn get_value(&self, key: &str, expected_type: &str) -> Result<Option<String>> {
        let row = sqlx::query("SELECT value, value_type FROM settings WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(settings_error("Failed to get setting"))?;

        let Some(row) = row else {
            return Ok(None);
        };

        let value: String = row.get(0);
        let value_type: String = row.get(1);

        if value_type != expected_type {
            error!(
                key = key,
                expected = expected_type,
                actual = value_type,
                "Type mismatch"
            );
            return Err(BridgeError::OperationFailed(format!(
                "Type mismatch: expected {}, got {}",
                expected_type, value_type
            )));
        }

        Ok(Some(value))
    }
}

fn settings_error(context: &'static str) -> impl Fn(sqlx::Error) -> BridgeError {
    move |e| BridgeError::Settings(format!("{}: {}", context, e))
}

#[async_trait]
impl SettingsStore for SqliteSettingsStore {
    async fn set_string(&self, key: &str, value: &str) -> Result<()> {
        self.set_value(key, value, "string").await
    }

    async fn get_string(&self, key: &str) -> Result<Option<String>> {
        self.get_value(key, "string").await
    }

    async fn set_bool(&self, key: &str, value: bool) -> Result<()> {
        self.set_value(key, &value.to_string(), "bool").await
    }

    async fn get_bool(&self, key: &str) -> Result<Option<bool>> {
        match self.get_value(key, "bool").await? {
            Some(s) => Ok(Some(s.parse().map_err(|e| {
                BridgeError::OperationFailed(format!("Parse error: {}", e))
            })?)),
            None => Ok(None),
        }
    }

    async fn delete(&self, key: &str) -> Result<()> {
        sqlx::query("DELETE FROM settings WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await
            .map_err(settings_error("Failed to delete setting"))?;

        debug!(key = key, "Deleted setting");
        Ok(())
    }

    async fn has_key(&self, key: &str) -> Result<bool> {
        let row = sqlx::query("SELECT 1 FROM settings WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(settings_error("Failed to check key"))?;

        Ok(row.is_some())
    }

    async fn list_keys(&self) -> Result<Vec<String>> {
        let rows = sqlx::query("SELECT key FROM settings ORDER BY key")
            .fetch_all(&self.pool)
            .await
            .map_err(settings_error("Failed to list keys"))?;

        Ok(rows.into_iter().map(|row| row.get(0)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_string_operations() {
        let store = SqliteSettingsStore::in_memory().await.unwrap();

        store.set_string("library.playlists", "[]").await.unwrap();
        assert_eq!(
            store.get_string("library.playlists").await.unwrap(),
            Some("[]".to_string())
        );

        store.set_string("library.playlists", "[{}]").await.unwrap();
        assert_eq!(
            store.get_string("library.playlists").await.unwrap(),
            Some("[{}]".to_string())
        );

        store.delete("library.playlists").await.unwrap();
        assert_eq!(store.get_string("library.playlists").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_bool_round_trip_and_type_mismatch() {
        let store = SqliteSettingsStore::in_memory().await.unwrap();

        store.set_bool("playback.shuffle", true).await.unwrap();
        assert_eq!(store.get_bool("playback.shuffle").await.unwrap(), Some(true));
        assert!(store.get_string("playback.shuffle").await.is_err());
    }

    #[tokio::test]
    async fn test_list_keys_and_has_key() {
        let store = SqliteSettingsStore::in_memory().await.unwrap();

        store.set_string("playback.repeat", "none").await.unwrap();
        store.set_bool("playback.shuffle", false).await.unwrap();

        assert!(store.has_key("playback.repeat").await.unwrap());
        assert!(!store.has_key("missing").await.unwrap());
        assert_eq!(
            store.list_keys().await.unwrap(),
            vec!["playback.repeat", "playback.shuffle"]
        );
    }

    #[tokio::test]
    async fn test_file_backed_store_persists() {
        let dir = std::env::temp_dir().join(format!("cadence-settings-{}", std::process::id()));
        let path = dir.join("settings.db");

        {
            let store = SqliteSettingsStore::new(path.clone()).await.unwrap();
            store.set_string("library.playlists", "[]").await.unwrap();
        }

        let reopened = SqliteSettingsStore::new(path).await.unwrap();
        assert_eq!(
            reopened.get_string("library.playlists").await.unwrap(),
            Some("[]".to_string())
        );

        let _ = std::fs::remove_dir_all(dir);
    }
}
