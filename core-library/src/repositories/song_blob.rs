//! Song blob repository trait and implementation

use crate::error::{LibraryError, Result};
use crate::models::{SongBlob, SongId};
use async_trait::async_trait;
use bytes::Bytes;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

/// Binary-tier storage keyed by song id
#[async_trait]
pub trait SongBlobRepository: Send + Sync {
    /// Insert the blob for a song.
    ///
    /// A single statement, so the entry is either fully written or absent.
    ///
    /// # Errors
    /// Returns error if validation fails, the id already exists or the
    /// database is unavailable.
    async fn insert(&self, blob: &SongBlob) -> Result<()>;

    /// Fetch a blob; `Ok(None)` when no entry exists for the id.
    async fn find_by_id(&self, id: SongId) -> Result<Option<SongBlob>>;

    /// Fetch a blob that must exist.
    ///
    /// # Errors
    /// `LibraryError::BlobMissing` when the entry is absent.
    async fn get(&self, id: SongId) -> Result<SongBlob> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| LibraryError::BlobMissing {
                song_id: id.to_string(),
            })
    }

    /// Returns `true` if a row was deleted.
    async fn delete(&self, id: SongId) -> Result<bool>;

    async fn count(&self) -> Result<i64>;
}

/// SQLite implementation of SongBlobRepository
pub struct SqliteSongBlobRepository {
    pool: SqlitePool,
}

impl SqliteSongBlobRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn map_row(row: &SqliteRow) -> Result<SongBlob> {
        let id: String = row.try_get("id")?;
        let id = SongId::from_string(&id).map_err(|e| LibraryError::InvalidInput {
            field: "id".to_string(),
            message: e.to_string(),
        })?;
        let audio: Vec<u8> = row.try_get("audio")?;
        let cover: Option<Vec<u8>> = row.try_get("cover")?;

        Ok(SongBlob {
            id,
            audio: Bytes::from(audio),
            mime_type: row.try_get("mime_type")?,
            cover: cover.map(Bytes::from),
            cover_mime_type: row.try_get("cover_mime_type")?,
            duration: row.try_get("duration")?,
            title: row.try_get("title")?,
            artist: row.try_get("artist")?,
            album: row.try_get("album")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

#[async_trait]
impl SongBlobRepository for SqliteSongBlobRepository {
    async fn insert(&self, blob: &SongBlob) -> Result<()> {
        blob.validate().map_err(|msg| LibraryError::InvalidInput {
            field: "song_blob".to_string(),
            message: msg,
        })?;

        sqlx::query(
            r#"
            INSERT INTO song_blobs (
                id, audio, mime_type, cover, cover_mime_type,
                duration, title, artist, album, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(blob.id.to_string())
        .bind(blob.audio.as_ref())
        .bind(&blob.mime_type)
        .bind(blob.cover.as_deref())
        .bind(&blob.cover_mime_type)
        .bind(blob.duration)
        .bind(&blob.title)
        .bind(&blob.artist)
        .bind(&blob.album)
        .bind(blob.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_by_id(&self, id: SongId) -> Result<Option<SongBlob>> {
        let row = sqlx::query("SELECT * FROM song_blobs WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(Self::map_row).transpose()
    }

    async fn delete(&self, id: SongId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM song_blobs WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn count(&self) -> Result<i64> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM song_blobs")
            .fetch_one(&self.pool)
            .await?;

        Ok(count.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_test_pool;

    async fn setup_repo() -> SqliteSongBlobRepository {
        SqliteSongBlobRepository::new(create_test_pool().await.unwrap())
    }

    fn create_test_blob(title: &str, cover: Option<&'static [u8]>) -> SongBlob {
        SongBlob {
            id: SongId::new(),
            audio: Bytes::from_static(b"fLaC\x00\x00\x00\x22"),
            mime_type: "audio/flac".to_string(),
            cover: cover.map(Bytes::from_static),
            cover_mime_type: cover.map(|_| "image/jpeg".to_string()),
            duration: 245.25,
            title: title.to_string(),
            artist: "Aretha Franklin".to_string(),
            album: "Amazing Grace".to_string(),
            created_at: 1_700_000_000,
        }
    }

    #[tokio::test]
    async fn test_insert_and_find() {
        let repo = setup_repo().await;
        let blob = create_test_blob("Mary, Don't You Weep", Some(b"\xff\xd8\xff"));

        repo.insert(&blob).await.unwrap();

        let found = repo.find_by_id(blob.id).await.unwrap().unwrap();
        assert_eq!(found, blob);
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_missing_blob() {
        let repo = setup_repo().await;
        let id = SongId::new();

        assert!(repo.find_by_id(id).await.unwrap().is_none());
        match repo.get(id).await {
            Err(LibraryError::BlobMissing { song_id }) => assert_eq!(song_id, id.to_string()),
            other => panic!("expected BlobMissing, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_insert_without_cover() {
        let repo = setup_repo().await;
        let blob = create_test_blob("Precious Memories", None);
        repo.insert(&blob).await.unwrap();

        let found = repo.get(blob.id).await.unwrap();
        assert!(found.cover.is_none());
        assert!(found.cover_mime_type.is_none());
    }

    #[tokio::test]
    async fn test_duplicate_id_rejected() {
        let repo = setup_repo().await;
        let blob = create_test_blob("Never Grow Old", None);
        repo.insert(&blob).await.unwrap();

        assert!(repo.insert(&blob).await.is_err());
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_invalid_blob_rejected() {
        let repo = setup_repo().await;
        let mut blob = create_test_blob("How I Got Over", None);
        blob.audio = Bytes::new();

        let result = repo.insert(&blob).await;
        assert!(matches!(result, Err(LibraryError::InvalidInput { .. })));
        assert_eq!(repo.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_delete() {
        let repo = setup_repo().await;
        let blob = create_test_blob("Climbing Higher Mountains", None);
        repo.insert(&blob).await.unwrap();

        assert!(repo.delete(blob.id).await.unwrap());
        assert!(!repo.delete(blob.id).await.unwrap());
        assert_eq!(repo.count().await.unwrap(), 0);
    }
}
