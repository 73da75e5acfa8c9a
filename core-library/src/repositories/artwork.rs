//! Artwork repository trait and implementation

use crate::error::{LibraryError, Result};
use crate::models::{Artwork, ArtworkId};
use async_trait::async_trait;
use bytes::Bytes;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

/// Storage for playlist cover images
#[async_trait]
pub trait ArtworkRepository: Send + Sync {
    /// Insert new artwork
    ///
    /// # Errors
    /// Returns error if validation fails or the id already exists.
    async fn insert(&self, artwork: &Artwork) -> Result<()>;

    /// Find artwork by its ID
    async fn find_by_id(&self, id: ArtworkId) -> Result<Option<Artwork>>;

    /// Delete artwork by ID
    ///
    /// # Returns
    /// - `Ok(true)` if artwork was deleted
    /// - `Ok(false)` if artwork was not found
    async fn delete(&self, id: ArtworkId) -> Result<bool>;

    /// Count total artworks
    async fn count(&self) -> Result<i64>;
}

/// SQLite implementation of ArtworkRepository
pub struct SqliteArtworkRepository {
    pool: SqlitePool,
}

impl SqliteArtworkRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn map_row(row: &SqliteRow) -> Result<Artwork> {
        let id: String = row.try_get("id")?;
        let id = ArtworkId::from_string(&id).map_err(|e| LibraryError::InvalidInput {
            field: "id".to_string(),
            message: e.to_string(),
        })?;
        let data: Vec<u8> = row.try_get("data")?;
        let width: i64 = row.try_get("width")?;
        let height: i64 = row.try_get("height")?;

        Ok(Artwork {
            id,
            data: Bytes::from(data),
            mime_type: row.try_get("mime_type")?,
            width: u32::try_from(width).unwrap_or(0),
            height: u32::try_from(height).unwrap_or(0),
            created_at: row.try_get("created_at")?,
        })
    }
}

#[async_trait]
impl ArtworkRepository for SqliteArtworkRepository {
    async fn insert(&self, artwork: &Artwork) -> Result<()> {
        artwork.validate().map_err(|msg| LibraryError::InvalidInput {
            field: "artwork".to_string(),
            message: msg,
        })?;

        sqlx::query(
            r#"
            INSERT INTO artworks (id, data, mime_type, width, height, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(artwork.id.to_string())
        .bind(artwork.data.as_ref())
        .bind(&artwork.mime_type)
        .bind(i64::from(artwork.width))
        .bind(i64::from(artwork.height))
        .bind(artwork.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_by_id(&self, id: ArtworkId) -> Result<Option<Artwork>> {
        let row = sqlx::query("SELECT * FROM artworks WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(Self::map_row).transpose()
    }

    async fn delete(&self, id: ArtworkId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM artworks WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn count(&self) -> Result<i64> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM artworks")
            .fetch_one(&self.pool)
            .await?;

        Ok(count.0)
    }
}
