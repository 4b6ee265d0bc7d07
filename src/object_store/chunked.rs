/// Chunked document-store backend
///
/// Splits payloads into fixed-size chunks stored as rows in the
/// document database, for deployments without writable local disk.
/// Reads fetch one chunk per consumer pull, so multi-megabyte media
/// never sits fully buffered in memory on the way out.
use crate::error::{MediaError, MediaResult};
use crate::object_store::{ObjectReader, ObjectStore, StorageRef};
use async_trait::async_trait;
use chrono::Utc;
use futures::StreamExt;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

#[derive(Clone)]
pub struct ChunkedStore {
    pool: SqlitePool,
    chunk_size: usize,
}

impl ChunkedStore {
    pub fn new(pool: SqlitePool, chunk_size: usize) -> Self {
        debug_assert!(chunk_size > 0);
        Self { pool, chunk_size }
    }
}

#[async_trait]
impl ObjectStore for ChunkedStore {
    async fn put(&self, name: &str, content_type: &str, data: Vec<u8>) -> MediaResult<StorageRef> {
        let id = Uuid::new_v4().to_string();
        let length = data.len();

        // Header and chunks commit atomically; a failed upload leaves
        // no half-written object behind.
        let mut tx = self.pool.begin().await.map_err(MediaError::from_store)?;

        sqlx::query(
            r#"
            INSERT INTO media_objects (id, filename, content_type, length, chunk_size, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&id)
        .bind(name)
        .bind(content_type)
        .bind(length as i64)
        .bind(self.chunk_size as i64)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await
        .map_err(MediaError::from_store)?;

        for (index, chunk) in data.chunks(self.chunk_size).enumerate() {
            sqlx::query(
                r#"
                INSERT INTO media_chunks (object_id, chunk_index, data)
                VALUES (?1, ?2, ?3)
                "#,
            )
            .bind(&id)
            .bind(index as i64)
            .bind(chunk)
            .execute(&mut *tx)
            .await
            .map_err(MediaError::from_store)?;
        }

        tx.commit().await.map_err(MediaError::from_store)?;

        tracing::debug!(
            "Stored object {} in chunk bucket ({} bytes, {} byte chunks)",
            id,
            length,
            self.chunk_size
        );
        Ok(StorageRef::new(id))
    }

    async fn open_read(&self, storage_ref: &StorageRef) -> MediaResult<ObjectReader> {
        let row = sqlx::query(
            r#"
            SELECT length, chunk_size
            FROM media_objects
            WHERE id = ?1
            "#,
        )
        .bind(storage_ref.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(MediaError::from_store)?;

        let Some(row) = row else {
            return Err(MediaError::NotFound(format!(
                "No such object: {}",
                storage_ref
            )));
        };

        let length: i64 = row.try_get("length")?;
        let chunk_size: i64 = row.try_get("chunk_size")?;
        let chunk_count = if chunk_size > 0 {
            (length + chunk_size - 1) / chunk_size
        } else {
            0
        };

        let pool = self.pool.clone();
        let id = storage_ref.as_str().to_string();
        let stream = futures::stream::try_unfold(
            (pool, id, 0i64),
            move |(pool, id, index)| async move {
                if index >= chunk_count {
                    return Ok(None);
                }

                let row = sqlx::query(
                    r#"
                    SELECT data
                    FROM media_chunks
                    WHERE object_id = ?1 AND chunk_index = ?2
                    "#,
                )
                .bind(&id)
                .bind(index)
                .fetch_optional(&pool)
                .await
                .map_err(MediaError::from_store)?;

                // A missing chunk means the object was deleted out-of-band
                // mid-read; surface it as a missing object.
                let row = row.ok_or_else(|| {
                    MediaError::NotFound(format!("Missing chunk {} of object {}", index, id))
                })?;

                let data: Vec<u8> = row.try_get("data")?;
                Ok(Some((data, (pool, id, index + 1))))
            },
        )
        .boxed();

        Ok(ObjectReader {
            length: Some(length as u64),
            stream,
        })
    }
}
