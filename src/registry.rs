/// Media Registry
///
/// Single source of truth for which files exist, what they are called,
/// how big they are, and which storage ref fetches their bytes —
/// independent of which backend holds the bytes. Records are append
/// only: created once at upload completion, never updated, and only
/// removed by out-of-band administration.
use crate::error::{MediaError, MediaResult};
use crate::object_store::StorageRef;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Row, SqlitePool};

/// One uploaded file, independent of backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaRecord {
    pub id: i64,
    pub filename: String,
    pub url: String,
    pub mime_type: String,
    pub size_bytes: i64,
    pub uploaded_at: DateTime<Utc>,
    pub storage_ref: String,
}

/// Fields required to register an uploaded file
#[derive(Debug, Clone)]
pub struct NewMediaRecord {
    pub filename: String,
    pub url: String,
    pub mime_type: String,
    pub size_bytes: i64,
    pub storage_ref: String,
}

/// Offset pagination metadata.
///
/// The four derived fields are computed from one total count, so they
/// stay mutually consistent for any page/page-size combination.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub current_page: u32,
    pub total_pages: u32,
    pub total_files: u64,
    pub has_next: bool,
    pub has_prev: bool,
}

impl Pagination {
    fn compute(page: u32, page_size: u32, total_files: u64) -> Self {
        let total_pages = (total_files.div_ceil(page_size as u64)) as u32;
        Self {
            current_page: page,
            total_pages,
            total_files,
            has_next: page < total_pages,
            has_prev: page > 1 && total_files > 0,
        }
    }
}

/// One page of records plus its pagination metadata
#[derive(Debug, Clone)]
pub struct MediaPage {
    pub files: Vec<MediaRecord>,
    pub pagination: Pagination,
}

#[derive(Clone)]
pub struct MediaRegistry {
    pool: SqlitePool,
}

impl MediaRegistry {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Persist a record for an already-stored object
    pub async fn create(&self, record: NewMediaRecord) -> MediaResult<MediaRecord> {
        if record.filename.is_empty() {
            return Err(MediaError::Validation("Filename is required".to_string()));
        }
        if record.url.is_empty() {
            return Err(MediaError::Validation("URL is required".to_string()));
        }
        if record.mime_type.is_empty() {
            return Err(MediaError::Validation("MIME type is required".to_string()));
        }
        if record.size_bytes < 0 {
            return Err(MediaError::Validation("Size must be non-negative".to_string()));
        }
        if record.storage_ref.is_empty() {
            return Err(MediaError::Validation("Storage ref is required".to_string()));
        }

        let uploaded_at = Utc::now();
        let result = sqlx::query(
            r#"
            INSERT INTO media_records (filename, url, mime_type, size_bytes, uploaded_at, storage_ref)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&record.filename)
        .bind(&record.url)
        .bind(&record.mime_type)
        .bind(record.size_bytes)
        .bind(uploaded_at)
        .bind(&record.storage_ref)
        .execute(&self.pool)
        .await
        .map_err(MediaError::from_store)?;

        Ok(MediaRecord {
            id: result.last_insert_rowid(),
            filename: record.filename,
            url: record.url,
            mime_type: record.mime_type,
            size_bytes: record.size_bytes,
            uploaded_at,
            storage_ref: record.storage_ref,
        })
    }

    /// Look up the record for a storage ref, if one exists
    pub async fn get(&self, storage_ref: &StorageRef) -> MediaResult<Option<MediaRecord>> {
        let row = sqlx::query(
            r#"
            SELECT id, filename, url, mime_type, size_bytes, uploaded_at, storage_ref
            FROM media_records
            WHERE storage_ref = ?1
            "#,
        )
        .bind(storage_ref.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(MediaError::from_store)?;

        row.map(Self::record_from_row).transpose()
    }

    /// One page of records, newest upload first
    pub async fn list(&self, page: u32, page_size: u32) -> MediaResult<MediaPage> {
        let page = page.max(1);
        let page_size = page_size.clamp(1, 100);

        let total_files: i64 = sqlx::query("SELECT COUNT(*) AS n FROM media_records")
            .fetch_one(&self.pool)
            .await
            .map_err(MediaError::from_store)?
            .try_get("n")?;
        let total_files = total_files as u64;

        let offset = (page as i64 - 1) * page_size as i64;
        let rows = sqlx::query(
            r#"
            SELECT id, filename, url, mime_type, size_bytes, uploaded_at, storage_ref
            FROM media_records
            ORDER BY uploaded_at DESC, id DESC
            LIMIT ?1 OFFSET ?2
            "#,
        )
        .bind(page_size as i64)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(MediaError::from_store)?;

        let files = rows
            .into_iter()
            .map(Self::record_from_row)
            .collect::<MediaResult<Vec<_>>>()?;

        Ok(MediaPage {
            files,
            pagination: Pagination::compute(page, page_size, total_files),
        })
    }

    fn record_from_row(row: sqlx::sqlite::SqliteRow) -> MediaResult<MediaRecord> {
        Ok(MediaRecord {
            id: row.try_get("id")?,
            filename: row.try_get("filename")?,
            url: row.try_get("url")?,
            mime_type: row.try_get("mime_type")?,
            size_bytes: row.try_get("size_bytes")?,
            uploaded_at: row.try_get("uploaded_at")?,
            storage_ref: row.try_get("storage_ref")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn create_test_registry() -> MediaRegistry {
        let pool = SqlitePool::connect(":memory:").await.unwrap();

        sqlx::query(
            r#"
            CREATE TABLE media_records (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                filename TEXT NOT NULL,
                url TEXT NOT NULL,
                mime_type TEXT NOT NULL,
                size_bytes INTEGER NOT NULL,
                uploaded_at DATETIME NOT NULL,
                storage_ref TEXT NOT NULL UNIQUE
            )
            "#,
        )
        .execute(&pool)
        .await
        .unwrap();

        MediaRegistry::new(pool)
    }

    fn sample_record(n: usize) -> NewMediaRecord {
        NewMediaRecord {
            filename: format!("photo-{}.png", n),
            url: format!("/files/ref-{}", n),
            mime_type: "image/png".to_string(),
            size_bytes: 2048,
            storage_ref: format!("ref-{}", n),
        }
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let registry = create_test_registry().await;

        let created = registry.create(sample_record(1)).await.unwrap();
        assert_eq!(created.filename, "photo-1.png");
        assert_eq!(created.size_bytes, 2048);

        let fetched = registry
            .get(&StorageRef::new("ref-1"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(fetched.id, created.id);
        assert_eq!(fetched.mime_type, "image/png");
        assert_eq!(fetched.uploaded_at, created.uploaded_at);
    }

    #[tokio::test]
    async fn test_get_unknown_ref_is_none() {
        let registry = create_test_registry().await;
        let result = registry.get(&StorageRef::new("missing")).await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_create_rejects_missing_fields() {
        let registry = create_test_registry().await;

        let mut record = sample_record(1);
        record.filename = String::new();
        assert!(matches!(
            registry.create(record).await,
            Err(MediaError::Validation(_))
        ));

        let mut record = sample_record(2);
        record.mime_type = String::new();
        assert!(matches!(
            registry.create(record).await,
            Err(MediaError::Validation(_))
        ));

        let mut record = sample_record(3);
        record.url = String::new();
        assert!(matches!(
            registry.create(record).await,
            Err(MediaError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_list_orders_newest_first() {
        let registry = create_test_registry().await;
        for n in 0..5 {
            registry.create(sample_record(n)).await.unwrap();
        }

        let page = registry.list(1, 10).await.unwrap();
        assert_eq!(page.files.len(), 5);
        // Same-timestamp ties break by insertion order, newest first
        assert_eq!(page.files[0].filename, "photo-4.png");
        assert_eq!(page.files[4].filename, "photo-0.png");
    }

    #[tokio::test]
    async fn test_pagination_metadata_consistency() {
        let registry = create_test_registry().await;
        for n in 0..7 {
            registry.create(sample_record(n)).await.unwrap();
        }

        let first = registry.list(1, 3).await.unwrap();
        assert_eq!(first.files.len(), 3);
        assert_eq!(
            first.pagination,
            Pagination {
                current_page: 1,
                total_pages: 3,
                total_files: 7,
                has_next: true,
                has_prev: false,
            }
        );

        let last = registry.list(3, 3).await.unwrap();
        assert_eq!(last.files.len(), 1);
        assert!(!last.pagination.has_next);
        assert!(last.pagination.has_prev);
    }

    #[tokio::test]
    async fn test_page_beyond_last_is_empty_with_no_next() {
        let registry = create_test_registry().await;
        for n in 0..4 {
            registry.create(sample_record(n)).await.unwrap();
        }

        let page = registry.list(9, 3).await.unwrap();
        assert!(page.files.is_empty());
        assert!(!page.pagination.has_next);
        assert_eq!(page.pagination.total_files, 4);
        assert_eq!(page.pagination.total_pages, 2);
    }

    #[tokio::test]
    async fn test_list_is_idempotent_without_writes() {
        let registry = create_test_registry().await;
        for n in 0..4 {
            registry.create(sample_record(n)).await.unwrap();
        }

        let a = registry.list(2, 2).await.unwrap();
        let b = registry.list(2, 2).await.unwrap();
        assert_eq!(a.pagination, b.pagination);
        let ids_a: Vec<i64> = a.files.iter().map(|f| f.id).collect();
        let ids_b: Vec<i64> = b.files.iter().map(|f| f.id).collect();
        assert_eq!(ids_a, ids_b);
    }

    #[tokio::test]
    async fn test_empty_registry_pagination() {
        let registry = create_test_registry().await;

        let page = registry.list(1, 10).await.unwrap();
        assert!(page.files.is_empty());
        assert_eq!(page.pagination.total_pages, 0);
        assert!(!page.pagination.has_next);
        assert!(!page.pagination.has_prev);
    }
}
