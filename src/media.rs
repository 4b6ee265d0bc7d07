/// Upload/download transfer protocol
///
/// Ties an inbound upload to the object store and the media registry,
/// and resolves stored bytes back out. Ordering invariant: bytes are
/// durably stored before the registry record is created, so a record
/// never points at an object that was never written. The converse is
/// tolerated — a registry failure after a successful put leaves an
/// orphaned object behind, which is never reconciled here.
use crate::error::{MediaError, MediaResult};
use crate::object_store::{ObjectReader, ObjectStore, StorageRef};
use crate::registry::{MediaPage, MediaRecord, MediaRegistry, NewMediaRecord};
use std::path::Path;
use std::sync::Arc;

/// Allow-listed file extensions (lowercase)
pub const ALLOWED_EXTENSIONS: &[&str] = &[
    "jpeg", "jpg", "png", "gif", "mp4", "avi", "mov", "wmv",
];

/// Allow-listed declared MIME types
pub const ALLOWED_MIME_TYPES: &[&str] = &[
    "image/jpeg",
    "image/png",
    "image/gif",
    "video/mp4",
    "video/x-msvideo",
    "video/quicktime",
    "video/x-ms-wmv",
];

#[derive(Clone)]
pub struct MediaService {
    store: Arc<dyn ObjectStore>,
    registry: MediaRegistry,
    max_file_size: usize,
}

impl MediaService {
    pub fn new(store: Arc<dyn ObjectStore>, registry: MediaRegistry, max_file_size: usize) -> Self {
        Self {
            store,
            registry,
            max_file_size,
        }
    }

    /// Per-file ceiling in bytes
    pub fn max_file_size(&self) -> usize {
        self.max_file_size
    }

    /// Check a file's declared extension and MIME type against the
    /// allow-list. Runs before any bytes are persisted.
    pub fn validate_upload(&self, filename: &str, mime_type: &str) -> MediaResult<()> {
        let extension = Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();

        if !ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
            return Err(MediaError::UnsupportedMediaType(format!(
                "Extension not allowed: {}",
                filename
            )));
        }

        if !ALLOWED_MIME_TYPES.contains(&mime_type) {
            return Err(MediaError::UnsupportedMediaType(format!(
                "MIME type not allowed: {}",
                mime_type
            )));
        }

        Ok(())
    }

    /// Persist one validated file: object store first, registry second
    pub async fn store_file(
        &self,
        filename: &str,
        mime_type: &str,
        data: Vec<u8>,
    ) -> MediaResult<MediaRecord> {
        self.validate_upload(filename, mime_type)?;

        if data.len() > self.max_file_size {
            return Err(MediaError::PayloadTooLarge {
                limit: self.max_file_size,
            });
        }

        let size_bytes = data.len() as i64;
        let storage_ref = self.store.put(filename, mime_type, data).await?;

        let record = self
            .registry
            .create(NewMediaRecord {
                filename: filename.to_string(),
                url: format!("/files/{}", storage_ref),
                mime_type: mime_type.to_string(),
                size_bytes,
                storage_ref: storage_ref.as_str().to_string(),
            })
            .await?;

        tracing::info!(
            "Stored {} ({} bytes) as {}",
            record.filename,
            record.size_bytes,
            record.storage_ref
        );
        Ok(record)
    }

    /// Open a stored object for download.
    ///
    /// The record lookup is best-effort: a dangling or missing record
    /// only costs the Content-Type header, it never blocks the bytes.
    pub async fn open_download(
        &self,
        storage_ref: &StorageRef,
    ) -> MediaResult<(ObjectReader, Option<MediaRecord>)> {
        let record = self.registry.get(storage_ref).await.unwrap_or_else(|e| {
            tracing::warn!("Record lookup failed for {}: {}", storage_ref, e);
            None
        });

        let reader = self.store.open_read(storage_ref).await?;
        Ok((reader, record))
    }

    /// List uploaded files, newest first
    pub async fn list_files(&self, page: u32, page_size: u32) -> MediaResult<MediaPage> {
        self.registry.list(page, page_size).await
    }
}
