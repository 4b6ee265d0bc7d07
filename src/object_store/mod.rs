/// Object Store
///
/// Persists opaque byte payloads behind one of two interchangeable
/// backends: local disk, or a chunked bucket in the document store.
/// The backend is selected once at startup; nothing downstream
/// branches on the deployment mode.

pub mod chunked;
pub mod disk;

pub use chunked::ChunkedStore;
pub use disk::DiskStore;

use crate::config::MediaStoreConfig;
use crate::error::MediaResult;
use async_trait::async_trait;
use futures::stream::BoxStream;
use sqlx::SqlitePool;
use std::fmt;
use std::sync::Arc;

/// Backend-specific locator for a stored object.
///
/// A generated filename in disk mode, an object identifier in chunked
/// mode. Opaque to everything outside the object store.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StorageRef(String);

impl StorageRef {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StorageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Pull-based byte stream produced by `open_read`.
///
/// The consumer drives the pace; backends hold at most one buffer or
/// chunk in memory per pending pull.
pub type ByteStream = BoxStream<'static, MediaResult<Vec<u8>>>;

/// An open read handle on a stored object
pub struct ObjectReader {
    /// Total object length when the backend knows it up front
    pub length: Option<u64>,
    pub stream: ByteStream,
}

impl ObjectReader {
    /// Drain the stream into memory. Test and small-payload helper;
    /// the download path streams instead.
    pub async fn read_to_end(mut self) -> MediaResult<Vec<u8>> {
        use futures::StreamExt;

        let mut out = Vec::new();
        while let Some(piece) = self.stream.next().await {
            out.extend_from_slice(&piece?);
        }
        Ok(out)
    }
}

/// Object storage backend trait
///
/// `put` durably persists the payload before returning; callers rely
/// on that ordering to create metadata records only for stored bytes.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store a payload under a freshly minted locator and return it
    async fn put(&self, name: &str, content_type: &str, data: Vec<u8>) -> MediaResult<StorageRef>;

    /// Open the object for incremental reading.
    ///
    /// Fails with `NotFound` when the locator does not resolve, and
    /// `BackendUnavailable` when the store cannot be reached.
    async fn open_read(&self, storage_ref: &StorageRef) -> MediaResult<ObjectReader>;
}

/// Build the backend selected by configuration
pub fn from_config(config: &MediaStoreConfig, pool: &SqlitePool) -> Arc<dyn ObjectStore> {
    match config {
        MediaStoreConfig::Disk { location } => Arc::new(DiskStore::new(location.clone())),
        MediaStoreConfig::Chunked { chunk_size } => {
            Arc::new(ChunkedStore::new(pool.clone(), *chunk_size))
        }
    }
}
