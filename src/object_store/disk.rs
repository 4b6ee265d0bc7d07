/// Local-disk object store backend
use crate::error::{MediaError, MediaResult};
use crate::object_store::{ObjectReader, ObjectStore, StorageRef};
use async_trait::async_trait;
use futures::StreamExt;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncReadExt;
use uuid::Uuid;

/// Read buffer size for streamed downloads
const READ_BUFFER_SIZE: usize = 64 * 1024;

/// Disk storage backend
///
/// One regular file per upload in a configured directory, named with a
/// generated token plus the sanitized original extension. The original
/// name never becomes part of the path, so collisions and traversal
/// are off the table.
#[derive(Clone)]
pub struct DiskStore {
    root: PathBuf,
}

impl DiskStore {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Sanitized lowercase extension of the original name, if any
    fn extension_of(name: &str) -> Option<String> {
        let ext = Path::new(name).extension()?.to_str()?;
        if ext.is_empty() || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
            return None;
        }
        Some(ext.to_ascii_lowercase())
    }

    /// Mint a collision-free on-disk filename for an upload
    fn generate_filename(name: &str) -> String {
        let token = Uuid::new_v4().simple().to_string();
        match Self::extension_of(name) {
            Some(ext) => format!("{}.{}", token, ext),
            None => token,
        }
    }

    /// Resolve a storage ref to a path inside the media directory.
    ///
    /// Refs are single path components; anything with separators or
    /// parent traversal is treated as an unknown object.
    fn resolve(&self, storage_ref: &StorageRef) -> MediaResult<PathBuf> {
        let name = storage_ref.as_str();
        if name.is_empty()
            || name == ".."
            || name.contains('/')
            || name.contains('\\')
        {
            return Err(MediaError::NotFound(format!(
                "No such object: {}",
                name
            )));
        }
        Ok(self.root.join(name))
    }
}

#[async_trait]
impl ObjectStore for DiskStore {
    async fn put(&self, name: &str, _content_type: &str, data: Vec<u8>) -> MediaResult<StorageRef> {
        fs::create_dir_all(&self.root).await.map_err(|e| {
            MediaError::BackendUnavailable(format!("Failed to create media directory: {}", e))
        })?;

        let filename = Self::generate_filename(name);
        let path = self.root.join(&filename);

        fs::write(&path, data).await.map_err(|e| {
            MediaError::BackendUnavailable(format!("Failed to write {}: {}", filename, e))
        })?;

        tracing::debug!("Stored object on disk: {}", filename);
        Ok(StorageRef::new(filename))
    }

    async fn open_read(&self, storage_ref: &StorageRef) -> MediaResult<ObjectReader> {
        let path = self.resolve(storage_ref)?;

        let file = match fs::File::open(&path).await {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(MediaError::NotFound(format!(
                    "No such object: {}",
                    storage_ref
                )))
            }
            Err(e) => {
                return Err(MediaError::BackendUnavailable(format!(
                    "Failed to open {}: {}",
                    storage_ref, e
                )))
            }
        };

        let length = file
            .metadata()
            .await
            .map_err(|e| {
                MediaError::BackendUnavailable(format!(
                    "Failed to stat {}: {}",
                    storage_ref, e
                ))
            })?
            .len();

        let stream = futures::stream::try_unfold(file, |mut file| async move {
            let mut buf = vec![0u8; READ_BUFFER_SIZE];
            let n = file
                .read(&mut buf)
                .await
                .map_err(|e| MediaError::BackendUnavailable(format!("Read failed: {}", e)))?;
            if n == 0 {
                Ok(None)
            } else {
                buf.truncate(n);
                Ok(Some((buf, file)))
            }
        })
        .boxed();

        Ok(ObjectReader {
            length: Some(length),
            stream,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_put_and_read_round_trip() {
        let dir = tempdir().unwrap();
        let store = DiskStore::new(dir.path().to_path_buf());

        let data = b"listing photo bytes".to_vec();
        let storage_ref = store.put("photo.png", "image/png", data.clone()).await.unwrap();

        let reader = store.open_read(&storage_ref).await.unwrap();
        assert_eq!(reader.length, Some(data.len() as u64));
        assert_eq!(reader.read_to_end().await.unwrap(), data);
    }

    #[tokio::test]
    async fn test_empty_and_single_byte_payloads() {
        let dir = tempdir().unwrap();
        let store = DiskStore::new(dir.path().to_path_buf());

        let empty = store.put("empty.gif", "image/gif", Vec::new()).await.unwrap();
        let reader = store.open_read(&empty).await.unwrap();
        assert_eq!(reader.length, Some(0));
        assert!(reader.read_to_end().await.unwrap().is_empty());

        let one = store.put("one.jpg", "image/jpeg", vec![0xA7]).await.unwrap();
        let bytes = store.open_read(&one).await.unwrap().read_to_end().await.unwrap();
        assert_eq!(bytes, vec![0xA7]);
    }

    #[tokio::test]
    async fn test_payload_spanning_multiple_read_buffers() {
        let dir = tempdir().unwrap();
        let store = DiskStore::new(dir.path().to_path_buf());

        let data: Vec<u8> = (0..READ_BUFFER_SIZE * 2 + 17).map(|i| (i % 251) as u8).collect();
        let storage_ref = store.put("video.mp4", "video/mp4", data.clone()).await.unwrap();

        let bytes = store.open_read(&storage_ref).await.unwrap().read_to_end().await.unwrap();
        assert_eq!(bytes, data);
    }

    #[tokio::test]
    async fn test_unknown_ref_is_not_found() {
        let dir = tempdir().unwrap();
        let store = DiskStore::new(dir.path().to_path_buf());

        let result = store.open_read(&StorageRef::new("deadbeef.png")).await;
        assert!(matches!(result, Err(MediaError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_traversal_refs_are_rejected() {
        let dir = tempdir().unwrap();
        let store = DiskStore::new(dir.path().to_path_buf());

        for evil in ["../etc/passwd", "a/b.png", "..", ""] {
            let result = store.open_read(&StorageRef::new(evil)).await;
            assert!(matches!(result, Err(MediaError::NotFound(_))), "ref: {evil}");
        }
    }

    #[tokio::test]
    async fn test_generated_names_keep_extension_and_differ() {
        let dir = tempdir().unwrap();
        let store = DiskStore::new(dir.path().to_path_buf());

        let a = store.put("house.JPG", "image/jpeg", vec![1]).await.unwrap();
        let b = store.put("house.JPG", "image/jpeg", vec![2]).await.unwrap();

        assert_ne!(a, b);
        assert!(a.as_str().ends_with(".jpg"));
        assert!(b.as_str().ends_with(".jpg"));
    }

    #[tokio::test]
    async fn test_concurrent_puts_do_not_cross_contaminate() {
        let dir = tempdir().unwrap();
        let store = DiskStore::new(dir.path().to_path_buf());

        let (a, b) = tokio::join!(
            store.put("a.png", "image/png", vec![1; 1000]),
            store.put("b.png", "image/png", vec![2; 2000]),
        );
        let (a, b) = (a.unwrap(), b.unwrap());
        assert_ne!(a, b);

        let bytes_a = store.open_read(&a).await.unwrap().read_to_end().await.unwrap();
        let bytes_b = store.open_read(&b).await.unwrap().read_to_end().await.unwrap();
        assert_eq!(bytes_a, vec![1; 1000]);
        assert_eq!(bytes_b, vec![2; 2000]);
    }
}
