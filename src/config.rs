/// Configuration management for the estate media service
use crate::error::{MediaError, MediaResult};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

/// Default per-file ceiling for the local-disk deployment (50 MB)
pub const DEFAULT_DISK_MAX_FILE_SIZE: usize = 50 * 1024 * 1024;

/// Default per-file ceiling for the chunked deployment (4 MB).
/// Ephemeral-compute targets run with much tighter request limits.
pub const DEFAULT_CHUNKED_MAX_FILE_SIZE: usize = 4 * 1024 * 1024;

/// Default chunk size for the chunked store (255 KiB)
pub const DEFAULT_CHUNK_SIZE: usize = 255 * 1024;

/// Main server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub service: ServiceConfig,
    pub storage: StorageConfig,
    pub upload: UploadConfig,
    pub logging: LoggingConfig,
}

/// Service-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub hostname: String,
    pub port: u16,
    pub version: String,
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub data_directory: PathBuf,
    pub registry_db: PathBuf,
    pub media_store: MediaStoreConfig,
}

/// Object store backend configuration, selected once at startup
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum MediaStoreConfig {
    Disk {
        location: PathBuf,
    },
    Chunked {
        chunk_size: usize,
    },
}

/// Upload limits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    /// Hard ceiling per uploaded file, in bytes
    pub max_file_size: usize,
    /// Upper bound on files accepted in one multipart batch
    pub max_batch_files: usize,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl ServerConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> MediaResult<Self> {
        dotenv::dotenv().ok();

        let hostname = env::var("MEDIA_HOSTNAME").unwrap_or_else(|_| "localhost".to_string());
        let port = env::var("MEDIA_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse()
            .map_err(|_| MediaError::Validation("Invalid port number".to_string()))?;
        let version = env::var("MEDIA_VERSION").unwrap_or_else(|_| "0.1.0".to_string());

        let data_directory: PathBuf = env::var("MEDIA_DATA_DIRECTORY")
            .unwrap_or_else(|_| "./data".to_string())
            .into();
        let registry_db = env::var("MEDIA_REGISTRY_DB_LOCATION")
            .map(PathBuf::from)
            .unwrap_or_else(|_| data_directory.join("media.sqlite"));

        // MEDIA_STORE selects the backend: "disk" (default) or "chunked"
        let store_mode = env::var("MEDIA_STORE").unwrap_or_else(|_| "disk".to_string());
        let media_store = match store_mode.as_str() {
            "disk" => MediaStoreConfig::Disk {
                location: env::var("MEDIA_DISK_LOCATION")
                    .map(PathBuf::from)
                    .unwrap_or_else(|_| data_directory.join("uploads")),
            },
            "chunked" => MediaStoreConfig::Chunked {
                chunk_size: env::var("MEDIA_CHUNK_SIZE")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(DEFAULT_CHUNK_SIZE),
            },
            other => {
                return Err(MediaError::Validation(format!(
                    "Unknown MEDIA_STORE mode: {}",
                    other
                )))
            }
        };

        // Per-file ceiling defaults depend on the deployment mode
        let default_max = match media_store {
            MediaStoreConfig::Disk { .. } => DEFAULT_DISK_MAX_FILE_SIZE,
            MediaStoreConfig::Chunked { .. } => DEFAULT_CHUNKED_MAX_FILE_SIZE,
        };
        let max_file_size = env::var("MEDIA_MAX_FILE_SIZE")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(default_max);

        let max_batch_files = env::var("MEDIA_MAX_BATCH_FILES")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(10);

        let log_level = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        Ok(ServerConfig {
            service: ServiceConfig {
                hostname,
                port,
                version,
            },
            storage: StorageConfig {
                data_directory,
                registry_db,
                media_store,
            },
            upload: UploadConfig {
                max_file_size,
                max_batch_files,
            },
            logging: LoggingConfig { level: log_level },
        })
    }

    /// Validate configuration
    pub fn validate(&self) -> MediaResult<()> {
        if self.service.hostname.is_empty() {
            return Err(MediaError::Validation("Hostname cannot be empty".to_string()));
        }

        if self.upload.max_file_size == 0 {
            return Err(MediaError::Validation(
                "Max file size must be greater than zero".to_string(),
            ));
        }

        if let MediaStoreConfig::Chunked { chunk_size } = self.storage.media_store {
            if chunk_size == 0 {
                return Err(MediaError::Validation(
                    "Chunk size must be greater than zero".to_string(),
                ));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config(media_store: MediaStoreConfig) -> ServerConfig {
        ServerConfig {
            service: ServiceConfig {
                hostname: "localhost".to_string(),
                port: 8080,
                version: "0.1.0".to_string(),
            },
            storage: StorageConfig {
                data_directory: PathBuf::from("./data"),
                registry_db: PathBuf::from("./data/media.sqlite"),
                media_store,
            },
            upload: UploadConfig {
                max_file_size: DEFAULT_DISK_MAX_FILE_SIZE,
                max_batch_files: 10,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
            },
        }
    }

    #[test]
    fn test_valid_config_passes() {
        let config = test_config(MediaStoreConfig::Disk {
            location: PathBuf::from("./data/uploads"),
        });
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_chunk_size_rejected() {
        let config = test_config(MediaStoreConfig::Chunked { chunk_size: 0 });
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_max_file_size_rejected() {
        let mut config = test_config(MediaStoreConfig::Disk {
            location: PathBuf::from("./data/uploads"),
        });
        config.upload.max_file_size = 0;
        assert!(config.validate().is_err());
    }
}
