/// Application context and dependency injection
use crate::{
    config::{MediaStoreConfig, ServerConfig},
    db,
    error::MediaResult,
    media::MediaService,
    object_store,
    registry::MediaRegistry,
};
use sqlx::SqlitePool;
use std::sync::Arc;

/// Application context holding all shared services
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<ServerConfig>,
    pub db: SqlitePool,
    pub media: Arc<MediaService>,
}

impl AppContext {
    /// Create a new application context from configuration
    pub async fn new(config: ServerConfig) -> MediaResult<Self> {
        config.validate()?;

        Self::ensure_directories(&config).await?;

        let pool = db::create_pool(&config.storage.registry_db, db::DatabaseOptions::default())
            .await?;
        db::run_migrations(&pool).await?;

        // Fail fast when the metadata store is unreachable
        db::test_connection(&pool).await?;

        // The backend is selected exactly once, here
        let store = object_store::from_config(&config.storage.media_store, &pool);
        let registry = MediaRegistry::new(pool.clone());
        let media = Arc::new(MediaService::new(
            store,
            registry,
            config.upload.max_file_size,
        ));

        Ok(Self {
            config: Arc::new(config),
            db: pool,
            media,
        })
    }

    /// Ensure required directories exist
    async fn ensure_directories(config: &ServerConfig) -> MediaResult<()> {
        tokio::fs::create_dir_all(&config.storage.data_directory).await?;

        if let MediaStoreConfig::Disk { location } = &config.storage.media_store {
            tokio::fs::create_dir_all(location).await?;
        }

        Ok(())
    }
}
