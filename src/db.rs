/// Database layer for the media registry and chunk bucket
///
/// Manages the SQLite connection pool and embedded migrations. The same
/// database file hosts the media record table and, in chunked mode, the
/// object/chunk tables acting as the document-store bucket.
use crate::error::{MediaError, MediaResult};
use sqlx::sqlite::SqlitePool;
use std::path::Path;

/// Database connection options
#[derive(Debug, Clone)]
pub struct DatabaseOptions {
    pub max_connections: u32,
    pub enable_wal: bool,
}

impl Default for DatabaseOptions {
    fn default() -> Self {
        Self {
            max_connections: 10,
            enable_wal: true,
        }
    }
}

/// Create a SQLite connection pool
pub async fn create_pool(path: &Path, options: DatabaseOptions) -> MediaResult<SqlitePool> {
    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let pool = SqlitePool::connect_with(
        sqlx::sqlite::SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(if options.enable_wal {
                sqlx::sqlite::SqliteJournalMode::Wal
            } else {
                sqlx::sqlite::SqliteJournalMode::Delete
            })
            .foreign_keys(true)
            .busy_timeout(std::time::Duration::from_secs(5)),
    )
    .await
    .map_err(MediaError::from_store)?;

    Ok(pool)
}

/// Run migrations, embedded at compile time from ./migrations
pub async fn run_migrations(pool: &SqlitePool) -> MediaResult<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| MediaError::Internal(format!("Migration failed: {}", e)))?;

    Ok(())
}

/// Test database connection
///
/// Used at startup so an unreachable metadata store fails the whole
/// process immediately rather than every request.
pub async fn test_connection(pool: &SqlitePool) -> MediaResult<()> {
    sqlx::query("SELECT 1")
        .execute(pool)
        .await
        .map_err(MediaError::from_store)?;

    Ok(())
}
