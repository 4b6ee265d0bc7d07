/// Estate Media - media storage service for a real-estate listing platform
///
/// Stores uploaded listing media (photos, video tours) behind one of
/// two interchangeable backends - local disk or a chunked document
/// store - and serves the bytes back with metadata-driven content
/// typing.

mod api;
mod config;
mod context;
mod db;
mod error;
mod media;
mod object_store;
mod registry;
mod server;

use config::ServerConfig;
use context::AppContext;
use error::MediaResult;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> MediaResult<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "estate_media=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::from_env()?;

    let ctx = AppContext::new(config).await?;

    server::serve(ctx).await?;

    Ok(())
}
