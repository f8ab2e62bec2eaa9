use std::sync::Arc;

use anyhow::Context;
use db::DBService;
use server::{AppState, config::ServerConfig, routes};
use services::services::{
    blob_store::S3BlobStore, card_image::CardImageService, image_provider::OpenAiImageProvider,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = ServerConfig::from_env().context("invalid server configuration")?;

    let db = DBService::new(&config.database_url)
        .await
        .context("failed to open database")?;

    let provider =
        OpenAiImageProvider::from_env().context("failed to initialise image provider")?;
    let blob_store = S3BlobStore::from_env()
        .await
        .context("failed to initialise blob store")?;
    let card_image = CardImageService::new(db.clone(), Arc::new(provider), Arc::new(blob_store));

    let state = AppState::new(db, card_image, &config);
    let app = routes::router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("listening on {addr}");

    axum::serve(listener, app).await?;
    Ok(())
}
