use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use dotenvy::dotenv;

use tracing::info;

use playlist_builder::{AppConfig, Logger, PlaylistApplicationServer};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    let config = Arc::new(AppConfig::parse());

    // guards have to live as long as main or buffered logs get lost
    let _guards = Logger::init(config.cargo_env, config.sentry_dsn.clone());

    info!(
        "config loaded, base url {}, starting playlist server...",
        config.base_url.as_deref().unwrap_or("<from request>")
    );

    PlaylistApplicationServer::serve(config)
        .await
        .context("playlist server failed to start")?;

    Ok(())
}
