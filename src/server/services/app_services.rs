use std::sync::Arc;

use tracing::info;

use crate::config::AppConfig;

use super::{
    fetch_services::{DynPlaylistFetcher, HttpPlaylistFetcher},
    playlist_services::PlaylistService,
};

/// everything the handlers need, cloned into every request through an `Extension`
#[derive(Clone)]
pub struct AppServices {
    pub playlists: Arc<PlaylistService>,
    pub config: Arc<AppConfig>,
}

impl AppServices {
    pub fn new(config: Arc<AppConfig>) -> anyhow::Result<Self> {
        info!("starting playlist services...");

        let fetcher = Arc::new(HttpPlaylistFetcher::new(&config)?) as DynPlaylistFetcher;

        info!(
            "http fetcher ok (timeout {}s, limit {} bytes)",
            config.fetch_timeout_seconds, config.max_playlist_bytes
        );

        Ok(Self::with_fetcher(config, fetcher))
    }

    // used by tests to swap the network out
    pub fn with_fetcher(config: Arc<AppConfig>, fetcher: DynPlaylistFetcher) -> Self {
        Self {
            playlists: Arc::new(PlaylistService::new(fetcher)),
            config,
        }
    }
}
