use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use mockall::automock;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, HeaderMap, HeaderValue};
use thiserror::Error;
use tracing::debug;

use crate::{AppConfig, server::utils::m3u_utils::split_lines};

pub type DynPlaylistFetcher = Arc<dyn PlaylistFetcherTrait + Send + Sync>;

/// Why a source playlist couldn't be downloaded. The message ends up inside a comment line of
/// the combined playlist, the url is carried separately.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("Unable to connect to playlist source (DNS or network issue): {message}")]
    Unreachable { url: String, message: String },
    #[error("timed out after {seconds}s")]
    Timeout { url: String, seconds: u64 },
    #[error("playlist is larger than {limit} bytes")]
    Oversize { url: String, limit: u64 },
    #[error("upstream returned status {status}")]
    UpstreamStatus { url: String, status: u16 },
    #[error("transport error: {message}")]
    Transport { url: String, message: String },
    #[error("internal error: {message}")]
    Internal { url: String, message: String },
}

impl FetchError {
    pub fn url(&self) -> &str {
        match self {
            Self::Unreachable { url, .. }
            | Self::Timeout { url, .. }
            | Self::Oversize { url, .. }
            | Self::UpstreamStatus { url, .. }
            | Self::Transport { url, .. }
            | Self::Internal { url, .. } => url,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FetchLimits {
    pub timeout: Duration,
    pub max_bytes: u64,
}

impl FetchLimits {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            timeout: Duration::from_secs(config.fetch_timeout_seconds),
            max_bytes: config.max_playlist_bytes,
        }
    }
}

#[automock]
#[async_trait]
pub trait PlaylistFetcherTrait {
    /// Downloads a whole playlist and splits it into lines (terminators kept). Either every
    /// line comes back or an error does, never a partial body.
    async fn fetch_lines(&self, url: &str) -> Result<Vec<String>, FetchError>;
}

pub struct HttpPlaylistFetcher {
    http: reqwest::Client,
    limits: FetchLimits,
}

impl HttpPlaylistFetcher {
    pub fn new(config: &AppConfig) -> anyhow::Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("*/*"));
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));

        // gzip and deflate are decoded by reqwest, the byte budget counts decoded bytes
        let http = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .default_headers(headers)
            .connect_timeout(Duration::from_secs(config.connect_timeout_seconds))
            .build()?;

        Ok(Self::with_client(http, FetchLimits::from_config(config)))
    }

    pub fn with_client(http: reqwest::Client, limits: FetchLimits) -> Self {
        Self { http, limits }
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| self.map_transport_error(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::UpstreamStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let oversize = || FetchError::Oversize {
            url: url.to_string(),
            limit: self.limits.max_bytes,
        };

        // don't even start reading something that says it's too big
        if response
            .content_length()
            .is_some_and(|len| len > self.limits.max_bytes)
        {
            return Err(oversize());
        }

        let mut body: Vec<u8> = Vec::new();
        let mut chunks = response.bytes_stream();
        while let Some(chunk) = chunks.next().await {
            let chunk = chunk.map_err(|e| self.map_transport_error(url, e))?;
            if (body.len() + chunk.len()) as u64 > self.limits.max_bytes {
                return Err(oversize());
            }
            body.extend_from_slice(&chunk);
        }

        Ok(body)
    }

    fn map_transport_error(&self, url: &str, e: reqwest::Error) -> FetchError {
        if e.is_timeout() {
            FetchError::Timeout {
                url: url.to_string(),
                seconds: self.limits.timeout.as_secs(),
            }
        } else if e.is_connect() {
            FetchError::Unreachable {
                url: url.to_string(),
                message: e.to_string(),
            }
        } else {
            FetchError::Transport {
                url: url.to_string(),
                message: e.to_string(),
            }
        }
    }
}

#[async_trait]
impl PlaylistFetcherTrait for HttpPlaylistFetcher {
    async fn fetch_lines(&self, url: &str) -> Result<Vec<String>, FetchError> {
        debug!("downloading playlist {}", url);

        let body = tokio::time::timeout(self.limits.timeout, self.download(url))
            .await
            .map_err(|_| FetchError::Timeout {
                url: url.to_string(),
                seconds: self.limits.timeout.as_secs(),
            })??;

        let lines = split_lines(&String::from_utf8_lossy(&body));
        debug!(
            "downloaded playlist {} ({} bytes, {} lines)",
            url,
            body.len(),
            lines.len()
        );

        Ok(lines)
    }
}
