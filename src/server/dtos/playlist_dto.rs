use serde::Deserialize;
use tracing::debug;
use validator::Validate;

use crate::server::{
    error::{AppResult, Error},
    utils::rewrite_utils::RewriteContext,
};

/// Query of `GET /playlist`, `d` carries the `;` separated definitions:
/// `https://proxy.example:pass123&http://provider.com/list.m3u;http://other.com/list.m3u`
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct PlaylistQuery {
    #[serde(default)]
    #[validate(length(max = 10000, message = "Query string too long"))]
    pub d: String,
    pub api_password: Option<String>,
}

/// One source playlist and the optional override that came in front of it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDefinition {
    pub override_base: Option<String>,
    pub playlist_url: String,
}

impl SourceDefinition {
    /// `<override>&<playlist-url>` or just `<playlist-url>`. The split only happens when the
    /// part after the first `&` is itself an absolute url, so a bare url with a query string
    /// stays whole.
    pub fn parse(definition: &str) -> AppResult<Self> {
        let definition = definition.trim();

        let (override_base, playlist_url) = match definition.split_once('&') {
            Some((override_base, playlist_url)) if playlist_url.contains("://") => {
                (Some(override_base.trim().to_string()), playlist_url.trim())
            }
            _ => (None, definition),
        };

        let parsed = url::Url::parse(playlist_url).map_err(|_| {
            Error::BadRequest(format!("Invalid URL in definition: {}", playlist_url))
        })?;
        if parsed.scheme().is_empty() || parsed.host_str().is_none_or(str::is_empty) {
            return Err(Error::BadRequest(format!(
                "Invalid URL in definition: {}",
                playlist_url
            )));
        }

        Ok(Self {
            override_base: override_base.filter(|o| !o.is_empty()),
            playlist_url: playlist_url.to_string(),
        })
    }

    pub fn base_override(&self) -> Option<BaseOverride> {
        self.override_base.as_deref().and_then(BaseOverride::parse)
    }
}

/// Base url shorthand, `scheme://host[:port]:password`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseOverride {
    pub base_url: String,
    pub password: Option<String>,
}

impl BaseOverride {
    /// Whatever follows the last `:` is the password as long as what's left in front still
    /// looks like `scheme://host`. That means `http://host:8080` reads as password `8080`, the
    /// shorthand has no way to tell a port from a password.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if !raw.starts_with("http") {
            return None;
        }

        match raw.rsplit_once(':') {
            Some((base, password)) if base.contains("://") => Some(Self {
                base_url: base.trim_end_matches('/').to_string(),
                password: Some(password.to_string()).filter(|p| !p.is_empty()),
            }),
            _ => Some(Self {
                base_url: raw.trim_end_matches('/').to_string(),
                password: None,
            }),
        }
    }
}

/// Everything the aggregator needs for one request, validated before anything is fetched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaylistRequest {
    pub sources: Vec<SourceDefinition>,
    pub base_url: String,
    pub api_password: Option<String>,
}

impl PlaylistRequest {
    /// Password precedence is the query's `api_password`, then the shorthand in the first
    /// definition, then the configured default.
    pub fn from_query(
        query: PlaylistQuery,
        default_base_url: &str,
        default_password: Option<&str>,
    ) -> AppResult<Self> {
        if query.d.is_empty() {
            return Err(Error::BadRequest("Query string missing".to_string()));
        }
        if query.d.trim().is_empty() {
            return Err(Error::BadRequest(
                "Query string cannot be empty".to_string(),
            ));
        }

        let sources = query
            .d
            .split(';')
            .map(str::trim)
            .filter(|definition| !definition.is_empty())
            .map(SourceDefinition::parse)
            .collect::<AppResult<Vec<_>>>()?;

        if sources.is_empty() {
            return Err(Error::BadRequest(
                "No valid playlist definitions found".to_string(),
            ));
        }

        // only the first definition can move the base url
        let base_override = sources.first().and_then(SourceDefinition::base_override);
        if let Some(ref base_override) = base_override {
            debug!("base url overridden to {}", base_override.base_url);
        }

        let base_url = base_override
            .as_ref()
            .map(|o| o.base_url.clone())
            .unwrap_or_else(|| default_base_url.trim_end_matches('/').to_string());

        let api_password = query
            .api_password
            .filter(|p| !p.is_empty())
            .or_else(|| base_override.and_then(|o| o.password))
            .or_else(|| default_password.map(str::to_string));

        Ok(Self {
            sources,
            base_url,
            api_password,
        })
    }

    pub fn rewrite_context(&self) -> RewriteContext {
        RewriteContext::new(self.base_url.clone(), self.api_password.clone())
    }
}
