use axum::{
    Router,
    body::Body,
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use tracing::info;

use crate::server::{
    dtos::playlist_dto::{PlaylistQuery, PlaylistRequest},
    error::AppResult,
    extractors::{RequestBaseUrl, ValidatedQuery},
};

pub struct PlaylistController;

impl PlaylistController {
    pub fn app() -> Router {
        Router::new().route("/", get(Self::playlist_get).options(Self::playlist_options))
    }

    fn playlist_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/vnd.apple.mpegurl"),
        );
        headers.insert(
            header::CONTENT_DISPOSITION,
            HeaderValue::from_static("attachment; filename=\"playlist.m3u\""),
        );
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static("*"),
        );
        headers
    }

    /// everything is validated up front, once the body starts streaming a broken source only
    /// shows up as a comment line
    async fn playlist_get(
        RequestBaseUrl(base_url, services): RequestBaseUrl,
        ValidatedQuery(query): ValidatedQuery<PlaylistQuery>,
    ) -> AppResult<Response> {
        let request = PlaylistRequest::from_query(
            query,
            &base_url,
            services.config.api_password.as_deref(),
        )?;

        info!(
            "building playlist from {} sources via {}",
            request.sources.len(),
            request.base_url
        );

        let body = Body::from_stream(services.playlists.combined_stream(request));

        Ok((StatusCode::OK, Self::playlist_headers(), body).into_response())
    }

    async fn playlist_options() -> impl IntoResponse {
        StatusCode::NO_CONTENT
    }
}
