use axum::Extension;
use axum::extract::FromRequestParts;
use axum::http::{HeaderMap, header::HOST, request::Parts};
use tracing::{debug, error};

use crate::server::error::Error;
use crate::server::services::app_services::AppServices;

/// public base url rewritten entries should point at, plus the services so handlers don't
/// need a second extractor
pub struct RequestBaseUrl(pub String, pub AppServices);

fn first_header_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.split(',').next())
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// builds `scheme://host` from the request, honouring the reverse proxy headers first
pub fn base_url_from_headers(headers: &HeaderMap) -> Option<String> {
    let scheme = first_header_value(headers, "x-forwarded-proto")
        .or_else(|| first_header_value(headers, "x-forwarded-scheme"))
        .unwrap_or("http");

    let host = first_header_value(headers, "x-forwarded-host")
        .or_else(|| first_header_value(headers, HOST.as_str()))?;

    Some(format!("{}://{}", scheme, host))
}

impl<S> FromRequestParts<S> for RequestBaseUrl
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Extension(services): Extension<AppServices> =
            Extension::from_request_parts(parts, state)
                .await
                .map_err(|err| Error::InternalServerErrorWithContext(err.to_string()))?;

        // a configured base url always wins over whatever the request says
        if let Some(base_url) = services.config.base_url.as_deref() {
            return Ok(RequestBaseUrl(
                base_url.trim_end_matches('/').to_string(),
                services,
            ));
        }

        let base_url = base_url_from_headers(&parts.headers)
            .or_else(|| {
                parts
                    .uri
                    .authority()
                    .map(|authority| format!("http://{}", authority))
            })
            .ok_or_else(|| {
                error!("request has no host to build a base url from");
                Error::BadRequest("Missing Host header".to_string())
            })?;

        debug!("derived base url {} from request", base_url);

        Ok(RequestBaseUrl(base_url, services))
    }
}
