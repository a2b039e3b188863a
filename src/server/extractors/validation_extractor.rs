use axum::extract::{FromRequestParts, Query};
use axum::http::request::Parts;
use serde::de::DeserializeOwned;
use tracing::debug;
use validator::Validate;

use crate::server::error::Error;

/// query extractor that also runs the `validator` rules, anything off is a 400
pub struct ValidatedQuery<T>(pub T);

impl<T, S> FromRequestParts<S> for ValidatedQuery<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|err| {
                debug!("rejected query: {}", err.body_text());
                Error::BadRequest(err.body_text())
            })?;

        value.validate().map_err(|err| {
            debug!("query failed validation: {}", err);
            Error::BadRequest(err.to_string())
        })?;

        Ok(ValidatedQuery(value))
    }
}
