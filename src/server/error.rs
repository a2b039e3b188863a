use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

pub type AppResult<T> = Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("{0}")]
    BadRequest(String),
    #[error("unexpected error has occurred")]
    InternalServerError,
    #[error("{0}")]
    InternalServerErrorWithContext(String),
    #[error(transparent)]
    AnyhowError(#[from] anyhow::Error),
}

impl Error {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::InternalServerError
            | Self::InternalServerErrorWithContext(_)
            | Self::AnyhowError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // the reason is only useful to the client for 400s, everything else stays in the logs
        let detail = match &self {
            Self::BadRequest(reason) => reason.clone(),
            other => {
                error!("request failed with internal error: {}", other);
                Self::InternalServerError.to_string()
            }
        };

        (status, Json(json!({ "detail": detail }))).into_response()
    }
}
