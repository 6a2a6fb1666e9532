use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::storage::StorageError;

/// Everything that can go wrong while answering a request.
///
/// None of these stop the server, they are turned into an error response and
/// no partial document is ever sent.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("loading demo: {0}")]
    Storage(#[from] StorageError),
    #[error("reading upload: {0}")]
    Upload(#[from] axum::extract::multipart::MultipartError),
    #[error("missing multipart field {0:?}")]
    MissingUpload(&'static str),
    #[error("parsing demo: {0}")]
    Parse(#[from] ::analysis::ParseError),
    #[error("serializing events: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("writing {path:?}: {source}")]
    Output {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("running analysis: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Storage(StorageError::InvalidLocation(_)) => StatusCode::BAD_REQUEST,
            Self::Storage(StorageError::TooLarge { .. }) => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Storage(StorageError::Task(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Storage(_) => StatusCode::BAD_GATEWAY,
            Self::Upload(e) => e.status(),
            Self::MissingUpload(_) => StatusCode::BAD_REQUEST,
            Self::Parse(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Serialize(_) | Self::Output { .. } | Self::Task(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(%status, "{}", self);
        } else {
            tracing::warn!(%status, "{}", self);
        }

        (
            status,
            axum::Json(common::ErrorResponse {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}
