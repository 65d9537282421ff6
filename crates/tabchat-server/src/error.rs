//! The single presentation layer for component failures.
//!
//! Every `TabchatError` becomes a status code plus a user-visible JSON
//! body; handlers return `Result<_, ApiError>` and use `?`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tabchat_core::TabchatError;

/// Wrapper turning core errors into HTTP responses.
#[derive(Debug)]
pub struct ApiError(pub TabchatError);

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

impl From<TabchatError> for ApiError {
    fn from(error: TabchatError) -> Self {
        Self(error)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            TabchatError::SessionNotFound(_) => StatusCode::NOT_FOUND,
            TabchatError::SessionLimitExceeded(_) => StatusCode::TOO_MANY_REQUESTS,
            TabchatError::CredentialMissing => StatusCode::UNAUTHORIZED,
            TabchatError::UploadParseFailure(_)
            | TabchatError::ExtractionFailure(_)
            | TabchatError::ColumnNotFound(_)
            | TabchatError::DatasetMissing
            | TabchatError::InvalidRequest(_) => StatusCode::UNPROCESSABLE_ENTITY,
            TabchatError::CompletionFailed(_) | TabchatError::Http(_) => StatusCode::BAD_GATEWAY,
            TabchatError::ExecutionFailure(_)
            | TabchatError::IoError(_)
            | TabchatError::JsonError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = ErrorBody {
            error: self.0.code(),
            message: self.0.to_string(),
        };

        (status, Json(body)).into_response()
    }
}
