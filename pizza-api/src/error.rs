use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use pizza_store::StoreError;
use serde_json::json;
use tracing::{error, warn};

use crate::json::PrettyJson;

pub const VALIDATION_ERRORS: &str = "validation errors";

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(&'static str),
    #[error("validation errors")]
    Validation,
    #[error("Internal server error: {0}")]
    InternalError(String),
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => ApiError::NotFound("Not found"),
            StoreError::Validation(reason) => {
                warn!(%reason, "rejected write");
                ApiError::Validation
            }
            other => ApiError::InternalError(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::NotFound(message) => (
                StatusCode::NOT_FOUND,
                PrettyJson(json!({ "error": message })),
            )
                .into_response(),
            ApiError::Validation => (
                StatusCode::BAD_REQUEST,
                PrettyJson(json!({ "errors": [VALIDATION_ERRORS] })),
            )
                .into_response(),
            ApiError::InternalError(detail) => {
                error!(%detail, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    PrettyJson(json!({ "error": "Internal server error" })),
                )
                    .into_response()
            }
        }
    }
}
