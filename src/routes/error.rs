// JSON error responses: {"error": "..."}

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::transform::TransformError;

#[derive(Debug)]
pub(crate) enum ApiError {
    BadRequest(String),
    NotFound(String),
    /// Stored data does not fit the requested chart (schema mismatch).
    DataIntegrity(String),
    Internal(anyhow::Error),
}

impl From<anyhow::Error> for ApiError {
    fn from(e: anyhow::Error) -> Self {
        match e.downcast_ref::<TransformError>() {
            Some(t) => ApiError::DataIntegrity(t.to_string()),
            None => ApiError::Internal(e),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m),
            ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m),
            ApiError::DataIntegrity(m) => {
                tracing::warn!(error = %m, "data integrity error");
                (StatusCode::UNPROCESSABLE_ENTITY, m)
            }
            ApiError::Internal(e) => {
                tracing::error!(error = %e, "request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
            }
        };
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}
