//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use majlis_core::Error as CoreError;
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  /// No usable caller identity on the request.
  #[error("unauthorized")]
  Unauthorized,

  #[error(transparent)]
  Core(#[from] CoreError),
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, body) = match &self {
      ApiError::Unauthorized => {
        (StatusCode::UNAUTHORIZED, json!({ "error": "unauthorized" }))
      }
      ApiError::Core(CoreError::InvalidInput { field, reason }) => (
        StatusCode::BAD_REQUEST,
        json!({ "error": reason, "field": field }),
      ),
      ApiError::Core(CoreError::NotFound(entity)) => {
        (StatusCode::NOT_FOUND, json!({ "error": format!("{entity} not found") }))
      }
      ApiError::Core(CoreError::Forbidden) => {
        (StatusCode::FORBIDDEN, json!({ "error": "forbidden" }))
      }
      ApiError::Core(e @ (CoreError::Conflict(_) | CoreError::Internal(_))) => {
        tracing::error!(error = %e, "request failed");
        (
          StatusCode::INTERNAL_SERVER_ERROR,
          json!({ "error": "internal error" }),
        )
      }
    };
    (status, Json(body)).into_response()
  }
}
