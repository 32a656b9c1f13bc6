//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use depot_core::Error as CoreError;
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("missing actor headers")]
  Unauthenticated,

  #[error(transparent)]
  Store(#[from] depot_store_sqlite::Error),
}

impl ApiError {
  pub fn status(&self) -> StatusCode {
    match self {
      Self::NotFound(_) => StatusCode::NOT_FOUND,
      Self::BadRequest(_) => StatusCode::BAD_REQUEST,
      Self::Unauthenticated => StatusCode::UNAUTHORIZED,
      Self::Store(err) => match err.as_core() {
        Some(
          CoreError::DocumentNotFound(_)
          | CoreError::LineNotFound { .. }
          | CoreError::ItemNotFound(_),
        ) => StatusCode::NOT_FOUND,
        Some(CoreError::PermissionDenied { .. }) => StatusCode::FORBIDDEN,
        Some(
          CoreError::DocumentLocked(_)
          | CoreError::PostingRejected { .. }
          | CoreError::IntegrityViolation(_),
        ) => StatusCode::CONFLICT,
        Some(
          CoreError::InsufficientStock { .. }
          | CoreError::EmptyDocument(_)
          | CoreError::Validation(_),
        ) => StatusCode::UNPROCESSABLE_ENTITY,
        None => StatusCode::INTERNAL_SERVER_ERROR,
      },
    }
  }

  pub fn code(&self) -> &'static str {
    match self {
      Self::NotFound(_) => "NOT_FOUND",
      Self::BadRequest(_) => "BAD_REQUEST",
      Self::Unauthenticated => "UNAUTHENTICATED",
      Self::Store(err) => err.code(),
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = self.status();
    if status.is_server_error() {
      error!(error = %self, "request failed");
    }
    let body = json!({ "error": self.to_string(), "code": self.code() });
    (status, Json(body)).into_response()
  }
}
