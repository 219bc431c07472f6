//! Error types and axum `IntoResponse` implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use chirp_core::{ErrorKind, identity::RightKind};
use serde_json::json;
use thiserror::Error;

/// An error returned by a handler or the auth extractor.
///
/// Wraps the core taxonomy; the status code is chosen from its
/// [`ErrorKind`].
#[derive(Debug, Error)]
#[error(transparent)]
pub struct ApiError(#[from] pub chirp_core::Error);

impl ApiError {
  /// Convert a store backend error.
  pub fn store<E: Into<chirp_core::Error>>(e: E) -> Self { Self(e.into()) }

  pub fn kind(&self) -> ErrorKind { self.0.kind() }
}

impl From<chirp_auth::Error> for ApiError {
  fn from(e: chirp_auth::Error) -> Self { Self(e.into()) }
}

fn status_for(kind: ErrorKind) -> StatusCode {
  match kind {
    ErrorKind::Validation => StatusCode::BAD_REQUEST,
    ErrorKind::NotFound => StatusCode::NOT_FOUND,
    ErrorKind::Conflict => StatusCode::CONFLICT,
    ErrorKind::Auth => StatusCode::UNAUTHORIZED,
    ErrorKind::EntitlementExhausted => StatusCode::FORBIDDEN,
    ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let kind = self.kind();
    let message = match kind {
      // The cause stays in the log; callers only learn that it was us.
      ErrorKind::Internal => {
        tracing::error!(error = ?self.0, "request failed");
        "internal server error".to_string()
      }
      _ => self.0.to_string(),
    };
    (status_for(kind), Json(json!({ "error": message }))).into_response()
  }
}

// ─── Startup validation ──────────────────────────────────────────────────────

/// A configuration value the server refuses to start with.
#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("token_secret must be set to a non-empty value")]
  EmptySecret,

  #[error("{right} ticket schedule has percent {percent}; expected 0..=100")]
  PercentOutOfRange { right: RightKind, percent: u8 },

  #[error("{0} must be greater than zero")]
  ZeroTimeout(&'static str),
}
