//! API error type and [`axum::response::IntoResponse`] implementation.
//!
//! Domain rejections keep their identity on the wire: the body carries the
//! machine-readable kind from [`bubble_core::Error::kind`] next to the
//! message, so callers never have to parse text to tell failures apart.

use axum::{
  Json,
  extract::rejection::{JsonRejection, PathRejection, QueryRejection},
  http::StatusCode,
  response::{IntoResponse, Response},
};
use bubble_core::store::StoreError;
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("{message}")]
  Rejected {
    status:  StatusCode,
    kind:    &'static str,
    message: String,
  },

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  /// Classify a backend error, unwrapping domain rejections.
  pub fn from_store<E>(e: E) -> Self
  where
    E: std::error::Error + StoreError + Send + Sync + 'static,
  {
    match e.domain() {
      Some(core) => Self::from_core(core),
      None => Self::Store(Box::new(e)),
    }
  }

  fn from_core(e: &bubble_core::Error) -> Self {
    use bubble_core::Error as E;

    let status = match e {
      E::NotFound(_) => StatusCode::NOT_FOUND,
      E::DuplicateIdentity(_)
      | E::AlreadyConnected(..)
      | E::DuplicateContact { .. }
      | E::InvalidDate(_) => StatusCode::PRECONDITION_FAILED,
      E::SelfConnection(_) | E::UnknownStatusCode(_) => StatusCode::BAD_REQUEST,
    };
    Self::Rejected { status, kind: e.kind(), message: e.to_string() }
  }
}

impl From<bubble_core::Error> for ApiError {
  fn from(e: bubble_core::Error) -> Self { Self::from_core(&e) }
}

impl From<JsonRejection> for ApiError {
  fn from(r: JsonRejection) -> Self { Self::BadRequest(r.body_text()) }
}

impl From<QueryRejection> for ApiError {
  fn from(r: QueryRejection) -> Self { Self::BadRequest(r.body_text()) }
}

impl From<PathRejection> for ApiError {
  fn from(r: PathRejection) -> Self { Self::BadRequest(r.body_text()) }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, kind, message) = match &self {
      ApiError::Rejected { status, kind, message } => (*status, *kind, message.clone()),
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, "bad_request", m.clone()),
      ApiError::Store(e) => {
        tracing::error!(error = %e, "store failure");
        (StatusCode::INTERNAL_SERVER_ERROR, "store", e.to_string())
      }
    };
    if status.is_client_error() {
      tracing::warn!(%status, kind, %message, "request rejected");
    }
    (status, Json(json!({ "error": kind, "message": message }))).into_response()
  }
}
