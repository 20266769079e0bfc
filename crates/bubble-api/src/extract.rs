//! Request extractors whose rejections render as [`ApiError`].
//!
//! axum's stock extractors answer malformed input with plain-text bodies
//! (and 422 for JSON that parses but does not fit the type). These wrappers
//! route those rejections through [`ApiError::BadRequest`] so every failure
//! carries the same `{"error", "message"}` body.

use axum::extract::{FromRequest, FromRequestParts};

use crate::error::ApiError;

/// JSON request body.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct JsonBody<T>(pub T);

/// URL query string.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct QueryParams<T>(pub T);

/// Path segments.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct PathParam<T>(pub T);
