//! Handlers for `/healthStatus` endpoints.
//!
//! Self-reports are persisted; polls only derive.

use std::sync::Arc;

use axum::{Json, extract::State};
use bubble_core::{
  status::{StatusPoll, StatusUpdate},
  store::BubbleStore,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
  error::ApiError,
  extract::{JsonBody, QueryParams},
};

#[derive(Debug, Deserialize)]
pub struct UpdateBody {
  pub id:       Uuid,
  /// `true` for a positive result, `false` once recovered.
  #[serde(rename = "healthStatus")]
  pub positive: bool,
}

/// `POST /healthStatus/updateHealthStatus`
pub async fn update<S>(
  State(store): State<Arc<S>>,
  JsonBody(body): JsonBody<UpdateBody>,
) -> Result<Json<StatusUpdate>, ApiError>
where
  S: BubbleStore,
{
  let update = store
    .set_status(body.id, body.positive)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(update))
}

#[derive(Debug, Deserialize)]
pub struct PollParams {
  pub id: Uuid,
}

/// `GET /healthStatus/pollHealthStatus?id=<id>`
pub async fn poll<S>(
  State(store): State<Arc<S>>,
  QueryParams(params): QueryParams<PollParams>,
) -> Result<Json<StatusPoll>, ApiError>
where
  S: BubbleStore,
{
  let polled = store
    .poll_status(params.id)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(polled))
}
