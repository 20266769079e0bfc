//! Handlers for permanent and temporary connections.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/user/addFirstConnection` | Body: `{"firstID","secondID"}`; returns both users |
//! | `GET`  | `/user/getAllConnections` | `?_id` required; first/second/third degree |
//! | `POST` | `/user/addTemporaryConnection` | Body: `{"firstID","secondID","date"}`; returns both users |
//! | `GET`  | `/user/getTemporaryConnections` | `?_id` required; window-pruned list |

use std::sync::Arc;

use axum::{Json, extract::State};
use bubble_core::{
  graph::Connections,
  store::BubbleStore,
  user::{TemporaryConnection, User},
};
use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

use crate::{
  error::ApiError,
  extract::{JsonBody, QueryParams},
};

#[derive(Debug, Deserialize)]
pub struct IdParams {
  #[serde(rename = "_id")]
  pub id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct PairBody {
  #[serde(rename = "firstID")]
  pub first_id:  Uuid,
  #[serde(rename = "secondID")]
  pub second_id: Uuid,
}

/// Body of `POST /user/addTemporaryConnection`.
#[derive(Debug, Deserialize)]
pub struct TemporaryBody {
  #[serde(rename = "firstID")]
  pub first_id:  Uuid,
  #[serde(rename = "secondID")]
  pub second_id: Uuid,
  /// `YYYY-MM-DD`; month and day may omit the leading zero.
  pub date:      String,
}

fn parse_date(s: &str) -> Result<NaiveDate, ApiError> {
  NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
    .map_err(|e| ApiError::BadRequest(format!("invalid date {s:?}: {e}")))
}

// ─── First-degree ─────────────────────────────────────────────────────────────

/// `POST /user/addFirstConnection`
pub async fn add_first<S>(
  State(store): State<Arc<S>>,
  JsonBody(body): JsonBody<PairBody>,
) -> Result<Json<[User; 2]>, ApiError>
where
  S: BubbleStore,
{
  let (a, b) = store
    .add_first_connection(body.first_id, body.second_id)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json([a, b]))
}

/// `GET /user/getAllConnections?_id=<id>`
pub async fn all<S>(
  State(store): State<Arc<S>>,
  QueryParams(params): QueryParams<IdParams>,
) -> Result<Json<Connections>, ApiError>
where
  S: BubbleStore,
{
  let connections = store
    .get_connections(params.id)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(connections))
}

// ─── Temporary ────────────────────────────────────────────────────────────────

/// `POST /user/addTemporaryConnection`
pub async fn add_temporary<S>(
  State(store): State<Arc<S>>,
  JsonBody(body): JsonBody<TemporaryBody>,
) -> Result<Json<[User; 2]>, ApiError>
where
  S: BubbleStore,
{
  let date = parse_date(&body.date)?;
  let (a, b) = store
    .add_temporary_connection(body.first_id, body.second_id, date)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json([a, b]))
}

/// `GET /user/getTemporaryConnections?_id=<id>`
pub async fn temporary<S>(
  State(store): State<Arc<S>>,
  QueryParams(params): QueryParams<IdParams>,
) -> Result<Json<Vec<TemporaryConnection>>, ApiError>
where
  S: BubbleStore,
{
  let current = store
    .get_temporary_connections(params.id)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(current))
}
