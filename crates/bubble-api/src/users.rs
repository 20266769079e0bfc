//! Handlers for the user directory.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `PUT`  | `/user/newUser` | Body: `{"firstName","lastName","email"}`; 412 on duplicate email |
//! | `GET`  | `/user/findByQuery` | Optional `_id`, `firstName`, `lastName`, `email` |
//! | `GET`  | `/user/{id}` | 404 if not found |

use std::sync::Arc;

use axum::{Json, extract::State};
use bubble_core::{
  store::BubbleStore,
  user::{NewUser, User, UserQuery},
};
use uuid::Uuid;

use crate::{
  error::ApiError,
  extract::{JsonBody, PathParam, QueryParams},
};

// ─── Create ───────────────────────────────────────────────────────────────────

/// `PUT /user/newUser`
pub async fn create<S>(
  State(store): State<Arc<S>>,
  JsonBody(body): JsonBody<NewUser>,
) -> Result<Json<User>, ApiError>
where
  S: BubbleStore,
{
  for (field, value) in [
    ("firstName", &body.given_name),
    ("lastName", &body.family_name),
    ("email", &body.email),
  ] {
    if value.trim().is_empty() {
      return Err(ApiError::BadRequest(format!("{field} is required")));
    }
  }
  let user = store.create_user(body).await.map_err(ApiError::from_store)?;
  Ok(Json(user))
}

// ─── Search ───────────────────────────────────────────────────────────────────

/// `GET /user/findByQuery[?_id=...][&firstName=...][&lastName=...][&email=...]`
pub async fn find<S>(
  State(store): State<Arc<S>>,
  QueryParams(query): QueryParams<UserQuery>,
) -> Result<Json<Vec<User>>, ApiError>
where
  S: BubbleStore,
{
  let users = store.find_users(&query).await.map_err(ApiError::from_store)?;
  Ok(Json(users))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /user/{id}`
pub async fn get_one<S>(
  State(store): State<Arc<S>>,
  PathParam(id): PathParam<Uuid>,
) -> Result<Json<User>, ApiError>
where
  S: BubbleStore,
{
  let user = store
    .get_user(id)
    .await
    .map_err(ApiError::from_store)?
    .ok_or(bubble_core::Error::NotFound(id))?;
  Ok(Json(user))
}
