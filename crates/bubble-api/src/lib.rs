//! JSON REST API for Bubble.
//!
//! Exposes an axum [`Router`] backed by any [`bubble_core::store::BubbleStore`].
//! Paths and field names follow the shape the mobile client already uses.
//! Auth, TLS, and transport concerns are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! let app = bubble_api::api_router(Arc::new(store));
//! ```

pub mod connections;
pub mod error;
pub mod extract;
pub mod health;
pub mod users;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post, put},
};
use bubble_core::store::BubbleStore;

pub use error::ApiError;

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>) -> Router<()>
where
  S: BubbleStore + 'static,
{
  Router::new()
    // Directory
    .route("/user/newUser", put(users::create::<S>))
    .route("/user/findByQuery", get(users::find::<S>))
    .route("/user/{id}", get(users::get_one::<S>))
    // Connections
    .route("/user/addFirstConnection", post(connections::add_first::<S>))
    .route("/user/getAllConnections", get(connections::all::<S>))
    .route("/user/addTemporaryConnection", post(connections::add_temporary::<S>))
    .route("/user/getTemporaryConnections", get(connections::temporary::<S>))
    // Health status
    .route("/healthStatus/updateHealthStatus", post(health::update::<S>))
    .route("/healthStatus/pollHealthStatus", get(health::poll::<S>))
    .with_state(store)
}

// ─── Integration tests ────────────────────────────────────────────────────────
