//! User records: the identity envelope that owns connections and status.
//!
//! Field names serialise in the camel-case shape the mobile client already
//! speaks (`_id`, `firstName`, `firstConnections`, ...).

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::status::Status;

// ─── Temporary connections ───────────────────────────────────────────────────

/// A dated proximity event with another user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TemporaryConnection {
  #[serde(rename = "_id")]
  pub peer_id: Uuid,
  pub date:    NaiveDate,
}

// ─── User ────────────────────────────────────────────────────────────────────

/// A single identity in the directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
  #[serde(rename = "_id")]
  pub user_id:               Uuid,
  #[serde(rename = "firstName")]
  pub given_name:            String,
  #[serde(rename = "lastName")]
  pub family_name:           String,
  /// Globally unique contact address.
  pub email:                 String,
  #[serde(rename = "creationDate")]
  pub created_at:            DateTime<Utc>,
  /// Symmetric: every id listed here lists this user back.
  pub first_connections:     Vec<Uuid>,
  /// Every recorded event in insertion order, unpruned.
  pub temporary_connections: Vec<TemporaryConnection>,
  #[serde(rename = "healthStatus")]
  pub status:                Status,
}

// ─── NewUser ─────────────────────────────────────────────────────────────────

/// Input to [`crate::store::BubbleStore::create_user`].
/// `user_id`, `created_at` and the initial status are assigned by the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewUser {
  #[serde(rename = "firstName")]
  pub given_name:  String,
  #[serde(rename = "lastName")]
  pub family_name: String,
  pub email:       String,
}

impl NewUser {
  pub fn new(
    given_name: impl Into<String>,
    family_name: impl Into<String>,
    email: impl Into<String>,
  ) -> Self {
    Self {
      given_name:  given_name.into(),
      family_name: family_name.into(),
      email:       email.into(),
    }
  }
}

// ─── Query type ──────────────────────────────────────────────────────────────

/// Parameters for [`crate::store::BubbleStore::find_users`].
///
/// Every field that is set must match exactly; an empty query matches every
/// user.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserQuery {
  #[serde(rename = "_id")]
  pub user_id:     Option<Uuid>,
  #[serde(rename = "firstName")]
  pub given_name:  Option<String>,
  #[serde(rename = "lastName")]
  pub family_name: Option<String>,
  pub email:       Option<String>,
}

impl UserQuery {
  pub fn by_email(email: impl Into<String>) -> Self {
    Self { email: Some(email.into()), ..Default::default() }
  }
}
