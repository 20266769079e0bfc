//! Error types for `bubble-core`.
//!
//! Every variant is a deterministic rejection detected from current state;
//! none of them is worth retrying.

use chrono::NaiveDate;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  #[error("user not found: {0}")]
  NotFound(Uuid),

  #[error("a user with contact address {0:?} already exists")]
  DuplicateIdentity(String),

  #[error("users {0} and {1} are already connected")]
  AlreadyConnected(Uuid, Uuid),

  #[error("already a temporary connection with {peer} on {date}")]
  DuplicateContact { peer: Uuid, date: NaiveDate },

  #[error("date {0} falls outside the contact window")]
  InvalidDate(NaiveDate),

  #[error("user {0} cannot be connected to itself")]
  SelfConnection(Uuid),

  #[error("unknown status code: {0}")]
  UnknownStatusCode(u8),
}

impl Error {
  /// A stable, machine-readable name for the failure kind.
  pub fn kind(&self) -> &'static str {
    match self {
      Self::NotFound(_) => "not_found",
      Self::DuplicateIdentity(_) => "duplicate_identity",
      Self::AlreadyConnected(..) => "already_connected",
      Self::DuplicateContact { .. } => "duplicate_contact",
      Self::InvalidDate(_) => "invalid_date",
      Self::SelfConnection(_) => "self_connection",
      Self::UnknownStatusCode(_) => "unknown_status_code",
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
