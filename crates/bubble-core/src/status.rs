//! Health status, the signal propagated across first-degree connections.
//!
//! A status is only ever *persisted* through a self-report
//! ([`Status::self_reported`]). Exposure is never stored: it is derived at
//! poll time from the neighbours' statuses by [`derive_poll`].

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::Error;

// ─── Status ──────────────────────────────────────────────────────────────────

/// The closed set of observable statuses. Serialised as its numeric code.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize,
)]
#[serde(try_from = "u8", into = "u8")]
pub enum Status {
  Positive,
  Exposed,
  Recovered,
  #[default]
  Baseline,
}

impl Status {
  /// The wire and storage code. Code `3` is reserved and never produced.
  pub fn code(self) -> u8 {
    match self {
      Self::Positive => 0,
      Self::Exposed => 1,
      Self::Recovered => 2,
      Self::Baseline => 4,
    }
  }

  /// The status a user moves to when they report their own result.
  pub fn self_reported(positive: bool) -> Self {
    if positive { Self::Positive } else { Self::Recovered }
  }
}

impl TryFrom<u8> for Status {
  type Error = Error;

  fn try_from(code: u8) -> Result<Self, Self::Error> {
    match code {
      0 => Ok(Self::Positive),
      1 => Ok(Self::Exposed),
      2 => Ok(Self::Recovered),
      4 => Ok(Self::Baseline),
      other => Err(Error::UnknownStatusCode(other)),
    }
  }
}

impl From<Status> for u8 {
  fn from(status: Status) -> Self { status.code() }
}

// ─── Operation results ───────────────────────────────────────────────────────

/// Result of [`crate::store::BubbleStore::set_status`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusUpdate {
  #[serde(rename = "_id")]
  pub user_id: Uuid,
  #[serde(rename = "healthStatus")]
  pub status:  Status,
}

/// Result of [`crate::store::BubbleStore::poll_status`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusPoll {
  #[serde(rename = "_id")]
  pub user_id: Uuid,
  /// Whether the derived status differs from the stored one.
  pub changed: bool,
  #[serde(rename = "healthStatus")]
  pub status:  Status,
}

// ─── Derivation ──────────────────────────────────────────────────────────────

/// Derive the effective status of a user from their stored status and the
/// statuses of their first-degree neighbours.
///
/// Any positive neighbour exposes the user, whatever their stored status.
/// Without one, the stored status stands.
pub fn derive_poll<I>(user_id: Uuid, stored: Status, neighbours: I) -> StatusPoll
where
  I: IntoIterator<Item = Status>,
{
  let exposed = neighbours.into_iter().any(|s| s == Status::Positive);
  let status = if exposed { Status::Exposed } else { stored };

  StatusPoll { user_id, changed: status != stored, status }
}
