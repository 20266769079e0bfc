//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings, calendar dates as `YYYY-MM-DD`,
//! UUIDs as hyphenated lowercase strings and statuses as their numeric code.

use bubble_core::{
  status::Status,
  user::{TemporaryConnection, User},
};
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

/// The `(low_id, high_id)` key of the edge between `a` and `b`.
pub fn encode_pair(a: Uuid, b: Uuid) -> (String, String) {
  let (a, b) = (encode_uuid(a), encode_uuid(b));
  if a < b { (a, b) } else { (b, a) }
}

// ─── DateTime<Utc>
// ────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── NaiveDate
// ────────────────────────────────────────────────────────────────

const DATE_FORMAT: &str = "%Y-%m-%d";

pub fn encode_date(d: NaiveDate) -> String { d.format(DATE_FORMAT).to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, DATE_FORMAT)
    .map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

// ─── Status
// ───────────────────────────────────────────────────────────────────

pub fn encode_status(s: Status) -> i64 { i64::from(s.code()) }

/// A stored code outside the known set is a storage fault, not a rejection.
pub fn decode_status(code: i64) -> Result<Status> {
  u8::try_from(code)
    .ok()
    .and_then(|c| Status::try_from(c).ok())
    .ok_or_else(|| Error::InvalidColumn(format!("status code {code}")))
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw values read from a `users` row plus its edge and ledger rows.
pub struct RawUser {
  pub user_id:               String,
  pub given_name:            String,
  pub family_name:           String,
  pub email:                 String,
  pub created_at:            String,
  pub status:                i64,
  pub first_connections:     Vec<String>,
  /// `(peer_id, date)` in insertion order.
  pub temporary_connections: Vec<(String, String)>,
}

impl RawUser {
  pub fn into_user(self) -> Result<User> {
    let first_connections = self
      .first_connections
      .iter()
      .map(|s| decode_uuid(s))
      .collect::<Result<_>>()?;

    let temporary_connections = self
      .temporary_connections
      .iter()
      .map(|(peer, date)| -> Result<TemporaryConnection> {
        Ok(TemporaryConnection {
          peer_id: decode_uuid(peer)?,
          date:    decode_date(date)?,
        })
      })
      .collect::<Result<_>>()?;

    Ok(User {
      user_id: decode_uuid(&self.user_id)?,
      given_name: self.given_name,
      family_name: self.family_name,
      email: self.email,
      created_at: decode_dt(&self.created_at)?,
      first_connections,
      temporary_connections,
      status: decode_status(self.status)?,
    })
  }
}
