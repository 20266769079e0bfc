//! Admission and pruning rules for temporary (dated) connections.
//!
//! The validity window is anchored to the most recent date already recorded
//! in a user's ledger rather than to the wall clock, so results depend only on
//! the stored events. The anchoring rule lives behind [`WindowPolicy`]; the
//! functions in this module never look at the clock themselves.

use chrono::{Days, NaiveDate};
use uuid::Uuid;

use crate::{Error, Result, user::TemporaryConnection};

/// Default window width, in days.
pub const DEFAULT_WINDOW_DAYS: u64 = 14;

// ─── Policy ──────────────────────────────────────────────────────────────────

/// Decides which dates of a ledger are current.
pub trait WindowPolicy: Send + Sync {
  /// The reference date for a ledger, or `None` if every date is current.
  fn anchor(&self, ledger: &[TemporaryConnection]) -> Option<NaiveDate>;

  /// Whether `date` is current relative to `anchor`.
  fn is_current(&self, anchor: NaiveDate, date: NaiveDate) -> bool;
}

/// Window anchored to the latest recorded date. A date is current when it is
/// at most `width` days before the anchor; later dates are always current.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LatestRecordedWindow {
  width: Days,
}

impl LatestRecordedWindow {
  pub fn new(days: u64) -> Self { Self { width: Days::new(days) } }
}

impl Default for LatestRecordedWindow {
  fn default() -> Self { Self::new(DEFAULT_WINDOW_DAYS) }
}

impl WindowPolicy for LatestRecordedWindow {
  fn anchor(&self, ledger: &[TemporaryConnection]) -> Option<NaiveDate> {
    ledger.iter().map(|tc| tc.date).max()
  }

  fn is_current(&self, anchor: NaiveDate, date: NaiveDate) -> bool {
    match anchor.checked_sub_days(self.width) {
      Some(earliest) => date >= earliest,
      None => true,
    }
  }
}

// ─── Rules ───────────────────────────────────────────────────────────────────

/// Check whether `(peer, date)` may be appended to `ledger`.
///
/// Rejects an identical event with [`Error::DuplicateContact`] and a date
/// before the window with [`Error::InvalidDate`].
pub fn check_admission(
  policy: &dyn WindowPolicy,
  ledger: &[TemporaryConnection],
  peer: Uuid,
  date: NaiveDate,
) -> Result<()> {
  if ledger.iter().any(|tc| tc.peer_id == peer && tc.date == date) {
    return Err(Error::DuplicateContact { peer, date });
  }
  if let Some(anchor) = policy.anchor(ledger)
    && !policy.is_current(anchor, date)
  {
    return Err(Error::InvalidDate(date));
  }
  Ok(())
}

/// The current entries of `ledger`, in their original order.
pub fn prune(
  policy: &dyn WindowPolicy,
  ledger: &[TemporaryConnection],
) -> Vec<TemporaryConnection> {
  match policy.anchor(ledger) {
    Some(anchor) => ledger
      .iter()
      .filter(|tc| policy.is_current(anchor, tc.date))
      .copied()
      .collect(),
    None => ledger.to_vec(),
  }
}
