//! The `BubbleStore` trait and its error contract.
//!
//! The trait is implemented by storage backends (e.g. `bubble-store-sqlite`).
//! Higher layers (`bubble-api`, `bubble-server`) depend on this abstraction,
//! not on any concrete backend.

use std::future::Future;

use chrono::NaiveDate;
use uuid::Uuid;

use crate::{
  graph::Connections,
  status::{StatusPoll, StatusUpdate},
  user::{NewUser, TemporaryConnection, User, UserQuery},
};

// ─── Errors ──────────────────────────────────────────────────────────────────

/// Lets callers recover the domain failure behind a backend error.
///
/// Backends wrap [`crate::Error`] alongside their own I/O failures; the
/// boundary layer needs the domain kind to pick a response.
pub trait StoreError {
  /// The domain rejection, or `None` for a storage-level failure.
  fn domain(&self) -> Option<&crate::Error>;
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a Bubble storage backend.
///
/// Operations that touch two users (edge add, temporary contact add) must be
/// applied atomically: either both records change or neither does, and the
/// existence checks happen in the same unit as the write.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait BubbleStore: Send + Sync {
  type Error: std::error::Error + StoreError + Send + Sync + 'static;

  // ── Directory ─────────────────────────────────────────────────────────

  /// Create and persist a new user with `Baseline` status.
  ///
  /// Fails with `DuplicateIdentity` if the email is already taken; no record
  /// is created in that case.
  fn create_user(
    &self,
    input: NewUser,
  ) -> impl Future<Output = Result<User, Self::Error>> + Send + '_;

  /// Retrieve a user by id. Returns `None` if not found.
  fn get_user(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + '_;

  /// All users matching every field set in `query`.
  fn find_users<'a>(
    &'a self,
    query: &'a UserQuery,
  ) -> impl Future<Output = Result<Vec<User>, Self::Error>> + Send + 'a;

  // ── Connection graph ──────────────────────────────────────────────────

  /// Connect `a` and `b` symmetrically and return both updated records,
  /// `a` first.
  fn add_first_connection(
    &self,
    a: Uuid,
    b: Uuid,
  ) -> impl Future<Output = Result<(User, User), Self::Error>> + Send + '_;

  /// First, second and third-degree connections of `id`.
  fn get_connections(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Connections, Self::Error>> + Send + '_;

  // ── Exposure ledger ───────────────────────────────────────────────────

  /// Record a dated contact between `a` and `b` on both ledgers and return
  /// both updated records, `a` first.
  fn add_temporary_connection(
    &self,
    a: Uuid,
    b: Uuid,
    date: NaiveDate,
  ) -> impl Future<Output = Result<(User, User), Self::Error>> + Send + '_;

  /// The current (window-pruned) temporary connections of `id`.
  fn get_temporary_connections(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Vec<TemporaryConnection>, Self::Error>>
  + Send
  + '_;

  // ── Status ────────────────────────────────────────────────────────────

  /// Persist a self-reported result: `Positive` if `positive`, otherwise
  /// `Recovered`.
  fn set_status(
    &self,
    id: Uuid,
    positive: bool,
  ) -> impl Future<Output = Result<StatusUpdate, Self::Error>> + Send + '_;

  /// Derive the effective status of `id` from its neighbours. Never writes.
  fn poll_status(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<StatusPoll, Self::Error>> + Send + '_;
}
