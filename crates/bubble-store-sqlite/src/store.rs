//! [`SqliteStore`] — the SQLite implementation of [`BubbleStore`].
//!
//! Every operation runs as a single closure on the `tokio_rusqlite`
//! connection thread. Writes that touch two users open an `IMMEDIATE`
//! transaction, so the existence and duplicate checks and both inserts form
//! one unit with respect to every other writer.

use std::{path::Path, sync::Arc};

use bubble_core::{
  graph::{self, Connections},
  ledger::{self, LatestRecordedWindow, WindowPolicy},
  status::{self, Status, StatusPoll, StatusUpdate},
  store::BubbleStore,
  user::{NewUser, TemporaryConnection, User, UserQuery},
};
use chrono::{NaiveDate, Utc};
use rusqlite::{Connection, OptionalExtension as _, TransactionBehavior};
use uuid::Uuid;

use crate::{
  encode::{
    RawUser, decode_date, decode_status, decode_uuid, encode_date, encode_dt,
    encode_pair, encode_status, encode_uuid,
  },
  schema::SCHEMA,
  Error, Result,
};

type CoreError = bubble_core::Error;

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Bubble store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection and window policy are
/// reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn:   tokio_rusqlite::Connection,
  window: Arc<dyn WindowPolicy>,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    Self::init(conn).await
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    Self::init(conn).await
  }

  /// Replace the temporary-connection window (default: 14 days anchored to
  /// the latest recorded date).
  pub fn with_window(mut self, window: impl WindowPolicy + 'static) -> Self {
    self.window = Arc::new(window);
    self
  }

  #[cfg(test)]
  pub(crate) fn connection(&self) -> &tokio_rusqlite::Connection { &self.conn }

  async fn init(conn: tokio_rusqlite::Connection) -> Result<Self> {
    conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(Self { conn, window: Arc::new(LatestRecordedWindow::default()) })
  }
}

// ─── Row helpers ─────────────────────────────────────────────────────────────
//
// These run inside `tokio_rusqlite` closures and take a plain `&Connection`,
// so they work equally on a `Transaction` through deref.

fn is_unique_violation(err: &rusqlite::Error) -> bool {
  matches!(
    err,
    rusqlite::Error::SqliteFailure(e, _)
      if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
        || e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
  )
}

/// Fail with `NotFound` unless `id` exists; returns the encoded id.
fn require_user(conn: &Connection, id: Uuid) -> Result<String> {
  let id_str = encode_uuid(id);
  let exists = conn
    .query_row(
      "SELECT 1 FROM users WHERE user_id = ?1",
      rusqlite::params![id_str],
      |_| Ok(()),
    )
    .optional()?
    .is_some();

  if !exists {
    return Err(CoreError::NotFound(id).into());
  }
  Ok(id_str)
}

/// First-degree neighbours of `id`, in the order the edges were created.
fn neighbour_ids(conn: &Connection, id: &str) -> Result<Vec<String>> {
  let mut stmt = conn.prepare_cached(
    "SELECT high_id AS peer, rowid AS seq FROM first_connections WHERE low_id = ?1
     UNION ALL
     SELECT low_id, rowid FROM first_connections WHERE high_id = ?1
     ORDER BY seq",
  )?;
  let rows = stmt
    .query_map(rusqlite::params![id], |row| row.get(0))?
    .collect::<rusqlite::Result<Vec<String>>>()?;
  Ok(rows)
}

/// `(peer_id, date)` rows of `id`'s ledger, in insertion order.
fn ledger_rows(conn: &Connection, id: &str) -> Result<Vec<(String, String)>> {
  let mut stmt = conn.prepare_cached(
    "SELECT peer_id, date FROM temporary_connections
     WHERE user_id = ?1
     ORDER BY seq",
  )?;
  let rows = stmt
    .query_map(rusqlite::params![id], |row| Ok((row.get(0)?, row.get(1)?)))?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  Ok(rows)
}

fn load_ledger(conn: &Connection, id: &str) -> Result<Vec<TemporaryConnection>> {
  ledger_rows(conn, id)?
    .iter()
    .map(|(peer, date)| -> Result<TemporaryConnection> {
      Ok(TemporaryConnection {
        peer_id: decode_uuid(peer)?,
        date:    decode_date(date)?,
      })
    })
    .collect()
}

fn load_user(conn: &Connection, id: &str) -> Result<Option<User>> {
  let raw: Option<RawUser> = conn
    .query_row(
      "SELECT user_id, given_name, family_name, email, created_at, status
       FROM users WHERE user_id = ?1",
      rusqlite::params![id],
      |row| {
        Ok(RawUser {
          user_id:               row.get(0)?,
          given_name:            row.get(1)?,
          family_name:           row.get(2)?,
          email:                 row.get(3)?,
          created_at:            row.get(4)?,
          status:                row.get(5)?,
          first_connections:     Vec::new(),
          temporary_connections: Vec::new(),
        })
      },
    )
    .optional()?;

  let Some(mut raw) = raw else { return Ok(None) };
  raw.first_connections = neighbour_ids(conn, id)?;
  raw.temporary_connections = ledger_rows(conn, id)?;
  raw.into_user().map(Some)
}

fn fetch_user(conn: &Connection, id: Uuid) -> Result<User> {
  load_user(conn, &encode_uuid(id))?.ok_or_else(|| CoreError::NotFound(id).into())
}

// ─── Operations ──────────────────────────────────────────────────────────────

fn insert_user(conn: &Connection, user: &User) -> Result<()> {
  let res = conn.execute(
    "INSERT INTO users (user_id, given_name, family_name, email, created_at, status)
     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
    rusqlite::params![
      encode_uuid(user.user_id),
      user.given_name,
      user.family_name,
      user.email,
      encode_dt(user.created_at),
      encode_status(user.status),
    ],
  );

  match res {
    Ok(_) => Ok(()),
    Err(e) if is_unique_violation(&e) => {
      Err(CoreError::DuplicateIdentity(user.email.clone()).into())
    }
    Err(e) => Err(e.into()),
  }
}

fn find(conn: &Connection, query: &UserQuery) -> Result<Vec<User>> {
  let user_id = query.user_id.map(encode_uuid);

  let ids: Vec<String> = {
    let mut stmt = conn.prepare_cached(
      "SELECT user_id FROM users
       WHERE (?1 IS NULL OR user_id = ?1)
         AND (?2 IS NULL OR given_name = ?2)
         AND (?3 IS NULL OR family_name = ?3)
         AND (?4 IS NULL OR email = ?4)
       ORDER BY created_at, rowid",
    )?;
    stmt
      .query_map(
        rusqlite::params![
          user_id,
          query.given_name,
          query.family_name,
          query.email,
        ],
        |row| row.get(0),
      )?
      .collect::<rusqlite::Result<Vec<_>>>()?
  };

  ids
    .iter()
    .map(|id| load_user(conn, id))
    .filter_map(Result::transpose)
    .collect()
}

fn connect(conn: &mut Connection, a: Uuid, b: Uuid, at: &str) -> Result<(User, User)> {
  let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
  require_user(&tx, a)?;
  require_user(&tx, b)?;

  let (low, high) = encode_pair(a, b);
  match tx.execute(
    "INSERT INTO first_connections (low_id, high_id, created_at) VALUES (?1, ?2, ?3)",
    rusqlite::params![low, high, at],
  ) {
    Ok(_) => {}
    Err(e) if is_unique_violation(&e) => {
      return Err(CoreError::AlreadyConnected(a, b).into());
    }
    Err(e) => return Err(e.into()),
  }

  let pair = (fetch_user(&tx, a)?, fetch_user(&tx, b)?);
  tx.commit()?;
  Ok(pair)
}

fn closure_of(conn: &mut Connection, id: Uuid) -> Result<Connections> {
  let tx = conn.transaction()?;
  require_user(&tx, id)?;

  let connections = graph::closure(id, |n| -> Result<Vec<Uuid>> {
    neighbour_ids(&tx, &encode_uuid(n))?
      .iter()
      .map(|s| decode_uuid(s))
      .collect()
  })?;

  tx.commit()?;
  Ok(connections)
}

fn record_contact(
  conn: &mut Connection,
  window: &dyn WindowPolicy,
  a: Uuid,
  b: Uuid,
  date: NaiveDate,
) -> Result<(User, User)> {
  let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
  let a_str = require_user(&tx, a)?;
  let b_str = require_user(&tx, b)?;

  ledger::check_admission(window, &load_ledger(&tx, &a_str)?, b, date)?;
  ledger::check_admission(window, &load_ledger(&tx, &b_str)?, a, date)?;

  let date_str = encode_date(date);
  for (user, peer) in [(&a_str, &b_str), (&b_str, &a_str)] {
    match tx.execute(
      "INSERT INTO temporary_connections (user_id, peer_id, date) VALUES (?1, ?2, ?3)",
      rusqlite::params![user, peer, date_str],
    ) {
      Ok(_) => {}
      Err(e) if is_unique_violation(&e) => {
        return Err(CoreError::DuplicateContact { peer: b, date }.into());
      }
      Err(e) => return Err(e.into()),
    }
  }

  let pair = (fetch_user(&tx, a)?, fetch_user(&tx, b)?);
  tx.commit()?;
  Ok(pair)
}

fn current_contacts(
  conn: &Connection,
  window: &dyn WindowPolicy,
  id: Uuid,
) -> Result<Vec<TemporaryConnection>> {
  let id_str = require_user(conn, id)?;
  Ok(ledger::prune(window, &load_ledger(conn, &id_str)?))
}

fn update_status(conn: &Connection, id: Uuid, status: Status) -> Result<()> {
  let changed = conn.execute(
    "UPDATE users SET status = ?1 WHERE user_id = ?2",
    rusqlite::params![encode_status(status), encode_uuid(id)],
  )?;
  if changed == 0 {
    return Err(CoreError::NotFound(id).into());
  }
  Ok(())
}

fn poll(conn: &mut Connection, id: Uuid) -> Result<StatusPoll> {
  let tx = conn.transaction()?;
  let id_str = encode_uuid(id);

  let stored: Option<i64> = tx
    .query_row(
      "SELECT status FROM users WHERE user_id = ?1",
      rusqlite::params![id_str],
      |row| row.get(0),
    )
    .optional()?;
  let stored = decode_status(stored.ok_or(CoreError::NotFound(id))?)?;

  let codes: Vec<i64> = {
    let mut stmt = tx.prepare_cached(
      "SELECT u.status
       FROM users u
       JOIN (
         SELECT high_id AS peer FROM first_connections WHERE low_id = ?1
         UNION ALL
         SELECT low_id FROM first_connections WHERE high_id = ?1
       ) n ON n.peer = u.user_id",
    )?;
    stmt
      .query_map(rusqlite::params![id_str], |row| row.get(0))?
      .collect::<rusqlite::Result<Vec<_>>>()?
  };
  let neighbours = codes
    .into_iter()
    .map(decode_status)
    .collect::<Result<Vec<_>>>()?;

  tx.commit()?;
  Ok(status::derive_poll(id, stored, neighbours))
}

// ─── BubbleStore impl ────────────────────────────────────────────────────────

impl BubbleStore for SqliteStore {
  type Error = Error;

  // ── Directory ─────────────────────────────────────────────────────────────

  async fn create_user(&self, input: NewUser) -> Result<User> {
    let user = User {
      user_id:               Uuid::new_v4(),
      given_name:            input.given_name,
      family_name:           input.family_name,
      email:                 input.email,
      created_at:            Utc::now(),
      first_connections:     Vec::new(),
      temporary_connections: Vec::new(),
      status:                Status::default(),
    };

    let row = user.clone();
    self
      .conn
      .call(move |conn| insert_user(conn, &row).map_err(Error::into_call))
      .await?;

    tracing::info!(user_id = %user.user_id, "created user");
    Ok(user)
  }

  async fn get_user(&self, id: Uuid) -> Result<Option<User>> {
    let id_str = encode_uuid(id);
    Ok(
      self
        .conn
        .call(move |conn| load_user(conn, &id_str).map_err(Error::into_call))
        .await?,
    )
  }

  async fn find_users(&self, query: &UserQuery) -> Result<Vec<User>> {
    let query = query.clone();
    let users = self
      .conn
      .call(move |conn| find(conn, &query).map_err(Error::into_call))
      .await?;

    tracing::debug!(matches = users.len(), "user query");
    Ok(users)
  }

  // ── Connection graph ──────────────────────────────────────────────────────

  async fn add_first_connection(&self, a: Uuid, b: Uuid) -> Result<(User, User)> {
    if a == b {
      return Err(CoreError::SelfConnection(a).into());
    }

    let at_str = encode_dt(Utc::now());
    let pair = self
      .conn
      .call(move |conn| connect(conn, a, b, &at_str).map_err(Error::into_call))
      .await?;

    tracing::info!(%a, %b, "first connection added");
    Ok(pair)
  }

  async fn get_connections(&self, id: Uuid) -> Result<Connections> {
    Ok(
      self
        .conn
        .call(move |conn| closure_of(conn, id).map_err(Error::into_call))
        .await?,
    )
  }

  // ── Exposure ledger ───────────────────────────────────────────────────────

  async fn add_temporary_connection(
    &self,
    a:    Uuid,
    b:    Uuid,
    date: NaiveDate,
  ) -> Result<(User, User)> {
    if a == b {
      return Err(CoreError::SelfConnection(a).into());
    }

    let window = Arc::clone(&self.window);
    let pair = self
      .conn
      .call(move |conn| {
        record_contact(conn, window.as_ref(), a, b, date).map_err(Error::into_call)
      })
      .await?;

    tracing::info!(%a, %b, %date, "temporary connection recorded");
    Ok(pair)
  }

  async fn get_temporary_connections(
    &self,
    id: Uuid,
  ) -> Result<Vec<TemporaryConnection>> {
    let window = Arc::clone(&self.window);
    Ok(
      self
        .conn
        .call(move |conn| {
          current_contacts(conn, window.as_ref(), id).map_err(Error::into_call)
        })
        .await?,
    )
  }

  // ── Status ────────────────────────────────────────────────────────────────

  async fn set_status(&self, id: Uuid, positive: bool) -> Result<StatusUpdate> {
    let status = Status::self_reported(positive);
    self
      .conn
      .call(move |conn| update_status(conn, id, status).map_err(Error::into_call))
      .await?;

    tracing::info!(user_id = %id, code = status.code(), "status self-reported");
    Ok(StatusUpdate { user_id: id, status })
  }

  async fn poll_status(&self, id: Uuid) -> Result<StatusPoll> {
    let polled = self
      .conn
      .call(move |conn| poll(conn, id).map_err(Error::into_call))
      .await?;

    tracing::debug!(user_id = %id, changed = polled.changed, "status polled");
    Ok(polled)
  }
}
