//! SQL schema for the Bubble SQLite store.
//!
//! Executed once at connection startup via `PRAGMA user_version`. Future
//! migrations will be gated on that version number.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS users (
    user_id     TEXT PRIMARY KEY,
    given_name  TEXT NOT NULL,
    family_name TEXT NOT NULL,
    email       TEXT NOT NULL UNIQUE,
    created_at  TEXT NOT NULL,     -- ISO 8601 UTC; server-assigned
    status      INTEGER NOT NULL DEFAULT 4   -- Status::code()
);

-- One row per unordered pair; the ordering CHECK makes (a, b) and (b, a)
-- collide on the primary key.
CREATE TABLE IF NOT EXISTS first_connections (
    low_id      TEXT NOT NULL REFERENCES users(user_id),
    high_id     TEXT NOT NULL REFERENCES users(user_id),
    created_at  TEXT NOT NULL,
    PRIMARY KEY (low_id, high_id),
    CHECK (low_id < high_id)
);

-- Each event is stored once per side; seq preserves insertion order.
CREATE TABLE IF NOT EXISTS temporary_connections (
    seq         INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id     TEXT NOT NULL REFERENCES users(user_id),
    peer_id     TEXT NOT NULL REFERENCES users(user_id),
    date        TEXT NOT NULL,     -- YYYY-MM-DD
    UNIQUE (user_id, peer_id, date)
);

CREATE INDEX IF NOT EXISTS users_given_idx        ON users(given_name);
CREATE INDEX IF NOT EXISTS users_family_idx       ON users(family_name);
CREATE INDEX IF NOT EXISTS first_conn_high_idx    ON first_connections(high_id);
CREATE INDEX IF NOT EXISTS temp_conn_user_idx     ON temporary_connections(user_id);

PRAGMA user_version = 1;
";
