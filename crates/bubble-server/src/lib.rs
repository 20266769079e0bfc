//! HTTP server wiring for Bubble.
//!
//! Holds the runtime configuration and assembles the API router over a
//! SQLite store. The binary in `main.rs` only parses arguments and binds.

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use axum::Router;
use bubble_core::ledger::{DEFAULT_WINDOW_DAYS, LatestRecordedWindow};
use bubble_store_sqlite::SqliteStore;
use serde::Deserialize;
use tower_http::trace::TraceLayer;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `BUBBLE_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:        String,
  #[serde(default = "default_port")]
  pub port:        u16,
  pub store_path:  PathBuf,
  /// Width of the temporary-connection window, in days.
  #[serde(default = "default_window_days")]
  pub window_days: u64,
}

fn default_host() -> String { "127.0.0.1".to_string() }

fn default_port() -> u16 { 8080 }

fn default_window_days() -> u64 { DEFAULT_WINDOW_DAYS }

impl ServerConfig {
  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }
}

// ─── Assembly ─────────────────────────────────────────────────────────────────

/// Open the store described by `cfg`, applying its window width.
pub async fn open_store(cfg: &ServerConfig) -> bubble_store_sqlite::Result<SqliteStore> {
  let path = expand_tilde(&cfg.store_path);
  let store = SqliteStore::open(&path).await?;
  Ok(store.with_window(LatestRecordedWindow::new(cfg.window_days)))
}

/// The full application: API routes plus request tracing.
pub fn app(store: SqliteStore) -> Router {
  bubble_api::api_router(Arc::new(store)).layer(TraceLayer::new_for_http())
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
