//! Error type for `bubble-store-sqlite`.

use bubble_core::store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] bubble_core::Error),

  #[error("database error: {0}")]
  Database(tokio_rusqlite::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// A stored value that no domain type accepts.
  #[error("invalid column value: {0}")]
  InvalidColumn(String),
}

impl Error {
  /// Carry this error out of a `tokio_rusqlite` closure.
  ///
  /// The inverse conversion is the `From<tokio_rusqlite::Error>` impl below.
  pub(crate) fn into_call(self) -> tokio_rusqlite::Error {
    match self {
      Error::Database(e) => e,
      other => tokio_rusqlite::Error::Other(Box::new(other)),
    }
  }
}

impl From<tokio_rusqlite::Error> for Error {
  fn from(e: tokio_rusqlite::Error) -> Self {
    let boxed = match e {
      tokio_rusqlite::Error::Other(boxed) => boxed,
      other => return Error::Database(other),
    };
    match boxed.downcast::<Error>() {
      Ok(ours) => *ours,
      Err(boxed) => match boxed.downcast::<bubble_core::Error>() {
        Ok(core) => Error::Core(*core),
        Err(boxed) => Error::Database(tokio_rusqlite::Error::Other(boxed)),
      },
    }
  }
}

impl From<rusqlite::Error> for Error {
  fn from(e: rusqlite::Error) -> Self {
    Error::Database(tokio_rusqlite::Error::Rusqlite(e))
  }
}

impl StoreError for Error {
  fn domain(&self) -> Option<&bubble_core::Error> {
    match self {
      Error::Core(e) => Some(e),
      _ => None,
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
