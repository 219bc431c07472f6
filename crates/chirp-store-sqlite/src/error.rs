//! Error type for `chirp-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// A domain outcome (not found, conflict, exhausted rights, …).
  #[error(transparent)]
  Core(#[from] chirp_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl From<Error> for chirp_core::Error {
  fn from(e: Error) -> Self {
    match e {
      Error::Core(core) => core,
      other => chirp_core::Error::internal(other),
    }
  }
}
