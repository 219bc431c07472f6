//! Error type for `chirp-auth`.
//!
//! Verification failures never appear here: a bad password or a bad token is
//! an ordinary `false` / `None`. These errors are the system's own faults.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("token secret must not be empty")]
  EmptySecret,

  #[error("password hashing failed: {0}")]
  Hash(String),

  #[error("token signing failed: {0}")]
  Sign(#[from] jsonwebtoken::errors::Error),

  #[error("blocking task failed: {0}")]
  Join(#[from] tokio::task::JoinError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl From<Error> for chirp_core::Error {
  fn from(e: Error) -> Self { chirp_core::Error::internal(e) }
}
