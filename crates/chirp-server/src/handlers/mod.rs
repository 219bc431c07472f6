pub mod account;
pub mod content;
pub mod feed;
pub mod social;
pub mod topics;

use serde::Serialize;

/// A user paired with a freshly minted session token.
#[derive(Debug, Serialize)]
pub struct Session<T> {
  pub user:  T,
  pub token: String,
}
