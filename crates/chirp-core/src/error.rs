//! Error types for `chirp-core`.
//!
//! [`Error`] is the closed set of outcomes every layer reports. Each variant
//! belongs to exactly one [`ErrorKind`], which is what the HTTP binding keys
//! its status codes on.

use thiserror::Error;

use crate::identity::{IdentityId, RightKind};

/// The coarse class of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
  /// Malformed or missing input; the caller can fix it.
  Validation,
  /// A referenced identity, tweet or topic does not exist.
  NotFound,
  /// The request collides with existing state.
  Conflict,
  /// The caller is not authenticated.
  Auth,
  /// A rights counter is at zero.
  EntitlementExhausted,
  /// The system itself is unhealthy (store unreachable, timeout, …).
  Internal,
}

#[derive(Debug, Error)]
pub enum Error {
  #[error("invalid input: {0}")]
  Validation(String),

  #[error("identity not found: {0}")]
  IdentityNotFound(IdentityId),

  #[error("tweet not found: {0}")]
  TweetNotFound(i64),

  #[error("topic not found: {0}")]
  TopicNotFound(i64),

  #[error("email {0:?} is already registered")]
  EmailTaken(String),

  #[error("topic {0:?} already exists")]
  TopicExists(String),

  #[error("an identity cannot follow itself")]
  SelfFollow,

  #[error("{follower} does not follow {followee}")]
  NotFollowing {
    follower: IdentityId,
    followee: IdentityId,
  },

  #[error("{follower} already follows {followee}")]
  AlreadyFollowing {
    follower: IdentityId,
    followee: IdentityId,
  },

  #[error("tweet {0} is already liked")]
  AlreadyLiked(i64),

  #[error("cannot comment on your own tweet")]
  SelfComment,

  #[error("unauthenticated")]
  Unauthenticated,

  #[error("no {0} rights left")]
  RightsExhausted(RightKind),

  #[error("operation timed out")]
  Timeout,

  /// A backend or infrastructure fault, unrelated to the caller's input.
  #[error("internal error: {0}")]
  Internal(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  /// Which class this error belongs to.
  pub fn kind(&self) -> ErrorKind {
    match self {
      Self::Validation(_) => ErrorKind::Validation,
      Self::IdentityNotFound(_)
      | Self::TweetNotFound(_)
      | Self::TopicNotFound(_)
      | Self::NotFollowing { .. } => ErrorKind::NotFound,
      Self::EmailTaken(_)
      | Self::TopicExists(_)
      | Self::SelfFollow
      | Self::AlreadyFollowing { .. }
      | Self::AlreadyLiked(_)
      | Self::SelfComment => ErrorKind::Conflict,
      Self::Unauthenticated => ErrorKind::Auth,
      Self::RightsExhausted(_) => ErrorKind::EntitlementExhausted,
      Self::Timeout | Self::Internal(_) => ErrorKind::Internal,
    }
  }

  /// Wrap any backend error as an internal fault.
  pub fn internal(e: impl std::error::Error + Send + Sync + 'static) -> Self {
    Self::Internal(Box::new(e))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
