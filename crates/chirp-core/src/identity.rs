//! Identity: a registered account and its two rights counters.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
  content::{Comment, Tweet},
  notification::Notification,
  social::Topic,
};

pub type IdentityId = i64;

// ─── Rights ──────────────────────────────────────────────────────────────────

/// Which consumable right a counter tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RightKind {
  /// The right to post one tweet.
  Tweet,
  /// The right to post one comment.
  Comment,
}

impl fmt::Display for RightKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Tweet => f.write_str("tweet"),
      Self::Comment => f.write_str("comment"),
    }
  }
}

// ─── Identity ────────────────────────────────────────────────────────────────

/// A registered account.
///
/// The credential is an argon2 PHC string. It never leaves the process:
/// serialisation skips it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Identity {
  pub id:             IdentityId,
  pub name:           Option<String>,
  pub email:          String,
  #[serde(skip)]
  pub credential:     String,
  pub tweet_rights:   u32,
  pub comment_rights: u32,
  pub created_at:     DateTime<Utc>,
}

impl Identity {
  /// The current value of the counter for `kind`.
  pub fn rights(&self, kind: RightKind) -> u32 {
    match kind {
      RightKind::Tweet => self.tweet_rights,
      RightKind::Comment => self.comment_rights,
    }
  }

  /// The name shown to other users; falls back to the email address.
  pub fn display_name(&self) -> &str {
    self.name.as_deref().unwrap_or(&self.email)
  }
}

/// Input to [`crate::store::SocialStore::create_identity`].
#[derive(Debug, Clone)]
pub struct NewIdentity {
  pub name:           Option<String>,
  pub email:          String,
  /// Already-derived credential; plaintext passwords never reach the store.
  pub credential:     String,
  pub tweet_rights:   u32,
  pub comment_rights: u32,
}

// ─── Hydrated aggregate ──────────────────────────────────────────────────────

/// A tweet together with the comments left on it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TweetThread {
  pub tweet:    Tweet,
  pub comments: Vec<Comment>,
}

/// Someone the identity follows, with everything they have tweeted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Followee {
  pub identity: Identity,
  pub tweets:   Vec<Tweet>,
}

/// The full read model for one identity, loaded in a single store call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityGraph {
  pub identity:        Identity,
  pub tweets:          Vec<TweetThread>,
  pub selected_topics: Vec<Topic>,
  pub notifications:   Vec<Notification>,
  pub followers:       Vec<Identity>,
  pub following:       Vec<Followee>,
}

impl IdentityGraph {
  pub fn id(&self) -> IdentityId { self.identity.id }
}
