//! Notifications: append-only, free-text messages addressed to one identity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::identity::{IdentityId, RightKind};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
  pub id:          i64,
  pub identity_id: IdentityId,
  pub message:     String,
  pub created_at:  DateTime<Utc>,
}

/// Text recorded when an identity is granted a right by the distributor.
pub fn grant_message(kind: RightKind) -> String {
  match kind {
    RightKind::Tweet => "You won a ticket: you can post one more tweet.".into(),
    RightKind::Comment => {
      "You won a ticket: you can post one more comment.".into()
    }
  }
}

/// Text recorded for the followee when someone follows them.
pub fn followed_message(follower: &str) -> String {
  format!("{follower} started following you.")
}

/// Text recorded for a tweet's author when it is liked.
pub fn liked_message(liker: &str) -> String {
  format!("{liker} liked your tweet.")
}

/// Text recorded for a tweet's author when it receives a comment.
pub fn commented_message(commenter: &str) -> String {
  format!("{commenter} commented on your tweet.")
}
