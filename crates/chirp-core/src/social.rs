//! Social edges: follows, topics and topic selections, likes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{content::TweetId, identity::IdentityId};

pub type TopicId = i64;

/// A directed follow relationship. At most one edge exists per ordered pair
/// and the two ends are never the same identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FollowEdge {
  pub follower_id: IdentityId,
  pub followee_id: IdentityId,
  pub created_at:  DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topic {
  pub id:   TopicId,
  pub name: String,
}

/// An identity's declared interest in a topic.
///
/// Nothing prevents the same identity selecting the same topic twice; each
/// call records a new row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicSelection {
  pub id:          i64,
  pub identity_id: IdentityId,
  pub topic_id:    TopicId,
  pub created_at:  DateTime<Utc>,
}

/// One identity liking one tweet; unique per pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Like {
  pub identity_id: IdentityId,
  pub tweet_id:    TweetId,
  pub created_at:  DateTime<Utc>,
}
