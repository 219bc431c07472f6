//! Content items: tweets and the comments attached to them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result, identity::IdentityId, social::TopicId};

pub type TweetId = i64;
pub type CommentId = i64;

/// Longest body accepted for a tweet or comment, in characters.
pub const MAX_BODY_CHARS: usize = 280;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tweet {
  pub id:         TweetId,
  pub author_id:  IdentityId,
  pub topic_id:   Option<TopicId>,
  pub body:       String,
  pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
  pub id:         CommentId,
  pub tweet_id:   TweetId,
  pub author_id:  IdentityId,
  pub body:       String,
  pub created_at: DateTime<Utc>,
}

/// Input to [`crate::store::SocialStore::post_tweet`].
#[derive(Debug, Clone)]
pub struct NewTweet {
  pub author_id: IdentityId,
  pub topic_id:  Option<TopicId>,
  pub body:      String,
}

/// Input to [`crate::store::SocialStore::post_comment`].
#[derive(Debug, Clone)]
pub struct NewComment {
  pub tweet_id:  TweetId,
  pub author_id: IdentityId,
  pub body:      String,
}

/// Trim `body` and reject it if it is empty or too long.
pub fn validate_body(body: &str) -> Result<String> {
  let trimmed = body.trim();
  if trimmed.is_empty() {
    return Err(Error::Validation("body must not be empty".into()));
  }
  if trimmed.chars().count() > MAX_BODY_CHARS {
    return Err(Error::Validation(format!(
      "body is longer than {MAX_BODY_CHARS} characters"
    )));
  }
  Ok(trimmed.to_owned())
}
