//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! All timestamps are stored as RFC 3339 strings. Ids are SQLite integer
//! row ids. Each `Raw*` struct is a row exactly as read, before timestamps are
//! parsed; the `*_COLUMNS` constants list the columns its `from_row` expects,
//! in order, using the table alias shown.

use chrono::{DateTime, Utc};
use chirp_core::{
  content::{Comment, Tweet},
  identity::{Identity, RightKind},
  notification::Notification,
  social::{Topic, TopicSelection},
};
use rusqlite::Row;

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── RightKind ───────────────────────────────────────────────────────────────

/// The `identities` column holding the counter for `kind`.
pub fn rights_column(kind: RightKind) -> &'static str {
  match kind {
    RightKind::Tweet => "tweet_rights",
    RightKind::Comment => "comment_rights",
  }
}

// ─── Constraint errors ───────────────────────────────────────────────────────

/// True if `e` is a UNIQUE or PRIMARY KEY violation.
pub fn is_unique_violation(e: &rusqlite::Error) -> bool {
  match e {
    rusqlite::Error::SqliteFailure(f, _) => matches!(
      f.extended_code,
      rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
        | rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
    ),
    _ => false,
  }
}

// ─── Identity ────────────────────────────────────────────────────────────────

pub const IDENTITY_COLUMNS: &str = "i.identity_id, i.name, i.email, \
  i.credential, i.tweet_rights, i.comment_rights, i.created_at";

pub struct RawIdentity {
  pub id:             i64,
  pub name:           Option<String>,
  pub email:          String,
  pub credential:     String,
  pub tweet_rights:   u32,
  pub comment_rights: u32,
  pub created_at:     String,
}

impl RawIdentity {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:             row.get(0)?,
      name:           row.get(1)?,
      email:          row.get(2)?,
      credential:     row.get(3)?,
      tweet_rights:   row.get(4)?,
      comment_rights: row.get(5)?,
      created_at:     row.get(6)?,
    })
  }

  pub fn into_identity(self) -> Result<Identity> {
    Ok(Identity {
      id:             self.id,
      name:           self.name,
      email:          self.email,
      credential:     self.credential,
      tweet_rights:   self.tweet_rights,
      comment_rights: self.comment_rights,
      created_at:     decode_dt(&self.created_at)?,
    })
  }
}

// ─── Tweet ───────────────────────────────────────────────────────────────────

pub const TWEET_COLUMNS: &str =
  "t.tweet_id, t.author_id, t.topic_id, t.body, t.created_at";

pub struct RawTweet {
  pub id:         i64,
  pub author_id:  i64,
  pub topic_id:   Option<i64>,
  pub body:       String,
  pub created_at: String,
}

impl RawTweet {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:         row.get(0)?,
      author_id:  row.get(1)?,
      topic_id:   row.get(2)?,
      body:       row.get(3)?,
      created_at: row.get(4)?,
    })
  }

  pub fn into_tweet(self) -> Result<Tweet> {
    Ok(Tweet {
      id:         self.id,
      author_id:  self.author_id,
      topic_id:   self.topic_id,
      body:       self.body,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

// ─── Comment ─────────────────────────────────────────────────────────────────

pub const COMMENT_COLUMNS: &str =
  "c.comment_id, c.tweet_id, c.author_id, c.body, c.created_at";

pub struct RawComment {
  pub id:         i64,
  pub tweet_id:   i64,
  pub author_id:  i64,
  pub body:       String,
  pub created_at: String,
}

impl RawComment {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:         row.get(0)?,
      tweet_id:   row.get(1)?,
      author_id:  row.get(2)?,
      body:       row.get(3)?,
      created_at: row.get(4)?,
    })
  }

  pub fn into_comment(self) -> Result<Comment> {
    Ok(Comment {
      id:         self.id,
      tweet_id:   self.tweet_id,
      author_id:  self.author_id,
      body:       self.body,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

// ─── Notification ────────────────────────────────────────────────────────────

pub const NOTIFICATION_COLUMNS: &str =
  "n.notification_id, n.identity_id, n.message, n.created_at";

pub struct RawNotification {
  pub id:          i64,
  pub identity_id: i64,
  pub message:     String,
  pub created_at:  String,
}

impl RawNotification {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:          row.get(0)?,
      identity_id: row.get(1)?,
      message:     row.get(2)?,
      created_at:  row.get(3)?,
    })
  }

  pub fn into_notification(self) -> Result<Notification> {
    Ok(Notification {
      id:          self.id,
      identity_id: self.identity_id,
      message:     self.message,
      created_at:  decode_dt(&self.created_at)?,
    })
  }
}

// ─── Topic ───────────────────────────────────────────────────────────────────

pub const TOPIC_COLUMNS: &str = "tp.topic_id, tp.name";

pub fn topic_from_row(row: &Row<'_>) -> rusqlite::Result<Topic> {
  Ok(Topic { id: row.get(0)?, name: row.get(1)? })
}

// ─── TopicSelection ──────────────────────────────────────────────────────────

pub struct RawSelection {
  pub id:          i64,
  pub identity_id: i64,
  pub topic_id:    i64,
  pub created_at:  String,
}

impl RawSelection {
  pub fn into_selection(self) -> Result<TopicSelection> {
    Ok(TopicSelection {
      id:          self.id,
      identity_id: self.identity_id,
      topic_id:    self.topic_id,
      created_at:  decode_dt(&self.created_at)?,
    })
  }
}
