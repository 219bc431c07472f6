//! [`SqliteStore`], the SQLite implementation of [`SocialStore`].

use std::{collections::HashMap, path::Path};

use chrono::Utc;
use chirp_core::{
  Error as CoreError,
  content::{Comment, NewComment, NewTweet, Tweet, TweetId},
  identity::{
    Followee, Identity, IdentityGraph, IdentityId, NewIdentity, RightKind,
    TweetThread,
  },
  notification::{self, Notification},
  social::{FollowEdge, Like, Topic, TopicId, TopicSelection},
  store::SocialStore,
};
use rusqlite::{Connection, OptionalExtension as _, Row, params};

use crate::{
  Result,
  encode::{
    COMMENT_COLUMNS, IDENTITY_COLUMNS, NOTIFICATION_COLUMNS, RawComment,
    RawIdentity, RawNotification, RawSelection, RawTweet, TOPIC_COLUMNS,
    TWEET_COLUMNS, encode_dt, is_unique_violation, rights_column,
    topic_from_row,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Chirp data store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted. All calls
/// are serialised onto one connection thread, and every multi-statement write
/// runs inside a transaction.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── Row helpers (run on the connection thread) ──────────────────────────────

fn identity_exists(conn: &Connection, id: IdentityId) -> rusqlite::Result<bool> {
  Ok(
    conn
      .query_row(
        "SELECT 1 FROM identities WHERE identity_id = ?1",
        params![id],
        |_| Ok(()),
      )
      .optional()?
      .is_some(),
  )
}

fn fetch_identity(
  conn: &Connection,
  id: IdentityId,
) -> rusqlite::Result<Option<RawIdentity>> {
  conn
    .query_row(
      &format!(
        "SELECT {IDENTITY_COLUMNS} FROM identities i WHERE i.identity_id = ?1"
      ),
      params![id],
      RawIdentity::from_row,
    )
    .optional()
}

/// The author of a tweet, or `None` if the tweet does not exist.
fn tweet_author(
  conn: &Connection,
  tweet: TweetId,
) -> rusqlite::Result<Option<IdentityId>> {
  conn
    .query_row(
      "SELECT author_id FROM tweets WHERE tweet_id = ?1",
      params![tweet],
      |r| r.get(0),
    )
    .optional()
}

fn topic_exists(conn: &Connection, topic: TopicId) -> rusqlite::Result<bool> {
  Ok(
    conn
      .query_row(
        "SELECT 1 FROM topics WHERE topic_id = ?1",
        params![topic],
        |_| Ok(()),
      )
      .optional()?
      .is_some(),
  )
}

/// The name other users see for `id`, or `None` if it does not exist.
fn display_name(
  conn: &Connection,
  id: IdentityId,
) -> rusqlite::Result<Option<String>> {
  conn
    .query_row(
      "SELECT COALESCE(name, email) FROM identities WHERE identity_id = ?1",
      params![id],
      |r| r.get(0),
    )
    .optional()
}

/// Decrement the `kind` counter if and only if it is positive.
fn spend_right(
  conn: &Connection,
  id: IdentityId,
  kind: RightKind,
) -> rusqlite::Result<Result<(), CoreError>> {
  let col = rights_column(kind);
  let changed = conn.execute(
    &format!(
      "UPDATE identities SET {col} = {col} - 1
       WHERE identity_id = ?1 AND {col} > 0"
    ),
    params![id],
  )?;
  if changed == 1 {
    return Ok(Ok(()));
  }
  if identity_exists(conn, id)? {
    Ok(Err(CoreError::RightsExhausted(kind)))
  } else {
    Ok(Err(CoreError::IdentityNotFound(id)))
  }
}

fn insert_notification(
  conn: &Connection,
  identity: IdentityId,
  message: &str,
  at: &str,
) -> rusqlite::Result<i64> {
  conn.execute(
    "INSERT INTO notifications (identity_id, message, created_at)
     VALUES (?1, ?2, ?3)",
    params![identity, message, at],
  )?;
  Ok(conn.last_insert_rowid())
}

fn collect_by_id<T>(
  conn: &Connection,
  sql: &str,
  id: i64,
  map: fn(&Row<'_>) -> rusqlite::Result<T>,
) -> rusqlite::Result<Vec<T>> {
  let mut stmt = conn.prepare(sql)?;
  let rows = stmt
    .query_map(params![id], map)?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  Ok(rows)
}

/// Everything [`SocialStore::load_identity_graph`] reads, before decoding.
struct RawGraph {
  identity:         RawIdentity,
  tweets:           Vec<RawTweet>,
  comments:         Vec<RawComment>,
  topics:           Vec<Topic>,
  notifications:    Vec<RawNotification>,
  followers:        Vec<RawIdentity>,
  following:        Vec<RawIdentity>,
  following_tweets: Vec<RawTweet>,
}

impl RawGraph {
  fn load(conn: &Connection, id: IdentityId) -> rusqlite::Result<Option<Self>> {
    let Some(identity) = fetch_identity(conn, id)? else {
      return Ok(None);
    };

    let tweets = collect_by_id(
      conn,
      &format!(
        "SELECT {TWEET_COLUMNS} FROM tweets t
         WHERE t.author_id = ?1 ORDER BY t.tweet_id"
      ),
      id,
      RawTweet::from_row,
    )?;
    let comments = collect_by_id(
      conn,
      &format!(
        "SELECT {COMMENT_COLUMNS} FROM comments c
         JOIN tweets t ON t.tweet_id = c.tweet_id
         WHERE t.author_id = ?1 ORDER BY c.comment_id"
      ),
      id,
      RawComment::from_row,
    )?;
    let topics = collect_by_id(
      conn,
      &format!(
        "SELECT {TOPIC_COLUMNS} FROM topic_selections s
         JOIN topics tp ON tp.topic_id = s.topic_id
         WHERE s.identity_id = ?1 ORDER BY s.selection_id"
      ),
      id,
      topic_from_row,
    )?;
    let notifications = collect_by_id(
      conn,
      &format!(
        "SELECT {NOTIFICATION_COLUMNS} FROM notifications n
         WHERE n.identity_id = ?1 ORDER BY n.notification_id DESC"
      ),
      id,
      RawNotification::from_row,
    )?;
    let followers = collect_by_id(
      conn,
      &format!(
        "SELECT {IDENTITY_COLUMNS} FROM follows f
         JOIN identities i ON i.identity_id = f.follower_id
         WHERE f.followee_id = ?1 ORDER BY i.identity_id"
      ),
      id,
      RawIdentity::from_row,
    )?;
    let following = collect_by_id(
      conn,
      &format!(
        "SELECT {IDENTITY_COLUMNS} FROM follows f
         JOIN identities i ON i.identity_id = f.followee_id
         WHERE f.follower_id = ?1 ORDER BY i.identity_id"
      ),
      id,
      RawIdentity::from_row,
    )?;
    let following_tweets = collect_by_id(
      conn,
      &format!(
        "SELECT {TWEET_COLUMNS} FROM follows f
         JOIN tweets t ON t.author_id = f.followee_id
         WHERE f.follower_id = ?1 ORDER BY t.tweet_id"
      ),
      id,
      RawTweet::from_row,
    )?;

    Ok(Some(Self {
      identity,
      tweets,
      comments,
      topics,
      notifications,
      followers,
      following,
      following_tweets,
    }))
  }

  fn into_graph(self) -> Result<IdentityGraph> {
    let mut comments_by_tweet: HashMap<TweetId, Vec<Comment>> = HashMap::new();
    for raw in self.comments {
      let comment = raw.into_comment()?;
      comments_by_tweet.entry(comment.tweet_id).or_default().push(comment);
    }

    let tweets = self
      .tweets
      .into_iter()
      .map(|raw| {
        let tweet = raw.into_tweet()?;
        let comments = comments_by_tweet.remove(&tweet.id).unwrap_or_default();
        Ok::<_, crate::Error>(TweetThread { tweet, comments })
      })
      .collect::<Result<Vec<_>>>()?;

    let mut tweets_by_author: HashMap<IdentityId, Vec<Tweet>> = HashMap::new();
    for raw in self.following_tweets {
      let tweet = raw.into_tweet()?;
      tweets_by_author.entry(tweet.author_id).or_default().push(tweet);
    }

    let following = self
      .following
      .into_iter()
      .map(|raw| {
        let identity = raw.into_identity()?;
        let tweets = tweets_by_author.remove(&identity.id).unwrap_or_default();
        Ok::<_, crate::Error>(Followee { identity, tweets })
      })
      .collect::<Result<Vec<_>>>()?;

    Ok(IdentityGraph {
      identity: self.identity.into_identity()?,
      tweets,
      selected_topics: self.topics,
      notifications: self
        .notifications
        .into_iter()
        .map(RawNotification::into_notification)
        .collect::<Result<_>>()?,
      followers: self
        .followers
        .into_iter()
        .map(RawIdentity::into_identity)
        .collect::<Result<_>>()?,
      following,
    })
  }
}

// ─── SocialStore impl ────────────────────────────────────────────────────────

impl SocialStore for SqliteStore {
  type Error = crate::Error;

  // ── Identities ────────────────────────────────────────────────────────────

  async fn create_identity(&self, input: NewIdentity) -> Result<Identity> {
    let created_at = Utc::now();
    let at_str = encode_dt(created_at);
    let NewIdentity { name, email, credential, tweet_rights, comment_rights } =
      input;

    let (name_c, email_c, credential_c) =
      (name.clone(), email.clone(), credential.clone());
    let id = self
      .conn
      .call(move |conn| {
        let inserted = conn.execute(
          "INSERT INTO identities
             (name, email, credential, tweet_rights, comment_rights, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          params![name_c, email_c, credential_c, tweet_rights, comment_rights, at_str],
        );
        match inserted {
          Ok(_) => Ok(Ok(conn.last_insert_rowid())),
          Err(e) if is_unique_violation(&e) => {
            Ok(Err(CoreError::EmailTaken(email_c)))
          }
          Err(e) => Err(e.into()),
        }
      })
      .await??;

    Ok(Identity {
      id,
      name,
      email,
      credential,
      tweet_rights,
      comment_rights,
      created_at,
    })
  }

  async fn get_identity(&self, id: IdentityId) -> Result<Option<Identity>> {
    let raw = self
      .conn
      .call(move |conn| Ok(fetch_identity(conn, id)?))
      .await?;
    raw.map(RawIdentity::into_identity).transpose()
  }

  async fn identity_by_email(&self, email: &str) -> Result<Option<Identity>> {
    let email = email.to_owned();
    let raw = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {IDENTITY_COLUMNS} FROM identities i WHERE i.email = ?1"
              ),
              params![email],
              RawIdentity::from_row,
            )
            .optional()?,
        )
      })
      .await?;
    raw.map(RawIdentity::into_identity).transpose()
  }

  async fn list_identities(&self) -> Result<Vec<Identity>> {
    let raws: Vec<RawIdentity> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {IDENTITY_COLUMNS} FROM identities i ORDER BY i.identity_id"
        ))?;
        let rows = stmt
          .query_map([], RawIdentity::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    raws.into_iter().map(RawIdentity::into_identity).collect()
  }

  async fn load_identity_graph(
    &self,
    id: IdentityId,
  ) -> Result<Option<IdentityGraph>> {
    let raw = self
      .conn
      .call(move |conn| {
        // One read transaction so the aggregate is a consistent snapshot.
        let tx = conn.transaction()?;
        let graph = RawGraph::load(&tx, id)?;
        tx.commit()?;
        Ok(graph)
      })
      .await?;
    raw.map(RawGraph::into_graph).transpose()
  }

  async fn rename_identity(
    &self,
    id: IdentityId,
    name: Option<String>,
  ) -> Result<Identity> {
    let raw = self
      .conn
      .call(move |conn| {
        let changed = conn.execute(
          "UPDATE identities SET name = ?2 WHERE identity_id = ?1",
          params![id, name],
        )?;
        if changed == 0 {
          return Ok(Err(CoreError::IdentityNotFound(id)));
        }
        Ok(fetch_identity(conn, id)?.ok_or(CoreError::IdentityNotFound(id)))
      })
      .await??;
    raw.into_identity()
  }

  // ── Rights ────────────────────────────────────────────────────────────────

  async fn grant_right(
    &self,
    id: IdentityId,
    kind: RightKind,
    message: String,
  ) -> Result<Notification> {
    let created_at = Utc::now();
    let at_str = encode_dt(created_at);
    let col = rights_column(kind);

    let message_c = message.clone();
    let notification_id = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let changed = tx.execute(
          &format!(
            "UPDATE identities SET {col} = {col} + 1 WHERE identity_id = ?1"
          ),
          params![id],
        )?;
        if changed == 0 {
          return Ok(Err(CoreError::IdentityNotFound(id)));
        }
        let notification_id = insert_notification(&tx, id, &message_c, &at_str)?;
        tx.commit()?;
        Ok(Ok(notification_id))
      })
      .await??;

    Ok(Notification { id: notification_id, identity_id: id, message, created_at })
  }

  async fn consume_right(&self, id: IdentityId, kind: RightKind) -> Result<()> {
    self
      .conn
      .call(move |conn| Ok(spend_right(conn, id, kind)?))
      .await??;
    Ok(())
  }

  // ── Content ───────────────────────────────────────────────────────────────

  async fn post_tweet(&self, input: NewTweet) -> Result<Tweet> {
    let created_at = Utc::now();
    let at_str = encode_dt(created_at);
    let NewTweet { author_id, topic_id, body } = input;

    let body_c = body.clone();
    let id = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        if let Some(topic) = topic_id
          && !topic_exists(&tx, topic)?
        {
          return Ok(Err(CoreError::TopicNotFound(topic)));
        }
        if let Err(e) = spend_right(&tx, author_id, RightKind::Tweet)? {
          return Ok(Err(e));
        }
        tx.execute(
          "INSERT INTO tweets (author_id, topic_id, body, created_at)
           VALUES (?1, ?2, ?3, ?4)",
          params![author_id, topic_id, body_c, at_str],
        )?;
        let id = tx.last_insert_rowid();
        tx.commit()?;
        Ok(Ok(id))
      })
      .await??;

    Ok(Tweet { id, author_id, topic_id, body, created_at })
  }

  async fn post_comment(&self, input: NewComment) -> Result<Comment> {
    let created_at = Utc::now();
    let at_str = encode_dt(created_at);
    let NewComment { tweet_id, author_id, body } = input;

    let body_c = body.clone();
    let id = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let Some(tweet_author) = tweet_author(&tx, tweet_id)? else {
          return Ok(Err(CoreError::TweetNotFound(tweet_id)));
        };
        if tweet_author == author_id {
          return Ok(Err(CoreError::SelfComment));
        }
        if let Err(e) = spend_right(&tx, author_id, RightKind::Comment)? {
          return Ok(Err(e));
        }
        tx.execute(
          "INSERT INTO comments (tweet_id, author_id, body, created_at)
           VALUES (?1, ?2, ?3, ?4)",
          params![tweet_id, author_id, body_c, at_str],
        )?;
        let id = tx.last_insert_rowid();
        let commenter = display_name(&tx, author_id)?.unwrap_or_default();
        insert_notification(
          &tx,
          tweet_author,
          &notification::commented_message(&commenter),
          &at_str,
        )?;
        tx.commit()?;
        Ok(Ok(id))
      })
      .await??;

    Ok(Comment { id, tweet_id, author_id, body, created_at })
  }

  async fn tweets_by_topics(&self, topics: &[TopicId]) -> Result<Vec<Tweet>> {
    if topics.is_empty() {
      return Ok(Vec::new());
    }
    let topics = topics.to_vec();

    let raws: Vec<RawTweet> = self
      .conn
      .call(move |conn| {
        let placeholders = (1..=topics.len())
          .map(|i| format!("?{i}"))
          .collect::<Vec<_>>()
          .join(", ");
        let mut stmt = conn.prepare(&format!(
          "SELECT {TWEET_COLUMNS} FROM tweets t
           WHERE t.topic_id IN ({placeholders}) ORDER BY t.tweet_id"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(topics.iter()), RawTweet::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawTweet::into_tweet).collect()
  }

  // ── Social graph ──────────────────────────────────────────────────────────

  async fn follow(
    &self,
    follower: IdentityId,
    followee: IdentityId,
  ) -> Result<FollowEdge> {
    if follower == followee {
      return Err(CoreError::SelfFollow.into());
    }

    let created_at = Utc::now();
    let at_str = encode_dt(created_at);

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let Some(follower_name) = display_name(&tx, follower)? else {
          return Ok(Err(CoreError::IdentityNotFound(follower)));
        };
        if !identity_exists(&tx, followee)? {
          return Ok(Err(CoreError::IdentityNotFound(followee)));
        }
        let inserted = tx.execute(
          "INSERT INTO follows (follower_id, followee_id, created_at)
           VALUES (?1, ?2, ?3)",
          params![follower, followee, at_str],
        );
        match inserted {
          Ok(_) => {}
          Err(e) if is_unique_violation(&e) => {
            return Ok(Err(CoreError::AlreadyFollowing { follower, followee }));
          }
          Err(e) => return Err(e.into()),
        }
        insert_notification(
          &tx,
          followee,
          &notification::followed_message(&follower_name),
          &at_str,
        )?;
        tx.commit()?;
        Ok(Ok(()))
      })
      .await??;

    Ok(FollowEdge { follower_id: follower, followee_id: followee, created_at })
  }

  async fn unfollow(
    &self,
    follower: IdentityId,
    followee: IdentityId,
  ) -> Result<bool> {
    let removed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM follows WHERE follower_id = ?1 AND followee_id = ?2",
          params![follower, followee],
        )?)
      })
      .await?;
    Ok(removed > 0)
  }

  async fn like_tweet(
    &self,
    identity: IdentityId,
    tweet: TweetId,
  ) -> Result<Like> {
    let created_at = Utc::now();
    let at_str = encode_dt(created_at);

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let Some(author) = tweet_author(&tx, tweet)? else {
          return Ok(Err(CoreError::TweetNotFound(tweet)));
        };
        let Some(liker) = display_name(&tx, identity)? else {
          return Ok(Err(CoreError::IdentityNotFound(identity)));
        };
        let inserted = tx.execute(
          "INSERT INTO likes (identity_id, tweet_id, created_at)
           VALUES (?1, ?2, ?3)",
          params![identity, tweet, at_str],
        );
        match inserted {
          Ok(_) => {}
          Err(e) if is_unique_violation(&e) => {
            return Ok(Err(CoreError::AlreadyLiked(tweet)));
          }
          Err(e) => return Err(e.into()),
        }
        if author != identity {
          insert_notification(
            &tx,
            author,
            &notification::liked_message(&liker),
            &at_str,
          )?;
        }
        tx.commit()?;
        Ok(Ok(()))
      })
      .await??;

    Ok(Like { identity_id: identity, tweet_id: tweet, created_at })
  }

  // ── Topics ────────────────────────────────────────────────────────────────

  async fn create_topic(&self, name: String) -> Result<Topic> {
    let name_c = name.clone();
    let id = self
      .conn
      .call(move |conn| {
        match conn.execute("INSERT INTO topics (name) VALUES (?1)", params![name_c]) {
          Ok(_) => Ok(Ok(conn.last_insert_rowid())),
          Err(e) if is_unique_violation(&e) => {
            Ok(Err(CoreError::TopicExists(name_c)))
          }
          Err(e) => Err(e.into()),
        }
      })
      .await??;
    Ok(Topic { id, name })
  }

  async fn list_topics(&self) -> Result<Vec<Topic>> {
    let topics = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {TOPIC_COLUMNS} FROM topics tp ORDER BY tp.name"
        ))?;
        let rows = stmt
          .query_map([], topic_from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(topics)
  }

  async fn select_topic(
    &self,
    identity: IdentityId,
    topic: TopicId,
  ) -> Result<TopicSelection> {
    let at_str = encode_dt(Utc::now());

    let raw = self
      .conn
      .call(move |conn| {
        if !topic_exists(conn, topic)? {
          return Ok(Err(CoreError::TopicNotFound(topic)));
        }
        if !identity_exists(conn, identity)? {
          return Ok(Err(CoreError::IdentityNotFound(identity)));
        }
        conn.execute(
          "INSERT INTO topic_selections (identity_id, topic_id, created_at)
           VALUES (?1, ?2, ?3)",
          params![identity, topic, at_str],
        )?;
        Ok(Ok(RawSelection {
          id: conn.last_insert_rowid(),
          identity_id: identity,
          topic_id: topic,
          created_at: at_str,
        }))
      })
      .await??;

    raw.into_selection()
  }

  // ── Notifications ─────────────────────────────────────────────────────────

  async fn list_notifications(
    &self,
    identity: IdentityId,
  ) -> Result<Vec<Notification>> {
    let raws = self
      .conn
      .call(move |conn| {
        Ok(collect_by_id(
          conn,
          &format!(
            "SELECT {NOTIFICATION_COLUMNS} FROM notifications n
             WHERE n.identity_id = ?1 ORDER BY n.notification_id DESC"
          ),
          identity,
          RawNotification::from_row,
        )?)
      })
      .await?;
    raws.into_iter().map(RawNotification::into_notification).collect()
  }
}
