//! The `SocialStore` trait.
//!
//! The trait is implemented by storage backends (e.g. `chirp-store-sqlite`).
//! Higher layers (`chirp-auth`, `chirp-server`) receive a store handle
//! explicitly and depend on this abstraction, not on any concrete backend.

use std::future::Future;

use crate::{
  content::{Comment, NewComment, NewTweet, Tweet, TweetId},
  identity::{Identity, IdentityGraph, IdentityId, NewIdentity, RightKind},
  notification::Notification,
  social::{FollowEdge, Like, Topic, TopicId, TopicSelection},
};

/// Abstraction over the identity data store.
///
/// Uniqueness (email, follow edges, likes, topic names) is enforced by the
/// backend and reported through the domain variants of [`crate::Error`].
/// Every rights decrement is conditional on the counter being positive and
/// happens in the same transaction as the write it pays for.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait SocialStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + Into<crate::Error> + 'static;

  // ── Identities ────────────────────────────────────────────────────────

  /// Persist a new identity. Fails with [`crate::Error::EmailTaken`] if the
  /// email is already registered.
  fn create_identity(
    &self,
    input: NewIdentity,
  ) -> impl Future<Output = Result<Identity, Self::Error>> + Send + '_;

  /// Retrieve an identity by id. Returns `None` if not found.
  fn get_identity(
    &self,
    id: IdentityId,
  ) -> impl Future<Output = Result<Option<Identity>, Self::Error>> + Send + '_;

  /// Retrieve an identity by its (unique) email.
  fn identity_by_email<'a>(
    &'a self,
    email: &'a str,
  ) -> impl Future<Output = Result<Option<Identity>, Self::Error>> + Send + 'a;

  /// List every identity, in id order.
  fn list_identities(
    &self,
  ) -> impl Future<Output = Result<Vec<Identity>, Self::Error>> + Send + '_;

  /// Load the identity together with its tweets, topic selections,
  /// notifications, followers and followees. Returns `None` if the identity
  /// does not exist.
  fn load_identity_graph(
    &self,
    id: IdentityId,
  ) -> impl Future<Output = Result<Option<IdentityGraph>, Self::Error>> + Send + '_;

  /// Change (or clear) the display name.
  fn rename_identity(
    &self,
    id: IdentityId,
    name: Option<String>,
  ) -> impl Future<Output = Result<Identity, Self::Error>> + Send + '_;

  // ── Rights ────────────────────────────────────────────────────────────

  /// Add one to the `kind` counter and append a notification carrying
  /// `message`, atomically.
  fn grant_right(
    &self,
    id: IdentityId,
    kind: RightKind,
    message: String,
  ) -> impl Future<Output = Result<Notification, Self::Error>> + Send + '_;

  /// Subtract one from the `kind` counter if it is positive. Fails with
  /// [`crate::Error::RightsExhausted`] otherwise.
  ///
  /// This is the standalone spend, for something paid for outside the
  /// store. [`Self::post_tweet`] and [`Self::post_comment`] do not call it;
  /// they spend inside their own transaction.
  fn consume_right(
    &self,
    id: IdentityId,
    kind: RightKind,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Content ───────────────────────────────────────────────────────────

  /// Spend one tweet right and record the tweet.
  fn post_tweet(
    &self,
    input: NewTweet,
  ) -> impl Future<Output = Result<Tweet, Self::Error>> + Send + '_;

  /// Spend one comment right and record the comment, notifying the tweet's
  /// author. Commenting on one's own tweet is rejected.
  fn post_comment(
    &self,
    input: NewComment,
  ) -> impl Future<Output = Result<Comment, Self::Error>> + Send + '_;

  /// Every tweet tagged with one of `topics`, in id order.
  fn tweets_by_topics<'a>(
    &'a self,
    topics: &'a [TopicId],
  ) -> impl Future<Output = Result<Vec<Tweet>, Self::Error>> + Send + 'a;

  // ── Social graph ──────────────────────────────────────────────────────

  /// Create a follow edge and notify the followee.
  ///
  /// Self-follow is rejected before anything is written; a duplicate edge
  /// fails with [`crate::Error::AlreadyFollowing`].
  fn follow(
    &self,
    follower: IdentityId,
    followee: IdentityId,
  ) -> impl Future<Output = Result<FollowEdge, Self::Error>> + Send + '_;

  /// Remove a follow edge. Returns `false` if there was none.
  fn unfollow(
    &self,
    follower: IdentityId,
    followee: IdentityId,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Like a tweet and notify its author.
  fn like_tweet(
    &self,
    identity: IdentityId,
    tweet: TweetId,
  ) -> impl Future<Output = Result<Like, Self::Error>> + Send + '_;

  // ── Topics ────────────────────────────────────────────────────────────

  fn create_topic(
    &self,
    name: String,
  ) -> impl Future<Output = Result<Topic, Self::Error>> + Send + '_;

  fn list_topics(
    &self,
  ) -> impl Future<Output = Result<Vec<Topic>, Self::Error>> + Send + '_;

  /// Record that `identity` is interested in `topic`.
  fn select_topic(
    &self,
    identity: IdentityId,
    topic: TopicId,
  ) -> impl Future<Output = Result<TopicSelection, Self::Error>> + Send + '_;

  // ── Notifications ─────────────────────────────────────────────────────

  /// Notifications addressed to `identity`, newest first.
  fn list_notifications(
    &self,
    identity: IdentityId,
  ) -> impl Future<Output = Result<Vec<Notification>, Self::Error>> + Send + '_;
}
