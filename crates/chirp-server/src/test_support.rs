//! A [`SocialStore`] wrapper that misbehaves on request.

use std::collections::HashMap;

use chirp_core::{
  Error,
  content::{Comment, NewComment, NewTweet, Tweet, TweetId},
  identity::{Identity, IdentityGraph, IdentityId, NewIdentity, RightKind},
  notification::Notification,
  social::{FollowEdge, Like, Topic, TopicId, TopicSelection},
  store::SocialStore,
};
use chirp_store_sqlite::SqliteStore;

#[derive(Debug, Clone, Copy)]
pub enum Fault {
  /// Return an internal error straight away.
  Fail,
  /// Never complete.
  Stall,
}

/// Delegates to an in-memory [`SqliteStore`] except where a fault is set.
pub struct FlakyStore {
  pub inner:        SqliteStore,
  pub grant_faults: HashMap<IdentityId, Fault>,
  pub topic_fault:  Option<Fault>,
}

impl FlakyStore {
  pub async fn new() -> Self {
    Self {
      inner:        SqliteStore::open_in_memory().await.unwrap(),
      grant_faults: HashMap::new(),
      topic_fault:  None,
    }
  }
}

async fn inject<T>(fault: Fault) -> Result<T, Error> {
  match fault {
    Fault::Fail => Err(Error::internal(std::io::Error::other("injected fault"))),
    Fault::Stall => std::future::pending().await,
  }
}

impl SocialStore for FlakyStore {
  type Error = Error;

  async fn create_identity(&self, input: NewIdentity) -> Result<Identity, Error> {
    self.inner.create_identity(input).await.map_err(Into::into)
  }

  async fn get_identity(&self, id: IdentityId) -> Result<Option<Identity>, Error> {
    self.inner.get_identity(id).await.map_err(Into::into)
  }

  async fn identity_by_email(&self, email: &str) -> Result<Option<Identity>, Error> {
    self.inner.identity_by_email(email).await.map_err(Into::into)
  }

  async fn list_identities(&self) -> Result<Vec<Identity>, Error> {
    self.inner.list_identities().await.map_err(Into::into)
  }

  async fn load_identity_graph(
    &self,
    id: IdentityId,
  ) -> Result<Option<IdentityGraph>, Error> {
    self.inner.load_identity_graph(id).await.map_err(Into::into)
  }

  async fn rename_identity(
    &self,
    id: IdentityId,
    name: Option<String>,
  ) -> Result<Identity, Error> {
    self.inner.rename_identity(id, name).await.map_err(Into::into)
  }

  async fn grant_right(
    &self,
    id: IdentityId,
    kind: RightKind,
    message: String,
  ) -> Result<Notification, Error> {
    if let Some(fault) = self.grant_faults.get(&id) {
      return inject(*fault).await;
    }
    self.inner.grant_right(id, kind, message).await.map_err(Into::into)
  }

  async fn consume_right(&self, id: IdentityId, kind: RightKind) -> Result<(), Error> {
    self.inner.consume_right(id, kind).await.map_err(Into::into)
  }

  async fn post_tweet(&self, input: NewTweet) -> Result<Tweet, Error> {
    self.inner.post_tweet(input).await.map_err(Into::into)
  }

  async fn post_comment(&self, input: NewComment) -> Result<Comment, Error> {
    self.inner.post_comment(input).await.map_err(Into::into)
  }

  async fn tweets_by_topics(&self, topics: &[TopicId]) -> Result<Vec<Tweet>, Error> {
    self.inner.tweets_by_topics(topics).await.map_err(Into::into)
  }

  async fn follow(
    &self,
    follower: IdentityId,
    followee: IdentityId,
  ) -> Result<FollowEdge, Error> {
    self.inner.follow(follower, followee).await.map_err(Into::into)
  }

  async fn unfollow(
    &self,
    follower: IdentityId,
    followee: IdentityId,
  ) -> Result<bool, Error> {
    self.inner.unfollow(follower, followee).await.map_err(Into::into)
  }

  async fn like_tweet(&self, identity: IdentityId, tweet: TweetId) -> Result<Like, Error> {
    self.inner.like_tweet(identity, tweet).await.map_err(Into::into)
  }

  async fn create_topic(&self, name: String) -> Result<Topic, Error> {
    if let Some(fault) = self.topic_fault {
      return inject(fault).await;
    }
    self.inner.create_topic(name).await.map_err(Into::into)
  }

  async fn list_topics(&self) -> Result<Vec<Topic>, Error> {
    self.inner.list_topics().await.map_err(Into::into)
  }

  async fn select_topic(
    &self,
    identity: IdentityId,
    topic: TopicId,
  ) -> Result<TopicSelection, Error> {
    self.inner.select_topic(identity, topic).await.map_err(Into::into)
  }

  async fn list_notifications(
    &self,
    identity: IdentityId,
  ) -> Result<Vec<Notification>, Error> {
    self.inner.list_notifications(identity).await.map_err(Into::into)
  }
}
