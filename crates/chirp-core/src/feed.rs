//! Home feed assembly.
//!
//! The feed is the union of two independent signals: tweets by identities the
//! caller follows, and tweets tagged with a topic the caller has selected. It
//! is not ranked and not deduplicated; a tweet that satisfies both signals
//! appears twice.

use crate::{
  Error, Result,
  content::Tweet,
  identity::IdentityGraph,
  social::TopicId,
  store::SocialStore,
};

/// Build the feed for an already-resolved identity.
///
/// Followed authors' tweets come first (taken from the hydrated graph), then
/// topic matches in store order. An identity with no follows and no topic
/// selections gets an empty feed, not an error.
pub async fn compose<S: SocialStore>(
  store: &S,
  graph: &IdentityGraph,
) -> Result<Vec<Tweet>> {
  let mut feed: Vec<Tweet> = graph
    .following
    .iter()
    .flat_map(|f| f.tweets.iter().cloned())
    .collect();

  let topics = selected_topic_ids(graph);
  if !topics.is_empty() {
    let topical = store
      .tweets_by_topics(&topics)
      .await
      .map_err(Into::<Error>::into)?;
    feed.extend(topical);
  }

  Ok(feed)
}

/// Distinct topic ids, in first-selected order. Selections may repeat.
fn selected_topic_ids(graph: &IdentityGraph) -> Vec<TopicId> {
  let mut ids: Vec<TopicId> = Vec::with_capacity(graph.selected_topics.len());
  for topic in &graph.selected_topics {
    if !ids.contains(&topic.id) {
      ids.push(topic.id);
    }
  }
  ids
}
