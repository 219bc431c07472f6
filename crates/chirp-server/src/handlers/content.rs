//! Posting content. Each post spends one right of the matching kind.

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
};
use chirp_core::{
  content::{Comment, NewComment, NewTweet, Tweet, TweetId, validate_body},
  social::TopicId,
  store::SocialStore,
};
use serde::Deserialize;

use crate::{AppState, auth::CurrentUser, error::ApiError};

#[derive(Debug, Deserialize)]
pub struct TweetBody {
  pub body:     String,
  pub topic_id: Option<TopicId>,
}

/// `POST /tweets`
pub async fn post_tweet<S>(
  State(state): State<AppState<S>>,
  CurrentUser(graph): CurrentUser,
  Json(input): Json<TweetBody>,
) -> Result<(StatusCode, Json<Tweet>), ApiError>
where
  S: SocialStore + 'static,
{
  let body = validate_body(&input.body)?;
  let tweet = state
    .store
    .post_tweet(NewTweet {
      author_id: graph.id(),
      topic_id: input.topic_id,
      body,
    })
    .await
    .map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(tweet)))
}

#[derive(Debug, Deserialize)]
pub struct CommentBody {
  pub body: String,
}

/// `POST /tweets/{id}/comments`
pub async fn post_comment<S>(
  State(state): State<AppState<S>>,
  CurrentUser(graph): CurrentUser,
  Path(tweet_id): Path<TweetId>,
  Json(input): Json<CommentBody>,
) -> Result<(StatusCode, Json<Comment>), ApiError>
where
  S: SocialStore + 'static,
{
  let body = validate_body(&input.body)?;
  let comment = state
    .store
    .post_comment(NewComment { tweet_id, author_id: graph.id(), body })
    .await
    .map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(comment)))
}
