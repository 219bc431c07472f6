//! Follow edges and likes.

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
};
use chirp_core::{
  Error,
  content::TweetId,
  identity::IdentityId,
  social::{FollowEdge, Like},
  store::SocialStore,
};
use serde::Deserialize;

use crate::{AppState, auth::CurrentUser, error::ApiError};

#[derive(Debug, Deserialize)]
pub struct FollowBody {
  pub followee_id: IdentityId,
}

/// `POST /follows`
pub async fn follow<S>(
  State(state): State<AppState<S>>,
  CurrentUser(graph): CurrentUser,
  Json(body): Json<FollowBody>,
) -> Result<(StatusCode, Json<FollowEdge>), ApiError>
where
  S: SocialStore + 'static,
{
  let edge = state
    .store
    .follow(graph.id(), body.followee_id)
    .await
    .map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(edge)))
}

/// `DELETE /follows/{id}`
pub async fn unfollow<S>(
  State(state): State<AppState<S>>,
  CurrentUser(graph): CurrentUser,
  Path(followee): Path<IdentityId>,
) -> Result<StatusCode, ApiError>
where
  S: SocialStore + 'static,
{
  let follower = graph.id();
  let removed = state
    .store
    .unfollow(follower, followee)
    .await
    .map_err(ApiError::store)?;
  if removed {
    Ok(StatusCode::NO_CONTENT)
  } else {
    Err(Error::NotFollowing { follower, followee }.into())
  }
}

/// `POST /tweets/{id}/likes`
pub async fn like<S>(
  State(state): State<AppState<S>>,
  CurrentUser(graph): CurrentUser,
  Path(tweet): Path<TweetId>,
) -> Result<(StatusCode, Json<Like>), ApiError>
where
  S: SocialStore + 'static,
{
  let like = state
    .store
    .like_tweet(graph.id(), tweet)
    .await
    .map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(like)))
}
