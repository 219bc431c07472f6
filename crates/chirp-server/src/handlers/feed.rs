//! Read-side endpoints for the signed-in identity.

use axum::{Json, extract::State};
use chirp_core::{
  content::Tweet,
  feed,
  notification::Notification,
  store::SocialStore,
};

use crate::{AppState, auth::CurrentUser, error::ApiError};

/// `GET /feed`
pub async fn feed<S>(
  State(state): State<AppState<S>>,
  CurrentUser(graph): CurrentUser,
) -> Result<Json<Vec<Tweet>>, ApiError>
where
  S: SocialStore + 'static,
{
  let tweets = feed::compose(state.store.as_ref(), &graph).await?;
  Ok(Json(tweets))
}

/// `GET /notifications`, newest first.
pub async fn notifications<S>(
  State(state): State<AppState<S>>,
  CurrentUser(graph): CurrentUser,
) -> Result<Json<Vec<Notification>>, ApiError>
where
  S: SocialStore + 'static,
{
  let notes = state
    .store
    .list_notifications(graph.id())
    .await
    .map_err(ApiError::store)?;
  Ok(Json(notes))
}
