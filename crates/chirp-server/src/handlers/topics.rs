//! Handlers for `/topics` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/topics` | Public |
//! | `POST` | `/topics` | Bearer; `{"name": "rust"}` |
//! | `POST` | `/topics/{id}/select` | Bearer; repeat selections are recorded |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
};
use chirp_core::{
  Error,
  social::{Topic, TopicId, TopicSelection},
  store::SocialStore,
};
use serde::Deserialize;

use crate::{AppState, auth::CurrentUser, error::ApiError};

/// `GET /topics`
pub async fn list<S>(
  State(state): State<AppState<S>>,
) -> Result<Json<Vec<Topic>>, ApiError>
where
  S: SocialStore + 'static,
{
  let topics = state.store.list_topics().await.map_err(ApiError::store)?;
  Ok(Json(topics))
}

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  pub name: String,
}

/// `POST /topics`
pub async fn create<S>(
  State(state): State<AppState<S>>,
  CurrentUser(_): CurrentUser,
  Json(body): Json<CreateBody>,
) -> Result<(StatusCode, Json<Topic>), ApiError>
where
  S: SocialStore + 'static,
{
  let name = body.name.trim();
  if name.is_empty() {
    return Err(Error::Validation("topic name must not be empty".into()).into());
  }
  let topic = state
    .store
    .create_topic(name.to_owned())
    .await
    .map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(topic)))
}

/// `POST /topics/{id}/select`
pub async fn select<S>(
  State(state): State<AppState<S>>,
  CurrentUser(graph): CurrentUser,
  Path(topic): Path<TopicId>,
) -> Result<(StatusCode, Json<TopicSelection>), ApiError>
where
  S: SocialStore + 'static,
{
  let selection = state
    .store
    .select_topic(graph.id(), topic)
    .await
    .map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(selection)))
}
