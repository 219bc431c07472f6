//! Bearer-token extractor.

use axum::{
  extract::FromRequestParts,
  http::{header, request::Parts},
};
use chirp_core::{Error, identity::IdentityGraph, store::SocialStore};

use crate::{AppState, error::ApiError};

/// The authenticated caller, fully hydrated.
///
/// Present in a handler's arguments means the request carried a valid token
/// for an identity that still exists. Every other case is rejected with 401;
/// a store fault during resolution is a 500 instead.
pub struct CurrentUser(pub IdentityGraph);

impl<S> FromRequestParts<AppState<S>> for CurrentUser
where
  S: SocialStore + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    let header = parts
      .headers
      .get(header::AUTHORIZATION)
      .and_then(|v| v.to_str().ok());
    match state.sessions.resolve_header(header).await? {
      Some(graph) => Ok(CurrentUser(graph)),
      None => Err(Error::Unauthenticated.into()),
    }
  }
}
