//! Account endpoints: sign-up, sign-in, session refresh, profile edits.
//!
//! | Method  | Path       | Notes |
//! |---------|------------|-------|
//! | `POST`  | `/sign-up` | `{"name"?, "email", "password"}` → 201 |
//! | `POST`  | `/sign-in` | `{"email", "password"}`; 401 on any mismatch |
//! | `GET`   | `/validate`| Bearer; returns the graph and a new token |
//! | `PATCH` | `/me`      | Bearer; `{"name": "…" \| null}` |

use axum::{Json, extract::State, http::StatusCode};
use chirp_auth::credential;
use chirp_core::{
  Error,
  identity::{Identity, IdentityGraph, NewIdentity},
  store::SocialStore,
};
use serde::Deserialize;

use crate::{AppState, auth::CurrentUser, error::ApiError, handlers::Session};

// ─── Input normalisation ─────────────────────────────────────────────────────

/// Lower-cased, trimmed, and at least shaped like an address.
fn normalize_email(raw: &str) -> Result<String, Error> {
  let email = raw.trim().to_lowercase();
  match email.split_once('@') {
    Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(email),
    _ => Err(Error::Validation(format!("{raw:?} is not an email address"))),
  }
}

/// Blank names are treated as no name.
fn normalize_name(raw: Option<String>) -> Option<String> {
  raw
    .map(|n| n.trim().to_owned())
    .filter(|n| !n.is_empty())
}

// ─── Sign-up ─────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SignUpBody {
  pub name:     Option<String>,
  pub email:    String,
  pub password: String,
}

/// `POST /sign-up`
pub async fn sign_up<S>(
  State(state): State<AppState<S>>,
  Json(body): Json<SignUpBody>,
) -> Result<(StatusCode, Json<Session<Identity>>), ApiError>
where
  S: SocialStore + 'static,
{
  let email = normalize_email(&body.email)?;
  if body.password.is_empty() {
    return Err(Error::Validation("password must not be empty".into()).into());
  }

  let credential = credential::hash(&body.password).await?;
  let identity = state
    .store
    .create_identity(NewIdentity {
      name: normalize_name(body.name),
      email,
      credential,
      tweet_rights: state.config.initial_tweet_rights,
      comment_rights: state.config.initial_comment_rights,
    })
    .await
    .map_err(ApiError::store)?;

  let token = state.sessions.tokens().issue(identity.id)?;
  tracing::info!(identity = identity.id, "identity registered");
  Ok((StatusCode::CREATED, Json(Session { user: identity, token })))
}

// ─── Sign-in ─────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SignInBody {
  pub email:    String,
  pub password: String,
}

/// `POST /sign-in`
///
/// Unknown email and wrong password are the same 401, and cost the same
/// argon2 work.
pub async fn sign_in<S>(
  State(state): State<AppState<S>>,
  Json(body): Json<SignInBody>,
) -> Result<Json<Session<Identity>>, ApiError>
where
  S: SocialStore + 'static,
{
  let email = body.email.trim().to_lowercase();
  let identity = state
    .store
    .identity_by_email(&email)
    .await
    .map_err(ApiError::store)?;

  let Some(identity) = identity else {
    credential::verify_decoy(&body.password).await;
    return Err(Error::Unauthenticated.into());
  };
  if !credential::verify(&body.password, &identity.credential).await {
    tracing::debug!(identity = identity.id, "password mismatch");
    return Err(Error::Unauthenticated.into());
  }

  let token = state.sessions.tokens().issue(identity.id)?;
  Ok(Json(Session { user: identity, token }))
}

// ─── Validate ────────────────────────────────────────────────────────────────

/// `GET /validate`
pub async fn validate<S>(
  State(state): State<AppState<S>>,
  CurrentUser(graph): CurrentUser,
) -> Result<Json<Session<IdentityGraph>>, ApiError>
where
  S: SocialStore + 'static,
{
  let token = state.sessions.tokens().issue(graph.id())?;
  Ok(Json(Session { user: graph, token }))
}

// ─── Profile ─────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct UpdateMeBody {
  pub name: Option<String>,
}

/// `PATCH /me`
pub async fn update_me<S>(
  State(state): State<AppState<S>>,
  CurrentUser(graph): CurrentUser,
  Json(body): Json<UpdateMeBody>,
) -> Result<Json<Identity>, ApiError>
where
  S: SocialStore + 'static,
{
  let identity = state
    .store
    .rename_identity(graph.id(), normalize_name(body.name))
    .await
    .map_err(ApiError::store)?;
  Ok(Json(identity))
}
