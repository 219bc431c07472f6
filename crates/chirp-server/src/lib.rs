//! HTTP binding and ticket distribution for Chirp.
//!
//! Exposes an axum [`Router`] backed by any [`SocialStore`], plus the
//! [`distributor::Distributor`] that the binary runs on a daily timer.

pub mod auth;
pub mod distributor;
pub mod error;
pub mod handlers;

#[cfg(test)]
mod test_support;

pub use error::{ApiError, ConfigError};

use std::{path::PathBuf, sync::Arc, time::Duration};

use axum::{
  Router,
  http::StatusCode,
  routing::{delete, get, patch, post},
};
use chirp_auth::{SessionResolver, TokenService};
use chirp_core::store::SocialStore;
use distributor::GrantSchedule;
use handlers::{account, content, feed, social, topics};
use serde::Deserialize;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `CHIRP_*` environment variables.
#[derive(Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:                   String,
  #[serde(default = "default_port")]
  pub port:                   u16,
  #[serde(default = "default_store_path")]
  pub store_path:             PathBuf,
  /// HS256 signing secret. Required.
  pub token_secret:           String,
  #[serde(default = "default_request_timeout")]
  pub request_timeout_secs:   u64,
  #[serde(default = "default_store_timeout")]
  pub store_timeout_secs:     u64,
  #[serde(default)]
  pub initial_tweet_rights:   u32,
  #[serde(default)]
  pub initial_comment_rights: u32,
  #[serde(default = "GrantSchedule::defaults")]
  pub schedules:              Vec<GrantSchedule>,
}

fn default_host() -> String { "127.0.0.1".to_string() }
fn default_port() -> u16 { 8080 }
fn default_store_path() -> PathBuf { PathBuf::from("chirp.db") }
fn default_request_timeout() -> u64 { 30 }
fn default_store_timeout() -> u64 { 10 }

impl ServerConfig {
  /// Reject values the server cannot run with.
  pub fn validate(&self) -> Result<(), ConfigError> {
    if self.token_secret.is_empty() {
      return Err(ConfigError::EmptySecret);
    }
    if self.request_timeout_secs == 0 {
      return Err(ConfigError::ZeroTimeout("request_timeout_secs"));
    }
    if self.store_timeout_secs == 0 {
      return Err(ConfigError::ZeroTimeout("store_timeout_secs"));
    }
    if let Some(bad) = self.schedules.iter().find(|s| s.percent > 100) {
      return Err(ConfigError::PercentOutOfRange {
        right:   bad.right,
        percent: bad.percent,
      });
    }
    Ok(())
  }

  pub fn request_timeout(&self) -> Duration {
    Duration::from_secs(self.request_timeout_secs)
  }

  pub fn store_timeout(&self) -> Duration {
    Duration::from_secs(self.store_timeout_secs)
  }

  /// All defaults, with the given secret.
  #[cfg(test)]
  pub(crate) fn for_secret(secret: &str) -> Self {
    Self {
      host:                   default_host(),
      port:                   default_port(),
      store_path:             default_store_path(),
      token_secret:           secret.to_string(),
      request_timeout_secs:   default_request_timeout(),
      store_timeout_secs:     default_store_timeout(),
      initial_tweet_rights:   0,
      initial_comment_rights: 0,
      schedules:              GrantSchedule::defaults(),
    }
  }
}

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
pub struct AppState<S> {
  pub store:    Arc<S>,
  pub sessions: SessionResolver<S>,
  pub config:   Arc<ServerConfig>,
}

impl<S> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self {
      store:    Arc::clone(&self.store),
      sessions: self.sessions.clone(),
      config:   Arc::clone(&self.config),
    }
  }
}

impl<S: SocialStore> AppState<S> {
  pub fn new(store: Arc<S>, tokens: Arc<TokenService>, config: ServerConfig) -> Self {
    Self {
      sessions: SessionResolver::new(Arc::clone(&store), tokens),
      store,
      config: Arc::new(config),
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the axum [`Router`] for the Chirp API.
///
/// A request still running after `request_timeout_secs` is abandoned with
/// 503, the same class as any other backend fault.
pub fn router<S>(state: AppState<S>) -> Router
where
  S: SocialStore + 'static,
{
  let timeout = state.config.request_timeout();
  Router::new()
    // Account
    .route("/sign-up",  post(account::sign_up::<S>))
    .route("/sign-in",  post(account::sign_in::<S>))
    .route("/validate", get(account::validate::<S>))
    .route("/me",       patch(account::update_me::<S>))
    // Reading
    .route("/feed",          get(feed::feed::<S>))
    .route("/notifications", get(feed::notifications::<S>))
    // Social graph
    .route("/follows",      post(social::follow::<S>))
    .route("/follows/{id}", delete(social::unfollow::<S>))
    // Topics
    .route("/topics",             get(topics::list::<S>).post(topics::create::<S>))
    .route("/topics/{id}/select", post(topics::select::<S>))
    // Content
    .route("/tweets",                post(content::post_tweet::<S>))
    .route("/tweets/{id}/comments",  post(content::post_comment::<S>))
    .route("/tweets/{id}/likes",     post(social::like::<S>))
    .layer(TimeoutLayer::with_status_code(StatusCode::SERVICE_UNAVAILABLE, timeout))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

// ─── Integration tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use super::*;

  use axum::{
    body::Body,
    http::{Request, header},
  };
  use chirp_core::identity::RightKind;
  use chirp_store_sqlite::SqliteStore;
  use serde_json::{Value, json};
  use tower::ServiceExt as _;

  use crate::test_support::{Fault, FlakyStore};

  const SECRET: &str = "integration-secret";

  fn make_state(store: Arc<SqliteStore>) -> AppState<SqliteStore> {
    let tokens = Arc::new(TokenService::new(SECRET).unwrap());
    AppState::new(store, tokens, ServerConfig::for_secret(SECRET))
  }

  async fn app() -> (Router, Arc<SqliteStore>) {
    let store = Arc::new(SqliteStore::open_in_memory().await.unwrap());
    (router(make_state(Arc::clone(&store))), store)
  }

  async fn call(
    app:    &Router,
    method: &str,
    uri:    &str,
    token:  Option<&str>,
    body:   Option<Value>,
  ) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(t) = token {
      builder = builder.header(header::AUTHORIZATION, format!("Bearer {t}"));
    }
    let req = match body {
      Some(b) => builder
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(b.to_string()))
        .unwrap(),
      None => builder.body(Body::empty()).unwrap(),
    };
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
      .await
      .unwrap();
    let value = if bytes.is_empty() {
      Value::Null
    } else {
      serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
  }

  /// Sign up and return `(id, token)`.
  async fn sign_up(app: &Router, name: &str) -> (i64, String) {
    let (status, body) = call(
      app,
      "POST",
      "/sign-up",
      None,
      Some(json!({
        "name": name,
        "email": format!("{}@example.com", name.to_lowercase()),
        "password": "correct horse",
      })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    (
      body["user"]["id"].as_i64().unwrap(),
      body["token"].as_str().unwrap().to_string(),
    )
  }

  async fn grant(store: &SqliteStore, id: i64, kind: RightKind) {
    store
      .grant_right(id, kind, "test grant".into())
      .await
      .unwrap();
  }

  // ── Config ──────────────────────────────────────────────────────────────────

  #[test]
  fn config_validation() {
    assert!(ServerConfig::for_secret("s").validate().is_ok());
    assert!(matches!(
      ServerConfig::for_secret("").validate(),
      Err(ConfigError::EmptySecret)
    ));

    let mut cfg = ServerConfig::for_secret("s");
    cfg.schedules[1].percent = 101;
    assert!(matches!(
      cfg.validate(),
      Err(ConfigError::PercentOutOfRange { right: RightKind::Comment, percent: 101 })
    ));
  }

  #[test]
  fn config_defaults_fill_everything_but_the_secret() {
    let cfg: ServerConfig = serde_json::from_value(json!({ "token_secret": "s" })).unwrap();
    assert_eq!(cfg.port, 8080);
    assert_eq!(cfg.request_timeout_secs, 30);
    assert_eq!(cfg.store_timeout_secs, 10);
    assert_eq!(cfg.schedules, GrantSchedule::defaults());

    assert!(serde_json::from_value::<ServerConfig>(json!({})).is_err());
  }

  // ── Account ─────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn sign_up_then_validate_returns_graph_and_new_token() {
    let (app, _) = app().await;
    let (id, token) = sign_up(&app, "Alice").await;

    let (status, body) = call(&app, "GET", "/validate", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["identity"]["id"], id);
    assert_eq!(body["user"]["identity"]["email"], "alice@example.com");
    assert!(body["user"]["identity"].get("credential").is_none());
    assert!(body["token"].as_str().is_some_and(|t| !t.is_empty()));
  }

  #[tokio::test]
  async fn sign_in_checks_the_password() {
    let (app, _) = app().await;
    sign_up(&app, "Alice").await;

    let ok = json!({ "email": "ALICE@example.com ", "password": "correct horse" });
    let (status, body) = call(&app, "POST", "/sign-in", None, Some(ok)).await;
    assert_eq!(status, StatusCode::OK);
    let token = body["token"].as_str().unwrap();
    let (status, _) = call(&app, "GET", "/feed", Some(token), None).await;
    assert_eq!(status, StatusCode::OK);

    let wrong = json!({ "email": "alice@example.com", "password": "battery staple" });
    let (status, body) = call(&app, "POST", "/sign-in", None, Some(wrong)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthenticated");

    let unknown = json!({ "email": "nobody@example.com", "password": "correct horse" });
    let (status, _) = call(&app, "POST", "/sign-in", None, Some(unknown)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
  }

  #[tokio::test]
  async fn duplicate_email_is_a_conflict() {
    let (app, _) = app().await;
    sign_up(&app, "Alice").await;
    let again = json!({ "email": "alice@example.com", "password": "x" });
    let (status, body) = call(&app, "POST", "/sign-up", None, Some(again)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].as_str().unwrap().contains("already registered"));
  }

  #[tokio::test]
  async fn malformed_sign_up_is_a_validation_error() {
    let (app, _) = app().await;
    let no_at = json!({ "email": "alice", "password": "x" });
    let (status, _) = call(&app, "POST", "/sign-up", None, Some(no_at)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let no_password = json!({ "email": "alice@example.com", "password": "" });
    let (status, _) = call(&app, "POST", "/sign-up", None, Some(no_password)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
  }

  #[tokio::test]
  async fn missing_or_garbage_bearer_is_401() {
    let (app, _) = app().await;
    for uri in ["/feed", "/notifications", "/validate"] {
      let (status, body) = call(&app, "GET", uri, None, None).await;
      assert_eq!(status, StatusCode::UNAUTHORIZED, "{uri}");
      assert_eq!(body["error"], "unauthenticated");
      let (status, _) = call(&app, "GET", uri, Some("garbage"), None).await;
      assert_eq!(status, StatusCode::UNAUTHORIZED, "{uri}");
    }
  }

  #[tokio::test]
  async fn token_signed_elsewhere_is_401() {
    let (app, _) = app().await;
    let (id, _) = sign_up(&app, "Alice").await;
    let forged = TokenService::new("not-our-secret").unwrap().issue(id).unwrap();
    let (status, _) = call(&app, "GET", "/validate", Some(&forged), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
  }

  #[tokio::test]
  async fn rename_and_clear_name() {
    let (app, _) = app().await;
    let (_, token) = sign_up(&app, "Alice").await;
    let (status, body) =
      call(&app, "PATCH", "/me", Some(&token), Some(json!({ "name": "Al" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Al");

    let (_, body) =
      call(&app, "PATCH", "/me", Some(&token), Some(json!({ "name": null }))).await;
    assert_eq!(body["name"], Value::Null);
  }

  // ── Rights ──────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn posting_spends_rights_and_stops_at_zero() {
    let (app, store) = app().await;
    let (id, token) = sign_up(&app, "Alice").await;
    let tweet = json!({ "body": "hello" });

    let (status, body) = call(&app, "POST", "/tweets", Some(&token), Some(tweet.clone())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "no tweet rights left");

    grant(&store, id, RightKind::Tweet).await;
    let (status, body) = call(&app, "POST", "/tweets", Some(&token), Some(tweet.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["body"], "hello");
    assert_eq!(body["author_id"], id);

    let (status, _) = call(&app, "POST", "/tweets", Some(&token), Some(tweet)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, body) = call(&app, "GET", "/validate", Some(&token), None).await;
    assert_eq!(body["user"]["identity"]["tweet_rights"], 0);
    assert_eq!(body["user"]["tweets"].as_array().unwrap().len(), 1);
  }

  #[tokio::test]
  async fn blank_tweet_is_rejected_before_spending() {
    let (app, store) = app().await;
    let (id, token) = sign_up(&app, "Alice").await;
    grant(&store, id, RightKind::Tweet).await;

    let (status, _) =
      call(&app, "POST", "/tweets", Some(&token), Some(json!({ "body": "   " }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let identity = store.get_identity(id).await.unwrap().unwrap();
    assert_eq!(identity.tweet_rights, 1);
  }

  #[tokio::test]
  async fn comments_notify_the_author_and_not_oneself() {
    let (app, store) = app().await;
    let (alice, alice_token) = sign_up(&app, "Alice").await;
    let (bob, bob_token) = sign_up(&app, "Bob").await;
    grant(&store, alice, RightKind::Tweet).await;
    grant(&store, alice, RightKind::Comment).await;

    let (_, tweet) =
      call(&app, "POST", "/tweets", Some(&alice_token), Some(json!({ "body": "hi" }))).await;
    let uri = format!("/tweets/{}/comments", tweet["id"]);

    let (status, _) =
      call(&app, "POST", &uri, Some(&alice_token), Some(json!({ "body": "me" }))).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) =
      call(&app, "POST", &uri, Some(&bob_token), Some(json!({ "body": "yo" }))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    grant(&store, bob, RightKind::Comment).await;
    let (status, _) =
      call(&app, "POST", &uri, Some(&bob_token), Some(json!({ "body": "yo" }))).await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, notes) = call(&app, "GET", "/notifications", Some(&alice_token), None).await;
    let messages: Vec<&str> = notes
      .as_array()
      .unwrap()
      .iter()
      .map(|n| n["message"].as_str().unwrap())
      .collect();
    assert!(messages.contains(&"Bob commented on your tweet."), "{messages:?}");

    let (status, _) =
      call(&app, "POST", "/tweets/999/comments", Some(&bob_token), Some(json!({ "body": "?" })))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
  }

  // ── Social graph ────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn follow_lifecycle() {
    let (app, _) = app().await;
    let (alice, alice_token) = sign_up(&app, "Alice").await;
    let (bob, bob_token) = sign_up(&app, "Bob").await;

    let me = json!({ "followee_id": alice });
    let (status, _) = call(&app, "POST", "/follows", Some(&alice_token), Some(me)).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let follow_bob = json!({ "followee_id": bob });
    let (status, body) =
      call(&app, "POST", "/follows", Some(&alice_token), Some(follow_bob.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["follower_id"], alice);
    let (status, _) =
      call(&app, "POST", "/follows", Some(&alice_token), Some(follow_bob)).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, graph) = call(&app, "GET", "/validate", Some(&bob_token), None).await;
    assert_eq!(graph["user"]["followers"][0]["id"], alice);
    assert_eq!(graph["user"]["notifications"][0]["message"], "Alice started following you.");

    let uri = format!("/follows/{bob}");
    let (status, _) = call(&app, "DELETE", &uri, Some(&alice_token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = call(&app, "DELETE", &uri, Some(&alice_token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let ghost = json!({ "followee_id": 4242 });
    let (status, _) = call(&app, "POST", "/follows", Some(&alice_token), Some(ghost)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
  }

  #[tokio::test]
  async fn liking_twice_is_a_conflict() {
    let (app, store) = app().await;
    let (alice, alice_token) = sign_up(&app, "Alice").await;
    let (_, bob_token) = sign_up(&app, "Bob").await;
    grant(&store, alice, RightKind::Tweet).await;
    let (_, tweet) =
      call(&app, "POST", "/tweets", Some(&alice_token), Some(json!({ "body": "like me" }))).await;

    let uri = format!("/tweets/{}/likes", tweet["id"]);
    let (status, _) = call(&app, "POST", &uri, Some(&bob_token), None).await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = call(&app, "POST", &uri, Some(&bob_token), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
  }

  // ── Store faults ────────────────────────────────────────────────────────────

  async fn flaky_app(store: FlakyStore, request_timeout_secs: u64) -> (Router, String) {
    let id = store
      .inner
      .create_identity(chirp_core::identity::NewIdentity {
        name:           None,
        email:          "dana@example.com".into(),
        credential:     "unused".into(),
        tweet_rights:   0,
        comment_rights: 0,
      })
      .await
      .unwrap()
      .id;
    let tokens = Arc::new(TokenService::new(SECRET).unwrap());
    let token = tokens.issue(id).unwrap();
    let mut config = ServerConfig::for_secret(SECRET);
    config.request_timeout_secs = request_timeout_secs;
    (router(AppState::new(Arc::new(store), tokens, config)), token)
  }

  #[tokio::test]
  async fn stalled_store_is_a_server_error() {
    let mut store = FlakyStore::new().await;
    store.topic_fault = Some(Fault::Stall);
    let (app, token) = flaky_app(store, 1).await;

    let (status, _) =
      call(&app, "POST", "/topics", Some(&token), Some(json!({ "name": "rust" }))).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(status.is_server_error());
  }

  #[tokio::test]
  async fn failing_store_is_a_generic_500() {
    let mut store = FlakyStore::new().await;
    store.topic_fault = Some(Fault::Fail);
    let (app, token) = flaky_app(store, 30).await;

    let (status, body) =
      call(&app, "POST", "/topics", Some(&token), Some(json!({ "name": "rust" }))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "internal server error");
  }

  // ── Topics & feed ───────────────────────────────────────────────────────────

  #[tokio::test]
  async fn topics_are_public_to_read_and_private_to_write() {
    let (app, _) = app().await;
    let (_, token) = sign_up(&app, "Alice").await;

    let rust = json!({ "name": "rust" });
    let (status, _) = call(&app, "POST", "/topics", None, Some(rust.clone())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = call(&app, "POST", "/topics", Some(&token), Some(rust.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = call(&app, "POST", "/topics", Some(&token), Some(rust)).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = call(&app, "GET", "/topics", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["name"], "rust");

    let (status, _) = call(&app, "POST", "/topics/77/select", Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
  }

  #[tokio::test]
  async fn feed_is_followed_then_topical() {
    let (app, store) = app().await;
    let (_, alice_token) = sign_up(&app, "Alice").await;
    let (bob, bob_token) = sign_up(&app, "Bob").await;
    let (carol, carol_token) = sign_up(&app, "Carol").await;
    grant(&store, bob, RightKind::Tweet).await;
    grant(&store, carol, RightKind::Tweet).await;

    let (_, topic) =
      call(&app, "POST", "/topics", Some(&alice_token), Some(json!({ "name": "rust" }))).await;
    let topic_id = topic["id"].as_i64().unwrap();

    call(&app, "POST", "/tweets", Some(&bob_token), Some(json!({ "body": "from bob" }))).await;
    call(
      &app,
      "POST",
      "/tweets",
      Some(&carol_token),
      Some(json!({ "body": "carol on rust", "topic_id": topic_id })),
    )
    .await;

    let (_, empty) = call(&app, "GET", "/feed", Some(&alice_token), None).await;
    assert_eq!(empty, json!([]));

    call(&app, "POST", "/follows", Some(&alice_token), Some(json!({ "followee_id": bob }))).await;
    let select = format!("/topics/{topic_id}/select");
    let (status, _) = call(&app, "POST", &select, Some(&alice_token), None).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, feed) = call(&app, "GET", "/feed", Some(&alice_token), None).await;
    assert_eq!(status, StatusCode::OK);
    let bodies: Vec<&str> = feed
      .as_array()
      .unwrap()
      .iter()
      .map(|t| t["body"].as_str().unwrap())
      .collect();
    assert_eq!(bodies, ["from bob", "carol on rust"]);
  }
}
