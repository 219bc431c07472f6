//! Session resolution: presented token → hydrated identity, or nobody.

use std::sync::Arc;

use chirp_core::{Error, identity::IdentityGraph, store::SocialStore};

use crate::token::TokenService;

/// Maps inbound tokens to identities using an injected store.
///
/// Every "nobody" outcome looks the same to the caller: a missing header, a
/// malformed or expired token and a token for a deleted identity all come
/// back as `Ok(None)`. `Err` is reserved for the store failing.
pub struct SessionResolver<S> {
  store:  Arc<S>,
  tokens: Arc<TokenService>,
}

impl<S> Clone for SessionResolver<S> {
  fn clone(&self) -> Self {
    Self { store: Arc::clone(&self.store), tokens: Arc::clone(&self.tokens) }
  }
}

impl<S: SocialStore> SessionResolver<S> {
  pub fn new(store: Arc<S>, tokens: Arc<TokenService>) -> Self {
    Self { store, tokens }
  }

  pub fn tokens(&self) -> &TokenService { &self.tokens }

  /// Resolve a raw token.
  pub async fn resolve(&self, token: &str) -> Result<Option<IdentityGraph>, Error> {
    let Some(id) = self.tokens.verify(token) else {
      return Ok(None);
    };
    let graph = self
      .store
      .load_identity_graph(id)
      .await
      .map_err(Into::<Error>::into)?;
    if graph.is_none() {
      tracing::debug!(identity = id, "valid token for an identity that no longer exists");
    }
    Ok(graph)
  }

  /// Resolve the value of an `Authorization` header, if any.
  ///
  /// Accepts `Bearer <token>` or the bare token.
  pub async fn resolve_header(
    &self,
    header: Option<&str>,
  ) -> Result<Option<IdentityGraph>, Error> {
    let Some(raw) = header else {
      return Ok(None);
    };
    let raw = raw.trim();
    let token = raw.strip_prefix("Bearer ").unwrap_or(raw).trim();
    if token.is_empty() {
      return Ok(None);
    }
    self.resolve(token).await
  }
}
