//! Password credentials: salted argon2id hashes in PHC string form.
//!
//! Both operations run on tokio's blocking pool so a slow hash never stalls
//! the request-handling threads.

use argon2::{
  Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
  password_hash::SaltString,
};
use rand_core::OsRng;
use tokio::sync::OnceCell;

use crate::{Error, Result};

/// A credential nobody owns, derived on first use.
static DECOY: OnceCell<String> = OnceCell::const_new();

/// Derive a credential from `secret` with a fresh random salt.
///
/// Two calls with the same secret give different strings; both verify.
pub async fn hash(secret: &str) -> Result<String> {
  let secret = secret.to_owned();
  tokio::task::spawn_blocking(move || derive(&secret)).await?
}

/// Check `secret` against a stored credential.
///
/// A malformed credential, or a verifier task that dies, is a mismatch.
pub async fn verify(secret: &str, credential: &str) -> bool {
  let secret = secret.to_owned();
  let credential = credential.to_owned();
  tokio::task::spawn_blocking(move || matches(&secret, &credential))
    .await
    .unwrap_or(false)
}

/// Do the work of [`verify`] for an account that does not exist, so a
/// missing account costs as much as a wrong password.
pub async fn verify_decoy(secret: &str) {
  match DECOY.get_or_try_init(|| hash("chirp-decoy-credential")).await {
    Ok(decoy) => {
      verify(secret, decoy).await;
    }
    Err(e) => tracing::warn!(error = %e, "could not derive decoy credential"),
  }
}

fn derive(secret: &str) -> Result<String> {
  let salt = SaltString::generate(&mut OsRng);
  Ok(
    Argon2::default()
      .hash_password(secret.as_bytes(), &salt)
      .map_err(|e| Error::Hash(e.to_string()))?
      .to_string(),
  )
}

fn matches(secret: &str, credential: &str) -> bool {
  let Ok(parsed) = PasswordHash::new(credential) else {
    return false;
  };
  Argon2::default()
    .verify_password(secret.as_bytes(), &parsed)
    .is_ok()
}
