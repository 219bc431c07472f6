//! Signed, time-limited session tokens (HS256 JWTs).

use chrono::{DateTime, Duration, Utc};
use chirp_core::identity::IdentityId;
use jsonwebtoken::{
  Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode,
};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// How long a freshly issued token stays valid, in hours.
pub const TOKEN_LIFETIME_HOURS: i64 = 24;

/// [`TOKEN_LIFETIME_HOURS`] as a duration.
pub fn token_lifetime() -> Duration { Duration::hours(TOKEN_LIFETIME_HOURS) }

/// The payload carried inside every token.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Claims {
  /// The identity the token speaks for.
  id:  IdentityId,
  /// Issued-at (Unix timestamp, seconds).
  iat: i64,
  /// Expiry (Unix timestamp, seconds).
  exp: i64,
}

/// Issues and verifies session tokens with one process-wide secret.
///
/// Built once at startup; cheap to share behind an `Arc`.
pub struct TokenService {
  encoding:   EncodingKey,
  decoding:   DecodingKey,
  validation: Validation,
}

impl TokenService {
  /// Build the service from the configured signing secret.
  ///
  /// An empty secret is refused; there is no fallback.
  pub fn new(secret: &str) -> Result<Self> {
    if secret.is_empty() {
      return Err(Error::EmptySecret);
    }
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;
    Ok(Self {
      encoding: EncodingKey::from_secret(secret.as_bytes()),
      decoding: DecodingKey::from_secret(secret.as_bytes()),
      validation,
    })
  }

  /// Issue a token for `id`, valid for [`TOKEN_LIFETIME_HOURS`] from now.
  pub fn issue(&self, id: IdentityId) -> Result<String> {
    self.issue_at(id, Utc::now())
  }

  /// Issue a token as if it were minted at `issued_at`.
  pub fn issue_at(&self, id: IdentityId, issued_at: DateTime<Utc>) -> Result<String> {
    let claims = Claims {
      id,
      iat: issued_at.timestamp(),
      exp: (issued_at + token_lifetime()).timestamp(),
    };
    Ok(encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?)
  }

  /// The identity a token speaks for, or `None` if the token is malformed,
  /// forged, signed with another secret, or expired.
  pub fn verify(&self, token: &str) -> Option<IdentityId> {
    match decode::<Claims>(token, &self.decoding, &self.validation) {
      Ok(data) => Some(data.claims.id),
      Err(e) => {
        tracing::debug!(error = %e, "rejected session token");
        None
      }
    }
  }
}
