//! Identity plumbing for Chirp: password credentials, signed session tokens,
//! and resolution of a presented token to a hydrated identity.
//!
//! Tokens are stateless. Nothing is stored server-side, so a token stays valid
//! until it expires; there is no revocation.

pub mod credential;
pub mod error;
pub mod session;
pub mod token;

pub use error::{Error, Result};
pub use session::SessionResolver;
pub use token::TokenService;
