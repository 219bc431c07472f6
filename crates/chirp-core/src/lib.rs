//! Core types and trait definitions for the Chirp backend.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! All other crates depend on it; it depends on nothing proprietary.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod content;
pub mod error;
pub mod feed;
pub mod identity;
pub mod notification;
pub mod sample;
pub mod social;
pub mod store;

pub use error::{Error, ErrorKind, Result};
