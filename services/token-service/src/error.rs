//! Startup errors
//!
//! Per-request failures never reach this type: handlers turn
//! `session::Error` into a JSON error response directly.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("user store unavailable: {0}")]
    StoreUnavailable(#[source] user_store::Error),

    #[error("failed to seed user store: {0}")]
    Seed(#[source] user_store::Error),

    #[error("invalid hashing configuration: {0}")]
    Hashing(#[source] token_auth::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
