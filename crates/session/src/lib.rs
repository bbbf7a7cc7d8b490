//! Token issue, authentication and rotation
//!
//! `SessionManager` ties the token primitives to the user store. It is
//! handed its store explicitly and holds no global state.
//!
//! Rotation protocol (`SessionManager::renew`):
//! 1. Verify the access token signature (expiration is not checked)
//! 2. Require a refresh token and reject it once its embedded expiration passes
//! 3. Under the subject's renewal lock, load the user record
//! 4. Compare the refresh token against the stored salted hash
//! 5. Mint a new pair and overwrite the stored hash, invalidating the old token

pub mod error;
pub mod manager;

pub use error::{Error, Result};
pub use manager::{SessionConfig, SessionManager, TokenPair};
