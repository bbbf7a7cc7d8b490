//! Access and refresh token primitives
//!
//! Builds, signs, parses and verifies the two token types handed to API
//! callers, and hashes refresh tokens for storage. Everything here is pure
//! and synchronous; persistence and the rotation sequence live in the
//! `session` crate.
//!
//! Token flow:
//! 1. `AccessToken::mint()` builds claims for a subject
//! 2. `AccessToken::to_signed_string()` produces `header.payload.signature`
//! 3. `refresh::mint()` binds a refresh token to that signed string
//! 4. `CredentialHasher::hash()` produces the value persisted for the user
//! 5. On later requests `AccessToken::verify()` and `refresh::expiration_of()`
//!    re-derive the tokens from the strings the caller presents

pub mod access;
pub mod clock;
pub mod codec;
pub mod constants;
pub mod error;
pub mod hash;
pub mod refresh;

pub use access::{AccessToken, Claims, Header};
pub use error::{Error, ParseError, Result};
pub use hash::CredentialHasher;
