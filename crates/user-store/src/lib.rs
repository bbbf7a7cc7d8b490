//! User record persistence
//!
//! The token protocol only needs a handful of operations on user records,
//! expressed by the `UserStore` trait. `FileUserStore` keeps the records in
//! a JSON document file and is what the service runs with.

pub mod error;
pub mod file;

use std::future::Future;

use serde::{Deserialize, Serialize};

pub use error::{Error, Result};
pub use file::FileUserStore;

/// A user document.
///
/// `refresh_token_hash` holds the salted hash of the user's only live
/// refresh token, or an empty string before the first issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub refresh_token_hash: String,
}

impl User {
    /// New user with a random UUID and no refresh token.
    pub fn new() -> Self {
        Self::with_id(uuid::Uuid::new_v4().simple().to_string())
    }

    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            refresh_token_hash: String::new(),
        }
    }

    pub fn has_refresh_token(&self) -> bool {
        !self.refresh_token_hash.is_empty()
    }
}

impl Default for User {
    fn default() -> Self {
        Self::new()
    }
}

/// Operations the token protocol and the bootstrap perform on user records.
pub trait UserStore: Send + Sync {
    /// Fetch one user. Unknown ids fail with `Error::NotFound`.
    fn find_by_id(&self, id: &str) -> impl Future<Output = Result<User>> + Send;

    /// Replace the stored refresh token hash. Unknown ids fail with `Error::NotFound`.
    fn update_refresh_hash(&self, id: &str, hash: String)
    -> impl Future<Output = Result<()>> + Send;

    fn find_all(&self) -> impl Future<Output = Result<Vec<User>>> + Send;

    fn clear_all(&self) -> impl Future<Output = Result<()>> + Send;

    /// Insert a user, replacing any record with the same id.
    fn insert(&self, user: User) -> impl Future<Output = Result<()>> + Send;
}
