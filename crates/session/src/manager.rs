//! Session manager: issue, authenticate and rotate token pairs
//!
//! The stored refresh token hash is the only shared mutable state. Issue and
//! renewal for the same subject are serialized by a per-subject async lock
//! held from the user lookup through the hash write, so two renewals racing
//! with the same refresh token cannot both succeed. Subjects never contend
//! with each other.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, SystemTime};

use common::Secret;
use token_auth::{AccessToken, CredentialHasher, refresh};
use tracing::{debug, info, warn};
use user_store::{User, UserStore};

use crate::error::{Error, Result};

/// Token lifetimes and the signing key.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub secret_key: Secret<String>,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
}

/// A freshly issued access/refresh pair, returned to the caller once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

pub struct SessionManager<S> {
    store: Arc<S>,
    config: SessionConfig,
    hasher: CredentialHasher,
    subject_locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl<S: UserStore> SessionManager<S> {
    pub fn new(store: Arc<S>, config: SessionConfig, hasher: CredentialHasher) -> Self {
        info!(
            access_ttl_secs = config.access_ttl.as_secs(),
            refresh_ttl_secs = config.refresh_ttl.as_secs(),
            "session manager initialized"
        );
        Self {
            store,
            config,
            hasher,
            subject_locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Issue a new pair for an existing user, replacing any live refresh token.
    pub async fn issue(&self, user_id: &str) -> Result<TokenPair> {
        if user_id.is_empty() {
            return Err(Error::MissingCredential("user id"));
        }

        let lock = self.subject_lock(user_id);
        let _guard = lock.lock().await;

        self.store.find_by_id(user_id).await?;
        let pair = self.rotate(user_id).await?;

        metrics::counter!("tokens_issued_total", "reason" => "login").increment(1);
        info!(user_id, "issued token pair");
        Ok(pair)
    }

    /// Check an access token presented for a protected action.
    ///
    /// Unlike `AccessToken::verify`, this also rejects expired tokens and
    /// tokens whose subject no longer exists.
    pub async fn authenticate(&self, access_token: &str) -> Result<AccessToken> {
        if access_token.is_empty() {
            return Err(Error::MissingCredential("access token"));
        }

        let token = AccessToken::verify(access_token, self.config.secret_key.expose())?;
        if token.is_expired_at(SystemTime::now()) {
            debug!(user_id = token.subject(), "access token expired");
            return Err(Error::CredentialExpired("access token"));
        }

        self.store.find_by_id(token.subject()).await?;
        Ok(token)
    }

    /// Exchange a verified access token and the user's live refresh token
    /// for a new pair.
    ///
    /// The access token may already be expired; only its signature matters
    /// here. On success the presented refresh token stops working.
    pub async fn renew(&self, access_token: &str, refresh_token: &str) -> Result<TokenPair> {
        if access_token.is_empty() {
            return Err(Error::MissingCredential("access token"));
        }
        let token = AccessToken::verify(access_token, self.config.secret_key.expose())?;
        let user_id = token.subject();

        if refresh_token.is_empty() {
            return Err(Error::MissingCredential("refresh token"));
        }
        let refresh_expires = refresh::expiration_of(refresh_token)?;
        if refresh_expires < SystemTime::now() {
            debug!(user_id, "refresh token expired");
            return Err(Error::CredentialExpired("refresh token"));
        }

        let lock = self.subject_lock(user_id);
        let _guard = lock.lock().await;

        let user = self.store.find_by_id(user_id).await?;
        let hasher = self.hasher.clone();
        let presented = refresh_token.to_owned();
        let matches =
            run_blocking(move || hasher.verify(&presented, &user.refresh_token_hash)).await?;
        if !matches {
            warn!(user_id, "refresh token does not match stored hash");
            return Err(Error::CredentialMismatch);
        }

        let pair = self.rotate(user_id).await?;

        metrics::counter!("tokens_issued_total", "reason" => "renewal").increment(1);
        info!(user_id, "renewed token pair");
        Ok(pair)
    }

    pub async fn list_users(&self) -> Result<Vec<User>> {
        Ok(self.store.find_all().await?)
    }

    /// Mint a pair for `user_id` and persist the new refresh token hash.
    /// Callers hold the subject lock.
    async fn rotate(&self, user_id: &str) -> Result<TokenPair> {
        let now = SystemTime::now();
        let access_token = AccessToken::mint(user_id, now, self.config.access_ttl)
            .to_signed_string(self.config.secret_key.expose())?;
        let refresh_token = refresh::mint(&access_token, now + self.config.refresh_ttl)?;
        let hasher = self.hasher.clone();
        let plaintext = refresh_token.clone();
        let hash = run_blocking(move || hasher.hash(&plaintext)).await??;

        self.store.update_refresh_hash(user_id, hash).await?;

        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }

    /// Lock shared by every issue/renewal of `user_id`.
    ///
    /// Entries nobody holds or waits on are dropped on each call so the map
    /// stays bounded by the number of in-flight subjects.
    fn subject_lock(&self, user_id: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self
            .subject_locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        locks.entry(user_id.to_string()).or_default().clone()
    }
}

/// Run Argon2 work on the blocking pool.
async fn run_blocking<T, F>(work: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| Error::Token(token_auth::Error::Hash(format!("hashing task failed: {e}"))))
}
