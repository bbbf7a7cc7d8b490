//! Process bootstrap: open the user store and build the session manager

use std::sync::Arc;

use session::SessionManager;
use token_auth::CredentialHasher;
use tracing::info;
use user_store::{FileUserStore, User, UserStore};

use crate::config::Config;
use crate::error::{Error, Result};

/// Open the user store, optionally wiping it and inserting one fresh user.
pub async fn open_store(config: &Config) -> Result<FileUserStore> {
    let store = FileUserStore::load(config.store.path.clone())
        .await
        .map_err(Error::StoreUnavailable)?;

    if config.store.seed_on_start {
        store.clear_all().await.map_err(Error::Seed)?;
        let user = User::new();
        let user_id = user.id.clone();
        store.insert(user).await.map_err(Error::Seed)?;
        info!(user_id, "seeded user store");
    }

    Ok(store)
}

/// Build the session manager the handlers share.
pub fn build_sessions(
    config: &Config,
    store: FileUserStore,
) -> Result<Arc<SessionManager<FileUserStore>>> {
    let hashing = &config.hashing;
    let hasher =
        CredentialHasher::new(hashing.memory_kib, hashing.iterations, hashing.parallelism)
            .map_err(Error::Hashing)?;

    Ok(Arc::new(SessionManager::new(
        Arc::new(store),
        config.session_config(),
        hasher,
    )))
}
