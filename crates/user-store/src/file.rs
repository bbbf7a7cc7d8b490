//! JSON document file backing for user records
//!
//! The whole collection lives in memory behind a tokio Mutex and is written
//! back on every mutation with temp-file + rename, so a crash never leaves a
//! half-written file. The file maps user ids to their documents. Mutations
//! are staged on a copy and only become visible once the write succeeds.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::{User, UserStore};

/// Single-writer store: every mutation rewrites the whole file while holding
/// one store-wide lock, so writes for different users queue behind each other.
pub struct FileUserStore {
    path: PathBuf,
    users: Mutex<BTreeMap<String, User>>,
}

impl FileUserStore {
    /// Load users from `path`, creating an empty collection file if absent.
    pub async fn load(path: PathBuf) -> Result<Self> {
        let users = if path.exists() {
            let contents = tokio::fs::read_to_string(&path)
                .await
                .map_err(|e| Error::Io(format!("reading user store: {e}")))?;
            let users: BTreeMap<String, User> = serde_json::from_str(&contents)
                .map_err(|e| Error::Parse(format!("parsing user store: {e}")))?;
            info!(path = %path.display(), users = users.len(), "loaded user store");
            users
        } else {
            info!(path = %path.display(), "user store not found, starting empty");
            let users = BTreeMap::new();
            write_atomic(&path, &users).await?;
            users
        };

        Ok(Self {
            path,
            users: Mutex::new(users),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn len(&self) -> usize {
        self.users.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Apply `mutate` to a copy of the collection, persist the copy, then
    /// publish it. A failed write leaves the in-memory state untouched.
    async fn commit<F>(&self, mutate: F) -> Result<()>
    where
        F: FnOnce(&mut BTreeMap<String, User>) -> Result<()>,
    {
        let mut users = self.users.lock().await;
        let mut staged = users.clone();
        mutate(&mut staged)?;
        write_atomic(&self.path, &staged).await?;
        *users = staged;
        Ok(())
    }
}

impl UserStore for FileUserStore {
    async fn find_by_id(&self, id: &str) -> Result<User> {
        let users = self.users.lock().await;
        users
            .get(id)
            .cloned()
            .ok_or_else(|| Error::NotFound(id.to_string()))
    }

    async fn update_refresh_hash(&self, id: &str, hash: String) -> Result<()> {
        self.commit(|users| {
            let user = users
                .get_mut(id)
                .ok_or_else(|| Error::NotFound(id.to_string()))?;
            user.refresh_token_hash = hash;
            Ok(())
        })
        .await?;
        debug!(user_id = id, "updated refresh token hash");
        Ok(())
    }

    async fn find_all(&self) -> Result<Vec<User>> {
        let users = self.users.lock().await;
        Ok(users.values().cloned().collect())
    }

    async fn clear_all(&self) -> Result<()> {
        let mut removed = 0;
        self.commit(|users| {
            removed = users.len();
            users.clear();
            Ok(())
        })
        .await?;
        debug!(removed, "cleared user store");
        Ok(())
    }

    async fn insert(&self, user: User) -> Result<()> {
        let user_id = user.id.clone();
        self.commit(|users| {
            users.insert(user.id.clone(), user);
            Ok(())
        })
        .await?;
        debug!(user_id, "inserted user");
        Ok(())
    }
}

/// Write the collection to `path` atomically with 0600 permissions, since
/// the file holds refresh token hashes.
async fn write_atomic(path: &Path, users: &BTreeMap<String, User>) -> Result<()> {
    let json = serde_json::to_string_pretty(users)
        .map_err(|e| Error::Parse(format!("serializing user store: {e}")))?;

    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        Some(_) => Path::new("."),
        None => return Err(Error::Io("user store path has no parent directory".into())),
    };

    let name = path
        .file_name()
        .ok_or_else(|| Error::Io("user store path has no file name".into()))?
        .to_string_lossy();
    let tmp_path = dir.join(format!(".{name}.tmp.{}", std::process::id()));

    tokio::fs::write(&tmp_path, json.as_bytes())
        .await
        .map_err(|e| Error::Io(format!("writing temp user store: {e}")))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o600);
        tokio::fs::set_permissions(&tmp_path, perms)
            .await
            .map_err(|e| Error::Io(format!("setting user store permissions: {e}")))?;
    }

    tokio::fs::rename(&tmp_path, path)
        .await
        .map_err(|e| Error::Io(format!("renaming temp user store: {e}")))?;

    debug!(path = %path.display(), "persisted user store");
    Ok(())
}
