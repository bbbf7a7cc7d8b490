//! Configuration types and loading
//!
//! Config precedence: CLI args > env vars > config file > defaults.
//! The signing key is loaded from the TOKEN_SECRET_KEY env var or from
//! `tokens.secret_key_file`, never from the TOML directly.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use common::Secret;
use serde::Deserialize;
use session::SessionConfig;

/// Upper bound for either token lifetime (100 years).
const MAX_TTL_SECS: u64 = 100 * 365 * 24 * 3600;

/// Root configuration
#[derive(Debug, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    #[serde(default)]
    pub tokens: TokensConfig,
    pub store: StoreConfig,
    #[serde(default)]
    pub hashing: HashingConfig,
}

/// HTTP listener settings
#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    pub listen_addr: SocketAddr,
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,
}

/// Token lifetimes and signing key source
#[derive(Debug, Deserialize)]
pub struct TokensConfig {
    #[serde(skip, default = "empty_secret")]
    pub secret_key: Secret<String>,
    /// Path to a file holding the signing key (alternative to TOKEN_SECRET_KEY)
    #[serde(default)]
    pub secret_key_file: Option<PathBuf>,
    #[serde(default = "default_access_ttl")]
    pub access_ttl_secs: u64,
    #[serde(default = "default_refresh_ttl")]
    pub refresh_ttl_secs: u64,
}

/// User store location and startup seeding
#[derive(Debug, Deserialize)]
pub struct StoreConfig {
    pub path: PathBuf,
    /// Wipe the store and insert a single fresh user on startup
    #[serde(default)]
    pub seed_on_start: bool,
}

/// Argon2id cost for refresh token hashes
#[derive(Debug, Clone, Deserialize)]
pub struct HashingConfig {
    #[serde(default = "default_memory_kib")]
    pub memory_kib: u32,
    #[serde(default = "default_iterations")]
    pub iterations: u32,
    #[serde(default = "default_parallelism")]
    pub parallelism: u32,
}

impl Default for TokensConfig {
    fn default() -> Self {
        Self {
            secret_key: empty_secret(),
            secret_key_file: None,
            access_ttl_secs: default_access_ttl(),
            refresh_ttl_secs: default_refresh_ttl(),
        }
    }
}

impl Default for HashingConfig {
    fn default() -> Self {
        Self {
            memory_kib: default_memory_kib(),
            iterations: default_iterations(),
            parallelism: default_parallelism(),
        }
    }
}

fn empty_secret() -> Secret<String> {
    Secret::new(String::new())
}

fn default_max_connections() -> usize {
    1000
}

fn default_access_ttl() -> u64 {
    10 * 60
}

fn default_refresh_ttl() -> u64 {
    30 * 24 * 3600
}

fn default_memory_kib() -> u32 {
    19 * 1024
}

fn default_iterations() -> u32 {
    2
}

fn default_parallelism() -> u32 {
    1
}

impl Config {
    /// Load configuration from a TOML file, then overlay environment variables.
    ///
    /// Signing key resolution order:
    /// 1. TOKEN_SECRET_KEY env var
    /// 2. secret_key_file path from config
    pub fn load(path: &Path) -> common::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&contents)?;

        validate_ttl("access_ttl_secs", config.tokens.access_ttl_secs)?;
        validate_ttl("refresh_ttl_secs", config.tokens.refresh_ttl_secs)?;

        if config.server.max_connections == 0 {
            return Err(common::Error::Config(
                "max_connections must be greater than 0".into(),
            ));
        }

        if let Ok(key) = std::env::var("TOKEN_SECRET_KEY") {
            config.tokens.secret_key = Secret::new(key);
        } else if let Some(ref key_file) = config.tokens.secret_key_file {
            let key = std::fs::read_to_string(key_file).map_err(|e| {
                common::Error::Config(format!(
                    "failed to read secret_key_file {}: {e}",
                    key_file.display()
                ))
            })?;
            config.tokens.secret_key = Secret::new(key.trim().to_owned());
        }

        if config.tokens.secret_key.is_blank() {
            return Err(common::Error::Config(
                "signing key is not set: provide TOKEN_SECRET_KEY or tokens.secret_key_file"
                    .into(),
            ));
        }

        Ok(config)
    }

    /// Resolve config file path from CLI arg or CONFIG_PATH env var.
    pub fn resolve_path(cli_path: Option<&str>) -> PathBuf {
        if let Some(p) = cli_path {
            return PathBuf::from(p);
        }
        if let Ok(p) = std::env::var("CONFIG_PATH") {
            return PathBuf::from(p);
        }
        PathBuf::from("token-service.toml")
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            secret_key: self.tokens.secret_key.clone(),
            access_ttl: Duration::from_secs(self.tokens.access_ttl_secs),
            refresh_ttl: Duration::from_secs(self.tokens.refresh_ttl_secs),
        }
    }
}

fn validate_ttl(name: &str, secs: u64) -> common::Result<()> {
    if secs == 0 || secs > MAX_TTL_SECS {
        return Err(common::Error::Config(format!(
            "{name} must be between 1 and {MAX_TTL_SECS}, got {secs}"
        )));
    }
    Ok(())
}
