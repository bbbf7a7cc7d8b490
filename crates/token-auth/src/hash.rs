//! Salted one-way hashing of refresh tokens
//!
//! Only the Argon2id PHC string of a refresh token is ever persisted. Each
//! hash absorbs a fresh random salt, and verification compares in constant
//! time.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use tracing::debug;

use crate::error::{Error, Result};

/// Argon2id hasher with configurable cost.
#[derive(Debug, Clone)]
pub struct CredentialHasher {
    params: Params,
}

impl CredentialHasher {
    /// Build a hasher with explicit cost parameters.
    ///
    /// `memory_kib` must be at least `8 * parallelism`.
    pub fn new(memory_kib: u32, iterations: u32, parallelism: u32) -> Result<Self> {
        let params = Params::new(memory_kib, iterations, parallelism, None)
            .map_err(|e| Error::Hash(format!("invalid argon2 parameters: {e}")))?;
        Ok(Self { params })
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    /// Hash `plaintext` with a new random salt.
    pub fn hash(&self, plaintext: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2()
            .hash_password(plaintext.as_bytes(), &salt)
            .map_err(|e| Error::Hash(e.to_string()))?;
        Ok(hash.to_string())
    }

    /// Check `plaintext` against a stored PHC string.
    ///
    /// An empty or unparseable stored value never matches.
    pub fn verify(&self, plaintext: &str, stored: &str) -> bool {
        let parsed = match PasswordHash::new(stored) {
            Ok(parsed) => parsed,
            Err(e) => {
                debug!(error = %e, "stored credential hash is not a PHC string");
                return false;
            }
        };
        self.argon2()
            .verify_password(plaintext.as_bytes(), &parsed)
            .is_ok()
    }
}

impl Default for CredentialHasher {
    fn default() -> Self {
        Self {
            params: Params::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cheap() -> CredentialHasher {
        CredentialHasher::new(8, 1, 1).unwrap()
    }

    #[test]
    fn hash_verifies_original_plaintext() {
        let hasher = cheap();
        let hash = hasher.hash("cmVmcmVzaA==").unwrap();
        assert!(hash.starts_with("$argon2id$"), "got: {hash}");
        assert!(hasher.verify("cmVmcmVzaA==", &hash));
    }

    #[test]
    fn hash_rejects_other_plaintext() {
        let hasher = cheap();
        let hash = hasher.hash("token-one").unwrap();
        assert!(!hasher.verify("token-two", &hash));
    }

    #[test]
    fn hashes_are_salted() {
        let hasher = cheap();
        let a = hasher.hash("same").unwrap();
        let b = hasher.hash("same").unwrap();
        assert_ne!(a, b, "two hashes of the same value must use different salts");
        assert!(hasher.verify("same", &a));
        assert!(hasher.verify("same", &b));
    }

    #[test]
    fn empty_or_garbage_stored_hash_never_matches() {
        let hasher = cheap();
        assert!(!hasher.verify("anything", ""));
        assert!(!hasher.verify("anything", "not-a-phc-string"));
    }

    #[test]
    fn verification_uses_parameters_from_stored_hash() {
        let hash = cheap().hash("value").unwrap();
        let other = CredentialHasher::new(16, 2, 1).unwrap();
        assert!(other.verify("value", &hash));
    }

    #[test]
    fn invalid_parameters_are_rejected() {
        let err = CredentialHasher::new(1, 1, 1).unwrap_err();
        assert!(matches!(err, Error::Hash(_)));
    }
}
