//! Byte/text codec shared by both token types
//!
//! Tokens travel as padded URL-safe base64. Decoding strips trailing NUL
//! bytes so that values produced by older fixed-buffer decoders compare
//! equal; a payload can therefore never meaningfully end in `0x00`.

use std::sync::{LazyLock, Mutex, PoisonError};

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE;
use rand::rngs::StdRng;
use rand::{RngExt, SeedableRng};

use crate::constants::NONCE_ALPHABET;

pub use base64::DecodeError;

/// Process-wide generator for nonces. Locked for the length of one string.
static NONCE_RNG: LazyLock<Mutex<StdRng>> =
    LazyLock::new(|| Mutex::new(StdRng::from_rng(&mut rand::rng())));

/// Encode bytes as padded base64url. Output length is `4 * ceil(n / 3)`.
pub fn encode(bytes: &[u8]) -> String {
    URL_SAFE.encode(bytes)
}

/// Decode padded base64url, then drop trailing NUL bytes.
pub fn decode(text: &str) -> Result<Vec<u8>, DecodeError> {
    let mut bytes = URL_SAFE.decode(text)?;
    let end = bytes.iter().rposition(|&b| b != 0).map_or(0, |i| i + 1);
    bytes.truncate(end);
    Ok(bytes)
}

/// `left || separator || right`
pub fn concat(left: &[u8], right: &[u8], separator: u8) -> Vec<u8> {
    let mut joined = Vec::with_capacity(left.len() + right.len() + 1);
    joined.extend_from_slice(left);
    joined.push(separator);
    joined.extend_from_slice(right);
    joined
}

/// Random string of exactly `length` alphanumeric characters.
///
/// Characters are drawn uniformly with replacement from the 62-character
/// alphabet in `NONCE_ALPHABET`.
pub fn random_string(length: usize) -> String {
    if length == 0 {
        return String::new();
    }

    // Poisoning leaves the generator in a valid state.
    let mut rng = NONCE_RNG.lock().unwrap_or_else(PoisonError::into_inner);
    (0..length)
        .map(|_| char::from(NONCE_ALPHABET[rng.random_range(0..NONCE_ALPHABET.len())]))
        .collect()
}
