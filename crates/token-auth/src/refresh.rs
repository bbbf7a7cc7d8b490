//! Refresh tokens
//!
//! A refresh token is `base64url(nonce.fragment.expires)`: an 8-character
//! random nonce, the last 6 characters of the signed access token it was
//! issued with, and its own expiration in unix seconds. It carries no
//! signature. Authenticity comes from comparing it against the salted hash
//! stored for the user.

use std::time::SystemTime;

use crate::clock;
use crate::codec;
use crate::constants::{FRAGMENT_LEN, NONCE_LEN, SEPARATOR};
use crate::error::{Error, ParseError, Result};

/// Mint a refresh token bound to `signed_access_token`, expiring at `expires_at`.
///
/// The access token must be at least `FRAGMENT_LEN` characters long. The
/// fragment is counted in characters, not bytes.
pub fn mint(signed_access_token: &str, expires_at: SystemTime) -> Result<String> {
    let fragment = signed_access_token
        .char_indices()
        .rev()
        .nth(FRAGMENT_LEN - 1)
        .map(|(start, _)| &signed_access_token[start..])
        .ok_or_else(|| Error::AccessTokenTooShort(signed_access_token.chars().count()))?;

    let separator = char::from(SEPARATOR);
    let payload = format!(
        "{nonce}{separator}{fragment}{separator}{expires}",
        nonce = codec::random_string(NONCE_LEN),
        expires = clock::unix_seconds(expires_at),
    );
    Ok(codec::encode(payload.as_bytes()))
}

/// Extract the expiration instant from a refresh token.
///
/// Only the structure and the timestamp are checked; the nonce and the
/// access token fragment are left to the stored-hash comparison.
pub fn expiration_of(token: &str) -> std::result::Result<SystemTime, ParseError> {
    let decoded = codec::decode(token)?;
    let decoded = String::from_utf8_lossy(&decoded);

    let parts: Vec<&str> = decoded.split(char::from(SEPARATOR)).collect();
    let [_nonce, _fragment, expires] = parts[..] else {
        return Err(ParseError::WrongPartCount(parts.len()));
    };

    let seconds: i64 = expires.parse().map_err(|e| {
        ParseError::MalformedPayload(format!("refresh token expiration {expires:?}: {e}"))
    })?;
    clock::from_unix_seconds(seconds).ok_or_else(|| {
        ParseError::MalformedPayload(format!("refresh token expiration out of range: {seconds}"))
    })
}
