//! Fixed token format values
//!
//! A single signing algorithm is supported, so the header never varies.

/// `alg` header value. The signature is SHA-512 over `unsigned || key`.
pub const ALGORITHM: &str = "sha512";

/// `type` header value.
pub const TOKEN_TYPE: &str = "JWT";

/// Byte joining the segments of both token types.
pub const SEPARATOR: u8 = b'.';

/// Length of the random nonce at the start of a refresh token.
pub const NONCE_LEN: usize = 8;

/// Number of trailing access token characters copied into a refresh token.
pub const FRAGMENT_LEN: usize = 6;

/// Characters used for refresh token nonces.
pub const NONCE_ALPHABET: &[u8; 62] =
    b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
