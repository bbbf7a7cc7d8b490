//! Redacting wrapper for key material

use std::fmt;
use zeroize::Zeroize;

/// Sensitive value such as the token signing key.
///
/// Prints as `[REDACTED]` through both `Debug` and `Display`, and wipes the
/// inner value when dropped.
pub struct Secret<T: Zeroize>(T);

impl<T: Zeroize> Secret<T> {
    pub fn new(value: T) -> Self {
        Self(value)
    }

    /// Borrow the inner value. Never log the result.
    pub fn expose(&self) -> &T {
        &self.0
    }
}

impl Secret<String> {
    /// Whether the wrapped key is empty or whitespace only.
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl<T: Zeroize> From<T> for Secret<T> {
    fn from(value: T) -> Self {
        Self::new(value)
    }
}

impl<T: Zeroize> fmt::Debug for Secret<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED]")
    }
}

impl<T: Zeroize> fmt::Display for Secret<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED]")
    }
}

impl<T: Zeroize> Drop for Secret<T> {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

impl<T: Zeroize + Clone> Clone for Secret<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signing_key_is_redacted_in_logs() {
        let key = Secret::new(String::from("SECRET_KEY"));
        assert_eq!(format!("{key:?}"), "[REDACTED]");
        assert_eq!(format!("{key}"), "[REDACTED]");
    }

    #[test]
    fn expose_returns_inner_key() {
        let key: Secret<String> = String::from("SECRET_KEY").into();
        assert_eq!(key.expose(), "SECRET_KEY");
    }

    #[test]
    fn blank_detection_ignores_whitespace() {
        assert!(Secret::new(String::from("  \n")).is_blank());
        assert!(Secret::new(String::new()).is_blank());
        assert!(!Secret::new(String::from("k")).is_blank());
    }

    #[test]
    fn clone_keeps_value() {
        let key = Secret::new(String::from("abc"));
        let copy = key.clone();
        drop(key);
        assert_eq!(copy.expose(), "abc");
    }
}
