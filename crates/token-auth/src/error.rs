//! Error types for token operations

/// Failures while taking a token string apart.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("the token has the wrong number of parts: {0}")]
    WrongPartCount(usize),

    #[error("token segment is not valid base64url: {0}")]
    DecodeFailure(#[from] base64::DecodeError),

    #[error("malformed token payload: {0}")]
    MalformedPayload(String),
}

/// Errors from token operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("invalid access token")]
    SignatureMismatch,

    #[error("access token is too short to bind a refresh token: {0} characters")]
    AccessTokenTooShort(usize),

    #[error("token serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("credential hashing failed: {0}")]
    Hash(String),
}

/// Result alias for token operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrong_part_count_reports_count() {
        let err = ParseError::WrongPartCount(4);
        assert_eq!(err.to_string(), "the token has the wrong number of parts: 4");
    }

    #[test]
    fn parse_errors_display_transparently() {
        let err: Error = ParseError::MalformedPayload("bad exp".into()).into();
        assert_eq!(err.to_string(), "malformed token payload: bad exp");
        assert!(matches!(err, Error::Parse(ParseError::MalformedPayload(_))));
    }

    #[test]
    fn signature_mismatch_message_is_generic() {
        assert_eq!(Error::SignatureMismatch.to_string(), "invalid access token");
    }
}
