//! Error types for the session protocol

/// Errors from issuing, authenticating and renewing tokens.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Token(#[from] token_auth::Error),

    #[error("{0} could not be blank")]
    MissingCredential(&'static str),

    #[error("{0} is expired")]
    CredentialExpired(&'static str),

    #[error("refresh token does not match")]
    CredentialMismatch,

    #[error("unknown subject: {0}")]
    UnknownSubject(String),

    #[error("user store error: {0}")]
    Store(user_store::Error),
}

impl From<token_auth::ParseError> for Error {
    fn from(err: token_auth::ParseError) -> Self {
        Self::Token(err.into())
    }
}

impl From<user_store::Error> for Error {
    fn from(err: user_store::Error) -> Self {
        match err {
            user_store::Error::NotFound(id) => Self::UnknownSubject(id),
            other => Self::Store(other),
        }
    }
}

impl Error {
    /// Short label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Token(token_auth::Error::Parse(token_auth::ParseError::WrongPartCount(_))) => {
                "wrong_part_count"
            }
            Error::Token(token_auth::Error::Parse(token_auth::ParseError::DecodeFailure(_))) => {
                "decode_failure"
            }
            Error::Token(token_auth::Error::Parse(token_auth::ParseError::MalformedPayload(_))) => {
                "malformed_payload"
            }
            Error::Token(token_auth::Error::SignatureMismatch) => "signature_mismatch",
            Error::Token(_) => "internal",
            Error::MissingCredential(_) => "missing_credential",
            Error::CredentialExpired(_) => "credential_expired",
            Error::CredentialMismatch => "credential_mismatch",
            Error::UnknownSubject(_) => "unknown_subject",
            Error::Store(_) => "store",
        }
    }

    /// Whether the caller's input caused the failure, as opposed to the
    /// service failing to hash, serialize or persist.
    pub fn is_client_error(&self) -> bool {
        !matches!(
            self,
            Error::Store(_)
                | Error::Token(
                    token_auth::Error::Hash(_)
                        | token_auth::Error::Serialize(_)
                        | token_auth::Error::AccessTokenTooShort(_)
                )
        )
    }
}

/// Result alias for session operations.
pub type Result<T> = std::result::Result<T, Error>;
