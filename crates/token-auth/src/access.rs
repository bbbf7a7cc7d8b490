//! Signed access tokens
//!
//! Wire format: `base64url(header_json).base64url(payload_json).base64url(digest)`
//! where `digest = SHA-512(unsigned_string || secret_key)`. This is a keyed
//! hash, not HMAC; existing tokens depend on this exact construction.
//!
//! Verification recomputes the whole signed string from the parsed claims
//! and compares it to the input, so the JSON serialization below must stay
//! byte-stable: fields are emitted in declaration order with no whitespace.

use std::time::{Duration, SystemTime};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha512};

use crate::clock;
use crate::codec;
use crate::constants::{ALGORITHM, SEPARATOR, TOKEN_TYPE};
use crate::error::{Error, ParseError, Result};

/// Fixed token header. Identical for every token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    pub alg: String,
    #[serde(rename = "type")]
    pub token_type: String,
}

impl Default for Header {
    fn default() -> Self {
        Self {
            alg: ALGORITHM.to_string(),
            token_type: TOKEN_TYPE.to_string(),
        }
    }
}

/// Token payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the user's store key
    #[serde(rename = "iss")]
    pub subject: String,
    /// Expiration as unix timestamp in seconds
    #[serde(rename = "exp")]
    pub expires: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessToken {
    pub header: Header,
    pub claims: Claims,
}

impl AccessToken {
    /// Build a token for `subject` expiring `duration` after `now`.
    pub fn mint(subject: impl Into<String>, now: SystemTime, duration: Duration) -> Self {
        let ttl = i64::try_from(duration.as_secs()).unwrap_or(i64::MAX);
        Self {
            header: Header::default(),
            claims: Claims {
                subject: subject.into(),
                expires: clock::unix_seconds(now).saturating_add(ttl),
            },
        }
    }

    pub fn subject(&self) -> &str {
        &self.claims.subject
    }

    /// Expiration instant, if representable on this platform.
    pub fn expires_at(&self) -> Option<SystemTime> {
        clock::from_unix_seconds(self.claims.expires)
    }

    /// Whether the token's expiration second lies before `now`.
    ///
    /// `verify` never calls this; callers that gate access on expiration do.
    pub fn is_expired_at(&self, now: SystemTime) -> bool {
        self.claims.expires < clock::unix_seconds(now)
    }

    /// `base64url(header_json).base64url(payload_json)`
    pub fn to_unsigned_string(&self) -> Result<String> {
        let header = codec::encode(&serde_json::to_vec(&self.header)?);
        let payload = codec::encode(&serde_json::to_vec(&self.claims)?);
        Ok(join(&header, &payload))
    }

    /// Unsigned string followed by `.` and its signature.
    pub fn to_signed_string(&self, secret_key: &str) -> Result<String> {
        let unsigned = self.to_unsigned_string()?;
        let signature = sign(&unsigned, secret_key);
        Ok(join(&unsigned, &signature))
    }

    /// Split a token string into its claims and the raw, unverified signature.
    pub fn parse(text: &str) -> std::result::Result<(Self, String), ParseError> {
        let parts: Vec<&str> = text.split(char::from(SEPARATOR)).collect();
        let [header, claims, signature] = parts[..] else {
            return Err(ParseError::WrongPartCount(parts.len()));
        };

        let token = Self {
            header: decode_segment(header)?,
            claims: decode_segment(claims)?,
        };
        Ok((token, signature.to_string()))
    }

    /// Parse `text` and check that re-signing the parsed token reproduces it
    /// exactly.
    ///
    /// Any difference fails with `SignatureMismatch`, including a valid
    /// signature over non-canonical JSON. Expiration is not checked here.
    pub fn verify(text: &str, secret_key: &str) -> Result<Self> {
        let (token, _signature) = Self::parse(text)?;
        if token.to_signed_string(secret_key)? != text {
            return Err(Error::SignatureMismatch);
        }
        Ok(token)
    }
}

/// `base64url(SHA-512(unsigned || secret_key))`
pub fn sign(unsigned: &str, secret_key: &str) -> String {
    let mut hasher = Sha512::new();
    hasher.update(unsigned.as_bytes());
    hasher.update(secret_key.as_bytes());
    codec::encode(&hasher.finalize())
}

fn join(left: &str, right: &str) -> String {
    // Both halves are base64url text, so the joined bytes stay valid UTF-8.
    String::from_utf8_lossy(&codec::concat(left.as_bytes(), right.as_bytes(), SEPARATOR))
        .into_owned()
}

fn decode_segment<T: DeserializeOwned>(segment: &str) -> std::result::Result<T, ParseError> {
    let bytes = codec::decode(segment)?;
    serde_json::from_slice(&bytes).map_err(|e| ParseError::MalformedPayload(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::UNIX_EPOCH;

    const KEY: &str = "SECRET_KEY";

    fn t0() -> SystemTime {
        UNIX_EPOCH + Duration::from_secs(1_735_500_000)
    }

    fn signed(subject: &str) -> String {
        AccessToken::mint(subject, t0(), Duration::from_secs(600))
            .to_signed_string(KEY)
            .unwrap()
    }

    #[test]
    fn mint_sets_fixed_header_and_expiration() {
        let token = AccessToken::mint("u1", t0(), Duration::from_secs(600));
        assert_eq!(token.header.alg, "sha512");
        assert_eq!(token.header.token_type, "JWT");
        assert_eq!(token.subject(), "u1");
        assert_eq!(token.claims.expires, 1_735_500_600);
        assert_eq!(
            token.expires_at(),
            Some(UNIX_EPOCH + Duration::from_secs(1_735_500_600))
        );
    }

    #[test]
    fn header_and_payload_json_are_canonical() {
        let token = AccessToken::mint("u1", t0(), Duration::from_secs(600));
        assert_eq!(
            serde_json::to_string(&token.header).unwrap(),
            r#"{"alg":"sha512","type":"JWT"}"#
        );
        assert_eq!(
            serde_json::to_string(&token.claims).unwrap(),
            r#"{"iss":"u1","exp":1735500600}"#
        );
    }

    #[test]
    fn unsigned_string_is_two_encoded_segments() {
        let token = AccessToken::mint("u1", t0(), Duration::from_secs(600));
        let unsigned = token.to_unsigned_string().unwrap();
        let (header, payload) = unsigned.split_once('.').unwrap();
        assert_eq!(codec::decode(header).unwrap(), br#"{"alg":"sha512","type":"JWT"}"#);
        assert_eq!(codec::decode(payload).unwrap(), br#"{"iss":"u1","exp":1735500600}"#);
        assert_eq!(unsigned, token.to_unsigned_string().unwrap());
    }

    #[test]
    fn signature_is_sha512_of_message_then_key() {
        let expected = codec::encode(&Sha512::digest(b"abc.defSECRET_KEY"));
        assert_eq!(sign("abc.def", KEY), expected);
        assert_eq!(expected.len(), 88);
        assert_ne!(sign("abc.def", "OTHER_KEY"), expected);
    }

    #[test]
    fn verify_accepts_freshly_signed_token() {
        for subject in ["u1", "65a1f0c2e4b0a1b2c3d4e5f6", "", "ünïcödé"] {
            let text = signed(subject);
            let token = AccessToken::verify(&text, KEY).unwrap();
            assert_eq!(token.subject(), subject);
            assert_eq!(token.claims.expires, 1_735_500_600);
        }
    }

    #[test]
    fn verify_rejects_wrong_key() {
        let text = signed("u1");
        let err = AccessToken::verify(&text, "WRONG_KEY").unwrap_err();
        assert!(matches!(err, Error::SignatureMismatch), "got: {err:?}");
    }

    #[test]
    fn any_signature_character_change_is_rejected() {
        let text = signed("u1");
        let signature_start = text.rfind('.').unwrap() + 1;

        for i in signature_start..text.len() {
            let mut bytes = text.clone().into_bytes();
            bytes[i] = if bytes[i] == b'A' { b'B' } else { b'A' };
            let tampered = String::from_utf8(bytes).unwrap();
            let err = AccessToken::verify(&tampered, KEY).unwrap_err();
            assert!(
                matches!(err, Error::SignatureMismatch),
                "byte {i} flip should be a signature mismatch, got: {err:?}"
            );
        }
    }

    #[test]
    fn swapped_payload_is_rejected() {
        let original = signed("u1");
        let (_, signature) = original.rsplit_once('.').unwrap();
        let forged_unsigned = AccessToken::mint("admin", t0(), Duration::from_secs(600))
            .to_unsigned_string()
            .unwrap();
        let forged = format!("{forged_unsigned}.{signature}");

        let err = AccessToken::verify(&forged, KEY).unwrap_err();
        assert!(matches!(err, Error::SignatureMismatch));
    }

    #[test]
    fn tampered_header_or_payload_never_verifies() {
        let text = signed("u1");
        let signature_start = text.rfind('.').unwrap();

        for i in 0..signature_start {
            if text.as_bytes()[i] == b'.' {
                continue;
            }
            let mut bytes = text.clone().into_bytes();
            bytes[i] = if bytes[i] == b'A' { b'B' } else { b'A' };
            let tampered = String::from_utf8(bytes).unwrap();
            assert!(
                AccessToken::verify(&tampered, KEY).is_err(),
                "tampered byte {i} must not verify"
            );
        }
    }

    #[test]
    fn non_canonical_json_with_valid_signature_is_rejected() {
        let header = codec::encode(br#"{"alg":"sha512","type":"JWT"}"#);
        let payload = codec::encode(br#"{"iss": "u1", "exp": 1735500600}"#);
        let unsigned = format!("{header}.{payload}");
        let text = format!("{unsigned}.{}", sign(&unsigned, KEY));

        let (parsed, _) = AccessToken::parse(&text).unwrap();
        assert_eq!(parsed.subject(), "u1");

        let err = AccessToken::verify(&text, KEY).unwrap_err();
        assert!(matches!(err, Error::SignatureMismatch));
    }

    #[test]
    fn parse_returns_raw_signature_segment() {
        let text = signed("u1");
        let (token, signature) = AccessToken::parse(&text).unwrap();
        assert_eq!(token.subject(), "u1");
        assert!(text.ends_with(&format!(".{signature}")));
    }

    #[test]
    fn parse_requires_exactly_three_parts() {
        let text = signed("u1");
        let (head, tail) = text.split_once('.').unwrap();
        let four_parts = format!("{head}.extra.{tail}");

        for input in [four_parts.as_str(), "one", "one.two", ""] {
            let err = AccessToken::parse(input).unwrap_err();
            assert!(matches!(err, ParseError::WrongPartCount(_)), "input {input:?}: {err:?}");
        }
        assert!(matches!(
            AccessToken::verify(&four_parts, KEY).unwrap_err(),
            Error::Parse(ParseError::WrongPartCount(4))
        ));
    }

    #[test]
    fn parse_reports_decode_failure() {
        let err = AccessToken::parse("not*base64.eyJ9.sig").unwrap_err();
        assert!(matches!(err, ParseError::DecodeFailure(_)), "got: {err:?}");
    }

    #[test]
    fn parse_reports_malformed_payload() {
        let header = codec::encode(br#"{"alg":"sha512","type":"JWT"}"#);
        let payload = codec::encode(br#"{"iss":"u1","exp":"soon"}"#);
        let err = AccessToken::parse(&format!("{header}.{payload}.sig")).unwrap_err();
        assert!(matches!(err, ParseError::MalformedPayload(_)), "got: {err:?}");

        let not_json = codec::encode(b"plain text");
        let err = AccessToken::parse(&format!("{not_json}.{payload}.sig")).unwrap_err();
        assert!(matches!(err, ParseError::MalformedPayload(_)));
    }

    #[test]
    fn verify_ignores_expiration() {
        let long_ago = UNIX_EPOCH + Duration::from_secs(1_000);
        let text = AccessToken::mint("u1", long_ago, Duration::from_secs(1))
            .to_signed_string(KEY)
            .unwrap();
        let token = AccessToken::verify(&text, KEY).unwrap();
        assert!(token.is_expired_at(t0()));
    }

    #[test]
    fn end_to_end_mint_verify_and_tamper() {
        let token = AccessToken::mint("u1", t0(), Duration::from_secs(600));
        let text = token.to_signed_string(KEY).unwrap();

        let one_second_later = t0() + Duration::from_secs(1);
        let verified = AccessToken::verify(&text, KEY).unwrap();
        assert_eq!(verified, token);
        assert!(!verified.is_expired_at(one_second_later));

        let mut bytes = text.into_bytes();
        let last_data_char = bytes.iter().rposition(|&b| b != b'=').unwrap();
        bytes[last_data_char] ^= 0x01;
        let tampered = String::from_utf8(bytes).unwrap();
        assert!(matches!(
            AccessToken::verify(&tampered, KEY).unwrap_err(),
            Error::SignatureMismatch
        ));
    }

    #[test]
    fn expiration_boundary_is_inclusive() {
        let token = AccessToken::mint("u1", t0(), Duration::from_secs(600));
        let at_expiry = UNIX_EPOCH + Duration::from_millis(1_735_500_600_900);
        assert!(!token.is_expired_at(at_expiry));
        assert!(token.is_expired_at(at_expiry + Duration::from_secs(1)));
    }
}
