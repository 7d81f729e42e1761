//! Stateless admin session tokens.
//!
//! A token is `v1.<base64url payload>.<base64url tag>` where the payload is a
//! JSON document carrying the admin marker and the issuance timestamp, and
//! the tag is an HMAC-SHA256 over the encoded payload keyed by the
//! server-held session secret. Verification recomputes the tag in constant
//! time and then checks the timestamp against the validity window, so no
//! server-side session state exists.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

const TOKEN_VERSION: &str = "v1";
const MARKER: &str = "admin";
const MAX_TOKEN_LEN: usize = 512;

/// Seconds a session stays valid after issuance. Also the cookie `Max-Age`.
pub const SESSION_WINDOW_SECS: i64 = 86_400;

/// Why a session token failed verification.
///
/// Callers gate on pass/fail only; the variants exist for logs and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TokenError {
    /// Token does not have the `v1.payload.tag` structure.
    #[error("malformed session token")]
    Malformed,
    /// Token structure is valid but the version is not recognized.
    #[error("unsupported session token version")]
    UnsupportedVersion,
    /// The integrity tag does not match the payload.
    #[error("session token signature mismatch")]
    InvalidSignature,
    /// The payload decoded but is not a well-formed claims document.
    #[error("invalid session token payload")]
    InvalidPayload,
    /// The marker inside the payload is not the admin marker.
    #[error("session token subject mismatch")]
    WrongSubject,
    /// The token is older than the validity window.
    #[error("session token expired")]
    Expired,
    /// The signing key could not be used.
    #[error("invalid session signing key")]
    InvalidKey,
}

#[derive(Debug, Serialize, Deserialize)]
struct SessionClaims {
    /// Fixed admin marker.
    sub: String,
    /// Issuance time, unix seconds.
    iat: i64,
}

/// Issue a session token bound to `issued_at`.
///
/// # Errors
///
/// Returns [`TokenError::InvalidKey`] if the secret cannot key the MAC and
/// [`TokenError::InvalidPayload`] if the claims fail to serialize; neither
/// occurs with a non-empty secret.
pub fn issue(secret: &str, issued_at: DateTime<Utc>) -> Result<String, TokenError> {
    let claims = SessionClaims {
        sub: MARKER.to_string(),
        iat: issued_at.timestamp(),
    };
    let payload_bytes = serde_json::to_vec(&claims).map_err(|_| TokenError::InvalidPayload)?;
    let payload_part = URL_SAFE_NO_PAD.encode(payload_bytes);
    let tag_part = URL_SAFE_NO_PAD.encode(sign(secret, &payload_part)?);
    Ok(format!("{TOKEN_VERSION}.{payload_part}.{tag_part}"))
}

/// Verify a session token as of `now`.
///
/// The tag is checked before the payload is ever parsed, so malformed or
/// forged payloads are rejected without being interpreted.
///
/// # Errors
///
/// Returns the specific [`TokenError`] describing the first check that
/// failed.
pub fn verify_at(token: &str, secret: &str, now: DateTime<Utc>) -> Result<(), TokenError> {
    if token.is_empty() || token.len() > MAX_TOKEN_LEN {
        return Err(TokenError::Malformed);
    }
    let (payload_part, tag_part) = split_parts(token)?;

    let tag = URL_SAFE_NO_PAD
        .decode(tag_part)
        .map_err(|_| TokenError::Malformed)?;
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| TokenError::InvalidKey)?;
    mac.update(payload_part.as_bytes());
    mac.verify_slice(&tag)
        .map_err(|_| TokenError::InvalidSignature)?;

    let payload_bytes = URL_SAFE_NO_PAD
        .decode(payload_part)
        .map_err(|_| TokenError::Malformed)?;
    let claims: SessionClaims =
        serde_json::from_slice(&payload_bytes).map_err(|_| TokenError::InvalidPayload)?;

    if claims.sub != MARKER {
        return Err(TokenError::WrongSubject);
    }
    if now.timestamp() - claims.iat > SESSION_WINDOW_SECS {
        return Err(TokenError::Expired);
    }
    Ok(())
}

fn sign(secret: &str, payload_part: &str) -> Result<Vec<u8>, TokenError> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| TokenError::InvalidKey)?;
    mac.update(payload_part.as_bytes());
    Ok(mac.finalize().into_bytes().to_vec())
}

fn split_parts(token: &str) -> Result<(&str, &str), TokenError> {
    let parts: Vec<&str> = token.split('.').collect();
    match parts.as_slice() {
        [version, payload, tag] if *version == TOKEN_VERSION => Ok((payload, tag)),
        [_, _, _] => Err(TokenError::UnsupportedVersion),
        _ => Err(TokenError::Malformed),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Duration;
    use proptest::prelude::*;

    const SECRET: &str = "test-session-secret";

    #[test]
    fn test_issue_then_verify_accepts() {
        let now = Utc::now();
        let token = issue(SECRET, now).unwrap();
        assert_eq!(verify_at(&token, SECRET, now), Ok(()));
    }

    #[test]
    fn test_token_at_window_edge_still_valid() {
        let now = Utc::now();
        let token = issue(SECRET, now - Duration::hours(24)).unwrap();
        assert_eq!(verify_at(&token, SECRET, now), Ok(()));
    }

    #[test]
    fn test_token_25_hours_old_rejected() {
        let now = Utc::now();
        let token = issue(SECRET, now - Duration::hours(25)).unwrap();
        assert_eq!(verify_at(&token, SECRET, now), Err(TokenError::Expired));
    }

    #[test]
    fn test_mutated_signature_rejected() {
        let now = Utc::now();
        let token = issue(SECRET, now).unwrap();
        let (head, tag) = token.rsplit_once('.').unwrap();
        let first = tag.chars().next().unwrap();
        let replacement = if first == 'A' { 'B' } else { 'A' };
        let tampered = format!("{head}.{replacement}{}", &tag[1..]);
        assert_eq!(
            verify_at(&tampered, SECRET, now),
            Err(TokenError::InvalidSignature)
        );
    }

    #[test]
    fn test_mutated_payload_rejected() {
        let now = Utc::now();
        let token = issue(SECRET, now).unwrap();
        let parts: Vec<&str> = token.split('.').collect();
        let forged_payload =
            URL_SAFE_NO_PAD.encode(format!("{{\"sub\":\"admin\",\"iat\":{}}}", now.timestamp() + 9000));
        let forged = format!("{}.{}.{}", parts[0], forged_payload, parts[2]);
        assert_eq!(
            verify_at(&forged, SECRET, now),
            Err(TokenError::InvalidSignature)
        );
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let now = Utc::now();
        let token = issue(SECRET, now).unwrap();
        assert_eq!(
            verify_at(&token, "another-secret", now),
            Err(TokenError::InvalidSignature)
        );
    }

    #[test]
    fn test_unknown_version_rejected() {
        let now = Utc::now();
        let token = issue(SECRET, now).unwrap();
        let rest = token.strip_prefix("v1").unwrap();
        assert_eq!(
            verify_at(&format!("v2{rest}"), SECRET, now),
            Err(TokenError::UnsupportedVersion)
        );
    }

    #[test]
    fn test_garbage_tokens_rejected() {
        let now = Utc::now();
        for garbage in ["", "v1", "v1.", "v1..", "not a token", "a.b.c.d"] {
            assert!(verify_at(garbage, SECRET, now).is_err(), "{garbage:?}");
        }
    }

    #[test]
    fn test_oversized_token_rejected() {
        let now = Utc::now();
        let huge = format!("v1.{}.sig", "A".repeat(600));
        assert_eq!(verify_at(&huge, SECRET, now), Err(TokenError::Malformed));
    }

    proptest! {
        #[test]
        fn prop_arbitrary_strings_never_verify(token in ".{0,160}") {
            // No panic, and nothing not minted with the secret passes.
            prop_assert!(verify_at(&token, SECRET, Utc::now()).is_err());
        }

        #[test]
        fn prop_single_byte_flip_never_verifies(pos in 0usize..64) {
            let now = Utc::now();
            let token = issue(SECRET, now).unwrap();
            let mut bytes = token.clone().into_bytes();
            let idx = pos % bytes.len();
            bytes[idx] = bytes[idx].wrapping_add(1);
            if let Ok(flipped) = String::from_utf8(bytes) {
                if flipped != token {
                    prop_assert!(verify_at(&flipped, SECRET, now).is_err());
                }
            }
        }
    }
}
