//! Admin authentication.
//!
//! A single shared password gates the admin surface. Successful login mints
//! a stateless HMAC-signed token (see [`token`]) carried in the
//! `admin_session` cookie; every admin request re-derives
//! authenticated/unauthenticated from that cookie alone. There is no
//! server-side session store, so revocation before expiry is impossible;
//! that is an accepted limitation of the scheme.

pub mod extract;
pub mod token;

pub use extract::AdminSession;
pub use token::{SESSION_WINDOW_SECS, TokenError};

use crate::config::AdminConfig;
use axum::http::{HeaderMap, header};
use chrono::Utc;
use constant_time_eq::constant_time_eq;

/// Name of the admin session cookie.
pub const SESSION_COOKIE: &str = "admin_session";

/// Credential validation and session issue/verify, sharing the secrets
/// loaded once at startup. Cheap to clone into request handlers.
#[derive(Clone)]
pub struct Sessions {
    password: String,
    secret: String,
}

impl Sessions {
    /// Build from the admin configuration block.
    #[must_use]
    pub fn new(admin: &AdminConfig) -> Self {
        Self {
            password: admin.password.clone(),
            secret: admin.session_secret.clone(),
        }
    }

    /// Compare a candidate password against the configured credential.
    ///
    /// Uses a constant-time comparison so the cost does not depend on where
    /// the first mismatching byte sits. Fails closed when no password is
    /// configured.
    #[must_use]
    pub fn validate_credential(&self, candidate: &str) -> bool {
        if self.password.is_empty() {
            tracing::error!("Admin password is not configured; rejecting all credentials");
            return false;
        }
        constant_time_eq(candidate.as_bytes(), self.password.as_bytes())
    }

    /// Mint a session token for the admin identity.
    ///
    /// # Errors
    ///
    /// Propagates [`TokenError`] from signing; does not happen with a
    /// non-empty secret.
    pub fn issue(&self) -> Result<String, TokenError> {
        token::issue(&self.secret, Utc::now())
    }

    /// Whether `candidate` is a currently valid admin session token.
    ///
    /// Fails closed when no secret is configured.
    #[must_use]
    pub fn verify(&self, candidate: &str) -> bool {
        if self.secret.is_empty() {
            return false;
        }
        token::verify_at(candidate, &self.secret, Utc::now()).is_ok()
    }

    /// Whether the request headers carry a valid admin session cookie.
    #[must_use]
    pub fn authenticated(&self, headers: &HeaderMap) -> bool {
        headers
            .get(header::COOKIE)
            .and_then(|value| value.to_str().ok())
            .and_then(Self::token_from_cookies)
            .is_some_and(|candidate| self.verify(&candidate))
    }

    /// `Set-Cookie` value carrying `token` with the session attributes:
    /// `HttpOnly`, `SameSite=Lax`, `Path=/`, `Max-Age` matching the
    /// validity window. The token is URL-encoded.
    #[must_use]
    pub fn session_cookie(token: &str) -> String {
        format!(
            "{SESSION_COOKIE}={}; Max-Age={SESSION_WINDOW_SECS}; Path=/; HttpOnly; SameSite=Lax",
            urlencoding::encode(token)
        )
    }

    /// Pull the session token out of a `Cookie` header value, if present.
    #[must_use]
    pub fn token_from_cookies(cookies: &str) -> Option<String> {
        for pair in cookies.split(';') {
            if let Some((name, value)) = pair.trim().split_once('=') {
                if name == SESSION_COOKIE {
                    return urlencoding::decode(value).ok().map(|v| v.into_owned());
                }
            }
        }
        None
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn sessions() -> Sessions {
        Sessions::new(&AdminConfig {
            password: "correct horse".to_string(),
            session_secret: "test-session-secret".to_string(),
        })
    }

    #[test]
    fn test_correct_password_accepted() {
        assert!(sessions().validate_credential("correct horse"));
    }

    #[test]
    fn test_wrong_password_rejected() {
        assert!(!sessions().validate_credential("battery staple"));
    }

    #[test]
    fn test_equal_length_mismatch_rejected() {
        // Same byte length as the configured credential, differing only in
        // the final byte, exercises the full comparison.
        assert!(!sessions().validate_credential("correct horsf"));
    }

    #[test]
    fn test_unconfigured_password_fails_closed() {
        let sessions = Sessions::new(&AdminConfig {
            password: String::new(),
            session_secret: "s".to_string(),
        });
        assert!(!sessions.validate_credential(""));
        assert!(!sessions.validate_credential("anything"));
    }

    #[test]
    fn test_issue_verify_roundtrip() {
        let sessions = sessions();
        let token = sessions.issue().unwrap();
        assert!(sessions.verify(&token));
    }

    #[test]
    fn test_unconfigured_secret_fails_closed() {
        let issuing = sessions();
        let token = issuing.issue().unwrap();
        let unconfigured = Sessions::new(&AdminConfig {
            password: "correct horse".to_string(),
            session_secret: String::new(),
        });
        assert!(!unconfigured.verify(&token));
    }

    #[test]
    fn test_cookie_attributes() {
        let cookie = Sessions::session_cookie("tok.en");
        assert!(cookie.starts_with("admin_session="));
        assert!(cookie.contains("Max-Age=86400"));
        assert!(cookie.contains("Path=/"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("SameSite=Lax"));
    }

    #[test]
    fn test_cookie_value_roundtrips_through_header() {
        let sessions = sessions();
        let token = sessions.issue().unwrap();
        let set_cookie = Sessions::session_cookie(&token);
        let value = set_cookie.split(';').next().unwrap();
        let parsed = Sessions::token_from_cookies(value).unwrap();
        assert_eq!(parsed, token);
    }

    #[test]
    fn test_token_found_among_other_cookies() {
        let cookies = "theme=dark; admin_session=abc123; lang=en";
        assert_eq!(
            Sessions::token_from_cookies(cookies).as_deref(),
            Some("abc123")
        );
    }

    #[test]
    fn test_missing_cookie_yields_none() {
        assert!(Sessions::token_from_cookies("theme=dark; lang=en").is_none());
        assert!(Sessions::token_from_cookies("").is_none());
    }

    #[test]
    fn test_authenticated_from_headers() {
        let sessions = sessions();
        let token = sessions.issue().unwrap();

        let mut headers = HeaderMap::new();
        assert!(!sessions.authenticated(&headers));

        headers.insert(
            header::COOKIE,
            format!("admin_session={}", urlencoding::encode(&token))
                .parse()
                .unwrap(),
        );
        assert!(sessions.authenticated(&headers));

        let mut forged = HeaderMap::new();
        forged.insert(header::COOKIE, "admin_session=v1.forged.token".parse().unwrap());
        assert!(!sessions.authenticated(&forged));
    }
}
