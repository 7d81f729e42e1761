//! Axum extractor gating admin handlers.

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};

use crate::auth::Sessions;
use crate::error::ApiError;

/// Proof of an authenticated admin request.
///
/// Take this as a handler parameter to require a valid session: requests
/// without one are rejected with 401 `{"error":"Unauthorized"}` before the
/// handler body runs. Expired, forged, and absent cookies are
/// indistinguishable to the caller.
#[derive(Debug, Clone, Copy)]
pub struct AdminSession;

#[async_trait]
impl<S> FromRequestParts<S> for AdminSession
where
    Sessions: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let sessions = Sessions::from_ref(state);
        if sessions.authenticated(&parts.headers) {
            Ok(Self)
        } else {
            Err(ApiError::unauthorized("Unauthorized"))
        }
    }
}
