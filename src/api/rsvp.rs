//! RSVP submission pipeline.
//!
//! Validation → insert → optional hub enrichment → optional QR render →
//! confirmation email. The durable insert is the only stage that can fail
//! the request; every later stage degrades gracefully and the success
//! response never reveals which optional stages ran. See the handler-level
//! stage comments for the per-stage failure policy.

use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode, header},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::email::Confirmation;
use crate::error::ApiError;
use crate::hub::HubRegistration;
use crate::qr;
use crate::server::AppState;
use crate::store::NewEntry;

const CONFIRMATION_MESSAGE: &str = "Thank you! Your RSVP has been received.";

/// Inbound RSVP body.
#[derive(Debug, Deserialize)]
pub struct RsvpRequest {
    /// Attendee first name.
    #[serde(default, rename = "firstName")]
    pub first_name: String,
    /// Attendee last name.
    #[serde(default, rename = "lastName")]
    pub last_name: String,
    /// Attendee email.
    #[serde(default)]
    pub email: String,
    /// Terms-acceptance flag; must be exactly `true`.
    #[serde(default)]
    pub terms: bool,
}

/// Acknowledgement returned once the entry is durably recorded.
#[derive(Debug, Serialize)]
pub struct RsvpResponse {
    /// Always `true` on the success path.
    pub success: bool,
    /// Human-readable confirmation message.
    pub message: String,
}

/// Permissive shape check: `local@domain.tld`, no whitespace or extra `@`.
/// Intentionally not full RFC validation.
fn valid_email(email: &str) -> bool {
    let mut parts = email.split('@');
    let (Some(local), Some(domain), None) = (parts.next(), parts.next(), parts.next()) else {
        return false;
    };
    if local.is_empty() || local.chars().any(char::is_whitespace) {
        return false;
    }
    if domain.chars().any(char::is_whitespace) {
        return false;
    }
    match domain.rsplit_once('.') {
        Some((host, tld)) => !host.is_empty() && !tld.is_empty(),
        None => false,
    }
}

fn validate(headers: &HeaderMap, body: &Bytes) -> Result<NewEntry, ApiError> {
    let is_json = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.contains("application/json"));
    if !is_json {
        return Err(ApiError::bad_request("Content-Type must be application/json"));
    }

    let request: RsvpRequest =
        serde_json::from_slice(body).map_err(|_| ApiError::bad_request("Invalid JSON"))?;

    let first_name = request.first_name.trim().to_string();
    let last_name = request.last_name.trim().to_string();
    let email = request.email.trim().to_lowercase();

    if first_name.is_empty() || last_name.is_empty() || email.is_empty() {
        return Err(ApiError::bad_request(
            "First name, last name, and email are required",
        ));
    }
    if !request.terms {
        return Err(ApiError::bad_request("You must accept the terms"));
    }
    if !valid_email(&email) {
        return Err(ApiError::bad_request("Invalid email address"));
    }

    Ok(NewEntry {
        first_name,
        last_name,
        email,
        terms_accepted: true,
    })
}

/// `POST /api/rsvp`
#[tracing::instrument(name = "submit_rsvp", skip_all)]
pub async fn submit(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, Json<RsvpResponse>), ApiError> {
    let new_entry = validate(&headers, &body)?;

    // Stage 1: durable insert. The only fatal stage.
    let entry_id = state
        .store
        .insert(&new_entry)
        .await
        .map_err(|e| {
            ApiError::internal("Could not save your response. Please try again.")
                .with_source(e.into())
        })?;
    tracing::info!(entry_id = %entry_id, "Entry recorded");

    // Stage 2: hub enrichment, best-effort and only when configured.
    let qr_payload = match &state.hub {
        Some(hub) => enrich(&state, hub.as_ref(), entry_id, &new_entry).await,
        None => None,
    };

    // Stage 3: QR render, best-effort.
    let qr_image_data_uri = qr_payload.and_then(|payload| match qr::qr_data_uri(&payload) {
        Ok(uri) => Some(uri),
        Err(e) => {
            tracing::warn!(entry_id = %entry_id, error = %e, "QR render failed; sending email without image");
            None
        }
    });

    // Stage 4: confirmation email, always attempted, best-effort.
    let confirmation = Confirmation {
        to: new_entry.email.clone(),
        first_name: new_entry.first_name.clone(),
        qr_image_data_uri,
    };
    if let Err(e) = state.mailer.send_confirmation(&confirmation).await {
        tracing::warn!(entry_id = %entry_id, error = %e, "Confirmation email failed");
    }

    Ok((
        StatusCode::CREATED,
        Json(RsvpResponse {
            success: true,
            message: CONFIRMATION_MESSAGE.to_string(),
        }),
    ))
}

/// Register the entry with the hub and persist the outcome; returns the QR
/// payload when the hub produced one. Every failure path logs and returns
/// `None` so the caller proceeds.
async fn enrich(
    state: &AppState,
    hub: &dyn crate::hub::CheckinHub,
    entry_id: Uuid,
    new_entry: &NewEntry,
) -> Option<String> {
    let registration = HubRegistration {
        email: new_entry.email.clone(),
        name: format!("{} {}", new_entry.first_name, new_entry.last_name),
        microsite_entry_id: entry_id.to_string(),
        source_data: json!({
            "firstName": new_entry.first_name,
            "lastName": new_entry.last_name,
            "termsAccepted": new_entry.terms_accepted,
        }),
    };

    let response = match hub.register_entry(registration).await {
        Ok(response) => response,
        Err(e) => {
            tracing::warn!(entry_id = %entry_id, error = %e, "Hub registration failed; continuing without enrichment");
            return None;
        }
    };
    tracing::info!(entry_id = %entry_id, hub_entry_id = %response.entry_id, "Hub registration succeeded");

    let source_data = json!({
        "hubEntryId": response.entry_id,
        "qrUrl": response.qr_url,
        "existing": response.existing,
        "refreshed": response.refreshed,
    });
    if let Err(e) = state
        .store
        .attach_hub_registration(entry_id, &response.entry_id, &source_data)
        .await
    {
        // The entry is valid without the hub fields.
        tracing::warn!(entry_id = %entry_id, error = %e, "Failed to record hub registration on entry");
    }

    response.qr_payload
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn json_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, "application/json".parse().unwrap());
        headers
    }

    fn body(value: serde_json::Value) -> Bytes {
        Bytes::from(value.to_string())
    }

    #[test]
    fn test_valid_email_shapes() {
        assert!(valid_email("a@b.co"));
        assert!(valid_email("first.last@sub.example.com"));
        assert!(!valid_email("not-an-email"));
        assert!(!valid_email("a@b"));
        assert!(!valid_email("a@.co"));
        assert!(!valid_email("a b@ex.com"));
        assert!(!valid_email("a@b@c.com"));
        assert!(!valid_email("@ex.com"));
        assert!(!valid_email("a@ex."));
    }

    #[test]
    fn test_validate_normalizes_fields() {
        let entry = validate(
            &json_headers(),
            &body(json!({
                "firstName": "  Ada ",
                "lastName": "Lovelace",
                "email": "ADA@EX.com",
                "terms": true,
            })),
        )
        .unwrap();
        assert_eq!(entry.first_name, "Ada");
        assert_eq!(entry.email, "ada@ex.com");
        assert!(entry.terms_accepted);
    }

    #[test]
    fn test_validate_requires_json_content_type() {
        let err = validate(&HeaderMap::new(), &body(json!({}))).unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_validate_accepts_content_type_with_charset() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            "application/json; charset=utf-8".parse().unwrap(),
        );
        let entry = validate(
            &headers,
            &body(json!({
                "firstName": "Ada",
                "lastName": "Lovelace",
                "email": "ada@ex.com",
                "terms": true,
            })),
        );
        assert!(entry.is_ok());
    }

    #[test]
    fn test_validate_rejects_unparseable_body() {
        let err = validate(&json_headers(), &Bytes::from_static(b"{nope")).unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_validate_rejects_terms_false_despite_valid_fields() {
        let err = validate(
            &json_headers(),
            &body(json!({
                "firstName": "Ada",
                "lastName": "Lovelace",
                "email": "ada@ex.com",
                "terms": false,
            })),
        )
        .unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_validate_rejects_whitespace_only_names() {
        let err = validate(
            &json_headers(),
            &body(json!({
                "firstName": "   ",
                "lastName": "Lovelace",
                "email": "ada@ex.com",
                "terms": true,
            })),
        )
        .unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    proptest! {
        #[test]
        fn prop_validate_never_panics(raw in proptest::collection::vec(any::<u8>(), 0..256)) {
            let _ = validate(&json_headers(), &Bytes::from(raw));
        }

        #[test]
        fn prop_valid_email_never_panics(candidate in ".{0,80}") {
            let _ = valid_email(&candidate);
        }
    }
}
