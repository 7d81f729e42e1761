//! Check-in hub webhook client.
//!
//! The hub is the external partner that mints a check-in record and a QR
//! payload for an entry. One call per RSVP: POST the entry to the hub's
//! webhook with a bearer key, asking it to generate a QR payload and to
//! skip its own email (this service sends the confirmation itself). The
//! pipeline treats every failure here as best-effort.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::HubConfig;

/// Errors from the hub webhook call.
#[derive(Debug, Error)]
pub enum HubError {
    /// Transport-level failure reaching the hub.
    #[error("hub request failed: {0}")]
    Request(String),
    /// The hub answered non-2xx; carries the response body text, or the
    /// status text when the body was empty.
    #[error("hub rejected entry ({status}): {message}")]
    Rejected {
        /// HTTP status returned by the hub.
        status: u16,
        /// Response body text, or status text when the body was empty.
        message: String,
    },
    /// 2xx response whose body did not parse.
    #[error("invalid hub response: {0}")]
    InvalidResponse(String),
}

/// What the pipeline registers with the hub for one entry.
#[derive(Debug, Clone)]
pub struct HubRegistration {
    /// Attendee email (already lower-cased).
    pub email: String,
    /// Attendee display name, `"{first} {last}"`.
    pub name: String,
    /// The entry id on our side, echoed so the hub can correlate.
    pub microsite_entry_id: String,
    /// Opaque metadata stored alongside the hub record.
    pub source_data: serde_json::Value,
}

/// Successful hub response.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HubEntryResponse {
    /// The hub's identifier for the minted check-in record.
    pub entry_id: String,
    /// Payload to encode as the attendee's QR code.
    #[serde(default)]
    pub qr_payload: Option<String>,
    /// Hosted QR image location, if the hub rendered one.
    #[serde(default)]
    pub qr_url: Option<String>,
    /// Whether the hub matched an existing record instead of minting.
    #[serde(default)]
    pub existing: Option<bool>,
    /// Whether an existing record was refreshed.
    #[serde(default)]
    pub refreshed: Option<bool>,
}

/// Hub collaborator seam; the pipeline only sees this trait.
#[async_trait]
pub trait CheckinHub: Send + Sync {
    /// Register one entry, returning the hub's record and QR payload.
    async fn register_entry(
        &self,
        registration: HubRegistration,
    ) -> Result<HubEntryResponse, HubError>;
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WebhookBody<'a> {
    event_slug: &'a str,
    email: &'a str,
    name: &'a str,
    microsite_entry_id: &'a str,
    source_data: &'a serde_json::Value,
    #[serde(rename = "generateQR")]
    generate_qr: bool,
    send_email: bool,
}

/// HTTP client for the hub webhook.
#[derive(Debug, Clone)]
pub struct HubClient {
    client: reqwest::Client,
    base_url: String,
    webhook_key: String,
    event_slug: String,
}

impl HubClient {
    /// Build a client from the hub configuration block.
    #[must_use]
    pub fn new(config: &HubConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            webhook_key: config.webhook_key.clone(),
            event_slug: config.event_slug.clone(),
        }
    }
}

#[async_trait]
impl CheckinHub for HubClient {
    #[tracing::instrument(
        name = "hub_register_entry",
        skip_all,
        fields(microsite_entry_id = %registration.microsite_entry_id)
    )]
    async fn register_entry(
        &self,
        registration: HubRegistration,
    ) -> Result<HubEntryResponse, HubError> {
        let body = WebhookBody {
            event_slug: &self.event_slug,
            email: &registration.email,
            name: &registration.name,
            microsite_entry_id: &registration.microsite_entry_id,
            source_data: &registration.source_data,
            generate_qr: true,
            send_email: false,
        };

        let response = self
            .client
            .post(format!("{}/api/webhooks/entry", self.base_url))
            .bearer_auth(&self.webhook_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| HubError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            let message = if message.is_empty() {
                status
                    .canonical_reason()
                    .unwrap_or("request failed")
                    .to_string()
            } else {
                message
            };
            return Err(HubError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json()
            .await
            .map_err(|e| HubError::InvalidResponse(e.to_string()))
    }
}
