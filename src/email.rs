//! Confirmation email sending.
//!
//! The provider is a hosted HTTP API (Resend-compatible): one POST per
//! confirmation with a bearer key. The pipeline swallows failures here; a
//! recorded RSVP is never rolled back because its email bounced.

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use crate::config::EmailConfig;

const DEFAULT_API_URL: &str = "https://api.resend.com";
const CONFIRMATION_SUBJECT: &str = "RSVP Confirmation";

/// Errors from the email provider.
#[derive(Debug, Error)]
pub enum EmailError {
    /// Transport-level failure reaching the provider.
    #[error("email request failed: {0}")]
    Request(String),
    /// The provider answered non-2xx.
    #[error("email provider rejected send ({status}): {message}")]
    Rejected {
        /// HTTP status returned by the provider.
        status: u16,
        /// Response body text.
        message: String,
    },
}

/// A confirmation email ready to send.
#[derive(Debug, Clone)]
pub struct Confirmation {
    /// Recipient address (the submitted, lower-cased email).
    pub to: String,
    /// First name used in the greeting.
    pub first_name: String,
    /// Inline QR image as a data URI, when enrichment produced one.
    pub qr_image_data_uri: Option<String>,
}

/// Email collaborator seam; the pipeline only sees this trait.
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Send one confirmation email.
    async fn send_confirmation(&self, confirmation: &Confirmation) -> Result<(), EmailError>;
}

#[derive(Debug, Serialize)]
struct SendEmailBody<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    html: String,
}

fn confirmation_html(first_name: &str, qr_image_data_uri: Option<&str>) -> String {
    let qr_block = qr_image_data_uri.map_or_else(String::new, |uri| {
        format!("<p><img src=\"{uri}\" alt=\"QR Code\" width=\"200\" height=\"200\" /></p>")
    });
    format!(
        "<p>Hi {first_name},</p>\
         <p>Your RSVP has been received. We look forward to seeing you!</p>\
         {qr_block}\
         <p>— The Team</p>"
    )
}

/// HTTP [`Mailer`] for a Resend-compatible provider.
#[derive(Debug, Clone)]
pub struct ResendMailer {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    from_address: String,
}

impl ResendMailer {
    /// Build a mailer from the email configuration block.
    #[must_use]
    pub fn new(config: &EmailConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url: DEFAULT_API_URL.to_string(),
            api_key: config.api_key.clone(),
            from_address: config.from_address.clone(),
        }
    }

    /// Point the mailer at a different API host.
    #[must_use]
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into().trim_end_matches('/').to_string();
        self
    }
}

#[async_trait]
impl Mailer for ResendMailer {
    #[tracing::instrument(name = "send_confirmation_email", skip_all)]
    async fn send_confirmation(&self, confirmation: &Confirmation) -> Result<(), EmailError> {
        let body = SendEmailBody {
            from: &self.from_address,
            to: &confirmation.to,
            subject: CONFIRMATION_SUBJECT,
            html: confirmation_html(
                &confirmation.first_name,
                confirmation.qr_image_data_uri.as_deref(),
            ),
        };

        let response = self
            .client
            .post(format!("{}/emails", self.api_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| EmailError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(EmailError::Rejected {
                status: status.as_u16(),
                message,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{bearer_token, body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_html_greets_by_first_name() {
        let html = confirmation_html("Ada", None);
        assert!(html.contains("<p>Hi Ada,</p>"));
        assert!(html.contains("Your RSVP has been received. We look forward to seeing you!"));
        assert!(html.contains("— The Team"));
        assert!(!html.contains("<img"));
    }

    #[test]
    fn test_html_embeds_qr_image_when_present() {
        let html = confirmation_html("Grace", Some("data:image/png;base64,AAAA"));
        assert!(html.contains("<img src=\"data:image/png;base64,AAAA\""));
        assert!(html.contains("width=\"200\" height=\"200\""));
    }

    fn mailer_for(server: &MockServer) -> ResendMailer {
        ResendMailer::new(&EmailConfig {
            api_key: "re_test".to_string(),
            from_address: "events@example.com".to_string(),
        })
        .with_api_url(server.uri())
    }

    #[tokio::test]
    async fn test_send_posts_bearer_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/emails"))
            .and(bearer_token("re_test"))
            .and(body_partial_json(json!({
                "from": "events@example.com",
                "to": "ada@ex.com",
                "subject": "RSVP Confirmation",
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "email-1"})))
            .expect(1)
            .mount(&server)
            .await;

        let result = mailer_for(&server)
            .send_confirmation(&Confirmation {
                to: "ada@ex.com".to_string(),
                first_name: "Ada".to_string(),
                qr_image_data_uri: None,
            })
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_provider_rejection_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/emails"))
            .respond_with(ResponseTemplate::new(403).set_body_string("invalid api key"))
            .mount(&server)
            .await;

        let err = mailer_for(&server)
            .send_confirmation(&Confirmation {
                to: "ada@ex.com".to_string(),
                first_name: "Ada".to_string(),
                qr_image_data_uri: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, EmailError::Rejected { status: 403, .. }));
    }
}
