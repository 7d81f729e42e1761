//! Configuration management for the RSVP service.
//!
//! Loads configuration from environment variables once at startup. Required
//! variables missing or empty are a fatal startup error; the check-in hub
//! settings are optional and collapse to `None` unless all three are present.

use std::env;
use thiserror::Error;

/// Error raised when the environment is missing required configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required environment variable is absent or blank.
    #[error("required environment variable {0} is not set")]
    MissingVar(&'static str),
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Postgres connection URL
    pub database_url: String,
    /// Confirmation email provider settings
    pub email: EmailConfig,
    /// Admin credential and session signing settings
    pub admin: AdminConfig,
    /// Check-in hub settings; `None` disables enrichment entirely
    pub hub: Option<HubConfig>,
    /// HTTP server bind settings
    pub server: ServerConfig,
}

/// Email provider configuration.
#[derive(Debug, Clone)]
pub struct EmailConfig {
    /// API key for the hosted email provider
    pub api_key: String,
    /// Sender address for confirmation emails
    pub from_address: String,
}

/// Admin authentication configuration.
#[derive(Debug, Clone)]
pub struct AdminConfig {
    /// Shared admin password
    pub password: String,
    /// Secret key for signing session tokens
    pub session_secret: String,
}

/// Check-in hub configuration. Enrichment runs only when the whole
/// triple is present.
#[derive(Debug, Clone)]
pub struct HubConfig {
    /// Hub base URL (webhook path is appended)
    pub base_url: String,
    /// Bearer key for the hub webhook
    pub webhook_key: String,
    /// Slug identifying this event at the hub
    pub event_slug: String,
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,
    /// Port to bind to
    pub port: u16,
}

impl ServerConfig {
    /// Bind address in `host:port` form.
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Config {
    /// Load configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingVar`] naming the first required
    /// variable that is absent or empty.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// Values are trimmed; blank values count as unset.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingVar`] for the first missing required
    /// variable.
    pub fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let require = |key: &'static str| get(key).ok_or(ConfigError::MissingVar(key));

        let hub_url = get("HUB_URL");
        let hub_key = get("HUB_WEBHOOK_KEY");
        let hub_slug = get("HUB_EVENT_SLUG");
        let hub_vars_present = [&hub_url, &hub_key, &hub_slug]
            .iter()
            .filter(|v| v.is_some())
            .count();
        let hub = match (hub_url, hub_key, hub_slug) {
            (Some(base_url), Some(webhook_key), Some(event_slug)) => Some(HubConfig {
                base_url,
                webhook_key,
                event_slug,
            }),
            _ => {
                if hub_vars_present > 0 {
                    tracing::warn!(
                        "Hub configuration incomplete ({hub_vars_present} of 3 variables set); enrichment disabled"
                    );
                }
                None
            }
        };

        Ok(Self {
            database_url: require("DATABASE_URL")?,
            email: EmailConfig {
                api_key: require("RESEND_API_KEY")?,
                from_address: require("FROM_EMAIL")?,
            },
            admin: AdminConfig {
                password: require("ADMIN_PASSWORD")?,
                session_secret: require("ADMIN_SESSION_SECRET")?,
            },
            hub,
            server: ServerConfig {
                host: get("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                port: get("PORT").and_then(|s| s.parse().ok()).unwrap_or(3000),
            },
        })
    }
}
