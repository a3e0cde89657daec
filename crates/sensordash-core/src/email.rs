//! Email alerts through the EmailJS REST API.
//!
//! EmailJS renders a stored template with the parameters we send, so the
//! client only needs the service, template and public key identifiers.
//!
//! # Example
//!
//! ```no_run
//! use sensordash_core::email::{EmailConfig, EmailJsClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = EmailConfig {
//!     service_id: "service_abc".into(),
//!     template_id: "template_xyz".into(),
//!     public_key: "pk_123".into(),
//!     ..Default::default()
//! };
//! let client = EmailJsClient::new(config)?;
//! client.send(serde_json::json!({"temperature": "33.0"})).await?;
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use time::OffsetDateTime;
use tracing::debug;

use sensordash_types::AlertEvent;

use crate::dispatch::{AlertChannel, Delivery};
use crate::error::{Error, Result};

/// Public EmailJS send endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://api.emailjs.com/api/v1.0/email/send";

/// EmailJS account settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmailConfig {
    pub service_id: String,
    pub template_id: String,
    /// Public key, sent as `user_id`.
    pub public_key: String,
    /// Private key for accounts that require it.
    pub access_token: Option<String>,
    pub endpoint: String,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            service_id: String::new(),
            template_id: String::new(),
            public_key: String::new(),
            access_token: None,
            endpoint: DEFAULT_ENDPOINT.to_string(),
        }
    }
}

impl EmailConfig {
    /// Whether every required identifier is set.
    pub fn is_configured(&self) -> bool {
        !self.service_id.is_empty() && !self.template_id.is_empty() && !self.public_key.is_empty()
    }
}

/// Request body for the send endpoint.
#[derive(Debug, Serialize)]
struct SendRequest<'a> {
    service_id: &'a str,
    template_id: &'a str,
    user_id: &'a str,
    #[serde(rename = "accessToken", skip_serializing_if = "Option::is_none")]
    access_token: Option<&'a str>,
    template_params: Value,
}

/// HTTP client for EmailJS.
#[derive(Debug, Clone)]
pub struct EmailJsClient {
    client: Client,
    config: EmailConfig,
}

impl EmailJsClient {
    /// Create a client. Fails if the config is incomplete.
    pub fn new(config: EmailConfig) -> Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(15)).build()?;
        Self::with_client(config, client)
    }

    /// Create a client with a custom reqwest Client.
    pub fn with_client(config: EmailConfig, client: Client) -> Result<Self> {
        if !config.is_configured() {
            return Err(Error::not_configured(
                "email requires service_id, template_id and public_key",
            ));
        }
        if !config.endpoint.starts_with("http://") && !config.endpoint.starts_with("https://") {
            return Err(Error::InvalidUrl(config.endpoint));
        }
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &EmailConfig {
        &self.config
    }

    /// Send the template with the given parameters.
    pub async fn send(&self, template_params: Value) -> Result<()> {
        let body = SendRequest {
            service_id: &self.config.service_id,
            template_id: &self.config.template_id,
            user_id: &self.config.public_key,
            access_token: self.config.access_token.as_deref(),
            template_params,
        };

        let response = self
            .client
            .post(&self.config.endpoint)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            debug!("Email sent");
            Ok(())
        } else {
            // EmailJS answers with a plain-text reason.
            let message = response
                .text()
                .await
                .ok()
                .filter(|t| !t.trim().is_empty())
                .unwrap_or_else(|| status.to_string());
            Err(Error::Api {
                status: status.as_u16(),
                message,
            })
        }
    }
}

/// Template parameters for an alert email.
///
/// Averages use one decimal place; the timestamp is rendered for people,
/// e.g. `5 March 2024 14:03:09 UTC`.
pub fn template_params(event: &AlertEvent) -> Value {
    json!({
        "timestamp": human_timestamp(event.timestamp),
        "temperature": format!("{:.1}", event.temperature),
        "humidity": format!("{:.1}", event.humidity),
        "air_quality": format!("{:.1}", event.air_quality),
        "message": event.message,
        "type": event.kind.label(),
    })
}

fn human_timestamp(ts: OffsetDateTime) -> String {
    format!(
        "{} {} {} {:02}:{:02}:{:02} UTC",
        ts.day(),
        ts.month(),
        ts.year(),
        ts.hour(),
        ts.minute(),
        ts.second()
    )
}

/// Alert channel sending one email per alert.
#[derive(Debug, Clone)]
pub struct EmailChannel {
    client: Option<EmailJsClient>,
}

impl EmailChannel {
    pub fn new(client: EmailJsClient) -> Self {
        Self {
            client: Some(client),
        }
    }

    /// A channel that always skips.
    pub fn unconfigured() -> Self {
        Self { client: None }
    }

    /// Build from config, skipping when the account is not configured.
    pub fn from_config(config: &EmailConfig) -> Result<Self> {
        if config.is_configured() {
            Ok(Self::new(EmailJsClient::new(config.clone())?))
        } else {
            Ok(Self::unconfigured())
        }
    }
}

#[async_trait]
impl AlertChannel for EmailChannel {
    fn name(&self) -> &'static str {
        "email"
    }

    async fn deliver(&self, event: &AlertEvent) -> Result<Delivery> {
        let Some(client) = &self.client else {
            return Ok(Delivery::Skipped("email not configured".to_string()));
        };
        client.send(template_params(event)).await?;
        Ok(Delivery::Delivered)
    }
}
