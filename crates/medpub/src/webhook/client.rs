use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use tracing::{debug, info_span, warn, Instrument};

use super::{Webhook, WebhookEndpoint, WebhookError};
use crate::config::WebhooksConfig;
use crate::sanitize::{redact_url, truncate_body};

const ERROR_BODY_CHARS: usize = 200;

fn create_http_client(timeout: Duration, connect_timeout: Duration) -> Result<Client, WebhookError> {
    Client::builder()
        .connect_timeout(connect_timeout)
        .timeout(timeout)
        .build()
        .map_err(|e| WebhookError::ClientBuild(e.to_string()))
}

/// Webhook caller backed by `reqwest`, authenticating with a bearer token.
pub struct HttpWebhookClient {
    client: Client,
    config: WebhooksConfig,
    token: Option<SecretString>,
}

impl HttpWebhookClient {
    /// Builds a client from config, resolving the token source now so a
    /// broken token file fails at startup rather than on first use.
    pub fn from_config(config: &WebhooksConfig) -> Result<Self, WebhookError> {
        let token = config.token.resolve_optional()?;
        Self::new(config.clone(), token)
    }

    pub fn new(config: WebhooksConfig, token: Option<SecretString>) -> Result<Self, WebhookError> {
        Ok(Self {
            client: create_http_client(config.timeout(), config.connect_timeout())?,
            config,
            token,
        })
    }

    pub fn is_configured(&self, endpoint: WebhookEndpoint) -> bool {
        self.token.is_some() && self.config.url(endpoint).is_some()
    }
}

#[async_trait]
impl Webhook for HttpWebhookClient {
    async fn post(&self, endpoint: WebhookEndpoint, payload: &Value) -> Result<Value, WebhookError> {
        let (url, token) = match (self.config.url(endpoint), self.token.as_ref()) {
            (Some(url), Some(token)) => (url, token),
            _ => return Err(WebhookError::NotConfigured { endpoint }),
        };

        let span = info_span!("webhook.post", endpoint = %endpoint, url = %redact_url(url));
        async move {
            let response = self
                .client
                .post(url)
                .bearer_auth(token.expose_secret())
                .json(payload)
                .send()
                .await
                .map_err(|e| WebhookError::from_reqwest(endpoint, e))?;

            let status = response.status();
            let body = response
                .text()
                .await
                .map_err(|e| WebhookError::from_reqwest(endpoint, e))?;

            if !status.is_success() {
                let body = truncate_body(&body, ERROR_BODY_CHARS);
                warn!("Webhook {} answered {}: {}", endpoint, status, body);
                return Err(WebhookError::Status {
                    status: status.as_u16(),
                    body,
                });
            }

            debug!("Webhook {} answered {} ({} bytes)", endpoint, status, body.len());

            // Some webhooks acknowledge with an empty 2xx; treat it as `{}`.
            if body.trim().is_empty() {
                return Ok(Value::Object(Default::default()));
            }

            serde_json::from_str(&body).map_err(|e| WebhookError::InvalidResponse {
                endpoint,
                reason: e.to_string(),
            })
        }
        .instrument(span)
        .await
    }
}
