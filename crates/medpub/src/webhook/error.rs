use thiserror::Error;

use super::WebhookEndpoint;
use crate::secrets::SecretError;

#[derive(Error, Debug)]
pub enum WebhookError {
    /// URL or bearer token for the endpoint is missing.
    #[error("Webhook configuration missing")]
    NotConfigured { endpoint: WebhookEndpoint },

    #[error("Failed to resolve webhook token: {0}")]
    Token(#[from] SecretError),

    #[error("Failed to create HTTP client: {0}")]
    ClientBuild(String),

    #[error("Webhook request to {endpoint} failed: {reason}")]
    Request {
        endpoint: WebhookEndpoint,
        reason: String,
    },

    #[error("Webhook {endpoint} timed out")]
    Timeout { endpoint: WebhookEndpoint },

    #[error("Webhook failed: {status}")]
    Status { status: u16, body: String },

    #[error("Webhook {endpoint} returned invalid JSON: {reason}")]
    InvalidResponse {
        endpoint: WebhookEndpoint,
        reason: String,
    },

    /// A successful response lacked a field the caller must persist.
    #[error("Webhook {endpoint} response is missing '{field}'")]
    MissingField {
        endpoint: WebhookEndpoint,
        field: &'static str,
    },
}

impl WebhookError {
    pub(crate) fn from_reqwest(endpoint: WebhookEndpoint, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            WebhookError::Timeout { endpoint }
        } else {
            // reqwest includes the URL in its message; strip it.
            WebhookError::Request {
                endpoint,
                reason: err.without_url().to_string(),
            }
        }
    }
}
