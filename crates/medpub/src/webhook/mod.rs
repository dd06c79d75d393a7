//! Outbound calls to the externally hosted AI webhooks.

pub mod client;
pub mod error;

pub use client::HttpWebhookClient;
pub use error::WebhookError;

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The four externally hosted steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WebhookEndpoint {
    Analyze,
    GenerateReport,
    GenerateArticle,
    PublishArticle,
}

impl WebhookEndpoint {
    pub const ALL: [WebhookEndpoint; 4] = [
        WebhookEndpoint::Analyze,
        WebhookEndpoint::GenerateReport,
        WebhookEndpoint::GenerateArticle,
        WebhookEndpoint::PublishArticle,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            WebhookEndpoint::Analyze => "analyze",
            WebhookEndpoint::GenerateReport => "generate_report",
            WebhookEndpoint::GenerateArticle => "generate_article",
            WebhookEndpoint::PublishArticle => "publish_article",
        }
    }

    /// Environment variable that overrides the configured URL.
    pub fn env_var(&self) -> &'static str {
        match self {
            WebhookEndpoint::Analyze => "ANALYZE_WEBHOOK_URL",
            WebhookEndpoint::GenerateReport => "GENERATE_REPORT_WEBHOOK_URL",
            WebhookEndpoint::GenerateArticle => "GENERATE_ARTICLE_WEBHOOK_URL",
            WebhookEndpoint::PublishArticle => "PUBLISH_ARTICLE_WEBHOOK_URL",
        }
    }
}

impl fmt::Display for WebhookEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One JSON `POST` per call; any non-2xx answer is an error.
#[async_trait]
pub trait Webhook: Send + Sync {
    async fn post(&self, endpoint: WebhookEndpoint, payload: &Value) -> Result<Value, WebhookError>;
}
