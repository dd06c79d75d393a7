//! Thin proxies between a case and its external webhook.
//!
//! Each step forwards its request body unchanged (plus the bearer token),
//! writes the webhook's answer back onto the case and returns a small JSON
//! envelope. Proxies do not check workflow prerequisites; a failed webhook
//! call leaves whatever status was already written.

mod analyze;
mod article;
mod publish;
mod report;
pub mod types;

pub use types::{
    AnalyzeRequest, AnalyzeResponse, ArticleRequest, ArticleResponse, PublishRequest,
    PublishResponse, ReportRequest, ReportResponse,
};

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::broadcast::{CaseEventBroadcaster, CaseStepTracker};
use crate::case::AnalysisCase;
use crate::config::DEFAULT_PUBLISH_BASE_URL;
use crate::db::DatabaseError;
use crate::repository::CaseRepository;
use crate::session::Session;
use crate::webhook::{Webhook, WebhookEndpoint, WebhookError};

#[derive(Error, Debug)]
pub enum ProxyError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Analysis case '{0}' not found")]
    CaseNotFound(String),

    #[error(transparent)]
    Webhook(#[from] WebhookError),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Failed to encode webhook payload: {0}")]
    Encode(#[from] serde_json::Error),
}

/// The four proxy functions.
#[async_trait]
pub trait CaseProxy: Send + Sync {
    async fn analyze(
        &self,
        session: &Session,
        request: &AnalyzeRequest,
    ) -> Result<AnalyzeResponse, ProxyError>;

    async fn generate_report(
        &self,
        session: &Session,
        request: &ReportRequest,
    ) -> Result<ReportResponse, ProxyError>;

    async fn generate_article(
        &self,
        session: &Session,
        request: &ArticleRequest,
    ) -> Result<ArticleResponse, ProxyError>;

    async fn publish_article(
        &self,
        session: &Session,
        request: &PublishRequest,
    ) -> Result<PublishResponse, ProxyError>;
}

/// Webhook-backed [`CaseProxy`].
pub struct Proxy {
    cases: Arc<dyn CaseRepository>,
    webhook: Arc<dyn Webhook>,
    events: CaseEventBroadcaster,
    publish_base_url: String,
}

impl Proxy {
    pub fn new(cases: Arc<dyn CaseRepository>, webhook: Arc<dyn Webhook>) -> Self {
        Self {
            cases,
            webhook,
            events: CaseEventBroadcaster::default(),
            publish_base_url: DEFAULT_PUBLISH_BASE_URL.to_string(),
        }
    }

    pub fn with_events(mut self, events: CaseEventBroadcaster) -> Self {
        self.events = events;
        self
    }

    /// Base of the URL recorded when the publish webhook returns none.
    pub fn with_publish_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.publish_base_url = base_url.into();
        self
    }

    pub fn events(&self) -> &CaseEventBroadcaster {
        &self.events
    }

    fn load_case(&self, session: &Session, id: &str) -> Result<AnalysisCase, ProxyError> {
        self.cases
            .get(session, id)?
            .ok_or_else(|| ProxyError::CaseNotFound(id.to_string()))
    }

    /// Posts `request` as-is; reports failures on the tracker.
    async fn call<T: Serialize + Sync>(
        &self,
        endpoint: WebhookEndpoint,
        request: &T,
        tracker: &CaseStepTracker,
    ) -> Result<Value, ProxyError> {
        let payload = serde_json::to_value(request)?;
        self.webhook.post(endpoint, &payload).await.map_err(|e| {
            log::warn!("{} webhook failed: {}", endpoint, e);
            tracker.failed(&e.to_string());
            ProxyError::from(e)
        })
    }
}

#[async_trait]
impl CaseProxy for Proxy {
    async fn analyze(
        &self,
        session: &Session,
        request: &AnalyzeRequest,
    ) -> Result<AnalyzeResponse, ProxyError> {
        self.run_analyze(session, request).await
    }

    async fn generate_report(
        &self,
        session: &Session,
        request: &ReportRequest,
    ) -> Result<ReportResponse, ProxyError> {
        self.run_report(session, request).await
    }

    async fn generate_article(
        &self,
        session: &Session,
        request: &ArticleRequest,
    ) -> Result<ArticleResponse, ProxyError> {
        self.run_article(session, request).await
    }

    async fn publish_article(
        &self,
        session: &Session,
        request: &PublishRequest,
    ) -> Result<PublishResponse, ProxyError> {
        self.run_publish(session, request).await
    }
}

fn require_id(id: &str) -> Result<(), ProxyError> {
    if id.trim().is_empty() {
        return Err(ProxyError::MissingField("analysis_id"));
    }
    Ok(())
}

/// A non-blank string field of a webhook response.
fn text_field(response: &Value, field: &str) -> Option<String> {
    response
        .get(field)
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_text_field() {
        let response = json!({ "a": "x", "b": "  ", "c": 3 });
        assert_eq!(text_field(&response, "a").as_deref(), Some("x"));
        assert!(text_field(&response, "b").is_none());
        assert!(text_field(&response, "c").is_none());
        assert!(text_field(&response, "d").is_none());
    }

    #[test]
    fn test_require_id() {
        assert!(require_id("case-1").is_ok());
        assert!(matches!(
            require_id(" "),
            Err(ProxyError::MissingField("analysis_id"))
        ));
    }

    #[test]
    fn test_request_omits_unset_fields() {
        let request = ArticleRequest {
            analysis_id: "c1".to_string(),
            tone: Some("Academic".to_string()),
            ..Default::default()
        };
        let payload = serde_json::to_value(&request).unwrap();
        assert_eq!(payload["analysis_id"], "c1");
        assert_eq!(payload["tone"], "Academic");
        assert!(payload.get("title").is_none());
        assert!(payload.get("section").is_none());
        assert_eq!(payload["keywords"], json!([]));
        assert_eq!(payload["use_report"], false);
    }
}
