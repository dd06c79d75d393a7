//! Case event broadcaster for live status updates.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::case::CaseStatus;
use crate::webhook::WebhookEndpoint;

/// Where a proxy step stands.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StepOutcome {
    Started,
    Completed,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaseEvent {
    pub case_id: String,
    pub user_id: String,
    pub step: WebhookEndpoint,
    pub outcome: StepOutcome,
    /// Status persisted when the event was sent, if it changed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<CaseStatus>,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Fan-out of [`CaseEvent`]s. Sending with no subscribers is not an error.
#[derive(Clone)]
pub struct CaseEventBroadcaster {
    sender: Arc<broadcast::Sender<CaseEvent>>,
}

impl CaseEventBroadcaster {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender: Arc::new(sender),
        }
    }

    pub fn send(&self, event: CaseEvent) {
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CaseEvent> {
        self.sender.subscribe()
    }

    /// Starts tracking one proxy step for a case.
    pub fn start(&self, case_id: &str, user_id: &str, step: WebhookEndpoint) -> CaseStepTracker {
        CaseStepTracker {
            case_id: case_id.to_string(),
            user_id: user_id.to_string(),
            step,
            sender: Arc::clone(&self.sender),
        }
    }
}

impl Default for CaseEventBroadcaster {
    fn default() -> Self {
        Self::new(100)
    }
}

/// Emits events for a single step of a single case.
pub struct CaseStepTracker {
    case_id: String,
    user_id: String,
    step: WebhookEndpoint,
    sender: Arc<broadcast::Sender<CaseEvent>>,
}

impl CaseStepTracker {
    fn emit(
        &self,
        outcome: StepOutcome,
        status: Option<CaseStatus>,
        message: String,
        error: Option<String>,
    ) {
        let _ = self.sender.send(CaseEvent {
            case_id: self.case_id.clone(),
            user_id: self.user_id.clone(),
            step: self.step,
            outcome,
            status,
            message,
            timestamp: Utc::now(),
            error,
        });
    }

    pub fn started(&self, status: Option<CaseStatus>) {
        self.emit(
            StepOutcome::Started,
            status,
            format!("{} started", self.step),
            None,
        );
    }

    pub fn completed(&self, status: Option<CaseStatus>) {
        self.emit(
            StepOutcome::Completed,
            status,
            format!("{} completed", self.step),
            None,
        );
    }

    pub fn failed(&self, error: &str) {
        self.emit(
            StepOutcome::Failed,
            None,
            format!("{} failed", self.step),
            Some(error.to_string()),
        );
    }
}
