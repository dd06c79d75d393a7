//! Test doubles for the trait seams.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{json, Value};

use medpub::case::{AnalysisCase, CasePatch, CaseStatus, DemoCase};
use medpub::db::case_repo::CaseFilter;
use medpub::proxy::{
    AnalyzeRequest, AnalyzeResponse, ArticleRequest, ArticleResponse, PublishRequest,
    PublishResponse, ReportRequest, ReportResponse,
};
use medpub::storage::{FsObjectStore, ObjectStore};
use medpub::{
    CaseProxy, CaseRepository, Database, DatabaseError, ProxyError, Session, StorageError,
    Webhook, WebhookEndpoint, WebhookError,
};

/// Ordered log of side effects shared between fakes.
pub type CallLog = Arc<Mutex<Vec<String>>>;

pub fn new_call_log() -> CallLog {
    Arc::new(Mutex::new(Vec::new()))
}

/// Canned webhook answer.
#[derive(Debug, Clone)]
pub enum Scripted {
    Json(Value),
    Status(u16),
}

/// A webhook that answers from per-endpoint queues and records every call.
/// An endpoint with an empty queue answers `{}`.
#[derive(Default)]
pub struct ScriptedWebhook {
    queues: Mutex<HashMap<WebhookEndpoint, VecDeque<Scripted>>>,
    calls: Mutex<Vec<(WebhookEndpoint, Value)>>,
}

impl ScriptedWebhook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, endpoint: WebhookEndpoint, body: Value) {
        self.push(endpoint, Scripted::Json(body));
    }

    pub fn fail(&self, endpoint: WebhookEndpoint, status: u16) {
        self.push(endpoint, Scripted::Status(status));
    }

    fn push(&self, endpoint: WebhookEndpoint, answer: Scripted) {
        self.queues
            .lock()
            .unwrap()
            .entry(endpoint)
            .or_default()
            .push_back(answer);
    }

    pub fn calls(&self) -> Vec<(WebhookEndpoint, Value)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, endpoint: WebhookEndpoint) -> Vec<Value> {
        self.calls()
            .into_iter()
            .filter(|(e, _)| *e == endpoint)
            .map(|(_, body)| body)
            .collect()
    }
}

#[async_trait]
impl Webhook for ScriptedWebhook {
    async fn post(&self, endpoint: WebhookEndpoint, payload: &Value) -> Result<Value, WebhookError> {
        self.calls.lock().unwrap().push((endpoint, payload.clone()));
        let answer = self
            .queues
            .lock()
            .unwrap()
            .get_mut(&endpoint)
            .and_then(|q| q.pop_front());
        match answer {
            Some(Scripted::Json(body)) => Ok(body),
            Some(Scripted::Status(status)) => Err(WebhookError::Status {
                status,
                body: "scripted failure".to_string(),
            }),
            None => Ok(json!({})),
        }
    }
}

/// Filesystem store that logs each batch removal.
pub struct RecordingObjectStore {
    inner: FsObjectStore,
    log: CallLog,
    removals: Mutex<Vec<Vec<String>>>,
    fail_removals: AtomicBool,
}

impl RecordingObjectStore {
    pub fn new(inner: FsObjectStore, log: CallLog) -> Self {
        Self {
            inner,
            log,
            removals: Mutex::new(Vec::new()),
            fail_removals: AtomicBool::new(false),
        }
    }

    pub fn removals(&self) -> Vec<Vec<String>> {
        self.removals.lock().unwrap().clone()
    }

    pub fn fail_removals(&self, fail: bool) {
        self.fail_removals.store(fail, Ordering::SeqCst);
    }

    pub fn root(&self) -> &std::path::Path {
        self.inner.root()
    }
}

impl ObjectStore for RecordingObjectStore {
    fn upload(&self, path: &str, content: &[u8]) -> Result<(), StorageError> {
        self.log.lock().unwrap().push(format!("upload:{}", path));
        self.inner.upload(path, content)
    }

    fn remove(&self, paths: &[String]) -> Result<usize, StorageError> {
        self.log
            .lock()
            .unwrap()
            .push(format!("remove:{}", paths.len()));
        self.removals.lock().unwrap().push(paths.to_vec());
        if self.fail_removals.load(Ordering::SeqCst) {
            return Err(StorageError::RemoveFile {
                path: paths.first().cloned().unwrap_or_default().into(),
                source: std::io::Error::new(std::io::ErrorKind::Other, "bucket unavailable"),
            });
        }
        self.inner.remove(paths)
    }
}

/// Database-backed repository that logs inserts and deletes.
pub struct RecordingRepository {
    inner: Database,
    log: CallLog,
}

impl RecordingRepository {
    pub fn new(inner: Database, log: CallLog) -> Self {
        Self { inner, log }
    }
}

impl CaseRepository for RecordingRepository {
    fn insert(&self, session: &Session, case: &AnalysisCase) -> Result<(), DatabaseError> {
        self.log.lock().unwrap().push(format!("insert:{}", case.id));
        self.inner.insert(session, case)
    }

    fn get(&self, session: &Session, id: &str) -> Result<Option<AnalysisCase>, DatabaseError> {
        self.inner.get(session, id)
    }

    fn list(
        &self,
        session: &Session,
        filter: &CaseFilter,
    ) -> Result<(Vec<AnalysisCase>, u64), DatabaseError> {
        self.inner.list(session, filter)
    }

    fn update(&self, session: &Session, id: &str, patch: &CasePatch) -> Result<(), DatabaseError> {
        if let Some(status) = patch.status {
            self.log
                .lock()
                .unwrap()
                .push(format!("status:{}", status));
        }
        self.inner.update(session, id, patch)
    }

    fn delete(&self, session: &Session, id: &str) -> Result<(), DatabaseError> {
        self.log.lock().unwrap().push(format!("delete:{}", id));
        self.inner.delete(session, id)
    }

    fn count_by_status(&self, session: &Session) -> Result<Vec<(CaseStatus, u64)>, DatabaseError> {
        self.inner.count_by_status(session)
    }

    fn revert_stale_analyzing(&self, cutoff: DateTime<Utc>) -> Result<Vec<String>, DatabaseError> {
        self.inner.revert_stale_analyzing(cutoff)
    }

    fn list_demo_cases(&self) -> Result<Vec<DemoCase>, DatabaseError> {
        self.inner.list_demo_cases()
    }

    fn find_demo_case(&self, id: &str) -> Result<Option<DemoCase>, DatabaseError> {
        self.inner.find_demo_case(id)
    }
}

fn unreachable_error() -> ProxyError {
    ProxyError::Webhook(WebhookError::Request {
        endpoint: WebhookEndpoint::Analyze,
        reason: "connection refused".to_string(),
    })
}

/// A proxy that cannot be reached at all; nothing is written.
pub struct UnreachableProxy;

#[async_trait]
impl CaseProxy for UnreachableProxy {
    async fn analyze(&self, _: &Session, _: &AnalyzeRequest) -> Result<AnalyzeResponse, ProxyError> {
        Err(unreachable_error())
    }

    async fn generate_report(
        &self,
        _: &Session,
        _: &ReportRequest,
    ) -> Result<ReportResponse, ProxyError> {
        Err(unreachable_error())
    }

    async fn generate_article(
        &self,
        _: &Session,
        _: &ArticleRequest,
    ) -> Result<ArticleResponse, ProxyError> {
        Err(unreachable_error())
    }

    async fn publish_article(
        &self,
        _: &Session,
        _: &PublishRequest,
    ) -> Result<PublishResponse, ProxyError> {
        Err(unreachable_error())
    }
}

/// Wraps a proxy and records the stored case as it is when `analyze` is
/// entered, before the inner proxy touches it.
pub struct ObservingProxy {
    inner: Arc<dyn CaseProxy>,
    repo: Arc<dyn CaseRepository>,
    seen: Mutex<Vec<AnalysisCase>>,
}

impl ObservingProxy {
    pub fn new(inner: Arc<dyn CaseProxy>, repo: Arc<dyn CaseRepository>) -> Self {
        Self {
            inner,
            repo,
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn seen(&self) -> Vec<AnalysisCase> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl CaseProxy for ObservingProxy {
    async fn analyze(
        &self,
        session: &Session,
        request: &AnalyzeRequest,
    ) -> Result<AnalyzeResponse, ProxyError> {
        if let Some(case) = self.repo.get(session, &request.analysis_id)? {
            self.seen.lock().unwrap().push(case);
        }
        self.inner.analyze(session, request).await
    }

    async fn generate_report(
        &self,
        session: &Session,
        request: &ReportRequest,
    ) -> Result<ReportResponse, ProxyError> {
        self.inner.generate_report(session, request).await
    }

    async fn generate_article(
        &self,
        session: &Session,
        request: &ArticleRequest,
    ) -> Result<ArticleResponse, ProxyError> {
        self.inner.generate_article(session, request).await
    }

    async fn publish_article(
        &self,
        session: &Session,
        request: &PublishRequest,
    ) -> Result<PublishResponse, ProxyError> {
        self.inner.publish_article(session, request).await
    }
}
