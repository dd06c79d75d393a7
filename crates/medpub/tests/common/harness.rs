//! Test harness wiring a real workflow against fakes.

#![allow(dead_code)]

use std::sync::Arc;

use chrono::Utc;
use tempfile::TempDir;

use medpub::case::{DemoCase, Modality};
use medpub::db::demo_repo;
use medpub::workflow::{ImageUpload, UploadOutcome, UploadRequest};
use medpub::{
    AnalysisCase, CaseEventBroadcaster, CaseProxy, CaseRepository, Database, FsObjectStore,
    Proxy, Session, Workflow,
};

use super::fakes::{new_call_log, CallLog, RecordingObjectStore, RecordingRepository, ScriptedWebhook};

pub const PUBLISH_BASE: &str = "https://journal.test/articles/";

/// Everything a workflow test needs, on an in-memory database and a
/// temporary object store.
pub struct TestHarness {
    pub temp_dir: TempDir,
    pub db: Database,
    pub log: CallLog,
    pub repo: Arc<RecordingRepository>,
    pub store: Arc<RecordingObjectStore>,
    pub webhook: Arc<ScriptedWebhook>,
    pub events: CaseEventBroadcaster,
    pub proxy: Arc<Proxy>,
    pub workflow: Workflow,
}

impl TestHarness {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db = Database::open_in_memory().expect("Failed to open database");
        let log = new_call_log();

        let repo = Arc::new(RecordingRepository::new(db.clone(), log.clone()));
        let store = Arc::new(RecordingObjectStore::new(
            FsObjectStore::new(temp_dir.path().join("objects")),
            log.clone(),
        ));
        let webhook = Arc::new(ScriptedWebhook::new());
        let events = CaseEventBroadcaster::default();
        let proxy = Arc::new(
            Proxy::new(repo.clone(), webhook.clone())
                .with_events(events.clone())
                .with_publish_base_url(PUBLISH_BASE),
        );
        let workflow = Workflow::new(repo.clone(), store.clone(), proxy.clone());

        Self {
            temp_dir,
            db,
            log,
            repo,
            store,
            webhook,
            events,
            proxy,
            workflow,
        }
    }

    /// Points the workflow at `proxy` instead of the real one.
    pub fn set_proxy(&mut self, proxy: Arc<dyn CaseProxy>) {
        self.workflow = Workflow::new(self.repo.clone(), self.store.clone(), proxy);
    }

    pub fn repository(&self) -> Arc<dyn CaseRepository> {
        self.repo.clone()
    }

    pub fn session(&self, user_id: &str) -> Session {
        Session::new(user_id).expect("non-empty user id")
    }

    pub fn calls(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }

    pub fn clear_calls(&self) {
        self.log.lock().unwrap().clear();
    }

    pub fn upload_request(&self, files: &[&str]) -> UploadRequest {
        UploadRequest {
            modality: Modality::Ct,
            body_region: "Chest".to_string(),
            notes: Some("65M, persistent cough".to_string()),
            models: vec!["general-vision".to_string()],
            tasks: vec!["findings".to_string()],
            template: None,
            files: files
                .iter()
                .map(|name| ImageUpload::new(*name, format!("bytes of {}", name).into_bytes()))
                .collect(),
        }
    }

    pub async fn upload(&self, session: &Session, files: &[&str]) -> UploadOutcome {
        self.workflow
            .upload_case(session, self.upload_request(files))
            .await
            .expect("upload should succeed")
    }

    pub fn stored(&self, session: &Session, id: &str) -> Option<AnalysisCase> {
        self.repo.get(session, id).expect("repository read")
    }

    pub fn seed_demo(&self, id: &str, report: Option<&str>) -> DemoCase {
        let demo = DemoCase {
            id: id.to_string(),
            title: "Right lower lobe pneumonia".to_string(),
            modality: Modality::XRay,
            body_region: "Chest".to_string(),
            image_paths: vec![format!("demo/{}/0-frontal.png", id)],
            analysis_result: Some("Consolidation in the right lower lobe".to_string()),
            report_text: report.map(str::to_string),
            article_sections: None,
            created_at: Utc::now(),
        };
        demo_repo::upsert(&self.db, &demo).expect("seed demo case");
        demo
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}
