mod cases;
mod functions;
mod misc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::state::AppState;

/// Builds the full application router.
pub fn router(state: AppState, max_upload_bytes: usize) -> Router {
    let functions = Router::new()
        .route(
            "/functions/analyze-medical-image",
            post(functions::analyze_medical_image),
        )
        .route("/functions/generate-report", post(functions::generate_report))
        .route("/functions/generate-article", post(functions::generate_article))
        .route("/functions/publish-article", post(functions::publish_article))
        .layer(CorsLayer::permissive());

    Router::new()
        // Cases
        .route("/api/cases", get(cases::list_cases).post(cases::upload_case))
        .route(
            "/api/cases/:id",
            get(cases::get_case)
                .patch(cases::update_case)
                .delete(cases::delete_case),
        )
        .route("/api/cases/:id/analyze", post(cases::reanalyze))
        .route("/api/cases/:id/report", post(cases::generate_report))
        .route("/api/cases/:id/article", post(cases::generate_article))
        .route(
            "/api/cases/:id/sections/:section/expand",
            post(cases::expand_section),
        )
        .route("/api/cases/:id/publish", post(cases::publish))
        .route("/api/cases/:id/export", get(cases::export_article))
        // Composer and catalogue
        .route("/api/dashboard", get(misc::dashboard))
        .route("/api/templates", get(misc::templates))
        .route("/api/compose", post(misc::compose))
        .route("/api/demo-cases", get(misc::demo_cases))
        .route("/api/demo-cases/:id/start", post(misc::start_demo))
        .route("/health", get(misc::health))
        .merge(functions)
        .with_state(state)
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use chrono::Utc;
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use tempfile::TempDir;
    use tower::ServiceExt;

    use medpub::db::demo_repo;
    use medpub::{
        AnalysisCase, CaseProxy, CaseRepository, Database, DemoCase, FsObjectStore, Modality,
        NewCase, Proxy, Session, Webhook, WebhookEndpoint, WebhookError, Workflow,
    };

    use super::*;
    use crate::auth::USER_ID_HEADER;

    /// Answers every endpoint with a fixed body, or fails with a status.
    struct StubWebhook {
        status: Option<u16>,
        calls: Mutex<Vec<WebhookEndpoint>>,
    }

    #[async_trait]
    impl Webhook for StubWebhook {
        async fn post(&self, endpoint: WebhookEndpoint, _: &Value) -> Result<Value, WebhookError> {
            self.calls.lock().unwrap().push(endpoint);
            match self.status {
                Some(status) => Err(WebhookError::Status {
                    status,
                    body: String::new(),
                }),
                None => Ok(json!({
                    "analysis_result": "no acute findings",
                    "report_text": "Impression: normal study.",
                })),
            }
        }
    }

    struct TestApp {
        _temp_dir: TempDir,
        db: Database,
        router: Router,
    }

    fn test_app(webhook_status: Option<u16>) -> TestApp {
        let temp_dir = TempDir::new().unwrap();
        let db = Database::open_in_memory().unwrap();
        let repo: Arc<dyn CaseRepository> = Arc::new(db.clone());
        let webhook = Arc::new(StubWebhook {
            status: webhook_status,
            calls: Mutex::new(Vec::new()),
        });
        let proxy: Arc<dyn CaseProxy> = Arc::new(
            Proxy::new(repo.clone(), webhook).with_publish_base_url("https://pub.test"),
        );
        let store = Arc::new(FsObjectStore::new(temp_dir.path()));
        let workflow = Arc::new(Workflow::new(repo, store, proxy.clone()));
        let router = router(AppState::new(workflow, proxy), 1024 * 1024);
        TestApp {
            _temp_dir: temp_dir,
            db,
            router,
        }
    }

    fn insert_case(db: &Database, user: &str) -> AnalysisCase {
        let session = Session::new(user).unwrap();
        let case = AnalysisCase::new(
            &session,
            NewCase {
                modality: Modality::Mri,
                body_region: "Brain".to_string(),
                notes: None,
                image_paths: vec![],
                models: vec![],
                tasks: vec![],
            },
        );
        db.insert(&session, &case).unwrap();
        case
    }

    async fn send(app: &TestApp, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    fn json_request(method: &str, uri: &str, user: Option<&str>, body: Value) -> Request<Body> {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(user) = user {
            builder = builder.header(USER_ID_HEADER, user);
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    fn get_request(uri: &str, user: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri(uri);
        if let Some(user) = user {
            builder = builder.header(USER_ID_HEADER, user);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let app = test_app(None);
        let (status, body) = send(&app, get_request("/health", None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_missing_user_is_unauthorized() {
        let app = test_app(None);
        let (status, body) = send(&app, get_request("/api/cases", None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Authentication required");
    }

    #[tokio::test]
    async fn test_analyze_function_returns_envelope() {
        let app = test_app(None);
        let case = insert_case(&app.db, "u1");

        let (status, body) = send(
            &app,
            json_request(
                "POST",
                "/functions/analyze-medical-image",
                Some("u1"),
                json!({ "analysis_id": case.id, "image_paths": [] }),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "success": true, "analysis_result": "no acute findings" }));
    }

    #[tokio::test]
    async fn test_function_failure_is_500_with_message() {
        let app = test_app(Some(503));
        let case = insert_case(&app.db, "u1");

        let (status, body) = send(
            &app,
            json_request(
                "POST",
                "/functions/generate-report",
                Some("u1"),
                json!({ "analysis_id": case.id }),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Webhook failed: 503");
    }

    #[tokio::test]
    async fn test_function_without_id_is_500() {
        let app = test_app(None);
        let (status, body) = send(
            &app,
            json_request("POST", "/functions/publish-article", Some("u1"), json!({})),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body["error"].as_str().unwrap().contains("analysis_id"));
    }

    #[tokio::test]
    async fn test_case_of_other_user_is_not_found() {
        let app = test_app(None);
        let case = insert_case(&app.db, "alice");

        let (status, _) = send(
            &app,
            get_request(&format!("/api/cases/{}", case.id), Some("bob")),
        )
        .await;

        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_report_before_analysis_is_bad_request() {
        let app = test_app(None);
        let case = insert_case(&app.db, "u1");

        let (status, body) = send(
            &app,
            json_request(
                "POST",
                &format!("/api/cases/{}/report", case.id),
                Some("u1"),
                Value::Null,
            ),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("analysis result"));
    }

    #[tokio::test]
    async fn test_workflow_actions_through_api() {
        let app = test_app(None);
        let case = insert_case(&app.db, "u1");
        let base = format!("/api/cases/{}", case.id);

        let (status, body) = send(
            &app,
            json_request("POST", &format!("{}/analyze", base), Some("u1"), Value::Null),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "analyzed");

        let (_, body) = send(
            &app,
            json_request("POST", &format!("{}/report", base), Some("u1"), Value::Null),
        )
        .await;
        assert_eq!(body["status"], "report_draft");

        let (_, body) = send(
            &app,
            json_request(
                "POST",
                &format!("{}/article", base),
                Some("u1"),
                json!({ "template_key": "case-report", "tone": "Clinical" }),
            ),
        )
        .await;
        assert_eq!(body["status"], "article_draft");
        assert_eq!(body["template_key"], "case-report");

        let (_, body) = send(
            &app,
            json_request("POST", &format!("{}/publish", base), Some("u1"), Value::Null),
        )
        .await;
        assert_eq!(body["status"], "published");
        assert_eq!(
            body["published_url"],
            format!("https://pub.test/{}", case.id)
        );

        let (_, body) = send(&app, get_request("/api/dashboard", Some("u1"))).await;
        assert_eq!(body["total"], 1);
    }

    #[tokio::test]
    async fn test_patch_updates_notes_and_sections() {
        let app = test_app(None);
        let case = insert_case(&app.db, "u1");

        let (status, body) = send(
            &app,
            json_request(
                "PATCH",
                &format!("/api/cases/{}", case.id),
                Some("u1"),
                json!({
                    "notes": "follow-up in 6 weeks",
                    "article_sections": { "title": "T", "methods": "M" }
                }),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["notes"], "follow-up in 6 weeks");
        assert_eq!(body["article_text"], "# T\n\n## Methods\n\nM\n");
    }

    #[tokio::test]
    async fn test_export_article_as_html() {
        let app = test_app(None);
        let case = insert_case(&app.db, "u1");
        let uri = format!("/api/cases/{}/export", case.id);

        let (status, body) = send(&app, get_request(&uri, Some("u1"))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("article text"));

        send(
            &app,
            json_request(
                "PATCH",
                &format!("/api/cases/{}", case.id),
                Some("u1"),
                json!({ "article_sections": { "title": "T", "methods": "M" } }),
            ),
        )
        .await;

        let response = app
            .router
            .clone()
            .oneshot(get_request(&uri, Some("u1")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let content_type = response.headers()[header::CONTENT_TYPE].to_str().unwrap().to_string();
        assert!(content_type.starts_with("text/html"));
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let html = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(html.contains("<h1>T</h1>"));
        assert!(html.contains("<h2>Methods</h2>"));
    }

    #[tokio::test]
    async fn test_delete_case() {
        let app = test_app(None);
        let case = insert_case(&app.db, "u1");

        let (status, body) = send(
            &app,
            json_request("DELETE", &format!("/api/cases/{}", case.id), Some("u1"), Value::Null),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["case_id"], case.id);

        let (status, _) = send(
            &app,
            get_request(&format!("/api/cases/{}", case.id), Some("u1")),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_upload_multipart() {
        let app = test_app(None);
        let boundary = "medpub-boundary";
        let body = format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"modality\"\r\n\r\nCT\r\n\
             --{b}\r\nContent-Disposition: form-data; name=\"body_region\"\r\n\r\nChest\r\n\
             --{b}\r\nContent-Disposition: form-data; name=\"files\"; filename=\"scan.png\"\r\n\
             Content-Type: image/png\r\n\r\nPNGDATA\r\n--{b}--\r\n",
            b = boundary
        );
        let request = Request::builder()
            .method("POST")
            .uri("/api/cases")
            .header(USER_ID_HEADER, "u1")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", boundary),
            )
            .body(Body::from(body))
            .unwrap();

        let (status, body) = send(&app, request).await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["case"]["status"], "analyzed");
        assert_eq!(body["case"]["modality"], "CT");
        assert_eq!(body["dispatch"]["state"], "completed");
        let path = body["case"]["image_paths"][0].as_str().unwrap();
        assert!(path.starts_with("u1/") && path.ends_with("-scan.png"));
    }

    #[tokio::test]
    async fn test_compose_and_templates() {
        let app = test_app(None);

        let (status, body) = send(
            &app,
            json_request(
                "POST",
                "/api/compose",
                None,
                json!({ "document": { "title": "T", "abstract": "", "methods": "M" } }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["markup"], "# T\n\n## Methods\n\nM\n");

        let (_, body) = send(&app, get_request("/api/templates", None)).await;
        assert_eq!(body["templates"].as_array().unwrap().len(), 5);
        assert_eq!(body["tones"][0], "Academic");
    }

    #[tokio::test]
    async fn test_start_demo_case() {
        let app = test_app(None);
        demo_repo::upsert(
            &app.db,
            &DemoCase {
                id: "demo-1".to_string(),
                title: "Demo".to_string(),
                modality: Modality::Ct,
                body_region: "Chest".to_string(),
                image_paths: vec![],
                analysis_result: Some("finding".to_string()),
                report_text: None,
                article_sections: None,
                created_at: Utc::now(),
            },
        )
        .unwrap();

        let (_, body) = send(&app, get_request("/api/demo-cases", None)).await;
        assert_eq!(body.as_array().unwrap().len(), 1);

        let (status, body) = send(
            &app,
            json_request("POST", "/api/demo-cases/demo-1/start", Some("u1"), Value::Null),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["status"], "analyzed");

        let (status, _) = send(
            &app,
            json_request("POST", "/api/demo-cases/missing/start", Some("u1"), Value::Null),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
