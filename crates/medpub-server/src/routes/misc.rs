use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use medpub::composer::{TEMPLATES, TONES};
use medpub::workflow::Dashboard;
use medpub::{compose_markup, insert_into_template, AnalysisCase, ArticleDocument, DemoCase, TemplateKey};

use crate::auth::Caller;
use crate::error::ApiError;
use crate::state::AppState;

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

pub async fn dashboard(
    State(state): State<AppState>,
    Caller(session): Caller,
) -> Result<Json<Dashboard>, ApiError> {
    Ok(Json(state.workflow.dashboard(&session)?))
}

#[derive(Debug, Serialize)]
pub struct TemplateView {
    pub key: TemplateKey,
    pub title: &'static str,
    pub description: &'static str,
    pub outline: &'static [&'static str],
    pub skeleton: String,
}

#[derive(Debug, Serialize)]
pub struct TemplateCatalogue {
    pub templates: Vec<TemplateView>,
    pub tones: &'static [&'static str],
}

pub async fn templates() -> Json<TemplateCatalogue> {
    let templates = TEMPLATES
        .iter()
        .map(|t| TemplateView {
            key: t.key,
            title: t.title,
            description: t.description,
            outline: t.outline,
            skeleton: t.skeleton(),
        })
        .collect();
    Json(TemplateCatalogue {
        templates,
        tones: &TONES,
    })
}

#[derive(Debug, Deserialize)]
pub struct ComposeRequest {
    pub document: ArticleDocument,
    #[serde(default)]
    pub template_key: Option<TemplateKey>,
}

#[derive(Debug, Serialize)]
pub struct ComposeResponse {
    pub markup: String,
}

pub async fn compose(Json(request): Json<ComposeRequest>) -> Json<ComposeResponse> {
    let markup = match request.template_key {
        Some(key) => insert_into_template(&request.document, key),
        None => compose_markup(&request.document),
    };
    Json(ComposeResponse { markup })
}

pub async fn demo_cases(State(state): State<AppState>) -> Result<Json<Vec<DemoCase>>, ApiError> {
    Ok(Json(state.workflow.list_demo_cases()?))
}

pub async fn start_demo(
    State(state): State<AppState>,
    Caller(session): Caller,
    Path(id): Path<String>,
) -> Result<(StatusCode, Json<AnalysisCase>), ApiError> {
    let case = state.workflow.start_from_demo(&session, &id)?;
    Ok((StatusCode::CREATED, Json(case)))
}
