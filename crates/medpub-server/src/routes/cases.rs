use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::Html,
    Json,
};
use serde::Deserialize;

use medpub::workflow::{
    parse_keywords, ArticleDraft, ArticleOptions, CasePage, DeleteOutcome, ImageUpload,
    UploadOutcome, UploadRequest,
};
use medpub::{AnalysisCase, ArticleDocument, CaseFilter, CaseStatus, Modality, SectionKind, TemplateKey};

use crate::auth::Caller;
use crate::error::ApiError;
use crate::state::AppState;

type ApiResult<T> = Result<Json<T>, ApiError>;

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub status: Option<CaseStatus>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

pub async fn list_cases(
    State(state): State<AppState>,
    Caller(session): Caller,
    Query(params): Query<ListParams>,
) -> ApiResult<CasePage> {
    let filter = CaseFilter {
        status: params.status,
        limit: params.limit,
        offset: params.offset,
    };
    Ok(Json(state.workflow.list_cases(&session, &filter)?))
}

fn bad_request(e: impl std::fmt::Display) -> ApiError {
    ApiError::BadRequest(e.to_string())
}

/// Reads the upload form: `modality`, `body_region`, optional `notes`,
/// `models`, `tasks` (comma separated) and `template`, plus one or more
/// file parts.
async fn read_upload_form(mut multipart: Multipart) -> Result<UploadRequest, ApiError> {
    let mut modality = None;
    let mut request = UploadRequest {
        modality: Modality::Other,
        body_region: String::new(),
        notes: None,
        models: Vec::new(),
        tasks: Vec::new(),
        template: None,
        files: Vec::new(),
    };

    while let Some(field) = multipart.next_field().await.map_err(bad_request)? {
        let name = field.name().unwrap_or_default().to_string();
        if let Some(file_name) = field.file_name().map(str::to_string) {
            let content = field.bytes().await.map_err(bad_request)?;
            request.files.push(ImageUpload::new(file_name, content.to_vec()));
            continue;
        }

        let value = field.text().await.map_err(bad_request)?;
        match name.as_str() {
            "modality" => modality = Some(value.parse::<Modality>().map_err(bad_request)?),
            "body_region" => request.body_region = value,
            "notes" => request.notes = Some(value),
            "models" => request.models = parse_keywords(&value),
            "tasks" => request.tasks = parse_keywords(&value),
            "template" => request.template = Some(value).filter(|t| !t.trim().is_empty()),
            other => tracing::debug!("Ignoring upload form field '{}'", other),
        }
    }

    request.modality = modality.ok_or_else(|| bad_request("modality is required"))?;
    Ok(request)
}

pub async fn upload_case(
    State(state): State<AppState>,
    Caller(session): Caller,
    multipart: Multipart,
) -> Result<(StatusCode, Json<UploadOutcome>), ApiError> {
    let request = read_upload_form(multipart).await?;
    let outcome = state.workflow.upload_case(&session, request).await?;
    Ok((StatusCode::CREATED, Json(outcome)))
}

pub async fn get_case(
    State(state): State<AppState>,
    Caller(session): Caller,
    Path(id): Path<String>,
) -> ApiResult<AnalysisCase> {
    Ok(Json(state.workflow.get_case(&session, &id)?))
}

/// Editor changes. Applied in order: notes, template, article fields,
/// composer sections.
#[derive(Debug, Default, Deserialize)]
pub struct CaseUpdate {
    pub notes: Option<String>,
    pub template_key: Option<TemplateKey>,
    #[serde(flatten)]
    pub draft: ArticleDraft,
    pub article_sections: Option<ArticleDocument>,
}

impl CaseUpdate {
    fn has_draft(&self) -> bool {
        let d = &self.draft;
        d.article_text.is_some()
            || d.article_title.is_some()
            || d.tone.is_some()
            || d.keywords.is_some()
            || d.citations.is_some()
    }
}

pub async fn update_case(
    State(state): State<AppState>,
    Caller(session): Caller,
    Path(id): Path<String>,
    Json(update): Json<CaseUpdate>,
) -> ApiResult<AnalysisCase> {
    let workflow = &state.workflow;
    let mut case = workflow.get_case(&session, &id)?;

    if let Some(notes) = &update.notes {
        case = workflow.save_notes(&session, &id, notes)?;
    }
    if let Some(key) = update.template_key {
        case = workflow.select_template(&session, &id, key)?;
    }
    if update.has_draft() {
        case = workflow.save_article_draft(&session, &id, update.draft.clone())?;
    }
    if let Some(document) = update.article_sections {
        case = workflow.save_article_sections(&session, &id, document)?;
    }
    Ok(Json(case))
}

pub async fn delete_case(
    State(state): State<AppState>,
    Caller(session): Caller,
    Path(id): Path<String>,
) -> ApiResult<DeleteOutcome> {
    Ok(Json(state.workflow.delete_case(&session, &id)?))
}

pub async fn reanalyze(
    State(state): State<AppState>,
    Caller(session): Caller,
    Path(id): Path<String>,
) -> ApiResult<AnalysisCase> {
    Ok(Json(state.workflow.reanalyze(&session, &id).await?))
}

pub async fn generate_report(
    State(state): State<AppState>,
    Caller(session): Caller,
    Path(id): Path<String>,
) -> ApiResult<AnalysisCase> {
    Ok(Json(state.workflow.generate_report(&session, &id).await?))
}

pub async fn generate_article(
    State(state): State<AppState>,
    Caller(session): Caller,
    Path(id): Path<String>,
    options: Option<Json<ArticleOptions>>,
) -> ApiResult<AnalysisCase> {
    let options = options.map(|Json(o)| o).unwrap_or_default();
    Ok(Json(
        state.workflow.generate_article(&session, &id, options).await?,
    ))
}

pub async fn expand_section(
    State(state): State<AppState>,
    Caller(session): Caller,
    Path((id, section)): Path<(String, SectionKind)>,
) -> ApiResult<ArticleDocument> {
    Ok(Json(
        state.workflow.expand_section(&session, &id, section).await?,
    ))
}

pub async fn publish(
    State(state): State<AppState>,
    Caller(session): Caller,
    Path(id): Path<String>,
) -> ApiResult<AnalysisCase> {
    Ok(Json(state.workflow.publish(&session, &id).await?))
}

pub async fn export_article(
    State(state): State<AppState>,
    Caller(session): Caller,
    Path(id): Path<String>,
) -> Result<Html<String>, ApiError> {
    Ok(Html(state.workflow.export_article(&session, &id)?))
}
