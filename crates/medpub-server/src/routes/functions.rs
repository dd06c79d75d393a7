//! The four proxy functions. Request bodies are passed to the proxy as-is;
//! every failure is a 500 `{ "error": ... }`.

use axum::{extract::State, Json};

use medpub::proxy::{
    AnalyzeRequest, AnalyzeResponse, ArticleRequest, ArticleResponse, PublishRequest,
    PublishResponse, ReportRequest, ReportResponse,
};

use crate::auth::Caller;
use crate::error::FunctionError;
use crate::state::AppState;

type FunctionResult<T> = Result<Json<T>, FunctionError>;

pub async fn analyze_medical_image(
    State(state): State<AppState>,
    Caller(session): Caller,
    Json(request): Json<AnalyzeRequest>,
) -> FunctionResult<AnalyzeResponse> {
    Ok(Json(state.proxy.analyze(&session, &request).await?))
}

pub async fn generate_report(
    State(state): State<AppState>,
    Caller(session): Caller,
    Json(request): Json<ReportRequest>,
) -> FunctionResult<ReportResponse> {
    Ok(Json(state.proxy.generate_report(&session, &request).await?))
}

pub async fn generate_article(
    State(state): State<AppState>,
    Caller(session): Caller,
    Json(request): Json<ArticleRequest>,
) -> FunctionResult<ArticleResponse> {
    Ok(Json(state.proxy.generate_article(&session, &request).await?))
}

pub async fn publish_article(
    State(state): State<AppState>,
    Caller(session): Caller,
    Json(request): Json<PublishRequest>,
) -> FunctionResult<PublishResponse> {
    Ok(Json(state.proxy.publish_article(&session, &request).await?))
}
