use tracing::{info, info_span, Instrument};

use super::{require_id, text_field, AnalyzeRequest, AnalyzeResponse, Proxy, ProxyError};
use crate::case::{CasePatch, CaseStatus};
use crate::session::Session;
use crate::webhook::WebhookEndpoint;

pub(crate) const FALLBACK_ANALYSIS: &str = "Analysis completed successfully";

impl Proxy {
    /// `uploaded|* → analyzing → analyzed`. On webhook failure the case is
    /// left in `analyzing`.
    pub(super) async fn run_analyze(
        &self,
        session: &Session,
        request: &AnalyzeRequest,
    ) -> Result<AnalyzeResponse, ProxyError> {
        require_id(&request.analysis_id)?;
        let id = request.analysis_id.as_str();

        let span = info_span!(
            "proxy.analyze",
            case_id = %id,
            image_count = request.image_paths.len()
        );
        async move {
            let tracker = self.events.start(id, session.user_id(), WebhookEndpoint::Analyze);

            self.cases
                .update(session, id, &CasePatch::status(CaseStatus::Analyzing))?;
            tracker.started(Some(CaseStatus::Analyzing));

            let response = self.call(WebhookEndpoint::Analyze, request, &tracker).await?;

            let analysis_result = text_field(&response, "analysis_result")
                .unwrap_or_else(|| FALLBACK_ANALYSIS.to_string());

            self.cases.update(
                session,
                id,
                &CasePatch {
                    analysis_result: Some(analysis_result.clone()),
                    status: Some(CaseStatus::Analyzed),
                    ..Default::default()
                },
            )?;
            tracker.completed(Some(CaseStatus::Analyzed));
            info!("Analysis completed for case {}", id);

            Ok(AnalyzeResponse {
                success: true,
                analysis_result,
            })
        }
        .instrument(span)
        .await
    }
}
