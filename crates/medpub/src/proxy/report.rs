use super::{require_id, text_field, Proxy, ProxyError, ReportRequest, ReportResponse};
use crate::case::{CasePatch, CaseStatus};
use crate::session::Session;
use crate::webhook::{WebhookEndpoint, WebhookError};

impl Proxy {
    pub(super) async fn run_report(
        &self,
        session: &Session,
        request: &ReportRequest,
    ) -> Result<ReportResponse, ProxyError> {
        require_id(&request.analysis_id)?;
        let id = request.analysis_id.as_str();
        let case = self.load_case(session, id)?;

        let tracker = self
            .events
            .start(id, session.user_id(), WebhookEndpoint::GenerateReport);
        tracker.started(None);

        let response = self
            .call(WebhookEndpoint::GenerateReport, request, &tracker)
            .await?;

        // Without text there is nothing to persist, so this counts as a failure.
        let report_text = match text_field(&response, "report_text") {
            Some(text) => text,
            None => {
                let err = WebhookError::MissingField {
                    endpoint: WebhookEndpoint::GenerateReport,
                    field: "report_text",
                };
                tracker.failed(&err.to_string());
                return Err(err.into());
            }
        };

        let status = case.status.advance(CaseStatus::ReportDraft);
        self.cases.update(
            session,
            id,
            &CasePatch {
                report_text: Some(report_text.clone()),
                status: Some(status),
                ..Default::default()
            },
        )?;
        tracker.completed(Some(status));
        log::info!("Report generated for case {}", id);

        Ok(ReportResponse {
            success: true,
            report_text,
        })
    }
}
