use super::{require_id, text_field, Proxy, ProxyError, PublishRequest, PublishResponse};
use crate::case::{CasePatch, CaseStatus};
use crate::session::Session;
use crate::webhook::WebhookEndpoint;

impl Proxy {
    pub(super) async fn run_publish(
        &self,
        session: &Session,
        request: &PublishRequest,
    ) -> Result<PublishResponse, ProxyError> {
        require_id(&request.analysis_id)?;
        let id = request.analysis_id.as_str();
        let case = self.load_case(session, id)?;

        let tracker = self
            .events
            .start(id, session.user_id(), WebhookEndpoint::PublishArticle);
        tracker.started(None);

        let response = self
            .call(WebhookEndpoint::PublishArticle, request, &tracker)
            .await?;

        let published_url = text_field(&response, "published_url").unwrap_or_else(|| {
            format!("{}/{}", self.publish_base_url.trim_end_matches('/'), id)
        });

        let status = case.status.advance(CaseStatus::Published);
        self.cases.update(
            session,
            id,
            &CasePatch {
                published_url: Some(published_url.clone()),
                status: Some(status),
                ..Default::default()
            },
        )?;
        tracker.completed(Some(status));
        log::info!("Case {} published at {}", id, published_url);

        Ok(PublishResponse {
            success: true,
            published_url,
        })
    }
}
