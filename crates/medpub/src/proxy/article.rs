use super::{require_id, text_field, ArticleRequest, ArticleResponse, Proxy, ProxyError};
use crate::case::{CasePatch, CaseStatus};
use crate::composer::{compose_markup, ArticleDocument};
use crate::session::Session;
use crate::webhook::{WebhookEndpoint, WebhookError};

impl Proxy {
    pub(super) async fn run_article(
        &self,
        session: &Session,
        request: &ArticleRequest,
    ) -> Result<ArticleResponse, ProxyError> {
        require_id(&request.analysis_id)?;
        let id = request.analysis_id.as_str();
        let case = self.load_case(session, id)?;

        let tracker = self
            .events
            .start(id, session.user_id(), WebhookEndpoint::GenerateArticle);
        tracker.started(None);

        let response = self
            .call(WebhookEndpoint::GenerateArticle, request, &tracker)
            .await?;

        if let Some(section) = request.section {
            let text = text_field(&response, "section_text")
                .or_else(|| text_field(&response, "article_text"));
            let Some(text) = text else {
                let err = WebhookError::MissingField {
                    endpoint: WebhookEndpoint::GenerateArticle,
                    field: "section_text",
                };
                tracker.failed(&err.to_string());
                return Err(err.into());
            };
            tracker.completed(None);
            log::debug!("Expanded {} for case {}", section, id);
            return Ok(ArticleResponse {
                success: true,
                article_text: None,
                section: Some(section),
                section_text: Some(text),
            });
        }

        let article_text = text_field(&response, "article_text").unwrap_or_else(|| {
            let analysis = request.analysis_result.as_deref().unwrap_or_default();
            compose_markup(&ArticleDocument::fallback(analysis))
        });

        let status = case.status.advance(CaseStatus::ArticleDraft);
        self.cases.update(
            session,
            id,
            &CasePatch {
                article_text: Some(article_text.clone()),
                status: Some(status),
                ..Default::default()
            },
        )?;
        tracker.completed(Some(status));
        log::info!("Article generated for case {}", id);

        Ok(ArticleResponse {
            success: true,
            article_text: Some(article_text),
            section: None,
            section_text: None,
        })
    }
}
