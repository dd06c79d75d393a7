use serde::{Deserialize, Serialize};

use super::{Result, Workflow, WorkflowError, REANALYSIS_TEMPLATE};
use crate::case::{AnalysisCase, CasePatch, CaseStatus};
use crate::composer::{
    compose_markup, insert_into_template, render_export_html, ArticleDocument, SectionKind,
    TemplateKey, TONES,
};
use crate::db::case_repo::CaseFilter;
use crate::proxy::{AnalyzeRequest, ArticleRequest, PublishRequest, ReportRequest};
use crate::session::Session;

#[derive(Debug, Clone, Serialize)]
pub struct CasePage {
    pub cases: Vec<AnalysisCase>,
    pub total: u64,
}

/// Manual edits from the article editor. `None` leaves a field alone.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ArticleDraft {
    pub article_text: Option<String>,
    pub article_title: Option<String>,
    pub tone: Option<String>,
    pub keywords: Option<Vec<String>>,
    pub citations: Option<Vec<String>>,
}

/// Choices made on the template screen before generating an article.
/// Unset fields keep the values already stored on the case.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ArticleOptions {
    pub template_key: Option<TemplateKey>,
    pub title: Option<String>,
    pub tone: Option<String>,
    pub keywords: Option<Vec<String>>,
    pub citations: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeleteOutcome {
    pub case_id: String,
    /// Number of stored images that were actually removed.
    pub removed_objects: usize,
    /// Set when blob removal failed; the row is deleted regardless.
    pub storage_error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusCount {
    pub status: CaseStatus,
    pub label: &'static str,
    pub count: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub total: u64,
    /// One entry per status, in workflow order, zeros included.
    pub by_status: Vec<StatusCount>,
    pub recent: Vec<AnalysisCase>,
}

const DASHBOARD_RECENT: u64 = 5;

fn validate_tone(tone: Option<&str>) -> Result<()> {
    match tone {
        Some(tone) if !TONES.contains(&tone) => Err(WorkflowError::InvalidInput(format!(
            "unknown tone '{}' (expected one of: {})",
            tone,
            TONES.join(", ")
        ))),
        _ => Ok(()),
    }
}

fn require(case: &AnalysisCase, present: bool, missing: &'static str) -> Result<()> {
    if present {
        Ok(())
    } else {
        Err(WorkflowError::MissingPrerequisite {
            id: case.id.clone(),
            missing,
        })
    }
}

/// Stored objects the case owns: its distinct paths under
/// `{user_id}/{case_id}/`. Paths borrowed from the demo catalogue are shared
/// with other cases and are never returned.
fn owned_paths(case: &AnalysisCase) -> Vec<String> {
    let prefix = format!("{}/{}/", case.user_id, case.id);
    let mut seen = std::collections::HashSet::new();
    case.image_paths
        .iter()
        .filter(|p| p.starts_with(&prefix))
        .filter(|p| seen.insert(p.as_str()))
        .cloned()
        .collect()
}

impl Workflow {
    pub fn get_case(&self, session: &Session, id: &str) -> Result<AnalysisCase> {
        self.load(session, id)
    }

    pub fn list_cases(&self, session: &Session, filter: &CaseFilter) -> Result<CasePage> {
        let (cases, total) = self.cases.list(session, filter)?;
        Ok(CasePage { cases, total })
    }

    fn patch_and_reload(
        &self,
        session: &Session,
        id: &str,
        patch: &CasePatch,
    ) -> Result<AnalysisCase> {
        if !patch.is_empty() {
            self.cases.update(session, id, patch)?;
        }
        self.load(session, id)
    }

    pub fn save_notes(&self, session: &Session, id: &str, notes: &str) -> Result<AnalysisCase> {
        self.patch_and_reload(
            session,
            id,
            &CasePatch {
                notes: Some(notes.to_string()),
                ..Default::default()
            },
        )
    }

    pub fn save_article_draft(
        &self,
        session: &Session,
        id: &str,
        draft: ArticleDraft,
    ) -> Result<AnalysisCase> {
        validate_tone(draft.tone.as_deref())?;
        self.patch_and_reload(
            session,
            id,
            &CasePatch {
                article_text: draft.article_text,
                article_title: draft.article_title,
                tone: draft.tone,
                keywords: draft.keywords,
                citations: draft.citations,
                ..Default::default()
            },
        )
    }

    pub fn select_template(
        &self,
        session: &Session,
        id: &str,
        key: TemplateKey,
    ) -> Result<AnalysisCase> {
        self.patch_and_reload(
            session,
            id,
            &CasePatch {
                template_key: Some(key),
                ..Default::default()
            },
        )
    }

    /// Stores the composer document and re-renders `article_text` from it,
    /// under the case's template label when one is selected.
    pub fn save_article_sections(
        &self,
        session: &Session,
        id: &str,
        document: ArticleDocument,
    ) -> Result<AnalysisCase> {
        let case = self.load(session, id)?;
        let article_text = match case.template_key {
            Some(key) => insert_into_template(&document, key),
            None => compose_markup(&document),
        };
        let article_title = (!document.title.trim().is_empty()).then(|| document.title.clone());
        self.patch_and_reload(
            session,
            id,
            &CasePatch {
                article_text: Some(article_text),
                article_title,
                article_sections: Some(document),
                ..Default::default()
            },
        )
    }

    /// Re-runs analysis with the stored inputs. Unlike upload, a webhook
    /// failure is returned to the caller (the case stays `analyzing`).
    pub async fn reanalyze(&self, session: &Session, id: &str) -> Result<AnalysisCase> {
        let case = self.load(session, id)?;
        let request = AnalyzeRequest {
            analysis_id: case.id.clone(),
            user_id: session.user_id().to_string(),
            image_paths: case.image_paths.clone(),
            modality: Some(case.modality),
            body_region: Some(case.body_region.clone()),
            notes: case.notes.clone(),
            models: case.models.clone(),
            tasks: case.tasks.clone(),
            template: Some(REANALYSIS_TEMPLATE.to_string()),
        };
        self.proxy.analyze(session, &request).await?;
        self.load(session, id)
    }

    pub async fn generate_report(&self, session: &Session, id: &str) -> Result<AnalysisCase> {
        let case = self.load(session, id)?;
        require(&case, case.has_analysis(), "analysis result")?;

        let request = ReportRequest {
            analysis_id: case.id.clone(),
            analysis_result: case.analysis_result.clone(),
        };
        self.proxy.generate_report(session, &request).await?;
        self.load(session, id)
    }

    /// Persists the supplied article options, then asks the article webhook
    /// for a full draft using the merged settings.
    pub async fn generate_article(
        &self,
        session: &Session,
        id: &str,
        options: ArticleOptions,
    ) -> Result<AnalysisCase> {
        let case = self.load(session, id)?;
        require(&case, case.has_analysis(), "analysis result")?;
        validate_tone(options.tone.as_deref())?;

        let patch = CasePatch {
            template_key: options.template_key,
            article_title: options.title.filter(|t| !t.trim().is_empty()),
            tone: options.tone,
            keywords: options.keywords,
            citations: options.citations,
            ..Default::default()
        };
        if !patch.is_empty() {
            self.cases.update(session, id, &patch)?;
        }

        let request = ArticleRequest {
            analysis_id: case.id.clone(),
            analysis_result: case.analysis_result.clone(),
            report_text: case.report_text.clone(),
            title: patch.article_title.or(case.article_title.clone()),
            template_key: patch.template_key.or(case.template_key),
            tone: patch.tone.or(case.tone.clone()),
            keywords: patch.keywords.unwrap_or_else(|| case.keywords.clone()),
            citations: patch.citations.unwrap_or_else(|| case.citations.clone()),
            use_report: case.has_report(),
            use_analysis: case.has_analysis(),
            section: None,
            section_text: None,
        };
        self.proxy.generate_article(session, &request).await?;
        self.load(session, id)
    }

    /// Asks the article webhook to write one section and stores the result
    /// in the case's composer document.
    pub async fn expand_section(
        &self,
        session: &Session,
        id: &str,
        section: SectionKind,
    ) -> Result<ArticleDocument> {
        let case = self.load(session, id)?;
        require(&case, case.has_analysis(), "analysis result")?;

        let mut document = case.article_sections.clone().unwrap_or_else(|| ArticleDocument {
            title: case.article_title.clone().unwrap_or_default(),
            ..Default::default()
        });
        let current = document.section(section).trim().to_string();

        let request = ArticleRequest {
            analysis_id: case.id.clone(),
            analysis_result: case.analysis_result.clone(),
            report_text: case.report_text.clone(),
            title: case.article_title.clone(),
            template_key: case.template_key,
            tone: case.tone.clone(),
            keywords: case.keywords.clone(),
            citations: case.citations.clone(),
            use_report: case.has_report(),
            use_analysis: case.has_analysis(),
            section: Some(section),
            section_text: (!current.is_empty()).then_some(current),
        };
        let response = self.proxy.generate_article(session, &request).await?;

        let text = response.section_text.or(response.article_text).unwrap_or_default();
        document.set_section(section, text);
        self.cases.update(
            session,
            id,
            &CasePatch {
                article_sections: Some(document.clone()),
                ..Default::default()
            },
        )?;
        Ok(document)
    }

    pub async fn publish(&self, session: &Session, id: &str) -> Result<AnalysisCase> {
        let case = self.load(session, id)?;
        require(&case, case.has_article(), "article text")?;

        let request = PublishRequest {
            analysis_id: case.id.clone(),
            article_text: case.article_text.clone(),
            article_title: case.article_title.clone(),
            tone: case.tone.clone(),
            keywords: case.keywords.clone(),
            citations: case.citations.clone(),
        };
        self.proxy.publish_article(session, &request).await?;
        self.load(session, id)
    }

    /// Renders the case's article as a printable HTML page.
    pub fn export_article(&self, session: &Session, id: &str) -> Result<String> {
        let case = self.load(session, id)?;
        require(&case, case.has_article(), "article text")?;
        let article_text = case.article_text.as_deref().unwrap_or_default();
        Ok(render_export_html(case.article_title.as_deref(), article_text))
    }

    /// Removes the case's own images in one batched call, then the row. The
    /// two are independent: a storage failure is reported, not fatal.
    pub fn delete_case(&self, session: &Session, id: &str) -> Result<DeleteOutcome> {
        let case = self.load(session, id)?;
        let paths = owned_paths(&case);

        let mut removed_objects = 0;
        let mut storage_error = None;
        if !paths.is_empty() {
            match self.store.remove(&paths) {
                Ok(n) => removed_objects = n,
                Err(e) => {
                    log::warn!("Failed to remove images of case {}: {}", id, e);
                    storage_error = Some(e.to_string());
                }
            }
        }

        self.cases.delete(session, id)?;
        log::info!("Deleted case {} ({} image(s) removed)", id, removed_objects);

        Ok(DeleteOutcome {
            case_id: case.id,
            removed_objects,
            storage_error,
        })
    }

    pub fn dashboard(&self, session: &Session) -> Result<Dashboard> {
        let counts = self.cases.count_by_status(session)?;
        let by_status: Vec<StatusCount> = CaseStatus::ALL
            .into_iter()
            .map(|status| StatusCount {
                status,
                label: status.label(),
                count: counts
                    .iter()
                    .find(|(s, _)| *s == status)
                    .map(|(_, n)| *n)
                    .unwrap_or(0),
            })
            .collect();
        let total = by_status.iter().map(|c| c.count).sum();

        let (recent, _) = self.cases.list(
            session,
            &CaseFilter {
                limit: Some(DASHBOARD_RECENT),
                ..Default::default()
            },
        )?;

        Ok(Dashboard {
            total,
            by_status,
            recent,
        })
    }
}
