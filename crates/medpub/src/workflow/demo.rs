use chrono::Utc;

use super::{Result, Workflow, WorkflowError};
use crate::case::{AnalysisCase, CaseStatus, DemoCase};
use crate::composer::{TemplateKey, DEFAULT_TONE};
use crate::session::Session;

/// Builds the user's own copy of a demo case.
fn copy_of(demo: &DemoCase, session: &Session) -> AnalysisCase {
    let now = Utc::now();
    let status = if demo.has_report() {
        CaseStatus::ReportDraft
    } else {
        CaseStatus::Analyzed
    };
    AnalysisCase {
        id: uuid::Uuid::new_v4().to_string(),
        user_id: session.user_id().to_string(),
        modality: demo.modality,
        body_region: demo.body_region.clone(),
        notes: None,
        image_paths: demo.image_paths.clone(),
        models: Vec::new(),
        tasks: Vec::new(),
        analysis_result: demo.analysis_result.clone(),
        report_text: demo.report_text.clone(),
        article_text: None,
        article_title: Some(demo.title.clone()),
        tone: Some(DEFAULT_TONE.to_string()),
        keywords: Vec::new(),
        citations: Vec::new(),
        template_key: Some(TemplateKey::CaseReport),
        article_sections: demo.article_sections.clone(),
        published_url: None,
        status,
        status_before_analysis: None,
        created_at: now,
        updated_at: now,
    }
}

impl Workflow {
    pub fn list_demo_cases(&self) -> Result<Vec<DemoCase>> {
        Ok(self.cases.list_demo_cases()?)
    }

    /// Copies a demo case into a new case owned by the caller.
    pub fn start_from_demo(&self, session: &Session, demo_id: &str) -> Result<AnalysisCase> {
        let demo = self
            .cases
            .find_demo_case(demo_id)?
            .ok_or_else(|| WorkflowError::DemoNotFound(demo_id.to_string()))?;

        let case = copy_of(&demo, session);
        self.cases.insert(session, &case)?;
        log::info!("Started case {} from demo {}", case.id, demo.id);
        Ok(case)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::case::Modality;

    fn demo(report: Option<&str>) -> DemoCase {
        DemoCase {
            id: "demo-1".to_string(),
            title: "Incidental adrenal nodule".to_string(),
            modality: Modality::Ct,
            body_region: "Abdomen".to_string(),
            image_paths: vec!["demo/adrenal.png".to_string()],
            analysis_result: Some("2 cm left adrenal nodule".to_string()),
            report_text: report.map(str::to_string),
            article_sections: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_copy_with_report_is_report_draft() {
        let session = Session::new("u1").unwrap();
        let case = copy_of(&demo(Some("Findings ...")), &session);
        assert_eq!(case.status, CaseStatus::ReportDraft);
        assert_eq!(case.user_id, "u1");
        assert_eq!(case.template_key, Some(TemplateKey::CaseReport));
        assert_eq!(case.tone.as_deref(), Some("Academic"));
        assert_eq!(case.article_title.as_deref(), Some("Incidental adrenal nodule"));
    }

    #[test]
    fn test_copy_without_report_is_analyzed() {
        let session = Session::new("u1").unwrap();
        let case = copy_of(&demo(None), &session);
        assert_eq!(case.status, CaseStatus::Analyzed);
        assert_ne!(case.id, "demo-1");
    }
}
