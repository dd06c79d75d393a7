use serde::{Deserialize, Serialize};
use tracing::{info, info_span, warn, Instrument};

use super::{Result, Workflow, WorkflowError};
use crate::case::{AnalysisCase, CasePatch, Modality, NewCase};
use crate::proxy::AnalyzeRequest;
use crate::sanitize::sanitize_file_name;
use crate::session::Session;

/// File extensions accepted for upload (DICOM and common raster formats).
pub const ACCEPTED_EXTENSIONS: [&str; 7] = ["dcm", "dicom", "jpg", "jpeg", "png", "tif", "tiff"];

#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub content: Vec<u8>,
}

impl ImageUpload {
    pub fn new(file_name: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            file_name: file_name.into(),
            content: content.into(),
        }
    }

    fn extension(&self) -> Option<String> {
        std::path::Path::new(&self.file_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
    }
}

#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub modality: Modality,
    pub body_region: String,
    pub notes: Option<String>,
    pub models: Vec<String>,
    pub tasks: Vec<String>,
    /// Analysis template forwarded to the analysis webhook.
    pub template: Option<String>,
    pub files: Vec<ImageUpload>,
}

/// What happened to the analysis kicked off by an upload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum AnalysisDispatch {
    Completed { analysis_result: String },
    /// The upload stands but analysis did not finish; the case shows
    /// `uploaded` or `analyzing` depending on how far the call got.
    Queued { reason: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct UploadOutcome {
    pub case: AnalysisCase,
    pub dispatch: AnalysisDispatch,
}

fn validate(request: &UploadRequest) -> Result<()> {
    if request.files.is_empty() {
        return Err(WorkflowError::InvalidInput(
            "at least one image is required".to_string(),
        ));
    }
    if request.body_region.trim().is_empty() {
        return Err(WorkflowError::InvalidInput(
            "body region is required".to_string(),
        ));
    }
    for file in &request.files {
        let accepted = file
            .extension()
            .is_some_and(|ext| ACCEPTED_EXTENSIONS.contains(&ext.as_str()));
        if !accepted {
            return Err(WorkflowError::InvalidInput(format!(
                "unsupported image type '{}' (accepted: {})",
                file.file_name,
                ACCEPTED_EXTENSIONS.join(", ")
            )));
        }
    }
    Ok(())
}

impl Workflow {
    /// Creates a case from uploaded images and starts its analysis.
    ///
    /// Order: insert (`uploaded`), store each image, record the paths, call
    /// the analysis proxy. Storage failures abort and leave the inserted row
    /// behind. An analysis failure does not fail the upload.
    pub async fn upload_case(
        &self,
        session: &Session,
        request: UploadRequest,
    ) -> Result<UploadOutcome> {
        validate(&request)?;

        let case = AnalysisCase::new(
            session,
            NewCase {
                modality: request.modality,
                body_region: request.body_region.trim().to_string(),
                notes: request.notes.clone().filter(|n| !n.trim().is_empty()),
                image_paths: Vec::new(),
                models: request.models.clone(),
                tasks: request.tasks.clone(),
            },
        );
        let id = case.id.clone();

        let span = info_span!("workflow.upload", case_id = %id, files = request.files.len());
        async move {
            self.cases.insert(session, &case)?;

            let mut paths = Vec::with_capacity(request.files.len());
            for (index, file) in request.files.iter().enumerate() {
                let path = format!(
                    "{}/{}/{}-{}",
                    session.user_id(),
                    id,
                    index,
                    sanitize_file_name(&file.file_name)
                );
                self.store.upload(&path, &file.content)?;
                paths.push(path);
            }

            self.cases.update(
                session,
                &id,
                &CasePatch {
                    image_paths: Some(paths.clone()),
                    ..Default::default()
                },
            )?;
            info!("Stored {} image(s) for case {}", paths.len(), id);

            let analyze = AnalyzeRequest {
                analysis_id: id.clone(),
                user_id: session.user_id().to_string(),
                image_paths: paths,
                modality: Some(request.modality),
                body_region: Some(case.body_region.clone()),
                notes: case.notes.clone(),
                models: request.models.clone(),
                tasks: request.tasks.clone(),
                template: request.template.clone(),
            };
            let dispatch = match self.proxy.analyze(session, &analyze).await {
                Ok(response) => AnalysisDispatch::Completed {
                    analysis_result: response.analysis_result,
                },
                Err(e) => {
                    warn!("Analysis for case {} did not complete: {}", id, e);
                    AnalysisDispatch::Queued {
                        reason: e.to_string(),
                    }
                }
            };

            let case = self.load(session, &id)?;
            Ok(UploadOutcome { case, dispatch })
        }
        .instrument(span)
        .await
    }
}
