//! Case workflow: the operations a user performs on their cases.
//!
//! The workflow is where prerequisites are enforced (no report before an
//! analysis, no publish before an article). It reads and writes through
//! [`CaseRepository`], stores images in an [`ObjectStore`] and delegates
//! every AI step to a [`CaseProxy`].

mod cases;
mod demo;
mod error;
mod input;
pub mod recovery;
mod upload;

pub use cases::{ArticleDraft, ArticleOptions, CasePage, Dashboard, DeleteOutcome, StatusCount};
pub use error::WorkflowError;
pub use input::{parse_citations, parse_keywords};
pub use upload::{AnalysisDispatch, ImageUpload, UploadOutcome, UploadRequest, ACCEPTED_EXTENSIONS};

use std::sync::Arc;

use crate::case::AnalysisCase;
use crate::proxy::CaseProxy;
use crate::repository::CaseRepository;
use crate::session::Session;
use crate::storage::ObjectStore;

pub type Result<T> = std::result::Result<T, WorkflowError>;

/// Analysis template used when re-running an analysis.
pub const REANALYSIS_TEMPLATE: &str = "general";

pub struct Workflow {
    cases: Arc<dyn CaseRepository>,
    store: Arc<dyn ObjectStore>,
    proxy: Arc<dyn CaseProxy>,
}

impl Workflow {
    pub fn new(
        cases: Arc<dyn CaseRepository>,
        store: Arc<dyn ObjectStore>,
        proxy: Arc<dyn CaseProxy>,
    ) -> Self {
        Self {
            cases,
            store,
            proxy,
        }
    }

    pub fn repository(&self) -> &Arc<dyn CaseRepository> {
        &self.cases
    }

    /// Loads an owned case or fails with `NotFound`.
    fn load(&self, session: &Session, id: &str) -> Result<AnalysisCase> {
        self.cases
            .get(session, id)?
            .ok_or_else(|| WorkflowError::NotFound(id.to_string()))
    }
}
