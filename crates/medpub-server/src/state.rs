use std::sync::Arc;

use medpub::{CaseProxy, Workflow};

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub workflow: Arc<Workflow>,
    /// Backs the `/functions` routes; the same proxy the workflow uses.
    pub proxy: Arc<dyn CaseProxy>,
}

impl AppState {
    pub fn new(workflow: Arc<Workflow>, proxy: Arc<dyn CaseProxy>) -> Self {
        Self { workflow, proxy }
    }
}
