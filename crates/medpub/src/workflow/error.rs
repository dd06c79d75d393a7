use thiserror::Error;

use crate::db::DatabaseError;
use crate::error::StorageError;
use crate::proxy::ProxyError;

#[derive(Error, Debug)]
pub enum WorkflowError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Analysis case '{0}' not found")]
    NotFound(String),

    #[error("Demo case '{0}' not found")]
    DemoNotFound(String),

    /// A step was requested before the artifact it builds on exists.
    #[error("Case '{id}' has no {missing} yet")]
    MissingPrerequisite { id: String, missing: &'static str },

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Database(DatabaseError),

    #[error(transparent)]
    Proxy(ProxyError),
}

impl From<DatabaseError> for WorkflowError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::NotFound { id, .. } => WorkflowError::NotFound(id),
            other => WorkflowError::Database(other),
        }
    }
}

impl From<ProxyError> for WorkflowError {
    fn from(err: ProxyError) -> Self {
        match err {
            ProxyError::CaseNotFound(id) => WorkflowError::NotFound(id),
            ProxyError::Database(db) => WorkflowError::from(db),
            other => WorkflowError::Proxy(other),
        }
    }
}
