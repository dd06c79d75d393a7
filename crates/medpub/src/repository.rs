//! Owner-scoped access to persisted cases.
//!
//! Every call names the acting [`Session`]; rows owned by another user are
//! invisible (reads return `None`, writes return `NotFound`).

use chrono::{DateTime, Utc};

use crate::case::{AnalysisCase, CasePatch, CaseStatus, DemoCase};
use crate::db::case_repo::{self, CaseFilter};
use crate::db::{demo_repo, Database, DatabaseError};
use crate::session::Session;

pub trait CaseRepository: Send + Sync {
    fn insert(&self, session: &Session, case: &AnalysisCase) -> Result<(), DatabaseError>;

    fn get(&self, session: &Session, id: &str) -> Result<Option<AnalysisCase>, DatabaseError>;

    /// Newest first; returns the page and the total matching count.
    fn list(
        &self,
        session: &Session,
        filter: &CaseFilter,
    ) -> Result<(Vec<AnalysisCase>, u64), DatabaseError>;

    fn update(&self, session: &Session, id: &str, patch: &CasePatch) -> Result<(), DatabaseError>;

    fn delete(&self, session: &Session, id: &str) -> Result<(), DatabaseError>;

    fn count_by_status(&self, session: &Session) -> Result<Vec<(CaseStatus, u64)>, DatabaseError>;

    /// Maintenance sweep across all owners.
    fn revert_stale_analyzing(&self, cutoff: DateTime<Utc>) -> Result<Vec<String>, DatabaseError>;

    fn list_demo_cases(&self) -> Result<Vec<DemoCase>, DatabaseError>;

    fn find_demo_case(&self, id: &str) -> Result<Option<DemoCase>, DatabaseError>;
}

impl CaseRepository for Database {
    fn insert(&self, session: &Session, case: &AnalysisCase) -> Result<(), DatabaseError> {
        if !session.owns(&case.user_id) {
            return Err(DatabaseError::OwnerMismatch {
                id: case.id.clone(),
            });
        }
        case_repo::insert(self, case)
    }

    fn get(&self, session: &Session, id: &str) -> Result<Option<AnalysisCase>, DatabaseError> {
        case_repo::find_for_owner(self, session.user_id(), id)
    }

    fn list(
        &self,
        session: &Session,
        filter: &CaseFilter,
    ) -> Result<(Vec<AnalysisCase>, u64), DatabaseError> {
        case_repo::list_for_owner(self, session.user_id(), filter)
    }

    fn update(&self, session: &Session, id: &str, patch: &CasePatch) -> Result<(), DatabaseError> {
        case_repo::update(self, session.user_id(), id, patch)
    }

    fn delete(&self, session: &Session, id: &str) -> Result<(), DatabaseError> {
        case_repo::delete(self, session.user_id(), id)
    }

    fn count_by_status(&self, session: &Session) -> Result<Vec<(CaseStatus, u64)>, DatabaseError> {
        case_repo::count_by_status(self, session.user_id())
    }

    fn revert_stale_analyzing(&self, cutoff: DateTime<Utc>) -> Result<Vec<String>, DatabaseError> {
        case_repo::revert_stale_analyzing(self, cutoff)
    }

    fn list_demo_cases(&self) -> Result<Vec<DemoCase>, DatabaseError> {
        demo_repo::list(self)
    }

    fn find_demo_case(&self, id: &str) -> Result<Option<DemoCase>, DatabaseError> {
        demo_repo::find(self, id)
    }
}
