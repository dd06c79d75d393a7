//! Sweep for cases stuck in `analyzing`.
//!
//! A failed analysis webhook leaves its case in `analyzing`. When a timeout
//! is configured, cases that have not moved for that long are returned to
//! the status they had before analysis started (or `uploaded`).

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::task::JoinHandle;

use crate::db::DatabaseError;
use crate::repository::CaseRepository;

/// Reverts cases that have been `analyzing` for longer than `older_than`.
/// Returns the ids of reverted cases.
pub fn revert_stale_analyses(
    repo: &dyn CaseRepository,
    older_than: Duration,
) -> Result<Vec<String>, DatabaseError> {
    let Ok(age) = chrono::Duration::from_std(older_than) else {
        return Ok(Vec::new());
    };
    let Some(cutoff) = Utc::now().checked_sub_signed(age) else {
        return Ok(Vec::new());
    };

    let reverted = repo.revert_stale_analyzing(cutoff)?;
    if !reverted.is_empty() {
        log::warn!(
            "Reverted {} case(s) stuck in analyzing for over {}s",
            reverted.len(),
            older_than.as_secs()
        );
    }
    Ok(reverted)
}

/// Runs [`revert_stale_analyses`] every `every` until the task is aborted.
pub fn spawn_stale_sweep(
    repo: Arc<dyn CaseRepository>,
    older_than: Duration,
    every: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        loop {
            ticker.tick().await;
            if let Err(e) = revert_stale_analyses(repo.as_ref(), older_than) {
                log::error!("Stale analysis sweep failed: {}", e);
            }
        }
    })
}
