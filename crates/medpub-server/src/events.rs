//! Logs case step events as they happen.

use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

use medpub::broadcast::StepOutcome;
use medpub::CaseEventBroadcaster;

pub fn spawn_event_logger(events: &CaseEventBroadcaster) -> JoinHandle<()> {
    let mut rx = events.subscribe();
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => match event.outcome {
                    StepOutcome::Failed => tracing::warn!(
                        case_id = %event.case_id,
                        step = %event.step,
                        error = event.error.as_deref().unwrap_or_default(),
                        "{}",
                        event.message
                    ),
                    _ => tracing::info!(
                        case_id = %event.case_id,
                        step = %event.step,
                        status = event.status.map(|s| s.as_str()).unwrap_or("-"),
                        "{}",
                        event.message
                    ),
                },
                Err(RecvError::Lagged(n)) => {
                    tracing::warn!("Case event logger lagged, missed {} events", n);
                }
                Err(RecvError::Closed) => {
                    tracing::info!("Case event channel closed, stopping event logger");
                    break;
                }
            }
        }
    })
}
