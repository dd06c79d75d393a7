//! Broadcasting of case lifecycle events to in-process subscribers.

pub mod case_events;

pub use case_events::{CaseEvent, CaseEventBroadcaster, CaseStepTracker, StepOutcome};
