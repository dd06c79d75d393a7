//! Shared test utilities for medpub integration tests.
//!
//! - `TestHarness`: an in-memory database, a temp-dir object store and a
//!   scripted webhook wired into a real `Proxy` and `Workflow`
//! - fakes for the webhook, object store, repository and proxy seams

pub mod fakes;
pub mod harness;

pub use fakes::*;
pub use harness::TestHarness;
