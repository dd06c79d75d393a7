//! Explicit caller identity passed into every data-access call.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Session requires a non-empty user id")]
pub struct EmptyUserId;

/// The authenticated caller. Records are only visible to their owner.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Session {
    user_id: String,
}

impl Session {
    pub fn new(user_id: impl Into<String>) -> Result<Self, EmptyUserId> {
        let user_id = user_id.into();
        if user_id.trim().is_empty() {
            return Err(EmptyUserId);
        }
        Ok(Self { user_id })
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn owns(&self, owner_id: &str) -> bool {
        self.user_id == owner_id
    }
}
