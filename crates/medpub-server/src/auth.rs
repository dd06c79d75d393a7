//! Caller identity.
//!
//! Authentication happens upstream; the gateway forwards the authenticated
//! user id in the `x-user-id` header.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

use medpub::Session;

use crate::error::ApiError;

pub const USER_ID_HEADER: &str = "x-user-id";

/// Extracts the acting user's [`Session`]; missing or blank ids are a 401.
pub struct Caller(pub Session);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for Caller {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .unwrap_or_default();
        Session::new(user_id)
            .map(Caller)
            .map_err(|_| ApiError::Unauthorized)
    }
}
