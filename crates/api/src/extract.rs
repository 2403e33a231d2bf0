//! Identity extraction
//!
//! Token verification happens upstream; the gateway attaches the decoded
//! caller identity as `x-user-id` / `x-user-role` headers. Requests
//! without both headers never reach the core.

use std::str::FromStr;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use mawid_core::Actor;
use mawid_domain::Role;

use crate::response::ApiError;

/// Header carrying the authenticated user id
pub const USER_ID_HEADER: &str = "x-user-id";
/// Header carrying the authenticated user role
pub const USER_ROLE_HEADER: &str = "x-user-role";

/// Decoded caller identity, extractable in any handler
#[derive(Debug, Clone)]
pub struct Identity(pub Actor);

impl Identity {
    pub fn actor(&self) -> &Actor {
        &self.0
    }
}

impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let id = header_value(parts, USER_ID_HEADER)?;
        let role_raw = header_value(parts, USER_ROLE_HEADER)?;
        let role = Role::from_str(&role_raw)
            .map_err(|_| ApiError::Unauthorized(format!("unknown role: {role_raw}")))?;

        Ok(Self(Actor { id, role }))
    }
}

fn header_value(parts: &Parts, name: &str) -> Result<String, ApiError> {
    parts
        .headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
        .map(ToString::to_string)
        .ok_or_else(|| ApiError::Unauthorized(format!("missing {name} header")))
}
