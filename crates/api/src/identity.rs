//! Caller identity supplied by the upstream auth proxy.
//!
//! The proxy authenticates the user and forwards `x-user-id` (a UUID) and
//! optionally `x-user-role` (`customer` or `admin`). Both are trusted as-is.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use common::UserId;
use domain::{Actor, Role};

use crate::error::ApiError;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_ROLE_HEADER: &str = "x-user-role";

/// Extracts the authenticated [`Actor`] or rejects with 401.
#[derive(Debug, Clone, Copy)]
pub struct Identity(pub Actor);

impl Identity {
    pub fn user_id(&self) -> UserId {
        self.0.user_id
    }
}

fn header<'a>(parts: &'a Parts, name: &str) -> Option<&'a str> {
    parts
        .headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw_id = header(parts, USER_ID_HEADER)
            .ok_or_else(|| ApiError::Unauthorized(format!("Missing {USER_ID_HEADER} header")))?;
        let user_id: UserId = raw_id
            .parse()
            .map_err(|_| ApiError::Unauthorized(format!("Invalid {USER_ID_HEADER}: {raw_id}")))?;

        let role = match header(parts, USER_ROLE_HEADER) {
            Some(raw) => raw
                .parse::<Role>()
                .map_err(|e| ApiError::Unauthorized(e.to_string()))?,
            None => Role::Customer,
        };

        Ok(Identity(Actor::new(user_id, role)))
    }
}
