//! HTTP handlers grouped by API surface.

pub mod admin;
pub mod cart;
pub mod loyalty;
pub mod ops;
pub mod orders;
pub mod promotions;

use std::str::FromStr;

use crate::error::ApiError;

/// Parses a path or body identifier, rejecting malformed input with 400.
pub(crate) fn parse_id<T: FromStr>(kind: &str, raw: &str) -> Result<T, ApiError>
where
    T::Err: std::fmt::Display,
{
    raw.parse()
        .map_err(|e| ApiError::BadRequest(format!("Invalid {kind} '{raw}': {e}")))
}
