//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use domain::DomainError;

/// API-level error type that maps to HTTP responses.
///
/// Every response body has the shape `{"error": "<message>", "code": "<CODE>"}`.
#[derive(Debug)]
pub enum ApiError {
    /// No trusted identity on the request.
    Unauthorized(String),
    /// Malformed input that never reached the domain.
    BadRequest(String),
    /// Domain logic error.
    Domain(DomainError),
    /// Internal server error.
    Internal(String),
}

impl ApiError {
    fn parts(self) -> (StatusCode, &'static str, String) {
        match self {
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg),
            ApiError::Domain(err) => (status_for(&err), err.code(), err.to_string()),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL", msg),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();
        if status.is_server_error() {
            tracing::error!(error = %message, "internal server error");
        }

        let body = serde_json::json!({ "error": message, "code": code });
        (status, axum::Json(body)).into_response()
    }
}

fn status_for(err: &DomainError) -> StatusCode {
    match err {
        DomainError::InvalidQuantity { .. } | DomainError::EmptyCart => StatusCode::BAD_REQUEST,
        DomainError::PromotionNotFound { .. }
        | DomainError::PromotionExpired { .. }
        | DomainError::PromotionExhausted { .. }
        | DomainError::InsufficientPoints { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        DomainError::InsufficientStock { .. }
        | DomainError::InvalidTransition { .. }
        | DomainError::CartChanged => StatusCode::CONFLICT,
        DomainError::NotFound { .. } => StatusCode::NOT_FOUND,
        DomainError::Forbidden { .. } => StatusCode::FORBIDDEN,
        DomainError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        ApiError::Domain(err)
    }
}
