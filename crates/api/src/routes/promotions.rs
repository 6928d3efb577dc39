//! Promotion validation endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use common::{DiscountType, Money};
use serde::{Deserialize, Serialize};
use store::Store;

use crate::error::ApiError;
use crate::identity::Identity;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct ValidateRequest {
    pub code: String,
    pub amount: i64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateResponse {
    pub promotion_id: String,
    pub discount_amount: i64,
    pub discount_type: DiscountType,
    pub discount_value: i64,
}

/// POST /promotions/validate: preview a code against an amount.
///
/// Read-only; usage is only counted when an order is placed.
#[tracing::instrument(skip(state, req))]
pub async fn validate<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    _identity: Identity,
    Json(req): Json<ValidateRequest>,
) -> Result<Json<ValidateResponse>, ApiError> {
    if req.amount < 0 {
        return Err(ApiError::BadRequest("amount must not be negative".to_string()));
    }

    let applied = state
        .promotions
        .validate(&req.code, Money::new(req.amount))
        .await?;

    Ok(Json(ValidateResponse {
        promotion_id: applied.promotion_id.to_string(),
        discount_amount: applied.discount_amount.amount(),
        discount_type: applied.discount_type,
        discount_value: applied.discount_value,
    }))
}
