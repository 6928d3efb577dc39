//! Loyalty endpoints for the caller's own account.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use common::LoyaltyReason;
use domain::LoyaltyStatus;
use serde::{Deserialize, Serialize};
use store::{LoyaltyTransaction, Store};

use crate::error::ApiError;
use crate::identity::Identity;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct RedeemRequest {
    pub points: i64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionResponse {
    pub id: String,
    pub delta: i64,
    pub reason: LoyaltyReason,
    pub order_id: Option<String>,
    pub created_at: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoyaltyStatusResponse {
    pub user_id: String,
    pub balance: i64,
    pub transactions: Vec<TransactionResponse>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RedeemResponse {
    pub points_redeemed: i64,
    pub discount_amount: i64,
}

impl From<LoyaltyTransaction> for TransactionResponse {
    fn from(tx: LoyaltyTransaction) -> Self {
        Self {
            id: tx.id.to_string(),
            delta: tx.delta,
            reason: tx.reason,
            order_id: tx.order_id.map(|id| id.to_string()),
            created_at: tx.created_at.to_rfc3339(),
        }
    }
}

impl From<LoyaltyStatus> for LoyaltyStatusResponse {
    fn from(status: LoyaltyStatus) -> Self {
        Self {
            user_id: status.user_id.to_string(),
            balance: status.balance,
            transactions: status
                .transactions
                .into_iter()
                .map(TransactionResponse::from)
                .collect(),
        }
    }
}

/// GET /loyalty: balance and recent history.
#[tracing::instrument(skip(state))]
pub async fn status<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    identity: Identity,
) -> Result<Json<LoyaltyStatusResponse>, ApiError> {
    let status = state.loyalty.get_status(identity.user_id()).await?;
    Ok(Json(status.into()))
}

/// POST /loyalty/redeem
#[tracing::instrument(skip(state, req))]
pub async fn redeem<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    identity: Identity,
    Json(req): Json<RedeemRequest>,
) -> Result<Json<RedeemResponse>, ApiError> {
    let redemption = state
        .loyalty
        .redeem_points(identity.user_id(), req.points)
        .await?;

    Ok(Json(RedeemResponse {
        points_redeemed: redemption.points_redeemed,
        discount_amount: redemption.discount_amount.amount(),
    }))
}
