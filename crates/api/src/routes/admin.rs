//! Admin order endpoints. The capability check happens in the domain.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use common::{OrderId, OrderStatus, PaymentStatus};
use domain::StatusChange;
use serde::{Deserialize, Serialize};
use store::{Page, Store};

use super::orders::OrderResponse;
use super::parse_id;
use crate::error::ApiError;
use crate::identity::Identity;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub skip: Option<usize>,
    pub take: Option<usize>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatusRequest {
    pub status: Option<String>,
    pub payment_status: Option<String>,
}

impl UpdateStatusRequest {
    fn into_change(self) -> Result<StatusChange, ApiError> {
        if self.status.is_none() && self.payment_status.is_none() {
            return Err(ApiError::BadRequest(
                "status or paymentStatus is required".to_string(),
            ));
        }

        let status = self
            .status
            .map(|s| s.trim().to_ascii_uppercase().parse::<OrderStatus>())
            .transpose()
            .map_err(|e| ApiError::BadRequest(e.to_string()))?;
        let payment_status = self
            .payment_status
            .map(|s| s.trim().to_ascii_uppercase().parse::<PaymentStatus>())
            .transpose()
            .map_err(|e| ApiError::BadRequest(e.to_string()))?;

        Ok(StatusChange {
            status,
            payment_status,
        })
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderPageResponse {
    pub items: Vec<OrderResponse>,
    pub total: usize,
    pub skip: usize,
    pub take: usize,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccrualResponse {
    pub order_id: String,
    /// False when the order was already credited or earns nothing.
    pub credited: bool,
    pub points: i64,
}

/// GET /admin/orders?skip&take: all orders, newest first.
#[tracing::instrument(skip(state))]
pub async fn list<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    identity: Identity,
    Query(query): Query<ListQuery>,
) -> Result<Json<OrderPageResponse>, ApiError> {
    let page = Page::from_params(query.skip, query.take);
    let paged = state.orders.list_orders(&identity.0, page).await?;

    Ok(Json(OrderPageResponse {
        items: paged.items.into_iter().map(OrderResponse::from).collect(),
        total: paged.total,
        skip: page.skip,
        take: page.take,
    }))
}

/// GET /admin/orders/{id}
#[tracing::instrument(skip(state))]
pub async fn get<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    identity: Identity,
    Path(id): Path<String>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order_id: OrderId = parse_id("order id", &id)?;
    let order = state.orders.get_order(&identity.0, order_id).await?;
    Ok(Json(order.into()))
}

/// PATCH /admin/orders/{id}/status
#[tracing::instrument(skip(state, req))]
pub async fn update_status<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    identity: Identity,
    Path(id): Path<String>,
    Json(req): Json<UpdateStatusRequest>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order_id: OrderId = parse_id("order id", &id)?;
    let change = req.into_change()?;
    let order = state
        .orders
        .update_status(&identity.0, order_id, change)
        .await?;
    Ok(Json(order.into()))
}

/// POST /admin/orders/{id}/loyalty: re-run point accrual for an order.
#[tracing::instrument(skip(state))]
pub async fn accrue_loyalty<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    identity: Identity,
    Path(id): Path<String>,
) -> Result<Json<AccrualResponse>, ApiError> {
    let order_id: OrderId = parse_id("order id", &id)?;
    let transaction = state.orders.accrue_loyalty(&identity.0, order_id).await?;

    Ok(Json(AccrualResponse {
        order_id: order_id.to_string(),
        credited: transaction.is_some(),
        points: transaction.map_or(0, |t| t.delta),
    }))
}
