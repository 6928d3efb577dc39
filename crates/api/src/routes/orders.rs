//! Customer order endpoints: checkout and the caller's own orders.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use common::{OrderId, OrderStatus, PaymentStatus};
use domain::CreateOrder;
use serde::{Deserialize, Serialize};
use store::{Order, OrderLine, Store};

use super::parse_id;
use crate::error::ApiError;
use crate::identity::Identity;
use crate::state::AppState;

// -- Request types --

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub shipping_address: String,
    pub phone: String,
    pub promotion_code: Option<String>,
}

// -- Response types --

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLineResponse {
    pub id: String,
    pub variant_id: String,
    pub product_name: String,
    pub variant_name: String,
    pub unit_price: i64,
    pub quantity: u32,
    pub line_total: i64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    pub id: String,
    pub user_id: String,
    pub shipping_address: String,
    pub phone: String,
    pub items: Vec<OrderLineResponse>,
    pub total_amount: i64,
    pub discount_amount: i64,
    pub final_amount: i64,
    pub promotion_id: Option<String>,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub created_at: String,
    pub updated_at: String,
}

impl From<OrderLine> for OrderLineResponse {
    fn from(line: OrderLine) -> Self {
        Self {
            id: line.id.to_string(),
            variant_id: line.variant_id.to_string(),
            line_total: line.line_total().amount(),
            product_name: line.product_name,
            variant_name: line.variant_name,
            unit_price: line.unit_price.amount(),
            quantity: line.quantity,
        }
    }
}

impl From<Order> for OrderResponse {
    fn from(order: Order) -> Self {
        Self {
            id: order.id.to_string(),
            user_id: order.user_id.to_string(),
            shipping_address: order.shipping.address,
            phone: order.shipping.phone,
            items: order.lines.into_iter().map(OrderLineResponse::from).collect(),
            total_amount: order.total_amount.amount(),
            discount_amount: order.discount_amount.amount(),
            final_amount: order.final_amount.amount(),
            promotion_id: order.promotion_id.map(|id| id.to_string()),
            status: order.status,
            payment_status: order.payment_status,
            created_at: order.created_at.to_rfc3339(),
            updated_at: order.updated_at.to_rfc3339(),
        }
    }
}

// -- Handlers --

/// POST /orders: check out the caller's cart.
#[tracing::instrument(skip(state, req))]
pub async fn create<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    identity: Identity,
    Json(req): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<OrderResponse>), ApiError> {
    if req.shipping_address.trim().is_empty() || req.phone.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "shippingAddress and phone are required".to_string(),
        ));
    }

    let mut cmd = CreateOrder::new(req.shipping_address, req.phone);
    if let Some(code) = req.promotion_code {
        cmd = cmd.with_promotion(code);
    }

    let order = state.orders.create_order(identity.user_id(), cmd).await?;
    Ok((StatusCode::CREATED, Json(order.into())))
}

/// GET /orders: the caller's orders, newest first.
#[tracing::instrument(skip(state))]
pub async fn list<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    identity: Identity,
) -> Result<Json<Vec<OrderResponse>>, ApiError> {
    let orders = state.orders.list_my_orders(identity.user_id()).await?;
    Ok(Json(orders.into_iter().map(OrderResponse::from).collect()))
}

/// GET /orders/{id}: one of the caller's orders.
#[tracing::instrument(skip(state))]
pub async fn get<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    identity: Identity,
    Path(id): Path<String>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order_id: OrderId = parse_id("order id", &id)?;
    let order = state
        .orders
        .get_my_order(identity.user_id(), order_id)
        .await?;
    Ok(Json(order.into()))
}
