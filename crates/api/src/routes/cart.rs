//! Cart endpoints. Every handler acts on the caller's own cart.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use common::{CartLineId, VariantId};
use domain::{CartItemView, CartView};
use serde::{Deserialize, Serialize};
use store::Store;

use super::parse_id;
use crate::error::ApiError;
use crate::identity::Identity;
use crate::state::AppState;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddItemRequest {
    pub variant_id: String,
    pub quantity: i64,
}

#[derive(Deserialize)]
pub struct SetQuantityRequest {
    pub quantity: i64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItemResponse {
    pub line_id: String,
    pub variant_id: String,
    pub product_name: String,
    pub variant_name: String,
    pub unit_price: i64,
    pub quantity: u32,
    pub line_total: i64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartResponse {
    pub id: String,
    pub user_id: String,
    pub items: Vec<CartItemResponse>,
    pub subtotal: i64,
}

impl From<CartItemView> for CartItemResponse {
    fn from(item: CartItemView) -> Self {
        Self {
            line_id: item.line_id.to_string(),
            variant_id: item.variant_id.to_string(),
            product_name: item.product_name,
            variant_name: item.variant_name,
            unit_price: item.unit_price.amount(),
            quantity: item.quantity,
            line_total: item.line_total.amount(),
        }
    }
}

impl From<CartView> for CartResponse {
    fn from(cart: CartView) -> Self {
        Self {
            id: cart.id.to_string(),
            user_id: cart.user_id.to_string(),
            items: cart.items.into_iter().map(CartItemResponse::from).collect(),
            subtotal: cart.subtotal.amount(),
        }
    }
}

/// GET /cart: the caller's cart, created on first access.
#[tracing::instrument(skip(state))]
pub async fn get<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    identity: Identity,
) -> Result<Json<CartResponse>, ApiError> {
    let cart = state.carts.get_cart(identity.user_id()).await?;
    Ok(Json(cart.into()))
}

/// POST /cart/items: add a variant, merging with an existing line.
#[tracing::instrument(skip(state, req))]
pub async fn add_item<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    identity: Identity,
    Json(req): Json<AddItemRequest>,
) -> Result<Json<CartResponse>, ApiError> {
    let variant_id: VariantId = parse_id("variantId", &req.variant_id)?;
    let cart = state
        .carts
        .add_item(identity.user_id(), variant_id, req.quantity)
        .await?;
    Ok(Json(cart.into()))
}

/// PATCH /cart/items/{line_id}: overwrite a line's quantity.
#[tracing::instrument(skip(state, req))]
pub async fn set_quantity<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    identity: Identity,
    Path(line_id): Path<String>,
    Json(req): Json<SetQuantityRequest>,
) -> Result<Json<CartResponse>, ApiError> {
    let line_id: CartLineId = parse_id("line id", &line_id)?;
    let cart = state
        .carts
        .set_item_quantity(identity.user_id(), line_id, req.quantity)
        .await?;
    Ok(Json(cart.into()))
}

/// DELETE /cart/items/{line_id}: remove a line; absent lines are ignored.
#[tracing::instrument(skip(state))]
pub async fn remove_item<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    identity: Identity,
    Path(line_id): Path<String>,
) -> Result<Json<CartResponse>, ApiError> {
    let line_id: CartLineId = parse_id("line id", &line_id)?;
    let cart = state
        .carts
        .remove_item(identity.user_id(), line_id)
        .await?;
    Ok(Json(cart.into()))
}
