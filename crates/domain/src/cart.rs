//! Cart aggregate: one lazily created cart per user.

use std::collections::HashMap;

use common::{CartId, CartLineId, Money, UserId, VariantId};
use serde::Serialize;
use store::{Cart, CartStore, CatalogStore};

use crate::error::{DomainError, Result};

/// A cart line joined with the variant's current price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartItemView {
    pub line_id: CartLineId,
    pub variant_id: VariantId,
    pub product_name: String,
    pub variant_name: String,
    pub unit_price: Money,
    pub quantity: u32,
    pub line_total: Money,
}

/// A priced cart as returned to the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartView {
    pub id: CartId,
    pub user_id: UserId,
    pub items: Vec<CartItemView>,
    pub subtotal: Money,
}

/// Converts a caller-supplied quantity, rejecting zero, negatives and overflow.
pub(crate) fn positive_quantity(quantity: i64) -> Result<u32> {
    u32::try_from(quantity)
        .ok()
        .filter(|q| *q > 0)
        .ok_or(DomainError::InvalidQuantity { quantity })
}

#[derive(Clone)]
pub struct CartService<S> {
    store: S,
}

impl<S: CartStore + CatalogStore> CartService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Returns the user's cart, creating it on first access.
    #[tracing::instrument(skip(self))]
    pub async fn get_or_create_cart(&self, user_id: UserId) -> Result<Cart> {
        Ok(self.store.get_or_create_cart(user_id).await?)
    }

    /// Returns the user's cart priced with current variant data.
    #[tracing::instrument(skip(self))]
    pub async fn get_cart(&self, user_id: UserId) -> Result<CartView> {
        let cart = self.get_or_create_cart(user_id).await?;
        self.price(cart).await
    }

    /// Adds `quantity` of a variant, merging with an existing line.
    #[tracing::instrument(skip(self))]
    pub async fn add_item(
        &self,
        user_id: UserId,
        variant_id: VariantId,
        quantity: i64,
    ) -> Result<CartView> {
        let quantity = positive_quantity(quantity)?;
        let cart = self.get_or_create_cart(user_id).await?;

        self.store.add_line(cart.id, variant_id, quantity).await?;
        tracing::debug!(%user_id, %variant_id, quantity, "cart item added");

        self.get_cart(user_id).await
    }

    /// Overwrites a line's quantity. The line must be in the user's own cart.
    #[tracing::instrument(skip(self))]
    pub async fn set_item_quantity(
        &self,
        user_id: UserId,
        line_id: CartLineId,
        quantity: i64,
    ) -> Result<CartView> {
        let quantity = positive_quantity(quantity)?;
        let cart = self.get_or_create_cart(user_id).await?;

        if !self.store.set_line_quantity(cart.id, line_id, quantity).await? {
            return Err(DomainError::not_found("cart line", line_id));
        }

        self.get_cart(user_id).await
    }

    /// Removes a line from the user's cart. Absent lines are ignored.
    #[tracing::instrument(skip(self))]
    pub async fn remove_item(&self, user_id: UserId, line_id: CartLineId) -> Result<CartView> {
        let cart = self.get_or_create_cart(user_id).await?;

        if !self.store.remove_line(cart.id, line_id).await? {
            tracing::debug!(%user_id, %line_id, "cart line already absent");
        }

        self.get_cart(user_id).await
    }

    async fn price(&self, cart: Cart) -> Result<CartView> {
        let ids: Vec<VariantId> = cart.lines.iter().map(|l| l.variant_id).collect();
        let variants: HashMap<_, _> = self
            .store
            .get_variants(&ids)
            .await?
            .into_iter()
            .map(|v| (v.id, v))
            .collect();

        let mut items = Vec::with_capacity(cart.lines.len());
        for line in &cart.lines {
            let Some(variant) = variants.get(&line.variant_id) else {
                tracing::warn!(cart_id = %cart.id, variant_id = %line.variant_id, "cart line references unknown variant");
                continue;
            };
            items.push(CartItemView {
                line_id: line.id,
                variant_id: variant.id,
                product_name: variant.product_name.clone(),
                variant_name: variant.name.clone(),
                unit_price: variant.price,
                quantity: line.quantity,
                line_total: variant.price.multiply(line.quantity),
            });
        }

        Ok(CartView {
            id: cart.id,
            user_id: cart.user_id,
            subtotal: items.iter().map(|i| i.line_total).sum(),
            items,
        })
    }
}
