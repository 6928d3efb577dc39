use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use common::{
    CartId, CartLineId, LoyaltyReason, LoyaltyTransactionId, OrderId, UserId, VariantId,
};
use tokio::sync::RwLock;

use crate::{
    Cart, CartLine, LoyaltyAccount, LoyaltyTransaction, Order, OrderState, Page, Paged, Promotion,
    Result, StoreError, Variant,
    store::{CartStore, CatalogStore, InventoryLedger, LoyaltyStore, OrderStore, PromotionStore},
};

#[derive(Debug, Default)]
struct MemoryState {
    variants: HashMap<VariantId, Variant>,
    carts: HashMap<CartId, Cart>,
    cart_owners: HashMap<UserId, CartId>,
    /// Insertion order, oldest first.
    orders: Vec<Order>,
    balances: HashMap<UserId, i64>,
    loyalty_log: Vec<LoyaltyTransaction>,
    /// Keyed by code.
    promotions: HashMap<String, Promotion>,
}

/// In-memory store implementation for tests and local development.
///
/// Every operation runs under a single write guard, which gives each one
/// the same all-or-nothing behaviour as a database transaction.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    state: Arc<RwLock<MemoryState>>,
}

impl InMemoryStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the total number of orders stored.
    pub async fn order_count(&self) -> usize {
        self.state.read().await.orders.len()
    }
}

#[async_trait]
impl CatalogStore for InMemoryStore {
    async fn upsert_variant(&self, variant: Variant) -> Result<()> {
        self.state.write().await.variants.insert(variant.id, variant);
        Ok(())
    }

    async fn get_variant(&self, id: VariantId) -> Result<Option<Variant>> {
        Ok(self.state.read().await.variants.get(&id).cloned())
    }

    async fn get_variants(&self, ids: &[VariantId]) -> Result<Vec<Variant>> {
        let state = self.state.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| state.variants.get(id).cloned())
            .collect())
    }
}

#[async_trait]
impl InventoryLedger for InMemoryStore {
    async fn reserve(&self, variant_id: VariantId, quantity: u32) -> Result<u32> {
        let mut state = self.state.write().await;
        let variant = state
            .variants
            .get_mut(&variant_id)
            .ok_or_else(|| StoreError::not_found("variant", variant_id))?;

        if variant.stock < quantity {
            return Err(StoreError::InsufficientStock {
                variant_id,
                requested: quantity,
                available: variant.stock,
            });
        }

        variant.stock -= quantity;
        Ok(variant.stock)
    }

    async fn release(&self, variant_id: VariantId, quantity: u32) -> Result<u32> {
        let mut state = self.state.write().await;
        let variant = state
            .variants
            .get_mut(&variant_id)
            .ok_or_else(|| StoreError::not_found("variant", variant_id))?;

        variant.stock = variant.stock.saturating_add(quantity);
        Ok(variant.stock)
    }
}

#[async_trait]
impl CartStore for InMemoryStore {
    async fn get_or_create_cart(&self, user_id: UserId) -> Result<Cart> {
        let mut guard = self.state.write().await;
        let state = &mut *guard;

        if let Some(cart) = state
            .cart_owners
            .get(&user_id)
            .and_then(|cart_id| state.carts.get(cart_id))
        {
            return Ok(cart.clone());
        }

        let cart = Cart {
            id: CartId::new(),
            user_id,
            created_at: Utc::now(),
            lines: Vec::new(),
        };
        state.cart_owners.insert(user_id, cart.id);
        state.carts.insert(cart.id, cart.clone());
        Ok(cart)
    }

    async fn add_line(&self, cart_id: CartId, variant_id: VariantId, quantity: u32) -> Result<()> {
        let mut guard = self.state.write().await;
        let state = &mut *guard;

        if !state.variants.contains_key(&variant_id) {
            return Err(StoreError::not_found("variant", variant_id));
        }
        let cart = state
            .carts
            .get_mut(&cart_id)
            .ok_or_else(|| StoreError::not_found("cart", cart_id))?;

        match cart.lines.iter_mut().find(|l| l.variant_id == variant_id) {
            Some(line) => {
                let merged = i64::from(line.quantity) + i64::from(quantity);
                line.quantity = u32::try_from(merged)
                    .map_err(|_| StoreError::QuantityLimit { variant_id, quantity: merged })?;
            }
            None => cart.lines.push(CartLine {
                id: CartLineId::new(),
                cart_id,
                variant_id,
                quantity,
            }),
        }
        Ok(())
    }

    async fn set_line_quantity(
        &self,
        cart_id: CartId,
        line_id: CartLineId,
        quantity: u32,
    ) -> Result<bool> {
        let mut state = self.state.write().await;
        let line = state
            .carts
            .get_mut(&cart_id)
            .and_then(|cart| cart.lines.iter_mut().find(|l| l.id == line_id));

        match line {
            Some(line) => {
                line.quantity = quantity;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn remove_line(&self, cart_id: CartId, line_id: CartLineId) -> Result<bool> {
        let mut state = self.state.write().await;
        let Some(cart) = state.carts.get_mut(&cart_id) else {
            return Ok(false);
        };

        let before = cart.lines.len();
        cart.lines.retain(|l| l.id != line_id);
        Ok(cart.lines.len() != before)
    }
}

#[async_trait]
impl OrderStore for InMemoryStore {
    async fn commit_order(&self, order: &Order, consumed: &[CartLine]) -> Result<()> {
        let mut guard = self.state.write().await;
        let state = &mut *guard;

        // Validate everything before the first mutation
        for line in consumed {
            let still_present = state.carts.get(&line.cart_id).is_some_and(|cart| {
                cart.lines
                    .iter()
                    .any(|l| l.id == line.id && l.quantity == line.quantity)
            });
            if !still_present {
                return Err(StoreError::CartChanged {
                    cart_id: line.cart_id,
                });
            }
        }

        if let Some(promotion_id) = order.promotion_id {
            let promotion = state
                .promotions
                .values()
                .find(|p| p.id == promotion_id)
                .ok_or_else(|| StoreError::not_found("promotion", promotion_id))?;
            if promotion.is_exhausted() {
                return Err(StoreError::PromotionExhausted { promotion_id });
            }
        }

        for line in consumed {
            if let Some(cart) = state.carts.get_mut(&line.cart_id) {
                cart.lines.retain(|l| l.id != line.id);
            }
        }
        if let Some(promotion_id) = order.promotion_id
            && let Some(promotion) = state.promotions.values_mut().find(|p| p.id == promotion_id)
        {
            promotion.usage_count += 1;
        }
        state.orders.push(order.clone());

        Ok(())
    }

    async fn get_order(&self, id: OrderId) -> Result<Option<Order>> {
        let state = self.state.read().await;
        Ok(state.orders.iter().find(|o| o.id == id).cloned())
    }

    async fn list_orders_for_user(&self, user_id: UserId) -> Result<Vec<Order>> {
        let state = self.state.read().await;
        Ok(state
            .orders
            .iter()
            .rev()
            .filter(|o| o.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn list_orders(&self, page: Page) -> Result<Paged<Order>> {
        let state = self.state.read().await;
        let items = state
            .orders
            .iter()
            .rev()
            .skip(page.skip)
            .take(page.take)
            .cloned()
            .collect();

        Ok(Paged {
            items,
            total: state.orders.len(),
        })
    }

    async fn transition_order(
        &self,
        id: OrderId,
        from: OrderState,
        to: OrderState,
        restock: bool,
    ) -> Result<bool> {
        let mut guard = self.state.write().await;
        let state = &mut *guard;

        let order = state
            .orders
            .iter_mut()
            .find(|o| o.id == id)
            .ok_or_else(|| StoreError::not_found("order", id))?;

        if order.state() != from {
            return Ok(false);
        }

        order.status = to.status;
        order.payment_status = to.payment_status;
        order.updated_at = Utc::now();

        if restock {
            for line in &order.lines {
                if let Some(variant) = state.variants.get_mut(&line.variant_id) {
                    variant.stock = variant.stock.saturating_add(line.quantity);
                }
            }
        }

        Ok(true)
    }
}

#[async_trait]
impl LoyaltyStore for InMemoryStore {
    async fn earn(
        &self,
        user_id: UserId,
        points: i64,
        order_id: OrderId,
    ) -> Result<Option<LoyaltyTransaction>> {
        let mut guard = self.state.write().await;
        let state = &mut *guard;

        let already_credited = state
            .loyalty_log
            .iter()
            .any(|t| t.order_id == Some(order_id) && t.reason == LoyaltyReason::OrderEarn);
        if already_credited {
            return Ok(None);
        }

        let transaction = LoyaltyTransaction {
            id: LoyaltyTransactionId::new(),
            user_id,
            delta: points,
            reason: LoyaltyReason::OrderEarn,
            order_id: Some(order_id),
            created_at: Utc::now(),
        };
        *state.balances.entry(user_id).or_insert(0) += points;
        state.loyalty_log.push(transaction.clone());

        Ok(Some(transaction))
    }

    async fn redeem(&self, user_id: UserId, points: i64) -> Result<LoyaltyTransaction> {
        let mut guard = self.state.write().await;
        let state = &mut *guard;

        let balance = state.balances.entry(user_id).or_insert(0);
        if *balance < points {
            return Err(StoreError::InsufficientBalance {
                requested: points,
                available: *balance,
            });
        }
        *balance -= points;

        let transaction = LoyaltyTransaction {
            id: LoyaltyTransactionId::new(),
            user_id,
            delta: -points,
            reason: LoyaltyReason::Redemption,
            order_id: None,
            created_at: Utc::now(),
        };
        state.loyalty_log.push(transaction.clone());

        Ok(transaction)
    }

    async fn get_account(&self, user_id: UserId) -> Result<LoyaltyAccount> {
        let state = self.state.read().await;
        Ok(LoyaltyAccount {
            user_id,
            balance: state.balances.get(&user_id).copied().unwrap_or(0),
        })
    }

    async fn recent_transactions(
        &self,
        user_id: UserId,
        limit: usize,
    ) -> Result<Vec<LoyaltyTransaction>> {
        let state = self.state.read().await;
        Ok(state
            .loyalty_log
            .iter()
            .rev()
            .filter(|t| t.user_id == user_id)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn ledger_total(&self, user_id: UserId) -> Result<i64> {
        let state = self.state.read().await;
        Ok(state
            .loyalty_log
            .iter()
            .filter(|t| t.user_id == user_id)
            .map(|t| t.delta)
            .sum())
    }
}

#[async_trait]
impl PromotionStore for InMemoryStore {
    async fn upsert_promotion(&self, promotion: Promotion) -> Result<()> {
        let mut state = self.state.write().await;
        if state
            .promotions
            .get(&promotion.code)
            .is_some_and(|existing| existing.id != promotion.id)
        {
            return Err(StoreError::DuplicatePromotionCode {
                code: promotion.code,
            });
        }
        state.promotions.retain(|_, p| p.id != promotion.id);
        state.promotions.insert(promotion.code.clone(), promotion);
        Ok(())
    }

    async fn find_promotion(&self, code: &str) -> Result<Option<Promotion>> {
        Ok(self.state.read().await.promotions.get(code).cloned())
    }
}
