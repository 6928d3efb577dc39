//! Order service: cart checkout and the order lifecycle.

use std::collections::HashMap;
use std::time::Instant;

use chrono::Utc;
use common::{Money, OrderId, OrderLineId, OrderStatus, PaymentStatus, UserId, VariantId};
use store::{LoyaltyTransaction, Order, OrderLine, Page, Paged, Store, StoreError};

use crate::capability::{Actor, Capability};
use crate::config::{AccrualMode, LoyaltyConfig};
use crate::error::{DomainError, Result};
use crate::inventory::{InventoryService, ReservationItem};
use crate::loyalty::LoyaltyService;
use crate::promotion::PromotionValidator;

use super::{CreateOrder, StatusChange, plan_transition};

/// Service for placing and managing orders.
///
/// Checkout reserves stock line by line, compensating on failure, and then
/// commits the order, the cart clear and the promotion usage in a single
/// store transaction. Loyalty accrual follows the commit and never undoes it.
#[derive(Clone)]
pub struct OrderService<S> {
    store: S,
    inventory: InventoryService<S>,
    promotions: PromotionValidator<S>,
    loyalty: LoyaltyService<S>,
}

impl<S: Store + Clone + 'static> OrderService<S> {
    /// Creates a new order service over the given store.
    pub fn new(store: S, loyalty_config: LoyaltyConfig) -> Self {
        Self {
            inventory: InventoryService::new(store.clone()),
            promotions: PromotionValidator::new(store.clone()),
            loyalty: LoyaltyService::new(store.clone(), loyalty_config),
            store,
        }
    }

    pub fn loyalty(&self) -> &LoyaltyService<S> {
        &self.loyalty
    }

    /// Converts the user's cart into an order.
    #[tracing::instrument(skip(self, cmd))]
    pub async fn create_order(&self, user_id: UserId, cmd: CreateOrder) -> Result<Order> {
        let started = Instant::now();
        let result = self.checkout(user_id, &cmd).await;
        metrics::histogram!("checkout_duration_seconds").record(started.elapsed().as_secs_f64());

        let order = match result {
            Ok(order) => order,
            Err(err) => {
                metrics::counter!("orders_failed_total", "reason" => err.code()).increment(1);
                tracing::warn!(%user_id, error = %err, "checkout failed");
                return Err(err);
            }
        };

        metrics::counter!("orders_created_total").increment(1);
        tracing::info!(
            %user_id,
            order_id = %order.id,
            final_amount = order.final_amount.amount(),
            "order created"
        );

        self.schedule_accrual(&order).await;
        Ok(order)
    }

    async fn checkout(&self, user_id: UserId, cmd: &CreateOrder) -> Result<Order> {
        // 1. Load the cart
        let cart = self.store.get_or_create_cart(user_id).await?;
        if cart.is_empty() {
            return Err(DomainError::EmptyCart);
        }

        // 2. Snapshot current prices and names
        let ids: Vec<VariantId> = cart.lines.iter().map(|l| l.variant_id).collect();
        let variants: HashMap<_, _> = self
            .store
            .get_variants(&ids)
            .await?
            .into_iter()
            .map(|v| (v.id, v))
            .collect();

        let lines = cart
            .lines
            .iter()
            .map(|line| {
                let variant = variants
                    .get(&line.variant_id)
                    .ok_or_else(|| DomainError::not_found("variant", line.variant_id))?;
                Ok(OrderLine {
                    id: OrderLineId::new(),
                    variant_id: variant.id,
                    product_name: variant.product_name.clone(),
                    variant_name: variant.name.clone(),
                    unit_price: variant.price,
                    quantity: line.quantity,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        let total_amount: Money = lines.iter().map(OrderLine::line_total).sum();

        // 3. Validate the promotion before touching stock
        let promotion = match cmd.promotion_code() {
            Some(code) => Some(self.promotions.validate(code, total_amount).await?),
            None => None,
        };

        // 4. Reserve every line or none
        let items: Vec<ReservationItem> = lines
            .iter()
            .map(|line| ReservationItem {
                variant_id: line.variant_id,
                item: format!("{} {}", line.product_name, line.variant_name),
                quantity: line.quantity,
            })
            .collect();
        let reservation = self.inventory.reserve_all(&items).await?;

        // 5. Totals; the discount is clamped so the final amount stays >= 0
        let discount_amount = promotion
            .as_ref()
            .map(|p| p.discount_amount.min(total_amount))
            .unwrap_or_default();
        let final_amount = total_amount.saturating_sub(discount_amount);

        // 6-7. Persist the order, clear the cart and count the promotion together
        let now = Utc::now();
        let order = Order {
            id: OrderId::new(),
            user_id,
            shipping: cmd.shipping.clone(),
            lines,
            total_amount,
            discount_amount,
            final_amount,
            promotion_id: promotion.as_ref().map(|p| p.promotion_id),
            status: OrderStatus::Pending,
            payment_status: PaymentStatus::Pending,
            created_at: now,
            updated_at: now,
        };

        if let Err(err) = self.store.commit_order(&order, &cart.lines).await {
            tracing::warn!(order_id = %order.id, error = %err, "order commit failed, releasing stock");
            self.inventory.release_all(&reservation).await;
            return Err(match (err, &promotion) {
                (StoreError::PromotionExhausted { .. }, Some(applied)) => {
                    DomainError::PromotionExhausted {
                        code: applied.code.clone(),
                    }
                }
                (err, _) => err.into(),
            });
        }

        Ok(order)
    }

    async fn schedule_accrual(&self, order: &Order) {
        let (user_id, amount, order_id) = (order.user_id, order.final_amount, order.id);

        match self.loyalty.config().accrual {
            AccrualMode::Inline => {
                if let Err(err) = self.loyalty.earn_points(user_id, amount, order_id).await {
                    tracing::warn!(%order_id, error = %err, "loyalty accrual failed");
                }
            }
            AccrualMode::Background => {
                let loyalty = self.loyalty.clone();
                tokio::spawn(async move {
                    if let Err(err) = loyalty.earn_points(user_id, amount, order_id).await {
                        tracing::warn!(%order_id, error = %err, "loyalty accrual failed");
                    }
                });
            }
        }
    }

    async fn load(&self, order_id: OrderId) -> Result<Order> {
        self.store
            .get_order(order_id)
            .await?
            .ok_or_else(|| DomainError::not_found("order", order_id))
    }

    /// Returns the user's orders, newest first.
    #[tracing::instrument(skip(self))]
    pub async fn list_my_orders(&self, user_id: UserId) -> Result<Vec<Order>> {
        Ok(self.store.list_orders_for_user(user_id).await?)
    }

    /// Returns one of the user's own orders.
    ///
    /// Orders of other users are reported as not found.
    #[tracing::instrument(skip(self))]
    pub async fn get_my_order(&self, user_id: UserId, order_id: OrderId) -> Result<Order> {
        let order = self.load(order_id).await?;
        if order.user_id != user_id {
            return Err(DomainError::not_found("order", order_id));
        }
        Ok(order)
    }

    /// Lists all orders, newest first. Admin only.
    #[tracing::instrument(skip(self))]
    pub async fn list_orders(&self, actor: &Actor, page: Page) -> Result<Paged<Order>> {
        actor.authorize(Capability::ListAllOrders)?;
        Ok(self.store.list_orders(page).await?)
    }

    /// Loads any order. Admin only, unless the actor owns it.
    #[tracing::instrument(skip(self))]
    pub async fn get_order(&self, actor: &Actor, order_id: OrderId) -> Result<Order> {
        let order = self.load(order_id).await?;
        if order.user_id != actor.user_id {
            actor.authorize(Capability::ViewAnyOrder)?;
        }
        Ok(order)
    }

    /// Applies a status and/or payment change. Admin only.
    ///
    /// The change is validated against the state machine and applied with
    /// a compare-and-swap; a lost race re-validates against the new state.
    #[tracing::instrument(skip(self))]
    pub async fn update_status(
        &self,
        actor: &Actor,
        order_id: OrderId,
        change: StatusChange,
    ) -> Result<Order> {
        actor.authorize(Capability::UpdateOrderStatus)?;

        loop {
            let order = self.load(order_id).await?;
            let Some(transition) = plan_transition(order.state(), change)? else {
                return Ok(order);
            };

            let applied = self
                .store
                .transition_order(order_id, transition.from, transition.to, transition.restock)
                .await?;
            if !applied {
                tracing::debug!(%order_id, "order changed concurrently, re-validating");
                continue;
            }

            if transition.restock {
                metrics::counter!("inventory_releases_total").increment(order.lines.len() as u64);
            }
            tracing::info!(
                %order_id,
                status = %transition.to.status,
                payment_status = %transition.to.payment_status,
                restocked = transition.restock,
                "order status updated"
            );
            return self.load(order_id).await;
        }
    }

    /// Re-runs loyalty accrual for an order. Admin only, idempotent.
    ///
    /// Cancelled orders earn nothing.
    #[tracing::instrument(skip(self))]
    pub async fn accrue_loyalty(
        &self,
        actor: &Actor,
        order_id: OrderId,
    ) -> Result<Option<LoyaltyTransaction>> {
        actor.authorize(Capability::RetryLoyaltyAccrual)?;

        let order = self.load(order_id).await?;
        if order.status == OrderStatus::Cancelled {
            tracing::debug!(%order_id, "cancelled order earns no points");
            return Ok(None);
        }

        self.loyalty
            .earn_points(order.user_id, order.final_amount, order.id)
            .await
    }
}
