use async_trait::async_trait;
use common::{CartId, CartLineId, OrderId, UserId, VariantId};

use crate::{
    Cart, CartLine, LoyaltyAccount, LoyaltyTransaction, Order, OrderState, Page, Paged, Promotion,
    Result, Variant,
};

/// Read access to the variant catalog, plus seeding.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Inserts or replaces a variant (including its stock level).
    async fn upsert_variant(&self, variant: Variant) -> Result<()>;

    async fn get_variant(&self, id: VariantId) -> Result<Option<Variant>>;

    /// Loads several variants at once. Unknown ids are skipped.
    async fn get_variants(&self, ids: &[VariantId]) -> Result<Vec<Variant>>;
}

/// Stock per variant, the contended resource of checkout.
///
/// Implementations must perform the check and the decrement as one atomic
/// step so concurrent reservations can never drive stock below zero.
#[async_trait]
pub trait InventoryLedger: Send + Sync {
    /// Decrements stock by `quantity` if at least that much is available.
    ///
    /// Returns the remaining stock, or `InsufficientStock` leaving stock
    /// untouched.
    async fn reserve(&self, variant_id: VariantId, quantity: u32) -> Result<u32>;

    /// Compensating increment for a previous reservation.
    ///
    /// Returns the resulting stock.
    async fn release(&self, variant_id: VariantId, quantity: u32) -> Result<u32>;
}

/// Per-user carts and their lines.
#[async_trait]
pub trait CartStore: Send + Sync {
    /// Returns the user's cart, creating an empty one on first access.
    ///
    /// Concurrent first accesses resolve to the same cart.
    async fn get_or_create_cart(&self, user_id: UserId) -> Result<Cart>;

    /// Adds `quantity` of a variant, merging into an existing line.
    async fn add_line(&self, cart_id: CartId, variant_id: VariantId, quantity: u32) -> Result<()>;

    /// Overwrites a line's quantity. Returns false if the line is not in this cart.
    async fn set_line_quantity(
        &self,
        cart_id: CartId,
        line_id: CartLineId,
        quantity: u32,
    ) -> Result<bool>;

    /// Deletes a line. Returns false if the line is not in this cart.
    async fn remove_line(&self, cart_id: CartId, line_id: CartLineId) -> Result<bool>;
}

/// Orders and their status transitions.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Persists a new order in a single transaction that also
    /// - deletes exactly the `consumed` cart lines (id and quantity must
    ///   still match, otherwise `CartChanged`), and
    /// - increments the usage count of the order's promotion, if any
    ///   (failing with `PromotionExhausted` when the cap was reached).
    ///
    /// Nothing is written when any part fails.
    async fn commit_order(&self, order: &Order, consumed: &[CartLine]) -> Result<()>;

    async fn get_order(&self, id: OrderId) -> Result<Option<Order>>;

    /// Returns the user's orders, newest first.
    async fn list_orders_for_user(&self, user_id: UserId) -> Result<Vec<Order>>;

    /// Returns one page of all orders, newest first.
    async fn list_orders(&self, page: Page) -> Result<Paged<Order>>;

    /// Moves an order from `from` to `to` if it is still in `from`.
    ///
    /// When `restock` is set, every line's quantity is returned to the
    /// inventory ledger in the same transaction. Returns false when the
    /// order was concurrently moved away from `from`.
    async fn transition_order(
        &self,
        id: OrderId,
        from: OrderState,
        to: OrderState,
        restock: bool,
    ) -> Result<bool>;
}

/// Point balances and their append-only transaction log.
///
/// Every mutation writes the balance and the log entry together, so the
/// balance always equals the sum of the user's deltas.
#[async_trait]
pub trait LoyaltyStore: Send + Sync {
    /// Credits `points` for an order.
    ///
    /// Returns `None` if the order was already credited.
    async fn earn(
        &self,
        user_id: UserId,
        points: i64,
        order_id: OrderId,
    ) -> Result<Option<LoyaltyTransaction>>;

    /// Debits `points` if the balance covers them, otherwise fails with
    /// `InsufficientBalance` and changes nothing.
    async fn redeem(&self, user_id: UserId, points: i64) -> Result<LoyaltyTransaction>;

    /// Returns the account, with a zero balance if the user never earned.
    async fn get_account(&self, user_id: UserId) -> Result<LoyaltyAccount>;

    /// Returns the user's latest transactions, newest first.
    async fn recent_transactions(
        &self,
        user_id: UserId,
        limit: usize,
    ) -> Result<Vec<LoyaltyTransaction>>;

    /// Sum of every delta in the user's log.
    async fn ledger_total(&self, user_id: UserId) -> Result<i64>;
}

/// Promotion rules, looked up by code.
#[async_trait]
pub trait PromotionStore: Send + Sync {
    async fn upsert_promotion(&self, promotion: Promotion) -> Result<()>;

    async fn find_promotion(&self, code: &str) -> Result<Option<Promotion>>;
}

/// Everything the storefront core persists.
pub trait Store:
    CatalogStore + InventoryLedger + CartStore + OrderStore + LoyaltyStore + PromotionStore
{
}

// Blanket implementation for all backends providing every part
impl<T> Store for T where
    T: CatalogStore + InventoryLedger + CartStore + OrderStore + LoyaltyStore + PromotionStore
{
}
