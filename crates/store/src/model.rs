//! Persisted row types.

use chrono::{DateTime, Utc};
use common::{
    CartId, CartLineId, DiscountType, LoyaltyReason, LoyaltyTransactionId, Money, OrderId,
    OrderLineId, OrderStatus, PaymentStatus, PromotionId, UserId, VariantId,
};
use serde::{Deserialize, Serialize};

/// A purchasable SKU with its current price and available stock.
///
/// Referenced by carts and orders but owned by the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variant {
    pub id: VariantId,
    pub product_name: String,
    pub name: String,
    pub price: Money,
    pub stock: u32,
}

impl Variant {
    pub fn new(
        product_name: impl Into<String>,
        name: impl Into<String>,
        price: Money,
        stock: u32,
    ) -> Self {
        Self {
            id: VariantId::new(),
            product_name: product_name.into(),
            name: name.into(),
            price,
            stock,
        }
    }
}

/// One (variant, quantity) entry of a cart. Quantity is always at least 1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub id: CartLineId,
    pub cart_id: CartId,
    pub variant_id: VariantId,
    pub quantity: u32,
}

/// A user's cart. A user owns exactly one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    pub id: CartId,
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
    pub lines: Vec<CartLine>,
}

impl Cart {
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Delivery details captured at checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingInfo {
    pub address: String,
    pub phone: String,
}

/// Immutable snapshot of a purchased variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub id: OrderLineId,
    pub variant_id: VariantId,
    pub product_name: String,
    pub variant_name: String,
    pub unit_price: Money,
    pub quantity: u32,
}

impl OrderLine {
    /// Returns `unit_price * quantity`.
    pub fn line_total(&self) -> Money {
        self.unit_price.multiply(self.quantity)
    }
}

/// Fulfilment and payment status of an order, compared and swapped together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct OrderState {
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
}

impl OrderState {
    pub fn new(status: OrderStatus, payment_status: PaymentStatus) -> Self {
        Self {
            status,
            payment_status,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub shipping: ShippingInfo,
    pub lines: Vec<OrderLine>,
    pub total_amount: Money,
    pub discount_amount: Money,
    pub final_amount: Money,
    pub promotion_id: Option<PromotionId>,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub fn state(&self) -> OrderState {
        OrderState::new(self.status, self.payment_status)
    }
}

/// A user's current point balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoyaltyAccount {
    pub user_id: UserId,
    pub balance: i64,
}

/// An append-only entry of the loyalty ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoyaltyTransaction {
    pub id: LoyaltyTransactionId,
    pub user_id: UserId,
    pub delta: i64,
    pub reason: LoyaltyReason,
    pub order_id: Option<OrderId>,
    pub created_at: DateTime<Utc>,
}

/// A code-activated discount rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Promotion {
    pub id: PromotionId,
    pub code: String,
    pub discount_type: DiscountType,
    /// Percent (0-100) for `Percentage`, currency amount for `FixedAmount`.
    pub discount_value: i64,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
    pub usage_limit: Option<u32>,
    pub usage_count: u32,
    pub active: bool,
}

impl Promotion {
    /// Creates an active promotion with no validity window and no usage cap.
    pub fn new(code: impl Into<String>, discount_type: DiscountType, discount_value: i64) -> Self {
        Self {
            id: PromotionId::new(),
            code: code.into(),
            discount_type,
            discount_value,
            starts_at: None,
            ends_at: None,
            usage_limit: None,
            usage_count: 0,
            active: true,
        }
    }

    /// Returns true if `now` falls inside the validity window and the
    /// promotion has not been switched off.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.active
            && self.starts_at.is_none_or(|start| now >= start)
            && self.ends_at.is_none_or(|end| now <= end)
    }

    /// Returns true if the usage cap has been reached.
    pub fn is_exhausted(&self) -> bool {
        self.usage_limit
            .is_some_and(|limit| self.usage_count >= limit)
    }
}
