//! Shared types for the storefront core.

mod money;
mod status;
mod types;

pub use money::Money;
pub use status::{DiscountType, LoyaltyReason, OrderStatus, ParseStatusError, PaymentStatus};
pub use types::{
    CartId, CartLineId, LoyaltyTransactionId, OrderId, OrderLineId, PromotionId, UserId,
    VariantId,
};
