//! Storefront core: carts, inventory, promotions, orders and loyalty.
//!
//! Each component is a service generic over the store traits it needs:
//! - [`CartService`]: one lazily created cart per user
//! - [`InventoryService`]: atomic stock reservation with compensation
//! - [`PromotionValidator`]: code + amount to discount, read-only
//! - [`OrderService`]: checkout and the order state machine
//! - [`LoyaltyService`]: point accrual, redemption and history

pub mod capability;
pub mod cart;
pub mod config;
pub mod error;
pub mod inventory;
pub mod loyalty;
pub mod order;
pub mod promotion;

pub use capability::{Actor, Capability, Role};
pub use cart::{CartItemView, CartService, CartView};
pub use config::{AccrualMode, LoyaltyConfig};
pub use error::{DomainError, Result};
pub use inventory::{InventoryService, Reservation, ReservationItem};
pub use loyalty::{LoyaltyService, LoyaltyStatus, Redemption};
pub use order::{CreateOrder, OrderService, StatusChange, Transition, plan_transition};
pub use promotion::{AppliedPromotion, PromotionValidator, discount_for};
