//! Storage layer for the storefront core.
//!
//! Every table the core writes is reached through one of the traits in
//! [`store`]. Two backends implement all of them: [`InMemoryStore`] for tests
//! and local runs, [`PostgresStore`] for production.

pub mod error;
pub mod memory;
pub mod model;
pub mod postgres;
pub mod query;
pub mod store;

pub use error::{Result, StoreError};
pub use memory::InMemoryStore;
pub use model::{
    Cart, CartLine, LoyaltyAccount, LoyaltyTransaction, Order, OrderLine, OrderState, Promotion,
    ShippingInfo, Variant,
};
pub use postgres::PostgresStore;
pub use query::{Page, Paged};
pub use store::{
    CartStore, CatalogStore, InventoryLedger, LoyaltyStore, OrderStore, PromotionStore, Store,
};
