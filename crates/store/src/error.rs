use common::{CartId, PromotionId, VariantId};
use thiserror::Error;

/// Errors that can occur when interacting with the store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A referenced row does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// A conditional stock decrement did not match.
    #[error("Insufficient stock for variant {variant_id}: requested {requested}, available {available}")]
    InsufficientStock {
        variant_id: VariantId,
        requested: u32,
        available: u32,
    },

    /// A conditional balance decrement did not match.
    #[error("Insufficient points: requested {requested}, available {available}")]
    InsufficientBalance { requested: i64, available: i64 },

    /// The promotion reached its usage cap between validation and commit.
    #[error("Promotion {promotion_id} has reached its usage limit")]
    PromotionExhausted { promotion_id: PromotionId },

    /// The cart no longer holds the lines that were checked out.
    #[error("Cart {cart_id} was modified during checkout")]
    CartChanged { cart_id: CartId },

    /// Merging into an existing cart line would exceed the per-line maximum.
    #[error("Quantity {quantity} for variant {variant_id} exceeds the line maximum of {max}", max = u32::MAX)]
    QuantityLimit { variant_id: VariantId, quantity: i64 },

    /// Another promotion already uses this code.
    #[error("Promotion code {code} is already in use")]
    DuplicatePromotionCode { code: String },

    /// A stored value could not be mapped back to a domain type.
    #[error("Decode error: {0}")]
    Decode(String),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

impl From<common::ParseStatusError> for StoreError {
    fn from(err: common::ParseStatusError) -> Self {
        StoreError::Decode(err.to_string())
    }
}

impl StoreError {
    pub(crate) fn not_found(entity: &'static str, id: impl ToString) -> Self {
        StoreError::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
