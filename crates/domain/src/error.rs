//! Domain error types.

use common::VariantId;
use store::StoreError;
use thiserror::Error;

/// Errors that can occur during storefront operations.
#[derive(Debug, Error)]
pub enum DomainError {
    /// A quantity or point amount was non-positive or too large.
    #[error("Invalid quantity: {quantity}")]
    InvalidQuantity { quantity: i64 },

    /// Checkout was attempted on a cart without lines.
    #[error("Cart is empty")]
    EmptyCart,

    /// A line could not be reserved. `item` names the product when known.
    #[error("Insufficient stock for {item}: requested {requested}, available {available}")]
    InsufficientStock {
        variant_id: VariantId,
        item: String,
        requested: u32,
        available: u32,
    },

    #[error("Promotion code {code} not found")]
    PromotionNotFound { code: String },

    /// Outside its validity window, or switched off.
    #[error("Promotion code {code} has expired")]
    PromotionExpired { code: String },

    #[error("Promotion code {code} has reached its usage limit")]
    PromotionExhausted { code: String },

    #[error(
        "Insufficient points: requested {requested}, available {available} ({shortfall} short)",
        shortfall = .requested - .available
    )]
    InsufficientPoints { requested: i64, available: i64 },

    #[error("Invalid transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    /// A lookup by id failed, or the entity belongs to someone else.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// The caller lacks the capability for an operation.
    #[error("Not allowed to {action}")]
    Forbidden { action: &'static str },

    /// The cart was modified while a checkout was in flight.
    #[error("Cart was modified during checkout, please review it and retry")]
    CartChanged,

    /// An infrastructure failure in the store.
    #[error("Store error: {0}")]
    Store(StoreError),
}

impl DomainError {
    pub(crate) fn not_found(entity: &'static str, id: impl ToString) -> Self {
        DomainError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Stable machine-readable code, used as a metric label and in API bodies.
    pub fn code(&self) -> &'static str {
        match self {
            DomainError::InvalidQuantity { .. } => "INVALID_QUANTITY",
            DomainError::EmptyCart => "EMPTY_CART",
            DomainError::InsufficientStock { .. } => "INSUFFICIENT_STOCK",
            DomainError::PromotionNotFound { .. } => "PROMOTION_NOT_FOUND",
            DomainError::PromotionExpired { .. } => "PROMOTION_EXPIRED",
            DomainError::PromotionExhausted { .. } => "PROMOTION_EXHAUSTED",
            DomainError::InsufficientPoints { .. } => "INSUFFICIENT_POINTS",
            DomainError::InvalidTransition { .. } => "INVALID_TRANSITION",
            DomainError::NotFound { .. } => "NOT_FOUND",
            DomainError::Forbidden { .. } => "FORBIDDEN",
            DomainError::CartChanged => "CART_CHANGED",
            DomainError::Store(_) => "STORE_ERROR",
        }
    }
}

impl From<StoreError> for DomainError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { entity, id } => DomainError::NotFound { entity, id },
            StoreError::InsufficientStock {
                variant_id,
                requested,
                available,
            } => DomainError::InsufficientStock {
                variant_id,
                item: format!("variant {variant_id}"),
                requested,
                available,
            },
            StoreError::InsufficientBalance {
                requested,
                available,
            } => DomainError::InsufficientPoints {
                requested,
                available,
            },
            StoreError::PromotionExhausted { promotion_id } => DomainError::PromotionExhausted {
                code: promotion_id.to_string(),
            },
            StoreError::CartChanged { .. } => DomainError::CartChanged,
            StoreError::QuantityLimit { quantity, .. } => DomainError::InvalidQuantity { quantity },
            other => DomainError::Store(other),
        }
    }
}

/// Result type for domain operations.
pub type Result<T> = std::result::Result<T, DomainError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_points_states_shortfall() {
        let err = DomainError::InsufficientPoints {
            requested: 100,
            available: 40,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient points: requested 100, available 40 (60 short)"
        );
    }

    #[test]
    fn test_store_errors_map_to_domain_taxonomy() {
        let err: DomainError = StoreError::InsufficientBalance {
            requested: 5,
            available: 1,
        }
        .into();
        assert!(matches!(err, DomainError::InsufficientPoints { .. }));

        let variant_id = VariantId::new();
        let err: DomainError = StoreError::InsufficientStock {
            variant_id,
            requested: 2,
            available: 1,
        }
        .into();
        assert!(err.to_string().contains(&variant_id.to_string()));
        assert_eq!(err.code(), "INSUFFICIENT_STOCK");

        let err: DomainError = StoreError::QuantityLimit {
            variant_id,
            quantity: i64::from(u32::MAX) + 1,
        }
        .into();
        assert!(matches!(err, DomainError::InvalidQuantity { quantity } if quantity == 4_294_967_296));

        let err: DomainError = StoreError::Decode("bad".to_string()).into();
        assert!(matches!(err, DomainError::Store(_)));
    }
}
