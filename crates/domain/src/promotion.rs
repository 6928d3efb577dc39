//! Promotion validation: code + amount in, discount out.

use chrono::{DateTime, Utc};
use common::{DiscountType, Money, PromotionId};
use serde::Serialize;
use store::{Promotion, PromotionStore};

use crate::error::{DomainError, Result};

/// A promotion resolved against an order amount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppliedPromotion {
    pub promotion_id: PromotionId,
    pub code: String,
    pub discount_amount: Money,
    pub discount_type: DiscountType,
    pub discount_value: i64,
}

/// Computes the discount a promotion grants on `amount`, never more than `amount`.
pub fn discount_for(promotion: &Promotion, amount: Money) -> Money {
    if !amount.is_positive() {
        return Money::zero();
    }
    let discount = match promotion.discount_type {
        DiscountType::Percentage => amount.percentage(promotion.discount_value.clamp(0, 100)),
        DiscountType::FixedAmount => Money::new(promotion.discount_value.max(0)),
    };
    discount.min(amount)
}

/// Read-only evaluator over the promotion store.
///
/// Usage counts are only incremented by the order commit.
#[derive(Clone)]
pub struct PromotionValidator<S> {
    store: S,
}

impl<S: PromotionStore> PromotionValidator<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    #[tracing::instrument(skip(self))]
    pub async fn validate(&self, code: &str, amount: Money) -> Result<AppliedPromotion> {
        self.validate_at(code, amount, Utc::now()).await
    }

    /// Same as [`validate`](Self::validate) with an explicit clock.
    pub async fn validate_at(
        &self,
        code: &str,
        amount: Money,
        now: DateTime<Utc>,
    ) -> Result<AppliedPromotion> {
        let code = code.trim();
        let promotion = self
            .store
            .find_promotion(code)
            .await?
            .ok_or_else(|| DomainError::PromotionNotFound {
                code: code.to_string(),
            })?;

        if !promotion.is_valid_at(now) {
            return Err(DomainError::PromotionExpired {
                code: promotion.code,
            });
        }
        if promotion.is_exhausted() {
            return Err(DomainError::PromotionExhausted {
                code: promotion.code,
            });
        }

        Ok(AppliedPromotion {
            promotion_id: promotion.id,
            discount_amount: discount_for(&promotion, amount),
            discount_type: promotion.discount_type,
            discount_value: promotion.discount_value,
            code: promotion.code,
        })
    }
}
