//! Loyalty ledger: point accrual, redemption and status.

use common::{Money, OrderId, UserId};
use serde::Serialize;
use store::{LoyaltyStore, LoyaltyTransaction};

use crate::config::LoyaltyConfig;
use crate::error::{DomainError, Result};

/// Balance plus the most recent ledger entries, newest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoyaltyStatus {
    pub user_id: UserId,
    pub balance: i64,
    pub transactions: Vec<LoyaltyTransaction>,
}

/// Outcome of a successful redemption.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Redemption {
    pub points_redeemed: i64,
    pub discount_amount: Money,
    pub transaction: LoyaltyTransaction,
}

#[derive(Clone)]
pub struct LoyaltyService<S> {
    store: S,
    config: LoyaltyConfig,
}

impl<S: LoyaltyStore> LoyaltyService<S> {
    pub fn new(store: S, config: LoyaltyConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &LoyaltyConfig {
        &self.config
    }

    /// Points earned for `amount`: one per full `earn_rate` units.
    pub fn points_for(&self, amount: Money) -> i64 {
        amount.amount().max(0) / self.config.earn_rate
    }

    /// Credits points for an order.
    ///
    /// Returns `None` when the amount earns nothing or the order was
    /// already credited.
    #[tracing::instrument(skip(self))]
    pub async fn earn_points(
        &self,
        user_id: UserId,
        gross_amount: Money,
        order_id: OrderId,
    ) -> Result<Option<LoyaltyTransaction>> {
        let points = self.points_for(gross_amount);
        if points <= 0 {
            return Ok(None);
        }

        let transaction = self.store.earn(user_id, points, order_id).await?;
        match &transaction {
            Some(_) => {
                metrics::counter!("loyalty_points_earned_total").increment(points as u64);
                tracing::info!(%user_id, %order_id, points, "loyalty points earned");
            }
            None => tracing::debug!(%user_id, %order_id, "order already credited"),
        }
        Ok(transaction)
    }

    /// Spends points for a discount of `points * redeem_value`.
    ///
    /// A point count whose discount does not fit in [`Money`] is rejected
    /// before the balance is touched.
    #[tracing::instrument(skip(self))]
    pub async fn redeem_points(&self, user_id: UserId, points: i64) -> Result<Redemption> {
        let discount = (points > 0)
            .then(|| points.checked_mul(self.config.redeem_value))
            .flatten()
            .ok_or(DomainError::InvalidQuantity { quantity: points })?;

        let transaction = self.store.redeem(user_id, points).await?;
        metrics::counter!("loyalty_points_redeemed_total").increment(points as u64);
        tracing::info!(%user_id, points, "loyalty points redeemed");

        Ok(Redemption {
            points_redeemed: points,
            discount_amount: Money::new(discount),
            transaction,
        })
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_status(&self, user_id: UserId) -> Result<LoyaltyStatus> {
        let account = self.store.get_account(user_id).await?;
        let transactions = self
            .store
            .recent_transactions(user_id, self.config.history_limit)
            .await?;

        Ok(LoyaltyStatus {
            user_id,
            balance: account.balance,
            transactions,
        })
    }
}
