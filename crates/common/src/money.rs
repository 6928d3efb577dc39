use serde::{Deserialize, Serialize};

/// Money amount in the smallest currency unit.
///
/// Storefront prices are whole currency units (e.g. 240000), so no
/// fractional part is modelled and all arithmetic stays in integers.
/// Arithmetic saturates at the `i64` bounds instead of overflowing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money {
    amount: i64,
}

impl Money {
    /// Creates a new Money amount.
    pub const fn new(amount: i64) -> Self {
        Self { amount }
    }

    /// Returns zero money.
    pub const fn zero() -> Self {
        Self { amount: 0 }
    }

    /// Returns the raw amount.
    pub fn amount(&self) -> i64 {
        self.amount
    }

    pub fn is_positive(&self) -> bool {
        self.amount > 0
    }

    /// Multiplies by a quantity.
    pub fn multiply(&self, quantity: u32) -> Money {
        Money {
            amount: self.amount.saturating_mul(i64::from(quantity)),
        }
    }

    /// Returns `percent`% of this amount, rounded toward zero.
    ///
    /// Computed in `i128`, so for `percent` in 0..=100 the result never
    /// exceeds the amount.
    pub fn percentage(&self, percent: i64) -> Money {
        let scaled = i128::from(self.amount) * i128::from(percent) / 100;
        Money {
            amount: scaled.clamp(i128::from(i64::MIN), i128::from(i64::MAX)) as i64,
        }
    }

    /// Subtracts `other`, never going below zero.
    pub fn saturating_sub(&self, other: Money) -> Money {
        Money {
            amount: self.amount.saturating_sub(other.amount).max(0),
        }
    }

    /// Returns the smaller of two amounts.
    pub fn min(self, other: Money) -> Money {
        if self.amount <= other.amount { self } else { other }
    }
}

impl Default for Money {
    fn default() -> Self {
        Self::zero()
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.amount)
    }
}

impl std::ops::Add for Money {
    type Output = Money;

    fn add(self, rhs: Self) -> Self::Output {
        Money {
            amount: self.amount.saturating_add(rhs.amount),
        }
    }
}

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}
