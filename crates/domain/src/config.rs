//! Loyalty programme configuration.

use common::ParseStatusError;

/// When points for a new order are credited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AccrualMode {
    /// Credited after commit, before `create_order` returns.
    #[default]
    Inline,
    /// Credited from a spawned task after commit.
    Background,
}

impl std::str::FromStr for AccrualMode {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "inline" => Ok(AccrualMode::Inline),
            "background" => Ok(AccrualMode::Background),
            _ => Err(ParseStatusError {
                kind: "accrual mode",
                value: s.to_string(),
            }),
        }
    }
}

/// Exchange rates and limits of the loyalty ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoyaltyConfig {
    /// Currency units spent per point earned.
    pub earn_rate: i64,
    /// Currency value of one redeemed point.
    pub redeem_value: i64,
    /// Number of transactions returned with the balance.
    pub history_limit: usize,
    pub accrual: AccrualMode,
}

impl LoyaltyConfig {
    pub const DEFAULT_EARN_RATE: i64 = 10_000;
    pub const DEFAULT_REDEEM_VALUE: i64 = 500;
    pub const DEFAULT_HISTORY_LIMIT: usize = 20;

    /// Builds a config, replacing non-positive values with the defaults.
    pub fn new(
        earn_rate: i64,
        redeem_value: i64,
        history_limit: usize,
        accrual: AccrualMode,
    ) -> Self {
        Self {
            earn_rate: if earn_rate > 0 {
                earn_rate
            } else {
                Self::DEFAULT_EARN_RATE
            },
            redeem_value: if redeem_value > 0 {
                redeem_value
            } else {
                Self::DEFAULT_REDEEM_VALUE
            },
            history_limit: if history_limit > 0 {
                history_limit
            } else {
                Self::DEFAULT_HISTORY_LIMIT
            },
            accrual,
        }
    }

    pub fn with_accrual(mut self, accrual: AccrualMode) -> Self {
        self.accrual = accrual;
        self
    }
}

impl Default for LoyaltyConfig {
    fn default() -> Self {
        Self {
            earn_rate: Self::DEFAULT_EARN_RATE,
            redeem_value: Self::DEFAULT_REDEEM_VALUE,
            history_limit: Self::DEFAULT_HISTORY_LIMIT,
            accrual: AccrualMode::Inline,
        }
    }
}
