//! Order commands.

use serde::Deserialize;
use store::ShippingInfo;

/// Checkout of the caller's cart.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CreateOrder {
    pub shipping: ShippingInfo,

    /// Optional promotion code, validated before any stock is reserved.
    pub promotion_code: Option<String>,
}

impl CreateOrder {
    /// Creates a checkout without a promotion.
    pub fn new(address: impl Into<String>, phone: impl Into<String>) -> Self {
        Self {
            shipping: ShippingInfo {
                address: address.into(),
                phone: phone.into(),
            },
            promotion_code: None,
        }
    }

    /// Applies a promotion code. Blank codes are ignored.
    pub fn with_promotion(mut self, code: impl Into<String>) -> Self {
        let code = code.into();
        self.promotion_code = (!code.trim().is_empty()).then_some(code);
        self
    }

    pub(crate) fn promotion_code(&self) -> Option<&str> {
        self.promotion_code
            .as_deref()
            .map(str::trim)
            .filter(|code| !code.is_empty())
    }
}
