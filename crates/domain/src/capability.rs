//! Capability checks for the order and loyalty boundary.
//!
//! Identity is supplied by an upstream auth layer and trusted as-is. Every
//! admin-only operation names a [`Capability`] and calls
//! [`Actor::authorize`] before touching the store.

use common::{ParseStatusError, UserId};
use serde::{Deserialize, Serialize};

use crate::error::{DomainError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Customer,
    Admin,
}

impl std::str::FromStr for Role {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "customer" => Ok(Role::Customer),
            "admin" => Ok(Role::Admin),
            _ => Err(ParseStatusError {
                kind: "role",
                value: s.to_string(),
            }),
        }
    }
}

/// Operations that need more than an authenticated user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    ListAllOrders,
    ViewAnyOrder,
    UpdateOrderStatus,
    RetryLoyaltyAccrual,
}

impl Capability {
    fn required_role(&self) -> Role {
        match self {
            Capability::ListAllOrders
            | Capability::ViewAnyOrder
            | Capability::UpdateOrderStatus
            | Capability::RetryLoyaltyAccrual => Role::Admin,
        }
    }

    /// Human-readable action, used in `Forbidden` messages.
    pub fn action(&self) -> &'static str {
        match self {
            Capability::ListAllOrders => "list all orders",
            Capability::ViewAnyOrder => "view another user's order",
            Capability::UpdateOrderStatus => "update order status",
            Capability::RetryLoyaltyAccrual => "retry loyalty accrual",
        }
    }
}

/// The authenticated caller of an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub user_id: UserId,
    pub role: Role,
}

impl Actor {
    pub fn new(user_id: UserId, role: Role) -> Self {
        Self { user_id, role }
    }

    pub fn customer(user_id: UserId) -> Self {
        Self::new(user_id, Role::Customer)
    }

    pub fn admin(user_id: UserId) -> Self {
        Self::new(user_id, Role::Admin)
    }

    /// Fails with `Forbidden` unless the actor holds `capability`.
    pub fn authorize(&self, capability: Capability) -> Result<()> {
        match (capability.required_role(), self.role) {
            (Role::Customer, _) | (Role::Admin, Role::Admin) => Ok(()),
            (Role::Admin, Role::Customer) => Err(DomainError::Forbidden {
                action: capability.action(),
            }),
        }
    }
}
