//! Order state machine.
//!
//! Fulfilment status and payment status move independently but are
//! validated together:
//! ```text
//! status:   Pending ──► Paid ──► Fulfilled
//!              │          │
//!              └──────────┴──► Cancelled
//!
//! payment:  Pending ──► Paid ──► Refunded
//!              │          ▲
//!              └► Failed ─┘
//! ```
//! Status may only become `Paid` or `Fulfilled` while payment is `Paid`.
//! A fulfilled order never changes again.

use common::{OrderStatus, PaymentStatus};
use store::OrderState;

use crate::error::{DomainError, Result};

/// A requested change; `None` keeps the current value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatusChange {
    pub status: Option<OrderStatus>,
    pub payment_status: Option<PaymentStatus>,
}

/// A validated move from the current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: OrderState,
    pub to: OrderState,
    /// Set when the order is being cancelled and its stock returned.
    pub restock: bool,
}

fn describe(state: OrderState) -> String {
    format!("{}/{}", state.status, state.payment_status)
}

/// Validates `change` against `current`.
///
/// Returns `None` when the change requests the current state.
pub fn plan_transition(current: OrderState, change: StatusChange) -> Result<Option<Transition>> {
    let next = OrderState::new(
        change.status.unwrap_or(current.status),
        change.payment_status.unwrap_or(current.payment_status),
    );

    if next == current {
        return Ok(None);
    }

    let invalid = || DomainError::InvalidTransition {
        from: describe(current),
        to: describe(next),
    };

    if current.status == OrderStatus::Fulfilled {
        return Err(invalid());
    }

    let status_changes = next.status != current.status;
    if status_changes && !current.status.can_transition_to(next.status) {
        return Err(invalid());
    }
    if next.payment_status != current.payment_status
        && !current.payment_status.can_transition_to(next.payment_status)
    {
        return Err(invalid());
    }
    if status_changes
        && matches!(next.status, OrderStatus::Paid | OrderStatus::Fulfilled)
        && next.payment_status != PaymentStatus::Paid
    {
        return Err(invalid());
    }

    Ok(Some(Transition {
        from: current,
        to: next,
        restock: status_changes && next.status == OrderStatus::Cancelled,
    }))
}
