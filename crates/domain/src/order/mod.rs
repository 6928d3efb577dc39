//! Order workflow: checkout, order queries and status transitions.

mod commands;
mod service;
mod state;

pub use commands::CreateOrder;
pub use service::OrderService;
pub use state::{StatusChange, Transition, plan_transition};
