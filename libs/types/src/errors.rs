//! Error types for order lifecycle operations
//!
//! Error taxonomy using thiserror. Higher layers wrap these with `#[from]`.

use crate::ids::OrderId;
use crate::numeric::Asset;
use thiserror::Error;

/// Order-specific errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum OrderError {
    #[error("Order not found: {order_id}")]
    NotFound { order_id: OrderId },

    #[error("Duplicate order id: {order_id}")]
    DuplicateId { order_id: OrderId },

    #[error("Order already in terminal state: {order_id}")]
    AlreadyTerminal { order_id: OrderId },

    #[error("Fill of {requested} exceeds remaining {remaining} on order {order_id}")]
    Overfill {
        order_id: OrderId,
        remaining: Asset,
        requested: Asset,
    },
}
