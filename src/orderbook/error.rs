use serde::{Deserialize, Serialize};
use std::fmt;

use crate::orderbook::types::{OrderId, Quantity};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderBookError {
    /// Zero price or quantity, or a malformed request
    InvalidOrder(String),

    /// An order with this id is already resting
    DuplicateOrder(OrderId),

    /// Market order larger than the opposing side's total volume
    InsufficientLiquidity {
        requested: Quantity,
        available: Quantity,
    },

    /// Order is not resting on the book
    OrderNotFound(OrderId),

    /// Book and price level disagree about where an order rests
    LogicViolation(String),

    /// System error
    SystemError(String),
}

impl fmt::Display for OrderBookError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderBookError::InvalidOrder(reason) => write!(f, "Invalid order: {}", reason),
            OrderBookError::DuplicateOrder(id) => write!(f, "Order {} already exists", id),
            OrderBookError::InsufficientLiquidity {
                requested,
                available,
            } => write!(
                f,
                "Insufficient liquidity: requested {}, available {}",
                requested, available
            ),
            OrderBookError::OrderNotFound(id) => write!(f, "Order {} not found", id),
            OrderBookError::LogicViolation(msg) => write!(f, "Logic violation: {}", msg),
            OrderBookError::SystemError(msg) => write!(f, "System error: {}", msg),
        }
    }
}

impl std::error::Error for OrderBookError {}

/// Result type for order book operations
pub type OrderBookResult<T> = Result<T, OrderBookError>;
