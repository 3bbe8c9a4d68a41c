use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::utils::time::Clock;

pub type OrderId = u64;
pub type Price = u64; // Price in ticks (e.g., 1 tick = 0.01 cents)
pub type Quantity = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Bid,
    Ask,
}

impl Side {
    pub fn opposite(self) -> Side {
        match self {
            Side::Bid => Side::Ask,
            Side::Ask => Side::Bid,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Bid => write!(f, "BID"),
            Side::Ask => write!(f, "ASK"),
        }
    }
}

/// Source of unique order identifiers.
///
/// The book never reuses an id it received; implementations must never hand
/// out the same value twice.
pub trait IdSource: Send + fmt::Debug {
    fn next_id(&mut self) -> OrderId;
}

/// Process-local monotonically increasing id counter, starting at 1.
#[derive(Debug, Clone)]
pub struct SequentialIds {
    next: OrderId,
}

impl SequentialIds {
    pub fn new() -> Self {
        Self::starting_at(1)
    }

    pub fn starting_at(first: OrderId) -> Self {
        Self { next: first }
    }
}

impl Default for SequentialIds {
    fn default() -> Self {
        Self::new()
    }
}

impl IdSource for SequentialIds {
    fn next_id(&mut self) -> OrderId {
        let id = self.next;
        self.next += 1;
        id
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub side: Side,
    pub original_quantity: Quantity,
    pub remaining_quantity: Quantity,
    /// FIFO tie-break within a price level.
    pub sequence: u64,
    /// Price key of the level this order rests in, on its own side.
    pub resting_at: Option<Price>,
    pub created_at: DateTime<Utc>,
}

impl Order {
    pub fn new(id: OrderId, side: Side, quantity: Quantity, sequence: u64) -> Self {
        Self {
            id,
            side,
            original_quantity: quantity,
            remaining_quantity: quantity,
            sequence,
            resting_at: None,
            created_at: Clock::now_utc(),
        }
    }

    pub fn filled_quantity(&self) -> Quantity {
        self.original_quantity - self.remaining_quantity
    }

    pub fn is_filled(&self) -> bool {
        self.remaining_quantity == 0
    }

    pub fn is_resting(&self) -> bool {
        self.resting_at.is_some()
    }

    /// Trade `quantity` units against this order. Callers never pass more
    /// than the remaining quantity.
    pub(crate) fn fill(&mut self, quantity: Quantity) {
        debug_assert!(quantity <= self.remaining_quantity);
        self.remaining_quantity -= quantity;
    }
}

/// One trade between a resting (maker) order and an incoming (taker) order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Match {
    pub maker_order_id: OrderId,
    pub taker_order_id: OrderId,
    pub taker_side: Side,
    /// Always the maker's level price.
    pub price: Price,
    pub quantity: Quantity,
}

impl Match {
    pub fn bid_order_id(&self) -> OrderId {
        match self.taker_side {
            Side::Bid => self.taker_order_id,
            Side::Ask => self.maker_order_id,
        }
    }

    pub fn ask_order_id(&self) -> OrderId {
        match self.taker_side {
            Side::Bid => self.maker_order_id,
            Side::Ask => self.taker_order_id,
        }
    }

    /// Price times quantity, exact for any tick-scaled price and quantity
    pub fn notional(&self) -> u128 {
        self.price as u128 * self.quantity as u128
    }
}

/// Result of submitting a limit order through the boundary API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimitOrderOutcome {
    pub order_id: OrderId,
    pub matches: Vec<Match>,
    /// Quantity left resting on the book (0 when fully matched).
    pub resting_quantity: Quantity,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookSnapshot {
    pub timestamp: DateTime<Utc>,
    pub bids: Vec<PriceLevelInfo>,
    pub asks: Vec<PriceLevelInfo>,
    pub last_trade_price: Option<Price>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceLevelInfo {
    pub price: Price,
    pub quantity: Quantity,
    pub order_count: u32,
}
