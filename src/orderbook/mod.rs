//! Core order book implementation module
//!
//! Price levels, the two book sides, the price-time priority sweep and the
//! request layer the service side talks to.

pub mod book;
pub mod book_side;
pub mod error;
pub mod matching;
pub mod operations;
pub mod price_level;
pub mod types;

// Re-export main types for convenience
pub use book::{OrderBook, OrderBookStats};
pub use book_side::BookSide;
pub use error::{OrderBookError, OrderBookResult};
pub use operations::{OrderRequest, OrderResponse};
pub use price_level::PriceLevel;
pub use types::{
    BookSnapshot, IdSource, LimitOrderOutcome, Match, Order, OrderId, Price, PriceLevelInfo,
    Quantity, SequentialIds, Side,
};
