use std::collections::HashMap;
use tracing::debug;

use crate::orderbook::book_side::BookSide;
use crate::orderbook::error::OrderBookResult;
use crate::orderbook::types::{Match, Order, OrderId, Price, Quantity, Side};

/// How far into the opposing side an incoming order may trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceBound {
    /// Trade only at the limit price or better
    Limit(Price),
    /// Trade at any price (market orders)
    Unbounded,
}

impl PriceBound {
    /// Whether an order on `taker_side` may trade at an opposing level priced `level_price`
    pub fn crosses(&self, taker_side: Side, level_price: Price) -> bool {
        match *self {
            PriceBound::Unbounded => true,
            PriceBound::Limit(limit) => match taker_side {
                Side::Bid => level_price <= limit, // Buy order price >= ask price
                Side::Ask => level_price >= limit, // Sell order price <= bid price
            },
        }
    }
}

/// Price-time priority matching over one side of the book
pub struct MatchingEngine;

impl MatchingEngine {
    /// Sweep `opposite` best price first until `incoming` is filled or no
    /// crossing level is left.
    ///
    /// Makers that get filled are dropped from `orders` and levels that run
    /// empty are pruned from `opposite` before the next level is visited.
    pub fn sweep(
        incoming: &mut Order,
        bound: PriceBound,
        opposite: &mut BookSide,
        orders: &mut HashMap<OrderId, Order>,
    ) -> OrderBookResult<Vec<Match>> {
        debug_assert_eq!(opposite.side(), incoming.side.opposite());
        let mut matches = Vec::new();

        while !incoming.is_filled() {
            let price = match opposite.best_price() {
                Some(price) if bound.crosses(incoming.side, price) => price,
                _ => break,
            };

            let level_matches = opposite.fill_level(price, incoming, orders)?;

            for m in &level_matches {
                if orders
                    .get(&m.maker_order_id)
                    .map_or(false, Order::is_filled)
                {
                    orders.remove(&m.maker_order_id);
                }
            }

            if opposite.level(price).is_none() {
                debug!("Cleared {} level {}", opposite.side(), price);
            }

            matches.extend(level_matches);
        }

        debug!(
            "Order {} generated {} matches, {} remaining",
            incoming.id,
            matches.len(),
            incoming.remaining_quantity
        );
        Ok(matches)
    }

    /// Total quantity an order on `taker_side` could trade against `opposite` within `bound`
    pub fn available_quantity(taker_side: Side, bound: PriceBound, opposite: &BookSide) -> Quantity {
        match bound {
            PriceBound::Unbounded => opposite.total_quantity(),
            // A subset of the side, so bounded by the side total
            PriceBound::Limit(_) => opposite
                .levels()
                .take_while(|level| bound.crosses(taker_side, level.price))
                .fold(0, |sum: Quantity, level| sum.saturating_add(level.total_quantity())),
        }
    }
}
